#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(a) = fatoora::parse_amount(s, "fuzz") {
            assert!(fatoora::amounts_match(a, a, Some(2)));
        }
    }
});
