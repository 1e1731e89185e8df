#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Every rule on arbitrary input must return, never panic.
        let _ = fatoora::ubl::check_xml(s, &fatoora::CheckConfig::all_rules());
    }
});
