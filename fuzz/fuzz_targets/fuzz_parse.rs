#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(doc) = fatoora::ubl::parse_document(s) {
            let _ = doc.info();
            let _ = doc
                .root()
                .find_all("cac:InvoiceLine/cac:TaxTotal/cbc:RoundingAmount");
        }
    }
});
