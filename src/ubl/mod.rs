//! UBL 2.1 invoice parsing and rule checking.
//!
//! ZATCA e-invoices are UBL 2.1 `Invoice` documents with the usual
//! `cac` (aggregate) and `cbc` (basic) component namespaces. Parsing
//! produces an immutable [`UblDocument`] tree; [`check_document`] then
//! evaluates the arithmetic rules configured in a [`CheckConfig`](crate::core::CheckConfig).
//!
//! # Example
//!
//! ```no_run
//! use fatoora::core::CheckConfig;
//! use fatoora::ubl;
//!
//! let xml = std::fs::read_to_string("invoice.xml").unwrap();
//! let report = ubl::check_xml(&xml, &CheckConfig::default()).unwrap();
//! assert!(report.is_conforming(), "{report}");
//! ```

mod check;
mod tree;

pub use check::*;
pub use tree::{DocumentInfo, Element, MAX_DEPTH, UblDocument, parse_document};

/// UBL 2.1 namespace URIs.
pub mod ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
    pub const EXT: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2";

    /// Namespace bound to a path prefix. Path lookup uses this table, not
    /// the prefixes declared in the document.
    pub fn namespace_for(prefix: &str) -> Option<&'static str> {
        match prefix {
            "cac" => Some(CAC),
            "cbc" => Some(CBC),
            "ext" => Some(EXT),
            _ => None,
        }
    }
}
