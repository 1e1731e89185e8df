//! Deterministic ZATCA-shaped invoices for rule-check tests.
//!
//! Stands in for an ERP's invoice creation and XML export: give it a
//! company, a customer and lines (price, quantity, discount, tax rate)
//! and it computes every amount with half-up two-decimal rounding, then
//! serializes a UBL 2.1 invoice. It is a test fixture, not a tax engine.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use fatoora::fixture::*;
//! use rust_decimal_macros::dec;
//!
//! let xml = InvoiceFixtureBuilder::new("SME00012", NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
//!     .tax_included(true)
//!     .add_line(LineBuilder::new("Demo Item", dec!(57.38)).discount_percent(dec!(1.37)).build())
//!     .add_line(LineBuilder::new("Test5", dec!(57.38)).discount_percent(dec!(1.37)).build())
//!     .build()
//!     .unwrap()
//!     .to_xml()
//!     .unwrap();
//! assert!(fatoora::ubl::assert_zatca_rules(&xml).is_ok());
//! ```

mod builder;
mod types;
mod writer;
mod xml_utils;

pub use builder::*;
pub use types::*;
pub use xml_utils::{format_amount, format_decimal};
