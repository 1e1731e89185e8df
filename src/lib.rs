//! # fatoora
//!
//! Conformance checker for ZATCA (Saudi Arabia) e-invoices. Parses UBL 2.1
//! invoice XML and verifies the cross-field arithmetic rules that ZATCA
//! rejects documents for:
//!
//! | Rule | Identity |
//! |------|----------|
//! | BR-CO-15 | `TaxInclusiveAmount = TaxExclusiveAmount + TaxTotal/TaxAmount` |
//! | BR-CO-11 | `AllowanceTotalAmount = Σ AllowanceCharge/Amount` |
//! | BR-CO-14 | `TaxTotal/TaxAmount = Σ TaxSubtotal/TaxAmount` |
//! | BR-KSA-51 | `RoundingAmount = LineExtensionAmount + TaxAmount` per line |
//!
//! BR-CO-10, BR-CO-12, BR-CO-13 and BR-CO-16 are available on request via
//! [`CheckConfig::all_rules`](crate::core::CheckConfig::all_rules).
//!
//! All amounts use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use fatoora::fixture::*;
//! use fatoora::ubl;
//! use rust_decimal_macros::dec;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
//! let fixture = InvoiceFixtureBuilder::new("SME00010", date)
//!     .add_line(LineBuilder::new("Demo Item", dec!(57.38)).build())
//!     .build()
//!     .unwrap();
//! let xml = fixture.to_xml().unwrap();
//!
//! let report = ubl::assert_zatca_rules(&xml).unwrap();
//! assert!(report.is_conforming());
//! assert_eq!(fixture.totals.tax_inclusive, dec!(65.99));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Errors, amounts, rules, config, reports |
//! | `ubl` | UBL XML parsing and rule checking |
//! | `fixture` | Deterministic ZATCA-shaped test invoices |
//! | `json` | JSON config loading and report output |
//! | `all` | Everything (also the default) |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "fixture")]
pub mod fixture;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
