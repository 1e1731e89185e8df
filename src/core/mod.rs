//! Core types: errors, amount parsing and comparison, rule identifiers,
//! check configuration and reports.
//!
//! Nothing here touches XML; the [`ubl`](crate::ubl) module feeds these
//! types from a parsed document.

mod amount;
mod config;
mod error;
mod report;
mod rules;

pub use amount::*;
pub use config::*;
pub use error::*;
pub use report::*;
pub use rules::*;
