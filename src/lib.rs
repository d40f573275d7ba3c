//! # Statements Core
//!
//! A bank statement import library providing format detection, parsing into
//! a canonical record model, and reconciliation against ledger transactions.
//!
//! ## Features
//!
//! - **Format detection**: mutually exclusive sniffing across OFX XML,
//!   several bank CSV dialects and an HTML export; first confident match wins
//! - **Canonical model**: every dialect parses into the same `Statement` /
//!   `StatementRecord` shape, with amounts normalized independently of the
//!   source locale
//! - **Reconciliation**: a pure predicate matching imported records against
//!   already-recorded ledger transactions
//! - **Ledger abstraction**: currency resolution behind a trait so hosts can
//!   plug in their own cache
//!
//! ## Quick Start
//!
//! ```rust
//! use statements_core::{parse_statement, RawStatementData};
//! use statements_core::utils::MemoryCache;
//!
//! let bytes = std::fs::read("statement.csv").unwrap_or_default();
//! let data = RawStatementData::new(bytes);
//! let lookup = MemoryCache::new();
//! match parse_statement(&data, &lookup) {
//!     Ok(statement) => {
//!         for record in statement.records() {
//!             // build a StatementPredicate per record and scan the ledger
//!             let _ = record.amount_decimal();
//!         }
//!     }
//!     Err(err) => eprintln!("import failed: {err}"),
//! }
//! ```

pub mod formats;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use formats::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
