//! Traits for format strategies and the ledger lookup seam

use crate::types::{Currency, RawStatementData, Statement, StatementResult, StatementType};

/// Read-only currency lookup supplied by the host
///
/// Statements print currencies as codes or symbols; the ledger stores them as
/// records with an identity. The import workflow injects its cache behind
/// this trait so records can carry the resolved identity without this crate
/// knowing anything about ledger storage.
pub trait CurrencyLookup {
    /// Find a currency whose symbol or description matches `name`,
    /// case-insensitively. Returns `None` when the ledger has no match.
    fn find_currency(&self, name: &str) -> Option<Currency>;
}

/// One statement dialect: detection plus parsing
///
/// Implementations are registered in a fixed priority order by the
/// dispatcher. `detect` is a pure sniff over the raw content and must never
/// fail; content that does not belong to the dialect yields
/// [`StatementType::Unknown`]. `parse` is only invoked after a successful
/// detection and may fail when the recognized content is internally corrupt
/// or cannot be decoded with the dialect's character set.
pub trait FormatStrategy {
    /// Classify the content, returning `Unknown` when it does not match
    fn detect(&self, data: &RawStatementData) -> StatementType;

    /// Parse the content into a statement
    fn parse(
        &self,
        data: &RawStatementData,
        lookup: &dyn CurrencyLookup,
    ) -> StatementResult<Statement>;
}

/// Lookup over an empty ledger; every resolution misses
///
/// Useful for hosts that only need the parsed records and for tests that do
/// not care about currency identity.
pub struct NoCurrencies;

impl CurrencyLookup for NoCurrencies {
    fn find_currency(&self, _name: &str) -> Option<Currency> {
        None
    }
}
