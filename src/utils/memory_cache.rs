//! In-memory currency cache for testing and embedding hosts

use crate::traits::CurrencyLookup;
use crate::types::Currency;

/// In-memory implementation of [`CurrencyLookup`]
///
/// Hosts with a real ledger cache implement the trait over their own storage;
/// this one backs tests and small embedders.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    currencies: Vec<Currency>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache preloaded with currencies
    pub fn with_currencies(currencies: Vec<Currency>) -> Self {
        Self { currencies }
    }

    /// Register a currency
    pub fn add_currency(&mut self, currency: Currency) {
        self.currencies.push(currency);
    }
}

impl CurrencyLookup for MemoryCache {
    fn find_currency(&self, name: &str) -> Option<Currency> {
        self.currencies
            .iter()
            .find(|c| {
                c.symbol.eq_ignore_ascii_case(name) || c.description.eq_ignore_ascii_case(name)
            })
            .cloned()
    }
}
