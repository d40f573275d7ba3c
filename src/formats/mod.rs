//! Statement format strategies and the dispatch over them
//!
//! Each supported dialect implements [`FormatStrategy`]. The dispatcher walks
//! the strategies in a fixed priority order — OFX, Raiffeisen CSV, Alfa-Bank
//! CSV, Yandex Money CSV, Sberbank HTML — and the first strategy whose
//! detection is confident wins. There is no scoring and no merging of
//! partial matches; content nobody recognizes is an unsupported format.

pub mod alfa_csv;
pub mod ofx;
pub mod rba_csv;
pub mod sberbank_html;
pub mod yandex_csv;

pub use alfa_csv::AlfaCsvParser;
pub use ofx::OfxParser;
pub use rba_csv::RbaCsvParser;
pub use sberbank_html::SberbankHtmlParser;
pub use yandex_csv::YandexMoneyCsvParser;

use crate::traits::{CurrencyLookup, FormatStrategy};
use crate::types::{RawStatementData, Statement, StatementError, StatementResult, StatementType};

/// Registered strategies in dispatch priority order
///
/// The XML and header-exact CSV sniffs are the most precise and run first;
/// the substring-based HTML sniff is the loosest and runs last.
pub fn strategies() -> Vec<Box<dyn FormatStrategy>> {
    vec![
        Box::new(OfxParser),
        Box::new(RbaCsvParser),
        Box::new(AlfaCsvParser),
        Box::new(YandexMoneyCsvParser),
        Box::new(SberbankHtmlParser),
    ]
}

/// Classify content against every strategy in priority order
pub fn detect_type(data: &RawStatementData) -> StatementType {
    strategies()
        .iter()
        .map(|strategy| strategy.detect(data))
        .find(|detected| *detected != StatementType::Unknown)
        .unwrap_or(StatementType::Unknown)
}

/// Parse a statement with the first strategy that recognizes the content
///
/// Returns [`StatementError::UnsupportedFormat`] when no strategy claims the
/// content; no best-effort parse is attempted.
pub fn parse_statement(
    data: &RawStatementData,
    lookup: &dyn CurrencyLookup,
) -> StatementResult<Statement> {
    for strategy in strategies() {
        if strategy.detect(data) != StatementType::Unknown {
            return strategy.parse(data, lookup);
        }
    }
    Err(StatementError::UnsupportedFormat)
}
