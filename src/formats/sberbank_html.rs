//! Sberbank HTML statement strategy
//!
//! The bank's card statement is an HTML report. Template class names have
//! changed between export versions, so the transaction table is located by
//! its structural shape instead: the first table whose rows carry five cells
//! with a leading `dd.MM.yyyy` date. Columns are mapped positionally — the
//! export has no header contract. Credits are printed with a `+` prefix;
//! debit rows are unsigned magnitudes and are negated.

use std::sync::OnceLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::traits::{CurrencyLookup, FormatStrategy};
use crate::types::{
    RawStatementData, Statement, StatementError, StatementRecordBuilder, StatementResult,
    StatementType,
};

const FORMAT_MARKERS: [&str; 3] = [
    "HTML_DEBIT_RUS_REPORT",
    "HTML_CREDIT_RUS_REPORT",
    "HTML_DEBIT_RUS_HISTORY",
];

const DATE_FORMAT: &str = "%d.%m.%Y";
// actual date, execution date, counterparty, category, amount
const TRANSACTION_COLUMNS: usize = 5;

fn table_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("table").expect("invalid table selector"))
}

fn row_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("tr").expect("invalid tr selector"))
}

/// Strategy for the Sberbank card statement HTML export
pub struct SberbankHtmlParser;

impl FormatStrategy for SberbankHtmlParser {
    fn detect(&self, data: &RawStatementData) -> StatementType {
        let content = data.content();
        if FORMAT_MARKERS.iter().any(|marker| content.contains(marker)) {
            StatementType::SberbankHtml
        } else {
            StatementType::Unknown
        }
    }

    fn parse(
        &self,
        data: &RawStatementData,
        lookup: &dyn CurrencyLookup,
    ) -> StatementResult<Statement> {
        let document = Html::parse_document(data.content());

        let account_number = find_account_number(&document);
        if account_number.is_empty() {
            warn!("account number not found in statement");
        }

        let rows = find_transaction_rows(&document);
        if rows.is_empty() {
            warn!("transactions not found in statement");
            return Ok(Statement::new(
                StatementType::SberbankHtml,
                account_number,
                Vec::new(),
            ));
        }

        let mut records = Vec::with_capacity(rows.len());
        for (index, cells) in rows.iter().enumerate() {
            let row = index + 1;
            let actual = parse_date(&cells[0], row)?;
            let execution = parse_date(&cells[1], row)?;
            let amount = match cells[4].strip_prefix('+') {
                Some(credit) => credit.trim().to_string(),
                None => format!("-{}", cells[4]),
            };

            records.push(
                StatementRecordBuilder::new()
                    .actual(actual)
                    .execution(execution)
                    .counter_party(cells[2].clone())
                    .description(cells[3].clone())
                    .amount(amount)
                    .build(lookup)?,
            );
        }

        Ok(Statement::new(
            StatementType::SberbankHtml,
            account_number,
            records,
        ))
    }
}

/// Collapse runs of whitespace (including NBSP) into single spaces
fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cell_texts(row: ElementRef) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| {
            let name = cell.value().name();
            name.eq_ignore_ascii_case("td") || name.eq_ignore_ascii_case("th")
        })
        .map(|cell| normalize_text(&cell.text().collect::<Vec<_>>().join(" ")))
        .collect()
}

/// First table whose rows look like transaction lines wins
fn find_transaction_rows(document: &Html) -> Vec<Vec<String>> {
    for table in document.select(table_selector()) {
        let rows: Vec<Vec<String>> = table
            .select(row_selector())
            .map(cell_texts)
            .filter(|cells| {
                cells.len() == TRANSACTION_COLUMNS
                    && NaiveDate::parse_from_str(cells[0].trim(), DATE_FORMAT).is_ok()
            })
            .collect();
        if !rows.is_empty() {
            return rows;
        }
    }
    Vec::new()
}

/// The account number sits in a two-cell label/value row; the label wording
/// varies between debit and credit templates, the digits do not. Only a
/// digits-only value qualifies, which keeps holder names and period rows out.
fn find_account_number(document: &Html) -> String {
    for row in document.select(row_selector()) {
        let cells = cell_texts(row);
        if cells.len() != 2 {
            continue;
        }
        let label = cells[0].to_lowercase();
        if label.contains("счёт") || label.contains("счет") || label.contains("карт") {
            let digits: String = cells[1].chars().filter(|c| !c.is_whitespace()).collect();
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return digits;
            }
        }
    }
    String::new()
}

fn parse_date(value: &str, row: usize) -> StatementResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| StatementError::Malformed(format!("row {row}: invalid date '{value}'")))
}
