//! Alfa-Bank CSV statement strategy
//!
//! The export keeps credits and debits in two separate columns and flags
//! pending card operations with a `HOLD` reference; such rows never make it
//! into the statement. Expense descriptions often embed the real execution
//! and transaction dates after the merchant text; when both are present they
//! replace the dates from the date column and the matched prefix becomes the
//! cleaned description. That extraction is fragile by nature and stays
//! confined to this strategy.

use std::sync::OnceLock;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use regex::Regex;

use crate::traits::{CurrencyLookup, FormatStrategy};
use crate::types::{
    RawStatementData, Statement, StatementError, StatementRecordBuilder, StatementResult,
    StatementType,
};
use crate::utils::decode_windows_1251;

const DELIMITER: u8 = b';';
const DATE_FORMAT: &str = "%d.%m.%y";
const HOLD_STATUS: &str = "HOLD";
// Eight named columns plus the empty field left by the trailing separator
const RECORD_SIZE: usize = 9;

const HEADERS: [&str; 8] = [
    "Тип счёта",
    "Номер счёта",
    "Валюта",
    "Дата операции",
    "Референс проводки",
    "Описание операции",
    "Приход",
    "Расход",
];

fn description_dates_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.*)(\d{2}\.\d{2}\.\d{2})\s(\d{2}\.\d{2}\.\d{2}).*$")
            .expect("invalid description dates regex")
    })
}

/// Strategy for the Alfa-Bank account statement CSV export
pub struct AlfaCsvParser;

impl FormatStrategy for AlfaCsvParser {
    fn detect(&self, data: &RawStatementData) -> StatementType {
        let Ok(text) = decode_windows_1251(data.bytes()) else {
            return StatementType::Unknown;
        };
        let mut reader = reader_from(&text);
        let Some(Ok(header)) = reader.records().next() else {
            return StatementType::Unknown;
        };
        if header.len() != RECORD_SIZE {
            return StatementType::Unknown;
        }
        let names_match = HEADERS
            .iter()
            .enumerate()
            .all(|(index, expected)| header.get(index) == Some(*expected));
        if names_match && header.get(RECORD_SIZE - 1) == Some("") {
            StatementType::AlfaCsv
        } else {
            StatementType::Unknown
        }
    }

    fn parse(
        &self,
        data: &RawStatementData,
        lookup: &dyn CurrencyLookup,
    ) -> StatementResult<Statement> {
        let text = decode_windows_1251(data.bytes())?;
        let mut reader = reader_from(&text);

        let mut account_number = String::new();
        let mut records = Vec::new();

        for (index, result) in reader.records().enumerate() {
            if index == 0 {
                continue; // header
            }
            let row = index + 1;
            let record =
                result.map_err(|err| StatementError::Malformed(format!("row {row}: {err}")))?;
            let field = |column: usize| {
                record.get(column).ok_or_else(|| {
                    StatementError::Malformed(format!("row {row}: missing column {}", column + 1))
                })
            };

            // Pending card operations are not statement lines
            if field(4)?.eq_ignore_ascii_case(HOLD_STATUS) {
                continue;
            }

            if account_number.is_empty() {
                account_number = field(1)?.to_string();
            }

            let currency = field(2)?.to_string();
            let mut actual = parse_date(field(3)?, row)?;
            let mut execution = actual;
            let mut description = field(5)?.trim().to_string();
            let credit = parse_decimal(field(6)?, row)?;
            let debit = parse_decimal(field(7)?, row)?;

            let amount = if debit == BigDecimal::from(0) {
                credit
            } else {
                let embedded = description_dates_re().captures(&description).and_then(
                    |captures| match (captures.get(1), captures.get(2), captures.get(3)) {
                        (Some(prefix), Some(first), Some(second)) => Some((
                            prefix.as_str().to_string(),
                            first.as_str().to_string(),
                            second.as_str().to_string(),
                        )),
                        _ => None,
                    },
                );
                if let Some((prefix, first, second)) = embedded {
                    execution = parse_date(&first, row)?;
                    actual = parse_date(&second, row)?;
                    description = prefix;
                }
                -debit
            };

            records.push(
                StatementRecordBuilder::new()
                    .actual(actual)
                    .execution(execution)
                    .description(description)
                    .currency(currency)
                    .amount(amount.to_string())
                    .build(lookup)?,
            );
        }

        Ok(Statement::new(StatementType::AlfaCsv, account_number, records))
    }
}

fn reader_from(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
}

fn parse_date(value: &str, row: usize) -> StatementResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| StatementError::Malformed(format!("row {row}: invalid date '{value}'")))
}

fn parse_decimal(value: &str, row: usize) -> StatementResult<BigDecimal> {
    value
        .trim()
        .replace(',', ".")
        .parse::<BigDecimal>()
        .map_err(|_| StatementError::Malformed(format!("row {row}: invalid amount '{value}'")))
}
