//! Yandex Money CSV statement strategy
//!
//! The wallet history export opens with a preamble: the wallet title with the
//! `№`-prefixed account number, the reporting period and totals. Data rows
//! follow the `+/-` column header; the first column carries the sign, the
//! amount itself is printed unsigned with a decimal comma.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use csv::ReaderBuilder;

use crate::traits::{CurrencyLookup, FormatStrategy};
use crate::types::{
    RawStatementData, Statement, StatementError, StatementRecordBuilder, StatementResult,
    StatementType,
};
use crate::utils::decode_utf8;

const DELIMITER: u8 = b';';
const DATE_FORMAT: &str = "%d.%m.%Y";
// Wallet title, period and totals before the data rows
const PREAMBLE_ROWS: usize = 5;
const SIGN_HEADER: &str = "+/-";
const WALLET_MARKER: &str = "Яндекс.Деньги";

/// Strategy for the Yandex Money wallet history CSV export
pub struct YandexMoneyCsvParser;

impl FormatStrategy for YandexMoneyCsvParser {
    fn detect(&self, data: &RawStatementData) -> StatementType {
        let Ok(text) = decode_utf8(data.bytes()) else {
            return StatementType::Unknown;
        };
        let first_line = text
            .trim_start_matches('\u{feff}')
            .lines()
            .next()
            .unwrap_or("");
        if first_line.starts_with(WALLET_MARKER) {
            StatementType::YandexMoneyCsv
        } else {
            StatementType::Unknown
        }
    }

    fn parse(
        &self,
        data: &RawStatementData,
        lookup: &dyn CurrencyLookup,
    ) -> StatementResult<Statement> {
        let text = decode_utf8(data.bytes())?;
        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut account_number = String::new();
        let mut records = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let row = index + 1;
            let record =
                result.map_err(|err| StatementError::Malformed(format!("row {row}: {err}")))?;

            if row == 1 {
                if let Some(title) = record.get(0) {
                    if let Some(position) = title.find('№') {
                        account_number =
                            title[position + '№'.len_utf8()..].trim().to_string();
                    }
                }
            }
            if row <= PREAMBLE_ROWS {
                continue;
            }

            let Some(sign) = record.get(0) else {
                continue;
            };
            if sign == SIGN_HEADER || record.len() < 6 {
                continue;
            }
            let field = |column: usize| {
                record.get(column).ok_or_else(|| {
                    StatementError::Malformed(format!("row {row}: missing column {}", column + 1))
                })
            };

            let datetime = field(1)?;
            let date_part = datetime.get(..10).ok_or_else(|| {
                StatementError::Malformed(format!("row {row}: invalid operation date '{datetime}'"))
            })?;
            let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).map_err(|_| {
                StatementError::Malformed(format!("row {row}: invalid operation date '{datetime}'"))
            })?;

            let mut amount = field(2)?
                .trim()
                .replace(',', ".")
                .parse::<BigDecimal>()
                .map_err(|_| {
                    StatementError::Malformed(format!(
                        "row {row}: invalid amount '{}'",
                        record.get(2).unwrap_or_default()
                    ))
                })?;
            if sign == "-" {
                amount = -amount;
            }

            records.push(
                StatementRecordBuilder::new()
                    .actual(date)
                    .description(field(5)?)
                    .currency(field(3)?)
                    .amount(amount.to_string())
                    .build(lookup)?,
            );
        }

        Ok(Statement::new(
            StatementType::YandexMoneyCsv,
            account_number,
            records,
        ))
    }
}
