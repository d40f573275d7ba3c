//! Raiffeisen CSV statement strategy
//!
//! One strategy covers both CSV layouts the bank has used over time. The
//! layouts are told apart by their exact header rows: the current one is
//! UTF-8 (possibly with a BOM) and keeps income and expense in separate
//! columns with a decimal comma; the original one is windows-1251 with a
//! single signed amount column, a decimal dot and spaces as thousands
//! separators.

use chrono::NaiveDate;
use csv::ReaderBuilder;

use crate::traits::{CurrencyLookup, FormatStrategy};
use crate::types::{
    RawStatementData, Statement, StatementError, StatementRecordBuilder, StatementResult,
    StatementType,
};
use crate::utils::{decode_utf8, decode_windows_1251};

const DELIMITER: u8 = b';';

const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";
const EXECUTION_DATE_FORMAT: &str = "%d.%m.%Y";

const OLD_FORMAT_HEADERS: [&str; 6] = [
    "Дата транзакции",
    "Описание",
    "Валюта операции",
    "Сумма в валюте операции",
    "Валюта счета",
    "Сумма в валюте счета",
];

const NEW_FORMAT_HEADERS: [&str; 11] = [
    "Дата операции",
    "Выполнено банком",
    "Номер документа",
    "Сумма в валюте операции (поступления)",
    "Сумма в валюте операции (расходы)",
    "Валюта операции",
    "Сумма в валюте счета (поступления)",
    "Сумма в валюте счета (расходы)",
    "Валюта счета",
    "Детали операции (назначение платежа)",
    "Номер карты",
];

/// Strategy for the Raiffeisen account statement CSV exports
pub struct RbaCsvParser;

impl FormatStrategy for RbaCsvParser {
    fn detect(&self, data: &RawStatementData) -> StatementType {
        // Try the current layout first
        if let Ok(text) = decode_utf8(data.bytes()) {
            if headers_match(text, &NEW_FORMAT_HEADERS) {
                return StatementType::RbaCsvNew;
            }
        }

        // Fall back to the original layout
        if let Ok(text) = decode_windows_1251(data.bytes()) {
            if headers_match(&text, &OLD_FORMAT_HEADERS) {
                return StatementType::RbaCsvOld;
            }
        }

        StatementType::Unknown
    }

    fn parse(
        &self,
        data: &RawStatementData,
        lookup: &dyn CurrencyLookup,
    ) -> StatementResult<Statement> {
        match self.detect(data) {
            StatementType::RbaCsvNew => parse_layout(decode_utf8(data.bytes())?, true, lookup),
            StatementType::RbaCsvOld => {
                parse_layout(&decode_windows_1251(data.bytes())?, false, lookup)
            }
            _ => Err(StatementError::Malformed(
                "content matches neither Raiffeisen CSV layout".to_string(),
            )),
        }
    }
}

fn reader_from(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(text.as_bytes())
}

fn headers_match(text: &str, expected: &[&str]) -> bool {
    let mut reader = reader_from(text);
    let Ok(headers) = reader.headers() else {
        return false;
    };
    if headers.len() != expected.len() {
        return false;
    }
    headers.iter().enumerate().all(|(index, header)| {
        let header = if index == 0 {
            // Some exports start with a UTF-8 BOM
            header.trim_start_matches('\u{feff}')
        } else {
            header
        };
        header == expected[index]
    })
}

fn parse_layout(
    text: &str,
    new_format: bool,
    lookup: &dyn CurrencyLookup,
) -> StatementResult<Statement> {
    let mut reader = reader_from(text);
    let mut records = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let row = index + 2; // the header occupies the first line
        let record =
            result.map_err(|err| StatementError::Malformed(format!("row {row}: {err}")))?;
        let field = |column: usize| {
            record.get(column).ok_or_else(|| {
                StatementError::Malformed(format!("row {row}: missing column {}", column + 1))
            })
        };

        let date = parse_date(field(0)?, DATE_FORMAT, row)?;
        let execution = if new_format {
            parse_date(field(1)?, EXECUTION_DATE_FORMAT, row)?
        } else {
            date
        };

        let amount = if new_format {
            let income = field(6)?;
            if income.trim().is_empty() {
                format!("-{}", field(7)?)
            } else {
                income.to_string()
            }
        } else {
            field(5)?.to_string()
        };

        let currency = if new_format { field(8)? } else { field(4)? };
        let description = if new_format { field(9)? } else { field(1)? };

        records.push(
            StatementRecordBuilder::new()
                .actual(date)
                .execution(execution)
                .currency(currency)
                .description(description)
                .amount(amount.replace(' ', ""))
                .build(lookup)?,
        );
    }

    let statement_type = if new_format {
        StatementType::RbaCsvNew
    } else {
        StatementType::RbaCsvOld
    };
    Ok(Statement::new(statement_type, "", records))
}

fn parse_date(value: &str, format: &str, row: usize) -> StatementResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format)
        .map_err(|_| StatementError::Malformed(format!("row {row}: invalid date '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NoCurrencies;
    use chrono::NaiveDate;
    use encoding_rs::WINDOWS_1251;

    const OLD_CSV: &str = "\
Дата транзакции;Описание;Валюта операции;Сумма в валюте операции;Валюта счета;Сумма в валюте счета
31.12.2010 00:00;Interest;RUB;1 234.56;RUB;1 234.56
02.11.2011 00:00;Перевод;RUB;-100 000.00;RUB;-100 000.00
31.10.2012 00:00;Проценты;RUB;7 856.12;RUB;7 856.12
26.10.2013 12:30;FX RUR/USD [12.3400] WEB;RUB;-3 196.50;RUB;-3 196.50
";

    const NEW_CSV: &str = "\
\u{feff}Дата операции;Выполнено банком;Номер документа;Сумма в валюте операции (поступления);Сумма в валюте операции (расходы);Валюта операции;Сумма в валюте счета (поступления);Сумма в валюте счета (расходы);Валюта счета;Детали операции (назначение платежа);Номер карты
29.04.2024 10:00;30.04.2024;101;4 563,33;;RUB;4 563,33;;RUB;Какой-то приход;
21.04.2023 09:30;21.04.2023;102;;7 000,00;RUB;;7 000,00;RUB;Какой-то расход;*1234
04.04.2023 08:00;04.04.2023;103;123 456,78;;RUB;123 456,78;;RUB;Еще приход;
";

    fn old_data() -> RawStatementData {
        let (bytes, _, _) = WINDOWS_1251.encode(OLD_CSV);
        RawStatementData::new(bytes.into_owned())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_detect_old_and_new() {
        assert_eq!(RbaCsvParser.detect(&old_data()), StatementType::RbaCsvOld);
        assert_eq!(
            RbaCsvParser.detect(&RawStatementData::from(NEW_CSV)),
            StatementType::RbaCsvNew
        );
        assert_eq!(
            RbaCsvParser.detect(&RawStatementData::from("a;b;c\n1;2;3\n")),
            StatementType::Unknown
        );
    }

    #[test]
    fn test_parse_old_layout() {
        let statement = RbaCsvParser.parse(&old_data(), &NoCurrencies).unwrap();
        assert_eq!(statement.statement_type(), StatementType::RbaCsvOld);
        assert_eq!(statement.account_number(), "");
        assert_eq!(statement.records().len(), 4);

        let expected = [
            (date(2010, 12, 31), "Interest", "1234.56"),
            (date(2011, 11, 2), "Перевод", "-100000.00"),
            (date(2012, 10, 31), "Проценты", "7856.12"),
            (date(2013, 10, 26), "FX RUR/USD [12.3400] WEB", "-3196.50"),
        ];
        for (record, (actual, description, amount)) in statement.records().iter().zip(expected) {
            assert_eq!(record.actual(), actual);
            assert_eq!(record.execution(), actual);
            assert_eq!(record.description(), description);
            assert_eq!(record.amount(), amount);
            assert_eq!(record.currency(), "RUB");
        }
    }

    #[test]
    fn test_parse_new_layout() {
        let statement = RbaCsvParser
            .parse(&RawStatementData::from(NEW_CSV), &NoCurrencies)
            .unwrap();
        assert_eq!(statement.statement_type(), StatementType::RbaCsvNew);
        assert_eq!(statement.records().len(), 3);

        let first = &statement.records()[0];
        assert_eq!(first.actual(), date(2024, 4, 29));
        assert_eq!(first.execution(), date(2024, 4, 30));
        assert_eq!(first.description(), "Какой-то приход");
        assert_eq!(first.amount(), "4563.33");

        // expense rows take the negated expense column
        let second = &statement.records()[1];
        assert_eq!(second.actual(), date(2023, 4, 21));
        assert_eq!(second.amount(), "-7000.00");

        let third = &statement.records()[2];
        assert_eq!(third.amount(), "123456.78");
    }

    #[test]
    fn test_malformed_date_reports_row() {
        let broken = NEW_CSV.replace("29.04.2024 10:00", "yesterday");
        let result = RbaCsvParser.parse(&RawStatementData::from(broken.as_str()), &NoCurrencies);
        match result {
            Err(StatementError::Malformed(message)) => assert!(message.contains("row 2")),
            other => panic!("expected malformed content, got {other:?}"),
        }
    }
}
