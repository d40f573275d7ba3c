//! Integration tests for statements-core

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use encoding_rs::WINDOWS_1251;
use uuid::Uuid;

use statements_core::utils::MemoryCache;
use statements_core::{
    detect_type, parse_statement, strategies, Currency, FormatStrategy, RawStatementData,
    StatementError, StatementPredicate, StatementType, Transaction,
};

const OFX_FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OFX>
  <BANKMSGSRSV1>
    <STMTTRNRS>
      <STMTRS>
        <CURDEF>RUB</CURDEF>
        <BANKACCTFROM>
          <ACCTID>40817810000000054321</ACCTID>
        </BANKACCTFROM>
        <BANKTRANLIST>
          <STMTTRN>
            <TRNTYPE>DEBIT</TRNTYPE>
            <DTPOSTED>20200115120000</DTPOSTED>
            <DTAVAIL>20200117120000</DTAVAIL>
            <TRNAMT>-1500.00</TRNAMT>
            <NAME>SUPERMARKET</NAME>
            <MEMO>Weekly groceries</MEMO>
          </STMTTRN>
          <STMTTRN>
            <TRNTYPE>CREDIT</TRNTYPE>
            <DTPOSTED>20200120090000</DTPOSTED>
            <TRNAMT>45000.00</TRNAMT>
            <NAME>EMPLOYER LLC</NAME>
            <MEMO>Salary</MEMO>
          </STMTTRN>
        </BANKTRANLIST>
        <LEDGERBAL>
          <BALAMT>43500.00</BALAMT>
        </LEDGERBAL>
      </STMTRS>
    </STMTTRNRS>
  </BANKMSGSRSV1>
</OFX>"#;

const RBA_OLD_FIXTURE: &str = "\
Дата транзакции;Описание;Валюта операции;Сумма в валюте операции;Валюта счета;Сумма в валюте счета
31.12.2010 00:00;Interest;RUB;1 234.56;RUB;1 234.56
02.11.2011 00:00;Перевод;RUB;-100 000.00;RUB;-100 000.00
";

const RBA_NEW_FIXTURE: &str = "\
Дата операции;Выполнено банком;Номер документа;Сумма в валюте операции (поступления);Сумма в валюте операции (расходы);Валюта операции;Сумма в валюте счета (поступления);Сумма в валюте счета (расходы);Валюта счета;Детали операции (назначение платежа);Номер карты
29.04.2024 10:00;30.04.2024;101;4 563,33;;RUB;4 563,33;;RUB;Какой-то приход;
";

const ALFA_FIXTURE: &str = "\
Тип счёта;Номер счёта;Валюта;Дата операции;Референс проводки;Описание операции;Приход;Расход;
Текущий счёт;40817810800000123456;RUR;12.01.19;B0987654;Зачисление заработной платы;50000,00;0;
Текущий счёт;40817810800000123456;RUR;13.01.19;HOLD;Карта 5555 ожидает обработки;0;700,00;
";

const YANDEX_FIXTURE: &str = "\
Яндекс.Деньги Счёт №410011234567890;;;;;
Выписка по кошельку за период 01.01.2020 — 31.01.2020;;;;;
;;;;;
Всего поступлений: 2500,00;;;;;
Всего списаний: 450,00;;;;;
+/-;Дата;Сумма;Валюта;Статус;Описание
-;20.01.2020 08:15:00;450,00;RUB;Успешно;Оплата мобильной связи
";

const SBERBANK_FIXTURE: &str = r#"<html>
<head><meta name="template-details" content="HTML_DEBIT_RUS_REPORT, 10.12.2019, 2.1.29"></head>
<body>
  <table>
    <tr><td>Номер счёта карты</td><td>40817 810 8 0000 123456</td></tr>
  </table>
  <table>
    <tr><td>15.01.2020</td><td>16.01.2020</td><td>SUPERMARKET MOSCOW RU</td><td>Супермаркеты</td><td>1 234,56</td></tr>
  </table>
</body>
</html>"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fixtures() -> Vec<(StatementType, RawStatementData)> {
    let (old_bytes, _, _) = WINDOWS_1251.encode(RBA_OLD_FIXTURE);
    let (alfa_bytes, _, _) = WINDOWS_1251.encode(ALFA_FIXTURE);
    vec![
        (StatementType::Ofx, RawStatementData::from(OFX_FIXTURE)),
        (
            StatementType::RbaCsvOld,
            RawStatementData::new(old_bytes.into_owned()),
        ),
        (
            StatementType::RbaCsvNew,
            RawStatementData::from(RBA_NEW_FIXTURE),
        ),
        (
            StatementType::AlfaCsv,
            RawStatementData::new(alfa_bytes.into_owned()),
        ),
        (
            StatementType::YandexMoneyCsv,
            RawStatementData::from(YANDEX_FIXTURE),
        ),
        (
            StatementType::SberbankHtml,
            RawStatementData::from(SBERBANK_FIXTURE),
        ),
    ]
}

#[test]
fn test_detection_is_mutually_exclusive() {
    for (expected, data) in fixtures() {
        assert_eq!(detect_type(&data), expected);

        // no other strategy claims this fixture
        for strategy in strategies() {
            let detected = strategy.detect(&data);
            assert!(
                detected == expected || detected == StatementType::Unknown,
                "fixture for {expected:?} was also detected as {detected:?}"
            );
        }
    }
}

#[test]
fn test_every_fixture_parses() {
    let lookup = MemoryCache::with_currencies(vec![Currency::new("RUB", "Russian rouble")]);
    for (expected, data) in fixtures() {
        let statement = parse_statement(&data, &lookup).unwrap();
        assert_eq!(statement.statement_type(), expected);
        assert!(!statement.records().is_empty());
    }
}

#[test]
fn test_dispatcher_rejects_unknown_content() {
    let data = RawStatementData::new(vec![0x13, 0x37, 0xde, 0xad, 0xbe, 0xef]);
    assert!(matches!(
        parse_statement(&data, &MemoryCache::new()),
        Err(StatementError::UnsupportedFormat)
    ));
}

#[test]
fn test_parsing_is_idempotent() {
    let lookup = MemoryCache::new();
    for (_, data) in fixtures() {
        let first = parse_statement(&data, &lookup).unwrap();
        let second = parse_statement(&data, &lookup).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_ofx_import_and_reconciliation_workflow() {
    let lookup = MemoryCache::with_currencies(vec![Currency::new("RUB", "Russian rouble")]);
    let statement = parse_statement(&RawStatementData::from(OFX_FIXTURE), &lookup).unwrap();

    assert_eq!(statement.account_number(), "40817810000000054321");
    assert_eq!(statement.balance(), &"43500.00".parse::<BigDecimal>().unwrap());

    let triples: Vec<_> = statement
        .records()
        .iter()
        .map(|r| (r.actual(), r.description().to_string(), r.amount().to_string()))
        .collect();
    assert_eq!(
        triples,
        vec![
            (
                date(2020, 1, 15),
                "Weekly groceries".to_string(),
                "-1500.00".to_string()
            ),
            (date(2020, 1, 20), "Salary".to_string(), "45000.00".to_string()),
        ]
    );

    // scan a small ledger for matches of the first record
    let card_account = Uuid::new_v4();
    let expenses = Uuid::new_v4();
    let ledger = vec![
        Transaction::new("1500.00".parse().unwrap(), date(2020, 1, 15), expenses, card_account)
            .with_comment("Groceries"),
        Transaction::new("1500.00".parse().unwrap(), date(2020, 2, 15), expenses, card_account),
        Transaction::new("99.00".parse().unwrap(), date(2020, 1, 15), expenses, card_account),
    ];

    let predicate = StatementPredicate::new(card_account, &statement.records()[0], false);
    let matches: Vec<_> = ledger.iter().filter(|t| predicate.matches(t)).collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].comment, "Groceries");
}

#[test]
fn test_statement_serialization_round_trip() {
    let lookup = MemoryCache::with_currencies(vec![Currency::new("RUB", "Russian rouble")]);
    let statement = parse_statement(&RawStatementData::from(OFX_FIXTURE), &lookup).unwrap();

    let json = serde_json::to_string(&statement).unwrap();
    let restored = serde_json::from_str(&json).unwrap();
    assert_eq!(statement, restored);
}

#[test]
fn test_hold_rows_never_reach_the_statement() {
    let (bytes, _, _) = WINDOWS_1251.encode(ALFA_FIXTURE);
    let statement =
        parse_statement(&RawStatementData::new(bytes.into_owned()), &MemoryCache::new()).unwrap();
    assert_eq!(statement.records().len(), 1);
    assert_eq!(statement.records()[0].description(), "Зачисление заработной платы");
}
