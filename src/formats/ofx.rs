//! OFX bank statement strategy
//!
//! OFX documents can carry both bank account and credit card statement
//! sections. The first bank account section is preferred; a credit card
//! section is used only when no bank section exists. Transactions map 1:1 to
//! statement records: `DTPOSTED` is the actual date, `DTAVAIL` the execution
//! date, `MEMO` the description and `TRNAMT` the amount, sign included.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::traits::{CurrencyLookup, FormatStrategy};
use crate::types::{
    RawStatementData, Statement, StatementError, StatementRecordBuilder, StatementResult,
    StatementType,
};

const BANK_SECTION: &str = "STMTRS";
const CREDIT_CARD_SECTION: &str = "CCSTMTRS";
const TRANSACTION: &str = "STMTTRN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Bank,
    CreditCard,
}

#[derive(Debug, Default)]
struct OfxTransaction {
    date_posted: Option<String>,
    date_available: Option<String>,
    amount: String,
    name: String,
    memo: String,
}

#[derive(Debug, Default)]
struct OfxSection {
    currency: String,
    account_number: String,
    balance: Option<String>,
    transactions: Vec<OfxTransaction>,
}

/// Strategy for the OFX XML statement export
pub struct OfxParser;

impl FormatStrategy for OfxParser {
    fn detect(&self, data: &RawStatementData) -> StatementType {
        if data.content().contains("<OFX>") {
            StatementType::Ofx
        } else {
            StatementType::Unknown
        }
    }

    fn parse(
        &self,
        data: &RawStatementData,
        lookup: &dyn CurrencyLookup,
    ) -> StatementResult<Statement> {
        let sections = read_sections(data.content())?;
        let section = sections
            .iter()
            .find(|(kind, _)| *kind == SectionKind::Bank)
            .or_else(|| {
                sections
                    .iter()
                    .find(|(kind, _)| *kind == SectionKind::CreditCard)
            });
        let Some((_, section)) = section else {
            return Err(StatementError::Malformed(
                "no statement section found in OFX document".to_string(),
            ));
        };

        let mut records = Vec::with_capacity(section.transactions.len());
        for (index, transaction) in section.transactions.iter().enumerate() {
            let number = index + 1;
            let posted = transaction.date_posted.as_deref().ok_or_else(|| {
                StatementError::Malformed(format!("transaction {number}: missing DTPOSTED"))
            })?;

            let mut builder = StatementRecordBuilder::new()
                .actual(parse_ofx_date(posted, number)?)
                .description(transaction.memo.clone())
                .counter_party(transaction.name.clone())
                .currency(section.currency.clone())
                .amount(transaction.amount.clone());
            if let Some(available) = transaction.date_available.as_deref() {
                builder = builder.execution(parse_ofx_date(available, number)?);
            }
            records.push(builder.build(lookup)?);
        }

        let mut statement =
            Statement::new(StatementType::Ofx, section.account_number.clone(), records);
        if let Some(balance) = section.balance.as_deref() {
            let balance = balance.trim().parse::<BigDecimal>().map_err(|_| {
                StatementError::Malformed(format!("invalid ledger balance '{balance}'"))
            })?;
            statement = statement.with_balance(balance);
        }
        Ok(statement)
    }
}

/// OFX timestamps are `yyyyMMddHHmmss`, optionally followed by fractional
/// seconds and a timezone suffix; only the leading date digits matter.
fn parse_ofx_date(value: &str, transaction: usize) -> StatementResult<NaiveDate> {
    let trimmed = value.trim();
    trimmed
        .get(..8)
        .and_then(|digits| NaiveDate::parse_from_str(digits, "%Y%m%d").ok())
        .ok_or_else(|| {
            StatementError::Malformed(format!(
                "transaction {transaction}: invalid OFX date '{trimmed}'"
            ))
        })
}

/// Collect every statement section of the document in source order
fn read_sections(content: &str) -> StatementResult<Vec<(SectionKind, OfxSection)>> {
    let mut reader = Reader::from_str(content);
    let mut path: Vec<String> = Vec::new();
    let mut sections: Vec<(SectionKind, OfxSection)> = Vec::new();
    let mut section: Option<(SectionKind, OfxSection)> = None;
    let mut transaction: Option<OfxTransaction> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                match name.as_str() {
                    BANK_SECTION if section.is_none() => {
                        section = Some((SectionKind::Bank, OfxSection::default()));
                    }
                    CREDIT_CARD_SECTION if section.is_none() => {
                        section = Some((SectionKind::CreditCard, OfxSection::default()));
                    }
                    TRANSACTION => transaction = Some(OfxTransaction::default()),
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::End(end)) => {
                match String::from_utf8_lossy(end.name().as_ref()).as_ref() {
                    BANK_SECTION | CREDIT_CARD_SECTION => {
                        if let Some(finished) = section.take() {
                            sections.push(finished);
                        }
                    }
                    TRANSACTION => {
                        if let (Some(finished), Some((_, current))) =
                            (transaction.take(), section.as_mut())
                        {
                            current.transactions.push(finished);
                        }
                    }
                    _ => {}
                }
                path.pop();
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|err| {
                        StatementError::Malformed(format!(
                            "invalid character data at byte {}: {err}",
                            reader.buffer_position()
                        ))
                    })?
                    .trim()
                    .to_string();
                if value.is_empty() {
                    continue;
                }
                let Some(element) = path.last() else {
                    continue;
                };
                if let Some(current) = transaction.as_mut() {
                    match element.as_str() {
                        "DTPOSTED" => current.date_posted = Some(value),
                        "DTAVAIL" => current.date_available = Some(value),
                        "TRNAMT" => current.amount = value,
                        "NAME" => current.name = value,
                        "MEMO" => current.memo = value,
                        _ => {}
                    }
                } else if let Some((_, current)) = section.as_mut() {
                    match element.as_str() {
                        "CURDEF" => current.currency = value,
                        "ACCTID"
                            if path
                                .iter()
                                .any(|p| p == "BANKACCTFROM" || p == "CCACCTFROM") =>
                        {
                            current.account_number = value;
                        }
                        "BALAMT" if path.iter().any(|p| p == "LEDGERBAL") => {
                            current.balance = Some(value);
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(StatementError::Malformed(format!(
                    "invalid statement markup at byte {}: {err}",
                    reader.buffer_position()
                )));
            }
        }
    }

    Ok(sections)
}
