//! Core types and data structures for statement import

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::CurrencyLookup;

/// Recognized statement dialects
///
/// Every supported export format has its own variant; `Unknown` is returned
/// by detection when the content matches none of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    /// OFX bank statement (XML)
    Ofx,
    /// Raiffeisen account statement, original CSV layout
    RbaCsvOld,
    /// Raiffeisen account statement, current CSV layout
    RbaCsvNew,
    /// Alfa-Bank account statement CSV with separate debit/credit columns
    AlfaCsv,
    /// Yandex Money wallet history CSV
    YandexMoneyCsv,
    /// Sberbank card statement HTML export
    SberbankHtml,
    /// Content matched no supported dialect
    Unknown,
}

/// Raw content of one imported statement file
///
/// Wraps the byte buffer handed over by the import workflow together with a
/// lossy UTF-8 view used for format sniffing. Strategies that need an exact
/// charset decode the bytes themselves.
#[derive(Debug, Clone)]
pub struct RawStatementData {
    bytes: Vec<u8>,
    content: String,
}

impl RawStatementData {
    /// Wrap the file contents of one import attempt
    pub fn new(bytes: Vec<u8>) -> Self {
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Self { bytes, content }
    }

    /// Original bytes as read from the file
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lossy UTF-8 view of the content, for detection heuristics
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl From<Vec<u8>> for RawStatementData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for RawStatementData {
    fn from(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }
}

/// Ledger currency record resolved through the injected lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Unique identifier of the currency in the ledger
    pub uuid: Uuid,
    /// Three-letter code or symbol as printed on statements
    pub symbol: String,
    /// Human-readable description
    pub description: String,
}

impl Currency {
    /// Create a new currency record
    pub fn new(symbol: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            symbol: symbol.into(),
            description: description.into(),
        }
    }
}

/// One canonical line item within a parsed statement
///
/// Amounts are kept in their normalized string form exactly as signed in the
/// source, together with a parsed decimal when the string is a valid number.
/// Sign is never flipped during normalization; only separators are rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    actual: NaiveDate,
    execution: NaiveDate,
    description: String,
    counter_party: String,
    place: String,
    country: String,
    currency: String,
    currency_uuid: Option<Uuid>,
    amount: String,
    account_currency: String,
    account_currency_uuid: Option<Uuid>,
    account_amount: String,
    amount_decimal: Option<BigDecimal>,
    account_amount_decimal: Option<BigDecimal>,
}

impl StatementRecord {
    /// Transaction date as reported by the bank
    pub fn actual(&self) -> NaiveDate {
        self.actual
    }

    /// Settlement date; equals [`actual`](Self::actual) when the source has none
    pub fn execution(&self) -> NaiveDate {
        self.execution
    }

    /// Free-text description or category of the line item
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Merchant or counterparty name, when the source reports one
    pub fn counter_party(&self) -> &str {
        &self.counter_party
    }

    /// City of the transaction, when the source reports one
    pub fn place(&self) -> &str {
        &self.place
    }

    /// Country of the transaction, when the source reports one
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Currency code of the operation as printed in the source
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Ledger currency matching [`currency`](Self::currency), if resolved
    pub fn currency_uuid(&self) -> Option<Uuid> {
        self.currency_uuid
    }

    /// Normalized signed amount string; negative means debit
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Currency of the ledger account the statement belongs to
    pub fn account_currency(&self) -> &str {
        &self.account_currency
    }

    /// Ledger currency matching [`account_currency`](Self::account_currency)
    pub fn account_currency_uuid(&self) -> Option<Uuid> {
        self.account_currency_uuid
    }

    /// Amount converted into the account currency, normalized
    pub fn account_amount(&self) -> &str {
        &self.account_amount
    }

    /// Parsed amount, `None` when the source value is not a number
    pub fn amount_decimal(&self) -> Option<&BigDecimal> {
        self.amount_decimal.as_ref()
    }

    /// Parsed converted amount, `None` when the source value is not a number
    pub fn account_amount_decimal(&self) -> Option<&BigDecimal> {
        self.account_amount_decimal.as_ref()
    }

    /// Rewrite locale separators: decimal comma becomes a dot, grouping
    /// spaces (including NBSP) are dropped. The sign is left untouched.
    fn normalize_amount(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                ',' => result.push('.'),
                ' ' | '\u{a0}' => {}
                _ => result.push(ch),
            }
        }
        result
    }

    fn to_decimal(value: &str) -> Option<BigDecimal> {
        value
            .parse::<BigDecimal>()
            .ok()
            .map(|d| d.with_scale_round(2, RoundingMode::HalfUp))
    }
}

/// Builder for [`StatementRecord`]
///
/// Fills in the defaults every dialect relies on: a missing execution date
/// falls back to the actual date and a missing converted amount falls back to
/// the primary amount. Currency codes are resolved through the lookup at
/// build time.
#[derive(Debug, Default)]
pub struct StatementRecordBuilder {
    actual: Option<NaiveDate>,
    execution: Option<NaiveDate>,
    description: String,
    counter_party: String,
    place: String,
    country: String,
    currency: String,
    amount: String,
    account_currency: String,
    account_amount: Option<String>,
}

impl StatementRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actual(mut self, actual: NaiveDate) -> Self {
        self.actual = Some(actual);
        self
    }

    pub fn execution(mut self, execution: NaiveDate) -> Self {
        self.execution = Some(execution);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn counter_party(mut self, counter_party: impl Into<String>) -> Self {
        self.counter_party = counter_party.into();
        self
    }

    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.place = place.into();
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = amount.into();
        self
    }

    pub fn account_currency(mut self, account_currency: impl Into<String>) -> Self {
        self.account_currency = account_currency.into();
        self
    }

    pub fn account_amount(mut self, account_amount: impl Into<String>) -> Self {
        self.account_amount = Some(account_amount.into());
        self
    }

    /// Finalize the record, resolving currencies through the ledger lookup
    pub fn build(self, lookup: &dyn CurrencyLookup) -> StatementResult<StatementRecord> {
        let actual = self.actual.ok_or_else(|| {
            StatementError::Malformed("statement record has no transaction date".to_string())
        })?;
        let execution = self.execution.unwrap_or(actual);
        let account_amount = self.account_amount.unwrap_or_else(|| self.amount.clone());

        let currency_uuid = lookup.find_currency(&self.currency).map(|c| c.uuid);
        let account_currency_uuid = lookup
            .find_currency(&self.account_currency)
            .map(|c| c.uuid);

        let amount = StatementRecord::normalize_amount(&self.amount);
        let account_amount = StatementRecord::normalize_amount(&account_amount);
        let amount_decimal = StatementRecord::to_decimal(&amount);
        let account_amount_decimal = StatementRecord::to_decimal(&account_amount);

        Ok(StatementRecord {
            actual,
            execution,
            description: self.description,
            counter_party: self.counter_party,
            place: self.place,
            country: self.country,
            currency: self.currency,
            currency_uuid,
            amount,
            account_currency: self.account_currency,
            account_currency_uuid,
            account_amount,
            amount_decimal,
            account_amount_decimal,
        })
    }
}

/// Parsed result of one imported statement file
///
/// Records keep the order they have in the source file. The statement is
/// produced once per import and is not modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    statement_type: StatementType,
    account_number: String,
    records: Vec<StatementRecord>,
    balance: BigDecimal,
}

impl Statement {
    /// Create a statement with a zero balance
    pub fn new(
        statement_type: StatementType,
        account_number: impl Into<String>,
        records: Vec<StatementRecord>,
    ) -> Self {
        Self {
            statement_type,
            account_number: account_number.into(),
            records,
            balance: BigDecimal::from(0),
        }
    }

    /// Attach the closing balance reported by the statement
    pub fn with_balance(mut self, balance: BigDecimal) -> Self {
        self.balance = balance;
        self
    }

    /// Dialect this statement was parsed from
    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    /// Account number found in the statement; empty when the source has none
    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    /// Line items in source order
    pub fn records(&self) -> &[StatementRecord] {
        &self.records
    }

    /// Closing balance; zero when the source does not report one
    pub fn balance(&self) -> &BigDecimal {
        &self.balance
    }
}

/// Ledger transaction as seen by the reconciliation predicate
///
/// Only the fields the matching rule needs are carried here; the full ledger
/// model lives outside this crate. `amount` is the unsigned magnitude, the
/// debit/credit direction is expressed by the two account references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier of the transaction
    pub uuid: Uuid,
    /// Unsigned transaction amount in the account currency
    pub amount: BigDecimal,
    /// Date the transaction was recorded under
    pub transaction_date: NaiveDate,
    /// Explicit statement date tag; equals `transaction_date` unless set
    pub statement_date: NaiveDate,
    /// Account the transaction debits
    pub account_debited_uuid: Uuid,
    /// Account the transaction credits
    pub account_credited_uuid: Uuid,
    /// Free-form comment
    pub comment: String,
}

impl Transaction {
    /// Create a transaction; the statement date defaults to the transaction date
    pub fn new(
        amount: BigDecimal,
        transaction_date: NaiveDate,
        account_debited_uuid: Uuid,
        account_credited_uuid: Uuid,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            amount,
            transaction_date,
            statement_date: transaction_date,
            account_debited_uuid,
            account_credited_uuid,
            comment: String::new(),
        }
    }

    /// Tag the transaction with the bank statement date it settled under
    pub fn with_statement_date(mut self, statement_date: NaiveDate) -> Self {
        self.statement_date = statement_date;
        self
    }

    /// Attach a comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Errors that can occur while importing a statement
///
/// All variants are terminal for the current import attempt; the caller
/// surfaces the error and discards partial state.
#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    /// No strategy recognized the content
    #[error("unsupported statement format")]
    UnsupportedFormat,
    /// Dialect recognized but the content is corrupt
    #[error("malformed statement content: {0}")]
    Malformed(String),
    /// Declared or assumed character set cannot decode the bytes
    #[error("statement encoding error: {0}")]
    Encoding(String),
}

/// Result type for statement operations
pub type StatementResult<T> = Result<T, StatementError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryCache;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_amount_separators() {
        assert_eq!(StatementRecord::normalize_amount("1 234.56"), "1234.56");
        assert_eq!(StatementRecord::normalize_amount("-100 000.00"), "-100000.00");
        assert_eq!(StatementRecord::normalize_amount("4 563,33"), "4563.33");
        assert_eq!(StatementRecord::normalize_amount("7\u{a0}856,12"), "7856.12");
        assert_eq!(StatementRecord::normalize_amount("-42"), "-42");
    }

    #[test]
    fn test_builder_defaults() {
        let lookup = MemoryCache::new();
        let record = StatementRecordBuilder::new()
            .actual(date(2024, 1, 15))
            .description("Grocery store")
            .amount("-1 234,50")
            .build(&lookup)
            .unwrap();

        assert_eq!(record.execution(), date(2024, 1, 15));
        assert_eq!(record.amount(), "-1234.50");
        assert_eq!(record.account_amount(), "-1234.50");
        assert_eq!(
            record.amount_decimal(),
            Some(&"-1234.50".parse::<BigDecimal>().unwrap())
        );
    }

    #[test]
    fn test_builder_requires_actual_date() {
        let lookup = MemoryCache::new();
        let result = StatementRecordBuilder::new().amount("1.00").build(&lookup);
        assert!(matches!(result, Err(StatementError::Malformed(_))));
    }

    #[test]
    fn test_unparseable_amount_has_no_decimal() {
        let lookup = MemoryCache::new();
        let record = StatementRecordBuilder::new()
            .actual(date(2024, 1, 15))
            .amount("n/a")
            .build(&lookup)
            .unwrap();
        assert!(record.amount_decimal().is_none());
        assert!(record.account_amount_decimal().is_none());
    }

    #[test]
    fn test_currency_resolution() {
        let mut lookup = MemoryCache::new();
        let rub = Currency::new("RUB", "Российский рубль");
        let rub_uuid = rub.uuid;
        lookup.add_currency(rub);

        let record = StatementRecordBuilder::new()
            .actual(date(2024, 1, 15))
            .amount("100.00")
            .currency("rub")
            .account_currency("EUR")
            .build(&lookup)
            .unwrap();

        assert_eq!(record.currency_uuid(), Some(rub_uuid));
        assert_eq!(record.account_currency_uuid(), None);
    }

    #[test]
    fn test_amount_rounding() {
        assert_eq!(
            StatementRecord::to_decimal("10.005"),
            Some("10.01".parse::<BigDecimal>().unwrap())
        );
        assert_eq!(StatementRecord::to_decimal(""), None);
    }

    #[test]
    fn test_statement_defaults() {
        let statement = Statement::new(StatementType::Ofx, "", vec![]);
        assert_eq!(statement.account_number(), "");
        assert_eq!(statement.balance(), &BigDecimal::from(0));
        assert!(statement.records().is_empty());
    }

    #[test]
    fn test_transaction_statement_date_defaults() {
        let t = Transaction::new(
            BigDecimal::from(100),
            date(2024, 3, 1),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        assert_eq!(t.statement_date, t.transaction_date);

        let tagged = t.clone().with_statement_date(date(2024, 3, 3));
        assert_eq!(tagged.statement_date, date(2024, 3, 3));
        assert_eq!(tagged.transaction_date, date(2024, 3, 1));
    }
}
