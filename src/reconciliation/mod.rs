//! Reconciliation of imported statement records against ledger transactions
//!
//! Banks are inconsistent about which of the transaction and settlement
//! dates they report, and a statement line can be denominated in a foreign
//! currency while the ledger stores the converted amount. The matching rule
//! is therefore deliberately permissive: it ORs over the plausible dates and
//! over both amounts. A missed hint costs more than an occasional false
//! positive — a human confirms the final match.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::{StatementRecord, Transaction};

/// Decides whether a ledger transaction corresponds to one statement record
///
/// A transaction matches when all three hold:
/// 1. it debits or credits the captured account;
/// 2. its transaction date or statement date equals the record's actual
///    date — or, unless `ignore_execution_date` is set, the record's
///    execution date;
/// 3. its amount equals the absolute value of the record's amount or of the
///    record's converted amount.
///
/// The amount check is an intentional approximation: an unrelated
/// transaction with the same absolute amount on the same date will match
/// too, because the source statements carry no stronger correlation key.
/// Evaluation is pure and side-effect free; a record with no parseable
/// amount never matches.
#[derive(Debug, Clone)]
pub struct StatementPredicate {
    account_uuid: Uuid,
    record: StatementRecord,
    ignore_execution_date: bool,
}

impl StatementPredicate {
    /// Capture the account scope, the target record and the date policy
    pub fn new(account_uuid: Uuid, record: &StatementRecord, ignore_execution_date: bool) -> Self {
        Self {
            account_uuid,
            record: record.clone(),
            ignore_execution_date,
        }
    }

    /// Evaluate the predicate against one ledger transaction
    pub fn matches(&self, transaction: &Transaction) -> bool {
        let account_matches = transaction.account_debited_uuid == self.account_uuid
            || transaction.account_credited_uuid == self.account_uuid;

        let date_matches = date_matches(self.record.actual(), transaction)
            || (!self.ignore_execution_date && date_matches(self.record.execution(), transaction));

        let amount_matches = amount_matches(self.record.amount_decimal(), transaction)
            || amount_matches(self.record.account_amount_decimal(), transaction);

        account_matches && date_matches && amount_matches
    }
}

fn date_matches(date: NaiveDate, transaction: &Transaction) -> bool {
    transaction.transaction_date == date || transaction.statement_date == date
}

fn amount_matches(amount: Option<&BigDecimal>, transaction: &Transaction) -> bool {
    amount
        .map(|value| value.abs() == transaction.amount)
        .unwrap_or(false)
}
