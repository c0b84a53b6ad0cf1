use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Identifiable, NamedEntity};

/// Direction of a ledger entry. Amounts are stored unsigned; the type
/// carries the sign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Bill,
}

impl TransactionType {
    pub fn is_bill(self) -> bool {
        matches!(self, TransactionType::Bill)
    }

    /// Applies the type's sign to an unsigned amount.
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Income => amount,
            TransactionType::Bill => -amount,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionType::Income => "INCOME",
            TransactionType::Bill => "BILL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTransactionTypeError(pub String);

impl fmt::Display for ParseTransactionTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown transaction type `{}`", self.0)
    }
}

impl std::error::Error for ParseTransactionTypeError {}

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" | "ingreso" => Ok(TransactionType::Income),
            "bill" | "gasto" | "expense" => Ok(TransactionType::Bill),
            other => Err(ParseTransactionTypeError(other.to_string())),
        }
    }
}

/// A single ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_id: Uuid,
    pub category_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<Uuid>,
    /// Recurring definition that materialized this entry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Calendar date (UTC) the transaction is booked on.
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    /// Whether this entry consumes the given budget.
    pub fn consumes(&self, budget_id: Uuid) -> bool {
        self.kind.is_bill() && self.budget_id == Some(budget_id)
    }

    /// Case-insensitive substring match over name and description.
    /// `needle` must already be lowercase.
    pub fn mentions(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(needle))
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Transaction {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Input for creating or replacing a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_id: Uuid,
    pub category_id: Uuid,
    #[serde(default)]
    pub budget_id: Option<Uuid>,
    #[serde(default)]
    pub recurring_id: Option<Uuid>,
    /// Defaults to the service clock's "now" when absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TransactionDraft {
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        kind: TransactionType,
        account_id: Uuid,
        category_id: Uuid,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            amount,
            kind,
            account_id,
            category_id,
            budget_id: None,
            recurring_id: None,
            created_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_budget(mut self, budget_id: Uuid) -> Self {
        self.budget_id = Some(budget_id);
        self
    }

    pub fn created_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_at = Some(timestamp);
        self
    }

    /// Builds the stored record, falling back to `now` for the timestamp.
    pub fn into_transaction(self, id: Uuid, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            name: self.name,
            description: self
                .description
                .filter(|text| !text.trim().is_empty()),
            amount: self.amount,
            kind: self.kind,
            account_id: self.account_id,
            category_id: self.category_id,
            budget_id: self.budget_id,
            recurring_id: self.recurring_id,
            created_at: self.created_at.unwrap_or(now),
        }
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(txn: &Transaction) -> Self {
        Self {
            name: txn.name.clone(),
            description: txn.description.clone(),
            amount: txn.amount,
            kind: txn.kind,
            account_id: txn.account_id,
            category_id: txn.category_id,
            budget_id: txn.budget_id,
            recurring_id: txn.recurring_id,
            created_at: Some(txn.created_at),
        }
    }
}
