use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Entity families that can fail to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Account,
    Category,
    Transaction,
    Budget,
    Recurring,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Account => "Account",
            EntityKind::Category => "Category",
            EntityKind::Transaction => "Transaction",
            EntityKind::Budget => "Budget",
            EntityKind::Recurring => "Recurring transaction",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: Uuid },
    #[error("Category {0} already has a budget")]
    DuplicateBudget(Uuid),
    #[error("Invalid schedule: day of month {0} is outside 1..=31")]
    InvalidSchedule(u32),
    #[error("Budget {budget_id} drifted: recorded {recorded}, ledger total {expected}")]
    AggregateDrift {
        budget_id: Uuid,
        recorded: Decimal,
        expected: Decimal,
    },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Ledger not found: {0}")]
    LedgerNotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Ledger lock poisoned")]
    Poisoned,
}

impl CoreError {
    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        CoreError::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. } | CoreError::LedgerNotFound(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
