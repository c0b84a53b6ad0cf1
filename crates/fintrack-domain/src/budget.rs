use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::Identifiable;

/// A spending ceiling for a single category.
///
/// `current_amount` is the non-negative amount consumed so far: the sum of
/// every bill transaction tagged with this budget's id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Budget {
    pub id: Uuid,
    pub category_id: Uuid,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    pub amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
}

impl Budget {
    pub fn new(category_id: Uuid, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id,
            owner_id: None,
            amount,
            current_amount: Decimal::ZERO,
        }
    }

    pub fn with_owner(mut self, owner_id: Option<Uuid>) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn is_over_budget(&self) -> bool {
        self.current_amount.abs() > self.amount
    }

    /// Ceiling minus consumption; negative once the budget is exceeded.
    pub fn remaining(&self) -> Decimal {
        self.amount - self.current_amount.abs()
    }

    /// Consumption as a percentage of the ceiling, `None` for a zero ceiling.
    pub fn percent_used(&self) -> Option<Decimal> {
        if self.amount.is_zero() {
            return None;
        }
        Some((self.current_amount.abs() / self.amount * Decimal::ONE_HUNDRED).round_dp(2))
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}
