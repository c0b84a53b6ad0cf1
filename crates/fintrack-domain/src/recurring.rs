use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    calendar,
    common::{Identifiable, NamedEntity},
    transaction::{TransactionDraft, TransactionType},
};

pub const MIN_DAY_OF_MONTH: u32 = 1;
pub const MAX_DAY_OF_MONTH: u32 = 31;

/// Lifecycle of a recurring definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleState {
    /// No period has been materialized yet.
    Scheduled,
    /// Materialized through `last_execution_date`.
    CaughtUp,
}

/// A monthly charge or income that the scheduler turns into ledger entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringTransaction {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub day_of_month: u32,
    /// Watermark: the most recent materialized scheduled date.
    #[serde(default)]
    pub last_execution_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl RecurringTransaction {
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        kind: TransactionType,
        account_id: Uuid,
        category_id: Uuid,
        day_of_month: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            amount,
            kind,
            account_id,
            category_id,
            day_of_month,
            last_execution_date: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn created_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_at = timestamp;
        self
    }

    pub fn has_valid_day(&self) -> bool {
        (MIN_DAY_OF_MONTH..=MAX_DAY_OF_MONTH).contains(&self.day_of_month)
    }

    pub fn state(&self) -> ScheduleState {
        match self.last_execution_date {
            Some(_) => ScheduleState::CaughtUp,
            None => ScheduleState::Scheduled,
        }
    }

    /// Scheduled date within the given month, clamped for short months.
    pub fn scheduled_in(&self, year: i32, month: u32) -> Option<NaiveDate> {
        if !self.has_valid_day() {
            return None;
        }
        calendar::clamped_date(year, month, self.day_of_month)
    }

    /// Draft for the entry materialized on `date`.
    pub fn draft_for(&self, date: NaiveDate) -> TransactionDraft {
        TransactionDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            amount: self.amount,
            kind: self.kind,
            account_id: self.account_id,
            category_id: self.category_id,
            budget_id: None,
            recurring_id: Some(self.id),
            created_at: Some(calendar::midnight_utc(date)),
        }
    }
}

impl Identifiable for RecurringTransaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for RecurringTransaction {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rent(day: u32) -> RecurringTransaction {
        RecurringTransaction::new(
            "Rent",
            Decimal::new(95000, 2),
            TransactionType::Bill,
            Uuid::new_v4(),
            Uuid::new_v4(),
            day,
        )
    }

    #[test]
    fn scheduled_in_clamps_short_months() {
        let definition = rent(31);
        assert_eq!(
            definition.scheduled_in(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            definition.scheduled_in(2023, 2),
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
        assert_eq!(
            definition.scheduled_in(2024, 6),
            NaiveDate::from_ymd_opt(2024, 6, 30)
        );
    }

    #[test]
    fn invalid_days_never_schedule() {
        assert_eq!(rent(0).scheduled_in(2024, 1), None);
        assert_eq!(rent(32).scheduled_in(2024, 1), None);
        assert!(!rent(32).has_valid_day());
    }

    #[test]
    fn draft_carries_idempotency_token() {
        let definition = rent(5);
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let draft = definition.draft_for(date);
        assert_eq!(draft.recurring_id, Some(definition.id));
        assert_eq!(draft.created_at.map(|ts| ts.date_naive()), Some(date));
        assert_eq!(definition.state(), ScheduleState::Scheduled);
    }
}
