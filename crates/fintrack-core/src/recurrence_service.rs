//! Catch-up execution of monthly recurring definitions.
//!
//! Each definition carries a watermark (`last_execution_date`). Processing
//! materializes every scheduled date after the watermark up to `as_of`, one
//! transaction per calendar month, and moves the watermark forward after
//! each one. Dates already present in the ledger for the same definition are
//! skipped, so re-running never duplicates entries.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use fintrack_domain::{
    calendar, position_of, Ledger, RecurringTransaction, Transaction, MAX_DAY_OF_MONTH,
    MIN_DAY_OF_MONTH,
};

use crate::{
    error::{CoreError, CoreResult, EntityKind},
    ledger_service::LedgerService,
    time::Clock,
};

/// Upper bound on the months a single call will walk through.
pub const MAX_CATCH_UP_PERIODS: usize = 1024;

/// A definition that could not be processed during a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessFailure {
    pub recurring_id: Uuid,
    pub name: String,
    pub error: String,
}

/// Outcome of processing one or more definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub created: Vec<Transaction>,
    pub failures: Vec<ProcessFailure>,
}

impl ProcessReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct RecurrenceService;

impl RecurrenceService {
    /// Registers a new definition after validating its schedule and references.
    pub fn create(
        ledger: &mut Ledger,
        definition: RecurringTransaction,
    ) -> CoreResult<RecurringTransaction> {
        Self::validate_day(definition.day_of_month)?;
        if definition.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "recurring transaction name must not be empty".into(),
            ));
        }
        if definition.amount.is_sign_negative() {
            return Err(CoreError::Validation(format!(
                "recurring amount must not be negative (got {})",
                definition.amount
            )));
        }
        Self::ensure_references(ledger, &definition)?;
        ledger.recurring.push(definition.clone());
        ledger.touch();
        info!(
            "scheduled recurring {} ({}) on day {}",
            definition.id, definition.name, definition.day_of_month
        );
        Ok(definition)
    }

    /// Moves the definition to another day of the month. The watermark is
    /// kept, so already materialized months are not revisited.
    pub fn update_day(
        ledger: &mut Ledger,
        id: Uuid,
        day_of_month: u32,
    ) -> CoreResult<RecurringTransaction> {
        Self::validate_day(day_of_month)?;
        let definition = ledger
            .recurring_mut(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Recurring, id))?;
        definition.day_of_month = day_of_month;
        let definition = definition.clone();
        ledger.touch();
        Ok(definition)
    }

    /// Deletes the definition. Transactions it produced stay in the ledger.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> CoreResult<RecurringTransaction> {
        let index = position_of(&ledger.recurring, id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Recurring, id))?;
        let removed = ledger.recurring.remove(index);
        ledger.touch();
        Ok(removed)
    }

    /// Scheduled dates after the watermark up to and including `as_of`.
    ///
    /// Without a watermark the schedule starts at the creation date
    /// (inclusive). Short months clamp to their last day.
    pub fn due_dates(definition: &RecurringTransaction, as_of: NaiveDate) -> Vec<NaiveDate> {
        if !definition.has_valid_day() {
            return Vec::new();
        }
        let created = definition.created_at.date_naive();
        let (mut year, mut month) = match definition.last_execution_date {
            Some(watermark) => calendar::next_month(watermark.year(), watermark.month()),
            None => (created.year(), created.month()),
        };
        let mut dates = Vec::new();
        for _ in 0..MAX_CATCH_UP_PERIODS {
            let Some(date) = definition.scheduled_in(year, month) else {
                break;
            };
            if date > as_of {
                break;
            }
            let after_start = match definition.last_execution_date {
                Some(watermark) => date > watermark,
                None => date >= created,
            };
            if after_start {
                dates.push(date);
            }
            (year, month) = calendar::next_month(year, month);
        }
        dates
    }

    /// Materializes every due period of one definition.
    pub fn process(
        ledger: &mut Ledger,
        id: Uuid,
        as_of: NaiveDate,
        clock: &dyn Clock,
    ) -> CoreResult<Vec<Transaction>> {
        let definition = ledger
            .recurring(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(EntityKind::Recurring, id))?;
        Self::validate_day(definition.day_of_month)?;

        let due = Self::due_dates(&definition, as_of);
        if due.is_empty() {
            return Ok(Vec::new());
        }
        Self::ensure_references(ledger, &definition)?;

        let existing = Self::materialized_dates(ledger, id);
        let mut created = Vec::new();
        for date in due {
            if existing.contains(&date) {
                debug!("recurring {} already materialized on {}", id, date);
            } else {
                let txn = LedgerService::create(ledger, definition.draft_for(date), clock)?;
                created.push(txn);
            }
            if let Some(stored) = ledger.recurring_mut(id) {
                stored.last_execution_date = Some(date);
            }
        }
        if !created.is_empty() {
            info!(
                "recurring {} ({}) materialized {} period(s)",
                id,
                definition.name,
                created.len()
            );
        }
        Ok(created)
    }

    /// Processes every definition, isolating failures per definition.
    pub fn process_all(ledger: &mut Ledger, as_of: NaiveDate, clock: &dyn Clock) -> ProcessReport {
        let mut report = ProcessReport::default();
        let definitions: Vec<(Uuid, String)> = ledger
            .recurring
            .iter()
            .map(|definition| (definition.id, definition.name.clone()))
            .collect();
        for (id, name) in definitions {
            match Self::process(ledger, id, as_of, clock) {
                Ok(mut created) => report.created.append(&mut created),
                Err(err) => {
                    warn!("recurring {} ({}) failed: {}", id, name, err);
                    report.failures.push(ProcessFailure {
                        recurring_id: id,
                        name,
                        error: err.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Net monthly amount of every definition, signed by kind.
    pub fn monthly_commitment(ledger: &Ledger) -> Decimal {
        ledger
            .recurring
            .iter()
            .map(|definition| definition.kind.signed(definition.amount))
            .sum()
    }

    fn materialized_dates(ledger: &Ledger, recurring_id: Uuid) -> HashSet<NaiveDate> {
        ledger
            .transactions
            .iter()
            .filter(|txn| txn.recurring_id == Some(recurring_id))
            .map(Transaction::date)
            .collect()
    }

    fn ensure_references(ledger: &Ledger, definition: &RecurringTransaction) -> CoreResult<()> {
        if ledger.account(definition.account_id).is_none() {
            return Err(CoreError::not_found(
                EntityKind::Account,
                definition.account_id,
            ));
        }
        if ledger.category(definition.category_id).is_none() {
            return Err(CoreError::not_found(
                EntityKind::Category,
                definition.category_id,
            ));
        }
        Ok(())
    }

    fn validate_day(day: u32) -> CoreResult<()> {
        if (MIN_DAY_OF_MONTH..=MAX_DAY_OF_MONTH).contains(&day) {
            Ok(())
        } else {
            Err(CoreError::InvalidSchedule(day))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use fintrack_domain::{Account, Category, TransactionType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn definition(day: u32, created: NaiveDate) -> RecurringTransaction {
        RecurringTransaction::new(
            "Alquiler",
            Decimal::new(80000, 2),
            TransactionType::Bill,
            Uuid::new_v4(),
            Uuid::new_v4(),
            day,
        )
        .created_at(calendar::midnight_utc(created))
    }

    #[test]
    fn due_dates_start_at_creation_month() {
        let def = definition(15, date(2024, 1, 1));
        assert_eq!(
            RecurrenceService::due_dates(&def, date(2024, 4, 20)),
            vec![
                date(2024, 1, 15),
                date(2024, 2, 15),
                date(2024, 3, 15),
                date(2024, 4, 15)
            ]
        );
    }

    #[test]
    fn due_dates_skip_first_month_when_created_after_day() {
        let def = definition(5, date(2024, 1, 20));
        assert_eq!(
            RecurrenceService::due_dates(&def, date(2024, 3, 4)),
            vec![date(2024, 2, 5)]
        );
    }

    #[test]
    fn due_dates_resume_after_watermark() {
        let mut def = definition(31, date(2023, 11, 1));
        def.last_execution_date = Some(date(2024, 1, 31));
        assert_eq!(
            RecurrenceService::due_dates(&def, date(2024, 4, 1)),
            vec![date(2024, 2, 29), date(2024, 3, 31)]
        );
        assert!(RecurrenceService::due_dates(&def, date(2024, 1, 31)).is_empty());
    }

    #[test]
    fn invalid_day_yields_no_dates_and_fails_processing() {
        let mut ledger = Ledger::new("Recurring");
        let mut def = definition(15, date(2024, 1, 1));
        def.day_of_month = 0;
        assert!(RecurrenceService::due_dates(&def, date(2024, 6, 1)).is_empty());
        let id = def.id;
        ledger.recurring.push(def);
        let clock = FixedClock::on(date(2024, 6, 1));
        let err = RecurrenceService::process(&mut ledger, id, date(2024, 6, 1), &clock).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSchedule(0)));
    }

    #[test]
    fn create_rejects_out_of_range_day() {
        let mut ledger = Ledger::new("Recurring");
        let account = ledger.add_account(Account::new("Corriente", "BBVA"));
        let category = ledger.add_category(Category::new("Casa", "🏠", "#84cc16"));
        let mut def = definition(32, date(2024, 1, 1));
        def.account_id = account;
        def.category_id = category;
        assert!(matches!(
            RecurrenceService::create(&mut ledger, def),
            Err(CoreError::InvalidSchedule(32))
        ));
        assert!(ledger.recurring.is_empty());
    }

    #[test]
    fn process_skips_dates_already_in_ledger() {
        let mut ledger = Ledger::new("Recurring");
        let account = ledger.add_account(Account::new("Corriente", "BBVA"));
        let category = ledger.add_category(Category::new("Casa", "🏠", "#84cc16"));
        let mut def = definition(10, date(2024, 1, 1));
        def.account_id = account;
        def.category_id = category;
        let def = RecurrenceService::create(&mut ledger, def).unwrap();
        let clock = FixedClock::on(date(2024, 3, 20));

        // A prior run materialized February but crashed before saving the watermark.
        LedgerService::create(&mut ledger, def.draft_for(date(2024, 2, 10)), &clock).unwrap();

        let created = RecurrenceService::process(&mut ledger, def.id, date(2024, 3, 20), &clock).unwrap();
        let dates: Vec<_> = created.iter().map(Transaction::date).collect();
        assert_eq!(dates, vec![date(2024, 1, 10), date(2024, 3, 10)]);
        assert_eq!(ledger.transaction_count(), 3);
        assert_eq!(
            ledger.recurring(def.id).unwrap().last_execution_date,
            Some(date(2024, 3, 10))
        );
    }

    #[test]
    fn monthly_commitment_nets_income_and_bills() {
        let mut ledger = Ledger::new("Recurring");
        let mut salary = definition(1, date(2024, 1, 1));
        salary.kind = TransactionType::Income;
        salary.amount = Decimal::new(2000, 0);
        let mut rent = definition(1, date(2024, 1, 1));
        rent.amount = Decimal::new(750, 0);
        ledger.recurring.extend([salary, rent]);
        assert_eq!(
            RecurrenceService::monthly_commitment(&ledger),
            Decimal::new(1250, 0)
        );
    }
}
