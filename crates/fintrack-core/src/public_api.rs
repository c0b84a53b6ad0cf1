//! Stable, public-facing entry point that wraps the internal service layer.
//!
//! [`LedgerApi`] owns one user's ledger behind a read/write lock. Every
//! mutation runs under the write lock, so budget consumption and recurring
//! watermarks are updated in the same critical section as the ledger write.
//! Reads take the read lock and see the last committed state.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use fintrack_domain::{Budget, Ledger, Transaction, TransactionDraft};

use crate::{
    analytics_service::{AnalyticsService, CategoryExpense, HeatmapRow, MonthlySummary, RadarEntry},
    budget_service::BudgetService,
    error::{CoreError, CoreResult},
    ledger_service::{LedgerService, TransactionFilter},
    recurrence_service::{ProcessReport, RecurrenceService},
    time::{Clock, SystemClock},
};

pub struct LedgerApi {
    ledger: RwLock<Ledger>,
    clock: Arc<dyn Clock>,
}

impl LedgerApi {
    pub fn new(ledger: Ledger) -> Self {
        Self::with_clock(ledger, Arc::new(SystemClock))
    }

    pub fn with_clock(ledger: Ledger, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            clock,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn find_transactions(&self, filter: &TransactionFilter) -> CoreResult<Vec<Transaction>> {
        LedgerService::find_all(&*self.read()?, filter)
    }

    pub fn create_transaction(&self, draft: TransactionDraft) -> CoreResult<Transaction> {
        LedgerService::create(&mut *self.write()?, draft, self.clock.as_ref())
    }

    pub fn get_transaction(&self, id: Uuid) -> CoreResult<Transaction> {
        let ledger = self.read()?;
        LedgerService::get(&ledger, id).cloned()
    }

    /// Replaces a transaction's fields; budget consumption follows the new values.
    pub fn update_transaction(&self, id: Uuid, draft: TransactionDraft) -> CoreResult<Transaction> {
        LedgerService::update(&mut *self.write()?, id, draft)
    }

    pub fn delete_transaction(&self, id: Uuid) -> CoreResult<Transaction> {
        LedgerService::delete(&mut *self.write()?, id)
    }

    pub fn create_budget(&self, category_id: Uuid, amount: Decimal) -> CoreResult<Budget> {
        let mut ledger = self.write()?;
        let owner = ledger.owner_id;
        BudgetService::create(&mut ledger, category_id, amount, owner)
    }

    pub fn reconcile_budget(&self, budget_id: Uuid) -> CoreResult<Budget> {
        BudgetService::reconcile(&mut *self.write()?, budget_id)
    }

    /// Catches up one definition, or every definition when `id` is `None`.
    /// `as_of` defaults to today. A single definition's failure is returned
    /// as an error; a full sweep reports failures per definition instead.
    pub fn process_recurring(
        &self,
        id: Option<Uuid>,
        as_of: Option<NaiveDate>,
    ) -> CoreResult<ProcessReport> {
        let as_of = as_of.unwrap_or_else(|| self.clock.today());
        let mut ledger = self.write()?;
        match id {
            Some(id) => {
                let created = RecurrenceService::process(&mut ledger, id, as_of, self.clock.as_ref())?;
                Ok(ProcessReport {
                    created,
                    failures: Vec::new(),
                })
            }
            None => Ok(RecurrenceService::process_all(
                &mut ledger,
                as_of,
                self.clock.as_ref(),
            )),
        }
    }

    pub fn category_expenses(&self, filter: &TransactionFilter) -> CoreResult<Vec<CategoryExpense>> {
        AnalyticsService::category_expenses(&*self.read()?, filter)
    }

    pub fn monthly_summary(&self, filter: &TransactionFilter) -> CoreResult<Vec<MonthlySummary>> {
        AnalyticsService::monthly_summary_for(&*self.read()?, filter)
    }

    pub fn heatmap(&self, filter: &TransactionFilter) -> CoreResult<Vec<HeatmapRow>> {
        AnalyticsService::heatmap_for(&*self.read()?, filter)
    }

    pub fn category_radar(
        &self,
        filter: &TransactionFilter,
        n: usize,
    ) -> CoreResult<Vec<RadarEntry>> {
        AnalyticsService::radar_for(&*self.read()?, filter, n)
    }

    /// Clone of the current ledger, for persistence.
    pub fn snapshot(&self) -> CoreResult<Ledger> {
        Ok(self.read()?.clone())
    }

    /// Runs a read-only closure against the ledger.
    pub fn with_ledger<T>(&self, f: impl FnOnce(&Ledger) -> T) -> CoreResult<T> {
        let ledger = self.read()?;
        Ok(f(&*ledger))
    }

    /// Runs a mutation under the write lock.
    pub fn with_ledger_mut<T>(
        &self,
        f: impl FnOnce(&mut Ledger, &dyn Clock) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut ledger = self.write()?;
        f(&mut *ledger, self.clock.as_ref())
    }

    pub fn into_inner(self) -> CoreResult<Ledger> {
        self.ledger.into_inner().map_err(|_| CoreError::Poisoned)
    }

    fn read(&self) -> CoreResult<RwLockReadGuard<'_, Ledger>> {
        self.ledger.read().map_err(|_| CoreError::Poisoned)
    }

    fn write(&self) -> CoreResult<RwLockWriteGuard<'_, Ledger>> {
        self.ledger.write().map_err(|_| CoreError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use fintrack_domain::{Account, Category, RecurringTransaction, TransactionType};

    fn api() -> (LedgerApi, Uuid, Uuid) {
        let mut ledger = Ledger::new("Api");
        let account = ledger.add_account(Account::new("Corriente", "ING"));
        let category = ledger.add_category(Category::new("Casa", "🏠", "#84cc16"));
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 4, 20).unwrap());
        (LedgerApi::with_clock(ledger, Arc::new(clock)), account, category)
    }

    #[test]
    fn process_recurring_defaults_as_of_to_today() {
        let (api, account, category) = api();
        let created = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let definition = RecurringTransaction::new(
            "Internet",
            Decimal::new(3999, 2),
            TransactionType::Bill,
            account,
            category,
            15,
        )
        .created_at(fintrack_domain::calendar::midnight_utc(created));
        api.with_ledger_mut(|ledger, _| RecurrenceService::create(ledger, definition))
            .unwrap();

        let report = api.process_recurring(None, None).unwrap();
        assert_eq!(report.created.len(), 4);
        assert!(report.is_clean());
        let again = api.process_recurring(None, None).unwrap();
        assert!(again.created.is_empty());
    }

    #[test]
    fn single_definition_failure_is_an_error() {
        let (api, _, _) = api();
        let err = api.process_recurring(Some(Uuid::new_v4()), None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn create_budget_and_reconcile_through_facade() {
        let (api, account, category) = api();
        let budget = api.create_budget(category, Decimal::new(100, 0)).unwrap();
        let draft = TransactionDraft::new(
            "Fontanero",
            Decimal::new(120, 0),
            TransactionType::Bill,
            account,
            category,
        )
        .with_budget(budget.id);
        api.create_transaction(draft).unwrap();
        let reconciled = api.reconcile_budget(budget.id).unwrap();
        assert_eq!(reconciled.current_amount, Decimal::new(120, 0));
        assert!(reconciled.is_over_budget());
        assert_eq!(api.snapshot().unwrap().transaction_count(), 1);
    }

    #[test]
    fn update_transaction_moves_budget_consumption() {
        let (api, account, category) = api();
        let budget = api.create_budget(category, Decimal::new(100, 0)).unwrap();
        let draft = TransactionDraft::new(
            "Pintura",
            Decimal::new(60, 0),
            TransactionType::Bill,
            account,
            category,
        )
        .with_budget(budget.id);
        let txn = api.create_transaction(draft).unwrap();

        let mut changes = TransactionDraft::from(&api.get_transaction(txn.id).unwrap());
        changes.amount = Decimal::new(45, 0);
        let updated = api.update_transaction(txn.id, changes.clone()).unwrap();
        assert_eq!(updated.amount, Decimal::new(45, 0));
        let consumed = api
            .with_ledger(|ledger| ledger.budget(budget.id).map(|b| b.current_amount))
            .unwrap();
        assert_eq!(consumed, Some(Decimal::new(45, 0)));

        changes.budget_id = None;
        api.update_transaction(txn.id, changes).unwrap();
        let consumed = api
            .with_ledger(|ledger| ledger.budget(budget.id).map(|b| b.current_amount))
            .unwrap();
        assert_eq!(consumed, Some(Decimal::ZERO));
        api.with_ledger(|ledger| BudgetService::verify(ledger, budget.id))
            .unwrap()
            .unwrap();
    }

    #[test]
    fn update_transaction_unknown_id_is_not_found() {
        let (api, account, category) = api();
        let draft = TransactionDraft::new(
            "Nada",
            Decimal::ONE,
            TransactionType::Bill,
            account,
            category,
        );
        let err = api.update_transaction(Uuid::new_v4(), draft).unwrap_err();
        assert!(err.is_not_found());
    }
}
