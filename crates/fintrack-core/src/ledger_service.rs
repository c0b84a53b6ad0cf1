//! The authoritative transaction store: create, update, delete and filtered queries.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use fintrack_domain::{
    calendar, position_of, Ledger, Transaction, TransactionDraft, TransactionType,
};

use crate::{
    budget_service::BudgetService,
    error::{CoreError, CoreResult, EntityKind},
    time::Clock,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Amount,
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Result ordering. Ties always fall back to the transaction id so that
/// identical queries return identical sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl TransactionOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Amount => a.amount.cmp(&b.amount),
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        };
        let ordered = primary.then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ordered,
            SortDirection::Desc => ordered.reverse(),
        }
    }
}

/// Conjunction of optional predicates over the ledger. An empty filter
/// matches every transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub budget_id: Option<Uuid>,
    pub kind: Option<TransactionType>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub search: Option<String>,
    #[serde(default)]
    pub order: TransactionOrder,
}

impl TransactionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Calendar-day range `[from, to)`.
    pub fn between_dates(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.between(calendar::midnight_utc(from), calendar::midnight_utc(to))
    }

    pub fn for_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn for_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn for_budget(mut self, budget_id: Uuid) -> Self {
        self.budget_id = Some(budget_id);
        self
    }

    pub fn of_kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn amount_between(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    pub fn matching(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn ordered_by(mut self, order: TransactionOrder) -> Self {
        self.order = order;
        self
    }

    /// Boundary validation, run once before the filter is applied.
    pub fn validate(&self) -> CoreResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if to < from {
                return Err(CoreError::Validation(
                    "date range end must not precede its start".into(),
                ));
            }
        }
        for bound in [self.min_amount, self.max_amount].into_iter().flatten() {
            if bound.is_sign_negative() {
                return Err(CoreError::Validation(
                    "amount bounds must not be negative".into(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount) {
            if min > max {
                return Err(CoreError::Validation(
                    "minimum amount exceeds maximum amount".into(),
                ));
            }
        }
        Ok(())
    }

    fn matches(&self, txn: &Transaction, needle: Option<&str>) -> bool {
        self.from.map_or(true, |from| txn.created_at >= from)
            && self.to.map_or(true, |to| txn.created_at < to)
            && self.account_id.map_or(true, |id| txn.account_id == id)
            && self.category_id.map_or(true, |id| txn.category_id == id)
            && self.budget_id.map_or(true, |id| txn.budget_id == Some(id))
            && self.kind.map_or(true, |kind| txn.kind == kind)
            && self.min_amount.map_or(true, |min| txn.amount >= min)
            && self.max_amount.map_or(true, |max| txn.amount <= max)
            && needle.map_or(true, |needle| txn.mentions(needle))
    }
}

/// Ledger-level operations on transactions. Mutations notify the budget
/// tracker so budget consumption never lags the ledger.
pub struct LedgerService;

impl LedgerService {
    /// Validates and stores a new transaction.
    pub fn create(
        ledger: &mut Ledger,
        draft: TransactionDraft,
        clock: &dyn Clock,
    ) -> CoreResult<Transaction> {
        Self::validate_draft(ledger, &draft)?;
        let txn = draft.into_transaction(Uuid::new_v4(), clock.now());
        ledger.transactions.push(txn.clone());
        BudgetService::on_transaction_created(ledger, &txn);
        ledger.touch();
        debug!(
            "created {} transaction {} ({}) for {}",
            txn.kind, txn.id, txn.name, txn.amount
        );
        Ok(txn)
    }

    /// Replaces the fields of an existing transaction, moving its budget
    /// consumption from the old values to the new ones.
    pub fn update(
        ledger: &mut Ledger,
        id: Uuid,
        draft: TransactionDraft,
    ) -> CoreResult<Transaction> {
        let index = position_of(&ledger.transactions, id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Transaction, id))?;
        Self::validate_draft(ledger, &draft)?;
        let previous = ledger.transactions[index].clone();
        // A dangling id already on the record may stay; a new one must resolve.
        if let Some(budget_id) = draft.budget_id.filter(|id| Some(*id) != previous.budget_id) {
            if ledger.budget(budget_id).is_none() {
                return Err(CoreError::not_found(EntityKind::Budget, budget_id));
            }
        }
        let updated = draft.into_transaction(id, previous.created_at);
        BudgetService::on_transaction_deleted(ledger, &previous);
        ledger.transactions[index] = updated.clone();
        BudgetService::on_transaction_created(ledger, &updated);
        ledger.touch();
        debug!("updated transaction {} ({})", updated.id, updated.name);
        Ok(updated)
    }

    /// Removes the transaction, reversing any budget consumption it carried.
    pub fn delete(ledger: &mut Ledger, id: Uuid) -> CoreResult<Transaction> {
        let index = position_of(&ledger.transactions, id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Transaction, id))?;
        let removed = ledger.transactions.remove(index);
        BudgetService::on_transaction_deleted(ledger, &removed);
        ledger.touch();
        debug!("deleted transaction {}", removed.id);
        Ok(removed)
    }

    pub fn get(ledger: &Ledger, id: Uuid) -> CoreResult<&Transaction> {
        ledger
            .transaction(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Transaction, id))
    }

    /// Returns the matching transactions in the filter's order.
    pub fn find_all(ledger: &Ledger, filter: &TransactionFilter) -> CoreResult<Vec<Transaction>> {
        filter.validate()?;
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);
        let mut matches: Vec<Transaction> = ledger
            .transactions
            .iter()
            .filter(|txn| filter.matches(txn, needle.as_deref()))
            .cloned()
            .collect();
        matches.sort_by(|a, b| filter.order.compare(a, b));
        Ok(matches)
    }

    fn validate_draft(ledger: &Ledger, draft: &TransactionDraft) -> CoreResult<()> {
        if draft.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "transaction name must not be empty".into(),
            ));
        }
        if draft.amount.is_sign_negative() {
            return Err(CoreError::Validation(format!(
                "transaction amount must not be negative (got {})",
                draft.amount
            )));
        }
        if ledger.account(draft.account_id).is_none() {
            return Err(CoreError::not_found(EntityKind::Account, draft.account_id));
        }
        if ledger.category(draft.category_id).is_none() {
            return Err(CoreError::not_found(
                EntityKind::Category,
                draft.category_id,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use chrono::TimeZone;
    use fintrack_domain::{Account, Category};

    struct Fixture {
        ledger: Ledger,
        account: Uuid,
        category: Uuid,
    }

    fn fixture() -> Fixture {
        let mut ledger = Ledger::new("Ledger");
        let account = ledger.add_account(Account::new("Corriente", "ING"));
        let category = ledger.add_category(Category::new("Hogar", "🏠", "#22c55e"));
        Fixture {
            ledger,
            account,
            category,
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    fn draft(fx: &Fixture, name: &str, cents: i64, kind: TransactionType) -> TransactionDraft {
        TransactionDraft::new(name, Decimal::new(cents, 2), kind, fx.account, fx.category)
    }

    #[test]
    fn create_defaults_timestamp_to_clock() {
        let mut fx = fixture();
        let d = draft(&fx, "Luz", 6000, TransactionType::Bill);
        let txn = LedgerService::create(&mut fx.ledger, d, &clock()).unwrap();
        assert_eq!(txn.created_at, clock().0);
        assert_eq!(fx.ledger.transaction_count(), 1);
    }

    #[test]
    fn create_rejects_negative_amounts_and_unknown_references() {
        let mut fx = fixture();
        let negative = draft(&fx, "Luz", -1, TransactionType::Bill);
        assert!(matches!(
            LedgerService::create(&mut fx.ledger, negative, &clock()),
            Err(CoreError::Validation(_))
        ));

        let mut orphan = draft(&fx, "Luz", 100, TransactionType::Bill);
        orphan.account_id = Uuid::new_v4();
        let err = LedgerService::create(&mut fx.ledger, orphan, &clock()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound {
                entity: EntityKind::Account,
                ..
            }
        ));
        assert_eq!(fx.ledger.transaction_count(), 0);
    }

    #[test]
    fn delete_missing_transaction_is_not_found() {
        let mut fx = fixture();
        let err = LedgerService::delete(&mut fx.ledger, Uuid::new_v4()).unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err:?}");
    }

    #[test]
    fn find_all_applies_conjunction_and_default_order() {
        let mut fx = fixture();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for (offset, (name, cents, kind)) in [
            ("Nómina", 250000, TransactionType::Income),
            ("Supermercado", 8420, TransactionType::Bill),
            ("Gimnasio", 3500, TransactionType::Bill),
        ]
        .into_iter()
        .enumerate()
        {
            let d = draft(&fx, name, cents, kind)
                .created_at(base + chrono::Duration::days(offset as i64));
            LedgerService::create(&mut fx.ledger, d, &clock()).unwrap();
        }

        let all = LedgerService::find_all(&fx.ledger, &TransactionFilter::all()).unwrap();
        let names: Vec<_> = all.iter().map(|txn| txn.name.as_str()).collect();
        assert_eq!(names, vec!["Gimnasio", "Supermercado", "Nómina"]);

        let bills = TransactionFilter::all()
            .of_kind(TransactionType::Bill)
            .amount_between(Some(Decimal::new(50, 0)), None);
        let found = LedgerService::find_all(&fx.ledger, &bills).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Supermercado");

        let search = TransactionFilter::all().matching("GIMN");
        assert_eq!(LedgerService::find_all(&fx.ledger, &search).unwrap().len(), 1);

        let window = TransactionFilter::all().between(base, base + chrono::Duration::days(1));
        let windowed = LedgerService::find_all(&fx.ledger, &window).unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].name, "Nómina");
    }

    #[test]
    fn invalid_filters_are_rejected() {
        let fx = fixture();
        let now = clock().0;
        let reversed = TransactionFilter::all().between(now, now - chrono::Duration::days(1));
        assert!(matches!(
            LedgerService::find_all(&fx.ledger, &reversed),
            Err(CoreError::Validation(_))
        ));

        let bounds = TransactionFilter::all()
            .amount_between(Some(Decimal::new(10, 0)), Some(Decimal::new(5, 0)));
        assert!(matches!(bounds.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn empty_window_matches_nothing() {
        let mut fx = fixture();
        let d = draft(&fx, "Luz", 6000, TransactionType::Bill);
        let txn = LedgerService::create(&mut fx.ledger, d, &clock()).unwrap();

        let empty = TransactionFilter::all().between(txn.created_at, txn.created_at);
        assert!(empty.validate().is_ok());
        assert!(LedgerService::find_all(&fx.ledger, &empty).unwrap().is_empty());
    }

    #[test]
    fn get_returns_the_stored_transaction() {
        let mut fx = fixture();
        let d = draft(&fx, "Agua", 2500, TransactionType::Bill);
        let txn = LedgerService::create(&mut fx.ledger, d, &clock()).unwrap();

        assert_eq!(LedgerService::get(&fx.ledger, txn.id).unwrap(), &txn);
        let err = LedgerService::get(&fx.ledger, Uuid::new_v4()).unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err:?}");
    }

    #[test]
    fn update_keeps_identity_and_creation_time() {
        let mut fx = fixture();
        let d = draft(&fx, "Agua", 2500, TransactionType::Bill);
        let txn = LedgerService::create(&mut fx.ledger, d, &clock()).unwrap();

        let mut changes = TransactionDraft::from(&txn);
        changes.name = "Agua y basuras".into();
        changes.amount = Decimal::new(3100, 2);
        changes.created_at = None;
        let updated = LedgerService::update(&mut fx.ledger, txn.id, changes).unwrap();

        assert_eq!(updated.id, txn.id);
        assert_eq!(updated.created_at, txn.created_at);
        assert_eq!(LedgerService::get(&fx.ledger, txn.id).unwrap().amount, Decimal::new(3100, 2));
        assert_eq!(fx.ledger.transaction_count(), 1);
    }

    #[test]
    fn update_rejects_unknown_budget() {
        let mut fx = fixture();
        let d = draft(&fx, "Cine", 1200, TransactionType::Bill);
        let txn = LedgerService::create(&mut fx.ledger, d, &clock()).unwrap();

        let missing = Uuid::new_v4();
        let changes = TransactionDraft::from(&txn).with_budget(missing);
        let err = LedgerService::update(&mut fx.ledger, txn.id, changes).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound {
                entity: EntityKind::Budget,
                id,
            } if id == missing
        ));
        assert_eq!(LedgerService::get(&fx.ledger, txn.id).unwrap().budget_id, None);
    }

    #[test]
    fn order_by_name_ascending_is_case_insensitive() {
        let mut fx = fixture();
        for name in ["banana", "Apple", "cherry"] {
            let d = draft(&fx, name, 100, TransactionType::Bill);
            LedgerService::create(&mut fx.ledger, d, &clock()).unwrap();
        }
        let filter = TransactionFilter::all()
            .ordered_by(TransactionOrder::new(SortField::Name, SortDirection::Asc));
        let names: Vec<_> = LedgerService::find_all(&fx.ledger, &filter)
            .unwrap()
            .into_iter()
            .map(|txn| txn.name)
            .collect();
        assert_eq!(names, vec!["Apple", "banana", "cherry"]);
    }
}
