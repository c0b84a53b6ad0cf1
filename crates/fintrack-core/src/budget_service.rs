//! Budget consumption tracking.
//!
//! A budget's `current_amount` is kept equal to the sum of bill amounts
//! tagged with its id. The ledger hooks apply deltas as transactions come
//! and go; [`BudgetService::reconcile`] is the from-scratch definition the
//! hooks must agree with.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use fintrack_domain::{position_of, Budget, Ledger, Transaction};

use crate::error::{CoreError, CoreResult, EntityKind};

/// A budget whose stored consumption was corrected by a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetDrift {
    pub budget_id: Uuid,
    pub recorded: Decimal,
    pub expected: Decimal,
}

/// One row of the budget overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatusLine {
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub category: String,
    pub limit: Decimal,
    pub consumed: Decimal,
    pub remaining: Decimal,
    pub percent_used: Option<Decimal>,
    pub over_budget: bool,
}

pub struct BudgetService;

impl BudgetService {
    /// Creates the budget for a category and backfills its consumption.
    pub fn create(
        ledger: &mut Ledger,
        category_id: Uuid,
        amount: Decimal,
        owner_id: Option<Uuid>,
    ) -> CoreResult<Budget> {
        if ledger.category(category_id).is_none() {
            return Err(CoreError::not_found(EntityKind::Category, category_id));
        }
        if ledger.budget_for_category(category_id).is_some() {
            return Err(CoreError::DuplicateBudget(category_id));
        }
        Self::validate_limit(amount)?;
        let budget = Budget::new(category_id, amount).with_owner(owner_id);
        let id = budget.id;
        let adopted = Self::adopt_category_bills(ledger, category_id, id);
        ledger.budgets.push(budget);
        let budget = Self::reconcile(ledger, id)?;
        info!(
            "created budget {} for category {} ({} existing bill(s) adopted)",
            id, category_id, adopted
        );
        Ok(budget)
    }

    /// Tags the category's bills that carry no live budget with `budget_id`.
    fn adopt_category_bills(ledger: &mut Ledger, category_id: Uuid, budget_id: Uuid) -> usize {
        let live: HashSet<Uuid> = ledger.budgets.iter().map(|budget| budget.id).collect();
        let mut adopted = 0;
        for txn in ledger
            .transactions
            .iter_mut()
            .filter(|txn| txn.kind.is_bill() && txn.category_id == category_id)
        {
            if txn.budget_id.map_or(true, |id| !live.contains(&id)) {
                txn.budget_id = Some(budget_id);
                adopted += 1;
            }
        }
        adopted
    }

    /// Applies a newly stored transaction to the budget it is tagged with.
    pub fn on_transaction_created(ledger: &mut Ledger, txn: &Transaction) {
        Self::apply(ledger, txn, txn.amount);
    }

    /// Reverses the consumption of a removed transaction.
    pub fn on_transaction_deleted(ledger: &mut Ledger, txn: &Transaction) {
        Self::apply(ledger, txn, -txn.amount);
    }

    pub fn is_over_budget(budget: &Budget) -> bool {
        budget.is_over_budget()
    }

    /// Recomputes consumption from the ledger and stores it.
    pub fn reconcile(ledger: &mut Ledger, budget_id: Uuid) -> CoreResult<Budget> {
        let expected = Self::consumed(ledger, budget_id);
        let budget = ledger
            .budget_mut(budget_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Budget, budget_id))?;
        budget.current_amount = expected;
        let budget = budget.clone();
        ledger.touch();
        Ok(budget)
    }

    /// Checks the stored consumption against the ledger without changing it.
    pub fn verify(ledger: &Ledger, budget_id: Uuid) -> CoreResult<()> {
        let budget = ledger
            .budget(budget_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Budget, budget_id))?;
        let expected = Self::consumed(ledger, budget_id);
        if budget.current_amount != expected {
            return Err(CoreError::AggregateDrift {
                budget_id,
                recorded: budget.current_amount,
                expected,
            });
        }
        Ok(())
    }

    /// Reconciles every budget and reports the ones that had drifted.
    pub fn reconcile_all(ledger: &mut Ledger) -> Vec<BudgetDrift> {
        let mut drifts = Vec::new();
        let ids: Vec<Uuid> = ledger.budgets.iter().map(|budget| budget.id).collect();
        for id in ids {
            let expected = Self::consumed(ledger, id);
            let Some(budget) = ledger.budget_mut(id) else {
                continue;
            };
            if budget.current_amount == expected {
                continue;
            }
            warn!(
                "budget {} drifted: recorded {}, expected {}",
                id, budget.current_amount, expected
            );
            drifts.push(BudgetDrift {
                budget_id: id,
                recorded: budget.current_amount,
                expected,
            });
            budget.current_amount = expected;
        }
        if !drifts.is_empty() {
            ledger.touch();
        }
        drifts
    }

    pub fn set_limit(ledger: &mut Ledger, budget_id: Uuid, amount: Decimal) -> CoreResult<Budget> {
        Self::validate_limit(amount)?;
        let budget = ledger
            .budget_mut(budget_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Budget, budget_id))?;
        budget.amount = amount;
        let budget = budget.clone();
        ledger.touch();
        Ok(budget)
    }

    /// Deletes a budget. Transactions keep their (now dangling) budget id.
    pub fn remove(ledger: &mut Ledger, budget_id: Uuid) -> CoreResult<Budget> {
        let index = position_of(&ledger.budgets, budget_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Budget, budget_id))?;
        let removed = ledger.budgets.remove(index);
        ledger.touch();
        Ok(removed)
    }

    pub fn status(ledger: &Ledger) -> Vec<BudgetStatusLine> {
        let mut lines: Vec<BudgetStatusLine> = ledger
            .budgets
            .iter()
            .map(|budget| BudgetStatusLine {
                budget_id: budget.id,
                category_id: budget.category_id,
                category: ledger
                    .category(budget.category_id)
                    .map(|category| category.name.clone())
                    .unwrap_or_else(|| crate::analytics_service::UNCATEGORIZED_LABEL.to_string()),
                limit: budget.amount,
                consumed: budget.current_amount,
                remaining: budget.remaining(),
                percent_used: budget.percent_used(),
                over_budget: budget.is_over_budget(),
            })
            .collect();
        lines.sort_by(|a, b| {
            a.category
                .to_lowercase()
                .cmp(&b.category.to_lowercase())
                .then_with(|| a.budget_id.cmp(&b.budget_id))
        });
        lines
    }

    /// Sum of bill amounts tagged with `budget_id`.
    pub fn consumed(ledger: &Ledger, budget_id: Uuid) -> Decimal {
        ledger
            .transactions
            .iter()
            .filter(|txn| txn.consumes(budget_id))
            .map(|txn| txn.amount)
            .sum()
    }

    fn apply(ledger: &mut Ledger, txn: &Transaction, delta: Decimal) {
        if !txn.kind.is_bill() {
            return;
        }
        let Some(budget_id) = txn.budget_id else {
            return;
        };
        match ledger.budget_mut(budget_id) {
            Some(budget) => {
                budget.current_amount += delta;
                debug!(
                    "budget {} consumption now {} after transaction {}",
                    budget_id, budget.current_amount, txn.id
                );
            }
            None => warn!(
                "transaction {} references unknown budget {}; skipping consumption update",
                txn.id, budget_id
            ),
        }
    }

    fn validate_limit(amount: Decimal) -> CoreResult<()> {
        if amount.is_sign_negative() {
            return Err(CoreError::Validation(format!(
                "budget limit must not be negative (got {})",
                amount
            )));
        }
        Ok(())
    }
}
