use std::{collections::HashSet, path::Path};

use fintrack_domain::Ledger;

use crate::CoreError;

/// Abstraction over persistence backends capable of storing ledgers.
pub trait LedgerStorage: Send + Sync {
    fn save_ledger(&self, name: &str, ledger: &Ledger) -> Result<(), CoreError>;
    fn load_ledger(&self, name: &str) -> Result<Ledger, CoreError>;
    fn list_ledgers(&self) -> Result<Vec<String>, CoreError>;
    fn delete_ledger(&self, name: &str) -> Result<(), CoreError>;
    fn save_ledger_to_path(&self, ledger: &Ledger, path: &Path) -> Result<(), CoreError>;
    fn load_ledger_from_path(&self, path: &Path) -> Result<Ledger, CoreError>;
}

/// Detects dangling references within a ledger snapshot.
pub fn ledger_warnings(ledger: &Ledger) -> Vec<String> {
    let account_ids: HashSet<_> = ledger.accounts.iter().map(|a| a.id).collect();
    let category_ids: HashSet<_> = ledger.categories.iter().map(|c| c.id).collect();
    let budget_ids: HashSet<_> = ledger.budgets.iter().map(|b| b.id).collect();
    let mut warnings = Vec::new();

    for txn in &ledger.transactions {
        if !account_ids.contains(&txn.account_id) {
            warnings.push(format!(
                "transaction {} references unknown account {}",
                txn.id, txn.account_id
            ));
        }
        if !category_ids.contains(&txn.category_id) {
            warnings.push(format!(
                "transaction {} references missing category {}",
                txn.id, txn.category_id
            ));
        }
        if let Some(budget) = txn.budget_id {
            if !budget_ids.contains(&budget) {
                warnings.push(format!(
                    "transaction {} references missing budget {}",
                    txn.id, budget
                ));
            }
        }
    }
    for budget in &ledger.budgets {
        if !category_ids.contains(&budget.category_id) {
            warnings.push(format!(
                "budget {} references missing category {}",
                budget.id, budget.category_id
            ));
        }
    }
    for definition in &ledger.recurring {
        if !account_ids.contains(&definition.account_id) {
            warnings.push(format!(
                "recurring {} references unknown account {}",
                definition.id, definition.account_id
            ));
        }
        if !definition.has_valid_day() {
            warnings.push(format!(
                "recurring {} has invalid day of month {}",
                definition.id, definition.day_of_month
            ));
        }
    }
    warnings
}
