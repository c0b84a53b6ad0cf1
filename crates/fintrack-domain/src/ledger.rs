//! The per-user store snapshot that services operate on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    account::Account, budget::Budget, category::Category, recurring::RecurringTransaction,
    transaction::Transaction,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Everything one user owns. Services receive it explicitly; there is no
/// process-wide instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub recurring: Vec<RecurringTransaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id: None,
            accounts: Vec::new(),
            categories: Vec::new(),
            budgets: Vec::new(),
            transactions: Vec::new(),
            recurring: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_account(&mut self, account: Account) -> Uuid {
        let id = account.id;
        self.accounts.push(account);
        self.touch();
        id
    }

    pub fn add_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.push(category);
        self.touch();
        id
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: Uuid) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn category_mut(&mut self, id: Uuid) -> Option<&mut Category> {
        self.categories.iter_mut().find(|category| category.id == id)
    }

    pub fn budget(&self, id: Uuid) -> Option<&Budget> {
        self.budgets.iter().find(|budget| budget.id == id)
    }

    pub fn budget_mut(&mut self, id: Uuid) -> Option<&mut Budget> {
        self.budgets.iter_mut().find(|budget| budget.id == id)
    }

    pub fn budget_for_category(&self, category_id: Uuid) -> Option<&Budget> {
        self.budgets
            .iter()
            .find(|budget| budget.category_id == category_id)
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn recurring(&self, id: Uuid) -> Option<&RecurringTransaction> {
        self.recurring.iter().find(|definition| definition.id == id)
    }

    pub fn recurring_mut(&mut self, id: Uuid) -> Option<&mut RecurringTransaction> {
        self.recurring
            .iter_mut()
            .find(|definition| definition.id == id)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_snapshot_without_optional_sections_loads() {
        let json = r#"{
            "id": "6f1c1d3e-8f43-4a55-9c53-1e1f1c2d3b4a",
            "name": "Legacy",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let ledger: Ledger = serde_json::from_str(json).expect("parse legacy ledger");
        assert_eq!(ledger.schema_version, CURRENT_SCHEMA_VERSION);
        assert!(ledger.budgets.is_empty());
        assert!(ledger.recurring.is_empty());
    }

    #[test]
    fn lookups_find_added_entities() {
        let mut ledger = Ledger::new("Lookups");
        let account = ledger.add_account(Account::new("Nómina", "BBVA"));
        let category = ledger.add_category(Category::new("Comida", "🍔", "#f97316"));
        assert!(ledger.account(account).is_some());
        assert!(ledger.category(category).is_some());
        assert!(ledger.budget_for_category(category).is_none());
    }
}
