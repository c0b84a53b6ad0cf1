use rust_decimal::Decimal;
use uuid::Uuid;

use fintrack_domain::{position_of, Account, Ledger};

use crate::error::{CoreError, CoreResult, EntityKind};

pub struct AccountService;

impl AccountService {
    pub fn add(ledger: &mut Ledger, account: Account) -> CoreResult<Uuid> {
        Self::validate_name(ledger, None, &account.name)?;
        Ok(ledger.add_account(account))
    }

    pub fn rename(ledger: &mut Ledger, id: Uuid, name: &str) -> CoreResult<()> {
        Self::validate_name(ledger, Some(id), name)?;
        let account = ledger
            .account_mut(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Account, id))?;
        account.name = name.trim().to_string();
        ledger.touch();
        Ok(())
    }

    /// Overwrites the informational balance. Transactions never change it.
    pub fn set_balance(ledger: &mut Ledger, id: Uuid, balance: Decimal) -> CoreResult<()> {
        let account = ledger
            .account_mut(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Account, id))?;
        account.balance = balance;
        ledger.touch();
        Ok(())
    }

    /// Removes the account. Transactions and recurring definitions that
    /// still point at it are left as they are.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> CoreResult<Account> {
        let index = position_of(&ledger.accounts, id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Account, id))?;
        let removed = ledger.accounts.remove(index);
        ledger.touch();
        Ok(removed)
    }

    pub fn list(ledger: &Ledger) -> Vec<&Account> {
        ledger.accounts.iter().collect()
    }

    fn validate_name(ledger: &Ledger, exclude: Option<Uuid>, candidate: &str) -> CoreResult<()> {
        let normalized = candidate.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(CoreError::Validation("account name must not be empty".into()));
        }
        let duplicate = ledger.accounts.iter().any(|account| {
            account.name.trim().to_lowercase() == normalized
                && exclude.map_or(true, |id| account.id != id)
        });
        if duplicate {
            Err(CoreError::Validation(format!(
                "Account `{}` already exists",
                candidate.trim()
            )))
        } else {
            Ok(())
        }
    }
}
