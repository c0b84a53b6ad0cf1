#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use fintrack::fintrack_core::{AccountService, CategoryService};
use fintrack::fintrack_domain::{Account, Category, Ledger};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn money(units: i64, cents: u32) -> Decimal {
    Decimal::new(units * 100 + cents as i64, 2)
}

/// Ledger with one account and the categories `Comida`, `Ocio` and `Nómina`.
pub struct Seeded {
    pub ledger: Ledger,
    pub account: Uuid,
    pub food: Uuid,
    pub leisure: Uuid,
    pub salary: Uuid,
}

pub fn seeded_ledger() -> Seeded {
    let mut ledger = Ledger::new("Hogar");
    let account =
        AccountService::add(&mut ledger, Account::new("Corriente", "ING")).expect("add account");
    let food = CategoryService::add(&mut ledger, Category::new("Comida", "🍞", "#f97316"))
        .expect("add category");
    let leisure = CategoryService::add(&mut ledger, Category::new("Ocio", "🎬", "#a855f7"))
        .expect("add category");
    let salary = CategoryService::add(&mut ledger, Category::new("Nómina", "💼", "#22c55e"))
        .expect("add category");
    Seeded {
        ledger,
        account,
        food,
        leisure,
        salary,
    }
}
