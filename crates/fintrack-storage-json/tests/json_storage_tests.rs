use std::fs;

use chrono::NaiveDate;
use fintrack_core::{
    storage::LedgerStorage, BudgetService, CoreError, LedgerService, RecurrenceService,
    FixedClock,
};
use fintrack_domain::{
    rust_decimal::Decimal, Account, Category, Ledger, RecurringTransaction, TransactionDraft,
    TransactionType,
};
use fintrack_storage_json::{canonical_name, JsonLedgerStorage};
use tempfile::tempdir;

fn populated_ledger() -> Ledger {
    let mut ledger = Ledger::new("Casa García");
    let account = ledger.add_account(Account::new("Corriente", "ING"));
    let category = ledger.add_category(Category::new("Comida", "🍔", "#f97316"));
    let budget = BudgetService::create(&mut ledger, category, Decimal::new(200, 0), None)
        .expect("budget");
    let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    let draft = TransactionDraft::new(
        "Mercadona",
        Decimal::new(6455, 2),
        TransactionType::Bill,
        account,
        category,
    )
    .with_budget(budget.id);
    LedgerService::create(&mut ledger, draft, &clock).expect("transaction");
    let definition = RecurringTransaction::new(
        "Gimnasio",
        Decimal::new(35, 0),
        TransactionType::Bill,
        account,
        category,
        3,
    );
    RecurrenceService::create(&mut ledger, definition).expect("recurring");
    ledger
}

#[test]
fn json_storage_round_trips_full_ledger() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonLedgerStorage::new(dir.path().join("ledgers")).expect("create storage");

    let ledger = populated_ledger();
    storage.save_ledger("Casa García", &ledger).expect("save ledger");
    let loaded = storage.load_ledger("Casa García").expect("load ledger");

    assert_eq!(loaded, ledger);
    let path = storage.ledger_path("Casa García");
    assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("json"));
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn list_and_delete_ledgers() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonLedgerStorage::new(dir.path().to_path_buf()).expect("create storage");
    storage.save_ledger("b", &Ledger::new("Beta")).unwrap();
    storage.save_ledger("a", &populated_ledger()).unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    assert_eq!(storage.list_ledgers().unwrap(), vec!["a", "b"]);

    let metadata = storage.list_ledger_metadata().unwrap();
    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata[0].name, "Beta");
    assert_eq!(metadata[1].transaction_count, 1);
    assert_eq!(metadata[1].budget_count, 1);
    assert_eq!(metadata[1].recurring_count, 1);

    storage.delete_ledger("b").unwrap();
    assert_eq!(storage.list_ledgers().unwrap(), vec!["a"]);
    assert!(matches!(
        storage.delete_ledger("b"),
        Err(CoreError::LedgerNotFound(_))
    ));
}

#[test]
fn missing_ledger_is_reported() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonLedgerStorage::new(dir.path().to_path_buf()).unwrap();
    let err = storage.load_ledger("nope").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn newer_schema_versions_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonLedgerStorage::new(dir.path().to_path_buf()).unwrap();
    let mut ledger = Ledger::new("Future");
    ledger.schema_version = u8::MAX;
    let path = dir.path().join("exported").join("future.json");
    storage.save_ledger_to_path(&ledger, &path).unwrap();

    let err = storage.load_ledger_from_path(&path).unwrap_err();
    assert!(matches!(err, CoreError::Storage(message) if message.contains("schema version")));
}

#[test]
fn canonical_names_are_filesystem_safe() {
    assert_eq!(canonical_name("Casa García"), "casa_garc_a");
    assert_eq!(canonical_name("  viaje-2024 "), "viaje-2024");
    assert_eq!(canonical_name("///"), "ledger");
}
