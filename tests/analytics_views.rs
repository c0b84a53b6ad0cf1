mod common;

use std::sync::Arc;

use fintrack::fintrack_core::{
    AnalyticsService, CategoryService, FixedClock, Granularity, LedgerApi, LedgerService,
    SortDirection, SortField, TransactionFilter, TransactionOrder, UNCATEGORIZED_COLOR,
    UNCATEGORIZED_LABEL,
};
use fintrack::fintrack_domain::{calendar, Ledger, TransactionDraft, TransactionType};
use rust_decimal::Decimal;
use uuid::Uuid;

use common::{date, money, seeded_ledger, Seeded};

fn record(
    seeded: &mut Seeded,
    name: &str,
    amount: Decimal,
    kind: TransactionType,
    category: Uuid,
    on: (i32, u32, u32),
) {
    let clock = FixedClock::on(date(2024, 12, 31));
    let draft = TransactionDraft::new(name, amount, kind, seeded.account, category)
        .created_at(calendar::midnight_utc(date(on.0, on.1, on.2)));
    LedgerService::create(&mut seeded.ledger, draft, &clock).expect("create");
}

fn populated() -> Seeded {
    let mut seeded = seeded_ledger();
    let (food, leisure, salary) = (seeded.food, seeded.leisure, seeded.salary);
    record(&mut seeded, "Nómina enero", money(2000, 0), TransactionType::Income, salary, (2024, 1, 31));
    record(&mut seeded, "Mercado", money(85, 40), TransactionType::Bill, food, (2024, 1, 6));
    record(&mut seeded, "Cine", money(18, 0), TransactionType::Bill, leisure, (2024, 1, 13));
    record(&mut seeded, "Mercado", money(62, 10), TransactionType::Bill, food, (2024, 2, 3));
    record(&mut seeded, "Nómina febrero", money(2000, 0), TransactionType::Income, salary, (2024, 2, 29));
    record(&mut seeded, "Concierto", money(55, 0), TransactionType::Bill, leisure, (2024, 2, 17));
    record(&mut seeded, "Panadería", money(4, 50), TransactionType::Bill, food, (2023, 12, 30));
    seeded
}

fn bill_total(ledger: &Ledger) -> Decimal {
    ledger
        .transactions
        .iter()
        .filter(|txn| txn.kind.is_bill())
        .map(|txn| txn.amount)
        .sum()
}

#[test]
fn category_breakdown_accounts_for_every_bill() {
    let seeded = populated();
    let breakdown =
        AnalyticsService::category_expense_breakdown(&seeded.ledger, &seeded.ledger.transactions);

    let total: Decimal = breakdown.iter().map(|entry| entry.value).sum();
    assert_eq!(total, bill_total(&seeded.ledger));
    assert_eq!(breakdown[0].label, "Comida");
    assert_eq!(breakdown[0].value, money(152, 0));
    assert_eq!(breakdown[1].label, "Ocio");
    assert!(breakdown.iter().all(|entry| entry.label != "Nómina"));
}

#[test]
fn deleted_categories_fall_back_to_placeholder() {
    let mut seeded = populated();
    CategoryService::remove(&mut seeded.ledger, seeded.leisure).expect("remove category");

    let transactions = seeded.ledger.transactions.clone();
    let breakdown = AnalyticsService::category_expense_breakdown(&seeded.ledger, &transactions);
    let placeholder = breakdown
        .iter()
        .find(|entry| entry.id.is_none())
        .expect("placeholder entry");
    assert_eq!(placeholder.label, UNCATEGORIZED_LABEL);
    assert_eq!(placeholder.color, UNCATEGORIZED_COLOR);
    assert_eq!(placeholder.value, money(73, 0));

    let total: Decimal = breakdown.iter().map(|entry| entry.value).sum();
    assert_eq!(total, bill_total(&seeded.ledger));

    let radar = AnalyticsService::top_category_radar(&seeded.ledger, &transactions, 5);
    assert!(radar.iter().any(|entry| entry.category == UNCATEGORIZED_LABEL));
}

#[test]
fn applying_the_same_filter_twice_gives_identical_results() {
    let seeded = populated();
    let filter = TransactionFilter::all()
        .between_dates(date(2024, 1, 1), date(2024, 3, 1))
        .of_kind(TransactionType::Bill)
        .ordered_by(TransactionOrder::new(SortField::Amount, SortDirection::Asc));

    let first = LedgerService::find_all(&seeded.ledger, &filter).expect("query");
    let second = LedgerService::find_all(&seeded.ledger, &filter).expect("query");
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert_eq!(first[0].name, "Cine");

    let summary_a = AnalyticsService::monthly_summary_for(&seeded.ledger, &filter).unwrap();
    let summary_b = AnalyticsService::monthly_summary_for(&seeded.ledger, &filter).unwrap();
    assert_eq!(summary_a, summary_b);
}

#[test]
fn monthly_summary_keeps_years_apart() {
    let seeded = populated();
    let summary = AnalyticsService::monthly_summary(&seeded.ledger.transactions);
    let months: Vec<&str> = summary.iter().map(|entry| entry.month.as_str()).collect();
    assert_eq!(months, vec!["2023-12", "2024-01", "2024-02"]);
    assert_eq!(summary[1].income, money(2000, 0));
    assert_eq!(summary[1].expense, money(103, 40));
}

#[test]
fn heatmap_counts_transactions_by_weekday_and_month() {
    let seeded = populated();
    let rows = AnalyticsService::heatmap(&seeded.ledger.transactions);

    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|row| row.data.len() == 12));
    let total: u32 = rows.iter().map(|row| row.total()).sum();
    assert_eq!(total as usize, seeded.ledger.transactions.len());

    // 2024-01-06 and 2024-01-13 are Saturdays.
    let saturday = rows.iter().find(|row| row.id == "Sáb").expect("saturday row");
    assert_eq!(saturday.data[0].x, "Ene");
    assert_eq!(saturday.data[0].y, 2);
}

#[test]
fn radar_ranks_by_combined_activity_and_truncates() {
    let seeded = populated();
    let radar = AnalyticsService::top_category_radar(&seeded.ledger, &seeded.ledger.transactions, 2);

    assert_eq!(radar.len(), 2);
    assert_eq!(radar[0].category, "Nómina");
    assert_eq!(radar[0].income, money(4000, 0));
    assert_eq!(radar[1].category, "Comida");
    assert_eq!(radar[1].expense, money(152, 0));
}

#[test]
fn weekly_series_uses_iso_week_keys_and_running_balance() {
    let seeded = populated();
    let buckets =
        AnalyticsService::group_by_period(&seeded.ledger.transactions, Granularity::Week, true);

    // 2023-12-30 belongs to ISO week 52 of 2023.
    assert_eq!(buckets[0].key, "2023-W52");
    assert_eq!(buckets[0].balance, Some(-money(4, 50)));
    let last = buckets.last().expect("buckets");
    let net: Decimal = seeded
        .ledger
        .transactions
        .iter()
        .map(|txn| txn.signed_amount())
        .sum();
    assert_eq!(last.balance, Some(net));
    assert!(buckets.windows(2).all(|pair| pair[0].start < pair[1].start));
}

#[test]
fn facade_views_serialize_with_chart_field_names() {
    let seeded = populated();
    let api = LedgerApi::with_clock(seeded.ledger, Arc::new(FixedClock::on(date(2024, 3, 1))));
    let filter = TransactionFilter::all();

    let summary = serde_json::to_value(api.monthly_summary(&filter).unwrap()).unwrap();
    assert!(summary[0].get("Ingresos").is_some());
    assert!(summary[0].get("Gastos").is_some());

    let heatmap = serde_json::to_value(api.heatmap(&filter).unwrap()).unwrap();
    assert_eq!(heatmap[0]["id"], "Lun");
    assert_eq!(heatmap[0]["data"][0]["x"], "Ene");

    let radar = serde_json::to_value(api.category_radar(&filter, 3).unwrap()).unwrap();
    assert!(radar[0].get("category").is_some());
    assert!(radar[0].get("Gastos").is_some());
}
