//! Read-only chart projections over a set of transactions.
//!
//! Nothing here mutates the ledger. References that no longer resolve are
//! reported under placeholder labels instead of failing.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fintrack_domain::{calendar, Ledger, Transaction, TransactionType};

use crate::{
    error::CoreResult,
    ledger_service::{LedgerService, TransactionFilter},
};

pub const WEEKDAY_LABELS: [&str; 7] = ["Lun", "Mar", "Mié", "Jue", "Vie", "Sáb", "Dom"];
pub const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];
pub const UNCATEGORIZED_LABEL: &str = "Sin categoría";
pub const UNCATEGORIZED_COLOR: &str = "#9e9e9e";
pub const DELETED_ACCOUNT_LABEL: &str = "Cuenta eliminada";
pub const DEFAULT_RADAR_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    /// First day of the bucket containing `date`.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => calendar::week_start(date),
            Granularity::Month => calendar::month_start(date),
            Granularity::Year => calendar::year_start(date),
        }
    }

    /// Stable key for the bucket starting at `start`.
    pub fn key(self, start: NaiveDate) -> String {
        match self {
            Granularity::Day => start.format("%Y-%m-%d").to_string(),
            Granularity::Week => {
                let week = start.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Granularity::Month => start.format("%Y-%m").to_string(),
            Granularity::Year => start.format("%Y").to_string(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        };
        f.write_str(label)
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" | "dia" | "día" => Ok(Granularity::Day),
            "week" | "weekly" | "semana" => Ok(Granularity::Week),
            "month" | "monthly" | "mes" => Ok(Granularity::Month),
            "year" | "yearly" | "año" => Ok(Granularity::Year),
            other => Err(format!("unknown granularity `{}`", other)),
        }
    }
}

/// Totals for one time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBucket {
    pub key: String,
    pub start: NaiveDate,
    pub income: Decimal,
    /// Absolute sum of bill amounts.
    pub expense: Decimal,
    /// Running income minus expense through this bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryExpense {
    /// `None` for the merged bucket of categories that no longer exist.
    pub id: Option<Uuid>,
    pub label: String,
    pub value: Decimal,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// `YYYY-MM`.
    pub month: String,
    #[serde(rename = "Ingresos")]
    pub income: Decimal,
    #[serde(rename = "Gastos")]
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub x: String,
    pub y: u32,
}

/// One weekday row of the activity grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub id: String,
    pub data: Vec<HeatmapCell>,
}

impl HeatmapRow {
    pub fn total(&self) -> u32 {
        self.data.iter().map(|cell| cell.y).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarEntry {
    pub category: String,
    #[serde(rename = "Gastos")]
    pub expense: Decimal,
    #[serde(rename = "Ingresos")]
    pub income: Decimal,
}

/// Income and expense per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub account_id: Uuid,
    pub label: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

#[derive(Default)]
struct Flow {
    income: Decimal,
    expense: Decimal,
}

impl Flow {
    fn add(&mut self, txn: &Transaction) {
        match txn.kind {
            TransactionType::Income => self.income += txn.amount,
            TransactionType::Bill => self.expense += txn.amount.abs(),
        }
    }
}

pub struct AnalyticsService;

impl AnalyticsService {
    /// Buckets transactions by period in chronological order.
    pub fn group_by_period(
        transactions: &[Transaction],
        granularity: Granularity,
        with_balance: bool,
    ) -> Vec<PeriodBucket> {
        let mut buckets: BTreeMap<NaiveDate, Flow> = BTreeMap::new();
        for txn in transactions {
            let start = granularity.bucket_start(txn.date());
            buckets.entry(start).or_default().add(txn);
        }
        let mut running = Decimal::ZERO;
        buckets
            .into_iter()
            .map(|(start, flow)| {
                running += flow.income - flow.expense;
                PeriodBucket {
                    key: granularity.key(start),
                    start,
                    income: flow.income,
                    expense: flow.expense,
                    balance: with_balance.then_some(running),
                }
            })
            .collect()
    }

    /// Month-granularity income/expense pairs.
    pub fn monthly_summary(transactions: &[Transaction]) -> Vec<MonthlySummary> {
        Self::group_by_period(transactions, Granularity::Month, false)
            .into_iter()
            .map(|bucket| MonthlySummary {
                month: bucket.key,
                income: bucket.income,
                expense: bucket.expense,
            })
            .collect()
    }

    /// Bill totals per category, largest first. Categories that no longer
    /// exist are merged into a single placeholder entry.
    pub fn category_expense_breakdown(
        ledger: &Ledger,
        transactions: &[Transaction],
    ) -> Vec<CategoryExpense> {
        let mut totals: HashMap<Option<Uuid>, Decimal> = HashMap::new();
        for txn in transactions.iter().filter(|txn| txn.kind.is_bill()) {
            let key = ledger
                .category(txn.category_id)
                .map(|category| category.id);
            *totals.entry(key).or_default() += txn.amount.abs();
        }
        let mut breakdown: Vec<CategoryExpense> = totals
            .into_iter()
            .filter(|(_, value)| !value.is_zero())
            .map(|(id, value)| {
                let category = id.and_then(|id| ledger.category(id));
                CategoryExpense {
                    id,
                    label: category
                        .map(|category| category.name.clone())
                        .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string()),
                    value,
                    color: category
                        .map(|category| category.color.clone())
                        .filter(|color| !color.is_empty())
                        .unwrap_or_else(|| UNCATEGORIZED_COLOR.to_string()),
                }
            })
            .collect();
        breakdown.sort_by(|a, b| {
            b.value
                .cmp(&a.value)
                .then_with(|| a.label.cmp(&b.label))
                .then_with(|| a.id.cmp(&b.id))
        });
        breakdown
    }

    /// Weekday by month activity counts: seven rows `Lun..Dom`, twelve cells `Ene..Dic`.
    pub fn heatmap(transactions: &[Transaction]) -> Vec<HeatmapRow> {
        let mut grid = [[0u32; 12]; 7];
        for txn in transactions {
            let date = txn.date();
            let weekday = date.weekday().num_days_from_monday() as usize;
            let month = date.month0() as usize;
            grid[weekday][month] += 1;
        }
        WEEKDAY_LABELS
            .iter()
            .zip(grid.iter())
            .map(|(weekday, counts)| HeatmapRow {
                id: weekday.to_string(),
                data: MONTH_LABELS
                    .iter()
                    .zip(counts.iter())
                    .map(|(month, count)| HeatmapCell {
                        x: month.to_string(),
                        y: *count,
                    })
                    .collect(),
            })
            .collect()
    }

    /// The `n` categories with the most combined activity.
    pub fn top_category_radar(
        ledger: &Ledger,
        transactions: &[Transaction],
        n: usize,
    ) -> Vec<RadarEntry> {
        let mut flows: HashMap<Option<Uuid>, Flow> = HashMap::new();
        for txn in transactions {
            let key = ledger
                .category(txn.category_id)
                .map(|category| category.id);
            flows.entry(key).or_default().add(txn);
        }
        let mut entries: Vec<RadarEntry> = flows
            .into_iter()
            .map(|(id, flow)| RadarEntry {
                category: Self::category_label(ledger, id),
                expense: flow.expense,
                income: flow.income,
            })
            .collect();
        entries.sort_by(|a, b| {
            let total_a = a.expense + a.income;
            let total_b = b.expense + b.income;
            match total_b.cmp(&total_a) {
                Ordering::Equal => a.category.cmp(&b.category),
                other => other,
            }
        });
        entries.truncate(n);
        entries
    }

    /// Income and expense per account, with a placeholder for deleted accounts.
    pub fn account_totals(ledger: &Ledger, transactions: &[Transaction]) -> Vec<AccountTotals> {
        let mut flows: BTreeMap<Uuid, Flow> = BTreeMap::new();
        for txn in transactions {
            flows.entry(txn.account_id).or_default().add(txn);
        }
        let mut totals: Vec<AccountTotals> = flows
            .into_iter()
            .map(|(account_id, flow)| AccountTotals {
                account_id,
                label: ledger
                    .account(account_id)
                    .map(|account| account.name.clone())
                    .unwrap_or_else(|| DELETED_ACCOUNT_LABEL.to_string()),
                income: flow.income,
                expense: flow.expense,
                net: flow.income - flow.expense,
            })
            .collect();
        totals.sort_by(|a, b| {
            a.label
                .to_lowercase()
                .cmp(&b.label.to_lowercase())
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        totals
    }

    pub fn category_expenses(
        ledger: &Ledger,
        filter: &TransactionFilter,
    ) -> CoreResult<Vec<CategoryExpense>> {
        let transactions = LedgerService::find_all(ledger, filter)?;
        Ok(Self::category_expense_breakdown(ledger, &transactions))
    }

    pub fn monthly_summary_for(
        ledger: &Ledger,
        filter: &TransactionFilter,
    ) -> CoreResult<Vec<MonthlySummary>> {
        let transactions = LedgerService::find_all(ledger, filter)?;
        Ok(Self::monthly_summary(&transactions))
    }

    pub fn heatmap_for(ledger: &Ledger, filter: &TransactionFilter) -> CoreResult<Vec<HeatmapRow>> {
        let transactions = LedgerService::find_all(ledger, filter)?;
        Ok(Self::heatmap(&transactions))
    }

    pub fn radar_for(
        ledger: &Ledger,
        filter: &TransactionFilter,
        n: usize,
    ) -> CoreResult<Vec<RadarEntry>> {
        let transactions = LedgerService::find_all(ledger, filter)?;
        Ok(Self::top_category_radar(ledger, &transactions, n))
    }

    pub fn series_for(
        ledger: &Ledger,
        filter: &TransactionFilter,
        granularity: Granularity,
        with_balance: bool,
    ) -> CoreResult<Vec<PeriodBucket>> {
        let transactions = LedgerService::find_all(ledger, filter)?;
        Ok(Self::group_by_period(&transactions, granularity, with_balance))
    }

    fn category_label(ledger: &Ledger, id: Option<Uuid>) -> String {
        id.and_then(|id| ledger.category(id))
            .map(|category| category.name.clone())
            .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string())
    }
}
