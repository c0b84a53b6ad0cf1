use serde::Serialize;

use fintrack_core::{AnalyticsService, Granularity};

use super::transaction::{build_filter, FILTER_OPTIONS};
use super::{parse_value, CommandDefinition, ParsedArgs};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "report",
        "Chart-ready aggregates over the filtered transactions",
        "report <monthly|categories|heatmap|radar [--top N]|series <day|week|month|year> [--balance]|accounts> [filters] [--json]",
        cmd_report,
    )]
}

fn cmd_report(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((view, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: report <monthly|categories|heatmap|radar|series|accounts>".into(),
        ));
    };
    let mut valued = FILTER_OPTIONS.to_vec();
    valued.push("top");
    let parsed = ParsedArgs::parse(rest, &valued, &["json", "balance"])?;
    let filter = build_filter(context, &parsed)?;
    let json = parsed.flag("json");

    match view.to_lowercase().as_str() {
        "monthly" => {
            let summary = context.api().monthly_summary(&filter)?;
            if json {
                return print_json(&summary);
            }
            output::section("Monthly summary");
            for month in summary {
                output::row(format!(
                    "  {}  in {:>14}  out {:>14}",
                    month.month,
                    context.money(month.income),
                    context.money(month.expense)
                ));
            }
        }
        "categories" => {
            let breakdown = context.api().category_expenses(&filter)?;
            if json {
                return print_json(&breakdown);
            }
            output::section("Expenses by category");
            for entry in breakdown {
                output::row(format!(
                    "  {:<20} {:>14}  {}",
                    entry.label,
                    context.money(entry.value),
                    entry.color
                ));
            }
        }
        "heatmap" => {
            let rows = context.api().heatmap(&filter)?;
            if json {
                return print_json(&rows);
            }
            output::section("Activity by weekday and month");
            let header: Vec<String> = fintrack_core::MONTH_LABELS
                .iter()
                .map(|label| format!("{:>4}", label))
                .collect();
            output::row(format!("       {}", header.join("")));
            for row in rows {
                let cells: Vec<String> = row.data.iter().map(|cell| format!("{:>4}", cell.y)).collect();
                output::row(format!("  {:<4} {}", row.id, cells.join("")));
            }
        }
        "radar" => {
            let top = match parsed.option("top") {
                Some(raw) => parse_value::<usize>(raw, "top")?,
                None => context.config().radar_size,
            };
            let entries = context.api().category_radar(&filter, top)?;
            if json {
                return print_json(&entries);
            }
            output::section(format!("Top {} categories", top));
            for entry in entries {
                output::row(format!(
                    "  {:<20} out {:>14}  in {:>14}",
                    entry.category,
                    context.money(entry.expense),
                    context.money(entry.income)
                ));
            }
        }
        "series" => {
            let granularity: Granularity = parse_value(parsed.require(0, "granularity")?, "granularity")?;
            let with_balance = parsed.flag("balance");
            let buckets = context.api().with_ledger(|ledger| {
                AnalyticsService::series_for(ledger, &filter, granularity, with_balance)
            })??;
            if json {
                return print_json(&buckets);
            }
            output::section(format!("Totals per {}", granularity));
            for bucket in buckets {
                let balance = bucket
                    .balance
                    .map(|value| format!("  balance {:>14}", context.money(value)))
                    .unwrap_or_default();
                output::row(format!(
                    "  {:<10}  in {:>14}  out {:>14}{}",
                    bucket.key,
                    context.money(bucket.income),
                    context.money(bucket.expense),
                    balance
                ));
            }
        }
        "accounts" => {
            let totals = context.api().with_ledger(|ledger| {
                fintrack_core::LedgerService::find_all(ledger, &filter)
                    .map(|transactions| AnalyticsService::account_totals(ledger, &transactions))
            })??;
            if json {
                return print_json(&totals);
            }
            output::section("Totals per account");
            for entry in totals {
                output::row(format!(
                    "  {:<20}  in {:>14}  out {:>14}  net {:>14}",
                    entry.label,
                    context.money(entry.income),
                    context.money(entry.expense),
                    context.money(entry.net)
                ));
            }
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown report `{}`",
                other
            )))
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> CommandResult {
    output::row(serde_json::to_string_pretty(value)?);
    Ok(())
}
