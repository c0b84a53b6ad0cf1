use fintrack_core::BudgetService;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{parse_amount, CommandDefinition, ParsedArgs};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "budget",
        "Manage per-category spending limits",
        "budget <add <category> <amount>|list|limit <category> <amount>|reconcile [category]|remove <category>>",
        cmd_budget,
    )]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: budget <add|list|limit|reconcile|remove>".into(),
        ));
    };
    match action.to_lowercase().as_str() {
        "add" => add_budget(context, rest),
        "list" => list_budgets(context),
        "limit" => set_limit(context, rest),
        "reconcile" => reconcile(context, rest),
        "remove" | "rm" => remove_budget(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown budget subcommand `{}`",
            other
        ))),
    }
}

/// Category name first, amount last, so multi-word names work unquoted.
fn category_and_amount(parsed: &ParsedArgs<'_>) -> Result<(String, Decimal), CommandError> {
    let positionals = parsed.positionals();
    let Some((amount, category)) = positionals.split_last() else {
        return Err(CommandError::InvalidArguments("missing category and amount".into()));
    };
    if category.is_empty() {
        return Err(CommandError::InvalidArguments("missing category or amount".into()));
    }
    Ok((category.join(" "), parse_amount(amount)?))
}

fn budget_id_for(context: &ShellContext, category: &str) -> Result<Uuid, CommandError> {
    let category_id = context.resolve_category(category)?;
    context
        .api()
        .with_ledger(|ledger| ledger.budget_for_category(category_id).map(|b| b.id))?
        .ok_or_else(|| CommandError::InvalidArguments(format!("category `{}` has no budget", category)))
}

fn add_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let (category, amount) = category_and_amount(&parsed)?;
    let category_id = context.resolve_category(&category)?;
    let budget = context.api().create_budget(category_id, amount)?;
    context.save()?;
    output::success(format!(
        "Budget of {} set for `{}` ({} already consumed).",
        context.money(budget.amount),
        category,
        context.money(budget.current_amount)
    ));
    Ok(())
}

fn list_budgets(context: &mut ShellContext) -> CommandResult {
    let lines = context.api().with_ledger(BudgetService::status)?;
    output::section(format!("Budgets ({})", lines.len()));
    for line in lines {
        let percent = line
            .percent_used
            .map(|value| format!("{}%", value.round_dp(1)))
            .unwrap_or_else(|| "-".to_string());
        let text = format!(
            "  {:<20} {:>14} of {:>14}  {:>7}  left {}",
            line.category,
            context.money(line.consumed),
            context.money(line.limit),
            percent,
            context.money(line.remaining)
        );
        if line.over_budget {
            output::warning(format!("{} (over budget)", text.trim_start()));
        } else {
            output::row(text);
        }
    }
    Ok(())
}

fn set_limit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let (category, amount) = category_and_amount(&parsed)?;
    let budget_id = budget_id_for(context, &category)?;
    let budget = context
        .api()
        .with_ledger_mut(|ledger, _| BudgetService::set_limit(ledger, budget_id, amount))?;
    context.save()?;
    output::success(format!(
        "Budget for `{}` is now {}.",
        category,
        context.money(budget.amount)
    ));
    Ok(())
}

fn reconcile(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        let drift = context
            .api()
            .with_ledger_mut(|ledger, _| Ok(BudgetService::reconcile_all(ledger)))?;
        for entry in &drift {
            output::warning(format!(
                "Budget {} drifted: recorded {}, recomputed {}",
                entry.budget_id,
                context.money(entry.recorded),
                context.money(entry.expected)
            ));
        }
        if !drift.is_empty() {
            context.save()?;
        }
        output::success(format!("Corrected {} drifted budget(s).", drift.len()));
        return Ok(());
    }
    let category = args.join(" ");
    let budget_id = budget_id_for(context, &category)?;
    let budget = context.api().reconcile_budget(budget_id)?;
    context.save()?;
    output::success(format!(
        "Budget for `{}` recomputed: {} consumed.",
        category,
        context.money(budget.current_amount)
    ));
    Ok(())
}

fn remove_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(CommandError::InvalidArguments("missing category".into()));
    }
    let category = args.join(" ");
    let budget_id = budget_id_for(context, &category)?;
    context
        .api()
        .with_ledger_mut(|ledger, _| BudgetService::remove(ledger, budget_id))?;
    context.save()?;
    output::success(format!("Budget for `{}` removed.", category));
    Ok(())
}
