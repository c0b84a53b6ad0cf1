use fintrack_core::RecurrenceService;
use fintrack_domain::{RecurringTransaction, TransactionType};

use super::{parse_amount, parse_date, parse_value, CommandDefinition, ParsedArgs};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "recurring",
        "Monthly recurring transactions",
        "recurring add <income|bill> <amount> <name> --day <1-31> --account <a> --category <c> [--desc <text>]\n\
         recurring list\n\
         recurring day <name> <1-31>\n\
         recurring process [name] [--as-of YYYY-MM-DD]\n\
         recurring remove <name>",
        cmd_recurring,
    )]
}

fn cmd_recurring(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: recurring <add|list|day|process|remove>".into(),
        ));
    };
    match action.to_lowercase().as_str() {
        "add" => add_recurring(context, rest),
        "list" => list_recurring(context),
        "day" => change_day(context, rest),
        "process" => process(context, rest),
        "remove" | "rm" => remove_recurring(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown recurring subcommand `{}`",
            other
        ))),
    }
}

fn add_recurring(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["day", "account", "category", "desc"], &[])?;
    let kind: TransactionType = parse_value(parsed.require(0, "transaction type")?, "type")?;
    let amount = parse_amount(parsed.require(1, "amount")?)?;
    let name = parsed
        .rest(2)
        .ok_or_else(|| CommandError::InvalidArguments("missing recurring name".into()))?;
    let day: u32 = parse_value(
        parsed
            .option("day")
            .ok_or_else(|| CommandError::InvalidArguments("`--day` is required".into()))?,
        "day",
    )?;
    let account = parsed
        .option("account")
        .ok_or_else(|| CommandError::InvalidArguments("`--account` is required".into()))?;
    let category = parsed
        .option("category")
        .ok_or_else(|| CommandError::InvalidArguments("`--category` is required".into()))?;
    let account_id = context.resolve_account(account)?;
    let category_id = context.resolve_category(category)?;

    let created = context.api().with_ledger_mut(|ledger, clock| {
        let mut definition =
            RecurringTransaction::new(name, amount, kind, account_id, category_id, day)
                .created_at(clock.now());
        if let Some(desc) = parsed.option("desc") {
            definition = definition.with_description(desc);
        }
        RecurrenceService::create(ledger, definition)
    })?;
    context.save()?;
    output::success(format!(
        "`{}` scheduled on day {} for {}.",
        created.name,
        created.day_of_month,
        context.money(created.amount)
    ));
    Ok(())
}

fn list_recurring(context: &mut ShellContext) -> CommandResult {
    let (rows, commitment) = context.api().with_ledger(|ledger| {
        let rows: Vec<String> = ledger
            .recurring
            .iter()
            .map(|definition| {
                let last = definition
                    .last_execution_date
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "never".to_string());
                format!(
                    "  {:<24} day {:>2}  {:>14}  {:<6}  last {}",
                    definition.name,
                    definition.day_of_month,
                    context.money(definition.kind.signed(definition.amount)),
                    definition.kind.to_string().to_lowercase(),
                    last
                )
            })
            .collect();
        (rows, RecurrenceService::monthly_commitment(ledger))
    })?;
    output::section(format!("Recurring transactions ({})", rows.len()));
    for row in rows {
        output::row(row);
    }
    output::info(format!("Net monthly commitment: {}", context.money(commitment)));
    Ok(())
}

fn change_day(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((day, name)) = args.split_last() else {
        return Err(CommandError::InvalidArguments("missing name and day".into()));
    };
    if name.is_empty() {
        return Err(CommandError::InvalidArguments("missing name or day".into()));
    }
    let day: u32 = parse_value(day, "day")?;
    let id = context.resolve_recurring(&name.join(" "))?;
    let updated = context
        .api()
        .with_ledger_mut(|ledger, _| RecurrenceService::update_day(ledger, id, day))?;
    context.save()?;
    output::success(format!(
        "`{}` now runs on day {}.",
        updated.name, updated.day_of_month
    ));
    Ok(())
}

fn process(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["as-of"], &[])?;
    let as_of = parsed.option("as-of").map(parse_date).transpose()?;
    let id = match parsed.rest(0) {
        Some(name) => Some(context.resolve_recurring(&name)?),
        None => None,
    };
    let report = context.api().process_recurring(id, as_of)?;
    for failure in &report.failures {
        output::warning(format!("`{}` failed: {}", failure.name, failure.error));
    }
    if !report.created.is_empty() {
        context.save()?;
    }
    for txn in &report.created {
        output::row(format!(
            "  {}  {:<24} {:>14}",
            txn.date(),
            txn.name,
            context.money(txn.signed_amount())
        ));
    }
    output::success(format!(
        "Created {} transaction(s).",
        report.created.len()
    ));
    if report.is_clean() {
        Ok(())
    } else {
        Err(CommandError::InvalidArguments(format!(
            "{} recurring definition(s) could not be processed",
            report.failures.len()
        )))
    }
}

fn remove_recurring(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(CommandError::InvalidArguments("missing recurring name".into()));
    }
    let id = context.resolve_recurring(&args.join(" "))?;
    let removed = context
        .api()
        .with_ledger_mut(|ledger, _| RecurrenceService::remove(ledger, id))?;
    context.save()?;
    output::success(format!("`{}` removed; its transactions are kept.", removed.name));
    Ok(())
}
