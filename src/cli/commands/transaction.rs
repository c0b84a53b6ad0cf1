use chrono::Days;
use fintrack_core::{SortDirection, SortField, TransactionFilter, TransactionOrder};
use fintrack_domain::{calendar, Transaction, TransactionDraft, TransactionType};

use super::{parse_amount, parse_date, parse_value, CommandDefinition, ParsedArgs};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

/// Options understood by every command that narrows the transaction set.
pub(crate) const FILTER_OPTIONS: [&str; 8] = [
    "from", "to", "account", "category", "type", "min", "max", "search",
];

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "txn",
        "Record, edit, list and delete transactions",
        "txn add <income|bill> <amount> <name> --account <a> --category <c> [--date YYYY-MM-DD] [--desc <text>] [--budget]\n\
         txn list [--from D] [--to D] [--account A] [--category C] [--type T] [--min N] [--max N] [--search S] [--sort created|amount|name] [--asc|--desc] [--json]\n\
         txn edit <id|prefix> [--name N] [--amount N] [--type T] [--account A] [--category C] [--date YYYY-MM-DD] [--desc <text>] [--budget|--no-budget]\n\
         txn remove <id|prefix>",
        cmd_transaction,
    )]
}

fn cmd_transaction(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: txn <add|edit|list|remove>".into(),
        ));
    };
    match action.to_lowercase().as_str() {
        "add" => add_transaction(context, rest),
        "edit" => edit_transaction(context, rest),
        "list" | "ls" => list_transactions(context, rest),
        "remove" | "rm" => remove_transaction(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown txn subcommand `{}`",
            other
        ))),
    }
}

fn add_transaction(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["account", "category", "date", "desc"], &["budget"])?;
    let kind: TransactionType = parse_value(parsed.require(0, "transaction type")?, "type")?;
    let amount = parse_amount(parsed.require(1, "amount")?)?;
    let name = parsed
        .rest(2)
        .ok_or_else(|| CommandError::InvalidArguments("missing transaction name".into()))?;
    let account = parsed
        .option("account")
        .ok_or_else(|| CommandError::InvalidArguments("`--account` is required".into()))?;
    let category = parsed
        .option("category")
        .ok_or_else(|| CommandError::InvalidArguments("`--category` is required".into()))?;
    let account_id = context.resolve_account(account)?;
    let category_id = context.resolve_category(category)?;

    let mut draft = TransactionDraft::new(name, amount, kind, account_id, category_id);
    if let Some(desc) = parsed.option("desc") {
        draft = draft.with_description(desc);
    }
    if let Some(raw) = parsed.option("date") {
        draft = draft.created_at(calendar::midnight_utc(parse_date(raw)?));
    }
    if parsed.flag("budget") {
        let budget_id = context
            .api()
            .with_ledger(|ledger| ledger.budget_for_category(category_id).map(|b| b.id))?
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!("category `{}` has no budget", category))
            })?;
        draft = draft.with_budget(budget_id);
    }

    let txn = context.api().create_transaction(draft)?;
    context.save()?;
    output::success(format!(
        "Recorded {} `{}` for {} ({}).",
        txn.kind.to_string().to_lowercase(),
        txn.name,
        context.money(txn.amount),
        short_id(&txn)
    ));
    Ok(())
}

/// Starts from the stored record and overrides only the fields passed.
fn edit_transaction(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(
        args,
        &["name", "amount", "type", "account", "category", "date", "desc"],
        &["budget", "no-budget"],
    )?;
    let id = context.resolve_transaction(parsed.require(0, "transaction id")?)?;
    let current = context.api().get_transaction(id)?;
    let mut draft = TransactionDraft::from(&current);

    if let Some(name) = parsed.option("name") {
        draft.name = name.to_string();
    }
    if let Some(raw) = parsed.option("amount") {
        draft.amount = parse_amount(raw)?;
    }
    if let Some(raw) = parsed.option("type") {
        draft.kind = parse_value(raw, "type")?;
    }
    if let Some(account) = parsed.option("account") {
        draft.account_id = context.resolve_account(account)?;
    }
    if let Some(category) = parsed.option("category") {
        draft.category_id = context.resolve_category(category)?;
    }
    if let Some(raw) = parsed.option("date") {
        draft.created_at = Some(calendar::midnight_utc(parse_date(raw)?));
    }
    if let Some(desc) = parsed.option("desc") {
        draft.description = Some(desc.to_string()).filter(|text| !text.trim().is_empty());
    }

    match (parsed.flag("budget"), parsed.flag("no-budget")) {
        (true, true) => {
            return Err(CommandError::InvalidArguments(
                "`--budget` and `--no-budget` are mutually exclusive".into(),
            ))
        }
        (true, false) => {
            let category_id = draft.category_id;
            let budget_id = context
                .api()
                .with_ledger(|ledger| ledger.budget_for_category(category_id).map(|b| b.id))?
                .ok_or_else(|| {
                    CommandError::InvalidArguments("the transaction's category has no budget".into())
                })?;
            draft.budget_id = Some(budget_id);
        }
        (false, true) => draft.budget_id = None,
        // A budget belongs to one category; moving the record drops the tag.
        (false, false) if draft.category_id != current.category_id => draft.budget_id = None,
        (false, false) => {}
    }

    let updated = context.api().update_transaction(id, draft)?;
    context.save()?;
    output::success(format!(
        "Updated `{}`: {} {} ({}).",
        updated.name,
        updated.kind.to_string().to_lowercase(),
        context.money(updated.amount),
        short_id(&updated)
    ));
    if current.budget_id.is_some() && updated.budget_id.is_none() {
        output::info("The transaction no longer counts against a budget.");
    }
    Ok(())
}

fn list_transactions(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut valued = FILTER_OPTIONS.to_vec();
    valued.push("sort");
    let parsed = ParsedArgs::parse(args, &valued, &["asc", "desc", "json"])?;
    let filter = build_filter(context, &parsed)?.ordered_by(parse_order(&parsed)?);
    let transactions = context.api().find_transactions(&filter)?;

    if parsed.flag("json") {
        output::row(serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }
    let rows: Vec<String> = context.api().with_ledger(|ledger| {
        transactions
            .iter()
            .map(|txn| {
                let category = ledger
                    .category(txn.category_id)
                    .map(|category| category.name.as_str())
                    .unwrap_or(fintrack_core::UNCATEGORIZED_LABEL);
                let account = ledger
                    .account(txn.account_id)
                    .map(|account| account.name.as_str())
                    .unwrap_or(fintrack_core::DELETED_ACCOUNT_LABEL);
                format!(
                    "  {}  {}  {:<24} {:>14}  {} / {}",
                    short_id(txn),
                    txn.date(),
                    txn.name,
                    context.money(txn.signed_amount()),
                    account,
                    category
                )
            })
            .collect()
    })?;
    output::section(format!("Transactions ({})", rows.len()));
    for row in rows {
        output::row(row);
    }
    Ok(())
}

fn remove_transaction(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let token = args
        .first()
        .ok_or_else(|| CommandError::InvalidArguments("missing transaction id".into()))?;
    let id = context.resolve_transaction(token)?;
    let removed = context.api().delete_transaction(id)?;
    context.save()?;
    output::success(format!("Deleted `{}` ({}).", removed.name, short_id(&removed)));
    Ok(())
}

/// Builds a filter from the shared options. `--to` is inclusive on the
/// command line.
pub(crate) fn build_filter(
    context: &ShellContext,
    parsed: &ParsedArgs<'_>,
) -> Result<TransactionFilter, CommandError> {
    let mut filter = TransactionFilter::all();
    if let Some(raw) = parsed.option("from") {
        filter.from = Some(calendar::midnight_utc(parse_date(raw)?));
    }
    if let Some(raw) = parsed.option("to") {
        let to = parse_date(raw)?
            .checked_add_days(Days::new(1))
            .ok_or_else(|| CommandError::InvalidArguments(format!("date `{}` is out of range", raw)))?;
        filter.to = Some(calendar::midnight_utc(to));
    }
    if let Some(account) = parsed.option("account") {
        filter = filter.for_account(context.resolve_account(account)?);
    }
    if let Some(category) = parsed.option("category") {
        filter = filter.for_category(context.resolve_category(category)?);
    }
    if let Some(raw) = parsed.option("type") {
        filter = filter.of_kind(parse_value(raw, "type")?);
    }
    let min = parsed.option("min").map(parse_amount).transpose()?;
    let max = parsed.option("max").map(parse_amount).transpose()?;
    filter = filter.amount_between(min, max);
    if let Some(text) = parsed.option("search") {
        filter = filter.matching(text);
    }
    filter.validate()?;
    Ok(filter)
}

fn parse_order(parsed: &ParsedArgs<'_>) -> Result<TransactionOrder, CommandError> {
    let field = match parsed.option("sort").map(str::to_lowercase).as_deref() {
        None | Some("created") | Some("date") => SortField::CreatedAt,
        Some("amount") => SortField::Amount,
        Some("name") => SortField::Name,
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown sort field `{}` (created, amount, name)",
                other
            )))
        }
    };
    let direction = match (parsed.flag("asc"), parsed.flag("desc")) {
        (true, true) => {
            return Err(CommandError::InvalidArguments(
                "`--asc` and `--desc` are mutually exclusive".into(),
            ))
        }
        (true, false) => SortDirection::Asc,
        _ => SortDirection::Desc,
    };
    Ok(TransactionOrder::new(field, direction))
}

fn short_id(txn: &Transaction) -> String {
    txn.id.to_string()[..8].to_string()
}
