use fintrack_core::AccountService;
use fintrack_domain::Account;

use super::{parse_value, CommandDefinition, ParsedArgs};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "account",
        "Manage accounts",
        "account <add <name> [--bank <bank>] [--balance <amount>]|list|remove <name>>",
        cmd_account,
    )]
}

fn cmd_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: account <add|list|remove>".into(),
        ));
    };
    match action.to_lowercase().as_str() {
        "add" => add_account(context, rest),
        "list" => list_accounts(context),
        "remove" | "rm" => remove_account(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown account subcommand `{}`",
            other
        ))),
    }
}

fn add_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["bank", "balance"], &[])?;
    let name = parsed
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments("missing account name".into()))?;
    let mut account = Account::new(name.clone(), parsed.option("bank").unwrap_or_default());
    if let Some(raw) = parsed.option("balance") {
        account = account.with_balance(parse_value(&raw.replace(',', "."), "balance")?);
    }
    context
        .api()
        .with_ledger_mut(|ledger, _| AccountService::add(ledger, account))?;
    context.save()?;
    output::success(format!("Account `{}` added.", name));
    Ok(())
}

fn list_accounts(context: &mut ShellContext) -> CommandResult {
    let rows: Vec<String> = context.api().with_ledger(|ledger| {
        AccountService::list(ledger)
            .into_iter()
            .map(|account| {
                format!(
                    "  {:<20} {:<14} {:>14}",
                    account.name,
                    account.bank,
                    context.money(account.balance)
                )
            })
            .collect()
    })?;
    output::section(format!("Accounts ({})", rows.len()));
    for row in rows {
        output::row(row);
    }
    Ok(())
}

fn remove_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let token = args.join(" ");
    if token.trim().is_empty() {
        return Err(CommandError::InvalidArguments("missing account name".into()));
    }
    let id = context.resolve_account(&token)?;
    let removed = context
        .api()
        .with_ledger_mut(|ledger, _| AccountService::remove(ledger, id))?;
    context.save()?;
    output::success(format!("Account `{}` removed.", removed.name));
    Ok(())
}
