use fintrack_core::{ledger_warnings, BudgetService};
use fintrack_domain::CURRENT_SCHEMA_VERSION;

use super::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::{help, output};
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new(
            "check",
            "Report dangling references and budget drift",
            "check [--fix]",
            cmd_check,
        ),
        CommandDefinition::new("exit", "Stop reading the script", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let definition = context.command(&name.to_lowercase()).ok_or_else(|| {
            CommandError::InvalidArguments(format!("Unknown command `{}`", name))
        })?;
        help::print_command(definition);
        return Ok(());
    }
    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("fintrack {}", meta.version));
    output::row(format!("  Schema ver   : v{}", CURRENT_SCHEMA_VERSION));
    output::row(format!(
        "  Build hash   : {} ({})",
        meta.git_hash, meta.git_status
    ));
    output::row(format!("  Built at     : {}", meta.timestamp));
    output::row(format!("  Target       : {}", meta.target));
    output::row(format!("  Profile      : {}", meta.profile));
    output::row(format!("  Rustc        : {}", meta.rustc));
    Ok(())
}

fn cmd_check(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = super::ParsedArgs::parse(args, &[], &["fix"])?;
    let (warnings, drift) = context.api().with_ledger(|ledger| {
        let drift: Vec<_> = ledger
            .budgets
            .iter()
            .filter_map(|budget| BudgetService::verify(ledger, budget.id).err())
            .collect();
        (ledger_warnings(ledger), drift)
    })?;

    for warning in &warnings {
        output::warning(warning);
    }
    for err in &drift {
        output::warning(err);
    }
    if !drift.is_empty() && parsed.flag("fix") {
        let fixed = context
            .api()
            .with_ledger_mut(|ledger, _| Ok(BudgetService::reconcile_all(ledger)))?;
        context.save()?;
        output::success(format!("Corrected {} drifted budget(s).", fixed.len()));
    }
    if warnings.is_empty() && drift.is_empty() {
        output::success("Ledger is consistent.");
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
