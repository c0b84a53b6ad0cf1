use fintrack_core::{CategoryService, CoreError, EntityKind};
use fintrack_domain::Category;

use super::{CommandDefinition, ParsedArgs};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

const DEFAULT_ICON: &str = "•";
const DEFAULT_COLOR: &str = "#64748b";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "category",
        "Manage categories",
        "category <add <name> [--icon <glyph>] [--color <hex>]|edit <name> [--name <new>] [--icon <glyph>] [--color <hex>]|list|remove <name>>",
        cmd_category,
    )]
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: category <add|edit|list|remove>".into(),
        ));
    };
    match action.to_lowercase().as_str() {
        "add" => add_category(context, rest),
        "edit" => edit_category(context, rest),
        "list" => list_categories(context),
        "remove" | "rm" => remove_category(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown category subcommand `{}`",
            other
        ))),
    }
}

fn add_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["icon", "color"], &[])?;
    let name = parsed
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments("missing category name".into()))?;
    let category = Category::new(
        name.clone(),
        parsed.option("icon").unwrap_or(DEFAULT_ICON),
        parsed.option("color").unwrap_or(DEFAULT_COLOR),
    );
    context
        .api()
        .with_ledger_mut(|ledger, _| CategoryService::add(ledger, category))?;
    context.save()?;
    output::success(format!("Category `{}` added.", name));
    Ok(())
}

fn edit_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["name", "icon", "color"], &[])?;
    let token = parsed
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments("missing category name".into()))?;
    if parsed.option("name").is_none()
        && parsed.option("icon").is_none()
        && parsed.option("color").is_none()
    {
        return Err(CommandError::InvalidArguments(
            "nothing to change; pass `--name`, `--icon` or `--color`".into(),
        ));
    }
    let id = context.resolve_category(&token)?;
    let name = context.api().with_ledger_mut(|ledger, _| {
        let current = ledger
            .category(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Category, id))?;
        let changes = Category::new(
            parsed.option("name").unwrap_or(current.name.as_str()),
            parsed.option("icon").unwrap_or(current.icon.as_str()),
            parsed.option("color").unwrap_or(current.color.as_str()),
        );
        let name = changes.name.clone();
        CategoryService::edit(ledger, id, changes)?;
        Ok(name)
    })?;
    context.save()?;
    output::success(format!("Category `{}` updated.", name.trim()));
    Ok(())
}

fn list_categories(context: &mut ShellContext) -> CommandResult {
    let rows: Vec<String> = context.api().with_ledger(|ledger| {
        CategoryService::list(ledger)
            .into_iter()
            .map(|category| {
                let budget = ledger
                    .budget_for_category(category.id)
                    .map(|budget| format!("budget {}", context.money(budget.amount)))
                    .unwrap_or_default();
                format!(
                    "  {} {:<20} {:<8} {}",
                    category.icon, category.name, category.color, budget
                )
            })
            .collect()
    })?;
    output::section(format!("Categories ({})", rows.len()));
    for row in rows {
        output::row(row.trim_end());
    }
    Ok(())
}

fn remove_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let token = args.join(" ");
    if token.trim().is_empty() {
        return Err(CommandError::InvalidArguments("missing category name".into()));
    }
    let id = context.resolve_category(&token)?;
    let removed = context
        .api()
        .with_ledger_mut(|ledger, _| CategoryService::remove(ledger, id))?;
    context.save()?;
    output::success(format!("Category `{}` removed.", removed.name));
    Ok(())
}
