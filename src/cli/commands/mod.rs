use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

pub mod account;
pub mod budget;
pub mod category;
pub mod recurring;
pub mod report;
pub mod system;
pub mod transaction;

use crate::cli::context::{CommandError, CommandResult, ShellContext};

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(account::definitions());
    commands.extend(category::definitions());
    commands.extend(transaction::definitions());
    commands.extend(budget::definitions());
    commands.extend(recurring::definitions());
    commands.extend(report::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }
}

/// Positional arguments plus `--name value` options and `--flag` switches.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    positionals: Vec<&'a str>,
    options: HashMap<&'a str, &'a str>,
    flags: Vec<&'a str>,
}

impl<'a> ParsedArgs<'a> {
    /// Splits `args`, accepting only the listed option and flag names
    /// (without the leading dashes).
    pub(crate) fn parse(
        args: &[&'a str],
        valued: &[&str],
        switches: &[&str],
    ) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(name) = arg.strip_prefix("--") else {
                parsed.positionals.push(arg);
                continue;
            };
            if switches.contains(&name) {
                parsed.flags.push(name);
            } else if valued.contains(&name) {
                let value = iter.next().ok_or_else(|| {
                    CommandError::InvalidArguments(format!("option `--{}` needs a value", name))
                })?;
                parsed.options.insert(name, value);
            } else {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `--{}`",
                    name
                )));
            }
        }
        Ok(parsed)
    }

    pub(crate) fn positionals(&self) -> &[&'a str] {
        &self.positionals
    }

    pub(crate) fn positional(&self, index: usize) -> Option<&'a str> {
        self.positionals.get(index).copied()
    }

    pub(crate) fn require(&self, index: usize, what: &str) -> Result<&'a str, CommandError> {
        self.positional(index)
            .ok_or_else(|| CommandError::InvalidArguments(format!("missing {}", what)))
    }

    /// Positionals from `index` on, joined with spaces.
    pub(crate) fn rest(&self, index: usize) -> Option<String> {
        if index >= self.positionals.len() {
            return None;
        }
        Some(self.positionals[index..].join(" "))
    }

    pub(crate) fn option(&self, name: &str) -> Option<&'a str> {
        self.options.get(name).copied()
    }

    pub(crate) fn flag(&self, name: &str) -> bool {
        self.flags.contains(&name)
    }
}

/// Parses a non-negative amount; a decimal comma is accepted.
pub(crate) fn parse_amount(raw: &str) -> Result<Decimal, CommandError> {
    let normalized = raw.trim().replace(',', ".");
    let amount = Decimal::from_str(&normalized)
        .map_err(|_| CommandError::InvalidArguments(format!("invalid amount `{}`", raw)))?;
    if amount.is_sign_negative() {
        return Err(CommandError::InvalidArguments(format!(
            "amount must not be negative (got {})",
            raw
        )));
    }
    Ok(amount)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (expected YYYY-MM-DD)", raw))
    })
}

pub(crate) fn parse_value<T: FromStr>(raw: &str, what: &str) -> Result<T, CommandError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|err| CommandError::InvalidArguments(format!("invalid {} `{}`: {}", what, raw, err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positionals_options_and_flags() {
        let args = ["bill", "12,50", "--account", "Corriente", "Cena", "--budget"];
        let parsed = ParsedArgs::parse(&args, &["account"], &["budget"]).unwrap();
        assert_eq!(parsed.positional(0), Some("bill"));
        assert_eq!(parsed.rest(2).as_deref(), Some("Cena"));
        assert_eq!(parsed.option("account"), Some("Corriente"));
        assert!(parsed.flag("budget"));
        assert_eq!(parse_amount("12,50").unwrap(), Decimal::new(1250, 2));
    }

    #[test]
    fn rejects_unknown_options_and_missing_values() {
        assert!(ParsedArgs::parse(&["--nope"], &[], &[]).is_err());
        assert!(ParsedArgs::parse(&["--account"], &["account"], &[]).is_err());
        assert!(parse_amount("-3").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }
}
