use crate::cli::commands::{CommandDefinition, CommandRegistry};
use crate::cli::output;

pub fn print_overview(registry: &CommandRegistry) {
    output::section("Available commands");
    for entry in registry.iter() {
        output::row(format!("  {:<10} {}", entry.name, entry.description));
    }
    output::row("Use `help <command>` for details.");
}

pub fn print_command(entry: &CommandDefinition) {
    output::section(format!("Help: {}", entry.name));
    output::row(format!("  {}", entry.description));
    output::row(format!("  Usage: {}", entry.usage));
}
