use std::{
    fmt,
    io::{self, BufRead},
};

use shell_words::split;

use crate::cli::context::{CommandError, LoopControl, SessionOptions, ShellContext};
use crate::cli::output;
use crate::errors::CliError;

/// Runs one command from `args`, or a script from stdin when no command is given.
pub fn run_cli(args: Vec<String>) -> Result<(), CliError> {
    let (options, command) = split_global_options(args)?;
    let mut context = ShellContext::open(options.with_env()?)?;

    if !command.is_empty() {
        let tokens: Vec<&str> = command.iter().map(String::as_str).collect();
        return match run_tokens(&mut context, &tokens) {
            Ok(_) => Ok(()),
            Err(err) => {
                context.report_error(&err);
                Err(CliError::CommandsFailed(1))
            }
        };
    }

    let stdin = io::stdin();
    run_script(&mut context, stdin.lock())
}

/// Executes newline-separated commands. Blank lines and `#` comments are
/// skipped; a failing line is reported and the script continues.
pub fn run_script(context: &mut ShellContext, input: impl BufRead) -> Result<(), CliError> {
    let mut failures = 0;
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => {
                failures += 1;
                output::error(format!("line {}: {}", index + 1, line.trim()));
                context.report_error(&err);
            }
        }
    }
    if failures > 0 {
        Err(CliError::CommandsFailed(failures))
    } else {
        Ok(())
    }
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(LoopControl::Continue);
    }
    let tokens = parse_command_line(trimmed)
        .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
    let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
    run_tokens(context, &tokens)
}

fn run_tokens(context: &mut ShellContext, tokens: &[&str]) -> Result<LoopControl, CommandError> {
    let Some((first, args)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let command = first.to_lowercase();
    context.dispatch(&command, args)
}

fn split_global_options(args: Vec<String>) -> Result<(SessionOptions, Vec<String>), CliError> {
    let mut options = SessionOptions::default();
    let mut iter = args.into_iter().peekable();
    while iter.peek().map(String::as_str) == Some("--ledger") {
        iter.next();
        let name = iter
            .next()
            .ok_or_else(|| CliError::Usage("`--ledger` needs a name".into()))?;
        options.ledger = Some(name);
    }
    Ok((options, iter.collect()))
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_ledger_option_is_split_off() {
        let args = vec!["--ledger".to_string(), "casa".to_string(), "txn".to_string(), "list".to_string()];
        let (options, command) = split_global_options(args).unwrap();
        assert_eq!(options.ledger.as_deref(), Some("casa"));
        assert_eq!(command, vec!["txn", "list"]);
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line(r#"txn add bill 12.5 "Cena con amigos" --account Corriente"#)
            .unwrap();
        assert_eq!(tokens[4], "Cena con amigos");
        assert!(parse_command_line("txn add \"unterminated").is_err());
    }
}
