pub mod commands;
pub mod context;
mod help;
pub mod output;
mod shell;

pub use context::{SessionOptions, ShellContext};
pub use shell::{run_cli, run_script};
