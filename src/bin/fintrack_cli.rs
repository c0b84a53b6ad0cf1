use std::{env, process};

fn main() {
    fintrack::init();
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = fintrack::cli::run_cli(args) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
