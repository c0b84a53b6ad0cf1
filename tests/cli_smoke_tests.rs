mod common;

use assert_cmd::Command;
use predicates::str::contains;

use common::temp_home;

fn cli(home: &std::path::Path, today: &str) -> Command {
    let mut cmd = Command::cargo_bin("fintrack_cli").expect("binary built");
    cmd.env("FINTRACK_HOME", home)
        .env("FINTRACK_TODAY", today)
        .env("NO_COLOR", "1")
        .env_remove("FINTRACK_LEDGER")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn script_records_transactions_and_reports_categories() {
    let home = temp_home();
    let script = "\
# weekly shopping
account add Corriente --bank ING
category add Comida --color '#f97316'
budget add Comida 100
txn add bill 42,50 Mercado --account Corriente --category Comida --budget --date 2024-04-02
budget list
report categories --json
";
    cli(&home, "2024-04-10")
        .write_stdin(script)
        .assert()
        .success()
        .stdout(contains("Account `Corriente` added."))
        .stdout(contains("Recorded bill `Mercado`"))
        .stdout(contains("\"label\": \"Comida\""))
        .stdout(contains("\"color\": \"#f97316\""));

    let stored = std::fs::read_to_string(home.join("ledgers").join("default.json"))
        .expect("ledger saved");
    assert!(stored.contains("\"Mercado\""));
}

#[test]
fn missed_recurring_periods_are_created_on_open() {
    let home = temp_home();
    cli(&home, "2024-01-01")
        .write_stdin(
            "account add Corriente\n\
             category add Ocio\n\
             recurring add bill 30 Gimnasio --day 15 --account Corriente --category Ocio\n",
        )
        .assert()
        .success()
        .stdout(contains("`Gimnasio` scheduled on day 15"));

    cli(&home, "2024-04-20")
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(contains("Materialized 4 recurring transaction(s)."))
        .stdout(contains("2024-03-15"));

    cli(&home, "2024-04-20")
        .args(["recurring", "process"])
        .assert()
        .success()
        .stdout(contains("Created 0 transaction(s)."));
}

#[test]
fn failing_lines_are_reported_and_the_script_continues() {
    let home = temp_home();
    cli(&home, "2024-04-10")
        .write_stdin(
            "account add Corriente\n\
             frobnicate now\n\
             category add Comida\n\
             budget add Comida 50\n\
             budget add Comida 75\n",
        )
        .assert()
        .failure()
        .stdout(contains("line 2: frobnicate now"))
        .stdout(contains("Category `Comida` added."))
        .stdout(contains("already has a budget"))
        .stderr(contains("2 command(s) failed"));
}

#[test]
fn single_command_uses_named_ledger() {
    let home = temp_home();
    cli(&home, "2024-04-10")
        .args(["--ledger", "casa", "account", "add", "Hipoteca"])
        .assert()
        .success();
    assert!(home.join("ledgers").join("casa.json").exists());

    cli(&home, "2024-04-10")
        .arg("version")
        .assert()
        .success()
        .stdout(contains("fintrack"));
}

#[test]
fn edits_rewrite_categories_and_transactions_in_place() {
    let home = temp_home();
    cli(&home, "2024-04-10")
        .write_stdin(
            "account add Corriente\n\
             category add Comida\n\
             budget add Comida 100\n\
             txn add bill 40 Mercado --account Corriente --category Comida --budget --date 2024-04-02\n\
             category edit Comida --name Alimentación --color '#22c55e'\n",
        )
        .assert()
        .success()
        .stdout(contains("Category `Alimentación` updated."));

    let listed = cli(&home, "2024-04-10")
        .args(["txn", "list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let transactions: serde_json::Value =
        serde_json::from_slice(&listed).expect("transactions as json");
    let id = transactions[0]["id"].as_str().expect("transaction id").to_string();

    cli(&home, "2024-04-10")
        .args(["txn", "edit", &id[..8], "--amount", "130", "--name", "Mercado grande"])
        .assert()
        .success()
        .stdout(contains("Updated `Mercado grande`"));

    cli(&home, "2024-04-10")
        .args(["budget", "list"])
        .assert()
        .success()
        .stdout(contains("Alimentación"))
        .stdout(contains("(over budget)"));

    cli(&home, "2024-04-10")
        .args(["txn", "edit", &id, "--no-budget"])
        .assert()
        .success()
        .stdout(contains("no longer counts against a budget"));

    cli(&home, "2024-04-10")
        .args(["check"])
        .assert()
        .success();

    let stored = std::fs::read_to_string(home.join("ledgers").join("default.json"))
        .expect("ledger saved");
    assert!(stored.contains("\"Mercado grande\""));
    assert!(stored.contains("\"#22c55e\""));
    assert!(!stored.contains("\"Comida\""));
}
