use std::{env, path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use fintrack_config::{Config, ConfigError, ConfigManager};
use fintrack_core::{
    storage::LedgerStorage, Clock, CoreError, FixedClock, LedgerApi, SystemClock,
};
use fintrack_domain::{find_by_name, Ledger};
use fintrack_storage_json::JsonLedgerStorage;

use crate::cli::{
    commands::{self, CommandDefinition, CommandRegistry},
    output,
};
use crate::errors::CliError;

pub const HOME_ENV: &str = "FINTRACK_HOME";
pub const LEDGER_ENV: &str = "FINTRACK_LEDGER";
/// Freezes "today" for the session, e.g. `FINTRACK_TODAY=2024-04-20`.
pub const TODAY_ENV: &str = "FINTRACK_TODAY";
pub const DEFAULT_LEDGER: &str = "default";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Where the session's ledger and preferences live.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub ledger: Option<String>,
    pub home: Option<PathBuf>,
    pub today: Option<NaiveDate>,
}

impl SessionOptions {
    /// Fills unset fields from `FINTRACK_LEDGER`, `FINTRACK_HOME` and `FINTRACK_TODAY`.
    pub fn with_env(mut self) -> Result<Self, CliError> {
        if self.ledger.is_none() {
            self.ledger = env::var(LEDGER_ENV).ok().filter(|name| !name.trim().is_empty());
        }
        if self.home.is_none() {
            self.home = env::var_os(HOME_ENV).map(PathBuf::from);
        }
        if self.today.is_none() {
            if let Ok(raw) = env::var(TODAY_ENV) {
                let date = commands::parse_date(&raw)
                    .map_err(|err| CliError::Usage(format!("{}: {}", TODAY_ENV, err)))?;
                self.today = Some(date);
            }
        }
        Ok(self)
    }
}

/// State shared by every command of one CLI session.
pub struct ShellContext {
    storage: JsonLedgerStorage,
    config: Config,
    config_manager: ConfigManager,
    ledger_name: String,
    api: LedgerApi,
    pub(crate) registry: CommandRegistry,
}

impl ShellContext {
    pub fn open(options: SessionOptions) -> Result<Self, CliError> {
        let config_manager = match &options.home {
            Some(home) => ConfigManager::with_base_dir(home.clone())?,
            None => ConfigManager::default_location()?,
        };
        let config = config_manager.load()?;
        let ledger_root = match &options.home {
            Some(home) => home.join("ledgers"),
            None => config.resolve_default_ledger_root(),
        };
        let storage = JsonLedgerStorage::new(ledger_root)?;
        let clock: Arc<dyn Clock> = match options.today {
            Some(today) => Arc::new(FixedClock::on(today)),
            None => Arc::new(SystemClock),
        };

        let ledger_name = options
            .ledger
            .unwrap_or_else(|| DEFAULT_LEDGER.to_string());
        let ledger = if storage.exists(&ledger_name) {
            storage.load_ledger(&ledger_name)?
        } else {
            tracing::info!("starting new ledger `{}`", ledger_name);
            Ledger::new(ledger_name.clone())
        };

        output::set_preferences(output::OutputPreferences {
            plain_mode: !config.output.uses_color(),
            quiet_mode: false,
        });

        let context = Self {
            storage,
            config,
            config_manager,
            ledger_name,
            api: LedgerApi::with_clock(ledger, clock),
            registry: CommandRegistry::new(commands::all_definitions()),
        };
        context.catch_up_on_open()?;
        Ok(context)
    }

    fn catch_up_on_open(&self) -> Result<(), CliError> {
        if !self.config.process_recurring_on_open {
            return Ok(());
        }
        let report = self.api.process_recurring(None, None)?;
        for failure in &report.failures {
            output::warning(format!(
                "Recurring `{}` could not be processed: {}",
                failure.name, failure.error
            ));
        }
        if !report.created.is_empty() {
            output::info(format!(
                "Materialized {} recurring transaction(s).",
                report.created.len()
            ));
            self.save()?;
        }
        Ok(())
    }

    pub fn api(&self) -> &LedgerApi {
        &self.api
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger_name(&self) -> &str {
        &self.ledger_name
    }

    pub fn storage(&self) -> &JsonLedgerStorage {
        &self.storage
    }

    pub fn today(&self) -> NaiveDate {
        self.api.clock().today()
    }

    /// Persists the ledger and remembers it as the last one opened.
    pub fn save(&self) -> Result<(), CoreError> {
        let snapshot = self.api.snapshot()?;
        self.storage.save_ledger(&self.ledger_name, &snapshot)?;
        if self.config.last_opened_ledger.as_deref() != Some(self.ledger_name.as_str()) {
            let mut config = self.config.clone();
            config.last_opened_ledger = Some(self.ledger_name.clone());
            if let Err(err) = self.config_manager.save(&config) {
                tracing::warn!("could not record last opened ledger: {}", err);
            }
        }
        Ok(())
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|definition| definition.handler) else {
            return Err(CommandError::InvalidArguments(format!(
                "Unknown command `{}`. Type `help` to see available commands.",
                command
            )));
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn report_error(&self, err: &CommandError) {
        output::error(err);
        if matches!(err, CommandError::InvalidArguments(_)) {
            output::info("Use `help <command>` for usage details.");
        }
    }

    pub fn money(&self, amount: Decimal) -> String {
        format_money(amount, &self.config)
    }

    pub(crate) fn resolve_account(&self, token: &str) -> Result<Uuid, CommandError> {
        self.api.with_ledger(|ledger| {
            resolve(token, &ledger.accounts, "account", |account| account.id)
        })?
    }

    pub(crate) fn resolve_category(&self, token: &str) -> Result<Uuid, CommandError> {
        self.api.with_ledger(|ledger| {
            resolve(token, &ledger.categories, "category", |category| category.id)
        })?
    }

    pub(crate) fn resolve_recurring(&self, token: &str) -> Result<Uuid, CommandError> {
        self.api.with_ledger(|ledger| {
            resolve(token, &ledger.recurring, "recurring transaction", |definition| {
                definition.id
            })
        })?
    }

    /// Accepts a full transaction id or an unambiguous prefix of at least four characters.
    pub(crate) fn resolve_transaction(&self, token: &str) -> Result<Uuid, CommandError> {
        if let Ok(id) = Uuid::parse_str(token) {
            return Ok(id);
        }
        let prefix = token.trim().to_ascii_lowercase();
        if prefix.len() < 4 {
            return Err(CommandError::InvalidArguments(
                "transaction id prefix must have at least 4 characters".into(),
            ));
        }
        let matches: Vec<Uuid> = self.api.with_ledger(|ledger| {
            ledger
                .transactions
                .iter()
                .filter(|txn| txn.id.to_string().starts_with(&prefix))
                .map(|txn| txn.id)
                .collect()
        })?;
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(CommandError::InvalidArguments(format!(
                "no transaction matches `{}`",
                token
            ))),
            _ => Err(CommandError::InvalidArguments(format!(
                "`{}` matches {} transactions; use more characters",
                token,
                matches.len()
            ))),
        }
    }
}

/// Two decimals, the locale's separator, then the currency code.
pub fn format_money(amount: Decimal, config: &Config) -> String {
    let digits = format!("{:.2}", amount.round_dp(2));
    let separator = config.decimal_separator();
    let digits = if separator == '.' {
        digits
    } else {
        digits.replacen('.', &separator.to_string(), 1)
    };
    format!("{} {}", digits, config.currency)
}

fn resolve<T: fintrack_domain::NamedEntity>(
    token: &str,
    items: &[T],
    what: &str,
    id_of: impl Fn(&T) -> Uuid,
) -> Result<Uuid, CommandError> {
    if let Ok(id) = Uuid::parse_str(token) {
        return Ok(id);
    }
    find_by_name(items, token)
        .map(id_of)
        .ok_or_else(|| CommandError::InvalidArguments(format!("unknown {} `{}`", what, token)))
}
