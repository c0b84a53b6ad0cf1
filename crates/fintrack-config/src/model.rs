use serde::{de::Deserializer, Deserialize, Serialize};
use std::{fmt, path::PathBuf};

use crate::ConfigError;

const DEFAULT_RADAR_SIZE: usize = 5;

/// User preferences for the CLI and report defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "Config::default_locale")]
    pub locale: String,
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    #[serde(default)]
    pub output: OutputStyle,
    /// Number of categories shown by the radar report.
    #[serde(default = "Config::default_radar_size")]
    pub radar_size: usize,
    /// Catch up recurring definitions whenever a ledger is opened.
    #[serde(default = "Config::default_process_on_open")]
    pub process_recurring_on_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_ledger: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for ledgers. Defaults to `~/Documents/Fintrack`.
    pub default_ledger_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Self::default_locale(),
            currency: Self::default_currency(),
            output: OutputStyle::default(),
            radar_size: Self::default_radar_size(),
            process_recurring_on_open: Self::default_process_on_open(),
            last_opened_ledger: None,
            default_ledger_root: None,
        }
    }
}

impl Config {
    pub fn default_locale() -> String {
        "es-ES".into()
    }

    pub fn default_currency() -> String {
        "EUR".into()
    }

    pub fn default_radar_size() -> usize {
        DEFAULT_RADAR_SIZE
    }

    pub fn default_process_on_open() -> bool {
        true
    }

    /// Decimal separator for amounts shown to the user, taken from the
    /// locale's language subtag.
    pub fn decimal_separator(&self) -> char {
        let language = self
            .locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "es" | "ca" | "gl" | "eu" | "pt" | "fr" | "it" | "de" | "nl" => ',',
            _ => '.',
        }
    }

    pub fn resolve_default_ledger_root(&self) -> PathBuf {
        if let Some(path) = &self.default_ledger_root {
            return path.clone();
        }

        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("Fintrack")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radar_size == 0 {
            return Err(ConfigError::Invalid("radar_size must be at least 1".into()));
        }
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency must not be empty".into()));
        }
        Ok(())
    }
}

/// How the CLI decorates its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    Plain,
    #[default]
    Color,
}

impl OutputStyle {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" | "none" | "off" => OutputStyle::Plain,
            _ => OutputStyle::Color,
        }
    }

    pub fn uses_color(self) -> bool {
        matches!(self, OutputStyle::Color)
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutputStyle::Plain => "plain",
            OutputStyle::Color => "color",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for OutputStyle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .as_deref()
            .map(OutputStyle::parse)
            .unwrap_or_default())
    }
}
