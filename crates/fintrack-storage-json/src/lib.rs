use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use fintrack_core::{storage::LedgerStorage, CoreError};
use fintrack_domain::{Ledger, CURRENT_SCHEMA_VERSION};
use tracing::debug;

const LEDGER_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed JSON persistence: one pretty-printed file per ledger.
#[derive(Debug, Clone)]
pub struct JsonLedgerStorage {
    ledgers_dir: PathBuf,
}

impl JsonLedgerStorage {
    pub fn new(ledgers_dir: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&ledgers_dir)?;
        Ok(Self { ledgers_dir })
    }

    pub fn root(&self) -> &Path {
        &self.ledgers_dir
    }

    pub fn ledger_path(&self, name: &str) -> PathBuf {
        self.ledgers_dir
            .join(format!("{}.{}", canonical_name(name), LEDGER_EXTENSION))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.ledger_path(name).is_file()
    }

    /// Summaries of every stored ledger, sorted by display name.
    pub fn list_ledger_metadata(&self) -> Result<Vec<LedgerMetadata>, CoreError> {
        let mut entries = Vec::new();
        for slug in self.list_ledgers()? {
            let ledger = self.load_ledger(&slug)?;
            entries.push(LedgerMetadata {
                path: self.ledger_path(&slug),
                slug,
                name: ledger.name.clone(),
                created_at: ledger.created_at,
                updated_at: ledger.updated_at,
                account_count: ledger.accounts.len(),
                category_count: ledger.categories.len(),
                transaction_count: ledger.transactions.len(),
                budget_count: ledger.budgets.len(),
                over_budget_count: ledger
                    .budgets
                    .iter()
                    .filter(|budget| budget.is_over_budget())
                    .count(),
                recurring_count: ledger.recurring.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

impl LedgerStorage for JsonLedgerStorage {
    fn save_ledger(&self, name: &str, ledger: &Ledger) -> Result<(), CoreError> {
        save_ledger_to_path(ledger, &self.ledger_path(name))
    }

    fn load_ledger(&self, name: &str) -> Result<Ledger, CoreError> {
        let path = self.ledger_path(name);
        if !path.is_file() {
            return Err(CoreError::LedgerNotFound(name.to_string()));
        }
        load_ledger_from_path(&path)
    }

    fn list_ledgers(&self) -> Result<Vec<String>, CoreError> {
        if !self.ledgers_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.ledgers_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_ledger(&self, name: &str) -> Result<(), CoreError> {
        let path = self.ledger_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(CoreError::LedgerNotFound(name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save_ledger_to_path(&self, ledger: &Ledger, path: &Path) -> Result<(), CoreError> {
        save_ledger_to_path(ledger, path)
    }

    fn load_ledger_from_path(&self, path: &Path) -> Result<Ledger, CoreError> {
        load_ledger_from_path(path)
    }
}

/// Saves a ledger to an arbitrary path on disk through a temp file and rename.
pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_ledger(ledger)?)?;
    fs::rename(&tmp, path)?;
    debug!(
        "saved ledger `{}` ({} transactions) to {}",
        ledger.name,
        ledger.transactions.len(),
        path.display()
    );
    Ok(())
}

/// Loads a ledger from the provided filesystem path.
pub fn load_ledger_from_path(path: &Path) -> Result<Ledger, CoreError> {
    let data = fs::read_to_string(path)?;
    let ledger: Ledger = serde_json::from_str(&data)
        .map_err(|err| CoreError::Storage(format!("{}: {}", path.display(), err)))?;
    if ledger.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "{} uses schema version {} but this build supports up to {}",
            path.display(),
            ledger.schema_version,
            CURRENT_SCHEMA_VERSION
        )));
    }
    debug!("loaded ledger `{}` from {}", ledger.name, path.display());
    Ok(ledger)
}

#[derive(Debug, Clone)]
pub struct LedgerMetadata {
    pub slug: String,
    pub name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub account_count: usize,
    pub category_count: usize,
    pub transaction_count: usize,
    pub budget_count: usize,
    pub over_budget_count: usize,
    pub recurring_count: usize,
}

/// File-system safe slug for a ledger name.
pub fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn serialize_ledger(ledger: &Ledger) -> Result<String, CoreError> {
    serde_json::to_string_pretty(ledger).map_err(|err| CoreError::Storage(err.to_string()))
}
