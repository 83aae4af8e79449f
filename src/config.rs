//! Process configuration from `LEDGER_BOT_*` environment variables

use crate::catalog::{
    CatalogError, CategoryCatalog, DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES,
};
use crate::runtime::RetryPolicy;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const RECORD_BASE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("LEDGER_BOT_RECORD_ATTEMPTS must be at least 1")]
    NoRecordAttempts,
}

/// Where dialogue sessions live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionBackend {
    /// Lost on restart
    #[default]
    Memory,
    /// Same SQLite file as the ledger
    Sqlite,
}

impl FromStr for SessionBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(SessionBackend::Memory),
            "sqlite" => Ok(SessionBackend::Sqlite),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub session_backend: SessionBackend,
    pub income_categories: Vec<String>,
    pub expense_categories: Vec<String>,
    pub record_attempts: u32,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("LEDGER_BOT_PORT") {
            Some(value) => parse(
                "LEDGER_BOT_PORT",
                "port",
                &value,
                |v| v.parse::<u16>().ok(),
            )?,
            None => DEFAULT_PORT,
        };

        let db_path = var("LEDGER_BOT_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.ledger-bot/ledger.db"))
            },
            PathBuf::from,
        );

        let session_backend = match var("LEDGER_BOT_SESSION_BACKEND") {
            Some(value) => parse(
                "LEDGER_BOT_SESSION_BACKEND",
                "session backend (memory or sqlite)",
                &value,
                |v| v.parse().ok(),
            )?,
            None => SessionBackend::default(),
        };

        let record_attempts = match var("LEDGER_BOT_RECORD_ATTEMPTS") {
            Some(value) => parse(
                "LEDGER_BOT_RECORD_ATTEMPTS",
                "attempt count",
                &value,
                |v| v.parse::<u32>().ok(),
            )?,
            None => RetryPolicy::DEFAULT_ATTEMPTS,
        };
        if record_attempts == 0 {
            return Err(ConfigError::NoRecordAttempts);
        }

        Ok(Self {
            port,
            db_path,
            session_backend,
            income_categories: var("LEDGER_BOT_INCOME_CATEGORIES")
                .map_or_else(|| owned(DEFAULT_INCOME_CATEGORIES), |v| split_list(&v)),
            expense_categories: var("LEDGER_BOT_EXPENSE_CATEGORIES")
                .map_or_else(|| owned(DEFAULT_EXPENSE_CATEGORIES), |v| split_list(&v)),
            record_attempts,
        })
    }

    /// Validated catalog from the configured labels
    pub fn catalog(&self) -> Result<CategoryCatalog, CatalogError> {
        CategoryCatalog::new(
            self.income_categories.clone(),
            self.expense_categories.clone(),
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.record_attempts, RECORD_BASE_DELAY)
    }
}

fn parse<T>(
    var: &'static str,
    expected: &'static str,
    value: &str,
    parser: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    parser(value.trim()).ok_or_else(|| ConfigError::Invalid {
        var,
        expected,
        value: value.to_string(),
    })
}

/// Comma-separated labels, trimmed. Blank entries are kept so the catalog
/// rejects them instead of silently dropping a typo.
fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(ToString::to_string).collect()
}
