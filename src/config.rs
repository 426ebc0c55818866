//! Where the ledger lives and which backend holds it.
//!
//! Resolution order for the data directory:
//!
//! 1. `TALLY_DATA_DIR` environment variable (if set)
//! 2. The platform data directory (`~/.local/share/tally` on Linux)
//!
//! `TALLY_BACKEND` picks the backend: `sqlite` (default) or `json`.

use std::path::PathBuf;

use crate::db::Database;
use crate::error::{LedgerError, Result};
use crate::file::JsonStore;
use crate::store::Ledger;

pub const DATA_DIR_VAR: &str = "TALLY_DATA_DIR";
pub const BACKEND_VAR: &str = "TALLY_BACKEND";
pub const DB_FILE: &str = "tally.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Sqlite,
    Json,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Json => "json",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "db" => Ok(Self::Sqlite),
            "json" | "file" => Ok(Self::Json),
            other => Err(LedgerError::validation(
                "backend",
                format!("'{other}' is not sqlite or json"),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>, backend: Backend) -> Self {
        Self {
            data_dir: data_dir.into(),
            backend,
        }
    }

    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var_os(DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let backend = match std::env::var(BACKEND_VAR) {
            Ok(value) => Backend::parse(&value)?,
            Err(_) => Backend::default(),
        };
        Ok(Self::new(data_dir, backend))
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    /// Open the configured backend, creating the data directory if needed.
    pub fn open_ledger(&self) -> Result<Box<dyn Ledger>> {
        std::fs::create_dir_all(&self.data_dir)?;
        log::debug!(
            "opening {} ledger in {}",
            self.backend.as_str(),
            self.data_dir.display()
        );
        let ledger: Box<dyn Ledger> = match self.backend {
            Backend::Sqlite => Box::new(Database::open(&self.db_path())?),
            Backend::Json => Box::new(JsonStore::open(&self.data_dir)?),
        };
        Ok(ledger)
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "tally", "tally").ok_or_else(|| {
        LedgerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine data directory",
        ))
    })?;
    Ok(proj_dirs.data_dir().to_path_buf())
}
