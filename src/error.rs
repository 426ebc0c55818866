use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Input rejected before anything was written.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Stored data that does not match the expected layout.
    #[error("Corrupt data in {location}: {reason}")]
    Corrupt { location: String, reason: String },
}

impl LedgerError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Storage could not be read or written. Never retried.
    pub fn is_persistence(&self) -> bool {
        !self.is_validation()
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
