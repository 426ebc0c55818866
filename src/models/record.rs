use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};

/// Whether money came in or went out. Closed set; nothing else is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TxnType {
    Expense,
    Income,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "Expense",
            Self::Income => "Income",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(LedgerError::validation(
                "type",
                format!("'{other}' is not Expense or Income"),
            )),
        }
    }

    /// Display order: expenses first.
    pub fn all() -> &'static [TxnType] {
        &[Self::Expense, Self::Income]
    }
}

impl std::fmt::Display for TxnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Assigned by the store on insert.
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub kind: TxnType,
    /// RFC 3339; empty for entries migrated from files that never stored it.
    pub created_at: String,
}

impl Record {
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
        kind: TxnType,
    ) -> Self {
        Self {
            id: None,
            date,
            category: category.into(),
            description: description.into(),
            amount,
            kind,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::validation(
                "amount",
                format!("{} must be greater than zero", self.amount),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(LedgerError::validation("category", "must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(LedgerError::validation("description", "must not be empty"));
        }
        Ok(())
    }

    pub fn is_income(&self) -> bool {
        self.kind == TxnType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TxnType::Expense
    }

    /// Calendar month as "YYYY-MM".
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }

    /// Income counts positive, expenses negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TxnType::Income => self.amount,
            TxnType::Expense => -self.amount,
        }
    }

    /// The fields a user entered, ignoring store bookkeeping (`id`, `created_at`).
    pub fn same_entry(&self, other: &Record) -> bool {
        self.date == other.date
            && self.category == other.category
            && self.description == other.description
            && self.amount == other.amount
            && self.kind == other.kind
    }
}

/// Parse a "YYYY-MM-DD" date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| LedgerError::validation("date", format!("'{s}' is not YYYY-MM-DD")))
}

/// Validate a "YYYY-MM" month key.
pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m").to_string())
        .map_err(|_| LedgerError::validation("month", format!("'{s}' is not YYYY-MM")))
}
