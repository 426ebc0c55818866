use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};

/// Monthly spending limit for a category. Stored only; nothing enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: Option<i64>,
    pub category: String,
    /// Format: "YYYY-MM"
    pub year_month: String,
    pub monthly_limit: Decimal,
}

impl Budget {
    pub fn new(category: impl Into<String>, year_month: &str, monthly_limit: Decimal) -> Result<Self> {
        let year_month = super::parse_month(year_month)?;
        if monthly_limit <= Decimal::ZERO {
            return Err(LedgerError::validation(
                "monthly limit",
                format!("{monthly_limit} must be greater than zero"),
            ));
        }
        let category = category.into().trim().to_string();
        if category.is_empty() {
            return Err(LedgerError::validation("category", "must not be empty"));
        }
        Ok(Self {
            id: None,
            category,
            year_month,
            monthly_limit,
        })
    }
}
