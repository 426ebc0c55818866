use regex::Regex;
use std::sync::OnceLock;

use super::TxnType;
use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub kind: TxnType,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, kind: TxnType) -> Self {
        Self {
            id: None,
            name: name.into().trim().to_string(),
            kind,
            color: None,
            icon: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::validation("category name", "must not be empty"));
        }
        if let Some(color) = &self.color {
            if !hex_color().is_some_and(|re| re.is_match(color)) {
                return Err(LedgerError::validation(
                    "color",
                    format!("'{color}' is not a #RRGGBB color"),
                ));
            }
        }
        Ok(())
    }

    /// Names are unique across both types, compared case-insensitively.
    pub fn same_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Find a category by name (case-insensitive) in a slice.
    pub fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
        categories.iter().find(|c| c.same_name(name))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn hex_color() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").ok()).as_ref()
}
