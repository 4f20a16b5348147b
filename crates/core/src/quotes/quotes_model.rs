//! Quote domain model and category filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Category assigned to records from the remote, which has no category concept.
pub const PLACEHOLDER_CATEGORY: &str = "General";

/// Persisted sentinel for "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// A short text record tagged with a category.
///
/// `text` is the identity key when matching local and remote records; it is
/// compared byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub category: String,
}

impl Quote {
    /// Creates a validated quote. Neither field may be empty or whitespace-only.
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Result<Self> {
        let quote = Self {
            text: text.into(),
            category: category.into(),
        };
        quote.validate()?;
        Ok(quote)
    }

    /// Quote coming from the remote source, tagged with the placeholder category.
    pub fn from_remote(text: impl Into<String>) -> Result<Self> {
        Self::new(text, PLACEHOLDER_CATEGORY)
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::validation("quote text is required"));
        }
        if self.category.trim().is_empty() {
            return Err(Error::validation("quote category is required"));
        }
        Ok(())
    }
}

/// Category filter applied by the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => quote.category == *category,
        }
    }

    /// Value written to storage.
    pub fn as_stored(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Category(category) => category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "" => Err(Error::validation("category filter cannot be empty")),
            ALL_CATEGORIES => Ok(Self::All),
            other => Ok(Self::Category(other.to_string())),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored())
    }
}
