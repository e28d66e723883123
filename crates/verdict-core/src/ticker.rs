//! Ticker symbols and their validation

use crate::{Result, VerdictError};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, LazyLock};

static TICKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,5}$").expect("ticker pattern is a valid regex"));

/// A validated, upper-cased ticker symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Parse a raw symbol, trimming and upper-casing it first
    ///
    /// Only the format is checked here; existence is the job of a
    /// [`SymbolDirectory`].
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(VerdictError::InvalidTicker {
                ticker: raw.to_string(),
                reason: "ticker is empty".to_string(),
            });
        }
        if !TICKER_PATTERN.is_match(&normalized) {
            return Err(VerdictError::InvalidTicker {
                ticker: raw.to_string(),
                reason: "expected 1-5 letters".to_string(),
            });
        }
        Ok(Self(normalized))
    }

    /// The symbol as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lookup of listed symbols
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SymbolDirectory: Send + Sync {
    /// Whether the symbol is listed
    async fn exists(&self, ticker: &Ticker) -> bool;
}

/// Fixed set of known symbols
#[derive(Debug, Clone, Default)]
pub struct KnownSymbols {
    symbols: HashSet<String>,
}

impl KnownSymbols {
    /// Build from any list of symbols; entries are upper-cased
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: symbols
                .into_iter()
                .map(|s| s.as_ref().trim().to_uppercase())
                .collect(),
        }
    }
}

#[async_trait]
impl SymbolDirectory for KnownSymbols {
    async fn exists(&self, ticker: &Ticker) -> bool {
        self.symbols.contains(ticker.as_str())
    }
}

/// Format check plus an optional existence check
#[derive(Clone, Default)]
pub struct TickerValidator {
    directory: Option<Arc<dyn SymbolDirectory>>,
}

impl TickerValidator {
    /// Validator that only checks the format
    pub fn format_only() -> Self {
        Self::default()
    }

    /// Validator that also consults a symbol directory
    pub fn with_directory(directory: Arc<dyn SymbolDirectory>) -> Self {
        Self {
            directory: Some(directory),
        }
    }

    /// Validate a raw ticker
    pub async fn validate(&self, raw: &str) -> Result<Ticker> {
        let ticker = Ticker::parse(raw)?;
        if let Some(directory) = &self.directory {
            if !directory.exists(&ticker).await {
                return Err(VerdictError::UnknownTicker(ticker.to_string()));
            }
        }
        Ok(ticker)
    }
}

impl fmt::Debug for TickerValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickerValidator")
            .field("directory", &self.directory.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        let ticker = Ticker::parse("  aapl ").unwrap();
        assert_eq!(ticker.as_str(), "AAPL");
    }

    #[test]
    fn test_parse_rejects_bad_format() {
        assert!(Ticker::parse("").is_err());
        assert!(Ticker::parse("TOOLONG").is_err());
        assert!(Ticker::parse("BRK.B").is_err());
        assert!(Ticker::parse("123").is_err());
    }

    #[tokio::test]
    async fn test_validator_with_directory() {
        let validator = TickerValidator::with_directory(Arc::new(KnownSymbols::new(["AAPL"])));
        assert!(validator.validate("aapl").await.is_ok());

        let err = validator.validate("XXXX").await.unwrap_err();
        assert_eq!(err, VerdictError::UnknownTicker("XXXX".to_string()));
    }

    #[tokio::test]
    async fn test_validator_skips_directory_on_bad_format() {
        let mut directory = MockSymbolDirectory::new();
        directory.expect_exists().times(0);

        let validator = TickerValidator::with_directory(Arc::new(directory));
        assert!(validator.validate("12AB").await.is_err());
    }
}
