//! ISO currency code whitelist.

use std::collections::BTreeSet;

use super::pair::CurrencyPair;
use crate::error::DomainError;

/// Set of currency codes the upstream provider knows about.
///
/// Loaded once at startup and read-only afterwards, so it can be shared
/// freely between request handlers and background workers.
#[derive(Debug, Clone, Default)]
pub struct IsoWhitelist {
    codes: BTreeSet<String>,
}

impl IsoWhitelist {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-sensitive membership check.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Valid codes in sorted order.
    pub fn codes(&self) -> Vec<String> {
        self.codes.iter().cloned().collect()
    }

    /// Checks both codes, reporting the first one that is not whitelisted.
    pub fn validate(&self, first: &str, second: &str) -> Result<(), DomainError> {
        for code in [first, second] {
            if !self.contains(code) {
                return Err(DomainError::UnknownIsoCode {
                    code: code.to_string(),
                    valid: self.codes(),
                });
            }
        }
        Ok(())
    }

    pub fn validate_pair(&self, pair: &CurrencyPair) -> Result<(), DomainError> {
        self.validate(&pair.currency, &pair.base)
    }
}
