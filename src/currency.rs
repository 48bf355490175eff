//! Currency codes and the configured default currency.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The currency used when the server is not configured with one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A three letter, upper case currency code, e.g. "NZD".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a currency code.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidCurrency] if `code` is not
    /// exactly three upper case ASCII letters.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();

        if is_currency_code(code) {
            Ok(Self(code.to_owned()))
        } else {
            Err(Error::InvalidCurrency(code.to_owned()))
        }
    }

    /// Create a currency code without validation.
    ///
    /// The caller should ensure that `code` is three upper case ASCII letters.
    pub fn new_unchecked(code: &str) -> Self {
        Self(code.to_owned())
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new_unchecked(DEFAULT_CURRENCY)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::new(s)
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether `code` looks like an ISO 4217 alphabetic code.
pub(crate) fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|byte| byte.is_ascii_uppercase())
}

/// Return `currency`, or `default` if `currency` is empty.
pub(crate) fn currency_or_default(currency: Option<String>, default: &CurrencyCode) -> String {
    match currency {
        Some(currency) if !currency.trim().is_empty() => currency.trim().to_owned(),
        _ => default.to_string(),
    }
}
