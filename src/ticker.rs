use std::fmt;

use crate::constants::EXCHANGE_SUFFIX;
use crate::error::LookupError;

const MAX_TICKER_LEN: usize = 32;

/// Maps a user-entered symbol to the B3 form the upstream expects
/// (`petr4` -> `PETR4.SA`). Idempotent; never fails.
pub fn normalize(raw: &str) -> String {
    let mut clean = raw.trim().to_uppercase();
    if !clean.ends_with(EXCHANGE_SUFFIX) {
        clean.push_str(EXCHANGE_SUFFIX);
    }
    clean
}

/// A validated, normalized ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker(String);

impl Ticker {
    /// Rejects empty or path-unsafe input before normalizing it.
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LookupError::InvalidTicker(
                "ticker must not be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_TICKER_LEN {
            return Err(LookupError::InvalidTicker(format!(
                "ticker is longer than {MAX_TICKER_LEN} characters"
            )));
        }
        if let Some(bad) = trimmed.chars().find(|ch| !is_symbol_char(*ch)) {
            return Err(LookupError::InvalidTicker(format!(
                "ticker contains unsupported character {bad:?}"
            )));
        }
        Ok(Self(normalize(trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '^' | '=')
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
