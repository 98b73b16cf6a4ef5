//! Message validation and sanitization.
//!
//! Runs before anything else in the pipeline: length bounds, control
//! character stripping, and a scan for query-injection signatures. Raw
//! text may later be interpolated into persistence queries by external
//! tooling, so the injection check is a hard boundary rather than
//! cosmetic cleanup.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ValidationError;

static INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<script",
        r"(?i)javascript:",
        r"(?i)onerror\s*=",
        r"(?i);\s*drop\s+table",
        r"(?i);\s*delete\s+from",
        r"(?i)union\s+select",
        r"(?i)'\s*or\s+1\s*=\s*1",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid injection regex"))
    .collect()
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Validates and sanitizes raw user input. Pure; no I/O.
pub struct MessageValidator {
    min_length: usize,
    max_length: usize,
}

impl MessageValidator {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
        }
    }

    /// Validate `raw` and return the sanitized text.
    ///
    /// Length bounds apply to the raw input; sanitization (control
    /// character removal, whitespace normalization) happens after the
    /// bounds check so an oversized message is rejected as sent.
    pub fn validate(&self, raw: &str) -> Result<String, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::Empty);
        }
        if raw.chars().count() > self.max_length {
            return Err(ValidationError::TooLong(self.max_length));
        }

        let stripped: String = raw.chars().filter(|c| !c.is_control()).collect();
        let sanitized = WHITESPACE_RE
            .replace_all(stripped.trim(), " ")
            .into_owned();

        if sanitized.chars().count() < self.min_length {
            return Err(ValidationError::TooShort(self.min_length));
        }
        if INJECTION_PATTERNS.iter().any(|re| re.is_match(&sanitized)) {
            return Err(ValidationError::InjectionSuspected);
        }

        Ok(sanitized)
    }
}
