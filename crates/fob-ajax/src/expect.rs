//! Expectations and the positional assertion algorithm.
//!
//! Expectation `i` is compared with record `i`; nothing is reordered and
//! nothing is matched fuzzily. [`check`] reports the first discrepancy in a
//! fixed precedence: the count, then for each pair in order the method, the
//! URL, and the status code.

use crate::error::{AjaxError, Result};
use crate::record::RequestRecord;
use regex::Regex;
use std::fmt;

/// How an expectation matches a recorded URL.
#[derive(Debug, Clone)]
pub enum UrlMatcher {
    /// The recorded URL must equal this string.
    Exact(String),
    /// The pattern must match somewhere in the recorded URL.
    Pattern(Regex),
}

impl UrlMatcher {
    /// Compiles `pattern` into a searching matcher.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the pattern does not compile.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Returns true if `url` satisfies this matcher.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlMatcher::Exact(expected) => expected == url,
            UrlMatcher::Pattern(pattern) => pattern.is_match(url),
        }
    }
}

impl fmt::Display for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlMatcher::Exact(url) => f.write_str(url),
            UrlMatcher::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
        }
    }
}

impl From<&str> for UrlMatcher {
    fn from(url: &str) -> Self {
        UrlMatcher::Exact(url.to_string())
    }
}

impl From<String> for UrlMatcher {
    fn from(url: String) -> Self {
        UrlMatcher::Exact(url)
    }
}

impl From<Regex> for UrlMatcher {
    fn from(pattern: Regex) -> Self {
        UrlMatcher::Pattern(pattern)
    }
}

/// One request the test expects the context to issue.
#[derive(Debug, Clone)]
pub struct Expectation {
    /// Upper-cased method
    pub method: String,
    /// URL matcher
    pub url: UrlMatcher,
    /// Expected response status
    pub status_code: u16,
}

impl Expectation {
    /// Creates an expectation; the method is upper-cased.
    pub fn new(method: &str, url: impl Into<UrlMatcher>, status_code: u16) -> Self {
        Self {
            method: method.to_uppercase(),
            url: url.into(),
            status_code,
        }
    }

    /// Compares this expectation with the record at the same position.
    ///
    /// # Errors
    ///
    /// Returns the first of `MethodMismatch`, `UrlMismatch`/`PatternMismatch`,
    /// `StatusMismatch` that applies.
    pub fn verify(&self, index: usize, record: &RequestRecord) -> Result<()> {
        if record.method != self.method {
            return Err(AjaxError::MethodMismatch {
                index,
                url: record.url.clone(),
                expected: self.method.clone(),
                actual: record.method.clone(),
            });
        }

        if !self.url.matches(&record.url) {
            return Err(match &self.url {
                UrlMatcher::Exact(expected) => AjaxError::UrlMismatch {
                    index,
                    expected: expected.clone(),
                    actual: record.url.clone(),
                },
                UrlMatcher::Pattern(pattern) => AjaxError::PatternMismatch {
                    index,
                    pattern: pattern.as_str().to_string(),
                    actual: record.url.clone(),
                },
            });
        }

        if record.status_code != self.status_code {
            return Err(AjaxError::StatusMismatch {
                index,
                url: record.url.clone(),
                expected: self.status_code,
                actual: record.status_code,
            });
        }

        Ok(())
    }
}

/// The ordered list of expectations registered in one session.
#[derive(Debug, Clone, Default)]
pub struct ExpectationQueue {
    expectations: Vec<Expectation>,
}

impl ExpectationQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an expectation.
    pub fn push(&mut self, expectation: Expectation) {
        self.expectations.push(expectation);
    }

    /// Removes every expectation.
    pub fn clear(&mut self) {
        self.expectations.clear();
    }

    /// Number of registered expectations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    /// The expectations in registration order.
    #[must_use]
    pub fn as_slice(&self) -> &[Expectation] {
        &self.expectations
    }
}

/// Compares expectations with records by position.
///
/// A count mismatch is reported before anything else. A `None` record (a
/// hole left by index-keyed reconstruction) fails as `RequestNotFound`.
///
/// # Errors
///
/// Returns the first discrepancy found.
pub fn check(expectations: &[Expectation], records: &[Option<RequestRecord>]) -> Result<()> {
    if expectations.len() != records.len() {
        return Err(AjaxError::CountMismatch {
            expected: expectations.len(),
            actual: records.len(),
        });
    }

    for (index, (expectation, record)) in expectations.iter().zip(records).enumerate() {
        let record = record
            .as_ref()
            .ok_or(AjaxError::RequestNotFound { index })?;
        expectation.verify(index, record)?;
    }

    Ok(())
}
