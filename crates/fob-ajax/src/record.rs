//! Request records, raw and normalized.
//!
//! [`RawRecord`] is the shape the interceptor writes inside the context:
//! headers as one wire-format block and the body as plain text.
//! [`RequestRecord`] is what tests see after normalization.

use crate::normalize::{parse_body, parse_headers};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One completed exchange exactly as the interceptor stored it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// URL the request was issued to
    #[serde(default)]
    pub url: String,

    /// Method as issued (any case)
    #[serde(default)]
    pub method: String,

    /// Response status code
    #[serde(default)]
    pub status_code: u16,

    /// Response headers as `Name: value` lines
    #[serde(default)]
    pub headers: String,

    /// Response body text
    #[serde(default)]
    pub body: String,
}

/// A normalized, immutable description of one request/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// URL the request was issued to
    pub url: String,

    /// Upper-cased request method
    pub method: String,

    /// Response status code
    pub status_code: u16,

    /// Response headers keyed by lower-cased name
    pub headers: BTreeMap<String, String>,

    /// Parsed JSON body, or the raw text when it is not JSON
    pub body: serde_json::Value,
}

impl RequestRecord {
    /// Looks up a response header by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl From<RawRecord> for RequestRecord {
    fn from(raw: RawRecord) -> Self {
        Self {
            method: raw.method.to_uppercase(),
            headers: parse_headers(&raw.headers),
            body: parse_body(&raw.body),
            status_code: raw.status_code,
            url: raw.url,
        }
    }
}
