//! Pulling records out of the context and normalizing them.

use crate::bridge::Bridge;
use crate::error::{AjaxError, Result};
use crate::normalize::{normalize_record, reconstruct_sequence};
use crate::record::RequestRecord;
use crate::script::READ_REQUESTS;
use serde_json::{json, Value};
use tracing::debug;

/// Reads the record at `index`.
///
/// # Errors
///
/// Returns `RequestNotFound` if the context has no record at `index`.
pub async fn fetch_request<B>(bridge: &B, namespace: &str, index: usize) -> Result<RequestRecord>
where
    B: Bridge + ?Sized,
{
    let value = bridge
        .execute(&READ_REQUESTS, &[json!(namespace), json!(index)])
        .await?;
    normalize_record(&value)?.ok_or(AjaxError::RequestNotFound { index })
}

/// Reads every record in completion order.
///
/// Index-keyed results are rebuilt into a sequence; positions the context
/// left empty come back as `None`.
///
/// # Errors
///
/// Returns `NotInstalled` if the context has no store under `namespace`.
pub async fn fetch_requests<B>(bridge: &B, namespace: &str) -> Result<Vec<Option<RequestRecord>>>
where
    B: Bridge + ?Sized,
{
    let value = bridge
        .execute(&READ_REQUESTS, &[json!(namespace), Value::Null])
        .await?;
    if value.is_null() {
        return Err(AjaxError::NotInstalled {
            namespace: namespace.to_string(),
        });
    }

    let entries = reconstruct_sequence(value).ok_or_else(|| {
        AjaxError::ScriptExecutionFailed(format!(
            "{} did not return a sequence",
            READ_REQUESTS.name
        ))
    })?;
    debug!(count = entries.len(), "retrieved requests");

    entries.iter().map(normalize_record).collect()
}
