//! Execution inside the observed context.
//!
//! A [`Bridge`] runs a [`Snippet`] in the context with JSON arguments and
//! returns its JSON result; `undefined` comes back as `null`. Some bridges
//! encode arrays as index-keyed objects. Callers that expect a sequence must
//! go through [`crate::normalize::reconstruct_sequence`].

use crate::error::Result;
use crate::script::Snippet;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Runs snippets inside an observed context.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Executes `snippet` with `args` and returns its result.
    ///
    /// # Errors
    ///
    /// Returns `ScriptExecutionFailed` if the context cannot run the snippet.
    async fn execute(&self, snippet: &Snippet, args: &[Value]) -> Result<Value>;
}

#[async_trait]
impl<B: Bridge + ?Sized> Bridge for Arc<B> {
    async fn execute(&self, snippet: &Snippet, args: &[Value]) -> Result<Value> {
        (**self).execute(snippet, args).await
    }
}

#[async_trait]
impl<B: Bridge + ?Sized> Bridge for &B {
    async fn execute(&self, snippet: &Snippet, args: &[Value]) -> Result<Value> {
        (**self).execute(snippet, args).await
    }
}

/// JavaScript truthiness of a JSON value.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
