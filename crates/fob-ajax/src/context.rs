//! An observed context that lives in this process.
//!
//! `LocalContext` plays the part a browser page plays for [`crate::Page`]:
//! it owns a request primitive (a [`Transport`] slot) and a set of global
//! properties, one of which may hold a [`RecorderStore`]. Installing the
//! interceptor swaps the primitive for a [`RecordingTransport`] around it.
//! A [`LocalContext::reload`] drops every global and restores the native
//! primitive, just as a full page reload does.

use crate::bridge::Bridge;
use crate::error::{AjaxError, Result};
use crate::script::{self, Snippet};
use crate::store::RecorderStore;
use crate::transport::{Exchange, OutboundRequest, RecordingTransport, Transport};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Global state of one context instantiation.
#[derive(Debug)]
struct Globals {
    stores: HashMap<String, RecorderStore>,
    primitive: Arc<dyn Transport>,
}

/// An in-process observed context.
#[derive(Debug)]
pub struct LocalContext {
    native: Arc<dyn Transport>,
    globals: Mutex<Globals>,
    index_keyed_arrays: bool,
}

impl LocalContext {
    /// Creates a context whose request primitive is `native`.
    pub fn new(native: impl Transport + 'static) -> Self {
        let native: Arc<dyn Transport> = Arc::new(native);
        Self {
            globals: Mutex::new(Globals {
                stores: HashMap::new(),
                primitive: native.clone(),
            }),
            native,
            index_keyed_arrays: false,
        }
    }

    /// Makes this context return arrays as index-keyed objects, the way some
    /// remote drivers do.
    #[must_use]
    pub fn with_index_keyed_arrays(mut self) -> Self {
        self.index_keyed_arrays = true;
        self
    }

    /// Issues a request through the context's current primitive.
    ///
    /// # Errors
    ///
    /// Returns whatever the primitive returns.
    pub async fn send(&self, request: OutboundRequest) -> Result<Exchange> {
        let primitive = self.globals().primitive.clone();
        primitive.send(request).await
    }

    /// Returns the store under `namespace`, if one exists.
    #[must_use]
    pub fn store(&self, namespace: &str) -> Option<RecorderStore> {
        self.globals().stores.get(namespace).cloned()
    }

    /// Returns the store under `namespace`, installing the interceptor first
    /// if there is none.
    ///
    /// The existence check and the installation happen under one lock, so
    /// concurrent callers never create two stores. The boolean is `true` when
    /// this call created the store.
    pub fn ensure_store(&self, namespace: &str) -> (RecorderStore, bool) {
        let mut globals = self.globals();
        if let Some(store) = globals.stores.get(namespace) {
            return (store.clone(), false);
        }

        let store = RecorderStore::new();
        globals.primitive = Arc::new(RecordingTransport::new(
            globals.primitive.clone(),
            store.clone(),
        ));
        globals.stores.insert(namespace.to_string(), store.clone());
        info!(namespace, "interceptor installed");
        (store, true)
    }

    /// Destroys all global state and restores the native primitive.
    pub fn reload(&self) {
        let mut globals = self.globals();
        globals.stores.clear();
        globals.primitive = self.native.clone();
        debug!("context reloaded");
    }

    fn globals(&self) -> std::sync::MutexGuard<'_, Globals> {
        self.globals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn encode(&self, value: Value) -> Value {
        match value {
            Value::Array(items) if self.index_keyed_arrays => Value::Object(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), item))
                    .collect::<Map<_, _>>(),
            ),
            other => other,
        }
    }
}

#[async_trait]
impl Bridge for LocalContext {
    async fn execute(&self, snippet: &Snippet, args: &[Value]) -> Result<Value> {
        let namespace = args.first().and_then(Value::as_str).ok_or_else(|| {
            AjaxError::ScriptExecutionFailed(format!(
                "{}: first argument must be the namespace",
                snippet.name
            ))
        })?;

        let result = if snippet.name == script::PROBE_STORE.name {
            match self.store(namespace) {
                Some(store) => serde_json::to_value(store.snapshot())?,
                None => Value::Null,
            }
        } else if snippet.name == script::INSTALL.name {
            Value::Bool(self.ensure_store(namespace).1)
        } else if snippet.name == script::READ_REQUESTS.name {
            match (self.store(namespace), args.get(1).and_then(Value::as_u64)) {
                (None, _) => Value::Null,
                (Some(store), None) => serde_json::to_value(store.snapshot())?,
                (Some(store), Some(index)) => usize::try_from(index)
                    .ok()
                    .and_then(|i| store.get(i))
                    .map(serde_json::to_value)
                    .transpose()?
                    .unwrap_or(Value::Null),
            }
        } else {
            return Err(AjaxError::ScriptExecutionFailed(format!(
                "no native implementation for snippet '{}'",
                snippet.name
            )));
        };

        Ok(self.encode(result))
    }
}
