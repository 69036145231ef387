//! Snippets executed inside the observed context.
//!
//! Each snippet is a JavaScript function. A browser [`crate::Page`] calls it
//! with the JSON arguments applied positionally; [`crate::LocalContext`]
//! runs its native counterpart, selected by name. The first argument is
//! always the namespace: the global property that holds the recorder store.

use crate::error::Result;

/// A named function that runs inside the observed context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snippet {
    /// Stable name, used by native contexts to dispatch
    pub name: &'static str,
    /// JavaScript function expression
    pub source: &'static str,
}

/// `(namespace) -> requests | null`: the store's request list, if installed.
pub const PROBE_STORE: Snippet = Snippet {
    name: "probeStore",
    source: r"function probeStore(namespace) {
    var store = window[namespace];
    return store && store.requests ? store.requests : null;
}",
};

/// `(namespace) -> bool`: installs the interceptor unless a store exists.
///
/// Returns `true` when it created the store. `XMLHttpRequest` is replaced by
/// a constructor returning a native instance whose `open` is observed and
/// whose `load` event appends a record.
pub const INSTALL: Snippet = Snippet {
    name: "installInterceptor",
    source: r"function installInterceptor(namespace) {
    if (window[namespace] && window[namespace].requests) {
        return false;
    }
    var store = { requests: [] };
    window[namespace] = store;
    var NativeXHR = window.XMLHttpRequest;

    function readBody(xhr) {
        if (xhr.responseType === '' || xhr.responseType === 'text') {
            return xhr.responseText || '';
        }
        try {
            return JSON.stringify(xhr.response);
        } catch (e) {
            return '';
        }
    }

    function RecordingXHR() {
        var xhr = new NativeXHR();
        var open = xhr.open;
        var method = '';
        var url = '';
        xhr.open = function (m, u) {
            method = String(m);
            url = String(u);
            return open.apply(xhr, arguments);
        };
        xhr.addEventListener('load', function () {
            store.requests.push({
                method: method,
                url: url,
                statusCode: xhr.status,
                headers: xhr.getAllResponseHeaders() || '',
                body: readBody(xhr)
            });
        });
        return xhr;
    }

    RecordingXHR.prototype = NativeXHR.prototype;
    ['UNSENT', 'OPENED', 'HEADERS_RECEIVED', 'LOADING', 'DONE'].forEach(function (name) {
        RecordingXHR[name] = NativeXHR[name];
    });
    window.XMLHttpRequest = RecordingXHR;
    return true;
}",
};

/// `(namespace, index | null) -> requests | request | null`.
pub const READ_REQUESTS: Snippet = Snippet {
    name: "readRequests",
    source: r"function readRequests(namespace, index) {
    var store = window[namespace];
    if (!store || !store.requests) {
        return null;
    }
    if (index === null || index === undefined) {
        return store.requests;
    }
    return store.requests[index] || null;
}",
};

/// Renders a self-invoking install script for embedding in a page.
///
/// Pages that include it in a `<script>` tag record from their very first
/// request, before a controller has had a chance to call setup.
///
/// # Errors
///
/// Returns `MalformedRecord` if the namespace cannot be JSON-encoded.
pub fn interceptor_script(namespace: &str) -> Result<String> {
    Ok(format!(
        "({})({});",
        INSTALL.source,
        serde_json::to_string(namespace)?
    ))
}

/// Renders a call of `snippet` with `args` as one expression.
///
/// Arguments are JSON-encoded, so strings cannot break out of the call.
///
/// # Errors
///
/// Returns `MalformedRecord` if the arguments cannot be JSON-encoded.
pub fn call_expression(snippet: &Snippet, args: &[serde_json::Value]) -> Result<String> {
    Ok(format!(
        "({}).apply(null, {})",
        snippet.source,
        serde_json::to_string(args)?
    ))
}
