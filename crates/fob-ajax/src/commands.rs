//! Name-based command surface for external test runners.
//!
//! A runner that registers commands by name (and passes JSON arguments)
//! forwards each call to [`AjaxSession::dispatch`]. URLs in `expectRequest`
//! are either a JSON string (matched exactly) or `{"pattern": "..."}`
//! (searched as a regular expression).

use crate::bridge::Bridge;
use crate::error::{AjaxError, Result};
use crate::expect::UrlMatcher;
use crate::session::AjaxSession;
use serde_json::{json, Value};

/// Names accepted by [`AjaxSession::dispatch`].
pub const COMMANDS: &[&str] = &[
    "setupInterceptor",
    "expectRequest",
    "assertRequests",
    "getRequest",
    "getRequests",
];

impl<B: Bridge> AjaxSession<B> {
    /// Runs the command called `command` with positional JSON `args`.
    ///
    /// | command            | args                          | returns              |
    /// |--------------------|-------------------------------|----------------------|
    /// | `setupInterceptor` | none                          | `true`               |
    /// | `expectRequest`    | method, url, statusCode       | `{}`                 |
    /// | `assertRequests`   | none                          | `true`               |
    /// | `getRequest`       | index (omitted/null = all)    | record or records    |
    /// | `getRequests`      | none                          | records              |
    ///
    /// # Errors
    ///
    /// Returns `UnknownCommand`, `InvalidArgument`, or whatever the command
    /// itself fails with.
    pub async fn dispatch(&mut self, command: &str, args: &[Value]) -> Result<Value> {
        match command {
            "setupInterceptor" => Ok(Value::Bool(self.setup_interceptor().await?)),
            "expectRequest" => {
                let method = args.first().and_then(Value::as_str).ok_or_else(|| {
                    invalid(command, "method must be a string")
                })?;
                let url = url_matcher(command, args.get(1))?;
                let status = args
                    .get(2)
                    .and_then(Value::as_u64)
                    .and_then(|s| u16::try_from(s).ok())
                    .ok_or_else(|| invalid(command, "statusCode must be an integer status"))?;
                self.expect_request(method, url, status);
                Ok(json!({}))
            }
            "assertRequests" => {
                self.assert_requests().await?;
                Ok(Value::Bool(true))
            }
            "getRequest" => match index_arg(command, args.first())? {
                Some(index) => Ok(serde_json::to_value(self.get_request(index).await?)?),
                None => Ok(serde_json::to_value(self.get_requests().await?)?),
            },
            "getRequests" => Ok(serde_json::to_value(self.get_requests().await?)?),
            other => Err(AjaxError::UnknownCommand(other.to_string())),
        }
    }
}

fn invalid(command: &str, reason: &str) -> AjaxError {
    AjaxError::InvalidArgument {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

fn url_matcher(command: &str, value: Option<&Value>) -> Result<UrlMatcher> {
    match value {
        Some(Value::String(url)) => Ok(UrlMatcher::Exact(url.clone())),
        Some(Value::Object(map)) => {
            let pattern = map
                .get("pattern")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(command, "url object needs a string 'pattern'"))?;
            UrlMatcher::pattern(pattern)
        }
        _ => Err(invalid(command, "url must be a string or {\"pattern\": ...}")),
    }
}

fn index_arg(command: &str, value: Option<&Value>) -> Result<Option<usize>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .map(Some)
            .ok_or_else(|| invalid(command, "index must be a non-negative integer")),
    }
}
