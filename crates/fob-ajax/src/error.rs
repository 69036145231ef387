//! Error types for request recording and assertion.
//!
//! Two families live here. Assertion failures (`CountMismatch`,
//! `MethodMismatch`, `UrlMismatch`, `PatternMismatch`, `StatusMismatch`)
//! carry the concrete offending values so a failed test explains itself.
//! Everything else describes why the context could not be reached, set up,
//! or read.

use std::time::Duration;
use thiserror::Error;

/// The main error type for all recording and assertion operations.
#[derive(Debug, Error)]
pub enum AjaxError {
    /// The interceptor store could not be confirmed within the setup timeout.
    #[error("interceptor setup could not be confirmed within {timeout:?}")]
    SetupTimeout {
        /// How long setup polled before giving up
        timeout: Duration,
    },

    /// No request has been recorded at the requested position.
    #[error("Could not find request with index {index}")]
    RequestNotFound {
        /// The requested position
        index: usize,
    },

    /// The context has no recorder store under the given namespace.
    #[error("no interceptor installed under '{namespace}'")]
    NotInstalled {
        /// The global name that was probed
        namespace: String,
    },

    /// The number of expectations differs from the number of recorded requests.
    #[error("Expected {expected} requests but was {actual}")]
    CountMismatch {
        /// Number of registered expectations
        expected: usize,
        /// Number of recorded requests
        actual: usize,
    },

    /// A recorded request used a different method than expected.
    #[error("Expected request to URL {url} to have method {expected} but was {actual}")]
    MethodMismatch {
        /// Position of the request
        index: usize,
        /// URL of the recorded request
        url: String,
        /// Expected (upper-cased) method
        expected: String,
        /// Recorded method
        actual: String,
    },

    /// A recorded request URL differs from the expected literal URL.
    #[error("Expected request {index} to have URL {expected} but was {actual}")]
    UrlMismatch {
        /// Position of the request
        index: usize,
        /// Expected URL
        expected: String,
        /// Recorded URL
        actual: String,
    },

    /// A recorded request URL does not match the expected pattern.
    #[error("Expected request {index} to match /{pattern}/ but was {actual}")]
    PatternMismatch {
        /// Position of the request
        index: usize,
        /// Source of the expected pattern
        pattern: String,
        /// Recorded URL
        actual: String,
    },

    /// A recorded request finished with a different status code.
    #[error("Expected request to URL {url} to have status {expected} but was {actual}")]
    StatusMismatch {
        /// Position of the request
        index: usize,
        /// URL of the recorded request
        url: String,
        /// Expected status code
        expected: u16,
        /// Recorded status code
        actual: u16,
    },

    /// A wait condition was not satisfied within the timeout.
    #[error("wait condition '{condition}' timed out after {timeout:?}")]
    WaitTimeout {
        /// Description of the condition that timed out
        condition: String,
        /// How long we waited before timing out
        timeout: Duration,
    },

    /// Executing a snippet in the observed context failed.
    #[error("script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// A value returned from the context is not a request record.
    #[error("malformed request record: {0}")]
    MalformedRecord(#[from] serde_json::Error),

    /// The underlying request primitive failed before a response completed.
    #[error("request to '{url}' failed: {reason}")]
    Transport {
        /// Target of the failed request
        url: String,
        /// Reason reported by the transport
        reason: String,
    },

    /// Failed to launch the browser process.
    #[error("failed to launch browser: {reason}")]
    LaunchFailed {
        /// Human-readable reason for the launch failure
        reason: String,
        /// Optional underlying error that caused the failure
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Navigation to a URL failed.
    #[error("navigation to '{url}' failed: {reason}")]
    NavigationFailed {
        /// The URL that failed to load
        url: String,
        /// Reason for the navigation failure
        reason: String,
    },

    /// An operation was attempted on a closed browser instance.
    #[error("browser instance is already closed")]
    AlreadyClosed,

    /// Wraps errors from the chromiumoxide library.
    #[error("chromiumoxide error: {0}")]
    ChromiumOxide(#[from] chromiumoxide::error::CdpError),

    /// An expectation URL pattern failed to compile.
    #[error("invalid URL pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A configuration source could not be read or extracted.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(#[from] Box<figment::Error>),

    /// A dispatched command name is not one of [`crate::COMMANDS`].
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A dispatched command received an argument of the wrong shape.
    #[error("invalid argument for '{command}': {reason}")]
    InvalidArgument {
        /// The command being dispatched
        command: String,
        /// What was wrong with the arguments
        reason: String,
    },
}

impl AjaxError {
    /// Returns true for failures produced by comparing expectations with records.
    #[must_use]
    pub fn is_assertion_failure(&self) -> bool {
        matches!(
            self,
            AjaxError::CountMismatch { .. }
                | AjaxError::MethodMismatch { .. }
                | AjaxError::UrlMismatch { .. }
                | AjaxError::PatternMismatch { .. }
                | AjaxError::StatusMismatch { .. }
                | AjaxError::RequestNotFound { .. }
        )
    }
}

/// A specialized Result type for recording and assertion operations.
pub type Result<T> = std::result::Result<T, AjaxError>;
