//! Session configuration.
//!
//! Loaded with figment. Priority: environment (`FOB_AJAX_*`) > config file
//! (`fob-ajax.json`) > defaults.

use crate::error::{AjaxError, Result};
use crate::wait::{WaitConfig, DEFAULT_POLL_INTERVAL, SETUP_TIMEOUT};
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default global name of the recorder store.
pub const DEFAULT_NAMESPACE: &str = "__fob_ajax";

/// Configuration for interceptor setup and the browser driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AjaxConfig {
    /// Global property holding the recorder store
    pub namespace: String,

    /// How long setup waits for the store to appear
    pub setup_timeout_ms: u64,

    /// How often setup probes for the store
    pub poll_interval_ms: u64,

    /// Run the browser headless
    pub headless: bool,

    /// Chrome executable path (None = auto-detect)
    pub chrome_path: Option<String>,

    /// Additional Chrome arguments
    pub browser_args: Vec<String>,
}

impl Default for AjaxConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            setup_timeout_ms: u64::try_from(SETUP_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
            poll_interval_ms: u64::try_from(DEFAULT_POLL_INTERVAL.as_millis()).unwrap_or(u64::MAX),
            headless: !cfg!(feature = "visible"),
            chrome_path: None,
            browser_args: vec![
                // Required when user namespaces are unavailable (containers, CI)
                "--no-sandbox".to_string(),
                // Prevents /dev/shm exhaustion in containerized environments
                "--disable-dev-shm-usage".to_string(),
            ],
        }
    }
}

impl AjaxConfig {
    /// File read by [`AjaxConfig::load`] when no path is given.
    pub const FILE_NAME: &'static str = "fob-ajax.json";

    /// Loads configuration from defaults, a JSON file, and the environment.
    ///
    /// Without an explicit `path`, `fob-ajax.json` in the working directory
    /// is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigLoad` if a source cannot be parsed, or `Config` if the
    /// result is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = path.map(Path::to_path_buf).or_else(|| {
            let default_path = Path::new(Self::FILE_NAME);
            default_path.exists().then(|| default_path.to_path_buf())
        });
        if let Some(file) = config_file {
            figment = figment.merge(Json::file(file));
        }

        figment = figment.merge(Env::prefixed("FOB_AJAX_"));

        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that would make setup impossible.
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let valid_namespace = self
            .namespace
            .chars()
            .next()
            .is_some_and(|c| c == '_' || c == '$' || c.is_ascii_alphabetic())
            && self
                .namespace
                .chars()
                .all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric());
        if !valid_namespace {
            return Err(AjaxError::Config(format!(
                "namespace '{}' is not a valid global identifier",
                self.namespace
            )));
        }
        if self.setup_timeout_ms == 0 {
            return Err(AjaxError::Config("setup_timeout_ms must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(AjaxError::Config("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// The wait strategy used while confirming setup.
    #[must_use]
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::new(
            Duration::from_millis(self.setup_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}
