//! The controller-side session: setup, expectations, assertions.
//!
//! # Example
//!
//! ```ignore
//! let mut session = AjaxSession::new(page);
//! session.setup_interceptor().await?;
//! session.expect_request("GET", "/simple_get.json", 200);
//! session.bridge().click("#button").await?;
//! session.assert_requests().await?;
//! ```

use crate::bridge::{is_truthy, Bridge};
use crate::config::AjaxConfig;
use crate::error::{AjaxError, Result};
use crate::expect::{check, Expectation, ExpectationQueue, UrlMatcher};
use crate::record::RequestRecord;
use crate::retrieve::{fetch_request, fetch_requests};
use crate::script::{INSTALL, PROBE_STORE};
use crate::wait::wait_until;
use serde_json::json;
use tracing::{debug, info};

/// One test's view of an observed context.
///
/// The session owns the expectation queue; the records live in the context
/// and are read through the bridge on demand.
#[derive(Debug)]
pub struct AjaxSession<B> {
    bridge: B,
    config: AjaxConfig,
    expectations: ExpectationQueue,
}

impl<B: Bridge> AjaxSession<B> {
    /// Creates a session with default configuration.
    pub fn new(bridge: B) -> Self {
        Self::with_config(bridge, AjaxConfig::default())
    }

    /// Creates a session with explicit configuration.
    pub fn with_config(bridge: B, config: AjaxConfig) -> Self {
        Self {
            bridge,
            config,
            expectations: ExpectationQueue::new(),
        }
    }

    /// The bridge into the observed context.
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// The session configuration.
    pub fn config(&self) -> &AjaxConfig {
        &self.config
    }

    /// Expectations registered since the last setup.
    pub fn expectations(&self) -> &ExpectationQueue {
        &self.expectations
    }

    /// Makes sure the interceptor is installed in the current context.
    ///
    /// Always starts a fresh expectation queue. If a store already exists
    /// (installed by an earlier call or by a script on the page), its records
    /// are kept and this returns immediately. Otherwise the interceptor is
    /// installed and the store is polled for until the setup timeout.
    ///
    /// # Errors
    ///
    /// Returns `SetupTimeout` if the store never appears.
    pub async fn setup_interceptor(&mut self) -> Result<bool> {
        self.expectations.clear();
        let namespace = json!(self.config.namespace);

        let existing = self
            .bridge
            .execute(&PROBE_STORE, std::slice::from_ref(&namespace))
            .await?;
        if is_truthy(&existing) {
            debug!(namespace = %self.config.namespace, "interceptor already installed");
            return Ok(true);
        }

        self.bridge
            .execute(&INSTALL, std::slice::from_ref(&namespace))
            .await?;

        let wait = self.config.wait_config();
        let bridge = &self.bridge;
        let confirmed = wait_until(
            || {
                let namespace = namespace.clone();
                async move {
                    let probed = bridge.execute(&PROBE_STORE, &[namespace]).await?;
                    Ok(is_truthy(&probed))
                }
            },
            wait,
        )
        .await;

        if !confirmed {
            return Err(AjaxError::SetupTimeout {
                timeout: wait.timeout,
            });
        }

        info!(namespace = %self.config.namespace, "interceptor ready");
        Ok(true)
    }

    /// Registers the next expected request. Chainable.
    pub fn expect_request(
        &mut self,
        method: &str,
        url: impl Into<UrlMatcher>,
        status_code: u16,
    ) -> &mut Self {
        self.expectations
            .push(Expectation::new(method, url, status_code));
        self
    }

    /// Compares every recorded request with the registered expectations.
    ///
    /// # Errors
    ///
    /// Returns the first discrepancy; see [`check`].
    pub async fn assert_requests(&self) -> Result<()> {
        let records = self.get_requests().await?;
        check(self.expectations.as_slice(), &records)
    }

    /// Returns the normalized record at `index`.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` if nothing was recorded at `index`.
    pub async fn get_request(&self, index: usize) -> Result<RequestRecord> {
        fetch_request(&self.bridge, &self.config.namespace, index).await
    }

    /// Returns every normalized record in completion order.
    ///
    /// # Errors
    ///
    /// Returns `NotInstalled` if setup has not run in this context.
    pub async fn get_requests(&self) -> Result<Vec<Option<RequestRecord>>> {
        fetch_requests(&self.bridge, &self.config.namespace).await
    }
}
