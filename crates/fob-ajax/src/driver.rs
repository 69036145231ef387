//! Headless Chrome as an observed context.
//!
//! [`Driver`] owns the browser process; [`Page`] is one tab and implements
//! [`Bridge`] by evaluating snippet calls in the page's main world.
//!
//! # Resource Safety
//!
//! Dropping a `Driver` without calling [`Driver::close`] still kills Chrome
//! (chromiumoxide's own Drop does that), but the shutdown is not graceful and
//! a warning is logged.

use crate::bridge::Bridge;
use crate::config::AjaxConfig;
use crate::error::{AjaxError, Result};
use crate::script::{call_expression, Snippet};
use crate::wait::{wait_until, WaitConfig};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page as ChromePage;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A managed Chrome process.
pub struct Driver {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
}

impl Driver {
    /// Launches Chrome according to `config`.
    ///
    /// # Errors
    ///
    /// Returns `LaunchFailed` if Chrome is missing or fails to start.
    pub async fn launch(config: &AjaxConfig) -> Result<Self> {
        debug!(headless = config.headless, "launching browser");

        let (browser, mut handler) = Browser::launch(browser_config(config)?)
            .await
            .map_err(|e| AjaxError::LaunchFailed {
                reason: "failed to launch Chrome process".to_string(),
                source: Some(Box::new(e)),
            })?;

        // chromiumoxide only processes CDP events while the handler is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("browser handler error: {e}");
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler,
        })
    }

    /// Opens a new blank tab.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyClosed` if the browser has been closed.
    pub async fn new_page(&self) -> Result<Page> {
        let browser = self.browser.as_ref().ok_or(AjaxError::AlreadyClosed)?;
        let page = browser.new_page("about:blank").await?;
        Ok(Page { inner: page })
    }

    /// Returns true if the browser has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.browser.is_none()
    }

    /// Closes the browser gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if Chrome does not acknowledge the close.
    pub async fn close(mut self) -> Result<()> {
        if let Some(mut browser) = self.browser.take() {
            debug!("closing browser");
            browser.close().await?;
        }
        self.handler.abort();
        Ok(())
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if self.browser.is_some() {
            warn!("Driver dropped without close(); relying on chromiumoxide to kill Chrome");
        }
    }
}

fn browser_config(config: &AjaxConfig) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder();

    if config.headless {
        builder = builder.arg("--headless");
    } else {
        builder = builder.with_head();
    }

    // A fresh profile per launch avoids ProcessSingleton clashes between
    // browsers started by parallel tests
    let user_data_dir = std::env::temp_dir().join(format!("fob-ajax-{}", uuid::Uuid::new_v4()));
    builder = builder.arg(format!("--user-data-dir={}", user_data_dir.display()));

    for arg in &config.browser_args {
        builder = builder.arg(arg.clone());
    }

    if let Some(path) = &config.chrome_path {
        builder = builder.chrome_executable(path.clone());
    }

    builder.build().map_err(|e| AjaxError::LaunchFailed {
        reason: format!("invalid browser configuration: {e}"),
        source: None,
    })
}

/// A browser tab.
#[derive(Debug)]
pub struct Page {
    inner: ChromePage,
}

impl Page {
    /// Navigates to `url` and waits for the document to finish loading.
    ///
    /// # Errors
    ///
    /// Returns `NavigationFailed` if the page cannot be loaded.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| AjaxError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        self.wait_for_load(WaitConfig::default()).await
    }

    /// Waits until `document.readyState` is `complete`.
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the document does not finish in time.
    pub async fn wait_for_load(&self, config: WaitConfig) -> Result<()> {
        let page = &self.inner;
        let loaded = wait_until(
            || async move {
                let result = page
                    .evaluate("document.readyState")
                    .await
                    .map_err(|e| AjaxError::ScriptExecutionFailed(e.to_string()))?;
                Ok(result.value().and_then(Value::as_str) == Some("complete"))
            },
            config,
        )
        .await;

        if loaded {
            Ok(())
        } else {
            Err(AjaxError::WaitTimeout {
                condition: "document ready".to_string(),
                timeout: config.timeout,
            })
        }
    }

    /// Evaluates `script` in the page and deserializes its result.
    ///
    /// # Errors
    ///
    /// Returns `ScriptExecutionFailed` if evaluation or deserialization fails.
    pub async fn evaluate<T>(&self, script: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.inner
            .evaluate(script)
            .await
            .map_err(|e| AjaxError::ScriptExecutionFailed(e.to_string()))?
            .into_value()
            .map_err(|e| AjaxError::ScriptExecutionFailed(e.to_string()))
    }

    /// Clicks the first element matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns `ScriptExecutionFailed` if nothing matches.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let script = format!(
            "(function (sel) {{ var el = document.querySelector(sel); if (!el) {{ return false; }} el.click(); return true; }})({})",
            serde_json::to_string(selector)?
        );
        if self.evaluate::<bool>(&script).await? {
            Ok(())
        } else {
            Err(AjaxError::ScriptExecutionFailed(format!(
                "no element matches '{selector}'"
            )))
        }
    }

    /// Returns the current page URL.
    ///
    /// # Errors
    ///
    /// Returns an error if script execution fails.
    pub async fn url(&self) -> Result<String> {
        self.evaluate("window.location.href").await
    }

    /// Closes the tab.
    ///
    /// # Errors
    ///
    /// Returns an error if Chrome fails to close the target.
    pub async fn close(self) -> Result<()> {
        self.inner.close().await?;
        Ok(())
    }
}

#[async_trait]
impl Bridge for Page {
    async fn execute(&self, snippet: &Snippet, args: &[Value]) -> Result<Value> {
        let expression = call_expression(snippet, args)?;
        let result = self
            .inner
            .evaluate(expression.as_str())
            .await
            .map_err(|e| AjaxError::ScriptExecutionFailed(format!("{}: {e}", snippet.name)))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}
