//! # fob-ajax
//!
//! Record the requests a page (or an in-process client) issues, then assert
//! on them after the fact, in order.
//!
//! A test registers the requests it expects, triggers the actions that cause
//! them, and calls [`AjaxSession::assert_requests`]. No interception code is
//! written by the test author.
//!
//! ## Architecture
//!
//! - **Snippet** ([`script`]): functions that run inside the observed context
//! - **Bridge** ([`Bridge`]): runs snippets in a context and returns JSON
//! - **Page** ([`Page`]): a Chrome tab, bridged through CDP evaluation
//! - **LocalContext** ([`LocalContext`]): an in-process context whose request
//!   primitive is a [`Transport`]
//! - **RecorderStore** ([`RecorderStore`]): the append-only record list living
//!   in the context's globals
//! - **Normalizer** ([`normalize`]): header/body parsing and index-keyed
//!   sequence repair
//! - **AjaxSession** ([`AjaxSession`]): setup, expectations and assertions
//!
//! ## Invariants
//!
//! 1. Records are append-only and ordered by completion; index `i` is the
//!    `i`-th request since installation, across navigations that keep globals
//! 2. Installing twice never replaces an existing store
//! 3. Assertions are positional and fail on the first discrepancy: the count
//!    first, then method, URL and status for each pair in order
//! 4. Recording never alters the request or its response
//!
//! ## Example Usage
//!
//! ```ignore
//! use fob_ajax::{AjaxConfig, AjaxSession, Driver, UrlMatcher};
//!
//! #[tokio::test]
//! async fn button_fetches_data() -> fob_ajax::Result<()> {
//!     let config = AjaxConfig::load(None)?;
//!     let driver = Driver::launch(&config).await?;
//!     let page = driver.new_page().await?;
//!     page.navigate("http://localhost:8080/simple_get.html").await?;
//!
//!     let mut session = AjaxSession::with_config(&page, config);
//!     session.setup_interceptor().await?;
//!     session
//!         .expect_request("GET", "/simple_get.json", 200)
//!         .expect_request("GET", UrlMatcher::pattern(r"simple_get\.json")?, 200);
//!
//!     page.click("#button").await?;
//!     page.click("#button").await?;
//!     session.assert_requests().await?;
//!
//!     driver.close().await
//! }
//! ```
//!
//! ## Testing Strategy
//!
//! 1. **Unit tests**: normalization, matching and the local context
//! 2. **Session tests** (`tests/session.rs`): full flows over [`LocalContext`]
//! 3. **Browser tests** (`tests/browser.rs`): real Chrome, `#[ignore]`d
//!
//! Run with `cargo test` or `cargo test -- --ignored`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bridge;
pub mod commands;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod expect;
pub mod normalize;
pub mod record;
pub mod retrieve;
pub mod script;
pub mod session;
pub mod store;
pub mod transport;
pub mod wait;

// Re-export main types for convenience
pub use bridge::{is_truthy, Bridge};
pub use commands::COMMANDS;
pub use config::{AjaxConfig, DEFAULT_NAMESPACE};
pub use context::LocalContext;
pub use driver::{Driver, Page};
pub use error::{AjaxError, Result};
pub use expect::{check, Expectation, ExpectationQueue, UrlMatcher};
pub use record::{RawRecord, RequestRecord};
pub use script::{interceptor_script, Snippet};
pub use session::AjaxSession;
pub use store::RecorderStore;
pub use transport::{Exchange, HttpTransport, OutboundRequest, RecordingTransport, Transport};
pub use wait::{wait_until, WaitConfig, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, SETUP_TIMEOUT};
