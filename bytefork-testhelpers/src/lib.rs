#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Shared test setup for the bytefork crates.
//!
//! Call [`setup`] at the top of a test to get tracing output. The filter is
//! taken from the `BYTEFORK_LOG` environment variable when set (standard
//! target syntax, e.g. `bytefork=trace`), and defaults to `TRACE` for
//! everything.

use std::sync::LazyLock;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Lazy initialization of the global tracing subscriber, so it is set up
/// exactly once no matter how many tests run in the same process.
static SUBSCRIBER_INIT: LazyLock<()> = LazyLock::new(|| {
    let filter = std::env::var("BYTEFORK_LOG")
        .ok()
        .and_then(|s| s.parse::<Targets>().ok())
        .unwrap_or_else(|| Targets::new().with_default(tracing::Level::TRACE));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .ok();
});

/// Install the tracing subscriber for tests.
pub fn setup() {
    #[allow(clippy::let_unit_value)]
    let _ = *SUBSCRIBER_INIT;
}
