//! Tracing Setup
//!
//! Configures the global `tracing` subscriber with an environment
//! filter and a formatted stdout layer.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `aggregation_engine=info`)

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the tracing subscriber with environment filter.
///
/// Uses a static directive string that is a compile-time constant
/// guaranteed to parse. Call once at binary startup.
#[allow(clippy::expect_used)]
pub fn init() {
    let filter = EnvFilter::from_default_env().add_directive(
        "aggregation_engine=info"
            .parse()
            .expect("static directive 'aggregation_engine=info' is valid"),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
