// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Aggregation Engine - Market Data Consolidation Library
//!
//! Routes raw market data (trade ticks, quote ticks, open interest,
//! custom points) to per-subscription consolidators that roll it up into
//! time-bucketed bars, and exposes the results through pull-based
//! enumerators with push notifications on completed bars. A standalone
//! risk-parity optimizer turns historical returns into portfolio
//! weights.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core data model with no external integrations
//!   - `market`: instruments, tick/quote/open-interest payloads, bars
//!   - `subscription`: resolutions, tick types, subscription configs
//!   - `time`: pluggable wall-clock abstraction for deterministic tests
//!
//! - **Aggregation**: The consolidation engine
//!   - `consolidators`: time-bucketing and filtered pass-through
//!   - `scannable`: per-subscription enumerator with scan-on-pull
//!   - [`AggregationManager`]: the subscription registry and router
//!
//! - **Optimizer**: Newton-based risk-parity weight solver
//!
//! - **Application**: Port definitions (`DataProvider`, `DownloadProvider`)
//!
//! - **Infrastructure**: Adapters (local files, config, tracing setup)
//!
//! # Data Flow
//!
//! ```text
//! raw data ──> AggregationManager::update
//!                 │  (per-instrument fan-out, suspicious-tick filter)
//!                 ▼
//!          ScannableEnumerator ──> Consolidator::update
//!                 │                      │ completed bar
//!                 │◄─────────────────────┘
//!                 │  queue + notify(instrument)
//!                 ▼
//!          consumer: move_next / current
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core market data model.
pub mod domain;

/// Aggregation engine - consolidators, enumerators, and the manager.
pub mod aggregation;

/// Risk-parity portfolio optimizer.
pub mod optimizer;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Adapters and runtime wiring.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

pub use aggregation::{
    AggregationManager, AggregationStats, NewDataReceiver, NewDataSender, ScannableEnumerator,
    new_data_channel,
};
pub use domain::market::{ConsolidatedData, InstrumentId, MarketData};
pub use domain::subscription::{DataKind, Resolution, SubscriptionConfig, TickType};
pub use domain::time::{ManualTimeProvider, RealTimeProvider, TimeProvider};
pub use optimizer::{RiskParityOptimizer, RiskParityWeights};
