//! Consolidators
//!
//! Stateful per-subscription transformers turning raw market data points
//! into resolution bars. Two families:
//!
//! - Time-bucketed ([`time_bucket`]): floor the incoming timestamp to the
//!   subscription period; a point landing in a later bucket finalizes the
//!   previous bar and seeds a new one. O(1) per update.
//! - Filtered identity ([`identity`]): re-emit accepted points immediately,
//!   no buffering.
//!
//! The concrete consolidator for a subscription is selected exactly once at
//! add time by [`for_config`]; the hot update path never re-dispatches on
//! the declared type.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::market::{ConsolidatedData, MarketData};
use crate::domain::subscription::{DataKind, SubscriptionConfig, TickType};

pub mod identity;
pub mod time_bucket;

pub use identity::FilteredIdentityConsolidator;
pub use time_bucket::{OpenInterestConsolidator, QuoteBarConsolidator, TradeBarConsolidator};

// =============================================================================
// Errors
// =============================================================================

/// Errors raised by a consolidator while consuming data.
///
/// These are caught and logged at the aggregation-manager boundary; a bad
/// data point must never halt the feed.
#[derive(Debug, Error)]
pub enum ConsolidatorError {
    /// The consolidator received a payload kind it cannot aggregate.
    #[error("{consolidator} cannot consume {got}")]
    UnexpectedData {
        /// Name of the consolidator that rejected the data.
        consolidator: &'static str,
        /// Variant name of the rejected payload.
        got: &'static str,
    },
}

// =============================================================================
// Consolidator Trait
// =============================================================================

/// A stateful transformer from raw data points to consolidated output.
///
/// Invariants: at most one in-progress bar at a time; at most one completed
/// bar emitted per period boundary crossed.
pub trait Consolidator: Send {
    /// Consume one data point.
    ///
    /// Returns `Ok(Some(..))` when this point completed a bar (time-bucketed
    /// consolidators emit the *previous* bucket's bar), `Ok(None)` when the
    /// point was absorbed or filtered out.
    fn update(&mut self, data: &MarketData) -> Result<Option<ConsolidatedData>, ConsolidatorError>;

    /// Flush the in-progress bar if its period has elapsed by `now`.
    ///
    /// Pass-through consolidators have nothing to flush.
    fn scan(&mut self, now: DateTime<Utc>) -> Option<ConsolidatedData> {
        let _ = now;
        None
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Build the consolidator for a subscription.
///
/// Bar kinds at tick resolution have no period to bucket over and degrade
/// to a pass-through filtered on the corresponding tick type.
#[must_use]
pub fn for_config(config: &SubscriptionConfig) -> Box<dyn Consolidator> {
    match &config.kind {
        DataKind::TradeBar => match config.resolution.period() {
            Some(period) => Box::new(TradeBarConsolidator::new(period)),
            None => Box::new(FilteredIdentityConsolidator::by_tick_type(TickType::Trade)),
        },
        DataKind::QuoteBar => match config.resolution.period() {
            Some(period) => Box::new(QuoteBarConsolidator::new(period)),
            None => Box::new(FilteredIdentityConsolidator::by_tick_type(TickType::Quote)),
        },
        DataKind::OpenInterest => match config.resolution.period() {
            Some(period) => Box::new(OpenInterestConsolidator::new(period)),
            None => Box::new(FilteredIdentityConsolidator::by_tick_type(
                TickType::OpenInterest,
            )),
        },
        DataKind::Tick => Box::new(FilteredIdentityConsolidator::by_tick_type(config.tick_type)),
        DataKind::Custom(name) => {
            Box::new(FilteredIdentityConsolidator::by_custom_type(name.clone()))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
