//! Subscription Descriptors
//!
//! Types describing one consumer's request for one instrument's data at one
//! declared output kind, resolution, and tick type. The full
//! [`SubscriptionConfig`] is the registry key in the aggregation manager:
//! the same instrument may carry many subscriptions differing in kind,
//! resolution, or tick type.
//!
//! The core only reads these fields; they are supplied externally and never
//! mutated.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::market::InstrumentId;

// =============================================================================
// Resolution
// =============================================================================

/// Aggregation bucket period for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// Raw tick stream, no bucketing.
    Tick,
    /// One-second bars.
    Second,
    /// One-minute bars.
    #[default]
    Minute,
    /// One-hour bars.
    Hour,
    /// One-day bars.
    Daily,
}

impl Resolution {
    /// The bucket period, or `None` for raw ticks.
    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        match self {
            Self::Tick => None,
            Self::Second => Some(Duration::seconds(1)),
            Self::Minute => Some(Duration::minutes(1)),
            Self::Hour => Some(Duration::hours(1)),
            Self::Daily => Some(Duration::days(1)),
        }
    }

    /// Parse a resolution name, case-insensitive. Unknown names are
    /// `None` so callers can reject them instead of guessing.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tick" => Some(Self::Tick),
            "second" => Some(Self::Second),
            "minute" => Some(Self::Minute),
            "hour" => Some(Self::Hour),
            "daily" | "day" => Some(Self::Daily),
            _ => None,
        }
    }
}

// =============================================================================
// Tick Type
// =============================================================================

/// The kind of tick a raw-tick subscription filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TickType {
    /// Executed trades.
    #[default]
    Trade,
    /// Top-of-book quote updates.
    Quote,
    /// Open-interest updates.
    OpenInterest,
}

// =============================================================================
// Data Kind
// =============================================================================

/// The declared output type of a subscription.
///
/// Selected once at subscription time; drives which consolidator
/// implementation the aggregation manager builds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    /// Consolidated trade (OHLCV) bars.
    TradeBar,
    /// Consolidated quote (bid/ask) bars.
    QuoteBar,
    /// Consolidated open-interest values.
    OpenInterest,
    /// Raw ticks filtered by tick type.
    Tick,
    /// Custom data filtered by exact declared type name.
    Custom(String),
}

// =============================================================================
// Subscription Config
// =============================================================================

/// Externally supplied descriptor of one data stream for one instrument.
///
/// Uniquely identifies a consumer's subscription; used verbatim as the
/// registry key in the aggregation manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// The instrument to subscribe to.
    pub instrument: InstrumentId,
    /// Declared output type.
    pub kind: DataKind,
    /// Aggregation resolution.
    pub resolution: Resolution,
    /// Tick type for raw-tick subscriptions.
    pub tick_type: TickType,
    /// IANA time zone of the instrument's exchange.
    pub exchange_time_zone: String,
    /// IANA time zone the raw data is stamped in.
    pub data_time_zone: String,
}

impl SubscriptionConfig {
    /// Create a config with UTC time zones.
    #[must_use]
    pub fn new(
        instrument: InstrumentId,
        kind: DataKind,
        resolution: Resolution,
        tick_type: TickType,
    ) -> Self {
        Self {
            instrument,
            kind,
            resolution,
            tick_type,
            exchange_time_zone: "UTC".to_string(),
            data_time_zone: "UTC".to_string(),
        }
    }

    /// Whether this subscription aggregates over a time period.
    ///
    /// Raw-tick and custom pass-through subscriptions are not period-based;
    /// bar subscriptions at tick resolution degrade to pass-through.
    #[must_use]
    pub fn is_period_based(&self) -> bool {
        match self.kind {
            DataKind::TradeBar | DataKind::QuoteBar | DataKind::OpenInterest => {
                self.resolution != Resolution::Tick
            }
            DataKind::Tick | DataKind::Custom(_) => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
