//! Market Data Types
//!
//! Core domain types for raw market events (ticks, open-interest updates,
//! custom payloads) and their consolidated outputs (trade bars, quote bars).
//! These types are feed-agnostic and represent the canonical internal
//! representation of market data.
//!
//! Prices are `rust_decimal::Decimal` for financial precision; sizes and
//! open-interest values are whole units.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Instrument Identifier
// =============================================================================

/// A tradable security identifier (ticker or contract symbol).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentId(String);

impl InstrumentId {
    /// Create a new instrument identifier.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The raw symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// =============================================================================
// Raw Data Points
// =============================================================================

/// A timestamped, typed market event as delivered by an external feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketData {
    /// An executed trade.
    TradeTick {
        /// Instrument traded.
        instrument: InstrumentId,
        /// Event time (UTC).
        time: DateTime<Utc>,
        /// Trade price.
        price: Decimal,
        /// Trade size in whole units.
        size: u64,
        /// Flagged by the feed as suspicious/invalid.
        suspicious: bool,
    },
    /// A top-of-book quote update.
    QuoteTick {
        /// Instrument quoted.
        instrument: InstrumentId,
        /// Event time (UTC).
        time: DateTime<Utc>,
        /// Best bid price, if the update carries a bid side.
        bid_price: Option<Decimal>,
        /// Best bid size.
        bid_size: u64,
        /// Best ask price, if the update carries an ask side.
        ask_price: Option<Decimal>,
        /// Best ask size.
        ask_size: u64,
        /// Flagged by the feed as suspicious/invalid.
        suspicious: bool,
    },
    /// An open-interest update for a derivative contract.
    OpenInterest {
        /// Instrument.
        instrument: InstrumentId,
        /// Event time (UTC).
        time: DateTime<Utc>,
        /// Outstanding contract count.
        value: u64,
    },
    /// A custom data payload declared by its type name.
    Custom {
        /// Instrument the payload is keyed on.
        instrument: InstrumentId,
        /// Event time (UTC).
        time: DateTime<Utc>,
        /// Declared payload type name, matched exactly at routing time.
        type_name: String,
        /// Payload value.
        value: Decimal,
    },
}

impl MarketData {
    /// The instrument this event belongs to.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentId {
        match self {
            Self::TradeTick { instrument, .. }
            | Self::QuoteTick { instrument, .. }
            | Self::OpenInterest { instrument, .. }
            | Self::Custom { instrument, .. } => instrument,
        }
    }

    /// Event time (UTC).
    #[must_use]
    pub const fn time(&self) -> DateTime<Utc> {
        match self {
            Self::TradeTick { time, .. }
            | Self::QuoteTick { time, .. }
            | Self::OpenInterest { time, .. }
            | Self::Custom { time, .. } => *time,
        }
    }

    /// Short variant name, for log and error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::TradeTick { .. } => "trade tick",
            Self::QuoteTick { .. } => "quote tick",
            Self::OpenInterest { .. } => "open interest",
            Self::Custom { .. } => "custom",
        }
    }

    /// Whether this is a tick event (trade or quote).
    #[must_use]
    pub const fn is_tick(&self) -> bool {
        matches!(self, Self::TradeTick { .. } | Self::QuoteTick { .. })
    }

    /// Whether this is a tick flagged as suspicious by the feed.
    #[must_use]
    pub const fn is_suspicious_tick(&self) -> bool {
        matches!(
            self,
            Self::TradeTick {
                suspicious: true,
                ..
            } | Self::QuoteTick {
                suspicious: true,
                ..
            }
        )
    }
}

// =============================================================================
// Bars
// =============================================================================

/// An open/high/low/close price summary, updated incrementally in O(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// First price in the period.
    pub open: Decimal,
    /// Highest price in the period.
    pub high: Decimal,
    /// Lowest price in the period.
    pub low: Decimal,
    /// Most recent price in the period.
    pub close: Decimal,
}

impl Bar {
    /// Seed a bar from its first price.
    #[must_use]
    pub const fn new(price: Decimal) -> Self {
        Self {
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    /// Fold a new price into the bar.
    pub fn update(&mut self, price: Decimal) {
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
        self.close = price;
    }
}

/// An aggregated trade (OHLCV) bar over one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeBar {
    /// Instrument the bar summarizes.
    pub instrument: InstrumentId,
    /// Bucket start (inclusive).
    pub start: DateTime<Utc>,
    /// Bucket end (exclusive).
    pub end: DateTime<Utc>,
    /// Price summary.
    pub bar: Bar,
    /// Total traded volume in the bucket.
    pub volume: u64,
}

/// An aggregated quote bar: independent bid and ask price summaries.
///
/// A side stays `None` until a quote in the bucket carries that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBar {
    /// Instrument the bar summarizes.
    pub instrument: InstrumentId,
    /// Bucket start (inclusive).
    pub start: DateTime<Utc>,
    /// Bucket end (exclusive).
    pub end: DateTime<Utc>,
    /// Bid-side price summary.
    pub bid: Option<Bar>,
    /// Ask-side price summary.
    pub ask: Option<Bar>,
    /// Size of the last bid update in the bucket.
    pub last_bid_size: u64,
    /// Size of the last ask update in the bucket.
    pub last_ask_size: u64,
}

/// The open-interest value at the close of one time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenInterestBar {
    /// Instrument.
    pub instrument: InstrumentId,
    /// Bucket start (inclusive).
    pub start: DateTime<Utc>,
    /// Bucket end (exclusive).
    pub end: DateTime<Utc>,
    /// Latest open-interest value observed in the bucket.
    pub value: u64,
}

// =============================================================================
// Consolidated Output
// =============================================================================

/// Output of a consolidator: a completed bar, or a passed-through raw point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConsolidatedData {
    /// A completed trade bar.
    TradeBar(TradeBar),
    /// A completed quote bar.
    QuoteBar(QuoteBar),
    /// A completed open-interest bar.
    OpenInterest(OpenInterestBar),
    /// A raw point re-emitted by a pass-through consolidator.
    Point(MarketData),
}

impl ConsolidatedData {
    /// The instrument this output belongs to.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentId {
        match self {
            Self::TradeBar(bar) => &bar.instrument,
            Self::QuoteBar(bar) => &bar.instrument,
            Self::OpenInterest(bar) => &bar.instrument,
            Self::Point(data) => data.instrument(),
        }
    }

    /// End time of the output: bucket end for bars, event time for points.
    #[must_use]
    pub const fn end_time(&self) -> DateTime<Utc> {
        match self {
            Self::TradeBar(bar) => bar.end,
            Self::QuoteBar(bar) => bar.end,
            Self::OpenInterest(bar) => bar.end,
            Self::Point(data) => data.time(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
