//! Time-Bucketed Consolidators
//!
//! Bars are keyed to half-open intervals `[start, start + period)` where
//! `start` is the incoming timestamp floored to the period. A data point
//! stamped exactly on a boundary belongs to the bucket starting there.
//!
//! A point landing in a later bucket finalizes the previous bucket's bar
//! and seeds a new one; `scan` flushes the in-progress bar once the wall
//! clock (or simulated clock) passes the bucket end.

use chrono::{DateTime, Duration, Utc};

use crate::domain::market::{Bar, ConsolidatedData, MarketData, OpenInterestBar, QuoteBar, TradeBar};

use super::{Consolidator, ConsolidatorError};

/// Smallest representable bucket period.
const MIN_PERIOD: Duration = Duration::milliseconds(1);

/// Keep constructor-supplied periods positive so `bucket_start` never
/// divides by zero.
fn clamp_period(period: Duration) -> Duration {
    period.max(MIN_PERIOD)
}

/// Floor a timestamp to the start of its bucket.
///
/// Millisecond arithmetic; `rem_euclid` keeps pre-epoch timestamps in the
/// correct bucket. Callers guarantee a positive period.
fn bucket_start(time: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    let period_ms = period.num_milliseconds();
    let ts = time.timestamp_millis();
    let start = ts - ts.rem_euclid(period_ms);
    DateTime::from_timestamp_millis(start).unwrap_or(time)
}

// =============================================================================
// Trade Bars
// =============================================================================

/// Consolidates trade ticks into OHLCV bars over a fixed period.
pub struct TradeBarConsolidator {
    period: Duration,
    working: Option<TradeBar>,
}

impl TradeBarConsolidator {
    /// Create a consolidator for the given bucket period.
    ///
    /// Periods below one millisecond are clamped up to it, keeping the
    /// bucket arithmetic well-defined.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: clamp_period(period),
            working: None,
        }
    }
}

impl Consolidator for TradeBarConsolidator {
    fn update(&mut self, data: &MarketData) -> Result<Option<ConsolidatedData>, ConsolidatorError> {
        let MarketData::TradeTick {
            instrument,
            time,
            price,
            size,
            ..
        } = data
        else {
            return Err(ConsolidatorError::UnexpectedData {
                consolidator: "TradeBarConsolidator",
                got: data.kind_name(),
            });
        };

        let start = bucket_start(*time, self.period);
        let emitted = match &self.working {
            Some(working) if start >= working.end => {
                self.working.take().map(ConsolidatedData::TradeBar)
            }
            _ => None,
        };

        match &mut self.working {
            Some(working) => {
                working.bar.update(*price);
                working.volume += size;
            }
            None => {
                self.working = Some(TradeBar {
                    instrument: instrument.clone(),
                    start,
                    end: start + self.period,
                    bar: Bar::new(*price),
                    volume: *size,
                });
            }
        }

        Ok(emitted)
    }

    fn scan(&mut self, now: DateTime<Utc>) -> Option<ConsolidatedData> {
        match &self.working {
            Some(working) if now >= working.end => {
                self.working.take().map(ConsolidatedData::TradeBar)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Quote Bars
// =============================================================================

/// Consolidates quote ticks into bid/ask bars over a fixed period.
///
/// Bid and ask legs update independently; a leg stays unset until a quote
/// in the bucket carries that side.
pub struct QuoteBarConsolidator {
    period: Duration,
    working: Option<QuoteBar>,
}

impl QuoteBarConsolidator {
    /// Create a consolidator for the given bucket period.
    ///
    /// Periods below one millisecond are clamped up to it.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: clamp_period(period),
            working: None,
        }
    }
}

impl Consolidator for QuoteBarConsolidator {
    fn update(&mut self, data: &MarketData) -> Result<Option<ConsolidatedData>, ConsolidatorError> {
        let MarketData::QuoteTick {
            instrument,
            time,
            bid_price,
            bid_size,
            ask_price,
            ask_size,
            ..
        } = data
        else {
            return Err(ConsolidatorError::UnexpectedData {
                consolidator: "QuoteBarConsolidator",
                got: data.kind_name(),
            });
        };

        let start = bucket_start(*time, self.period);
        let emitted = match &self.working {
            Some(working) if start >= working.end => {
                self.working.take().map(ConsolidatedData::QuoteBar)
            }
            _ => None,
        };

        let working = self.working.get_or_insert_with(|| QuoteBar {
            instrument: instrument.clone(),
            start,
            end: start + self.period,
            bid: None,
            ask: None,
            last_bid_size: 0,
            last_ask_size: 0,
        });

        if let Some(bid) = bid_price {
            match &mut working.bid {
                Some(leg) => leg.update(*bid),
                None => working.bid = Some(Bar::new(*bid)),
            }
            working.last_bid_size = *bid_size;
        }
        if let Some(ask) = ask_price {
            match &mut working.ask {
                Some(leg) => leg.update(*ask),
                None => working.ask = Some(Bar::new(*ask)),
            }
            working.last_ask_size = *ask_size;
        }

        Ok(emitted)
    }

    fn scan(&mut self, now: DateTime<Utc>) -> Option<ConsolidatedData> {
        match &self.working {
            Some(working) if now >= working.end => {
                self.working.take().map(ConsolidatedData::QuoteBar)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Open Interest
// =============================================================================

/// Consolidates open-interest updates; the latest value in a bucket wins.
pub struct OpenInterestConsolidator {
    period: Duration,
    working: Option<OpenInterestBar>,
}

impl OpenInterestConsolidator {
    /// Create a consolidator for the given bucket period.
    ///
    /// Periods below one millisecond are clamped up to it.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: clamp_period(period),
            working: None,
        }
    }
}

impl Consolidator for OpenInterestConsolidator {
    fn update(&mut self, data: &MarketData) -> Result<Option<ConsolidatedData>, ConsolidatorError> {
        let MarketData::OpenInterest {
            instrument,
            time,
            value,
        } = data
        else {
            return Err(ConsolidatorError::UnexpectedData {
                consolidator: "OpenInterestConsolidator",
                got: data.kind_name(),
            });
        };

        let start = bucket_start(*time, self.period);
        let emitted = match &self.working {
            Some(working) if start >= working.end => {
                self.working.take().map(ConsolidatedData::OpenInterest)
            }
            _ => None,
        };

        match &mut self.working {
            Some(working) => working.value = *value,
            None => {
                self.working = Some(OpenInterestBar {
                    instrument: instrument.clone(),
                    start,
                    end: start + self.period,
                    value: *value,
                });
            }
        }

        Ok(emitted)
    }

    fn scan(&mut self, now: DateTime<Utc>) -> Option<ConsolidatedData> {
        match &self.working {
            Some(working) if now >= working.end => {
                self.working.take().map(ConsolidatedData::OpenInterest)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
