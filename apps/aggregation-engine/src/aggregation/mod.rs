//! Aggregation Manager
//!
//! Owns the registry mapping instrument → subscription → enumerator, routes
//! inbound market data to every matching consolidator, and manages the
//! subscription lifecycle.
//!
//! # Concurrency
//!
//! ```text
//! producer threads ──> update() ──┐  (registry read lock)
//!                                 ├──> per-subscription enumerator mutex
//! consumer threads ──> move_next()┘
//!
//! add()/remove()  ──> registry write lock (brief, structural only)
//! ```
//!
//! The hot `update` path takes only the shared read lock plus the mutex of
//! each enumerator it routes to; unrelated instruments never serialize on a
//! common lock. The ingestion path never panics and never returns an error:
//! per-subscription failures are logged and routing continues.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::domain::market::{InstrumentId, MarketData};
use crate::domain::subscription::{Resolution, SubscriptionConfig};
use crate::domain::time::{RealTimeProvider, TimeProvider};

pub mod consolidators;
pub mod scannable;

pub use scannable::{NewDataReceiver, NewDataSender, ScannableEnumerator, new_data_channel};

type Registry = HashMap<InstrumentId, HashMap<SubscriptionConfig, Arc<ScannableEnumerator>>>;

// =============================================================================
// Aggregation Manager
// =============================================================================

/// Registry of per-instrument, per-subscription consolidators.
///
/// # Example
///
/// ```rust
/// use aggregation_engine::aggregation::{AggregationManager, new_data_channel};
/// use aggregation_engine::domain::market::InstrumentId;
/// use aggregation_engine::domain::subscription::{
///     DataKind, Resolution, SubscriptionConfig, TickType,
/// };
///
/// let manager = AggregationManager::new();
/// let (notify, _signals) = new_data_channel();
///
/// let config = SubscriptionConfig::new(
///     InstrumentId::new("AAPL"),
///     DataKind::TradeBar,
///     Resolution::Minute,
///     TickType::Trade,
/// );
/// let enumerator = manager.add(config.clone(), notify);
///
/// // feed.update(..) routes data; the consumer drains `enumerator`.
/// assert!(manager.remove(&config));
/// ```
pub struct AggregationManager {
    registry: RwLock<Registry>,
    time_provider: Arc<dyn TimeProvider>,
    disposed: AtomicBool,
}

impl Default for AggregationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregationManager {
    /// Create a manager on the real wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_time_provider(Arc::new(RealTimeProvider))
    }

    /// Create a manager with an injected clock (simulated in tests).
    #[must_use]
    pub fn with_time_provider(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            time_provider,
            disposed: AtomicBool::new(false),
        }
    }

    /// Add a subscription and return its enumerator.
    ///
    /// The consolidator implementation is selected here, once, from the
    /// config's declared kind and resolution. Re-adding an existing key
    /// replaces the pair with a fresh one; the old enumerator is disposed.
    /// A signal is sent on `notify` each time a bar completes.
    pub fn add(&self, config: SubscriptionConfig, notify: NewDataSender) -> Arc<ScannableEnumerator> {
        let consolidator = consolidators::for_config(&config);
        let enumerator = Arc::new(ScannableEnumerator::new(
            config.instrument.clone(),
            consolidator,
            config.is_period_based(),
            Arc::clone(&self.time_provider),
            notify,
        ));

        let mut registry = self.registry.write();
        // Checked under the write lock: dispose() swaps the flag before it
        // takes this lock, so an add that wins the lock race is cleared by
        // dispose, and one that loses observes the flag.
        if self.disposed.load(Ordering::Acquire) {
            // Terminal: hand back an inert enumerator, register nothing.
            drop(registry);
            enumerator.dispose();
            return enumerator;
        }

        let subscriptions = registry.entry(config.instrument.clone()).or_default();
        if let Some(replaced) = subscriptions.insert(config, Arc::clone(&enumerator)) {
            replaced.dispose();
        }

        enumerator
    }

    /// Remove a subscription.
    ///
    /// The enumerator is detached, not disposed: it stops receiving data
    /// but bars already completed (and the in-progress bar, via scan)
    /// remain drainable by a consumer still holding its `Arc`. Removing
    /// the last subscription for an instrument removes the instrument
    /// entry entirely. Returns `false` when the instrument or subscription
    /// was never registered.
    pub fn remove(&self, config: &SubscriptionConfig) -> bool {
        let mut registry = self.registry.write();
        let Some(subscriptions) = registry.get_mut(&config.instrument) else {
            debug!(instrument = %config.instrument, "remove: instrument not registered");
            return false;
        };

        let Some(enumerator) = subscriptions.remove(config) else {
            debug!(instrument = %config.instrument, "remove: subscription not registered");
            return false;
        };

        // Hand off, don't destroy: late updates become no-ops, and a
        // consumer still holding the Arc drains the remaining queue.
        enumerator.detach();

        if subscriptions.is_empty() {
            registry.remove(&config.instrument);
        }
        true
    }

    /// Route one data point to every subscription for its instrument.
    ///
    /// Unknown instruments are a silent no-op. Subscriptions at non-tick
    /// resolution silently drop ticks flagged suspicious (that subscription
    /// only). Per-subscription consolidator failures are logged and do not
    /// affect the other subscriptions.
    pub fn update(&self, data: &MarketData) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }

        let registry = self.registry.read();
        let Some(subscriptions) = registry.get(data.instrument()) else {
            return;
        };

        for (config, enumerator) in subscriptions {
            if config.resolution != Resolution::Tick && data.is_suspicious_tick() {
                continue;
            }

            if let Err(error) = enumerator.update(data) {
                warn!(
                    instrument = %config.instrument,
                    %error,
                    "dropping data point for subscription"
                );
            }
        }
    }

    /// Tear down every subscription. Idempotent; safe to call concurrently
    /// with in-flight `update`/`move_next`.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut registry = self.registry.write();
        for subscriptions in registry.values() {
            for enumerator in subscriptions.values() {
                enumerator.dispose();
            }
        }
        registry.clear();
    }

    /// Registry size snapshot, for logging and health output.
    #[must_use]
    pub fn stats(&self) -> AggregationStats {
        let registry = self.registry.read();
        AggregationStats {
            instrument_count: registry.len(),
            subscription_count: registry.values().map(HashMap::len).sum(),
        }
    }
}

/// Snapshot of registry size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    /// Number of instruments with at least one subscription.
    pub instrument_count: usize,
    /// Total number of subscriptions across instruments.
    pub subscription_count: usize,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::domain::market::ConsolidatedData;
    use crate::domain::subscription::{DataKind, TickType};
    use crate::domain::time::ManualTimeProvider;

    use super::*;

    fn trade(instrument: &str, second: u32, price: Decimal, suspicious: bool) -> MarketData {
        MarketData::TradeTick {
            instrument: InstrumentId::new(instrument),
            time: Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap()
                + Duration::seconds(i64::from(second)),
            price,
            size: 1,
            suspicious,
        }
    }

    fn trade_bar_config(instrument: &str, resolution: Resolution) -> SubscriptionConfig {
        SubscriptionConfig::new(
            InstrumentId::new(instrument),
            DataKind::TradeBar,
            resolution,
            TickType::Trade,
        )
    }

    fn tick_config(instrument: &str) -> SubscriptionConfig {
        SubscriptionConfig::new(
            InstrumentId::new(instrument),
            DataKind::Tick,
            Resolution::Tick,
            TickType::Trade,
        )
    }

    fn manual_manager() -> (AggregationManager, Arc<ManualTimeProvider>) {
        let clock = Arc::new(ManualTimeProvider::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
        ));
        let manager = AggregationManager::with_time_provider(Arc::clone(&clock) as _);
        (manager, clock)
    }

    #[test]
    fn add_then_remove_leaves_no_instrument_entry() {
        let (manager, _clock) = manual_manager();
        let (notify, _rx) = new_data_channel();

        let config = trade_bar_config("AAPL", Resolution::Minute);
        manager.add(config.clone(), notify);
        assert_eq!(manager.stats().instrument_count, 1);

        assert!(manager.remove(&config));
        assert_eq!(manager.stats(), AggregationStats::default());
    }

    #[test]
    fn remove_keeps_instrument_while_other_subscriptions_remain() {
        let (manager, _clock) = manual_manager();
        let (notify, _rx) = new_data_channel();

        let bars = trade_bar_config("AAPL", Resolution::Minute);
        let ticks = tick_config("AAPL");
        manager.add(bars.clone(), notify.clone());
        manager.add(ticks.clone(), notify);
        assert_eq!(manager.stats().subscription_count, 2);

        assert!(manager.remove(&bars));
        let stats = manager.stats();
        assert_eq!(stats.instrument_count, 1);
        assert_eq!(stats.subscription_count, 1);
    }

    #[test]
    fn remove_hands_off_buffered_output_to_the_consumer() {
        let (manager, _clock) = manual_manager();
        let (notify, _rx) = new_data_channel();

        let config = trade_bar_config("AAPL", Resolution::Minute);
        let bars = manager.add(config.clone(), notify);

        // Cross the minute boundary so the 14:30 bar completes and sits
        // in the queue, then unregister.
        manager.update(&trade("AAPL", 5, dec!(100), false));
        manager.update(&trade("AAPL", 65, dec!(101), false));
        assert!(manager.remove(&config));

        // The consumer's Arc still drains the completed bar.
        assert!(bars.is_detached());
        assert!(!bars.is_disposed());
        assert!(bars.move_next());
        let Some(ConsolidatedData::TradeBar(bar)) = bars.current() else {
            panic!("expected the completed bar to survive removal");
        };
        assert_eq!(bar.bar.open, dec!(100));
        assert_eq!(bar.bar.close, dec!(100));

        // New data no longer reaches it.
        manager.update(&trade("AAPL", 70, dec!(500), false));
        bars.move_next();
        assert!(bars.current().is_none());
    }

    #[test]
    fn remove_unknown_instrument_returns_false() {
        let (manager, _clock) = manual_manager();
        assert!(!manager.remove(&trade_bar_config("MSFT", Resolution::Minute)));
    }

    #[test]
    fn update_for_unregistered_instrument_is_a_no_op() {
        let (manager, _clock) = manual_manager();
        // No panic, no bar, nothing registered.
        manager.update(&trade("MSFT", 0, dec!(100), false));
        assert_eq!(manager.stats(), AggregationStats::default());
    }

    #[test]
    fn suspicious_tick_skips_bar_subscription_but_reaches_tick_subscription() {
        let (manager, clock) = manual_manager();
        let (notify, _rx) = new_data_channel();

        let bars = manager.add(trade_bar_config("AAPL", Resolution::Minute), notify.clone());
        let ticks = manager.add(tick_config("AAPL"), notify);

        manager.update(&trade("AAPL", 5, dec!(100), false));
        manager.update(&trade("AAPL", 10, dec!(999), true));
        manager.update(&trade("AAPL", 15, dec!(101), false));

        // Tick stream sees all three, suspicious included.
        let mut seen = Vec::new();
        while ticks.move_next() {
            if let Some(ConsolidatedData::Point(MarketData::TradeTick { price, .. })) =
                ticks.current()
            {
                seen.push(price);
            }
        }
        assert_eq!(seen, vec![dec!(100), dec!(999), dec!(101)]);

        // The minute bar never saw the suspicious print.
        clock.set_time(Utc.with_ymd_and_hms(2024, 1, 2, 14, 31, 0).unwrap());
        assert!(bars.move_next());
        let Some(ConsolidatedData::TradeBar(bar)) = bars.current() else {
            panic!("expected flushed trade bar");
        };
        assert_eq!(bar.bar.high, dec!(101));
        assert_eq!(bar.volume, 2);
    }

    #[test]
    fn consolidator_error_does_not_stop_routing_to_other_subscriptions() {
        let (manager, _clock) = manual_manager();
        let (notify, _rx) = new_data_channel();

        // Quote-bar subscription will reject trade ticks; the raw tick
        // subscription on the same instrument must still receive them.
        manager.add(
            SubscriptionConfig::new(
                InstrumentId::new("AAPL"),
                DataKind::QuoteBar,
                Resolution::Minute,
                TickType::Quote,
            ),
            notify.clone(),
        );
        let ticks = manager.add(tick_config("AAPL"), notify);

        manager.update(&trade("AAPL", 0, dec!(100), false));

        assert!(ticks.move_next());
        assert!(ticks.current().is_some());
    }

    #[test]
    fn re_add_replaces_with_a_fresh_pair() {
        let (manager, _clock) = manual_manager();
        let (notify, _rx) = new_data_channel();

        let config = tick_config("AAPL");
        let first = manager.add(config.clone(), notify.clone());
        let second = manager.add(config, notify);

        assert!(first.is_disposed());
        assert!(!second.is_disposed());
        assert_eq!(manager.stats().subscription_count, 1);

        manager.update(&trade("AAPL", 0, dec!(100), false));
        assert!(!first.move_next());
        assert!(second.move_next());
    }

    #[test]
    fn dispose_is_idempotent_and_terminal() {
        let (manager, _clock) = manual_manager();
        let (notify, _rx) = new_data_channel();

        let ticks = manager.add(tick_config("AAPL"), notify.clone());
        manager.dispose();
        manager.dispose();

        assert!(ticks.is_disposed());
        assert_eq!(manager.stats(), AggregationStats::default());

        // Post-dispose calls are inert and register nothing: the disposed
        // check happens under the registry write lock, so an add can never
        // land a live enumerator after teardown.
        manager.update(&trade("AAPL", 0, dec!(100), false));
        let late = manager.add(tick_config("AAPL"), notify);
        assert!(late.is_disposed());
        assert_eq!(manager.stats(), AggregationStats::default());
    }

    #[test]
    fn add_racing_dispose_never_leaves_a_live_subscription() {
        for _ in 0..100 {
            let (manager, _clock) = manual_manager();
            let manager = Arc::new(manager);
            let (notify, _rx) = new_data_channel();

            let adder = {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || manager.add(tick_config("AAPL"), notify))
            };
            let disposer = {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || manager.dispose())
            };

            let enumerator = adder.join().unwrap();
            disposer.join().unwrap();

            // Either order: an add that won the lock was torn down by
            // dispose, one that lost came back inert without registering.
            assert!(enumerator.is_disposed());
            assert_eq!(manager.stats(), AggregationStats::default());
        }
    }

    #[test]
    fn disjoint_instruments_route_independently() {
        let (manager, _clock) = manual_manager();
        let (notify, _rx) = new_data_channel();

        let aapl = manager.add(tick_config("AAPL"), notify.clone());
        let msft = manager.add(tick_config("MSFT"), notify);

        manager.update(&trade("AAPL", 0, dec!(100), false));
        manager.update(&trade("MSFT", 0, dec!(300), false));
        manager.update(&trade("MSFT", 1, dec!(301), false));

        let mut aapl_count = 0;
        while aapl.move_next() {
            aapl_count += 1;
        }
        let mut msft_count = 0;
        while msft.move_next() {
            msft_count += 1;
        }
        assert_eq!(aapl_count, 1);
        assert_eq!(msft_count, 2);
    }
}
