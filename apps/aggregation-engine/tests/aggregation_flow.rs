//! End-to-End Aggregation Flow Tests
//!
//! Full path from raw ticks through the manager, consolidators, and
//! scannable enumerators: subscribe, feed, get notified, drain.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use aggregation_engine::{
    AggregationManager, ConsolidatedData, DataKind, InstrumentId, ManualTimeProvider, MarketData,
    Resolution, SubscriptionConfig, TickType, new_data_channel,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn minute_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
}

fn trade(instrument: &InstrumentId, time: DateTime<Utc>, price: Decimal, size: u64) -> MarketData {
    MarketData::TradeTick {
        instrument: instrument.clone(),
        time,
        price,
        size,
        suspicious: false,
    }
}

#[test]
fn minute_trade_bars_flow_end_to_end() {
    let clock = Arc::new(ManualTimeProvider::new(minute_start()));
    let manager = AggregationManager::with_time_provider(clock.clone());
    let (tx, mut rx) = new_data_channel();

    let spy = InstrumentId::new("SPY");
    let bars = manager.add(
        SubscriptionConfig::new(
            spy.clone(),
            DataKind::TradeBar,
            Resolution::Minute,
            TickType::Trade,
        ),
        tx,
    );

    // Three ticks inside the 10:00 bucket.
    manager.update(&trade(
        &spy,
        minute_start() + Duration::seconds(1),
        dec!(100.00),
        10,
    ));
    manager.update(&trade(
        &spy,
        minute_start() + Duration::seconds(30),
        dec!(102.00),
        20,
    ));
    manager.update(&trade(
        &spy,
        minute_start() + Duration::seconds(45),
        dec!(99.00),
        5,
    ));

    // Nothing completed yet.
    assert!(rx.try_recv().is_err());

    // A tick in the 10:01 bucket closes the 10:00 bar.
    clock.set_time(minute_start() + Duration::seconds(65));
    manager.update(&trade(
        &spy,
        minute_start() + Duration::seconds(65),
        dec!(101.00),
        7,
    ));

    assert_eq!(rx.try_recv().unwrap(), spy);
    assert!(bars.move_next());
    let ConsolidatedData::TradeBar(bar) = bars.current().unwrap() else {
        panic!("expected a trade bar");
    };

    assert_eq!(bar.instrument, spy);
    assert_eq!(bar.start, minute_start());
    assert_eq!(bar.end, minute_start() + Duration::minutes(1));
    assert_eq!(bar.bar.open, dec!(100.00));
    assert_eq!(bar.bar.high, dec!(102.00));
    assert_eq!(bar.bar.low, dec!(99.00));
    assert_eq!(bar.bar.close, dec!(99.00));
    assert_eq!(bar.volume, 35);
}

#[test]
fn idle_gap_is_flushed_by_the_clock_not_by_data() {
    let clock = Arc::new(ManualTimeProvider::new(minute_start()));
    let manager = AggregationManager::with_time_provider(clock.clone());
    let (tx, _rx) = new_data_channel();

    let spy = InstrumentId::new("SPY");
    let bars = manager.add(
        SubscriptionConfig::new(
            spy.clone(),
            DataKind::TradeBar,
            Resolution::Minute,
            TickType::Trade,
        ),
        tx,
    );

    manager.update(&trade(
        &spy,
        minute_start() + Duration::seconds(10),
        dec!(100.00),
        1,
    ));

    // Still inside the bucket: the working bar is not flushed.
    assert!(bars.move_next());
    assert!(bars.current().is_none());

    // After the bucket elapses, a data-free pull flushes it.
    clock.advance(Duration::minutes(2));
    assert!(bars.move_next());
    let ConsolidatedData::TradeBar(bar) = bars.current().unwrap() else {
        panic!("expected a trade bar");
    };
    assert_eq!(bar.bar.close, dec!(100.00));
    assert_eq!(bar.volume, 1);
}

#[test]
fn suspicious_ticks_reach_tick_subscriptions_only() {
    let clock = Arc::new(ManualTimeProvider::new(minute_start()));
    let manager = AggregationManager::with_time_provider(clock.clone());
    let (tx, _rx) = new_data_channel();

    let spy = InstrumentId::new("SPY");
    let bars = manager.add(
        SubscriptionConfig::new(
            spy.clone(),
            DataKind::TradeBar,
            Resolution::Minute,
            TickType::Trade,
        ),
        tx.clone(),
    );
    let ticks = manager.add(
        SubscriptionConfig::new(
            spy.clone(),
            DataKind::Tick,
            Resolution::Tick,
            TickType::Trade,
        ),
        tx,
    );

    manager.update(&MarketData::TradeTick {
        instrument: spy.clone(),
        time: minute_start() + Duration::seconds(5),
        price: dec!(0.01),
        size: 1_000_000,
        suspicious: true,
    });

    // The raw tick stream carries it through.
    assert!(ticks.move_next());
    assert!(matches!(
        ticks.current(),
        Some(ConsolidatedData::Point(MarketData::TradeTick {
            suspicious: true,
            ..
        }))
    ));

    // The minute bar never saw it: flushing the bucket produces nothing.
    clock.advance(Duration::minutes(2));
    assert!(bars.move_next());
    assert!(bars.current().is_none());
}

#[test]
fn quote_bars_track_bid_and_ask_legs_independently() {
    let clock = Arc::new(ManualTimeProvider::new(minute_start()));
    let manager = AggregationManager::with_time_provider(clock.clone());
    let (tx, _rx) = new_data_channel();

    let spy = InstrumentId::new("SPY");
    let quotes = manager.add(
        SubscriptionConfig::new(
            spy.clone(),
            DataKind::QuoteBar,
            Resolution::Minute,
            TickType::Quote,
        ),
        tx,
    );

    // First quote is bid-only; second carries both sides.
    manager.update(&MarketData::QuoteTick {
        instrument: spy.clone(),
        time: minute_start() + Duration::seconds(2),
        bid_price: Some(dec!(99.95)),
        bid_size: 100,
        ask_price: None,
        ask_size: 0,
        suspicious: false,
    });
    manager.update(&MarketData::QuoteTick {
        instrument: spy.clone(),
        time: minute_start() + Duration::seconds(40),
        bid_price: Some(dec!(99.97)),
        bid_size: 200,
        ask_price: Some(dec!(100.02)),
        ask_size: 300,
        suspicious: false,
    });

    clock.advance(Duration::minutes(2));
    assert!(quotes.move_next());
    let ConsolidatedData::QuoteBar(bar) = quotes.current().unwrap() else {
        panic!("expected a quote bar");
    };

    let bid = bar.bid.unwrap();
    assert_eq!(bid.open, dec!(99.95));
    assert_eq!(bid.close, dec!(99.97));

    // Ask leg opened at the second quote, untouched by the first.
    let ask = bar.ask.unwrap();
    assert_eq!(ask.open, dec!(100.02));
    assert_eq!(ask.close, dec!(100.02));

    assert_eq!(bar.last_bid_size, 200);
    assert_eq!(bar.last_ask_size, 300);
}

#[test]
fn removed_subscription_drains_then_goes_quiet() {
    let manager = AggregationManager::new();
    let (tx, _rx) = new_data_channel();

    let spy = InstrumentId::new("SPY");
    let config = SubscriptionConfig::new(
        spy.clone(),
        DataKind::Tick,
        Resolution::Tick,
        TickType::Trade,
    );
    let ticks = manager.add(config.clone(), tx);

    // A point delivered before removal must survive it.
    manager.update(&trade(&spy, Utc::now(), dec!(100.00), 1));
    assert!(manager.remove(&config));
    assert_eq!(manager.stats().instrument_count, 0);

    assert!(ticks.move_next());
    assert!(matches!(
        ticks.current(),
        Some(ConsolidatedData::Point(MarketData::TradeTick { .. }))
    ));

    // Routing after removal is a silent no-op; the drained stream is done.
    manager.update(&trade(&spy, Utc::now(), dec!(101.00), 1));
    assert!(!ticks.move_next());
}

#[test]
fn dispose_tears_down_every_subscription() {
    let manager = AggregationManager::new();
    let (tx, _rx) = new_data_channel();

    let spy = InstrumentId::new("SPY");
    let qqq = InstrumentId::new("QQQ");
    let a = manager.add(
        SubscriptionConfig::new(
            spy,
            DataKind::TradeBar,
            Resolution::Minute,
            TickType::Trade,
        ),
        tx.clone(),
    );
    let b = manager.add(
        SubscriptionConfig::new(qqq, DataKind::Tick, Resolution::Tick, TickType::Trade),
        tx,
    );

    manager.dispose();
    assert!(a.is_disposed());
    assert!(b.is_disposed());
    assert_eq!(manager.stats().subscription_count, 0);

    // Terminal: adds after dispose come back inert.
    let (tx2, _rx2) = new_data_channel();
    let late = manager.add(
        SubscriptionConfig::new(
            InstrumentId::new("TLT"),
            DataKind::Tick,
            Resolution::Tick,
            TickType::Trade,
        ),
        tx2,
    );
    assert!(late.is_disposed());
}

#[test]
fn time_aware_clock_drives_multi_bucket_replay() {
    // Replay two minutes of ticks and collect both bars.
    let clock = Arc::new(ManualTimeProvider::new(minute_start()));
    let manager = AggregationManager::with_time_provider(clock.clone());
    let (tx, _rx) = new_data_channel();

    let spy = InstrumentId::new("SPY");
    let bars = manager.add(
        SubscriptionConfig::new(
            spy.clone(),
            DataKind::TradeBar,
            Resolution::Minute,
            TickType::Trade,
        ),
        tx,
    );

    for (offset_secs, price) in [(5, dec!(100)), (50, dec!(101)), (65, dec!(103)), (110, dec!(102))] {
        let time = minute_start() + Duration::seconds(offset_secs);
        clock.set_time(time);
        manager.update(&trade(&spy, time, price, 1));
    }
    clock.set_time(minute_start() + Duration::minutes(3));

    let mut collected = Vec::new();
    while bars.move_next() {
        match bars.current() {
            Some(ConsolidatedData::TradeBar(bar)) => collected.push(bar),
            _ => break,
        }
    }

    assert_eq!(collected.len(), 2);
    assert_eq!(collected[0].bar.open, dec!(100));
    assert_eq!(collected[0].bar.close, dec!(101));
    assert_eq!(collected[1].bar.open, dec!(103));
    assert_eq!(collected[1].bar.close, dec!(102));
    assert_eq!(collected[1].start, minute_start() + Duration::minutes(1));
}
