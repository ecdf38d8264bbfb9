//! Aggregation Engine Binary
//!
//! Runs the consolidation engine against a synthetic random-walk tick
//! feed, or replays a JSON-lines tick file, and logs completed bars.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin aggregation-engine
//! ```
//!
//! # Environment Variables
//!
//! - `AGG_SYMBOLS`: comma-separated instruments (default: SPY,QQQ,TLT)
//! - `AGG_RESOLUTION`: bar resolution (default: minute)
//! - `AGG_TICK_INTERVAL_MS`: synthetic tick interval (default: 250)
//! - `AGG_REPLAY_FILE`: JSON-lines tick file to replay instead
//! - `RUST_LOG`: log filter (default: info)

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use aggregation_engine::application::ports::DataProvider;
use aggregation_engine::infrastructure::config::EngineConfig;
use aggregation_engine::infrastructure::providers::LocalFileDataProvider;
use aggregation_engine::infrastructure::telemetry;
use aggregation_engine::{
    AggregationManager, DataKind, InstrumentId, MarketData, NewDataReceiver, Resolution,
    ScannableEnumerator, SubscriptionConfig, TickType, new_data_channel,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Starting price for synthetic feeds, in cents.
const SYNTHETIC_START_CENTS: i64 = 10_000;

/// One tick in a replay file.
#[derive(Debug, Deserialize)]
struct ReplayTick {
    symbol: String,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    price: Decimal,
    size: u64,
    #[serde(default)]
    suspicious: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    telemetry::init();

    tracing::info!("Starting aggregation engine");

    let config = EngineConfig::from_env()?;
    tracing::info!(
        symbols = ?config.symbols,
        resolution = ?config.resolution,
        tick_interval_ms = config.tick_interval.as_millis() as u64,
        replay = ?config.replay_file,
        "Configuration loaded"
    );

    let manager = Arc::new(AggregationManager::new());
    let (notify_tx, notify_rx) = new_data_channel();

    // Each symbol gets consolidated trade bars plus the raw tick stream.
    let mut enumerators: HashMap<InstrumentId, Vec<Arc<ScannableEnumerator>>> = HashMap::new();
    for symbol in &config.symbols {
        let instrument = InstrumentId::new(symbol);
        let bars = manager.add(
            SubscriptionConfig::new(
                instrument.clone(),
                DataKind::TradeBar,
                config.resolution,
                TickType::Trade,
            ),
            notify_tx.clone(),
        );
        let ticks = manager.add(
            SubscriptionConfig::new(
                instrument.clone(),
                DataKind::Tick,
                Resolution::Tick,
                TickType::Trade,
            ),
            notify_tx.clone(),
        );
        enumerators.insert(instrument, vec![bars, ticks]);
    }

    let shutdown = CancellationToken::new();

    let producer = tokio::spawn(run_producer(
        Arc::clone(&manager),
        config.clone(),
        shutdown.clone(),
    ));
    let consumer = tokio::spawn(run_consumer(enumerators, notify_rx, shutdown.clone()));

    shutdown_signal().await;
    shutdown.cancel();

    let _ = producer.await;
    let _ = consumer.await;

    manager.dispose();
    let stats = manager.stats();
    tracing::info!(
        instruments = stats.instrument_count,
        subscriptions = stats.subscription_count,
        "Aggregation engine stopped"
    );
    Ok(())
}

/// Feed ticks into the manager until cancelled.
async fn run_producer(
    manager: Arc<AggregationManager>,
    config: EngineConfig,
    shutdown: CancellationToken,
) {
    match &config.replay_file {
        Some(path) => match load_replay_ticks(path).await {
            Ok(ticks) => replay_feed(&manager, ticks, &config, &shutdown).await,
            Err(err) => tracing::error!(error = %err, "Failed to load replay file"),
        },
        None => synthetic_feed(&manager, &config, &shutdown).await,
    }
}

/// Random-walk trade ticks for every configured symbol.
async fn synthetic_feed(
    manager: &AggregationManager,
    config: &EngineConfig,
    shutdown: &CancellationToken,
) {
    let mut prices: HashMap<String, i64> = config
        .symbols
        .iter()
        .map(|s| (s.clone(), SYNTHETIC_START_CENTS))
        .collect();
    let mut interval = tokio::time::interval(config.tick_interval);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        for symbol in &config.symbols {
            let (price, size, suspicious) = {
                let mut rng = rand::rng();
                let cents = prices
                    .entry(symbol.clone())
                    .and_modify(|c| *c = (*c + rng.random_range(-5..=5)).max(1))
                    .or_insert(SYNTHETIC_START_CENTS);
                (
                    Decimal::new(*cents, 2),
                    rng.random_range(1..=500),
                    // Rare outlier to exercise the suspicious-tick filter.
                    rng.random_range(0..500) == 0,
                )
            };

            manager.update(&MarketData::TradeTick {
                instrument: InstrumentId::new(symbol),
                time: Utc::now(),
                price,
                size,
                suspicious,
            });
        }
    }
}

/// Replay pre-recorded ticks at the configured interval.
async fn replay_feed(
    manager: &AggregationManager,
    ticks: Vec<ReplayTick>,
    config: &EngineConfig,
    shutdown: &CancellationToken,
) {
    let mut interval = tokio::time::interval(config.tick_interval);
    for tick in ticks {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        manager.update(&MarketData::TradeTick {
            instrument: InstrumentId::new(&tick.symbol),
            time: tick.time.unwrap_or_else(Utc::now),
            price: tick.price,
            size: tick.size,
            suspicious: tick.suspicious,
        });
    }
    tracing::info!("Replay complete");
}

/// Load and parse a JSON-lines tick file.
async fn load_replay_ticks(path: &Path) -> anyhow::Result<Vec<ReplayTick>> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let key = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("replay path has no file name: {}", path.display()))?;

    let provider = LocalFileDataProvider::new(base);
    let bytes = provider
        .fetch(key)
        .await?
        .ok_or_else(|| anyhow::anyhow!("replay file not found: {}", path.display()))?;

    let text = String::from_utf8(bytes)?;
    let mut ticks = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        ticks.push(serde_json::from_str::<ReplayTick>(line)?);
    }
    tracing::info!(count = ticks.len(), "Loaded replay ticks");
    Ok(ticks)
}

/// Drain enumerators whenever an instrument signals new data.
async fn run_consumer(
    enumerators: HashMap<InstrumentId, Vec<Arc<ScannableEnumerator>>>,
    mut notify_rx: NewDataReceiver,
    shutdown: CancellationToken,
) {
    loop {
        let instrument = tokio::select! {
            () = shutdown.cancelled() => break,
            received = notify_rx.recv() => match received {
                Some(instrument) => instrument,
                None => break,
            },
        };

        let Some(subscriptions) = enumerators.get(&instrument) else {
            continue;
        };

        for enumerator in subscriptions {
            while enumerator.move_next() {
                match enumerator.current() {
                    Some(data) => tracing::info!(
                        instrument = %instrument,
                        data = ?data,
                        "Consolidated output"
                    ),
                    None => break,
                }
            }
        }
    }
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed: a process that cannot
/// respond to termination signals is worse than one that fails fast at
/// startup.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
