use std::{fs, sync::Arc};

use anyhow::Context;
use bigdecimal::BigDecimal;
use jemallocator::Jemalloc;
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use simple_logger::SimpleLogger;
use tokio::task::JoinSet;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use poolmetrics::{
    db::models::{PoolEvent, Token},
    normalize, parse_logs, ChainRegistry, EventProcessor, MemoryStore, RawLog, Settings,
};

/// Token entry of the tokens file. Prices come from an external source.
#[derive(Debug, Deserialize)]
struct TokenEntry {
    chain_id: u64,
    address: String,
    symbol: String,
    name: String,
    decimals: u8,
    #[serde(default)]
    price_usd: BigDecimal,
    #[serde(default)]
    price_updated_at: Option<i64>,
}

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    SimpleLogger::new()
        .with_level(settings.logging.level_filter())
        .init()
        .context("Failed to initialize logger")?;

    let registry = Arc::new(ChainRegistry::from_settings(&settings));
    let store = Arc::new(MemoryStore::new());

    let seeded = seed_tokens(&store, &registry, &settings.replay.tokens_path).await?;
    info!("Seeded {} tokens for chains {:?}", seeded, registry.chain_ids());

    let raw_logs = read_raw_logs(&settings.replay.events_path)?;
    let parsed = parse_logs(&raw_logs);
    info!(
        "Decoded {} of {} logs ({} skipped)",
        parsed.parsed_logs.len(),
        raw_logs.len(),
        parsed.skipped
    );

    let processor = Arc::new(EventProcessor::new(store.clone(), registry.clone()));
    let streams = by_pool(parsed.parsed_logs.into_iter().map(normalize));
    info!("Replaying {} pool streams", streams.len());

    let (processed, failed) = replay(processor, streams).await?;
    info!("Processed {} events, {} failed", processed, failed);

    for pool in store.pools().await {
        info!(
            "{} {} [{:?}] tvl=${} volume=${} fees=${} swaps={} apr24h={}% apr7d={}%",
            pool.protocol,
            pool.id,
            pool.composition,
            pool.total_value_locked_usd.round(2),
            pool.total_volume_usd.round(2),
            pool.total_fees_usd.round(2),
            pool.swap_count,
            pool.yearly_yield_24h.round(4),
            pool.yearly_yield_7d.round(4),
        );
    }

    Ok(())
}

/// Native currencies from the registry, then the tokens file. File entries win.
async fn seed_tokens(
    store: &MemoryStore,
    registry: &ChainRegistry,
    path: &str,
) -> anyhow::Result<usize> {
    let mut count = 0;
    for chain_id in registry.chain_ids() {
        store.put_token(registry.native_token(chain_id)?).await;
        count += 1;
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read tokens file {}", path))?;
    let entries: Vec<TokenEntry> =
        serde_json::from_str(&content).with_context(|| format!("Invalid tokens file {}", path))?;

    for entry in entries {
        let token = Token::new(
            entry.chain_id,
            &entry.address,
            entry.symbol,
            entry.name,
            entry.decimals,
        )
        .with_price(entry.price_usd, entry.price_updated_at);
        store.put_token(token).await;
        count += 1;
    }

    Ok(count)
}

/// One raw log per line; blank lines are ignored.
fn read_raw_logs(path: &str) -> anyhow::Result<Vec<RawLog>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read events file {}", path))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid log at {}:{}", path, i + 1))
        })
        .collect()
}

/// Split the ordered feed into per-pool streams, keeping order within each.
fn by_pool(events: impl Iterator<Item = PoolEvent>) -> Vec<Vec<PoolEvent>> {
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut streams: Vec<Vec<PoolEvent>> = Vec::new();

    for event in events {
        let slot = *index.entry(event.pool_id()).or_insert_with(|| {
            streams.push(Vec::new());
            streams.len() - 1
        });
        streams[slot].push(event);
    }

    streams
}

/// Replay every pool stream concurrently. Failed events are logged and skipped.
async fn replay(
    processor: Arc<EventProcessor<MemoryStore>>,
    streams: Vec<Vec<PoolEvent>>,
) -> anyhow::Result<(usize, usize)> {
    let mut tasks = JoinSet::new();

    for events in streams {
        let processor = processor.clone();
        tasks.spawn(async move {
            let mut processed = 0;
            let mut failed = 0;
            for event in events {
                match processor.process(&event).await {
                    Ok(_) => processed += 1,
                    Err(e) => {
                        warn!(
                            "Failed to process {} for {} at {}:{}: {}",
                            event.name(),
                            event.pool_id(),
                            event.block_number,
                            event.log_index,
                            e
                        );
                        failed += 1;
                    },
                }
            }
            (processed, failed)
        });
    }

    let mut totals = (0, 0);
    while let Some(result) = tasks.join_next().await {
        let (processed, failed) = result.context("Replay task panicked")?;
        totals.0 += processed;
        totals.1 += failed;
    }

    Ok(totals)
}
