//! Per-event accounting and snapshot upserts.
//!
//! Every event is computed fully in memory and written back with a single
//! [`EntityStore::commit`]. A failure anywhere leaves the store untouched for
//! that event. Events of the same pool are serialized; different pools run
//! concurrently.

use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use log::debug;
use num_bigint::BigInt;
use num_traits::Zero;
use rustc_hash::FxHashMap;

use crate::{
    commons::{
        calculate_day_yearly_yield, calculate_fee_yield, calculate_hour_yearly_yield,
        calculate_yearly_yield_from_accumulated, classify_pool, find_stable_token,
        get_liquidity_inflow_and_outflow_from_raw_amounts, get_swap_fees_from_raw_amounts,
        get_swap_volume, FlowResult, SwapFees, SwapVolume,
    },
    config::ChainRegistry,
    db::{
        entity_id,
        models::{
            Pool, PoolComposition, PoolEvent, PoolEventKind, PoolSnapshot, SnapshotInterval,
            Token,
        },
        EntityStore, EntityWrites,
    },
    error::{DomainError, EngineError, EngineResult},
    utils::{
        amounts_for_liquidity_delta, bucket_index, get_bucket_ago, is_more_than_hours_ago,
        snapshot_id, BucketLookup,
    },
};

/// Token prices older than this are reported as stale.
const STALE_PRICE_HOURS: i64 = 24;

/// Rolling yield windows: (lookback, interval, days annualized over)
const ROLLING_24H: (i64, SnapshotInterval, u32) = (24, SnapshotInterval::Hourly, 1);
const ROLLING_7D: (i64, SnapshotInterval, u32) = (7, SnapshotInterval::Daily, 7);
const ROLLING_30D: (i64, SnapshotInterval, u32) = (30, SnapshotInterval::Daily, 30);

/// Entities written for one processed event.
#[derive(Debug, Clone)]
pub struct EventOutcome {
    pub pool: Pool,
    /// Present for events that move tokens
    pub hourly: Option<PoolSnapshot>,
    pub daily: Option<PoolSnapshot>,
}

/// Swap contribution to a snapshot.
struct SwapDelta {
    volume: SwapVolume,
    fees: SwapFees,
}

pub struct EventProcessor<S: EntityStore> {
    store: Arc<S>,
    registry: Arc<ChainRegistry>,
    pool_locks: Mutex<FxHashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: EntityStore> EventProcessor<S> {
    pub fn new(store: Arc<S>, registry: Arc<ChainRegistry>) -> Self {
        Self {
            store,
            registry,
            pool_locks: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn pool_lock(&self, pool_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.pool_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(pool_id.to_string()).or_default().clone()
    }

    /// Drop the pool's lock entry once no other event holds or waits on it.
    fn release_pool_lock(&self, pool_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.pool_locks.lock().unwrap_or_else(|e| e.into_inner());
        // Clones are only taken under the map lock: the map and `lock` are the last holders
        let idle = locks
            .get(pool_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(pool_id);
        }
        drop(lock);
    }

    /// Apply one event and persist the result.
    ///
    /// Returns the pool and snapshots as committed.
    pub async fn process(&self, event: &PoolEvent) -> EngineResult<EventOutcome> {
        let pool_id = event.pool_id();
        let lock = self.pool_lock(&pool_id);
        let result = {
            let _guard = lock.lock().await;
            self.process_locked(event, &pool_id).await
        };
        self.release_pool_lock(&pool_id, lock);
        result
    }

    async fn process_locked(
        &self,
        event: &PoolEvent,
        pool_id: &str,
    ) -> EngineResult<EventOutcome> {
        let outcome = match &event.kind {
            PoolEventKind::Created { .. } => match self.store.get_pool(pool_id).await? {
                Some(existing) => {
                    debug!("Pool {} already exists, ignoring creation", pool_id);
                    return Ok(EventOutcome {
                        pool: existing,
                        hourly: None,
                        daily: None,
                    });
                },
                None => EventOutcome {
                    pool: self.create_pool(event).await?,
                    hourly: None,
                    daily: None,
                },
            },
            _ => {
                let pool = self
                    .store
                    .get_pool(pool_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Pool", pool_id))?;
                self.apply(event, pool).await?
            },
        };

        let writes = EntityWrites {
            pool: Some(outcome.pool.clone()),
            snapshots: outcome
                .hourly
                .iter()
                .chain(outcome.daily.iter())
                .cloned()
                .collect(),
        };
        self.store.commit(writes).await?;

        Ok(outcome)
    }

    async fn load_token(&self, id: &str) -> EngineResult<Token> {
        let token = self
            .store
            .get_token(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Token", id))?;

        if let Some(updated_at) = token.price_updated_at {
            if is_more_than_hours_ago(updated_at, STALE_PRICE_HOURS) {
                debug!("Price of {} is older than {}h", token.id, STALE_PRICE_HOURS);
            }
        }

        Ok(token)
    }

    async fn create_pool(&self, event: &PoolEvent) -> EngineResult<Pool> {
        let PoolEventKind::Created {
            protocol,
            factory,
            token0,
            token1,
            fee,
            tick_spacing,
            hooks,
            initial_price,
        } = &event.kind
        else {
            return Err(EngineError::not_found("Pool", event.pool_id()));
        };

        let expected = self.registry.deployment(*protocol, event.chain_id)?;
        if !factory.eq_ignore_ascii_case(expected) {
            return Err(DomainError::UnexpectedFactory {
                pool: event.pool_id(),
                factory: factory.to_lowercase(),
                expected: expected.to_string(),
            }
            .into());
        }
        let chain_tokens = self.registry.chain_tokens(event.chain_id)?;

        let token0 = self.load_token(&entity_id(event.chain_id, token0)).await?;
        let token1 = self.load_token(&entity_id(event.chain_id, token1)).await?;
        if token0.id == token1.id {
            return Err(DomainError::IdenticalTokens {
                pool: event.pool_id(),
                token: token0.id,
            }
            .into());
        }

        let mut pool = Pool::new(
            event.chain_id,
            &event.pool_address,
            *protocol,
            &token0,
            &token1,
            event.timestamp,
        );
        pool.composition = classify_pool(&token0, &token1, chain_tokens);
        if pool.composition == PoolComposition::VariableWithStable {
            let stable = find_stable_token(&token0, &token1, chain_tokens)?;
            pool.stable_token = Some(stable.id.clone());
        }
        if let Some(fee) = fee {
            pool.fee = *fee;
        }
        pool.tick_spacing = *tick_spacing;
        pool.hooks = hooks.clone();
        if let Some((sqrt_price_x96, tick)) = initial_price {
            pool.sqrt_price_x96 = Some(sqrt_price_x96.clone());
            pool.tick = Some(*tick);
        }

        debug!(
            "Created {} pool {} ({:?}) at {}",
            protocol, pool.id, pool.composition, event.timestamp
        );
        Ok(pool)
    }

    async fn apply(&self, event: &PoolEvent, mut pool: Pool) -> EngineResult<EventOutcome> {
        let (amount0, amount1) = match &event.kind {
            PoolEventKind::Swap {
                amount0, amount1, ..
            }
            | PoolEventKind::Liquidity { amount0, amount1 } => (amount0.clone(), amount1.clone()),
            PoolEventKind::RangeLiquidity {
                liquidity_delta,
                tick_lower,
                tick_upper,
            } => match pool.tick {
                Some(tick) => {
                    amounts_for_liquidity_delta(liquidity_delta, tick, *tick_lower, *tick_upper)
                },
                None => {
                    debug!("Pool {} has no tick yet, liquidity change ignored", pool.id);
                    (BigInt::zero(), BigInt::zero())
                },
            },
            _ => {
                apply_state_change(&mut pool, &event.kind);
                return Ok(EventOutcome {
                    pool,
                    hourly: None,
                    daily: None,
                });
            },
        };

        let token0 = self.load_token(&pool.token0).await?;
        let token1 = self.load_token(&pool.token1).await?;

        let flows =
            get_liquidity_inflow_and_outflow_from_raw_amounts(&amount0, &amount1, &token0, &token1);
        pool.apply_flows(&flows, &token0, &token1);

        let swap = match &event.kind {
            PoolEventKind::Swap {
                sqrt_price_x96,
                tick,
                fee,
                ..
            } => {
                let volume =
                    get_swap_volume(pool.protocol.volume_convention(), &flows, &token0, &token1);
                let fee_rate = fee.unwrap_or(pool.fee);
                let fees =
                    get_swap_fees_from_raw_amounts(&amount0, &amount1, fee_rate, &token0, &token1);

                pool.apply_swap(&volume, &fees);
                pool.update_price_state(*tick, sqrt_price_x96.clone());
                pool.accumulated_yield +=
                    calculate_fee_yield(&pool.total_value_locked_usd, &fees.fees_usd);

                Some(SwapDelta { volume, fees })
            },
            _ => None,
        };

        let hourly = self
            .upsert_snapshot(
                &mut pool,
                SnapshotInterval::Hourly,
                event.timestamp,
                &flows,
                swap.as_ref(),
            )
            .await?;
        let daily = self
            .upsert_snapshot(
                &mut pool,
                SnapshotInterval::Daily,
                event.timestamp,
                &flows,
                swap.as_ref(),
            )
            .await?;

        self.update_rolling_yields(&mut pool, event.timestamp).await?;

        Ok(EventOutcome {
            pool,
            hourly: Some(hourly),
            daily: Some(daily),
        })
    }

    /// Load or create the snapshot containing `timestamp` and fold this
    /// event into it.
    ///
    /// A new snapshot opens with the closing TVL of the pool's latest snapshot
    /// of the same interval.
    async fn upsert_snapshot(
        &self,
        pool: &mut Pool,
        interval: SnapshotInterval,
        timestamp: i64,
        flows: &FlowResult,
        swap: Option<&SwapDelta>,
    ) -> EngineResult<PoolSnapshot> {
        let index = bucket_index(timestamp, pool.created_at_timestamp, interval);
        let id = snapshot_id(pool, index);

        let mut snapshot = match self.store.get_snapshot(interval, &id).await? {
            Some(snapshot) => snapshot,
            None => {
                let last_id = match interval {
                    SnapshotInterval::Hourly => pool.last_hourly_snapshot.clone(),
                    SnapshotInterval::Daily => pool.last_daily_snapshot.clone(),
                };
                let previous = match last_id {
                    Some(last_id) => self.store.get_snapshot(interval, &last_id).await?,
                    None => None,
                };
                let opening = previous
                    .as_ref()
                    .map(|p| p.total_value_locked_usd.clone())
                    .unwrap_or_default();

                // Late events for an older bucket do not move the pointer back
                if previous.as_ref().map_or(true, |p| p.bucket_index < index) {
                    match interval {
                        SnapshotInterval::Hourly => pool.last_hourly_snapshot = Some(id.clone()),
                        SnapshotInterval::Daily => pool.last_daily_snapshot = Some(id.clone()),
                    }
                }

                PoolSnapshot::new(id, pool, interval, index, opening)
            },
        };

        snapshot.add_flows(flows);
        if let Some(swap) = swap {
            snapshot.add_swap(&swap.volume, &swap.fees);
        }
        snapshot.close_with(pool);
        snapshot.yearly_yield = match interval {
            SnapshotInterval::Hourly => {
                calculate_hour_yearly_yield(&snapshot.total_value_locked_usd, &snapshot.fees_usd)
            },
            SnapshotInterval::Daily => {
                calculate_day_yearly_yield(&snapshot.total_value_locked_usd, &snapshot.fees_usd)
            },
        };

        Ok(snapshot)
    }

    /// Annualized yield of the pool over a trailing window, or `None` when the
    /// pool is younger than the window.
    async fn rolling_yield(
        &self,
        pool: &Pool,
        timestamp: i64,
        (lookback, interval, days): (i64, SnapshotInterval, u32),
    ) -> EngineResult<Option<BigDecimal>> {
        let basis = match get_bucket_ago(lookback, timestamp, self.store.as_ref(), pool, interval)
            .await?
        {
            BucketLookup::NotYetElapsed => return Ok(None),
            BucketLookup::NotFound => BigDecimal::zero(),
            BucketLookup::Found(snapshot) => snapshot.accumulated_yield,
        };

        let accumulated = &pool.accumulated_yield - basis;
        Ok(Some(calculate_yearly_yield_from_accumulated(days, &accumulated)))
    }

    async fn update_rolling_yields(&self, pool: &mut Pool, timestamp: i64) -> EngineResult<()> {
        if let Some(value) = self.rolling_yield(pool, timestamp, ROLLING_24H).await? {
            pool.yearly_yield_24h = value;
        }
        if let Some(value) = self.rolling_yield(pool, timestamp, ROLLING_7D).await? {
            pool.yearly_yield_7d = value;
        }
        if let Some(value) = self.rolling_yield(pool, timestamp, ROLLING_30D).await? {
            pool.yearly_yield_30d = value;
        }
        Ok(())
    }
}

/// Events that only change protocol state.
fn apply_state_change(pool: &mut Pool, kind: &PoolEventKind) {
    match kind {
        PoolEventKind::Initialize {
            sqrt_price_x96,
            tick,
        } => {
            pool.sqrt_price_x96 = Some(sqrt_price_x96.clone());
            pool.tick = Some(*tick);
        },
        PoolEventKind::FeeChange { fee } => pool.fee = *fee,
        PoolEventKind::TickSpacingChange { tick_spacing } => {
            pool.tick_spacing = Some(*tick_spacing)
        },
        PoolEventKind::PluginChange { plugin } => pool.plugin = Some(plugin.clone()),
        PoolEventKind::PluginConfigChange { plugin_config } => {
            pool.plugin_config = Some(*plugin_config)
        },
        PoolEventKind::Created { .. }
        | PoolEventKind::Swap { .. }
        | PoolEventKind::Liquidity { .. }
        | PoolEventKind::RangeLiquidity { .. } => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Settings, TEST_SETTINGS},
        db::{models::Protocol, MemoryStore},
        utils::{SECONDS_PER_DAY, SECONDS_PER_HOUR, ZERO_ADDRESS},
    };
    use num_traits::Signed;
    use std::str::FromStr;

    const V3_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";
    const V4_MANAGER: &str = "0x000000000004444c5dc75cB358380D2e3dE08A90";
    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const PEPE: &str = "0x6982508145454ce325ddbe47a25d4ec3d2311933";
    const POOL: &str = "0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640";
    const CREATED: i64 = 1_735_139_990;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn weth(amount: i64) -> BigInt {
        BigInt::from(amount) * BigInt::from(10u64.pow(18))
    }

    fn usdc(amount: i64) -> BigInt {
        BigInt::from(amount) * BigInt::from(10u64.pow(6))
    }

    async fn setup() -> EventProcessor<MemoryStore> {
        let store = MemoryStore::new();
        store
            .put_token(
                Token::new(1, WETH, "WETH".into(), "Wrapped Ether".into(), 18)
                    .with_price(dec("2000"), None),
            )
            .await;
        store
            .put_token(
                Token::new(1, USDC, "USDC".into(), "USD Coin".into(), 6)
                    .with_price(dec("1"), None),
            )
            .await;
        store
            .put_token(
                Token::new(1, ZERO_ADDRESS, "ETH".into(), "Ether".into(), 18)
                    .with_price(dec("2000"), None),
            )
            .await;

        let registry =
            ChainRegistry::from_settings(&Settings::from_yaml(TEST_SETTINGS).unwrap());
        EventProcessor::new(Arc::new(store), Arc::new(registry))
    }

    fn event(pool: &str, timestamp: i64, kind: PoolEventKind) -> PoolEvent {
        PoolEvent {
            chain_id: 1,
            pool_address: pool.to_string(),
            block_number: 1,
            log_index: 0,
            timestamp,
            kind,
        }
    }

    fn v3_created(factory: &str, token0: &str, token1: &str) -> PoolEvent {
        event(
            POOL,
            CREATED,
            PoolEventKind::Created {
                protocol: Protocol::UniswapV3,
                factory: factory.to_string(),
                token0: token0.to_string(),
                token1: token1.to_string(),
                fee: Some(3000),
                tick_spacing: Some(60),
                hooks: None,
                initial_price: None,
            },
        )
    }

    fn swap(timestamp: i64, amount0: BigInt, amount1: BigInt) -> PoolEvent {
        event(
            POOL,
            timestamp,
            PoolEventKind::Swap {
                amount0,
                amount1,
                sqrt_price_x96: Some("1".to_string()),
                tick: Some(100),
                fee: None,
            },
        )
    }

    fn mint(timestamp: i64, amount0: BigInt, amount1: BigInt) -> PoolEvent {
        event(POOL, timestamp, PoolEventKind::Liquidity { amount0, amount1 })
    }

    /// Pool seeded with 10 WETH + 20000 USDC ($40000 TVL).
    async fn seeded() -> EventProcessor<MemoryStore> {
        let processor = setup().await;
        processor.process(&v3_created(V3_FACTORY, WETH, USDC)).await.unwrap();
        processor
            .process(&mint(CREATED + 10, weth(10), usdc(20_000)))
            .await
            .unwrap();
        processor
    }

    #[tokio::test]
    async fn test_created_pool_is_classified() {
        let processor = setup().await;
        let outcome = processor.process(&v3_created(V3_FACTORY, WETH, USDC)).await.unwrap();

        let pool = outcome.pool;
        assert_eq!(pool.id, format!("1-{}", POOL));
        assert_eq!(pool.composition, PoolComposition::VariableWithStable);
        assert_eq!(pool.stable_token, Some(format!("1-{}", USDC)));
        assert_eq!(pool.fee, 3000);
        assert_eq!(pool.created_at_timestamp, CREATED);
        assert!(outcome.hourly.is_none());
        assert_eq!(processor.store().pools().await, vec![pool]);
    }

    #[tokio::test]
    async fn test_creation_errors_write_nothing() {
        let processor = setup().await;

        let err = processor
            .process(&v3_created("0xdeadbeef", WETH, USDC))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::UnexpectedFactory { .. })
        ));

        let mut algebra = v3_created(V3_FACTORY, WETH, USDC);
        if let PoolEventKind::Created { protocol, .. } = &mut algebra.kind {
            *protocol = Protocol::Algebra;
        }
        let err = processor.process(&algebra).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::NotConfigured { .. })
        ));

        let err = processor
            .process(&v3_created(V3_FACTORY, WETH, PEPE))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "Token", .. }));

        let err = processor
            .process(&v3_created(V3_FACTORY, WETH, WETH))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::IdenticalTokens { .. })
        ));

        assert!(processor.store().pools().await.is_empty());
    }

    #[tokio::test]
    async fn test_event_for_unknown_pool_is_not_found() {
        let processor = setup().await;
        let err = processor
            .process(&swap(CREATED, weth(1), usdc(-2000)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "Pool", .. }));
        assert!(processor.store().pools().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_on_swap_writes_nothing() {
        let processor = setup().await;
        let weth_token = processor
            .store()
            .get_token(&format!("1-{}", WETH))
            .await
            .unwrap()
            .unwrap();
        let pepe_token = Token::new(1, PEPE, "PEPE".into(), "Pepe".into(), 18);
        let pool = Pool::new(1, POOL, Protocol::UniswapV3, &weth_token, &pepe_token, CREATED);
        processor.store().put_pool(pool.clone()).await;

        let err = processor
            .process(&swap(CREATED + 100, weth(1), BigInt::from(-1_000_000)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "Token", .. }));

        assert_eq!(processor.store().pools().await, vec![pool.clone()]);
        for interval in [SnapshotInterval::Hourly, SnapshotInterval::Daily] {
            assert!(processor
                .store()
                .pool_snapshots(interval, &pool.id)
                .await
                .is_empty());
        }
    }

    #[tokio::test]
    async fn test_pool_locks_are_released() {
        let processor = seeded().await;
        processor
            .process(&swap(CREATED + 100, weth(1), usdc(-2000)))
            .await
            .unwrap();
        processor
            .process(&event("0xunknown", CREATED, PoolEventKind::FeeChange { fee: 500 }))
            .await
            .unwrap_err();

        assert!(processor.pool_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mint_moves_tvl_and_opens_snapshots() {
        let processor = seeded().await;
        let pool = &processor.store().pools().await[0];

        assert_eq!(pool.total_value_locked_token0, dec("10"));
        assert_eq!(pool.total_value_locked_token1, dec("20000"));
        assert_eq!(pool.total_value_locked_usd, dec("40000"));
        assert_eq!(pool.total_inflow_usd, dec("40000"));
        assert_eq!(pool.swap_count, 0);

        let hourly = processor
            .store()
            .pool_snapshots(SnapshotInterval::Hourly, &pool.id)
            .await;
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly[0].id, format!("{}-0", pool.id));
        assert!(hourly[0].opening_total_value_locked_usd.is_zero());
        assert_eq!(hourly[0].total_value_locked_usd, dec("40000"));
        assert_eq!(hourly[0].inflow_usd, dec("40000"));
        assert_eq!(pool.last_hourly_snapshot, Some(hourly[0].id.clone()));
    }

    #[tokio::test]
    async fn test_swaps_accumulate_into_buckets() {
        let processor = seeded().await;

        // 1 WETH in, 2000 USDC out at 0.3%: $6 fee on the WETH leg
        let first = processor
            .process(&swap(CREATED + 100, weth(1), usdc(-2000)))
            .await
            .unwrap();
        assert_eq!(first.pool.total_fees_usd, dec("6"));
        assert_eq!(first.pool.total_volume_usd, dec("2000"));
        assert_eq!(first.pool.total_value_locked_usd, dec("40000"));
        assert_eq!(first.pool.accumulated_yield, dec("0.015"));
        assert_eq!(first.pool.tick, Some(100));

        let hour0 = first.hourly.unwrap();
        assert_eq!(hour0.fees_usd, dec("6"));
        assert_eq!(hour0.swap_count, 1);
        // 6 / 40000 * 24 * 365 * 100
        assert_eq!(hour0.yearly_yield, dec("131.4"));

        // Next hour, reverse direction: $6 fee on the USDC leg
        let second = processor
            .process(&swap(CREATED + 3_700, -weth(1), usdc(2000)))
            .await
            .unwrap();
        let hour1 = second.hourly.unwrap();
        assert_eq!(hour1.bucket_index, 1);
        assert_eq!(hour1.opening_total_value_locked_usd, dec("40000"));
        assert_eq!(hour1.fees_usd, dec("6"));
        assert_eq!(hour1.fees_token1, dec("6"));

        let daily = second.daily.unwrap();
        assert_eq!(daily.bucket_index, 0);
        assert_eq!(daily.fees_usd, dec("12"));
        assert_eq!(daily.swap_count, 2);
        assert_eq!(second.pool.swap_count, 2);
        assert_eq!(second.pool.accumulated_yield, dec("0.03"));
    }

    #[tokio::test]
    async fn test_hourly_fees_sum_to_pool_total() {
        let processor = seeded().await;

        let swaps = [
            (CREATED + 60, weth(1), usdc(-2000)),
            (CREATED + 1_800, -weth(1), usdc(2000)),
            (CREATED + 5_000, weth(2), usdc(-3990)),
            (CREATED + 9_000, -weth(1), usdc(1995)),
            (CREATED + 30_000, weth(1), usdc(-1990)),
        ];
        for (timestamp, amount0, amount1) in swaps {
            processor.process(&swap(timestamp, amount0, amount1)).await.unwrap();
        }

        let pool = &processor.store().pools().await[0];
        let hourly = processor
            .store()
            .pool_snapshots(SnapshotInterval::Hourly, &pool.id)
            .await;
        let daily = processor
            .store()
            .pool_snapshots(SnapshotInterval::Daily, &pool.id)
            .await;

        let hourly_fees: BigDecimal = hourly.iter().map(|s| s.fees_usd.clone()).sum();
        let hourly_volume: BigDecimal = hourly.iter().map(|s| s.volume_usd.clone()).sum();
        let hourly_swaps: u64 = hourly.iter().map(|s| s.swap_count).sum();

        assert_eq!(hourly.len(), 4);
        assert_eq!(daily.len(), 1);
        assert_eq!(hourly_fees, pool.total_fees_usd);
        assert_eq!(hourly_volume, pool.total_volume_usd);
        assert_eq!(hourly_swaps, pool.swap_count);
        assert_eq!(daily[0].fees_usd, pool.total_fees_usd);

        // Each new hour opens at the previous hour's close
        for pair in hourly.windows(2) {
            assert_eq!(
                pair[1].opening_total_value_locked_usd,
                pair[0].total_value_locked_usd
            );
        }
    }

    #[tokio::test]
    async fn test_rolling_yields() {
        let processor = seeded().await;

        processor
            .process(&swap(CREATED + 100, weth(1), usdc(-2000)))
            .await
            .unwrap();
        let early = processor
            .process(&swap(CREATED + SECONDS_PER_HOUR + 100, -weth(1), usdc(2000)))
            .await
            .unwrap();
        // Younger than a day: nothing to annualize yet
        assert!(early.pool.yearly_yield_24h.is_zero());

        // Hour 25 looks back to hour 1, which closed at 0.03 accumulated
        let later = processor
            .process(&swap(CREATED + 25 * SECONDS_PER_HOUR + 100, weth(1), usdc(-2000)))
            .await
            .unwrap();
        assert_eq!(later.pool.accumulated_yield, dec("0.045"));
        assert_eq!(later.pool.yearly_yield_24h, dec("5.475"));
        assert!(later.pool.yearly_yield_7d.is_zero());

        // Day 9 looks back to day 2, which has no snapshot: zero basis
        let week = processor
            .process(&swap(CREATED + 9 * SECONDS_PER_DAY + 100, -weth(1), usdc(2000)))
            .await
            .unwrap();
        assert_eq!(
            week.pool.yearly_yield_7d,
            calculate_yearly_yield_from_accumulated(7, &week.pool.accumulated_yield)
        );
        assert!(week.pool.yearly_yield_30d.is_zero());
    }

    #[tokio::test]
    async fn test_state_changes_update_pool_only() {
        let processor = seeded().await;

        let outcome = processor
            .process(&event(POOL, CREATED + 50, PoolEventKind::FeeChange { fee: 500 }))
            .await
            .unwrap();
        assert_eq!(outcome.pool.fee, 500);
        assert!(outcome.hourly.is_none());

        processor
            .process(&event(
                POOL,
                CREATED + 60,
                PoolEventKind::Initialize {
                    sqrt_price_x96: "79228162514264337593543950336".to_string(),
                    tick: 0,
                },
            ))
            .await
            .unwrap();

        // The new fee applies to later swaps: 1 WETH * 0.05% = $1
        let swapped = processor
            .process(&swap(CREATED + 70, weth(1), usdc(-2000)))
            .await
            .unwrap();
        assert_eq!(swapped.pool.total_fees_usd, dec("1"));
    }

    #[tokio::test]
    async fn test_v4_range_liquidity_uses_pool_tick() {
        let processor = setup().await;
        let manager_pool = "0x21c67e77068de97969ba93d4aab21826d33ca12bb9f565d8496e8fda8a82ca27";

        processor
            .process(&event(
                manager_pool,
                CREATED,
                PoolEventKind::Created {
                    protocol: Protocol::UniswapV4,
                    factory: V4_MANAGER.to_string(),
                    token0: ZERO_ADDRESS.to_string(),
                    token1: USDC.to_string(),
                    fee: Some(500),
                    tick_spacing: Some(10),
                    hooks: Some(ZERO_ADDRESS.to_string()),
                    initial_price: Some(("79228162514264337593543950336".to_string(), 0)),
                },
            ))
            .await
            .unwrap();

        let outcome = processor
            .process(&event(
                manager_pool,
                CREATED + 10,
                PoolEventKind::RangeLiquidity {
                    liquidity_delta: BigInt::from(1_000_000_000_000i64),
                    tick_lower: -100,
                    tick_upper: 100,
                },
            ))
            .await
            .unwrap();

        assert_eq!(outcome.pool.composition, PoolComposition::VariableWithStable);
        assert!(outcome.pool.total_value_locked_token0.is_positive());
        assert!(outcome.pool.total_value_locked_token1.is_positive());
        assert!(outcome.hourly.unwrap().inflow_usd.is_positive());
    }

    #[tokio::test]
    async fn test_concurrent_events_on_one_pool_are_serialized() {
        let processor = Arc::new(seeded().await);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let processor = processor.clone();
                tokio::spawn(async move {
                    processor
                        .process(&swap(CREATED + 100 + i, weth(1), usdc(-2000)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let pool = &processor.store().pools().await[0];
        assert_eq!(pool.swap_count, 8);
        assert_eq!(pool.total_fees_usd, dec("48"));
        let hourly = processor
            .store()
            .pool_snapshots(SnapshotInterval::Hourly, &pool.id)
            .await;
        assert_eq!(hourly[0].swap_count, 8);
        assert!(processor.pool_locks.lock().unwrap().is_empty());
    }
}
