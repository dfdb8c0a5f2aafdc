use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use crate::db::{
    models::{Pool, PoolSnapshot, SnapshotInterval, Token},
    EntityStore, EntityWrites,
};

#[derive(Default)]
struct MemoryState {
    tokens: FxHashMap<String, Token>,
    pools: FxHashMap<String, Pool>,
    hourly: FxHashMap<String, PoolSnapshot>,
    daily: FxHashMap<String, PoolSnapshot>,
}

impl MemoryState {
    fn snapshots(&self, interval: SnapshotInterval) -> &FxHashMap<String, PoolSnapshot> {
        match interval {
            SnapshotInterval::Hourly => &self.hourly,
            SnapshotInterval::Daily => &self.daily,
        }
    }

    fn snapshots_mut(
        &mut self,
        interval: SnapshotInterval,
    ) -> &mut FxHashMap<String, PoolSnapshot> {
        match interval {
            SnapshotInterval::Hourly => &mut self.hourly,
            SnapshotInterval::Daily => &mut self.daily,
        }
    }
}

/// In-process entity store.
///
/// All state sits behind one mutex, so a commit is visible all at once.
/// Used by the replay binary and the tests.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a token. Token metadata and prices come from outside
    /// the engine.
    pub async fn put_token(&self, token: Token) {
        self.state.lock().await.tokens.insert(token.id.clone(), token);
    }

    pub async fn put_pool(&self, pool: Pool) {
        self.state.lock().await.pools.insert(pool.id.clone(), pool);
    }

    pub async fn pools(&self) -> Vec<Pool> {
        let mut pools: Vec<Pool> = self.state.lock().await.pools.values().cloned().collect();
        pools.sort_by(|a, b| a.id.cmp(&b.id));
        pools
    }

    /// Snapshots of one pool ordered by bucket index.
    pub async fn pool_snapshots(
        &self,
        interval: SnapshotInterval,
        pool_id: &str,
    ) -> Vec<PoolSnapshot> {
        let state = self.state.lock().await;
        let mut snapshots: Vec<PoolSnapshot> = state
            .snapshots(interval)
            .values()
            .filter(|s| s.pool_id == pool_id)
            .cloned()
            .collect();
        snapshots.sort_by_key(|s| s.bucket_index);
        snapshots
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_token(&self, id: &str) -> anyhow::Result<Option<Token>> {
        Ok(self.state.lock().await.tokens.get(id).cloned())
    }

    async fn get_pool(&self, id: &str) -> anyhow::Result<Option<Pool>> {
        Ok(self.state.lock().await.pools.get(id).cloned())
    }

    async fn get_snapshot(
        &self,
        interval: SnapshotInterval,
        id: &str,
    ) -> anyhow::Result<Option<PoolSnapshot>> {
        Ok(self.state.lock().await.snapshots(interval).get(id).cloned())
    }

    async fn commit(&self, writes: EntityWrites) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        if let Some(pool) = writes.pool {
            state.pools.insert(pool.id.clone(), pool);
        }
        for snapshot in writes.snapshots {
            state
                .snapshots_mut(snapshot.interval)
                .insert(snapshot.id.clone(), snapshot);
        }
        Ok(())
    }
}
