//! Entity store interface.
//!
//! The persistent store is an external collaborator. The engine reads tokens,
//! pools and snapshots by id and hands back everything one event changed in a
//! single [`EntityWrites`] so the backend can apply it atomically.

use async_trait::async_trait;

pub mod memory;
pub mod models;

pub use memory::MemoryStore;

use models::{Pool, PoolSnapshot, SnapshotInterval, Token};

/// Canonical store key for chain-scoped entities: "{chain_id}-{address}" lowercase.
pub fn entity_id(chain_id: u64, address: &str) -> String {
    format!("{}-{}", chain_id, address.to_lowercase())
}

/// All writes produced by processing one event.
#[derive(Debug, Clone, Default)]
pub struct EntityWrites {
    pub pool: Option<Pool>,
    pub snapshots: Vec<PoolSnapshot>,
}

/// Read/write access to the entity store.
///
/// Lookups return `Ok(None)` for missing entities; backend failures are
/// reported through `anyhow`. `commit` must apply all writes or none of them.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_token(&self, id: &str) -> anyhow::Result<Option<Token>>;

    async fn get_pool(&self, id: &str) -> anyhow::Result<Option<Pool>>;

    async fn get_snapshot(
        &self,
        interval: SnapshotInterval,
        id: &str,
    ) -> anyhow::Result<Option<PoolSnapshot>>;

    async fn commit(&self, writes: EntityWrites) -> anyhow::Result<()>;
}
