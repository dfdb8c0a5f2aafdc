mod chain;
mod event;
mod pool;
mod pool_snapshot;
mod token;

pub use chain::{ChainTokens, NativeTokenMetadata};
pub use event::{PoolEvent, PoolEventKind};
pub use pool::{Pool, PoolComposition, Protocol, VolumeConvention};
pub use pool_snapshot::{PoolSnapshot, SnapshotInterval};
pub use token::Token;
