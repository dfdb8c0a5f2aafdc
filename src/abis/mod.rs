pub mod algebra;
pub mod v2;
pub mod v3;
pub mod v4;

pub use algebra::{
    Fee as AlgebraFee, Plugin as AlgebraPlugin, PluginConfig as AlgebraPluginConfig,
    Pool as AlgebraPool, TickSpacing as AlgebraTickSpacing,
};
pub use v2::{Burn as V2Burn, Mint as V2Mint, PairCreated, Swap as V2Swap};
pub use v3::{Collect, Initialize as V3Initialize, Mint as V3Mint, PoolCreated, Swap as V3Swap};
pub use v4::{Initialize as V4Initialize, ModifyLiquidity, Swap as V4Swap};
