pub mod abis;
pub mod commons;
pub mod config;
pub mod db;
pub mod error;
pub mod utils;
pub mod worker;

pub use config::{ChainRegistry, Settings};
pub use db::{EntityStore, EntityWrites, MemoryStore};
pub use error::{DomainError, EngineError, EngineResult};
pub use worker::{normalize, parse_logs, EventOutcome, EventProcessor, RawLog};
