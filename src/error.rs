//! Error types for the accounting engine.
//!
//! `EngineError` is what every fallible engine operation returns. A failure
//! aborts the processing of the triggering event only; nothing is written to
//! the store for that event.

use thiserror::Error;

use crate::db::models::Protocol;

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Configuration or data mismatches. Always fatal for the computation that
/// raised them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No stable asset in pair {token0}/{token1}")]
    NoStableToken { token0: String, token1: String },

    #[error("No wrapped native asset in pair {token0}/{token1}")]
    NoWrappedNative { token0: String, token1: String },

    #[error("No native asset in pair {token0}/{token1}")]
    NoNativeToken { token0: String, token1: String },

    #[error("Token {token} is not part of pool {pool}")]
    TokenNotInPool { pool: String, token: String },

    #[error("Pool {pool} has identical tokens {token}")]
    IdenticalTokens { pool: String, token: String },

    #[error("Chain {0} is not supported")]
    UnsupportedChain(u64),

    #[error("{protocol} is not configured on chain {chain_id}")]
    NotConfigured { protocol: Protocol, chain_id: u64 },

    #[error("Pool {pool} emitted by {factory}, expected {expected}")]
    UnexpectedFactory {
        pool: String,
        factory: String,
        expected: String,
    },
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
