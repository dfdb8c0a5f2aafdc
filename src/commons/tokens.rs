//! Token and pool composition classification.
//!
//! All address comparisons are case-insensitive. The `find_*` helpers prefer
//! token0 when both sides qualify.

use bigdecimal::BigDecimal;

use crate::{
    db::models::{ChainTokens, Pool, PoolComposition, Token},
    error::{DomainError, EngineResult},
};

pub fn is_stable(token: &Token, chain: &ChainTokens) -> bool {
    chain.is_stable(&token.address)
}

pub fn is_wrapped_native(token: &Token, chain: &ChainTokens) -> bool {
    chain.is_wrapped_native(&token.address)
}

pub fn is_native(token: &Token) -> bool {
    ChainTokens::is_native(&token.address)
}

/// Both tokens are stablecoins.
pub fn is_stable_pool(token0: &Token, token1: &Token, chain: &ChainTokens) -> bool {
    is_stable(token0, chain) && is_stable(token1, chain)
}

/// Exactly one token is a stablecoin.
pub fn is_variable_with_stable_pool(token0: &Token, token1: &Token, chain: &ChainTokens) -> bool {
    is_stable(token0, chain) ^ is_stable(token1, chain)
}

pub fn is_wrapped_native_pool(token0: &Token, token1: &Token, chain: &ChainTokens) -> bool {
    is_wrapped_native(token0, chain) || is_wrapped_native(token1, chain)
}

pub fn is_native_pool(token0: &Token, token1: &Token) -> bool {
    is_native(token0) || is_native(token1)
}

pub fn find_stable_token<'a>(
    token0: &'a Token,
    token1: &'a Token,
    chain: &ChainTokens,
) -> Result<&'a Token, DomainError> {
    pick(token0, token1, |t| is_stable(t, chain)).ok_or_else(|| DomainError::NoStableToken {
        token0: token0.id.clone(),
        token1: token1.id.clone(),
    })
}

pub fn find_wrapped_native<'a>(
    token0: &'a Token,
    token1: &'a Token,
    chain: &ChainTokens,
) -> Result<&'a Token, DomainError> {
    pick(token0, token1, |t| is_wrapped_native(t, chain)).ok_or_else(|| {
        DomainError::NoWrappedNative {
            token0: token0.id.clone(),
            token1: token1.id.clone(),
        }
    })
}

pub fn find_native_token<'a>(
    token0: &'a Token,
    token1: &'a Token,
) -> Result<&'a Token, DomainError> {
    pick(token0, token1, is_native).ok_or_else(|| DomainError::NoNativeToken {
        token0: token0.id.clone(),
        token1: token1.id.clone(),
    })
}

fn pick<'a>(
    token0: &'a Token,
    token1: &'a Token,
    qualifies: impl Fn(&Token) -> bool,
) -> Option<&'a Token> {
    if qualifies(token0) {
        Some(token0)
    } else if qualifies(token1) {
        Some(token1)
    } else {
        None
    }
}

/// Composition of a new pool. First match wins.
pub fn classify_pool(token0: &Token, token1: &Token, chain: &ChainTokens) -> PoolComposition {
    if is_stable_pool(token0, token1, chain) {
        PoolComposition::Stable
    } else if is_variable_with_stable_pool(token0, token1, chain) {
        PoolComposition::VariableWithStable
    } else if is_native_pool(token0, token1) {
        PoolComposition::Native
    } else if is_wrapped_native_pool(token0, token1, chain) {
        PoolComposition::WrappedNative
    } else {
        PoolComposition::Other
    }
}

/// The pool's locked balance of `token`.
pub fn get_token_amount_in_pool(pool: &Pool, token: &Token) -> EngineResult<BigDecimal> {
    if pool.token0 == token.id {
        Ok(pool.total_value_locked_token0.clone())
    } else if pool.token1 == token.id {
        Ok(pool.total_value_locked_token1.clone())
    } else {
        Err(DomainError::TokenNotInPool {
            pool: pool.id.clone(),
            token: token.id.clone(),
        }
        .into())
    }
}
