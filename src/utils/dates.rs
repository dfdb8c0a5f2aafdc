//! Creation-anchored time buckets.
//!
//! A pool's hour `k` covers `[created + k*3600, created + (k+1)*3600)`; days
//! work the same with 86400. Everything here is plain seconds arithmetic with
//! no calendar or timezone semantics.

use chrono::Utc;

use crate::{
    db::{
        models::{Pool, PoolSnapshot, SnapshotInterval},
        EntityStore,
    },
    error::EngineResult,
};

pub const SECONDS_PER_HOUR: i64 = 3_600;
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Outcome of looking up the snapshot `n` buckets before an event.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketLookup {
    /// The pool is younger than the requested window
    NotYetElapsed,
    /// The window has elapsed but the bucket has no stored snapshot
    NotFound,
    Found(PoolSnapshot),
}

/// Index of the bucket containing `timestamp`, floored.
pub fn bucket_index(timestamp: i64, created_at: i64, interval: SnapshotInterval) -> i64 {
    (timestamp - created_at).div_euclid(interval.width_seconds())
}

pub fn snapshot_id(pool: &Pool, index: i64) -> String {
    format!("{}-{}", pool.id, index)
}

pub fn bucket_id(timestamp: i64, pool: &Pool, interval: SnapshotInterval) -> String {
    snapshot_id(pool, bucket_index(timestamp, pool.created_at_timestamp, interval))
}

pub fn hourly_bucket_id(timestamp: i64, pool: &Pool) -> String {
    bucket_id(timestamp, pool, SnapshotInterval::Hourly)
}

pub fn daily_bucket_id(timestamp: i64, pool: &Pool) -> String {
    bucket_id(timestamp, pool, SnapshotInterval::Daily)
}

pub fn subtract_hours(timestamp: i64, hours: i64) -> i64 {
    timestamp - hours * SECONDS_PER_HOUR
}

pub fn subtract_days(timestamp: i64, days: i64) -> i64 {
    timestamp - days * SECONDS_PER_DAY
}

/// Wall-clock check: is `timestamp` older than `hours` hours from now?
pub fn is_more_than_hours_ago(timestamp: i64, hours: i64) -> bool {
    timestamp < subtract_hours(Utc::now().timestamp(), hours)
}

/// Wall-clock check: is `timestamp` older than `days` days from now?
pub fn is_more_than_days_ago(timestamp: i64, days: i64) -> bool {
    timestamp < subtract_days(Utc::now().timestamp(), days)
}

/// Fetch the snapshot `n` buckets before `event_timestamp`.
pub async fn get_bucket_ago<S: EntityStore + ?Sized>(
    n: i64,
    event_timestamp: i64,
    store: &S,
    pool: &Pool,
    interval: SnapshotInterval,
) -> EngineResult<BucketLookup> {
    let window = n * interval.width_seconds();
    if event_timestamp - pool.created_at_timestamp < window {
        return Ok(BucketLookup::NotYetElapsed);
    }

    let id = bucket_id(event_timestamp - window, pool, interval);
    match store.get_snapshot(interval, &id).await? {
        Some(snapshot) => Ok(BucketLookup::Found(snapshot)),
        None => Ok(BucketLookup::NotFound),
    }
}
