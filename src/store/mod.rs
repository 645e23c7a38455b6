//! Key-value backends for user records.
//!
//! [`KeyValueStore`] is the only seam between user records and storage.
//! Every method maps to one store-side atomic step, so callers never need
//! a read-then-write to keep data consistent.

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

use crate::StoreError;

/// Contract over a key-value store with scalars, sets and one ranking type.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// concurrently.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Checks that the store can serve requests.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Reads a scalar value. Returns `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrites a scalar value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Sets a numeric scalar and the member's ranking score in one atomic step.
    async fn set_ranked(
        &self,
        key: &str,
        ranking: &str,
        member: &str,
        value: i64,
    ) -> Result<(), StoreError>;

    /// Increments a numeric scalar and the member's ranking score in one
    /// atomic step, returning the new scalar value.
    ///
    /// A missing key counts as zero. Incrementing a non-integer value fails.
    async fn incr_ranked(
        &self,
        key: &str,
        ranking: &str,
        member: &str,
        delta: i64,
    ) -> Result<i64, StoreError>;

    /// Adds members to a set. Members already present are left alone.
    async fn set_add(&self, key: &str, members: &[i64]) -> Result<(), StoreError>;

    /// Removes a member from a set. Absent members are ignored.
    async fn set_remove(&self, key: &str, member: i64) -> Result<(), StoreError>;

    /// Lists the members of a set, empty when the key does not exist.
    async fn set_members(&self, key: &str) -> Result<Vec<i64>, StoreError>;

    /// Tests set membership.
    async fn set_contains(&self, key: &str, member: i64) -> Result<bool, StoreError>;

    /// Zero-based position of `member` in `ranking` ordered by descending
    /// score. `None` when the member is not ranked.
    async fn rank_desc(&self, ranking: &str, member: &str) -> Result<Option<u64>, StoreError>;

    /// Deletes `keys` and removes `member` from `ranking` in one atomic step.
    /// Missing keys and members are ignored.
    async fn delete_ranked(
        &self,
        keys: &[String],
        ranking: &str,
        member: &str,
    ) -> Result<(), StoreError>;
}
