//! Redis-backed key-value store.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use tracing::{debug, info, instrument};

use crate::StoreError;
use crate::store::KeyValueStore;

// Each paired write checks the ranking key's type before its first write.
// Scripts do not roll back, so a failure must happen before anything lands.
const SET_RANKED: &str = r"
local kind = redis.call('TYPE', KEYS[2]).ok
if kind ~= 'zset' and kind ~= 'none' then
  return redis.error_reply('WRONGTYPE Operation against a key holding the wrong kind of value')
end
redis.call('SET', KEYS[1], ARGV[1])
redis.call('ZADD', KEYS[2], ARGV[1], ARGV[2])
";

const INCR_RANKED: &str = r"
local kind = redis.call('TYPE', KEYS[2]).ok
if kind ~= 'zset' and kind ~= 'none' then
  return redis.error_reply('WRONGTYPE Operation against a key holding the wrong kind of value')
end
local score = redis.call('INCRBY', KEYS[1], ARGV[1])
redis.call('ZADD', KEYS[2], score, ARGV[2])
return score
";

// KEYS[1] is the ranking, the rest are deleted outright.
const DELETE_RANKED: &str = r"
local kind = redis.call('TYPE', KEYS[1]).ok
if kind ~= 'zset' and kind ~= 'none' then
  return redis.error_reply('WRONGTYPE Operation against a key holding the wrong kind of value')
end
if #KEYS > 1 then
  redis.call('DEL', unpack(KEYS, 2))
end
redis.call('ZREM', KEYS[1], ARGV[1])
";

/// Key-value store over a single multiplexed Redis connection.
///
/// The connection is opened once and cloned per request; clones share the
/// same underlying socket. Paired writes run as Lua scripts, so a failing
/// command never leaves the scalar and the ranking out of step.
///
/// Rankings are Redis sorted sets, which hold scores as doubles. Scores
/// beyond 2^53 in magnitude are ranked by their rounded value.
#[derive(Clone)]
pub struct RedisStore {
    url: String,
    connection: MultiplexedConnection,
    set_ranked: Script,
    incr_ranked: Script,
    delete_ranked: Script,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").field("url", &self.url).finish()
    }
}

impl RedisStore {
    /// Connects to the Redis server at `url` and verifies it answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the URL is invalid or the server is unreachable.
    #[instrument(skip(url), fields(url = %url))]
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        info!("Connecting to Redis");
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        let store = Self {
            url: url.to_string(),
            connection,
            set_ranked: Script::new(SET_RANKED),
            incr_ranked: Script::new(INCR_RANKED),
            delete_ranked: Script::new(DELETE_RANKED),
        };
        store.ping().await?;
        info!("Redis connection established");
        Ok(store)
    }

    fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!(reply = %reply, "Redis ping");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_ranked(
        &self,
        key: &str,
        ranking: &str,
        member: &str,
        value: i64,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let mut invocation = self.set_ranked.key(key);
        invocation.key(ranking).arg(value).arg(member);
        let _: () = invocation.invoke_async(&mut conn).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn incr_ranked(
        &self,
        key: &str,
        ranking: &str,
        member: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut conn = self.connection();
        let mut invocation = self.incr_ranked.key(key);
        invocation.key(ranking).arg(delta).arg(member);
        let updated: i64 = invocation.invoke_async(&mut conn).await?;
        debug!(updated, "Score incremented");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn set_add(&self, key: &str, members: &[i64]) -> Result<(), StoreError> {
        // SADD with no members is a Redis syntax error.
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection();
        let added: i64 = conn.sadd(key, members).await?;
        debug!(added, "Set members added");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_remove(&self, key: &str, member: i64) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let removed: i64 = conn.srem(key, member).await?;
        debug!(removed, "Set member removed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_members(&self, key: &str) -> Result<Vec<i64>, StoreError> {
        let mut conn = self.connection();
        let mut members: Vec<i64> = conn.smembers(key).await?;
        // Large sets lose Redis' intset ordering; keep output stable.
        members.sort_unstable();
        Ok(members)
    }

    #[instrument(skip(self))]
    async fn set_contains(&self, key: &str, member: i64) -> Result<bool, StoreError> {
        let mut conn = self.connection();
        let present: bool = conn.sismember(key, member).await?;
        Ok(present)
    }

    #[instrument(skip(self))]
    async fn rank_desc(&self, ranking: &str, member: &str) -> Result<Option<u64>, StoreError> {
        let mut conn = self.connection();
        let rank: Option<u64> = conn.zrevrank(ranking, member).await?;
        Ok(rank)
    }

    #[instrument(skip(self))]
    async fn delete_ranked(
        &self,
        keys: &[String],
        ranking: &str,
        member: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let mut invocation = self.delete_ranked.key(ranking);
        for key in keys {
            invocation.key(key);
        }
        invocation.arg(member);
        let _: () = invocation.invoke_async(&mut conn).await?;
        Ok(())
    }
}
