pub mod memory;
pub mod postgres;
pub mod redis;
pub mod streaming_cache;

pub use memory::MemoryUserStore;
pub use postgres::{create_pool, PgUserStore};
pub use redis::{create_redis_client, CacheKey, CacheWriterHandle, RedisCache};
pub use streaming_cache::{LayeredCache, RemoteCache, StreamingCache};

use crate::{
    error::AppResult,
    models::{HistoryRecord, WatchSignals},
};

/// Preference key holding the user's region answer from a previous session
pub const PREFERRED_REGION_KEY: &str = "preferred-region";
/// Preference key holding the user's platform selection
pub const PREFERRED_PLATFORMS_KEY: &str = "preferred-platforms";

/// Per-user storage the pipeline reads from and writes history to
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn preference(&self, user_id: &str, key: &str) -> AppResult<Option<String>>;

    async fn watch_signals(&self, user_id: &str) -> AppResult<WatchSignals>;

    async fn record_submission(&self, record: HistoryRecord) -> AppResult<()>;
}
