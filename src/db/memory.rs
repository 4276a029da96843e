use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::{
    db::UserStore,
    error::AppResult,
    models::{HistoryRecord, WatchSignals},
};

/// Submissions kept before the oldest are dropped
pub const DEFAULT_HISTORY_LIMIT: usize = 1_000;

/// In-process store used when no database is configured.
///
/// Quiz history is a ring buffer of the most recent submissions across
/// all users.
pub struct MemoryUserStore {
    preferences: RwLock<HashMap<(String, String), String>>,
    signals: RwLock<HashMap<String, WatchSignals>>,
    history: RwLock<VecDeque<HistoryRecord>>,
    history_limit: usize,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            preferences: RwLock::default(),
            signals: RwLock::default(),
            history: RwLock::default(),
            history_limit,
        }
    }

    pub async fn set_preference(&self, user_id: &str, key: &str, value: &str) {
        self.preferences
            .write()
            .await
            .insert((user_id.to_string(), key.to_string()), value.to_string());
    }

    pub async fn set_watch_signals(&self, user_id: &str, signals: WatchSignals) {
        self.signals.write().await.insert(user_id.to_string(), signals);
    }

    /// Recorded submissions, oldest first
    pub async fn history(&self) -> Vec<HistoryRecord> {
        self.history.read().await.iter().cloned().collect()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn preference(&self, user_id: &str, key: &str) -> AppResult<Option<String>> {
        let preferences = self.preferences.read().await;
        Ok(preferences
            .get(&(user_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn watch_signals(&self, user_id: &str) -> AppResult<WatchSignals> {
        Ok(self
            .signals
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn record_submission(&self, record: HistoryRecord) -> AppResult<()> {
        if self.history_limit == 0 {
            return Ok(());
        }
        let mut history = self.history.write().await;
        while history.len() >= self.history_limit {
            history.pop_front();
        }
        history.push_back(record);
        Ok(())
    }
}
