use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    db::UserStore,
    error::AppResult,
    models::{HistoryRecord, WatchSignals},
};

/// Titles watched within this many days count as recently watched
const RECENT_WATCH_DAYS: i32 = 30;

/// Creates a PostgreSQL connection pool and applies pending migrations
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// User preferences, watch history and quiz history in Postgres
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn preference(&self, user_id: &str, key: &str) -> AppResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value
            FROM user_preferences
            WHERE user_id = $1 AND key = $2
            "#,
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn watch_signals(&self, user_id: &str) -> AppResult<WatchSignals> {
        let recent = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT title_id
            FROM watch_history
            WHERE user_id = $1
              AND watched_at > NOW() - make_interval(days => $2)
            "#,
        )
        .bind(user_id)
        .bind(RECENT_WATCH_DAYS)
        .fetch_all(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT lower(genre) AS genre, AVG(rating) AS average
            FROM watch_history, unnest(genres) AS genre
            WHERE user_id = $1 AND rating IS NOT NULL
            GROUP BY lower(genre)
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut signals = WatchSignals::default();
        signals.recently_watched.extend(recent);
        for row in rows {
            let genre: String = row.try_get("genre")?;
            let average: Option<f64> = row.try_get("average")?;
            if let Some(average) = average {
                signals.genre_ratings.insert(genre, average);
            }
        }

        tracing::debug!(
            user_id = %user_id,
            recent = signals.recently_watched.len(),
            genres = signals.genre_ratings.len(),
            "Loaded watch signals"
        );

        Ok(signals)
    }

    async fn record_submission(&self, record: HistoryRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO quiz_history (id, user_id, answers, recommendations, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.user_id)
        .bind(Json(&record.answers))
        .bind(Json(&record.recommendations))
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
