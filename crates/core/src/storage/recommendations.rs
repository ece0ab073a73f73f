use crate::storage::RecommendationStore;
use anyhow::{Context, Result};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgRecommendationStore {
    pool: sqlx::PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn get(&self, watchlist_id: Uuid) -> Result<Vec<String>> {
        let stocks: Option<Vec<String>> = sqlx::query_scalar(
            "SELECT stocks FROM watchlist_recommendations WHERE watchlist_id = $1",
        )
        .bind(watchlist_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select watchlist_recommendations failed (watchlist_id={watchlist_id})"))?;

        Ok(stocks.unwrap_or_default())
    }

    async fn upsert(&self, watchlist_id: Uuid, stocks: &[String]) -> Result<()> {
        sqlx::query(
            "INSERT INTO watchlist_recommendations (watchlist_id, stocks, updated_at) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (watchlist_id) DO UPDATE \
               SET stocks = EXCLUDED.stocks, updated_at = EXCLUDED.updated_at",
        )
        .bind(watchlist_id)
        .bind(stocks)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert watchlist_recommendations failed (watchlist_id={watchlist_id})"))?;

        tracing::info!(%watchlist_id, stocks_len = stocks.len(), "recommendation baseline stored");
        Ok(())
    }
}
