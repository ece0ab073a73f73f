pub mod lock;
pub mod recommendations;
pub mod watchlists;

use crate::domain::watchlist::{NewWatchlist, Watchlist};
use anyhow::{Context, Result};
use uuid::Uuid;

pub use recommendations::PgRecommendationStore;
pub use watchlists::PgWatchlistStore;

pub async fn migrate(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

#[async_trait::async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Watchlist>>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Watchlist>>;

    async fn get(&self, id: Uuid) -> Result<Option<Watchlist>>;

    async fn create(&self, new: &NewWatchlist) -> Result<Watchlist>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Per-watchlist baseline of green-priced tickers.
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Empty when nothing has been recorded yet.
    async fn get(&self, watchlist_id: Uuid) -> Result<Vec<String>>;

    async fn upsert(&self, watchlist_id: Uuid, stocks: &[String]) -> Result<()>;
}
