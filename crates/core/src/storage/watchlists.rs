use crate::domain::watchlist::{NewWatchlist, Watchlist};
use crate::storage::WatchlistStore;
use anyhow::{Context, Result};
use uuid::Uuid;

type WatchlistRow = (Uuid, String, String, Vec<String>);

fn into_watchlist((id, name, user_id, stocks): WatchlistRow) -> Watchlist {
    Watchlist {
        id,
        name,
        stocks,
        user_id,
    }
}

#[derive(Debug, Clone)]
pub struct PgWatchlistStore {
    pool: sqlx::PgPool,
}

impl PgWatchlistStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WatchlistStore for PgWatchlistStore {
    async fn list(&self) -> Result<Vec<Watchlist>> {
        let rows = sqlx::query_as::<_, WatchlistRow>(
            "SELECT id, name, user_id, stocks FROM watchlists ORDER BY created_at ASC, id ASC",
        )
        .persistent(false)
        .fetch_all(&self.pool)
        .await
        .context("select watchlists failed")?;

        Ok(rows.into_iter().map(into_watchlist).collect())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Watchlist>> {
        let rows = sqlx::query_as::<_, WatchlistRow>(
            "SELECT id, name, user_id, stocks FROM watchlists \
             WHERE user_id = $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select watchlists for user {user_id} failed"))?;

        Ok(rows.into_iter().map(into_watchlist).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Watchlist>> {
        let row = sqlx::query_as::<_, WatchlistRow>(
            "SELECT id, name, user_id, stocks FROM watchlists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select watchlist {id} failed"))?;

        Ok(row.map(into_watchlist))
    }

    async fn create(&self, new: &NewWatchlist) -> Result<Watchlist> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO watchlists (id, name, user_id, stocks) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(&new.name)
            .bind(&new.user_id)
            .bind(&new.stocks)
            .execute(&self.pool)
            .await
            .context("insert watchlists failed")?;

        Ok(Watchlist {
            id,
            name: new.name.clone(),
            stocks: new.stocks.clone(),
            user_id: new.user_id.clone(),
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM watchlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete watchlist {id} failed"))?;

        Ok(res.rows_affected() == 1)
    }
}
