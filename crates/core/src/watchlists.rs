use crate::domain::stock::ScoredSnapshot;
use crate::domain::userprofile::UserProfile;
use crate::domain::watchlist::{Watchlist, WatchlistRequest};
use crate::providers::stock::StockCatalog;
use crate::providers::userprofile::UserProfileProvider;
use crate::storage::WatchlistStore;
use crate::valuation::ValuationService;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum WatchlistError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("watchlist {0} not found")]
    NotFound(Uuid),
    #[error("watchlist {0} does not belong to user")]
    NotOwner(Uuid),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// Watchlist CRUD plus on-demand valuation for the HTTP surface.
#[derive(Clone)]
pub struct WatchlistService {
    watchlists: Arc<dyn WatchlistStore>,
    stocks: Arc<dyn StockCatalog>,
    profiles: Arc<dyn UserProfileProvider>,
    valuation: ValuationService,
}

impl WatchlistService {
    pub fn new(
        watchlists: Arc<dyn WatchlistStore>,
        stocks: Arc<dyn StockCatalog>,
        profiles: Arc<dyn UserProfileProvider>,
        valuation: ValuationService,
    ) -> Self {
        Self {
            watchlists,
            stocks,
            profiles,
            valuation,
        }
    }

    /// Registers every symbol with the screener; symbols it rejects are left out.
    pub async fn create(
        &self,
        user_id: &str,
        request: WatchlistRequest,
    ) -> Result<Watchlist, WatchlistError> {
        let mut new = request
            .validate_and_into_new(user_id)
            .map_err(|e| WatchlistError::Invalid(e.to_string()))?;

        let mut registered = Vec::with_capacity(new.stocks.len());
        for symbol in new.stocks {
            match self.stocks.register(&symbol).await {
                Ok(()) => registered.push(symbol),
                Err(err) => {
                    tracing::warn!(%symbol, error = %err, "failed to register stock; dropping it");
                }
            }
        }
        if registered.is_empty() {
            tracing::warn!(%user_id, "no stock could be registered; storing empty watchlist");
        }
        new.stocks = registered;

        let watchlist = self.watchlists.create(&new).await?;
        tracing::info!(watchlist_id = %watchlist.id, %user_id, stocks_len = watchlist.stocks.len(), "watchlist created");
        Ok(watchlist)
    }

    pub async fn get(&self, id: Uuid, user_id: &str) -> Result<Watchlist, WatchlistError> {
        let watchlist = self
            .watchlists
            .get(id)
            .await?
            .ok_or(WatchlistError::NotFound(id))?;

        if watchlist.user_id != user_id {
            return Err(WatchlistError::NotOwner(id));
        }
        Ok(watchlist)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Watchlist>, WatchlistError> {
        Ok(self.watchlists.list_for_user(user_id).await?)
    }

    pub async fn delete(&self, id: Uuid, user_id: &str) -> Result<(), WatchlistError> {
        self.get(id, user_id).await?;

        if !self.watchlists.delete(id).await? {
            return Err(WatchlistError::NotFound(id));
        }
        tracing::info!(watchlist_id = %id, %user_id, "watchlist deleted");
        Ok(())
    }

    /// Scores every ticker on the watchlist for its owner.
    pub async fn calculated(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Vec<ScoredSnapshot>, WatchlistError> {
        let watchlist = self.get(id, user_id).await?;
        let profile = self.profile_or_fallback(Some(user_id)).await;

        let mut snapshots = Vec::with_capacity(watchlist.stocks.len());
        for symbol in &watchlist.stocks {
            match self.stocks.fetch(symbol).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(err) => {
                    tracing::warn!(watchlist_id = %id, %symbol, error = %err, "failed to get stock; skipping");
                }
            }
        }

        Ok(self.valuation.calculate_all(&snapshots, &profile).await)
    }

    /// Scores every stock the screener tracks. Anonymous callers get the
    /// default expectations.
    pub async fn all_calculated(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<ScoredSnapshot>, WatchlistError> {
        let snapshots = self.stocks.fetch_all().await?;
        let profile = self.profile_or_fallback(user_id).await;
        Ok(self.valuation.calculate_all(&snapshots, &profile).await)
    }

    async fn profile_or_fallback(&self, user_id: Option<&str>) -> UserProfile {
        let Some(user_id) = user_id.filter(|id| !id.trim().is_empty()) else {
            return UserProfile::fallback();
        };

        match self.profiles.fetch(user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::error!(%user_id, error = %err, "failed to get user profile; using default expectations");
                UserProfile::fallback()
            }
        }
    }
}
