//! In-memory stand-ins for the external collaborators.

use crate::domain::stock::TickerSnapshot;
use crate::domain::userprofile::UserProfile;
use crate::domain::watchlist::{NewWatchlist, Watchlist};
use crate::mail::{ChangeNotification, MailError, NotificationSender};
use crate::providers::stock::{StockCatalog, TickerDataProvider};
use crate::providers::userprofile::UserProfileProvider;
use crate::storage::{RecommendationStore, WatchlistStore};
use anyhow::{anyhow, bail, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct FakeWatchlists {
    pub rows: Mutex<Vec<Watchlist>>,
    pub fail_list: bool,
}

impl FakeWatchlists {
    pub fn with(rows: Vec<Watchlist>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail_list: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_list: true,
        }
    }
}

#[async_trait::async_trait]
impl WatchlistStore for FakeWatchlists {
    async fn list(&self) -> Result<Vec<Watchlist>> {
        if self.fail_list {
            bail!("watchlist store unavailable");
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Watchlist>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Watchlist>> {
        Ok(self.rows.lock().unwrap().iter().find(|w| w.id == id).cloned())
    }

    async fn create(&self, new: &NewWatchlist) -> Result<Watchlist> {
        let watchlist = Watchlist {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            stocks: new.stocks.clone(),
            user_id: new.user_id.clone(),
        };
        self.rows.lock().unwrap().push(watchlist.clone());
        Ok(watchlist)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|w| w.id != id);
        Ok(rows.len() != before)
    }
}

#[derive(Default)]
pub struct FakeRecommendations {
    pub baselines: Mutex<HashMap<Uuid, Vec<String>>>,
    pub upserts: Mutex<Vec<(Uuid, Vec<String>)>>,
    pub fail_get: bool,
    pub fail_upsert: bool,
}

impl FakeRecommendations {
    pub fn with(baselines: Vec<(Uuid, Vec<&str>)>) -> Self {
        Self {
            baselines: Mutex::new(
                baselines
                    .into_iter()
                    .map(|(id, s)| (id, s.into_iter().map(str::to_string).collect()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn upserts(&self) -> Vec<(Uuid, Vec<String>)> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn baseline(&self, watchlist_id: Uuid) -> Option<Vec<String>> {
        self.baselines.lock().unwrap().get(&watchlist_id).cloned()
    }
}

#[async_trait::async_trait]
impl RecommendationStore for FakeRecommendations {
    async fn get(&self, watchlist_id: Uuid) -> Result<Vec<String>> {
        if self.fail_get {
            bail!("recommendation store unavailable");
        }
        Ok(self
            .baselines
            .lock()
            .unwrap()
            .get(&watchlist_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert(&self, watchlist_id: Uuid, stocks: &[String]) -> Result<()> {
        if self.fail_upsert {
            bail!("recommendation store unavailable");
        }
        self.baselines
            .lock()
            .unwrap()
            .insert(watchlist_id, stocks.to_vec());
        self.upserts
            .lock()
            .unwrap()
            .push((watchlist_id, stocks.to_vec()));
        Ok(())
    }
}

/// Serves known snapshots; anything else fails like an upstream 404.
#[derive(Default)]
pub struct FakeStocks {
    pub snapshots: HashMap<String, TickerSnapshot>,
    pub unregistrable: BTreeSet<String>,
    pub registered: Mutex<Vec<String>>,
}

impl FakeStocks {
    pub fn with(snapshots: Vec<TickerSnapshot>) -> Self {
        Self {
            snapshots: snapshots
                .into_iter()
                .map(|s| (s.ticker.clone(), s))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl TickerDataProvider for FakeStocks {
    async fn fetch(&self, symbol: &str) -> Result<TickerSnapshot> {
        self.snapshots
            .get(symbol)
            .cloned()
            .ok_or_else(|| anyhow!("unknown symbol {symbol}"))
    }
}

#[async_trait::async_trait]
impl StockCatalog for FakeStocks {
    async fn register(&self, symbol: &str) -> Result<()> {
        if self.unregistrable.contains(symbol) {
            bail!("failed to register stock {symbol}");
        }
        self.registered.lock().unwrap().push(symbol.to_string());
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<TickerSnapshot>> {
        let mut all: Vec<_> = self.snapshots.values().cloned().collect();
        all.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(all)
    }
}

#[derive(Default)]
pub struct FakeProfiles {
    pub profiles: HashMap<String, UserProfile>,
}

impl FakeProfiles {
    pub fn with(profiles: Vec<(&str, UserProfile)>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|(id, p)| (id.to_string(), p))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl UserProfileProvider for FakeProfiles {
    async fn fetch(&self, user_id: &str) -> Result<UserProfile> {
        self.profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| anyhow!("user profile {user_id} not found"))
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub fail: bool,
    pub sent: Mutex<Vec<ChangeNotification>>,
}

impl FakeMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<ChangeNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationSender for FakeMailer {
    async fn send(&self, notification: &ChangeNotification) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Smtp("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
