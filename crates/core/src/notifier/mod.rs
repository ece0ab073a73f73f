mod changes;

pub use changes::{diff_recommendations, filter_green_prices};

use crate::domain::watchlist::Watchlist;
use crate::mail::{ChangeNotification, NotificationSender};
use crate::providers::stock::TickerDataProvider;
use crate::providers::userprofile::UserProfileProvider;
use crate::ranking::Ranker;
use crate::storage::{RecommendationStore, WatchlistStore};
use crate::valuation::ValuationService;
use anyhow::Context;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

/// How many ranked candidates are considered per watchlist.
pub const RECOMMENDATION_COUNT: usize = 2;

#[derive(Debug, Clone)]
pub struct NotifierOptions {
    /// Watchlists evaluated at the same time.
    pub concurrency: usize,
    /// Score and diff, but never send or persist.
    pub dry_run: bool,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchlistOutcome {
    Unchanged,
    Notified { removed: Vec<String>, added: Vec<String> },
    /// A change was found in dry-run mode.
    WouldNotify { removed: Vec<String>, added: Vec<String> },
    BaselineUnavailable,
    ProfileUnavailable,
    SendFailed,
    /// The notification went out but the new baseline was not stored.
    PersistFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub watchlists: usize,
    pub notified: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &WatchlistOutcome) {
        match outcome {
            WatchlistOutcome::Notified { .. } | WatchlistOutcome::WouldNotify { .. } => {
                self.notified += 1
            }
            WatchlistOutcome::Unchanged => self.unchanged += 1,
            WatchlistOutcome::BaselineUnavailable | WatchlistOutcome::ProfileUnavailable => {
                self.skipped += 1
            }
            WatchlistOutcome::SendFailed | WatchlistOutcome::PersistFailed => self.failed += 1,
        }
    }
}

/// Re-scores every watchlist and mails the owner when its set of green-priced
/// tickers changes.
#[derive(Clone)]
pub struct Notifier {
    watchlists: Arc<dyn WatchlistStore>,
    recommendations: Arc<dyn RecommendationStore>,
    stocks: Arc<dyn TickerDataProvider>,
    profiles: Arc<dyn UserProfileProvider>,
    valuation: ValuationService,
    ranker: Arc<dyn Ranker>,
    mailer: Arc<dyn NotificationSender>,
    options: NotifierOptions,
}

impl Notifier {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        watchlists: Arc<dyn WatchlistStore>,
        recommendations: Arc<dyn RecommendationStore>,
        stocks: Arc<dyn TickerDataProvider>,
        profiles: Arc<dyn UserProfileProvider>,
        valuation: ValuationService,
        ranker: Arc<dyn Ranker>,
        mailer: Arc<dyn NotificationSender>,
        options: NotifierOptions,
    ) -> Self {
        Self {
            watchlists,
            recommendations,
            stocks,
            profiles,
            valuation,
            ranker,
            mailer,
            options,
        }
    }

    /// One notification cycle. Only a failure to list watchlists is an error;
    /// everything below that is logged and counted in the summary.
    pub async fn notify_changes(&self) -> anyhow::Result<RunSummary> {
        let watchlists = self
            .watchlists
            .list()
            .await
            .context("failed to list watchlists")?;

        let mut summary = RunSummary::default();
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut seen = BTreeSet::new();

        for watchlist in watchlists {
            // Each baseline is read and written by a single task per run.
            if !seen.insert(watchlist.id) {
                tracing::warn!(watchlist_id = %watchlist.id, "duplicate watchlist in listing; skipping");
                continue;
            }
            summary.watchlists += 1;

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("notifier semaphore closed")?;
            let this = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                this.process_watchlist(&watchlist).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => summary.record(&outcome),
                Err(err) => {
                    tracing::error!(error = %err, "watchlist task failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            watchlists = summary.watchlists,
            notified = summary.notified,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            failed = summary.failed,
            dry_run = self.options.dry_run,
            "notification cycle finished"
        );
        Ok(summary)
    }

    pub async fn process_watchlist(&self, watchlist: &Watchlist) -> WatchlistOutcome {
        let span = tracing::info_span!("watchlist", watchlist_id = %watchlist.id);
        self.evaluate(watchlist).instrument(span).await
    }

    async fn evaluate(&self, watchlist: &Watchlist) -> WatchlistOutcome {
        let previous = match self.recommendations.get(watchlist.id).await {
            Ok(previous) => previous,
            Err(err) => {
                tracing::error!(error = %err, "failed to load recommendation baseline");
                return WatchlistOutcome::BaselineUnavailable;
            }
        };

        let mut snapshots = Vec::with_capacity(watchlist.stocks.len());
        for symbol in &watchlist.stocks {
            match self.stocks.fetch(symbol).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(err) => {
                    tracing::warn!(%symbol, error = %err, "failed to get stock; skipping");
                }
            }
        }

        let profile = match self.profiles.fetch(&watchlist.user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::error!(user_id = %watchlist.user_id, error = %err, "failed to get user profile for notification");
                return WatchlistOutcome::ProfileUnavailable;
            }
        };

        let scored = self.valuation.calculate_all(&snapshots, &profile).await;
        let recommended = self.ranker.rank(scored, &profile, RECOMMENDATION_COUNT);
        let current = filter_green_prices(&recommended);

        let (removed, added) = diff_recommendations(&previous, &current);
        if removed.is_empty() && added.is_empty() {
            tracing::debug!(current = ?current, "recommendations unchanged");
            return WatchlistOutcome::Unchanged;
        }

        if self.options.dry_run {
            tracing::info!(?removed, ?added, "recommendations changed (dry-run)");
            return WatchlistOutcome::WouldNotify { removed, added };
        }

        let notification = ChangeNotification {
            list_name: watchlist.name.clone(),
            removed,
            added,
            current,
            recipient: profile.email,
        };

        if let Err(err) = self.mailer.send(&notification).await {
            tracing::error!(error = %err, "failed to send notification");
            return WatchlistOutcome::SendFailed;
        }

        if let Err(err) = self
            .recommendations
            .upsert(watchlist.id, &notification.current)
            .await
        {
            tracing::error!(error = %err, "notification sent but baseline not stored");
            return WatchlistOutcome::PersistFailed;
        }

        tracing::info!(
            removed = ?notification.removed,
            added = ?notification.added,
            "recommendation change notified"
        );
        WatchlistOutcome::Notified {
            removed: notification.removed,
            added: notification.added,
        }
    }
}
