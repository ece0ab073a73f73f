use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockwatch_core::mail::SmtpMailer;
use stockwatch_core::notifier::{Notifier, NotifierOptions};
use stockwatch_core::providers::benchmark::HttpBenchmarkYieldProvider;
use stockwatch_core::providers::stock::StockScreenerClient;
use stockwatch_core::providers::userprofile::HttpUserProfileClient;
use stockwatch_core::ranking::DiscountRanker;
use stockwatch_core::storage::{PgRecommendationStore, PgWatchlistStore};
use stockwatch_core::time::us_market;
use stockwatch_core::valuation::benchmark::BenchmarkYieldCache;
use stockwatch_core::valuation::engine::PaymentSchedule;
use stockwatch_core::valuation::ValuationService;

#[derive(Debug, Parser)]
#[command(name = "stockwatch_worker")]
struct Args {
    /// Run a single notification cycle now and exit.
    #[arg(long)]
    once: bool,

    /// Score and diff watchlists without sending mail or storing baselines.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockwatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    stockwatch_core::storage::migrate(&pool).await?;

    let benchmark = Arc::new(BenchmarkYieldCache::new(Arc::new(
        HttpBenchmarkYieldProvider::from_settings(&settings)?,
    )));
    let notifier = Notifier::new(
        Arc::new(PgWatchlistStore::new(pool.clone())),
        Arc::new(PgRecommendationStore::new(pool.clone())),
        Arc::new(StockScreenerClient::from_settings(&settings)?),
        Arc::new(HttpUserProfileClient::from_settings(&settings)?),
        ValuationService::new(benchmark, PaymentSchedule::from_env()),
        Arc::new(DiscountRanker),
        Arc::new(SmtpMailer::from_settings(&settings)?),
        NotifierOptions {
            concurrency: settings.notify_concurrency,
            dry_run: args.dry_run,
        },
    );

    if args.once {
        return run_cycle(&pool, &notifier).await;
    }

    let holidays = us_market::configured_holidays();
    loop {
        let now = chrono::Utc::now();
        let Some(next) = us_market::next_run(now, &holidays) else {
            anyhow::bail!("no notification window found in the next two weeks; check US_MARKET_HOLIDAYS");
        };
        tracing::info!(%next, "waiting for next notification cycle");

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                return Ok(());
            }
        }

        if let Err(err) = run_cycle(&pool, &notifier).await {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "notification cycle failed");
        }
    }
}

async fn run_cycle(pool: &sqlx::PgPool, notifier: &Notifier) -> anyhow::Result<()> {
    let Some(lock) = stockwatch_core::storage::lock::try_acquire_notify_lock(pool).await? else {
        tracing::warn!("notification lock not acquired; another run in progress");
        return Ok(());
    };

    let result = notifier.notify_changes().await;

    if let Err(err) = lock.release().await {
        tracing::warn!(error = %err, "failed to release notification lock");
    }

    let summary = result?;
    tracing::info!(
        watchlists = summary.watchlists,
        notified = summary.notified,
        "notification cycle completed"
    );
    Ok(())
}

fn init_sentry(settings: &stockwatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
