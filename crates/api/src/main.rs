use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use stockwatch_core::domain::stock::ScoredSnapshot;
use stockwatch_core::domain::watchlist::{Watchlist, WatchlistRequest};
use stockwatch_core::providers::benchmark::HttpBenchmarkYieldProvider;
use stockwatch_core::providers::stock::StockScreenerClient;
use stockwatch_core::providers::userprofile::HttpUserProfileClient;
use stockwatch_core::storage::PgWatchlistStore;
use stockwatch_core::valuation::benchmark::BenchmarkYieldCache;
use stockwatch_core::valuation::engine::PaymentSchedule;
use stockwatch_core::valuation::ValuationService;
use stockwatch_core::watchlists::{WatchlistError, WatchlistService};

// Identity is established by the gateway in front of this service.
const USER_ID_HEADER: &str = "x-user-id";

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

    let stocks = Arc::new(StockScreenerClient::from_settings(&settings)?);
    let profiles = Arc::new(HttpUserProfileClient::from_settings(&settings)?);
    let benchmark = Arc::new(BenchmarkYieldCache::new(Arc::new(
        HttpBenchmarkYieldProvider::from_settings(&settings)?,
    )));
    let valuation = ValuationService::new(benchmark, PaymentSchedule::from_env());

    let pool = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match stockwatch_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let service = pool.map(|pool| {
        WatchlistService::new(
            Arc::new(PgWatchlistStore::new(pool)),
            stocks,
            profiles,
            valuation,
        )
    });

    let app = router(AppState { service });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/watchlist", get(list_watchlists).post(create_watchlist))
        .route(
            "/watchlist/:id",
            get(get_watchlist).delete(delete_watchlist),
        )
        .route("/watchlist/:id/calculated", get(get_calculated))
        .route("/stocks/calculated", get(get_all_calculated))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: Option<WatchlistService>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    message: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            message: message.into(),
        }),
    )
}

fn map_error(err: WatchlistError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        WatchlistError::Invalid(_) => StatusCode::BAD_REQUEST,
        WatchlistError::NotFound(_) => StatusCode::NOT_FOUND,
        WatchlistError::NotOwner(_) => StatusCode::FORBIDDEN,
        WatchlistError::Upstream(e) => {
            sentry_anyhow::capture_anyhow(e);
            tracing::error!(error = %e, "watchlist request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, err.to_string())
}

fn service(state: &AppState) -> ApiResult<&WatchlistService> {
    state
        .service
        .as_ref()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, "database unavailable"))
}

fn optional_user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn require_user_id(headers: &HeaderMap) -> ApiResult<String> {
    optional_user_id(headers)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "missing user identity"))
}

fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| api_error(StatusCode::BAD_REQUEST, format!("invalid watchlist id: {id}")))
}

async fn create_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<WatchlistRequest>,
) -> ApiResult<(StatusCode, Json<Watchlist>)> {
    let user_id = require_user_id(&headers)?;
    let watchlist = service(&state)?
        .create(&user_id, request)
        .await
        .map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(watchlist)))
}

async fn list_watchlists(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Watchlist>>> {
    let user_id = require_user_id(&headers)?;
    let watchlists = service(&state)?.list(&user_id).await.map_err(map_error)?;
    Ok(Json(watchlists))
}

async fn get_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Watchlist>> {
    let user_id = require_user_id(&headers)?;
    let id = parse_id(&id)?;
    let watchlist = service(&state)?.get(id, &user_id).await.map_err(map_error)?;
    Ok(Json(watchlist))
}

async fn delete_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let user_id = require_user_id(&headers)?;
    let id = parse_id(&id)?;
    service(&state)?
        .delete(id, &user_id)
        .await
        .map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_calculated(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ScoredSnapshot>>> {
    let user_id = require_user_id(&headers)?;
    let id = parse_id(&id)?;
    let scored = service(&state)?
        .calculated(id, &user_id)
        .await
        .map_err(map_error)?;
    Ok(Json(scored))
}

async fn get_all_calculated(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ScoredSnapshot>>> {
    let user_id = optional_user_id(&headers);
    let scored = service(&state)?
        .all_calculated(user_id.as_deref())
        .await
        .map_err(map_error)?;
    Ok(Json(scored))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_trimmed_user_id() {
        let mut headers = HeaderMap::new();
        assert!(optional_user_id(&headers).is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  alice "));
        assert_eq!(optional_user_id(&headers).as_deref(), Some("alice"));
    }

    #[test]
    fn maps_domain_errors_to_statuses() {
        let id = Uuid::nil();
        assert_eq!(map_error(WatchlistError::NotFound(id)).0, StatusCode::NOT_FOUND);
        assert_eq!(map_error(WatchlistError::NotOwner(id)).0, StatusCode::FORBIDDEN);
        assert_eq!(
            map_error(WatchlistError::Invalid("x".to_string())).0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(parse_id("not-a-uuid").unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
