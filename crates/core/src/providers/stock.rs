use crate::config::Settings;
use crate::domain::stock::TickerSnapshot;
use crate::providers::{join_url, success_body, with_retries, HttpOptions};
use anyhow::{Context, Result};

const SERVICE: &str = "stock screener";

#[async_trait::async_trait]
pub trait TickerDataProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<TickerSnapshot>;
}

/// Registration and bulk listing, used by the watchlist query path.
#[async_trait::async_trait]
pub trait StockCatalog: TickerDataProvider {
    async fn register(&self, symbol: &str) -> Result<()>;

    async fn fetch_all(&self) -> Result<Vec<TickerSnapshot>>;
}

#[derive(Debug, Clone)]
pub struct StockScreenerClient {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl StockScreenerClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_stock_screener_url()?;
        Self::new(base_url, HttpOptions::from_env("STOCK_SCREENER"))
    }

    pub fn new(base_url: &str, options: HttpOptions) -> Result<Self> {
        Ok(Self {
            http: options.build_client(SERVICE)?,
            base_url: base_url.to_string(),
            retries: options.retries,
        })
    }

    async fn fetch_once(&self, symbol: &str) -> Result<TickerSnapshot> {
        let res = self
            .http
            .get(join_url(&self.base_url, symbol))
            .send()
            .await
            .with_context(|| format!("stock screener request failed for {symbol}"))?;

        let body = success_body(res, SERVICE).await?;
        serde_json::from_str::<TickerSnapshot>(&body)
            .with_context(|| format!("failed to deserialize stock data for {symbol}: {body}"))
    }

    async fn fetch_all_once(&self) -> Result<Vec<TickerSnapshot>> {
        let res = self
            .http
            .get(&self.base_url)
            .send()
            .await
            .context("stock screener list request failed")?;

        let body = success_body(res, SERVICE).await?;
        serde_json::from_str::<Vec<TickerSnapshot>>(&body)
            .with_context(|| format!("failed to deserialize stock list: {body}"))
    }
}

#[async_trait::async_trait]
impl TickerDataProvider for StockScreenerClient {
    async fn fetch(&self, symbol: &str) -> Result<TickerSnapshot> {
        with_retries(SERVICE, self.retries, || self.fetch_once(symbol)).await
    }
}

#[async_trait::async_trait]
impl StockCatalog for StockScreenerClient {
    async fn register(&self, symbol: &str) -> Result<()> {
        let res = self
            .http
            .post(join_url(&self.base_url, symbol))
            .send()
            .await
            .with_context(|| format!("failed to register stock {symbol}"))?;

        success_body(res, SERVICE)
            .await
            .with_context(|| format!("failed to register stock {symbol}"))?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<TickerSnapshot>> {
        with_retries(SERVICE, self.retries, || self.fetch_all_once()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> StockScreenerClient {
        let options = HttpOptions {
            retries: 1,
            ..HttpOptions::default()
        };
        StockScreenerClient::new(&format!("{}/stocks/", server.uri()), options).unwrap()
    }

    fn intc_json() -> serde_json::Value {
        json!({
            "ticker": "INTC",
            "price": 49.28,
            "eps": 5.43,
            "dividend": 0.33,
            "peRatio5yr": {"avg": 14.89, "min": 8.79},
            "dividendYield5yr": {"avg": 2.62, "max": 3.65}
        })
    }

    #[tokio::test]
    async fn fetches_single_ticker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stocks/INTC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(intc_json()))
            .mount(&server)
            .await;

        let snapshot = client(&server).fetch("INTC").await.unwrap();
        assert_eq!(snapshot.ticker, "INTC");
        assert_eq!(snapshot.eps, 5.43);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stocks/NOPE"))
            .respond_with(ResponseTemplate::new(404).set_body_string("unknown"))
            .mount(&server)
            .await;

        let err = client(&server).fetch("NOPE").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn lists_and_registers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stocks/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([intc_json()])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/stocks/T"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.fetch_all().await.unwrap().len(), 1);
        client.register("T").await.unwrap();
    }
}
