use crate::config::Settings;
use crate::providers::{success_body, with_retries, HttpOptions};
use anyhow::{Context, Result};

const SERVICE: &str = "benchmark yield";

#[async_trait::async_trait]
pub trait BenchmarkYieldProvider: Send + Sync {
    /// Current S&P 500 dividend yield, in percent.
    async fn fetch(&self) -> Result<f64>;
}

#[derive(Debug, Clone)]
pub struct HttpBenchmarkYieldProvider {
    http: reqwest::Client,
    url: String,
    retries: u32,
}

impl HttpBenchmarkYieldProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let url = settings.require_sp500_url()?;
        Self::new(url, HttpOptions::from_env("SP500"))
    }

    pub fn new(url: &str, options: HttpOptions) -> Result<Self> {
        Ok(Self {
            http: options.build_client(SERVICE)?,
            url: url.to_string(),
            retries: options.retries,
        })
    }

    async fn fetch_once(&self) -> Result<f64> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("benchmark yield request failed")?;

        let body = success_body(res, SERVICE).await?;
        let value = body
            .trim()
            .parse::<f64>()
            .with_context(|| format!("benchmark yield is not a number: {body}"))?;
        anyhow::ensure!(
            value.is_finite() && value > 0.0,
            "benchmark yield must be positive (got {value})"
        );
        Ok(value)
    }
}

#[async_trait::async_trait]
impl BenchmarkYieldProvider for HttpBenchmarkYieldProvider {
    async fn fetch(&self) -> Result<f64> {
        with_retries(SERVICE, self.retries, || self.fetch_once()).await
    }
}
