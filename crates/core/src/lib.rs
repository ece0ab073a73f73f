pub mod domain;
pub mod mail;
pub mod notifier;
pub mod providers;
pub mod ranking;
pub mod storage;
pub mod time;
pub mod valuation;
pub mod watchlists;

#[cfg(test)]
mod testing;

pub mod config {
    use anyhow::Context;

    const DEFAULT_NOTIFY_CONCURRENCY: usize = 4;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub stock_screener_url: Option<String>,
        pub sp500_url: Option<String>,
        pub userprofile_url: Option<String>,
        pub smtp_host: Option<String>,
        pub smtp_port: Option<u16>,
        pub smtp_username: Option<String>,
        pub smtp_password: Option<String>,
        pub sentry_dsn: Option<String>,
        pub notify_concurrency: usize,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let smtp_port = match std::env::var("SMTP_SERVER_PORT") {
                Ok(s) => Some(
                    s.trim()
                        .parse::<u16>()
                        .with_context(|| format!("SMTP_SERVER_PORT is not a valid port: {s}"))?,
                ),
                Err(_) => None,
            };

            let notify_concurrency = std::env::var("NOTIFY_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .unwrap_or(DEFAULT_NOTIFY_CONCURRENCY);

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                stock_screener_url: std::env::var("STOCK_SCREENER_URL").ok(),
                sp500_url: std::env::var("SP500_URL").ok(),
                userprofile_url: std::env::var("USERPROFILE_URL").ok(),
                smtp_host: std::env::var("SMTP_SERVER_HOST").ok(),
                smtp_port,
                smtp_username: std::env::var("SMTP_SENDER_USERNAME").ok(),
                smtp_password: std::env::var("SMTP_SENDER_PASSWORD").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                notify_concurrency,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_stock_screener_url(&self) -> anyhow::Result<&str> {
            self.stock_screener_url
                .as_deref()
                .context("STOCK_SCREENER_URL is required")
        }

        pub fn require_sp500_url(&self) -> anyhow::Result<&str> {
            self.sp500_url.as_deref().context("SP500_URL is required")
        }

        pub fn require_userprofile_url(&self) -> anyhow::Result<&str> {
            self.userprofile_url
                .as_deref()
                .context("USERPROFILE_URL is required")
        }

        pub fn require_smtp_host(&self) -> anyhow::Result<&str> {
            self.smtp_host
                .as_deref()
                .context("SMTP_SERVER_HOST is required")
        }

        pub fn require_smtp_sender(&self) -> anyhow::Result<&str> {
            self.smtp_username
                .as_deref()
                .context("SMTP_SENDER_USERNAME is required")
        }
    }
}
