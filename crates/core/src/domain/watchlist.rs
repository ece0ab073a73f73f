use anyhow::ensure;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watchlist {
    pub id: Uuid,
    pub name: String,
    pub stocks: Vec<String>,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistRequest {
    pub name: String,
    #[serde(default)]
    pub stocks: Vec<String>,
}

/// A validated request, owned by `user_id`, ready to be registered and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWatchlist {
    pub name: String,
    pub stocks: Vec<String>,
    pub user_id: String,
}

impl WatchlistRequest {
    pub fn validate_and_into_new(self, user_id: &str) -> anyhow::Result<NewWatchlist> {
        ensure!(
            !self.stocks.is_empty(),
            "Required value 'stocks' is missing"
        );

        let name = self.name.trim().to_string();
        ensure!(!name.is_empty(), "Required value 'name' is missing");

        let user_id = user_id.trim().to_string();
        ensure!(!user_id.is_empty(), "user id must be non-empty");

        // Symbols are kept as submitted apart from surrounding whitespace.
        let stocks: Vec<String> = self
            .stocks
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        ensure!(!stocks.is_empty(), "Required value 'stocks' is missing");

        Ok(NewWatchlist {
            name,
            stocks,
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, stocks: &[&str]) -> WatchlistRequest {
        WatchlistRequest {
            name: name.to_string(),
            stocks: stocks.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn trims_symbols_without_rewriting_them() {
        let new = request(" dividends ", &["o", " T ", "T", ""])
            .validate_and_into_new("user-1")
            .unwrap();
        assert_eq!(new.name, "dividends");
        assert_eq!(
            new.stocks,
            vec!["o".to_string(), "T".to_string(), "T".to_string()]
        );
        assert_eq!(new.user_id, "user-1");
    }

    #[test]
    fn rejects_missing_stocks() {
        let err = request("x", &[]).validate_and_into_new("user-1").unwrap_err();
        assert!(err.to_string().contains("stocks"));

        let err = request("x", &["  "])
            .validate_and_into_new("user-1")
            .unwrap_err();
        assert!(err.to_string().contains("stocks"));
    }

    #[test]
    fn rejects_blank_name() {
        let err = request(" ", &["INTC"])
            .validate_and_into_new("user-1")
            .unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
