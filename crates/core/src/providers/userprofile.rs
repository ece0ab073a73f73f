use crate::config::Settings;
use crate::domain::userprofile::UserProfile;
use crate::providers::{join_url, success_body, with_retries, HttpOptions};
use anyhow::{Context, Result};

const SERVICE: &str = "user profile";

#[async_trait::async_trait]
pub trait UserProfileProvider: Send + Sync {
    async fn fetch(&self, user_id: &str) -> Result<UserProfile>;
}

#[derive(Debug, Clone)]
pub struct HttpUserProfileClient {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl HttpUserProfileClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_userprofile_url()?;
        Self::new(base_url, HttpOptions::from_env("USERPROFILE"))
    }

    pub fn new(base_url: &str, options: HttpOptions) -> Result<Self> {
        Ok(Self {
            http: options.build_client(SERVICE)?,
            base_url: base_url.to_string(),
            retries: options.retries,
        })
    }

    async fn fetch_once(&self, user_id: &str) -> Result<UserProfile> {
        let res = self
            .http
            .get(join_url(&self.base_url, user_id))
            .send()
            .await
            .with_context(|| format!("user profile request failed for {user_id}"))?;

        let body = success_body(res, SERVICE).await?;
        serde_json::from_str::<UserProfile>(&body)
            .with_context(|| format!("failed to deserialize user profile for {user_id}"))
    }
}

#[async_trait::async_trait]
impl UserProfileProvider for HttpUserProfileClient {
    async fn fetch(&self, user_id: &str) -> Result<UserProfile> {
        anyhow::ensure!(!user_id.trim().is_empty(), "user id must be non-empty");
        with_retries(SERVICE, self.retries, || self.fetch_once(user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_profile_by_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userprofile/user-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "email": "alice@example.com",
                "expectedReturn": 8.0,
                "defaultExpectation": 6.0,
                "expectations": []
            })))
            .mount(&server)
            .await;

        let options = HttpOptions {
            retries: 1,
            ..HttpOptions::default()
        };
        let client =
            HttpUserProfileClient::new(&format!("{}/userprofile", server.uri()), options).unwrap();
        let profile = client.fetch("user-42").await.unwrap();
        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(profile.expectation_for("INTC"), 6.0);
    }

    #[tokio::test]
    async fn empty_user_id_is_rejected() {
        let client = HttpUserProfileClient::new("http://127.0.0.1:9", HttpOptions::default()).unwrap();
        assert!(client.fetch(" ").await.is_err());
    }
}
