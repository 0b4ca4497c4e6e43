//! Translation engine client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::Credentials;

/// Flat key → message map, keys in dotted form (`auth.login.title`).
pub type Messages = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizeRequest {
    pub source_locale: String,
    pub target_locale: String,
    pub data: Messages,
}

/// Anything that can translate a batch of messages.
#[async_trait]
pub trait Localizer: Send + Sync {
    async fn localize(&self, request: LocalizeRequest) -> Result<Messages>;

    /// Identity of the account behind the configured credentials.
    async fn whoami(&self) -> Result<Option<String>>;
}

#[derive(Deserialize)]
struct LocalizeResponse {
    data: Messages,
}

#[derive(Deserialize)]
struct WhoamiResponse {
    email: Option<String>,
}

/// HTTP client for the localization engine.
///
/// `POST {url}/localize` translates, `GET {url}/whoami` identifies the account.
/// Both authenticate with the API key as a bearer token.
pub struct EngineLocalizer {
    client: reqwest::Client,
    credentials: Credentials,
}

impl EngineLocalizer {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lingo/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.credentials.api_url, path)
    }
}

#[async_trait]
impl Localizer for EngineLocalizer {
    async fn localize(&self, request: LocalizeRequest) -> Result<Messages> {
        if request.data.is_empty() {
            return Ok(Messages::new());
        }
        let url = self.endpoint("localize");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.credentials.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach localization engine at {}", url))?
            .error_for_status()
            .context("Localization engine rejected the request")?;
        let body: LocalizeResponse = response
            .json()
            .await
            .context("Failed to decode localization engine response")?;
        Ok(body.data)
    }

    async fn whoami(&self) -> Result<Option<String>> {
        let url = self.endpoint("whoami");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.credentials.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to reach localization engine at {}", url))?
            .error_for_status()
            .context("Localization engine rejected the credentials")?;
        let body: WhoamiResponse = response
            .json()
            .await
            .context("Failed to decode whoami response")?;
        Ok(body.email)
    }
}
