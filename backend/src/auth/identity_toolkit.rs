//! ID token verification against the Identity Toolkit REST API.
//!
//! `accounts:lookup` resolves a valid ID token to its account; an invalid or
//! expired token comes back as HTTP 400.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{AdminIdentity, AuthError, TokenVerifier};

pub const DEFAULT_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";

#[derive(Debug, Clone)]
pub struct IdentityToolkitConfig {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl IdentityToolkitConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    disabled: bool,
}

impl LookupResponse {
    fn into_identity(self) -> Result<AdminIdentity, AuthError> {
        let user = self
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::Rejected("no account for token".to_string()))?;
        if user.disabled {
            return Err(AuthError::Rejected("account disabled".to_string()));
        }
        Ok(AdminIdentity {
            uid: user.local_id,
            email: user.email,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IdentityToolkitVerifier {
    client: Client,
    config: IdentityToolkitConfig,
}

impl IdentityToolkitVerifier {
    pub fn new(config: IdentityToolkitConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("hemocare/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn lookup_url(&self) -> String {
        format!(
            "{}/v1/accounts:lookup",
            self.config.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TokenVerifier for IdentityToolkitVerifier {
    async fn verify(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        let response = self
            .client
            .post(self.lookup_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&LookupRequest { id_token: token })
            .send()
            .await
            .map_err(|e| {
                warn!("Identity lookup failed: {}", e);
                AuthError::Unavailable(e.to_string())
            })?;

        match response.status() {
            status if status.is_success() => {
                let parsed: LookupResponse = response
                    .json()
                    .await
                    .map_err(|e| AuthError::Unavailable(format!("invalid lookup response: {}", e)))?;
                let identity = parsed.into_identity()?;
                debug!("Verified admin {}", identity.uid);
                Ok(identity)
            }
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                Err(AuthError::Rejected(body))
            }
            status => Err(AuthError::Unavailable(format!(
                "lookup returned HTTP {}",
                status.as_u16()
            ))),
        }
    }
}
