//! GitHub OAuth client
//!
//! Exchanges an authorization code for a GitHub access token and fetches the
//! GitHub account behind it.

use reqwest::{header, Client};
use serde::Deserialize;

use super::service::AuthError;
use crate::config::GithubConfig;

const GITHUB_OAUTH_URL: &str = "https://github.com";
const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("bikeshare-server/", env!("CARGO_PKG_VERSION"));

/// GitHub account fields used for login
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GithubUser {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    config: GithubConfig,
    oauth_url: String,
    api_url: String,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Self {
        Self::with_base_urls(config, GITHUB_OAUTH_URL, GITHUB_API_URL)
    }

    /// Point the client at other hosts (GitHub Enterprise, tests)
    pub fn with_base_urls(
        config: GithubConfig,
        oauth_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            config,
            oauth_url: oauth_url.into().trim_end_matches('/').to_string(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Exchange an OAuth code for a GitHub access token
    pub async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .post(format!("{}/login/oauth/access_token", self.oauth_url))
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::GithubUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::CodeExchangeFailed(format!(
                "GitHub returned {}",
                response.status()
            )));
        }

        let body: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::CodeExchangeFailed(e.to_string()))?;

        body.access_token.ok_or_else(|| {
            AuthError::CodeExchangeFailed(
                body.error_description
                    .unwrap_or_else(|| "Access token not found".to_string()),
            )
        })
    }

    /// Fetch the account that owns a GitHub access token
    pub async fn fetch_user(&self, access_token: &str) -> Result<GithubUser, AuthError> {
        let response = self
            .client
            .get(format!("{}/user", self.api_url))
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| AuthError::GithubUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::GithubUserFailed(format!(
                "GitHub returned {}",
                response.status()
            )));
        }

        response
            .json::<GithubUser>()
            .await
            .map_err(|e| AuthError::GithubUserFailed(e.to_string()))
    }
}
