//! Refresh-token exchange against the identity provider's token endpoint.

use thiserror::Error;

use mkdi_auth::{LifetimeOutOfRange, TokenResponse};

use crate::config::OidcConfig;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint rejected refresh ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("token endpoint answered with an unusable session: {0}")]
    Unusable(#[from] LifetimeOutOfRange),
}

#[derive(Debug, Clone)]
pub struct OidcClient {
    http: reqwest::Client,
    config: OidcConfig,
}

impl OidcClient {
    pub fn new(config: OidcConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    pub fn authorization_url(&self) -> Option<&str> {
        self.config.authorization_url.as_deref()
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, RefreshError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let res = self.http.post(&self.config.token_url).form(&form).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(res.json::<TokenResponse>().await?)
    }
}
