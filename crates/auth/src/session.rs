//! Session token lifecycle.
//!
//! A browser session holds the provider's access and refresh tokens. While
//! the access token is valid nothing happens; once it expires the refresh
//! token is exchanged for a new pair. This module only decides *what* to do
//! and merges the provider's answer; the exchange itself is done by the host.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Access token still valid.
    Fresh,
    /// Access token expired, refresh token usable.
    NeedsRefresh,
    /// Nothing left to refresh with; the caller must sign in again.
    Unrecoverable,
}

/// Token endpoint response (`grant_type=refresh_token`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds.
    pub expires_in: i64,

    /// Refresh token lifetime in seconds.
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
}

/// The provider answered with a lifetime no timestamp can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("token lifetime of {0}s is out of range")]
pub struct LifetimeOutOfRange(pub i64);

fn expiry(now: DateTime<Utc>, secs: i64) -> Result<DateTime<Utc>, LifetimeOutOfRange> {
    Duration::try_seconds(secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or(LifetimeOutOfRange(secs))
}

impl SessionToken {
    /// Build a session from a token endpoint response.
    pub fn from_response(
        response: TokenResponse,
        now: DateTime<Utc>,
    ) -> Result<Self, LifetimeOutOfRange> {
        Ok(Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: expiry(now, response.expires_in)?,
            refresh_expires_at: response
                .refresh_expires_in
                .map(|secs| expiry(now, secs))
                .transpose()?,
        })
    }

    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        if now < self.expires_at {
            return SessionState::Fresh;
        }

        match (&self.refresh_token, self.refresh_expires_at) {
            (None, _) => SessionState::Unrecoverable,
            (Some(_), Some(refresh_exp)) if now >= refresh_exp => SessionState::Unrecoverable,
            (Some(_), _) => SessionState::NeedsRefresh,
        }
    }

    /// Merge a refresh response into this session.
    ///
    /// Providers may omit the refresh token (or its lifetime) when it is not
    /// rotated; the previous values are kept in that case.
    pub fn refreshed(
        self,
        response: TokenResponse,
        now: DateTime<Utc>,
    ) -> Result<Self, LifetimeOutOfRange> {
        let next = Self::from_response(response, now)?;
        Ok(Self {
            refresh_token: next.refresh_token.or(self.refresh_token),
            refresh_expires_at: next.refresh_expires_at.or(self.refresh_expires_at),
            ..next
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(now: DateTime<Utc>) -> SessionToken {
        SessionToken {
            access_token: "access-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: now + Duration::seconds(300),
            refresh_expires_at: Some(now + Duration::seconds(1800)),
        }
    }

    #[test]
    fn state_follows_expiry() {
        let now = Utc::now();
        let s = session(now);
        assert_eq!(s.state(now), SessionState::Fresh);
        assert_eq!(s.state(now + Duration::seconds(300)), SessionState::NeedsRefresh);
        assert_eq!(s.state(now + Duration::seconds(1800)), SessionState::Unrecoverable);
    }

    #[test]
    fn expired_without_refresh_token_is_unrecoverable() {
        let now = Utc::now();
        let s = SessionToken {
            refresh_token: None,
            ..session(now)
        };
        assert_eq!(s.state(now + Duration::seconds(301)), SessionState::Unrecoverable);
    }

    #[test]
    fn unknown_refresh_expiry_still_refreshes() {
        let now = Utc::now();
        let s = SessionToken {
            refresh_expires_at: None,
            ..session(now)
        };
        assert_eq!(s.state(now + Duration::days(30)), SessionState::NeedsRefresh);
    }

    #[test]
    fn refresh_keeps_previous_refresh_token_when_not_rotated() {
        let now = Utc::now();
        let later = now + Duration::seconds(400);
        let s = session(now).refreshed(
            TokenResponse {
                access_token: "access-2".to_string(),
                refresh_token: None,
                expires_in: 300,
                refresh_expires_in: None,
            },
            later,
        )
        .unwrap();

        assert_eq!(s.access_token, "access-2");
        assert_eq!(s.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(s.expires_at, later + Duration::seconds(300));
        assert_eq!(s.refresh_expires_at, Some(now + Duration::seconds(1800)));
        assert_eq!(s.state(later), SessionState::Fresh);
    }

    #[test]
    fn refresh_rotates_tokens_when_provided() {
        let now = Utc::now();
        let s = session(now).refreshed(
            TokenResponse {
                access_token: "access-2".to_string(),
                refresh_token: Some("refresh-2".to_string()),
                expires_in: 60,
                refresh_expires_in: Some(600),
            },
            now,
        )
        .unwrap();
        assert_eq!(s.refresh_token.as_deref(), Some("refresh-2"));
        assert_eq!(s.refresh_expires_at, Some(now + Duration::seconds(600)));
    }

    #[test]
    fn token_response_parses_provider_json() {
        let json = r#"{
            "access_token": "a",
            "expires_in": 300,
            "refresh_expires_in": 1800,
            "refresh_token": "r",
            "token_type": "Bearer",
            "scope": "openid profile"
        }"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        let now = Utc::now();
        let s = SessionToken::from_response(response, now).unwrap();
        assert_eq!(s.expires_at, now + Duration::seconds(300));
        assert_eq!(s.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn absurd_lifetimes_are_rejected() {
        let now = Utc::now();
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"b","expires_in":9223372036854775807}"#)
                .unwrap();
        assert_eq!(
            session(now).refreshed(response, now),
            Err(LifetimeOutOfRange(i64::MAX))
        );

        let response = TokenResponse {
            access_token: "b".to_string(),
            refresh_token: None,
            expires_in: 300,
            refresh_expires_in: Some(i64::MIN),
        };
        assert_eq!(
            SessionToken::from_response(response, now),
            Err(LifetimeOutOfRange(i64::MIN))
        );
    }
}
