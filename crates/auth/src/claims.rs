use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mkdi_core::{OfficeId, OrganizationId, PrincipalId};

use crate::{CallerIdentity, Role};

/// Claims carried by an access token from the identity provider.
///
/// Roles arrive either as a flat `roles` claim (our client mapper) or under
/// `realm_access.roles` (the provider's default); both are honoured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject / principal identifier.
    pub sub: PrincipalId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RealmAccess>,

    #[serde(rename = "organizationId", default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,

    #[serde(rename = "officeId", default, skip_serializing_if = "Option::is_none")]
    pub office_id: Option<OfficeId>,

    /// Issued-at.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    /// Expiration.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl IdentityClaims {
    /// Flat and realm roles, de-duplicated, flat roles first.
    pub fn all_roles(&self) -> Vec<Role> {
        let mut roles = self.roles.clone();
        if let Some(realm) = &self.realm_access {
            for role in &realm.roles {
                if !roles.contains(role) {
                    roles.push(role.clone());
                }
            }
        }
        roles
    }

    pub fn into_identity(self) -> CallerIdentity {
        let roles = self.all_roles();
        CallerIdentity::new(self.sub, roles)
            .with_profile(self.preferred_username, self.email)
            .with_tenant(self.organization_id, self.office_id)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not verify")]
    BadSignature,
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature checks happen in the [`TokenVerifier`] before this is called.
pub fn validate_claims(claims: &IdentityClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Turns a raw bearer token into verified claims.
///
/// Implementations must check the signature and call [`validate_claims`].
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaims, TokenValidationError>;
}
