//! Strongly-typed identifiers for the tenant hierarchy.
//!
//! An organization owns offices; principals (employees, agents) act inside an
//! office. Identity providers hand these out as UUID strings.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Identifier of an organization (top-level tenant).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(Uuid);

/// Identifier of an office inside an organization.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfficeId(Uuid);

/// Identifier of an authenticated principal (the token `sub`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

/// Implements construction, display and parsing for a tenant id newtype.
///
/// `$kind` is the tenant level the id belongs to; it labels parse errors so a
/// bad `officeId` claim is not reported as a bad organization.
macro_rules! tenant_id {
    ($t:ident, $kind:literal) => {
        impl $t {
            /// Tenant level this identifier belongs to.
            pub const KIND: &'static str = $kind;

            /// Create a new time-ordered (UUIDv7) identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Parse the string form used in identity provider claims.
            pub fn parse_claim(raw: &str) -> CoreResult<Self> {
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|e| CoreError::invalid_id(format!("{} id '{raw}': {e}", Self::KIND)))
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = CoreError;

            fn from_str(s: &str) -> CoreResult<Self> {
                Self::parse_claim(s)
            }
        }
    };
}

tenant_id!(OrganizationId, "organization");
tenant_id!(OfficeId, "office");
tenant_id!(PrincipalId, "principal");
