use core::str::FromStr;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use mkdi_core::{CoreError, CoreResult};

/// Role name as issued by the identity provider (e.g. `"office_admin"`).
///
/// Roles are opaque strings here; what they unlock is decided by the route
/// policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// How a held role is compared against a required role.
///
/// `Substring` is what the deployed dashboards rely on: a caller holding
/// `org_admin_senior` satisfies a requirement for `org_admin`. It also lets
/// `not_org_admin` through, so deployments that control their role names
/// should switch to `Exact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleMatching {
    #[default]
    Substring,
    Exact,
}

impl RoleMatching {
    /// Does `held` satisfy `required`?
    pub fn satisfies(self, held: &Role, required: &Role) -> bool {
        match self {
            RoleMatching::Substring => held.as_str().contains(required.as_str()),
            RoleMatching::Exact => held.as_str() == required.as_str(),
        }
    }

    /// True if any held role satisfies any required role.
    pub fn any_satisfies(self, held: &[Role], required: &[Role]) -> bool {
        held.iter().any(|h| required.iter().any(|r| self.satisfies(h, r)))
    }
}

impl FromStr for RoleMatching {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(RoleMatching::Substring),
            "exact" => Ok(RoleMatching::Exact),
            other => Err(CoreError::validation(format!(
                "role matching must be 'substring' or 'exact', got '{other}'"
            ))),
        }
    }
}
