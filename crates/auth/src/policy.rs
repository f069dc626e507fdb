//! Ordered route table.
//!
//! Routes are checked in declaration order and the first pattern that matches
//! the request path decides. The table is built once at startup and never
//! mutated, so it can be shared behind an `Arc` without locking.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AssetKind, PublicAssets, Role, RoleMatching};

/// What a caller needs to reach a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any authenticated caller, whatever roles it holds.
    Authenticated,
    /// At least one of these roles (never empty).
    AnyOf(Vec<Role>),
}

impl RoleRequirement {
    /// Build an `AnyOf` requirement, rejecting empty lists and blank names.
    pub fn any_of<I, R>(roles: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        let roles: Vec<Role> = roles.into_iter().map(Into::into).collect();
        if roles.is_empty() {
            return Err(PolicyError::EmptyRoleList);
        }
        if roles.iter().any(|r| r.as_str().trim().is_empty()) {
            return Err(PolicyError::BlankRoleName);
        }
        Ok(RoleRequirement::AnyOf(roles))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("invalid route pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("a role requirement must name at least one role")]
    EmptyRoleList,

    #[error("role names must not be blank")]
    BlankRoleName,
}

/// A path pattern paired with the roles it requires.
#[derive(Debug, Clone)]
pub struct ProtectedRoute {
    source: String,
    pattern: Regex,
    requirement: RoleRequirement,
}

impl ProtectedRoute {
    /// Compile `pattern` as a regular expression anchored to the whole path.
    pub fn new(pattern: &str, requirement: RoleRequirement) -> Result<Self, PolicyError> {
        let compiled = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            PolicyError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            source: pattern.to_string(),
            pattern: compiled,
            requirement,
        })
    }

    pub fn authenticated(pattern: &str) -> Result<Self, PolicyError> {
        Self::new(pattern, RoleRequirement::Authenticated)
    }

    pub fn any_of<I, R>(pattern: &str, roles: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        Self::new(pattern, RoleRequirement::any_of(roles)?)
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// The pattern as written, without the implicit anchors.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn requirement(&self) -> &RoleRequirement {
        &self.requirement
    }
}

/// The complete, immutable authorization policy.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    routes: Vec<ProtectedRoute>,
    public_assets: PublicAssets,
    role_matching: RoleMatching,
}

impl RoutePolicy {
    pub fn new(routes: Vec<ProtectedRoute>) -> Self {
        Self {
            routes,
            public_assets: PublicAssets::default(),
            role_matching: RoleMatching::default(),
        }
    }

    pub fn with_public_assets(mut self, public_assets: PublicAssets) -> Self {
        self.public_assets = public_assets;
        self
    }

    pub fn with_role_matching(mut self, role_matching: RoleMatching) -> Self {
        self.role_matching = role_matching;
        self
    }

    /// The back-office table shipped by default.
    pub fn standard() -> Result<Self, PolicyError> {
        Self::from_config(&RoutePolicyConfig::default())
    }

    pub fn from_config(config: &RoutePolicyConfig) -> Result<Self, PolicyError> {
        let routes = config
            .routes
            .iter()
            .map(|rule| {
                let requirement = match &rule.roles {
                    None => RoleRequirement::Authenticated,
                    Some(roles) => RoleRequirement::any_of(roles.iter().cloned())?,
                };
                ProtectedRoute::new(&rule.pattern, requirement)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            routes,
            public_assets: PublicAssets::new(&config.public_prefixes, AssetKind::ALL),
            role_matching: config.role_matching,
        })
    }

    /// Inverse of [`RoutePolicy::from_config`], for audit output.
    pub fn to_config(&self) -> RoutePolicyConfig {
        RoutePolicyConfig {
            public_prefixes: self.public_assets.prefixes().to_vec(),
            role_matching: self.role_matching,
            routes: self
                .routes
                .iter()
                .map(|r| RouteRuleConfig {
                    pattern: r.pattern().to_string(),
                    roles: match r.requirement() {
                        RoleRequirement::Authenticated => None,
                        RoleRequirement::AnyOf(roles) => {
                            Some(roles.iter().map(|r| r.as_str().to_string()).collect())
                        }
                    },
                })
                .collect(),
        }
    }

    pub fn routes(&self) -> &[ProtectedRoute] {
        &self.routes
    }

    pub fn public_assets(&self) -> &PublicAssets {
        &self.public_assets
    }

    pub fn role_matching(&self) -> RoleMatching {
        self.role_matching
    }

    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_assets.is_public_path(path)
    }

    /// First route whose pattern matches, with its position in the table.
    pub fn first_match(&self, path: &str) -> Option<(usize, &ProtectedRoute)> {
        self.routes.iter().enumerate().find(|(_, r)| r.matches(path))
    }
}

/// Serializable form of the policy (loaded from JSON at startup).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicyConfig {
    #[serde(default = "default_public_prefixes")]
    pub public_prefixes: Vec<String>,

    #[serde(default)]
    pub role_matching: RoleMatching,

    pub routes: Vec<RouteRuleConfig>,
}

/// One table row. `roles: null` (or absent) means any authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRuleConfig {
    pub pattern: String,

    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

fn default_public_prefixes() -> Vec<String> {
    vec!["/assets/".to_string()]
}

impl RouteRuleConfig {
    fn authenticated(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            roles: None,
        }
    }

    fn any_of(pattern: &str, roles: &[&str]) -> Self {
        Self {
            pattern: pattern.to_string(),
            roles: Some(roles.iter().map(|r| r.to_string()).collect()),
        }
    }
}

impl Default for RoutePolicyConfig {
    fn default() -> Self {
        Self {
            public_prefixes: default_public_prefixes(),
            role_matching: RoleMatching::default(),
            routes: vec![
                RouteRuleConfig::authenticated("/"),
                RouteRuleConfig::authenticated("/dashboard/?"),
                RouteRuleConfig::any_of("(?:/dashboard)?/organizations?(?:/.*)?", &["org_admin"]),
                RouteRuleConfig::any_of(
                    "(?:/dashboard)?/(?:office|wallet)s?(?:/.*)?",
                    &["office_admin"],
                ),
                RouteRuleConfig::authenticated("(?:/dashboard)?/(?:agents?|payments)(?:/.*)?"),
                RouteRuleConfig::authenticated("/api(?:/.*)?"),
            ],
        }
    }
}
