//! Gateway configuration, read from the environment at startup.

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use mkdi_auth::{PolicyError, RoleMatching, RoutePolicy, RoutePolicyConfig};
use mkdi_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";

// Served by the gateway itself; the sign-in route cannot shadow them.
const RESERVED_PATHS: [&str; 3] = ["/", "/health", "/auth/refresh"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("{0} is required when OIDC_TOKEN_URL is set")]
    Missing(&'static str),

    #[error("cannot read route policy file {path}: {source}")]
    PolicyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("route policy file {path} is not valid: {source}")]
    PolicyJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Identity provider endpoints used for sign-in redirects and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcConfig {
    pub token_url: String,
    pub authorization_url: Option<String>,
    pub client_id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub cookie_name: String,
    pub login_path: String,
    pub policy: RoutePolicyConfig,
    pub oidc: Option<OidcConfig>,
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Defaults with the given signing secret; the standard route table.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: jwt_secret.into(),
            cookie_name: "mkdi.session-token".to_string(),
            login_path: "/auth/login".to_string(),
            policy: RoutePolicyConfig::default(),
            oidc: None,
            log_format: LogFormat::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::new(get("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()));

        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    var: "BIND_ADDR",
                    message: e.to_string(),
                }
            })?;
        }

        if let Some(name) = get("AUTH_COOKIE_NAME") {
            config.cookie_name = name;
        }

        if let Some(path) = get("LOGIN_PATH") {
            if !path.starts_with('/') || RESERVED_PATHS.contains(&path.as_str()) {
                return Err(ConfigError::Invalid {
                    var: "LOGIN_PATH",
                    message: format!(
                        "'{path}' must be an absolute path not already served by the gateway"
                    ),
                });
            }
            config.login_path = path;
        }

        if let Some(file) = get("ROUTE_POLICY_FILE") {
            config.policy = load_policy_file(Path::new(&file))?;
        }

        if let Some(matching) = get("ROLE_MATCHING") {
            config.policy.role_matching = matching.parse::<RoleMatching>().map_err(|e| {
                ConfigError::Invalid {
                    var: "ROLE_MATCHING",
                    message: e.to_string(),
                }
            })?;
        }

        if let Some(format) = get("LOG_FORMAT") {
            config.log_format = format.parse().map_err(|e: mkdi_observability::ParseLogFormatError| {
                ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    message: e.to_string(),
                }
            })?;
        }

        if let Some(token_url) = get("OIDC_TOKEN_URL") {
            config.oidc = Some(OidcConfig {
                token_url,
                authorization_url: get("OIDC_AUTHORIZATION_URL"),
                client_id: get("OIDC_CLIENT_ID").ok_or(ConfigError::Missing("OIDC_CLIENT_ID"))?,
                client_secret: get("OIDC_CLIENT_SECRET"),
            });
        }

        Ok(config)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Compile the configured route table.
    pub fn route_policy(&self) -> Result<RoutePolicy, PolicyError> {
        RoutePolicy::from_config(&self.policy)
    }
}

fn load_policy_file(path: &Path) -> Result<RoutePolicyConfig, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::PolicyFile {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::PolicyJson {
        path: display,
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.uses_dev_secret());
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.login_path, "/auth/login");
        assert_eq!(config.policy, RoutePolicyConfig::default());
        assert!(config.oidc.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("AUTH_COOKIE_NAME", "sid"),
            ("ROLE_MATCHING", "exact"),
            ("LOG_FORMAT", "pretty"),
            ("OIDC_TOKEN_URL", "https://idp.example/token"),
            ("OIDC_CLIENT_ID", "portal"),
        ]))
        .unwrap();

        assert!(!config.uses_dev_secret());
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.cookie_name, "sid");
        assert_eq!(config.policy.role_matching, RoleMatching::Exact);
        assert_eq!(config.log_format, LogFormat::Pretty);

        let oidc = config.oidc.unwrap();
        assert_eq!(oidc.client_id, "portal");
        assert_eq!(oidc.client_secret, None);
    }

    #[test]
    fn oidc_requires_client_id() {
        let err = GatewayConfig::from_lookup(lookup(&[("OIDC_TOKEN_URL", "https://idp/token")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OIDC_CLIENT_ID")));
    }

    #[test]
    fn rejects_bad_values() {
        let err = GatewayConfig::from_lookup(lookup(&[("BIND_ADDR", "nope")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BIND_ADDR", .. }));

        let err = GatewayConfig::from_lookup(lookup(&[("LOGIN_PATH", "login")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LOGIN_PATH", .. }));

        let err = GatewayConfig::from_lookup(lookup(&[("ROLE_MATCHING", "prefix")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "ROLE_MATCHING", .. }));
    }

    #[test]
    fn loads_policy_file() {
        let path = std::env::temp_dir().join(format!("mkdi-policy-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "routes": [ { "pattern": "/reports(?:/.*)?", "roles": ["auditor"] } ] }"#,
        )
        .unwrap();

        let config = GatewayConfig::from_lookup(lookup(&[(
            "ROUTE_POLICY_FILE",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        std::fs::remove_file(&path).ok();

        let policy = config.route_policy().unwrap();
        assert_eq!(policy.routes().len(), 1);
        assert_eq!(policy.routes()[0].pattern(), "/reports(?:/.*)?");
    }

    #[test]
    fn missing_policy_file_is_reported() {
        let err = GatewayConfig::from_lookup(lookup(&[(
            "ROUTE_POLICY_FILE",
            "/definitely/not/here.json",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::PolicyFile { .. }));
    }
}
