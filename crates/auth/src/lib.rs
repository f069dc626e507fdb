//! `mkdi-auth` — route authorization boundary for the back-office.
//!
//! Everything in this crate is pure: no HTTP, no clocks read implicitly, no
//! network. The hosting layer verifies tokens, calls [`evaluate`] once per
//! request and translates the [`AccessDecision`] into a response.

pub mod assets;
pub mod claims;
pub mod gate;
pub mod identity;
pub mod policy;
pub mod roles;
pub mod session;

pub use assets::{AssetKind, PublicAssets};
pub use claims::{IdentityClaims, TokenValidationError, TokenVerifier, validate_claims};
pub use gate::{AccessDecision, DenialKind, evaluate};
pub use identity::CallerIdentity;
pub use policy::{
    PolicyError, ProtectedRoute, RoleRequirement, RoutePolicy, RoutePolicyConfig, RouteRuleConfig,
};
pub use roles::{Role, RoleMatching};
pub use session::{LifetimeOutOfRange, SessionState, SessionToken, TokenResponse};
