//! The route authorization gate.
//!
//! - No IO
//! - No panics
//! - Fail-closed: a path no route declares is denied

use serde::Serialize;

use crate::{CallerIdentity, RoleRequirement, RoutePolicy};

/// Outcome of a single gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    Deny(DenialKind),
}

/// Why a request was denied.
///
/// The hosting layer uses this to choose between a sign-in redirect and a
/// forbidden response; callers that only need Allow/Deny can ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// No verified identity accompanied the request.
    Unauthenticated,
    /// The caller is known but no route in the table covers the path.
    NoMatchingRoute,
    /// The matching route requires a role the caller does not hold.
    MissingRole,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    pub fn denial(&self) -> Option<DenialKind> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::Deny(kind) => Some(*kind),
        }
    }
}

/// Decide whether `path` may be served to `caller`.
pub fn evaluate(
    policy: &RoutePolicy,
    path: &str,
    caller: Option<&CallerIdentity>,
) -> AccessDecision {
    if policy.is_public_path(path) {
        return AccessDecision::Allow;
    }

    let Some(caller) = caller else {
        return AccessDecision::Deny(DenialKind::Unauthenticated);
    };

    let Some((_, route)) = policy.first_match(path) else {
        return AccessDecision::Deny(DenialKind::NoMatchingRoute);
    };

    match route.requirement() {
        RoleRequirement::Authenticated => AccessDecision::Allow,
        RoleRequirement::AnyOf(required) => {
            if policy.role_matching().any_satisfies(caller.roles(), required) {
                AccessDecision::Allow
            } else {
                AccessDecision::Deny(DenialKind::MissingRole)
            }
        }
    }
}

impl RoutePolicy {
    pub fn evaluate(&self, path: &str, caller: Option<&CallerIdentity>) -> AccessDecision {
        evaluate(self, path, caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProtectedRoute, Role, RoleMatching};
    use mkdi_core::PrincipalId;
    use proptest::prelude::*;

    fn caller(roles: &[&'static str]) -> CallerIdentity {
        CallerIdentity::new(
            PrincipalId::new(),
            roles.iter().map(|r| Role::new(*r)).collect(),
        )
    }

    fn standard() -> RoutePolicy {
        RoutePolicy::standard().unwrap()
    }

    #[test]
    fn public_asset_allowed_without_caller() {
        let decision = standard().evaluate("/assets/images/logo.png", None);
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[test]
    fn organization_pages_deny_members() {
        let decision = standard().evaluate("/dashboard/organization/offices", Some(&caller(&["member"])));
        assert_eq!(decision, AccessDecision::Deny(DenialKind::MissingRole));
    }

    #[test]
    fn organization_pages_allow_role_containing_org_admin() {
        let decision = standard().evaluate(
            "/dashboard/organization/offices",
            Some(&caller(&["org_admin_senior"])),
        );
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[test]
    fn exact_matching_rejects_role_containing_org_admin() {
        let policy = standard().with_role_matching(RoleMatching::Exact);
        let decision = policy.evaluate(
            "/dashboard/organization/offices",
            Some(&caller(&["org_admin_senior"])),
        );
        assert_eq!(decision, AccessDecision::Deny(DenialKind::MissingRole));

        let decision = policy.evaluate("/dashboard/organization/offices", Some(&caller(&["org_admin"])));
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[test]
    fn payments_allow_role_less_caller() {
        let decision = standard().evaluate("/dashboard/payments", Some(&caller(&[])));
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[test]
    fn undeclared_route_denied_even_for_admin() {
        let decision = standard().evaluate("/unknown/route", Some(&caller(&["org_admin"])));
        assert_eq!(decision, AccessDecision::Deny(DenialKind::NoMatchingRoute));
    }

    #[test]
    fn missing_caller_denied_on_protected_route() {
        let decision = standard().evaluate("/dashboard", None);
        assert_eq!(decision, AccessDecision::Deny(DenialKind::Unauthenticated));
        assert!(!decision.is_allowed());
        assert_eq!(decision.denial(), Some(DenialKind::Unauthenticated));
    }

    #[test]
    fn office_routes_need_office_admin() {
        let policy = standard();
        assert!(policy.evaluate("/office/1/agents", Some(&caller(&["office_admin"]))).is_allowed());
        assert!(policy.evaluate("/wallet/9", Some(&caller(&["office_admin"]))).is_allowed());
        assert!(!policy.evaluate("/office/1/agents", Some(&caller(&["org_admin"]))).is_allowed());
    }

    #[test]
    fn first_matching_route_wins() {
        let permissive_first = RoutePolicy::new(vec![
            ProtectedRoute::authenticated("/reports(?:/.*)?").unwrap(),
            ProtectedRoute::any_of("/reports/annual", ["org_admin"]).unwrap(),
        ]);
        let strict_first = RoutePolicy::new(vec![
            ProtectedRoute::any_of("/reports/annual", ["org_admin"]).unwrap(),
            ProtectedRoute::authenticated("/reports(?:/.*)?").unwrap(),
        ]);

        let member = caller(&["member"]);
        assert!(permissive_first.evaluate("/reports/annual", Some(&member)).is_allowed());
        assert_eq!(
            strict_first.evaluate("/reports/annual", Some(&member)),
            AccessDecision::Deny(DenialKind::MissingRole)
        );
        // Non-overlapping paths fall through to the second rule.
        assert!(strict_first.evaluate("/reports/monthly", Some(&member)).is_allowed());
    }

    #[test]
    fn empty_table_denies_everything_but_assets() {
        let policy = RoutePolicy::new(Vec::new());
        assert!(policy.evaluate("/favicon.ico", None).is_allowed());
        assert_eq!(
            policy.evaluate("/", Some(&caller(&["org_admin"]))),
            AccessDecision::Deny(DenialKind::NoMatchingRoute)
        );
    }

    #[test]
    fn decision_serializes_with_reason() {
        let json = serde_json::to_value(AccessDecision::Deny(DenialKind::MissingRole)).unwrap();
        assert_eq!(json, serde_json::json!({ "decision": "deny", "reason": "missing_role" }));
    }

    fn any_roles() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z_]{0,16}", 0..4)
    }

    fn caller_from(roles: Vec<String>) -> CallerIdentity {
        CallerIdentity::new(PrincipalId::new(), roles.into_iter().map(Role::from).collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: public assets are allowed whoever asks.
        #[test]
        fn public_assets_always_allowed(
            dir in "[a-z]{1,8}",
            stem in "[a-zA-Z0-9_-]{1,12}",
            ext in prop::sample::select(vec!["png", "jpg", "svg", "ico", "woff2"]),
            roles in prop::option::of(any_roles()),
        ) {
            let path = format!("/assets/{dir}/{stem}.{ext}");
            let caller = roles.map(caller_from);
            prop_assert_eq!(standard().evaluate(&path, caller.as_ref()), AccessDecision::Allow);
        }

        /// Property: without a caller, anything that is not a public asset is denied.
        #[test]
        fn anonymous_non_assets_denied(segments in prop::collection::vec("[a-z_]{1,10}", 0..5)) {
            let path = format!("/{}", segments.join("/"));
            prop_assert_eq!(
                standard().evaluate(&path, None),
                AccessDecision::Deny(DenialKind::Unauthenticated)
            );
        }

        /// Property: paths under an undeclared top-level segment are denied for any caller.
        #[test]
        fn undeclared_paths_fail_closed(
            rest in prop::collection::vec("[a-z]{1,8}", 0..3),
            roles in any_roles(),
        ) {
            let mut path = "/zz-undeclared".to_string();
            for seg in rest {
                path.push('/');
                path.push_str(&seg);
            }
            prop_assert_eq!(
                standard().evaluate(&path, Some(&caller_from(roles))),
                AccessDecision::Deny(DenialKind::NoMatchingRoute)
            );
        }

        /// Property: evaluation is a pure function of its inputs.
        #[test]
        fn evaluation_is_deterministic(
            segments in prop::collection::vec("[a-z_]{1,10}", 0..4),
            roles in any_roles(),
        ) {
            let path = format!("/{}", segments.join("/"));
            let policy = standard();
            let caller = caller_from(roles);
            prop_assert_eq!(policy.evaluate(&path, Some(&caller)), policy.evaluate(&path, Some(&caller)));
        }
    }
}
