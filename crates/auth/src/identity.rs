use serde::Serialize;

use mkdi_core::{OfficeId, OrganizationId, PrincipalId};

use crate::Role;

/// An already-verified caller.
///
/// Produced by the identity verification step; the gate only reads the roles.
/// Tenant ids are carried along for handlers that scope data by office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    principal_id: PrincipalId,
    roles: Vec<Role>,
    username: Option<String>,
    email: Option<String>,
    organization_id: Option<OrganizationId>,
    office_id: Option<OfficeId>,
}

impl CallerIdentity {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self {
            principal_id,
            roles,
            username: None,
            email: None,
            organization_id: None,
            office_id: None,
        }
    }

    pub fn with_profile(mut self, username: Option<String>, email: Option<String>) -> Self {
        self.username = username;
        self.email = email;
        self
    }

    pub fn with_tenant(
        mut self,
        organization_id: Option<OrganizationId>,
        office_id: Option<OfficeId>,
    ) -> Self {
        self.organization_id = organization_id;
        self.office_id = office_id;
        self
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization_id
    }

    pub fn office_id(&self) -> Option<OfficeId> {
        self.office_id
    }
}
