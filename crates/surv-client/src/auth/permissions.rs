/*
[INPUT]:  User roles, Lemma permission strings, protected resources
[OUTPUT]: Role mappings and access decisions
[POS]:    Auth layer - role and scope based access control
[UPDATE]: When roles, permission names or protected resources change
*/

use crate::store::AuthSnapshot;
use crate::types::UserRole;

use super::LemmaAuth;

pub const PERMISSION_ADMIN: &str = "surv_admin";
pub const PERMISSION_MANAGER: &str = "surv_manager";
pub const PERMISSION_TECHNICIAN: &str = "surv_technician";

/// Protected areas of the application
pub struct SurvResource;

impl SurvResource {
    pub const DASHBOARD: &'static str = "/dashboard";
    pub const CUSTOMERS: &'static str = "/customers";
    pub const JOBS: &'static str = "/jobs";
    pub const INVOICES: &'static str = "/invoices";
    pub const ESTIMATES: &'static str = "/estimates";
    pub const REPORTS: &'static str = "/reports";
    pub const TIME_TRACKING: &'static str = "/time-tracking";
    pub const MARKETING: &'static str = "/marketing";
    pub const TECHNICIANS: &'static str = "/technicians";
    pub const ADMIN: &'static str = "/admin";

    pub const ALL: [&'static str; 10] = [
        Self::DASHBOARD,
        Self::CUSTOMERS,
        Self::JOBS,
        Self::INVOICES,
        Self::ESTIMATES,
        Self::REPORTS,
        Self::TIME_TRACKING,
        Self::MARKETING,
        Self::TECHNICIANS,
        Self::ADMIN,
    ];
}

pub fn role_from_permissions<S: AsRef<str>>(permissions: &[S]) -> UserRole {
    let has = |wanted: &[&str]| {
        permissions
            .iter()
            .any(|permission| wanted.iter().any(|w| *w == permission.as_ref()))
    };

    if has(&[PERMISSION_ADMIN, "admin", "*"]) {
        UserRole::Admin
    } else if has(&[PERMISSION_MANAGER, "manager"]) {
        UserRole::Manager
    } else {
        UserRole::Technician
    }
}

pub fn role_to_permission(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => PERMISSION_ADMIN,
        UserRole::Manager => PERMISSION_MANAGER,
        UserRole::Technician => PERMISSION_TECHNICIAN,
    }
}

pub fn has_role_access(role: UserRole, allowed: &[UserRole]) -> bool {
    allowed.contains(&role)
}

/// Gate for a protected area: role check, then the cached Lemma scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGuard {
    pub resource: Option<String>,
    pub action: String,
    pub required_roles: Vec<UserRole>,
}

impl AccessGuard {
    pub fn new() -> Self {
        Self {
            resource: None,
            action: "read".to_string(),
            required_roles: Vec::new(),
        }
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn roles(mut self, roles: &[UserRole]) -> Self {
        self.required_roles = roles.to_vec();
        self
    }

    pub fn admin_only() -> Self {
        Self::new()
            .roles(&[UserRole::Admin])
            .resource(SurvResource::ADMIN)
    }

    pub fn manager_only() -> Self {
        Self::new().roles(&[UserRole::Admin, UserRole::Manager])
    }

    /// Decide access for the current auth snapshot.
    ///
    /// The scope check only applies once the adapter is initialized;
    /// before that the role decision stands.
    pub fn check(&self, auth: &AuthSnapshot, lemma: &LemmaAuth) -> bool {
        let Some(role) = auth.role().filter(|_| auth.is_authenticated) else {
            return false;
        };

        if !self.required_roles.is_empty() && !has_role_access(role, &self.required_roles) {
            return false;
        }

        match &self.resource {
            Some(resource) if lemma.is_initialized() => lemma.verify_access(resource, &self.action),
            _ => true,
        }
    }
}

impl Default for AccessGuard {
    fn default() -> Self {
        Self::new()
    }
}
