//! Authorization for orgdesk
//!
//! Every endpoint is gated by a `(resource, action)` capability:
//! - `Principal`: the authenticated actor, carrying a single role
//! - `RoleCapabilityMap`: immutable role → capability table, built at startup
//! - `PermissionGate`: the pure decision `check(principal, resource, action)`
//! - `PrincipalResolver`: the session seam that turns a request into a principal

use crate::core::error::AdminError;
use crate::core::store::RecordStore;
use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the id of the logged-in user
pub const SESSION_HEADER: &str = "x-session-user";

/// The authenticated actor issuing a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: String,
}

impl Principal {
    pub fn new(id: Uuid, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
        }
    }
}

/// Resource kinds that capabilities are granted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    News,
    Department,
    Employee,
    /// Sensitive staff data (guarantor details); stored with employees
    EmployeePrivate,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::News => "news",
            Resource::Department => "department",
            Resource::Employee => "employee",
            Resource::EmployeePrivate => "employee-private",
        }
    }

    /// Storage collection holding records of this resource
    pub fn collection(&self) -> &'static str {
        match self {
            Resource::News => "news",
            Resource::Department => "departments",
            Resource::Employee | Resource::EmployeePrivate => "users",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "news" => Ok(Resource::News),
            "department" => Ok(Resource::Department),
            "employee" => Ok(Resource::Employee),
            "employee-private" => Ok(Resource::EmployeePrivate),
            other => Err(format!("unknown resource '{}'", other)),
        }
    }
}

/// What a principal wants to do with a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Query,
    Modify,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Query => "query",
            Action::Modify => "modify",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Action::Query),
            "modify" => Ok(Action::Modify),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// Permission to perform `action` on `resource`
///
/// Written as `resource:action` in configuration, e.g. `employee-private:query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability {
    pub resource: Resource,
    pub action: Action,
}

impl Capability {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action) = s
            .split_once(':')
            .ok_or_else(|| format!("capability '{}' must be written resource:action", s))?;
        Ok(Self {
            resource: resource.trim().parse()?,
            action: action.trim().parse()?,
        })
    }
}

impl TryFrom<String> for Capability {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Capability> for String {
    fn from(capability: Capability) -> Self {
        capability.to_string()
    }
}

/// Immutable role → capability table
///
/// Built once from configuration and shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct RoleCapabilityMap {
    roles: HashMap<String, HashSet<Capability>>,
}

impl RoleCapabilityMap {
    pub fn new<R, C>(roles: R) -> Self
    where
        R: IntoIterator<Item = (String, C)>,
        C: IntoIterator<Item = Capability>,
    {
        Self {
            roles: roles
                .into_iter()
                .map(|(role, caps)| (role, caps.into_iter().collect()))
                .collect(),
        }
    }

    /// Whether `role` is granted `capability`; unknown roles are granted nothing
    pub fn grants(&self, role: &str, capability: &Capability) -> bool {
        self.roles
            .get(role)
            .is_some_and(|caps| caps.contains(capability))
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }
}

/// Outcome of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    DenyUnauthenticated,
    DenyForbidden,
}

/// Decides whether a principal may perform an action on a resource
///
/// Pure: no caching and no I/O, so a changed role takes effect on the next
/// request.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    capabilities: Arc<RoleCapabilityMap>,
}

impl PermissionGate {
    pub fn new(capabilities: RoleCapabilityMap) -> Self {
        Self {
            capabilities: Arc::new(capabilities),
        }
    }

    pub fn check(
        &self,
        principal: Option<&Principal>,
        resource: Resource,
        action: Action,
    ) -> GateDecision {
        let Some(principal) = principal else {
            return GateDecision::DenyUnauthenticated;
        };

        if self
            .capabilities
            .grants(&principal.role, &Capability::new(resource, action))
        {
            GateDecision::Allow
        } else {
            GateDecision::DenyForbidden
        }
    }

    /// Like [`check`](Self::check), but as a result the handlers can `?`
    pub fn authorize<'p>(
        &self,
        principal: Option<&'p Principal>,
        resource: Resource,
        action: Action,
    ) -> Result<&'p Principal, AdminError> {
        match (self.check(principal, resource, action), principal) {
            (GateDecision::Allow, Some(principal)) => Ok(principal),
            (GateDecision::DenyForbidden, Some(principal)) => {
                tracing::warn!(
                    principal = %principal.id,
                    role = %principal.role,
                    %resource,
                    %action,
                    "permission denied"
                );
                Err(AdminError::Forbidden { resource, action })
            }
            _ => Err(AdminError::Unauthenticated),
        }
    }
}

/// Turns an incoming request into the principal issuing it
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// `Ok(None)` when the request carries no valid session
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Principal>>;
}

/// Resolves the session user id from [`SESSION_HEADER`] against the users collection
///
/// The user record is loaded on every request; its `role` field becomes the
/// principal's role.
pub struct StorePrincipalResolver {
    store: Arc<dyn RecordStore>,
}

impl StorePrincipalResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PrincipalResolver for StorePrincipalResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Principal>> {
        let Some(user_id) = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
        else {
            return Ok(None);
        };

        let user = self
            .store
            .find_by_id(Resource::Employee.collection(), &user_id)
            .await?;

        Ok(user.map(|user| {
            let role = user.get_str("role").unwrap_or_default().to_string();
            Principal::new(user.id, role)
        }))
    }
}
