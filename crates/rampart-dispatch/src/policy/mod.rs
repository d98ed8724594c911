//! Allow-lists, trusted roles and the default actor.

use std::collections::BTreeSet;

use crate::context::{Actor, RequestMeta, Role};

const SAFE_READ_PATHS: [&str; 5] = [
    "/api/status",
    "/api/dtus",
    "/api/settings",
    "/api/lens",
    "/api/goals",
];

const SAFE_READ_MACROS: [(&str, &str); 9] = [
    ("system", "status"),
    ("dtu", "list"),
    ("dtu", "search"),
    ("dtu", "stats"),
    ("settings", "get"),
    ("lens", "list"),
    ("lens", "get"),
    ("goals", "list"),
    ("goals", "get"),
];

const TRUSTED_ROLES: [Role; 3] = [Role::System, Role::Owner, Role::Founder];

/// Reduces a path or absolute URL to its path, dropping any query string or
/// fragment.
fn normalise_path(raw: &str) -> &str {
    let path = match raw.split_once("://") {
        Some((_, authority_and_path)) => authority_and_path
            .find('/')
            .and_then(|at| authority_and_path.get(at..))
            .unwrap_or("/"),
        None => raw,
    };
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Dispatch policy.
///
/// # Example
///
/// ```
/// use rampart_dispatch::{DispatchPolicy, RequestMeta};
///
/// let policy = DispatchPolicy::default();
/// assert!(policy.is_safe_read_request(&RequestMeta::new("GET", "/api/dtus/42?full=1")));
/// assert!(!policy.is_safe_read_request(&RequestMeta::new("POST", "/api/dtus")));
/// assert!(DispatchPolicy::default().without_default_actor().default_actor().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPolicy {
    safe_read_paths: BTreeSet<String>,
    safe_read_macros: BTreeSet<(String, String)>,
    trusted_roles: BTreeSet<Role>,
    default_actor: Option<Actor>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            safe_read_paths: SAFE_READ_PATHS.into_iter().map(str::to_owned).collect(),
            safe_read_macros: SAFE_READ_MACROS
                .into_iter()
                .map(|(domain, name)| (domain.to_owned(), name.to_owned()))
                .collect(),
            trusted_roles: TRUSTED_ROLES.into_iter().collect(),
            default_actor: Some(Actor::owner()),
        }
    }
}

impl DispatchPolicy {
    /// Requires every call to carry its own actor.
    #[must_use]
    pub fn without_default_actor(mut self) -> Self {
        self.default_actor = None;
        self
    }

    /// Substitutes `actor` for calls that carry none.
    #[must_use]
    pub fn with_default_actor(mut self, actor: Actor) -> Self {
        self.default_actor = Some(actor);
        self
    }

    /// Adds a safe-read path; sub-paths are covered too.
    #[must_use]
    pub fn allow_safe_read_path(mut self, path: impl Into<String>) -> Self {
        self.safe_read_paths.insert(path.into());
        self
    }

    /// Adds a safe-read macro.
    #[must_use]
    pub fn allow_safe_read_macro(
        mut self,
        domain: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.safe_read_macros.insert((domain.into(), name.into()));
        self
    }

    /// Adds a role whose internal calls survive guard rejections.
    #[must_use]
    pub fn trust_role(mut self, role: Role) -> Self {
        self.trusted_roles.insert(role);
        self
    }

    /// Returns the default actor, if enabled.
    #[must_use]
    pub const fn default_actor(&self) -> Option<&Actor> {
        self.default_actor.as_ref()
    }

    /// Returns `true` for trusted roles.
    #[must_use]
    pub fn is_trusted(&self, role: Role) -> bool {
        self.trusted_roles.contains(&role)
    }

    /// Returns `true` when `path` is a safe-read path or lies beneath one.
    /// Query strings are ignored.
    #[must_use]
    pub fn is_safe_read_path(&self, path: &str) -> bool {
        let path = normalise_path(path);
        self.safe_read_paths.iter().any(|safe| {
            path == safe
                || path
                    .strip_prefix(safe.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Returns `true` for a `GET` whose routed `path` is a safe read.
    #[must_use]
    pub fn is_safe_read_request(&self, request: &RequestMeta) -> bool {
        request.is_get()
            && request
                .path
                .as_deref()
                .is_some_and(|path| self.is_safe_read_path(path))
    }

    /// Returns `true` for a `GET` where any path alias is a safe read.
    #[must_use]
    pub fn is_safe_read_under_any_alias(&self, request: &RequestMeta) -> bool {
        request.is_get()
            && request
                .path_aliases()
                .any(|path| self.is_safe_read_path(path))
    }

    /// Returns `true` for allow-listed read macros.
    #[must_use]
    pub fn is_safe_read_macro(&self, domain: &str, name: &str) -> bool {
        self.safe_read_macros
            .iter()
            .any(|(safe_domain, safe_name)| safe_domain == domain && safe_name == name)
    }
}
