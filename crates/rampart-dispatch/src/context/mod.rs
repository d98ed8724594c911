//! Per-call context: who is calling and, for HTTP calls, how.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of the actor behind a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The host itself, e.g. scheduled ticks.
    System,
    /// The local instance owner.
    Owner,
    /// A founder with override authority.
    Founder,
    /// An administrator.
    Admin,
    /// An ordinary authenticated user.
    User,
    /// An unauthenticated caller.
    Guest,
}

impl Role {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Owner => "owner",
            Self::Founder => "founder",
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a role fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported role: {0}")]
pub struct RoleParseError(String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "owner" => Ok(Self::Owner),
            "founder" => Ok(Self::Founder),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

/// Identity and scopes of a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The caller's role.
    pub role: Role,
    /// Granted scopes; `*` grants everything.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Actor {
    /// Creates an actor with explicit scopes.
    #[must_use]
    pub fn new<I>(role: Role, scopes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            role,
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// The local owner holding every scope.
    #[must_use]
    pub fn owner() -> Self {
        Self::new(Role::Owner, ["*"])
    }

    /// The host acting on its own behalf.
    #[must_use]
    pub fn system() -> Self {
        Self::new(Role::System, ["*"])
    }

    /// Returns `true` when the actor holds `scope` or the wildcard.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|held| held == "*" || held == scope)
    }
}

/// HTTP metadata for calls that arrive through the request layer.
///
/// Routing layers disagree on where the path lives, so every alias is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// HTTP method, e.g. `GET`.
    pub method: String,
    /// Routed path.
    #[serde(default)]
    pub path: Option<String>,
    /// Parsed URL path name.
    #[serde(default)]
    pub pathname: Option<String>,
    /// URL before any rewriting.
    #[serde(default)]
    pub original_url: Option<String>,
    /// Full request URL.
    #[serde(default)]
    pub url: Option<String>,
    /// The caller asked for a founder override.
    #[serde(default)]
    pub override_requested: bool,
}

impl RequestMeta {
    /// Creates request metadata for `method` and the routed `path`.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Sets the parsed path name.
    #[must_use]
    pub fn with_pathname(mut self, pathname: impl Into<String>) -> Self {
        self.pathname = Some(pathname.into());
        self
    }

    /// Sets the pre-rewrite URL.
    #[must_use]
    pub fn with_original_url(mut self, original_url: impl Into<String>) -> Self {
        self.original_url = Some(original_url.into());
        self
    }

    /// Sets the full URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Marks the request as asking for a founder override.
    #[must_use]
    pub const fn requesting_override(mut self) -> Self {
        self.override_requested = true;
        self
    }

    /// Returns `true` for `GET` requests, ignoring case.
    #[must_use]
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Every populated path alias in the order `path`, `pathname`,
    /// `original_url`, `url`.
    pub fn path_aliases(&self) -> impl Iterator<Item = &str> {
        [&self.path, &self.pathname, &self.original_url, &self.url]
            .into_iter()
            .filter_map(|alias| alias.as_deref())
    }
}

/// Context handed to the dispatcher and on to the handler.
///
/// A context without request metadata is an internal call, such as a
/// host-driven tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroContext {
    /// The caller, if known.
    #[serde(default)]
    pub actor: Option<Actor>,
    /// HTTP metadata when the call originates from a request.
    #[serde(default)]
    pub request: Option<RequestMeta>,
}

impl MacroContext {
    /// An anonymous internal context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An internal context acting as `actor`.
    #[must_use]
    pub const fn internal(actor: Actor) -> Self {
        Self {
            actor: Some(actor),
            request: None,
        }
    }

    /// A request-originated context.
    #[must_use]
    pub const fn from_request(actor: Option<Actor>, request: RequestMeta) -> Self {
        Self {
            actor,
            request: Some(request),
        }
    }

    /// Replaces the actor.
    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Returns `true` when no request metadata is attached.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.request.is_none()
    }
}

#[cfg(test)]
mod tests;
