//! Named breakers for the host's external dependency classes.
//!
//! The [`BreakerRegistry`] owns one [`CircuitBreaker`] per dependency name,
//! each with independently tuned thresholds, and exposes the aggregate status
//! snapshot and bulk reset used by operational tooling.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::breaker::{BreakerSettings, BreakerStatus, CircuitBreaker};
use crate::clock::{Clock, SystemClock};
use crate::listener::{LoggingStateListener, StateListener};

/// Dependency classes every host provisions a breaker for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyClass {
    /// Model inference backend.
    Inference,
    /// Embedding generation service.
    Embeddings,
    /// Durable storage.
    Persistence,
}

impl DependencyClass {
    /// All standard classes in provisioning order.
    pub const ALL: [Self; 3] = [Self::Inference, Self::Embeddings, Self::Persistence];

    /// Returns the breaker name used for this class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inference => "inference",
            Self::Embeddings => "embeddings",
            Self::Persistence => "persistence",
        }
    }

    /// Thresholds used when the host does not configure the class.
    #[must_use]
    pub fn default_settings(self) -> BreakerSettings {
        match self {
            Self::Inference => BreakerSettings::new(3, Duration::from_secs(30), 2),
            Self::Embeddings => BreakerSettings::new(5, Duration::from_secs(15), 2),
            Self::Persistence => BreakerSettings::new(3, Duration::from_secs(5), 2),
        }
    }
}

impl fmt::Display for DependencyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a dependency class fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported dependency class: {0}")]
pub struct DependencyClassParseError(String);

impl FromStr for DependencyClass {
    type Err = DependencyClassParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inference" => Ok(Self::Inference),
            "embeddings" => Ok(Self::Embeddings),
            "persistence" => Ok(Self::Persistence),
            other => Err(DependencyClassParseError(other.to_owned())),
        }
    }
}

/// Registry of named breakers.
///
/// Breakers registered after [`with_clock`](Self::with_clock) or
/// [`with_listener`](Self::with_listener) share that clock and listener.
///
/// # Example
///
/// ```
/// use rampart_breaker::{BreakerRegistry, BreakerState, DependencyClass};
///
/// let registry = BreakerRegistry::standard();
/// let inference = registry.class(DependencyClass::Inference).expect("provisioned");
/// assert_eq!(inference.state(), BreakerState::Closed);
/// assert_eq!(registry.status().len(), 3);
/// ```
pub struct BreakerRegistry {
    breakers: BTreeMap<String, Arc<CircuitBreaker>>,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn StateListener>,
}

impl fmt::Debug for BreakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerRegistry")
            .field("breakers", &self.breakers)
            .finish_non_exhaustive()
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            breakers: BTreeMap::new(),
            clock: Arc::new(SystemClock),
            listener: Arc::new(LoggingStateListener),
        }
    }

    /// Creates a registry holding every [`DependencyClass`] with its default
    /// thresholds.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for class in DependencyClass::ALL {
            registry.register(class.as_str(), class.default_settings());
        }
        registry
    }

    /// Sets the clock handed to breakers registered afterwards.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the listener handed to breakers registered afterwards.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn StateListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Registers a breaker for `name`, returning the existing breaker when the
    /// name is already taken so live state is never discarded.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        settings: BreakerSettings,
    ) -> Arc<CircuitBreaker> {
        let name = name.into();
        let clock = Arc::clone(&self.clock);
        let listener = Arc::clone(&self.listener);
        Arc::clone(self.breakers.entry(name).or_insert_with_key(|key| {
            Arc::new(
                CircuitBreaker::new(key.clone(), settings)
                    .with_clock(clock)
                    .with_listener(listener),
            )
        }))
    }

    /// Looks up a breaker by dependency name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).cloned()
    }

    /// Looks up the breaker for a standard dependency class.
    #[must_use]
    pub fn class(&self, class: DependencyClass) -> Option<Arc<CircuitBreaker>> {
        self.get(class.as_str())
    }

    /// Returns the registered dependency names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.breakers.keys().map(String::as_str)
    }

    /// Returns a status snapshot of every breaker keyed by name.
    #[must_use]
    pub fn status(&self) -> BTreeMap<String, BreakerStatus> {
        self.breakers
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.status()))
            .collect()
    }

    /// Forces every breaker closed.
    pub fn reset_all(&self) {
        for breaker in self.breakers.values() {
            breaker.reset();
        }
    }

    /// Returns the number of registered breakers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Returns `true` when no breakers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
