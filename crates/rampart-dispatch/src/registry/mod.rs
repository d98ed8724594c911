//! Domain → name → handler registry.
//!
//! Registration is last-write-wins; callers that must not displace an
//! existing macro check [`MacroRegistry::contains`] first. Lookups clone the handler out so callers
//! never hold the lock while a macro runs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::dispatcher::DISPATCH_TARGET;
use crate::error::DispatchError;
use crate::handler::{MacroHandler, MacroSpec};

struct MacroEntry {
    spec: MacroSpec,
    handler: Arc<dyn MacroHandler>,
}

type Domains = BTreeMap<String, BTreeMap<String, MacroEntry>>;

/// Registry of macros grouped by domain.
#[derive(Default)]
pub struct MacroRegistry {
    domains: RwLock<Domains>,
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("domains", &self.list_domains())
            .finish()
    }
}

impl MacroRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `domain.name`, replacing any previous entry.
    pub fn register<H>(&self, domain: impl Into<String>, name: impl Into<String>, handler: H)
    where
        H: MacroHandler + 'static,
    {
        self.register_spec(MacroSpec::new(domain, name), Arc::new(handler));
    }

    /// Registers a shared handler under the spec's domain and name, replacing
    /// any previous entry.
    pub fn register_spec(&self, spec: MacroSpec, handler: Arc<dyn MacroHandler>) {
        let domain = spec.domain.clone();
        let name = spec.name.clone();
        let qualified = spec.qualified_name();
        let replaced = self
            .write()
            .entry(domain)
            .or_default()
            .insert(name, MacroEntry { spec, handler })
            .is_some();
        if replaced {
            tracing::debug!(
                target: DISPATCH_TARGET,
                macro_name = %qualified,
                "replaced existing macro registration"
            );
        }
    }

    /// Removes `domain.name`, returning its spec when it was registered.
    ///
    /// A domain left without macros is dropped as well.
    #[must_use]
    pub fn unregister(&self, domain: &str, name: &str) -> Option<MacroSpec> {
        let mut domains = self.write();
        let macros = domains.get_mut(domain)?;
        let removed = macros.remove(name).map(|entry| entry.spec);
        if macros.is_empty() {
            domains.remove(domain);
        }
        removed
    }

    /// Returns every domain name in sorted order.
    #[must_use]
    pub fn list_domains(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Returns the specs registered in `domain`, sorted by name; empty for an
    /// unknown domain.
    #[must_use]
    pub fn list_macros(&self, domain: &str) -> Vec<MacroSpec> {
        self.read()
            .get(domain)
            .map(|macros| macros.values().map(|entry| entry.spec.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns `true` when `domain.name` is registered.
    #[must_use]
    pub fn contains(&self, domain: &str, name: &str) -> bool {
        self.read()
            .get(domain)
            .is_some_and(|macros| macros.contains_key(name))
    }

    /// Returns the total number of registered macros.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().values().map(BTreeMap::len).sum()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Looks up the handler for `domain.name`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DomainNotFound`] or
    /// [`DispatchError::MacroNotFound`] when nothing is registered.
    pub fn resolve(&self, domain: &str, name: &str) -> Result<Arc<dyn MacroHandler>, DispatchError> {
        let domains = self.read();
        let macros = domains
            .get(domain)
            .ok_or_else(|| DispatchError::domain_not_found(domain))?;
        macros
            .get(name)
            .map(|entry| Arc::clone(&entry.handler))
            .ok_or_else(|| DispatchError::macro_not_found(domain, name))
    }

    fn read(&self) -> RwLockReadGuard<'_, Domains> {
        self.domains.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Domains> {
        self.domains.write().unwrap_or_else(PoisonError::into_inner)
    }
}
