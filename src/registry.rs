//! # Service Registry
//!
//! Name-keyed storage for service definitions. The registry does no validation when a
//! service is added: dependencies may name services that are registered later, and all
//! structural problems surface from the sorter when the run begins.
//!
//! ## Replacement
//! Names are unique. Adding a definition under a name that is already registered
//! **replaces** the earlier definition entirely, dependency list included (last write wins).
//! The replaced name keeps its original insertion position, so sort tie-breaks stay stable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::service::ServiceRef;

/// One registration: a service, its name, and the names it depends on.
pub struct ServiceDef {
    pub name: String,
    pub service: ServiceRef,
    /// Dependency names, de-duplicated, in first-declared order.
    pub deps: Vec<String>,
    launched: AtomicBool,
}

impl ServiceDef {
    /// Builds a definition; repeated dependency names collapse into their first occurrence.
    pub fn new(name: impl Into<String>, service: ServiceRef, deps: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(deps.len());
        for dep in deps {
            if !unique.contains(&dep) {
                unique.push(dep);
            }
        }
        Self {
            name: name.into(),
            service,
            deps: unique,
            launched: AtomicBool::new(false),
        }
    }

    /// Claims the one-shot launch guard. Returns `true` exactly once per definition.
    pub fn claim_launch(&self) -> bool {
        !self.launched.swap(true, Ordering::AcqRel)
    }

    pub fn is_launched(&self) -> bool {
        self.launched.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ServiceDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDef")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("launched", &self.is_launched())
            .finish()
    }
}

/// Name → definition mapping plus insertion order.
#[derive(Debug, Default)]
pub struct Registry {
    defs: HashMap<String, Arc<ServiceDef>>,
    order: Vec<String>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service` under `name`, replacing any earlier definition of that name.
    pub fn add<I, S>(&mut self, name: impl Into<String>, service: ServiceRef, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let def = ServiceDef::new(name.clone(), service, deps.into_iter().map(Into::into).collect());
        debug!(service = %name, deps = ?def.deps, "Registered");

        if self.defs.insert(name.clone(), Arc::new(def)).is_some() {
            debug!(service = %name, "Replaced earlier definition");
        } else {
            self.order.push(name);
        }
    }

    /// Definition registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<ServiceDef>> {
        self.defs.get(name)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Dependency names declared by `name`, if registered.
    pub fn dependencies(&self, name: &str) -> Option<&[String]> {
        self.defs.get(name).map(|def| def.deps.as_slice())
    }

    /// Registered names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
