// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tag to constructor tables for checkers and actions.
//!
//! Stored triggers name their checkers and actions by type tag; the
//! registries turn a tag plus serialized state back into a live instance.
//! Registration is additive: a tag that is already registered keeps its
//! first factory.

use crate::action::TriggerAction;
use crate::checker::ConditionChecker;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Builds an instance from its serialized state.
pub type Factory<T> = Arc<dyn Fn(&Value) -> Result<T, BoxError> + Send + Sync>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{kind} type not supported: {tag}")]
    Unsupported { kind: &'static str, tag: String },
    #[error("failed to build {kind} of type {tag}: {source}")]
    Build {
        kind: &'static str,
        tag: String,
        #[source]
        source: BoxError,
    },
}

pub struct TypeRegistry<T> {
    kind: &'static str,
    factories: RwLock<BTreeMap<String, Factory<T>>>,
}

impl<T> TypeRegistry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a factory for `tag`.
    ///
    /// Returns false, leaving the existing factory in place, when the tag
    /// is already registered.
    pub fn register<F>(&self, tag: impl Into<String>, factory: F) -> bool
    where
        F: Fn(&Value) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let tag = tag.into();
        let mut factories = self.factories.write();
        if factories.contains_key(&tag) {
            tracing::debug!(kind = self.kind, %tag, "type already registered, ignoring");
            return false;
        }
        factories.insert(tag, Arc::new(factory));
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.read().contains_key(tag)
    }

    pub fn tags(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }

    pub fn create(&self, tag: &str, state: &Value) -> Result<T, RegistryError> {
        let factory = self
            .factories
            .read()
            .get(tag)
            .cloned()
            .ok_or_else(|| RegistryError::Unsupported {
                kind: self.kind,
                tag: tag.to_string(),
            })?;
        factory(state).map_err(|source| RegistryError::Build {
            kind: self.kind,
            tag: tag.to_string(),
            source,
        })
    }
}

impl<T> fmt::Debug for TypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("kind", &self.kind)
            .field("tags", &self.tags())
            .finish()
    }
}

pub type CheckerRegistry = TypeRegistry<Box<dyn ConditionChecker>>;
pub type ActionRegistry = TypeRegistry<Arc<dyn TriggerAction>>;

/// The checker and action tables handed to everything that decodes triggers.
#[derive(Debug)]
pub struct Registries {
    pub checkers: CheckerRegistry,
    pub actions: ActionRegistry,
}

impl Default for Registries {
    fn default() -> Self {
        Self {
            checkers: TypeRegistry::new("checker"),
            actions: TypeRegistry::new("action"),
        }
    }
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
