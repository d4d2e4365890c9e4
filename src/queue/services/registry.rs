//! Handler registry with a completeness guarantee.

use crate::queue::domain::TaskKind;
use crate::queue::ports::TaskHandler;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Maps every task kind to exactly one handler.
///
/// Registration is startup-time only; [`HandlerRegistry::ensure_complete`]
/// is the runtime half of the exhaustiveness requirement the closed
/// [`TaskKind`] enum provides at compile time.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a handler to a kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateHandler`] when the kind is already
    /// bound.
    pub fn register(
        &mut self,
        kind: TaskKind,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&kind) {
            return Err(RegistryError::DuplicateHandler(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Returns the handler bound to a kind.
    #[must_use]
    pub fn handler(&self, kind: TaskKind) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Verifies that every kind in the catalog has a handler.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingHandlers`] listing every unbound
    /// kind.
    pub fn ensure_complete(&self) -> Result<(), RegistryError> {
        let missing: Vec<TaskKind> = TaskKind::ALL
            .into_iter()
            .filter(|kind| !self.handlers.contains_key(kind))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::MissingHandlers(missing))
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.handlers.keys().map(|kind| kind.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

/// Errors returned while assembling the registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A kind was bound twice.
    #[error("handler already registered for task kind {0}")]
    DuplicateHandler(TaskKind),

    /// Catalog kinds are left without a handler.
    #[error("missing handlers for task kinds: {}", format_kinds(.0))]
    MissingHandlers(Vec<TaskKind>),
}

fn format_kinds(kinds: &[TaskKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
