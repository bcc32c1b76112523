//! Dialog contract and the id-keyed registry.
//!
//! A dialog is an ordered waterfall of steps. Dialogs never hold
//! references to each other: they name siblings by id in their
//! directives, and the turn runner resolves ids through the
//! [`DialogRegistry`] lazily. This keeps construction acyclic even when
//! two dialogs route to one another.

use crate::error::EngineResult;
use crate::step::{Directive, StepContext};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// What the runner does when user input fails the pending prompt's
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnInvalid {
    /// Send the corrective message and re-issue the same prompt.
    #[default]
    Reprompt,
    /// Send the corrective message and restart this dialog from step 0,
    /// discarding the frame's values.
    Restart,
    /// Send the corrective message and end the dialog.
    End,
}

/// A multi-step waterfall dialog.
///
/// Implementations dispatch on the step index; each arm is one step of
/// the waterfall, run when the user's reply to the previous prompt
/// arrives.
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Unique id of this dialog within a registry.
    fn id(&self) -> &str;

    /// Number of steps in the waterfall.
    fn step_count(&self) -> usize;

    /// Policy applied when input fails this dialog's pending prompt.
    fn on_invalid(&self) -> OnInvalid {
        OnInvalid::default()
    }

    /// Run one step.
    ///
    /// # Errors
    ///
    /// Returns an error when a collaborator call fails in a way the
    /// dialog cannot recover from; the runner leaves the pre-turn state
    /// untouched in that case.
    async fn run_step(&self, index: usize, ctx: &mut StepContext<'_>) -> EngineResult<Directive>;
}

/// Registry of dialogs keyed by id.
#[derive(Default)]
pub struct DialogRegistry {
    dialogs: HashMap<String, Arc<dyn Dialog>>,
}

impl std::fmt::Debug for DialogRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl DialogRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dialog under its id. A later registration with the
    /// same id replaces the earlier one.
    pub fn register(&mut self, dialog: impl Dialog + 'static) {
        let dialog: Arc<dyn Dialog> = Arc::new(dialog);
        debug!(dialog = %dialog.id(), "dialog registered");
        self.dialogs.insert(dialog.id().to_string(), dialog);
    }

    /// Look up a dialog by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Dialog>> {
        self.dialogs.get(id).map(Arc::clone)
    }

    /// Whether a dialog with the given id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.dialogs.contains_key(id)
    }

    /// All registered ids, unordered.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.dialogs.keys().map(String::as_str).collect()
    }

    /// Number of registered dialogs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptSpec;

    struct Greeter;

    #[async_trait]
    impl Dialog for Greeter {
        fn id(&self) -> &str {
            "greeter"
        }

        fn step_count(&self) -> usize {
            1
        }

        async fn run_step(
            &self,
            _index: usize,
            _ctx: &mut StepContext<'_>,
        ) -> EngineResult<Directive> {
            Ok(Directive::prompt("Hello?", PromptSpec::text()))
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = DialogRegistry::new();
        assert!(registry.is_empty());

        registry.register(Greeter);
        assert!(registry.contains("greeter"));
        assert!(registry.get("greeter").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 1);
    }
}
