//! Genna - A waterfall dialog engine for conversational bots.
//!
//! This crate provides the conversation machinery for building guided,
//! menu-driven chat bots: multi-step dialogs, prompt validation, a
//! per-conversation dialog stack, and pluggable state storage.
//!
//! # Architecture
//!
//! The engine is organized around these core components:
//!
//! - **Prompts** ([`prompt`]) - Input requests and their validators
//! - **Dialogs** ([`dialog`]) - Multi-step waterfalls, registered by id
//! - **Stack** ([`stack`]) - Per-conversation activation records
//! - **Runner** ([`runner`]) - Turn processing over the stack
//! - **State** ([`state`]) - Conversation and profile persistence
//! - **Collaborators** ([`collab`]) - Knowledge base, intent recognition,
//!   transcripts
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use genna::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> EngineResult<()> {
//!     let mut registry = DialogRegistry::new();
//!     registry.register(MyMenuDialog::new());
//!
//!     let runner = TurnRunner::new(
//!         Arc::new(registry),
//!         Arc::new(MemoryStateStore::new()),
//!         TurnRunnerConfig::new("my_menu"),
//!     )?;
//!     let replies = runner.handle_turn("cli:direct", "user-1", "hello").await?;
//!     Ok(())
//! }
//! ```

pub mod collab;
pub mod dialog;
pub mod error;
pub mod prompt;
pub mod runner;
pub mod stack;
pub mod state;
pub mod step;
pub mod util;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error types (centralized)
    pub use crate::error::{
        CollabError, CollabResult, EngineError, EngineResult, StoreError, StoreResult,
        ValidationError, ValidationResult,
    };

    // Prompts
    pub use crate::prompt::{CONFIRM_LABELS, PromptSpec, PromptValue, TextValidator};

    // Dialogs
    pub use crate::dialog::{Dialog, DialogRegistry, OnInvalid};

    // Steps
    pub use crate::step::{Directive, StepContext};

    // Stack
    pub use crate::stack::{DialogStack, Frame, PendingPrompt};

    // Runner
    pub use crate::runner::{TurnRunner, TurnRunnerConfig};

    // State
    pub use crate::state::{
        ConversationData, FileStateStore, MemoryStateStore, StateStore, UserProfile, UserRole,
    };

    // Collaborators
    pub use crate::collab::{
        IntentRecognizer, KbMatch, KnowledgeBase, MemoryTranscriptStore, NullTranscriptStore,
        Recognition, TranscriptEvent, TranscriptStore, record,
    };

    // Utilities
    pub use crate::util::{
        CityStateZip, digits_only, generate_id, generate_message_id, split_city_state_zip,
        timestamp_ms,
    };
}
