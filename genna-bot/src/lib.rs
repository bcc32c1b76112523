//! Genna Bot - an insurance assistant built on the genna dialog engine.
//!
//! This crate wires the engine to the outside world: channels, a message
//! bus, HTTP collaborators (claims backend, knowledge base, intent
//! recognizer), transcript auditing, and the concrete dialog flows.
//!
//! # Architecture
//!
//! The bot is organized around these core components:
//!
//! - **Message Bus** ([`bus`]) - Async pub-sub between channels and the service
//! - **Channels** ([`channels`]) - Chat front-ends (CLI today)
//! - **Dialogs** ([`dialogs`]) - The waterfall flows users actually talk to
//! - **Service** ([`service`]) - Turn loop that bridges bus and engine
//! - **Gateway** ([`gateway`]) - Unified orchestration of all components
//! - **Collaborators** ([`backend`], [`qna`], [`recognizer`]) - HTTP clients
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use genna_bot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let gateway = GatewayBuilder::new()
//!         .bot_config(load_config().await?)
//!         .enable_cli(true)
//!         .build()?;
//!     gateway.run().await
//! }
//! ```

// Core modules
pub mod backend;
pub mod bus;
pub mod channel;
pub mod channels;
pub mod config;
pub mod dialogs;
pub mod error;
pub mod events;
pub mod gateway;
pub mod service;

// Collaborators and auditing
pub mod qna;
pub mod recognizer;
pub mod transcript;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error types (centralized)
    pub use crate::error::{
        BotError, BusError, BusResult, ChannelError, ChannelResult, ConfigError, ConfigResult,
        Result,
    };

    // Bus
    pub use crate::bus::{BusStats, InboundHandle, MessageBus, OutboundHandle};

    // Channel
    pub use crate::channel::{
        BoxedChannel, Channel, ChannelBase, ChannelManager, ChannelState, ChannelStatus,
    };
    pub use crate::channels::{CliChannel, CliChannelConfig};

    // Config
    pub use crate::config::{
        BotConfig, ConfigIssue, IssueLevel, StateBackend, config_dir, config_path, init_config,
        load_config, load_config_from, save_config, state_dir,
    };

    // Events
    pub use crate::events::{InboundMessage, OutboundMessage};

    // Gateway
    pub use crate::gateway::{Gateway, GatewayBuilder, GatewayConfig, GatewayStatus};

    // Service
    pub use crate::service::DialogService;

    // Dialogs
    pub use crate::dialogs::{AuditFlags, ClosingChoice, DialogDeps, build_registry};

    // Collaborators
    pub use crate::backend::{ClaimApi, ClaimApiClient, UpdateOutcome};
    pub use crate::qna::{AuditedKnowledgeBase, EmptyKnowledgeBase, HttpKnowledgeBase};
    pub use crate::recognizer::HttpIntentRecognizer;
    pub use crate::transcript::FileTranscriptStore;
}
