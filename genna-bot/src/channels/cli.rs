//! Command-line interface channel implementation.
//!
//! Reads user messages from stdin and prints the bot's replies to
//! stdout. Useful for local testing of the dialog set.

use crate::bus::MessageBus;
use crate::channel::{Channel, ChannelBase, ChannelState, ChannelStatus};
use crate::error::{ChannelError, ChannelResult};
use crate::events::{InboundMessage, OutboundMessage};
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};

/// CLI channel configuration.
#[derive(Debug, Clone)]
pub struct CliChannelConfig {
    /// Prompt string displayed before user input.
    pub prompt: String,
    /// Chat identifier for this CLI session.
    pub chat_id: String,
}

impl Default for CliChannelConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            chat_id: "direct".to_string(),
        }
    }
}

impl CliChannelConfig {
    /// Create a new CLI channel config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prompt string.
    #[must_use]
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the chat identifier.
    #[must_use]
    pub fn chat_id(mut self, id: impl Into<String>) -> Self {
        self.chat_id = id.into();
        self
    }
}

/// Command-line interface channel.
#[derive(Debug)]
pub struct CliChannel {
    base: ChannelBase,
    config: CliChannelConfig,
    shutdown_tx: RwLock<Option<mpsc::Sender<()>>>,
}

impl CliChannel {
    /// Create a CLI channel with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CliChannelConfig::default())
    }

    /// Create a CLI channel with the given configuration.
    #[must_use]
    pub fn with_config(config: CliChannelConfig) -> Self {
        Self {
            base: ChannelBase::new("cli"),
            config,
            shutdown_tx: RwLock::new(None),
        }
    }

    /// Publish one line of user input to the bus.
    pub async fn process_input(&self, bus: &MessageBus, input: &str) -> ChannelResult<()> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let msg = InboundMessage::new("cli", "user", &self.config.chat_id, trimmed);

        self.base.record_received().await;
        bus.publish_inbound(msg)
            .await
            .map_err(|e| ChannelError::Internal(e.to_string()))?;

        Ok(())
    }

    #[allow(clippy::print_stdout)] // CLI channel intentionally prints to stdout
    fn print_message(msg: &OutboundMessage) {
        println!("\n{}\n", msg.content);
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        self.base.name()
    }

    async fn start(&self, bus: &MessageBus) -> ChannelResult<()> {
        self.base.set_state(ChannelState::Starting).await;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        *self.shutdown_tx.write().await = Some(shutdown_tx);

        let mut outbound_rx = bus.subscribe_channel("cli").await;

        #[allow(clippy::print_stdout)] // CLI channel intentionally prints to stdout
        let _output_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(msg) = outbound_rx.recv() => {
                        println!("\n{}\n", msg.content);
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("CLI output handler shutting down");
                        break;
                    }
                }
            }
        });

        self.base.set_state(ChannelState::Running).await;
        info!("CLI channel started");

        Ok(())
    }

    async fn stop(&self) -> ChannelResult<()> {
        self.base.set_state(ChannelState::Stopping).await;

        let guard = self.shutdown_tx.write().await;
        if let Some(tx) = &*guard {
            let _ = tx.send(()).await;
        }
        drop(guard);

        self.base.set_state(ChannelState::Stopped).await;
        info!("CLI channel stopped");

        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> ChannelResult<()> {
        Self::print_message(msg);
        self.base.record_sent().await;
        Ok(())
    }

    async fn status(&self) -> ChannelStatus {
        self.base.build_status().await
    }
}

/// Run an interactive CLI session.
///
/// Blocks reading stdin; each non-empty line is published to the bus and
/// replies for the `cli` channel are printed as they arrive. `exit`,
/// `quit` and `/quit` end the session.
#[allow(clippy::print_stdout)] // CLI intentionally prints to stdout
pub async fn run_interactive(bus: &MessageBus, config: CliChannelConfig) -> ChannelResult<()> {
    let prompt = config.prompt.clone();
    let chat_id = config.chat_id.clone();

    let mut outbound_rx = bus.subscribe_channel("cli").await;

    let output_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            println!("\n{}\n", msg.content);
            print!("{prompt}");
            let _ = io::stdout().flush();
        }
    });

    let stdin = io::stdin();
    let reader = stdin.lock();

    print!("{}", config.prompt);
    let _ = io::stdout().flush();

    for line in reader.lines() {
        let line = line.map_err(|e| ChannelError::Internal(e.to_string()))?;
        let trimmed = line.trim();

        if trimmed == "exit" || trimmed == "quit" || trimmed == "/quit" {
            break;
        }

        if trimmed.is_empty() {
            print!("{}", config.prompt);
            let _ = io::stdout().flush();
            continue;
        }

        let msg = InboundMessage::new("cli", "user", &chat_id, trimmed);
        bus.publish_inbound(msg)
            .await
            .map_err(|e| ChannelError::Internal(e.to_string()))?;
    }

    output_handle.abort();
    Ok(())
}
