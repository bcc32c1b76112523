//! Gateway service for running the complete bot.
//!
//! The gateway is the unified entry point that wires together:
//! - Message bus
//! - Channel manager (CLI today)
//! - Dialog registry and turn runner
//! - Dialog service
//! - Collaborator clients built from configuration

use crate::backend::{ClaimApi, ClaimApiClient};
use crate::bus::MessageBus;
use crate::channel::ChannelManager;
use crate::channels::CliChannel;
use crate::config::{BotConfig, StateBackend, config_dir, require_valid, state_dir};
use crate::dialogs::{AuditFlags, DialogDeps, build_registry};
use crate::error::Result;
use crate::qna::{EmptyKnowledgeBase, HttpKnowledgeBase};
use crate::recognizer::HttpIntentRecognizer;
use crate::service::DialogService;
use crate::transcript::FileTranscriptStore;
use genna::collab::{IntentRecognizer, KnowledgeBase, NullTranscriptStore, TranscriptStore};
use genna::runner::{TurnRunner, TurnRunnerConfig};
use genna::state::{FileStateStore, MemoryStateStore, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Gateway configuration.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Bot configuration.
    pub bot_config: BotConfig,
    /// Whether to enable the CLI channel.
    pub enable_cli: bool,
}

/// Gateway service that runs the complete bot.
pub struct Gateway {
    config: GatewayConfig,
    bus: MessageBus,
    channel_manager: ChannelManager,
    service: DialogService,
    runner: Arc<TurnRunner>,
    running: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Build a gateway from configuration, constructing the
    /// collaborator clients, stores, registry, runner and service.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or a client
    /// cannot be built.
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        require_valid(&config.bot_config)?;
        let bot = &config.bot_config;

        let claims: Arc<dyn ClaimApi> = Arc::new(
            ClaimApiClient::new(&bot.backend.base_url)?
                .with_timeout(Duration::from_secs(bot.backend.timeout_secs))?
                .with_max_retries(bot.backend.max_retries),
        );

        let knowledge_base: Arc<dyn KnowledgeBase> =
            if bot.qna.enabled && !bot.qna.endpoint.is_empty() {
                Arc::new(
                    HttpKnowledgeBase::new(&bot.qna.endpoint, &bot.qna.endpoint_key)?
                        .with_top(bot.qna.top)
                        .with_score_threshold(bot.qna.score_threshold),
                )
            } else {
                Arc::new(EmptyKnowledgeBase)
            };

        let recognizer: Option<Arc<dyn IntentRecognizer>> =
            if bot.recognizer.enabled && !bot.recognizer.endpoint.is_empty() {
                Some(Arc::new(HttpIntentRecognizer::new(
                    &bot.recognizer.endpoint,
                    &bot.recognizer.subscription_key,
                )?))
            } else {
                None
            };

        let transcript: Arc<dyn TranscriptStore> = if bot.audit.enabled {
            Arc::new(FileTranscriptStore::new(config_dir().join("transcripts")))
        } else {
            Arc::new(NullTranscriptStore)
        };

        let store: Arc<dyn StateStore> = match bot.state.backend {
            StateBackend::Memory => Arc::new(MemoryStateStore::new()),
            StateBackend::File => {
                let path = bot.state.path.clone().unwrap_or_else(state_dir);
                Arc::new(FileStateStore::new(path))
            }
        };

        let audit = AuditFlags {
            enabled: bot.audit.enabled,
            log_user_name: bot.audit.log_user_name,
            log_original_message: bot.audit.log_original_message,
        };

        let registry = build_registry(Arc::new(DialogDeps {
            claims,
            knowledge_base,
            recognizer,
            transcript: Arc::clone(&transcript),
            audit,
        }));

        let runner_config = TurnRunnerConfig::new(&bot.dialog.root_dialog)
            .with_turn_timeout(Duration::from_secs(bot.dialog.turn_timeout_secs))
            .with_default_role(bot.dialog.default_role)
            .with_default_locale(bot.dialog.locale.as_str());
        let runner = Arc::new(TurnRunner::new(Arc::new(registry), store, runner_config)?);

        let bus = MessageBus::new();
        let service = DialogService::new(
            bus.clone(),
            Arc::clone(&runner),
            transcript,
            audit,
        );

        Ok(Self {
            channel_manager: ChannelManager::new(bus.clone()),
            bus,
            service,
            runner,
            config,
            running: Arc::new(RwLock::new(false)),
        })
    }

    /// Get a reference to the message bus.
    #[must_use]
    pub const fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Get a reference to the channel manager.
    #[must_use]
    pub const fn channel_manager(&self) -> &ChannelManager {
        &self.channel_manager
    }

    /// Get a reference to the turn runner.
    #[must_use]
    pub const fn runner(&self) -> &Arc<TurnRunner> {
        &self.runner
    }

    /// Register channels based on configuration.
    async fn setup_channels(&self) {
        if self.config.enable_cli {
            self.channel_manager.register(CliChannel::new()).await;
            info!("CLI channel enabled");
        }
    }

    /// Run the gateway: start the channels and the dialog service, then
    /// block until the service stops.
    ///
    /// # Errors
    ///
    /// Returns an error when the service loop fails.
    pub async fn run(&self) -> Result<()> {
        *self.running.write().await = true;
        info!("gateway starting");

        self.setup_channels().await;

        let channel_results = self.channel_manager.start_all().await;
        for result in &channel_results {
            if let Err(e) = result {
                error!(error = %e, "failed to start channel");
            }
        }

        info!("gateway started");
        let result = self.service.run().await;

        info!("gateway stopping");
        self.channel_manager.stop_all().await;
        *self.running.write().await = false;

        info!("gateway stopped");
        result
    }

    /// Stop the dialog service, unwinding [`Gateway::run`].
    pub async fn stop(&self) {
        self.service.stop().await;
    }

    /// Check if the gateway is running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Get gateway status.
    pub async fn status(&self) -> GatewayStatus {
        let channel_statuses = self.channel_manager.status_all().await;
        let bus_stats = self.bus.stats().await;

        GatewayStatus {
            running: *self.running.read().await,
            channels: channel_statuses
                .into_iter()
                .map(|s| ChannelStatusInfo {
                    name: s.name,
                    state: format!("{:?}", s.state),
                    messages_received: s.messages_received,
                    messages_sent: s.messages_sent,
                    healthy: s.healthy,
                })
                .collect(),
            total_inbound: bus_stats.inbound_count,
            total_outbound: bus_stats.outbound_count,
        }
    }
}

/// Gateway status information.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GatewayStatus {
    /// Whether the gateway is running.
    pub running: bool,
    /// Channel statuses.
    pub channels: Vec<ChannelStatusInfo>,
    /// Total inbound messages processed.
    pub total_inbound: u64,
    /// Total outbound messages processed.
    pub total_outbound: u64,
}

/// Channel status info for gateway status.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChannelStatusInfo {
    /// Channel name.
    pub name: String,
    /// Channel state.
    pub state: String,
    /// Messages received.
    pub messages_received: u64,
    /// Messages sent.
    pub messages_sent: u64,
    /// Whether the channel is healthy.
    pub healthy: bool,
}

/// Builder for creating a Gateway.
#[derive(Debug, Default)]
pub struct GatewayBuilder {
    config: GatewayConfig,
}

impl GatewayBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bot configuration.
    #[must_use]
    pub fn bot_config(mut self, config: BotConfig) -> Self {
        self.config.bot_config = config;
        self
    }

    /// Enable or disable the CLI channel.
    #[must_use]
    pub const fn enable_cli(mut self, enable: bool) -> Self {
        self.config.enable_cli = enable;
        self
    }

    /// Build the gateway.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid.
    pub fn build(self) -> Result<Gateway> {
        Gateway::from_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gateway_builds_from_default_config() {
        let gateway = GatewayBuilder::new()
            .bot_config(BotConfig::default())
            .enable_cli(false)
            .build()
            .unwrap();

        assert!(!gateway.is_running().await);
        assert_eq!(gateway.channel_manager().channel_count().await, 0);
        // The default registry carries the full dialog set.
        assert_eq!(gateway.runner().registry().len(), 8);
    }
}
