//! Unified error types for genna-bot.
//!
//! All module-specific errors convert into the main `BotError` type so
//! the binary can surface a single failure chain.

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for genna-bot operations.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Message bus error.
    #[error("bus: {0}")]
    Bus(#[from] BusError),

    /// Channel error.
    #[error("channel: {0}")]
    Channel(#[from] ChannelError),

    /// Dialog engine error.
    #[error("engine: {0}")]
    Engine(#[from] genna::error::EngineError),

    /// Collaborator call error (backend, knowledge base, recognizer).
    #[error("collaborator: {0}")]
    Collab(#[from] genna::error::CollabError),

    /// Configuration error.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Task join error.
    #[error("task: {0}")]
    Task(String),

    /// Generic internal error.
    #[error("{0}")]
    Internal(String),
}

impl BotError {
    /// Create a config error from a string.
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(ConfigError::Invalid(msg.into()))
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<tokio::task::JoinError> for BotError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Result type alias for genna-bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

// ============================================================================
// Message Bus Errors
// ============================================================================

/// Error type for message bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Failed to send inbound message.
    #[error("inbound channel closed")]
    InboundClosed,

    /// Failed to send outbound message.
    #[error("outbound channel closed")]
    OutboundClosed,

    /// Channel not found.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
}

/// Result type for message bus operations.
pub type BusResult<T> = std::result::Result<T, BusError>;

// ============================================================================
// Channel Errors
// ============================================================================

/// Error type for channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Failed to start the channel.
    #[error("start failed: {0}")]
    StartFailed(String),

    /// Failed to stop the channel.
    #[error("stop failed: {0}")]
    StopFailed(String),

    /// Failed to send message.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Channel is not connected.
    #[error("not connected")]
    NotConnected,

    /// Internal error.
    #[error("{0}")]
    Internal(String),
}

impl ChannelError {
    /// Create a start failed error.
    #[inline]
    pub fn start(msg: impl Into<String>) -> Self {
        Self::StartFailed(msg.into())
    }

    /// Create a send failed error.
    #[inline]
    pub fn send(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// Missing required field.
    #[error("missing: {0}")]
    Missing(String),

    /// Invalid value.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create a missing field error.
    #[inline]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing(field.into())
    }

    /// Create an invalid value error.
    #[inline]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let bus_err = BusError::InboundClosed;
        let bot_err: BotError = bus_err.into();
        assert!(matches!(bot_err, BotError::Bus(_)));

        let channel_err = ChannelError::NotConnected;
        let bot_err: BotError = channel_err.into();
        assert!(matches!(bot_err, BotError::Channel(_)));

        let engine_err = genna::error::EngineError::UnknownDialog("faq".into());
        let bot_err: BotError = engine_err.into();
        assert!(matches!(bot_err, BotError::Engine(_)));
    }

    #[test]
    fn test_error_helpers() {
        let err = BotError::config("invalid backend url");
        assert!(matches!(err, BotError::Config(_)));

        let err = ChannelError::send("stdout closed");
        assert!(matches!(err, ChannelError::SendFailed(_)));
    }
}
