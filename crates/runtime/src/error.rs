//! Errors surfaced by the session API.

use tactics_core::{ErrorSeverity, GameError, PersistError, SlotError};
use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("failed to prepare log directory {path}")]
    LogDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Slot(err) => err.severity(),
            Self::Persist(err) => err.severity(),
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) => ErrorSeverity::Fatal,
            Self::WorkerJoin(_) => ErrorSeverity::Internal,
            Self::LogDirectory { .. } | Self::Subscriber(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::Slot(err) => err.error_code(),
            Self::Persist(err) => err.error_code(),
            Self::LogDirectory { .. } => "RUNTIME_LOG_DIRECTORY",
            Self::Subscriber(_) => "RUNTIME_SUBSCRIBER",
        }
    }
}
