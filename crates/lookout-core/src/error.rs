use thiserror::Error;

use crate::domain::EngineStatus;

#[derive(Debug, Error)]
pub enum ResolverError {
    /// A registration received no handler, or an argument could not be parsed.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("query has already been started")]
    QueryAlreadyStarted,

    #[error("engine error: {0}")]
    Engine(EngineStatus),

    #[error("context is closed")]
    ContextClosed,

    /// Raised by a user callback.
    #[error("callback failed: {0}")]
    Callback(String),

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ResolverError {
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }
}
