use crate::db::redis::Role;

/// SDK-level errors
#[derive(thiserror::Error, Debug)]
pub enum SdkError {
    #[error("RedisService requires a Config for first initialization")]
    NotInitialized,

    #[error("Failed to connect to Redis ({role}): {cause}")]
    Connectivity { role: Role, cause: String },

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("RedisService has been disconnected")]
    Disconnected,
}

impl SdkError {
    pub(crate) fn connectivity(role: Role, cause: impl std::fmt::Display) -> Self {
        SdkError::Connectivity {
            role,
            cause: cause.to_string(),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
