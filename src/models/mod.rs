use serde::{Deserialize, Serialize};

pub mod error_code;

pub use error_code::{ErrorCode, ALREADY_SUBMITTED_SKIP_TRANSACTION, GENERIC_ERROR};

/// Result of a read-through lookup
///
/// `was_served_from_cache` tells the caller whether `value` came from Redis or was
/// freshly computed on this call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedItem<T> {
    pub value: T,
    pub was_served_from_cache: bool,
}

impl<T> CachedItem<T> {
    pub fn hit(value: T) -> Self {
        Self {
            value,
            was_served_from_cache: true,
        }
    }

    pub fn miss(value: T) -> Self {
        Self {
            value,
            was_served_from_cache: false,
        }
    }
}
