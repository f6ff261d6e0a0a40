//! Redis cache SDK with a primary/replica connection split.
//!
//! Configure once with [`Config`], obtain a [`RedisService`], then read from the replica
//! and write to the primary. [`RedisService::get_or_compute`] (and the [`cached!`] macro)
//! provide read-through caching.

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::Config;
pub use db::{CacheStore, RedisConnection, RedisService, Role};
pub use error::{SdkError, SdkResult};
pub use models::{CachedItem, ErrorCode, ALREADY_SUBMITTED_SKIP_TRANSACTION, GENERIC_ERROR};
