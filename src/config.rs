use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::{SdkError, SdkResult};

/// Prefix of the environment variables read by [`Config::from_env`]
pub const ENV_PREFIX: &str = "REDIS_";

static INSTANCE: OnceLock<Config> = OnceLock::new();

/// Redis connection parameters
///
/// Every field is optional. An unset field stays unset here; the connection layer
/// decides what an unset host or port means when it dials Redis.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Primary (write) node host
    pub host: Option<String>,

    /// Replica (read) node host
    pub replica_host: Option<String>,

    /// Password shared by primary and replica
    pub password: Option<String>,

    /// Port shared by primary and replica
    pub port: Option<u16>,

    /// Verbose logging for the SDK
    pub debug: Option<bool>,

    /// Connect over TLS
    pub tls_enabled: Option<bool>,
}

impl Config {
    /// Returns the process-wide configuration, creating it on first call
    ///
    /// The options passed to the first call are fixed for the lifetime of the process.
    /// Later calls return that same instance and silently ignore their argument.
    pub fn get_instance(options: Option<Config>) -> &'static Config {
        INSTANCE.get_or_init(|| options.unwrap_or_default())
    }

    /// Load configuration from `REDIS_*` environment variables
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> SdkResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of `REDIS_*` variables
    pub fn from_vars<I>(vars: I) -> SdkResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Config>(vars)
            .map_err(|e| SdkError::Config(format!("Failed to load config: {}", e)))
    }

    pub fn is_debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls_enabled.unwrap_or(false)
    }
}
