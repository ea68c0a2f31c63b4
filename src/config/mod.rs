use dashmap::DashMap;
use std::env;
use std::sync::Arc;

/// Message emitted for exceptions no filter or default rule could classify.
pub const UNKNOWN_EXCEPTION_MESSAGE: &str = "Internal server error";

/// Logger context used when reporting unknown exceptions.
pub const DEFAULT_LOGGER_CONTEXT: &str = "RpcExceptionsHandler";

pub const UNKNOWN_EXCEPTION_MESSAGE_KEY: &str = "RPC_UNKNOWN_EXCEPTION_MESSAGE";
pub const LOGGER_CONTEXT_KEY: &str = "RPC_EXCEPTIONS_LOG_CONTEXT";

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Seeded from the process environment
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Settings for the exceptions handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Message carried by the generic error payload
    pub unknown_exception_message: String,
    /// Context attached to log records for unknown exceptions
    pub logger_context: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            unknown_exception_message: UNKNOWN_EXCEPTION_MESSAGE.to_string(),
            logger_context: DEFAULT_LOGGER_CONTEXT.to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Read overrides from a [`ConfigService`], falling back to the defaults.
    ///
    /// Blank values are ignored so an empty env var cannot erase the message.
    pub fn from_config(config: &ConfigService) -> Self {
        let defaults = Self::default();
        let read = |key: &str| config.get(key).filter(|v| !v.trim().is_empty());

        Self {
            unknown_exception_message: read(UNKNOWN_EXCEPTION_MESSAGE_KEY)
                .unwrap_or(defaults.unknown_exception_message),
            logger_context: read(LOGGER_CONTEXT_KEY).unwrap_or(defaults.logger_context),
        }
    }
}
