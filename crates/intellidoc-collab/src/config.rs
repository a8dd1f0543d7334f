//! Client configuration loaded from environment variables.
//!
//! Everything has a sensible default so the client starts with zero
//! configuration.

/// Collaboration client configuration.
#[derive(Debug, Clone)]
pub struct CollabConfig {
    /// Maximum number of messages a chat subscription delivers per snapshot.
    /// Env: `INTELLIDOC_MESSAGE_PAGE_SIZE`
    /// Default: `50`
    pub message_page_size: usize,

    /// Number of relationship-status entries memoized before the cache is
    /// cleared wholesale.
    /// Env: `INTELLIDOC_STATUS_CACHE_CAPACITY`
    /// Default: `64`
    pub status_cache_capacity: usize,
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            message_page_size: 50,
            status_cache_capacity: 64,
        }
    }
}

impl CollabConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults. Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("INTELLIDOC_MESSAGE_PAGE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.message_page_size = n,
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid INTELLIDOC_MESSAGE_PAGE_SIZE, using default"
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("INTELLIDOC_STATUS_CACHE_CAPACITY") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.status_cache_capacity = n,
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid INTELLIDOC_STATUS_CACHE_CAPACITY, using default"
                    );
                }
            }
        }

        config
    }
}
