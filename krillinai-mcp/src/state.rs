//! Process-wide Krillinai base URL.
//!
//! The base URL is the only mutable state of the connector. It is shared by
//! every clone of the server (one per streamable HTTP session) and guarded by
//! an async `RwLock`: one writer at a time, any number of readers, and a reader
//! always sees a complete old or new value.

use krillinai_mcp_common::config::{Config, normalize_base_url};
use krillinai_mcp_common::error::ConfigError;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of a successful base URL change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrlChange {
    /// The value now in effect.
    pub new_url: String,
    /// The value it replaced.
    pub previous_url: String,
}

/// Shared, mutable Krillinai base URL.
#[derive(Debug, Clone)]
pub struct BaseUrl {
    inner: Arc<RwLock<String>>,
}

impl BaseUrl {
    /// Seed the cell from startup configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config.krillinai_url.clone())),
        }
    }

    /// Current base URL (never ends with `/`).
    pub async fn get(&self) -> String {
        self.inner.read().await.clone()
    }

    /// Replace the base URL.
    ///
    /// The new value must start with `http://` or `https://`; trailing slashes
    /// are stripped. On error the stored value is left untouched.
    pub async fn set(&self, new_url: &str) -> Result<BaseUrlChange, ConfigError> {
        let normalized = normalize_base_url(new_url)?;
        let mut guard = self.inner.write().await;
        let previous_url = std::mem::replace(&mut *guard, normalized.clone());
        Ok(BaseUrlChange {
            new_url: normalized,
            previous_url,
        })
    }
}
