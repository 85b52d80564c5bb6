use std::num::NonZeroUsize;

use anyhow::Context;

/// Largest upload the HTTP layer accepts (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HISTORY_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub history_size: NonZeroUsize,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset or empty keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = get("IMAGE_SCRUB_PORT")
            .map(|p| p.trim().parse::<u16>())
            .transpose()
            .context("IMAGE_SCRUB_PORT must be a port number")?
            .unwrap_or(DEFAULT_PORT);

        let history_size = get("IMAGE_SCRUB_HISTORY_SIZE")
            .map(|s| s.trim().parse::<usize>())
            .transpose()
            .context("IMAGE_SCRUB_HISTORY_SIZE must be a positive integer")?
            .unwrap_or(DEFAULT_HISTORY_SIZE);
        let history_size = NonZeroUsize::new(history_size)
            .context("IMAGE_SCRUB_HISTORY_SIZE must be greater than zero")?;

        let max_upload_bytes = get("IMAGE_SCRUB_MAX_UPLOAD_BYTES")
            .map(|s| s.trim().parse::<usize>())
            .transpose()
            .context("IMAGE_SCRUB_MAX_UPLOAD_BYTES must be a byte count")?
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            port,
            history_size,
            max_upload_bytes,
        })
    }
}
