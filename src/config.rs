//! Server configuration, read from the environment.

use crate::error::{BinCheckError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Upper bound on a whole multipart request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("BIN_CHECKER_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| BinCheckError::Config(format!("invalid BIN_CHECKER_PORT: {raw}")))?,
            None => defaults.port,
        };

        let max_upload_bytes = match lookup("BIN_CHECKER_MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse().map_err(|_| {
                BinCheckError::Config(format!("invalid BIN_CHECKER_MAX_UPLOAD_BYTES: {raw}"))
            })?,
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            host: lookup("BIN_CHECKER_HOST").unwrap_or(defaults.host),
            port,
            max_upload_bytes,
        })
    }

    /// Host and port for `TcpListener::bind`; host names resolve at bind time
    pub fn bind_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
