//! Server configuration.
//!
//! Intentionally small: defaults that work out of the box, overridable
//! through two environment variables:
//!
//! - `TRIGRID_BIND_ADDR` (default: "0.0.0.0")
//! - `TRIGRID_PORT`      (default: "8080")

use std::env;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl Config {
    /// Builds a `Config` from environment variables, falling back to the
    /// defaults above.
    ///
    /// # Errors
    /// Returns an error when `TRIGRID_PORT` is set but not a valid port
    /// number.
    pub fn from_env() -> Result<Self, std::num::ParseIntError> {
        let bind_addr =
            env::var("TRIGRID_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("TRIGRID_PORT") {
            Ok(raw) => raw.parse()?,
            Err(_) => 8080,
        };
        Ok(Self { bind_addr, port })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}
