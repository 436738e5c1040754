//! Pool configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{PoolError, PoolResult};
use super::retry::RetryPolicy;
use crate::driver::ConnectParams;

/// Pool configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Server host name or address.
    pub host: String,
    /// Account name.
    pub user: String,
    /// Account password.
    pub password: String,
    /// Database selected on every link.
    pub database: String,
    /// Server port, 0 for the standard port.
    pub port: u16,
    /// Number of handles, fixed for the pool's lifetime.
    pub capacity: usize,
    /// Close the link whenever a handle is released.
    pub close_on_release: bool,
    /// Request protocol compression.
    pub compress: bool,
    /// Reconnect behavior for unhealthy handles.
    pub retry: RetryPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            port: 0,
            capacity: 4,
            close_on_release: false,
            compress: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl PoolConfig {
    /// Create a configuration for the given server and credentials.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON configuration.
    pub fn from_json_str(json: &str) -> PoolResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> PoolResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set close_on_release flag.
    pub fn close_on_release(mut self, value: bool) -> Self {
        self.close_on_release = value;
        self
    }

    /// Set compress flag.
    pub fn compress(mut self, value: bool) -> Self {
        self.compress = value;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Check the configuration for values no pool can work with.
    pub fn validate(&self) -> PoolResult<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidConfig("capacity must be at least 1".into()));
        }
        for (name, value) in [
            ("host", &self.host),
            ("user", &self.user),
            ("database", &self.database),
        ] {
            if value.trim().is_empty() {
                return Err(PoolError::InvalidConfig(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Parameters handed to the driver for every connect.
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams::new(&self.host, &self.user, &self.password, &self.database)
            .port(self.port)
            .compress(self.compress)
    }
}
