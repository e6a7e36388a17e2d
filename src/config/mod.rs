//! Configuration types and builders.

use crate::error::{ConfigError, McpError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::time::Duration;

/// Configuration for the shared database resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    pub connect_timeout: Duration,
    /// Simulated round-trip latency applied to each query.
    pub latency: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "app".into(),
            connect_timeout: Duration::from_secs(5),
            latency: Duration::ZERO,
        }
    }
}

/// Builder for DatabaseConfig with fluent API.
#[derive(Default)]
pub struct DatabaseConfigBuilder {
    config: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.config.latency = latency;
        self
    }

    /// Build from environment variables.
    pub fn from_env(mut self) -> Result<Self> {
        if let Ok(name) = env::var("DATABASE_NAME") {
            self.config.name = name;
        }

        if let Ok(timeout) = env::var("DATABASE_CONNECT_TIMEOUT_MS") {
            self.config.connect_timeout = parse_millis("DATABASE_CONNECT_TIMEOUT_MS", &timeout)?;
        }

        if let Ok(latency) = env::var("DATABASE_LATENCY_MS") {
            self.config.latency = parse_millis("DATABASE_LATENCY_MS", &latency)?;
        }

        Ok(self)
    }

    pub fn build(self) -> Result<DatabaseConfig> {
        self.validate()?;
        Ok(self.config)
    }

    fn validate(&self) -> Result<()> {
        if self.config.name.trim().is_empty() {
            return Err(ConfigError::MissingField("database name".into()).into());
        }
        if self.config.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout".into(),
                message: "Connect timeout must be greater than 0".into(),
            }
            .into());
        }
        Ok(())
    }
}

fn parse_millis(field: &'static str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            McpError::Config(ConfigError::InvalidValue {
                field: field.into(),
                message: format!("Expected milliseconds, got '{}'", value).into(),
            })
        })
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: Cow<'static, str>,
    pub version: Cow<'static, str>,
    pub instructions: Option<String>,
    pub database: DatabaseConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "lifespan-mcp".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            instructions: None,
            database: DatabaseConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig.
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<Cow<'static, str>>) -> Self {
        self.config.version = version.into();
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.instructions = Some(instructions.into());
        self
    }

    pub fn database(mut self, database: DatabaseConfig) -> Self {
        self.config.database = database;
        self
    }

    /// Read `MCP_SERVER_NAME` and `MCP_SERVER_INSTRUCTIONS`.
    pub fn from_env(mut self) -> Self {
        if let Ok(name) = env::var("MCP_SERVER_NAME") {
            self.config.name = name.into();
        }
        if let Ok(instructions) = env::var("MCP_SERVER_INSTRUCTIONS") {
            self.config.instructions = Some(instructions);
        }
        self
    }

    pub fn build(self) -> Result<ServerConfig> {
        if self.config.name.trim().is_empty() {
            return Err(ConfigError::MissingField("server name".into()).into());
        }
        Ok(self.config)
    }
}
