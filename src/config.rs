//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use tracing::warn;

use crate::error::{Result, TeleopError};
use crate::teleop::mapper::MapperSettings;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Node identity
#[derive(Debug, Deserialize, Clone)]
pub struct NodeConfig {
    #[serde(default = "default_node_name")]
    pub name: String,
}

/// Gamepad configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

/// Command publisher configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PublisherConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_target_address")]
    pub target_address: String,
}

/// Control subsystem services configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    #[serde(default = "default_services_address")]
    pub address: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

/// Mapping tunables
#[derive(Debug, Deserialize, Clone)]
pub struct MappingConfig {
    #[serde(default = "default_accumulator_step")]
    pub accumulator_step: f64,

    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: f32,

    #[serde(default = "default_disable_thrusters_stall_ms")]
    pub disable_thrusters_stall_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Empty means console only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_node_name() -> String { "logitech_fx10".to_string() }

fn default_queue_depth() -> usize { 64 }

fn default_bind_address() -> String { "0.0.0.0:0".to_string() }
fn default_target_address() -> String { "127.0.0.1:9000".to_string() }

fn default_services_address() -> String { "127.0.0.1:9100".to_string() }
fn default_namespace() -> String { "cola2_control".to_string() }
fn default_wait_timeout_ms() -> u64 { 10000 }
fn default_call_timeout_ms() -> u64 { 500 }
fn default_retry_interval_ms() -> u64 { 100 }

fn default_accumulator_step() -> f64 { 0.05 }
fn default_trigger_threshold() -> f32 { -0.9 }
fn default_disable_thrusters_stall_ms() -> u64 { 1000 }

fn default_log_level() -> String { "info".to_string() }

impl Default for NodeConfig {
    fn default() -> Self {
        Self { name: default_node_name() }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            target_address: default_target_address(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            address: default_services_address(),
            namespace: default_namespace(),
            wait_timeout_ms: default_wait_timeout_ms(),
            call_timeout_ms: default_call_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            accumulator_step: default_accumulator_step(),
            trigger_threshold: default_trigger_threshold(),
            disable_thrusters_stall_ms: default_disable_thrusters_stall_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

impl MappingConfig {
    /// Mapper tunables from this section.
    #[must_use]
    pub fn settings(&self) -> MapperSettings {
        MapperSettings {
            accumulator_step: self.accumulator_step,
            trigger_threshold: self.trigger_threshold,
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> TeleopError {
    TeleopError::Config(toml::de::Error::custom(message))
}

fn parse_addr(field: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|_| invalid(format!("{} must be a socket address (host:port), got '{}'", field, value)))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fx10_teleop::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to built-in defaults if the file does
    /// not exist. Parse and validation errors are still returned.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load(path)
    }

    /// Command publisher local address
    pub fn publisher_bind_addr(&self) -> Result<SocketAddr> {
        parse_addr("publisher.bind_address", &self.publisher.bind_address)
    }

    /// Command publisher destination
    pub fn publisher_target_addr(&self) -> Result<SocketAddr> {
        parse_addr("publisher.target_address", &self.publisher.target_address)
    }

    /// Control subsystem address
    pub fn services_addr(&self) -> Result<SocketAddr> {
        parse_addr("services.address", &self.services.address)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.node.name.is_empty() {
            return Err(invalid("node name cannot be empty"));
        }

        if self.controller.queue_depth == 0 || self.controller.queue_depth > 4096 {
            return Err(invalid("queue_depth must be between 1 and 4096"));
        }

        self.publisher_bind_addr()?;
        self.publisher_target_addr()?;
        self.services_addr()?;

        if self.services.namespace.trim_matches('/').is_empty() {
            return Err(invalid("services namespace cannot be empty"));
        }

        if self.services.wait_timeout_ms > 600_000 {
            return Err(invalid("wait_timeout_ms must be at most 600000"));
        }

        if self.services.call_timeout_ms == 0 || self.services.call_timeout_ms > 60000 {
            return Err(invalid("call_timeout_ms must be between 1 and 60000"));
        }

        if self.services.retry_interval_ms == 0 || self.services.retry_interval_ms > 10000 {
            return Err(invalid("retry_interval_ms must be between 1 and 10000"));
        }

        if !(self.mapping.accumulator_step > 0.0 && self.mapping.accumulator_step <= 1.0) {
            return Err(invalid("accumulator_step must be greater than 0.0 and at most 1.0"));
        }

        if !(-1.0..=1.0).contains(&self.mapping.trigger_threshold) {
            return Err(invalid("trigger_threshold must be between -1.0 and 1.0"));
        }

        if self.mapping.disable_thrusters_stall_ms > 10000 {
            return Err(invalid("disable_thrusters_stall_ms must be at most 10000"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}
