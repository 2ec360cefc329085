/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/config.rs
*
* Operator configuration. Every setting comes from an environment variable with
* a sensible default, so the operator runs unconfigured inside a cluster. The
* parser works on an arbitrary key lookup, which keeps it testable without
* mutating the process environment.
*
* SPDX-License-Identifier: Apache-2.0
*/

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FIELD_MANAGER: &str = "workshop-operator";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the externally visible console route lives.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleRoute {
    pub namespace: String,
    pub name: String,
    /// Prefix stripped from the route host to obtain the apps hostname suffix.
    pub host_prefix: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorConfig {
    pub metrics_addr: SocketAddr,
    pub retry_interval: Duration,
    pub resync_interval: Duration,
    pub error_backoff: Duration,
    pub console_route: ConsoleRoute,
    pub jaeger_enabled: bool,
    pub field_manager: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            retry_interval: Duration::from_secs(15),
            resync_interval: Duration::from_secs(300),
            error_backoff: Duration::from_secs(30),
            console_route: ConsoleRoute {
                namespace: "openshift-console".to_string(),
                name: "console".to_string(),
                host_prefix: "console-openshift-console.".to_string(),
            },
            jaeger_enabled: false,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

impl OperatorConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("WORKSHOP_METRICS_ADDR") {
            config.metrics_addr = value.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    key: "WORKSHOP_METRICS_ADDR",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(value) = lookup("WORKSHOP_RETRY_INTERVAL_SECS") {
            config.retry_interval = parse_secs("WORKSHOP_RETRY_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = lookup("WORKSHOP_RESYNC_INTERVAL_SECS") {
            config.resync_interval = parse_secs("WORKSHOP_RESYNC_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = lookup("WORKSHOP_ERROR_BACKOFF_SECS") {
            config.error_backoff = parse_secs("WORKSHOP_ERROR_BACKOFF_SECS", &value)?;
        }
        if let Some(value) = lookup("WORKSHOP_CONSOLE_ROUTE") {
            let (namespace, name) = value
                .split_once('/')
                .filter(|(ns, n)| !ns.is_empty() && !n.is_empty())
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "WORKSHOP_CONSOLE_ROUTE",
                    value: value.clone(),
                    reason: "expected '<namespace>/<name>'".to_string(),
                })?;
            config.console_route.namespace = namespace.to_string();
            config.console_route.name = name.to_string();
        }
        if let Some(value) = lookup("WORKSHOP_CONSOLE_HOST_PREFIX") {
            config.console_route.host_prefix = value;
        }
        if let Some(value) = lookup("WORKSHOP_JAEGER_ENABLED") {
            config.jaeger_enabled = parse_bool("WORKSHOP_JAEGER_ENABLED", &value)?;
        }
        if let Some(value) = lookup("WORKSHOP_FIELD_MANAGER") {
            if !value.is_empty() {
                config.field_manager = value;
            }
        }

        Ok(config)
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
