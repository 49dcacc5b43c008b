//! Listener and runtime settings for the payments HTTP process

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use super::error::ValidationError;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;
const MAX_SHUTDOWN_GRACE_SECS: u64 = 60;

/// Where the service listens and how long it gives requests and the
/// reconciliation worker to finish.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Selects JSON logs in production
    #[serde(default)]
    pub environment: Environment,

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound for one webhook, entitlement or policy request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long shutdown waits for the reconciliation worker to stop
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

/// Deployment stage
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl ServerConfig {
    /// Listen address; the host must be an IP literal.
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|_| ValidationError::InvalidListenAddress(raw))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        if !(1..=MAX_SHUTDOWN_GRACE_SECS).contains(&self.shutdown_grace_secs) {
            return Err(ValidationError::InvalidShutdownGrace);
        }
        self.socket_addr().map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info,streamverse_payments=debug,sqlx=warn".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_grace() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_all_interfaces() {
        let config = ServerConfig::default();

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_log_filter_keeps_sqlx_quiet() {
        let config = ServerConfig::default();
        assert!(config.log_level.contains("streamverse_payments=debug"));
        assert!(config.log_level.contains("sqlx=warn"));
    }

    #[test]
    fn hostname_is_not_a_listen_address() {
        let config = ServerConfig {
            host: "payments.internal".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidListenAddress(addr)) if addr == "payments.internal:8080"
        ));
    }

    #[test]
    fn ipv4_loopback_is_accepted() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9090,
            ..Default::default()
        };
        assert_eq!(config.socket_addr().unwrap().port(), 9090);
    }

    #[test]
    fn port_zero_is_rejected() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPort)));
    }

    #[test]
    fn request_timeout_must_stay_within_five_minutes() {
        for secs in [0, MAX_REQUEST_TIMEOUT_SECS + 1] {
            let config = ServerConfig {
                request_timeout_secs: secs,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ValidationError::InvalidTimeout)));
        }
    }

    #[test]
    fn shutdown_grace_is_bounded() {
        for secs in [0, MAX_SHUTDOWN_GRACE_SECS + 1] {
            let config = ServerConfig {
                shutdown_grace_secs: secs,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ValidationError::InvalidShutdownGrace)
            ));
        }
    }

    #[test]
    fn production_switches_log_format() {
        let config = ServerConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        assert!(config.is_production());
        assert!(!ServerConfig::default().is_production());
    }
}
