//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Server configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Path of the libSQL database file.
    pub db_path: PathBuf,
    /// Onboarding behavior passed to the manager.
    pub onboarding: OnboardingConfig,
}

impl ServerConfig {
    /// Build config from `KYC_ONBOARD_*` environment variables.
    ///
    /// Unset variables fall back to defaults; set-but-unparsable ones are
    /// rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("KYC_ONBOARD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env_parse("KYC_ONBOARD_PORT")?.unwrap_or(8001);
        let db_path = std::env::var("KYC_ONBOARD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/kyc-onboard.db"));
        let simulate_latency: bool = env_parse("KYC_ONBOARD_SIMULATE_LATENCY")?.unwrap_or(true);
        let history_limit: usize = env_parse("KYC_ONBOARD_HISTORY_LIMIT")?.unwrap_or(100);

        Ok(Self {
            host,
            port,
            db_path,
            onboarding: OnboardingConfig {
                simulate_latency,
                history_limit,
            },
        })
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

/// Onboarding flow configuration.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Whether to wait before answering verification calls, imitating a
    /// remote verification service.
    pub simulate_latency: bool,
    /// Maximum number of chat messages returned by a history read.
    pub history_limit: usize,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            simulate_latency: true,
            history_limit: 100,
        }
    }
}

impl OnboardingConfig {
    /// No simulated latency (for tests).
    pub fn instant() -> Self {
        Self {
            simulate_latency: false,
            ..Self::default()
        }
    }

    /// How long a verification call of the given weight should take.
    pub fn latency(&self, latency: SimulatedLatency) -> Duration {
        if !self.simulate_latency {
            return Duration::ZERO;
        }
        match latency {
            SimulatedLatency::Short => Duration::from_secs(1),
            SimulatedLatency::Long => Duration::from_secs(2),
        }
    }
}

/// Weight of a simulated external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedLatency {
    /// OTP sends and checks, profile saves.
    Short,
    /// Document, biometric, and e-sign processing.
    Long,
}
