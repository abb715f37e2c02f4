use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::workflows::bonus::DEFAULT_MATCH_THRESHOLD;
use crate::workflows::pairing::{DistanceMetric, PairingPolicy};

/// Top-level configuration for a run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: PathConfig,
    pub telemetry: TelemetryConfig,
    pub pairing: PairingConfig,
    pub bonus: BonusConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let data_dir = env::var("PICATA_DATA_DIR").unwrap_or_else(|_| "./data/".to_string());
        let report_dir =
            env::var("PICATA_REPORT_DIR").unwrap_or_else(|_| "./figures/".to_string());

        let log_level = env::var("PICATA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let metric_value = env::var("PICATA_METRIC").unwrap_or_else(|_| "euclid".to_string());
        let metric = DistanceMetric::from_str(&metric_value)
            .map_err(|_| ConfigError::InvalidMetric(metric_value))?;
        let policy_value = env::var("PICATA_POLICY").unwrap_or_else(|_| "med".to_string());
        let policy = PairingPolicy::from_str(&policy_value)
            .map_err(|_| ConfigError::InvalidPolicy(policy_value))?;
        let seed = match env::var("PICATA_SEED") {
            Ok(value) if !value.trim().is_empty() => Some(parse_number("PICATA_SEED", &value)?),
            _ => None,
        };

        let amount = parse_number(
            "PICATA_BONUS",
            &env::var("PICATA_BONUS").unwrap_or_else(|_| "0.1".to_string()),
        )?;
        let threshold = match env::var("PICATA_BONUS_THRESHOLD") {
            Ok(value) => parse_number("PICATA_BONUS_THRESHOLD", &value)?,
            Err(_) => DEFAULT_MATCH_THRESHOLD,
        };

        Ok(Self {
            paths: PathConfig {
                data_dir: PathBuf::from(data_dir),
                report_dir: PathBuf::from(report_dir),
            },
            telemetry: TelemetryConfig { log_level },
            pairing: PairingConfig {
                metric,
                policy,
                seed,
            },
            bonus: BonusConfig { amount, threshold },
        })
    }
}

fn parse_number<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

/// Where input exports are read from and records/reports are written to.
#[derive(Debug, Clone)]
pub struct PathConfig {
    pub data_dir: PathBuf,
    pub report_dir: PathBuf,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Copy)]
pub struct PairingConfig {
    pub metric: DistanceMetric,
    pub policy: PairingPolicy,
    pub seed: Option<u64>,
}

/// Bonus setting as configured: below 1.0 a fraction of the quiz's points.
#[derive(Debug, Clone, Copy)]
pub struct BonusConfig {
    pub amount: f64,
    pub threshold: f64,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMetric(String),
    InvalidPolicy(String),
    InvalidNumber { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMetric(value) => {
                write!(f, "PICATA_METRIC must be euclid or cosine, found '{value}'")
            }
            ConfigError::InvalidPolicy(value) => {
                write!(f, "PICATA_POLICY must be max, med, min or rand, found '{value}'")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be numeric, found '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
