use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::pairing::PairingError;
use crate::workflows::records::RecordError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Pairing(PairingError),
    Record(RecordError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Pairing(err) => write!(f, "pairing error: {}", err),
            AppError::Record(err) => write!(f, "record error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Pairing(err) => Some(err),
            AppError::Record(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<PairingError> for AppError {
    fn from(value: PairingError) -> Self {
        Self::Pairing(value)
    }
}

impl From<RecordError> for AppError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}
