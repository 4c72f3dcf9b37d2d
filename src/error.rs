use std::path::PathBuf;

use thiserror::Error;

/// Problems loading or validating a `ControlConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Control-seat discovery failures. The controller stays unconfigured and
/// retries every tick until one of these clears.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("No main cockpit or main remote control found; tag one with \"{tag}\"")]
    NoControlSeat { tag: String },

    #[error("More than one main control seat ({cockpits} cockpits, {remotes} remotes tagged)")]
    AmbiguousControlSeat { cockpits: usize, remotes: usize },
}

/// Rejected external commands. State is never changed by a rejected command.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("\"{0}\" is not a mode, eco switch or valid number")]
    Unrecognized(String),

    #[error("Target speed {0} is not a finite number")]
    InvalidTarget(f64),

    #[error("Target speed {value} m/s is outside 0..={max} m/s")]
    TargetOutOfRange { value: f64, max: f64 },

    #[error("Controller has not acquired its actuators yet")]
    NotReady,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type CommandResult<T> = Result<T, CommandError>;
