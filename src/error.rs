//! Error types for configuration and alert delivery

use std::fmt;

/// Result type alias for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors surfaced by the monitor core
///
/// Probe faults are not represented here: they are captured as
/// [`Measurement`](crate::Measurement) data and never propagate.
#[derive(Debug)]
pub enum MonitorError {
    /// No agents configured
    EmptyTargets,

    /// Two agents share the same name
    DuplicateTarget(String),

    /// Rule list was given but is empty
    EmptyRules,

    /// Two rules share the same name
    DuplicateRule(String),

    /// Any other invalid configuration value
    InvalidConfig(String),

    /// Alert routed to a channel id that is not configured
    UnknownChannel(String),

    /// A channel rejected the alert or could not be reached
    Delivery { channel: String, reason: String },

    /// HTTP client could not be constructed
    Http(reqwest::Error),

    /// I/O error (config file access, etc.)
    Io(std::io::Error),

    /// Configuration file could not be parsed
    Parse(serde_json::Error),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::EmptyTargets => write!(f, "no agents configured, nothing to monitor"),
            MonitorError::DuplicateTarget(name) => {
                write!(f, "agent name '{}' is configured more than once", name)
            }
            MonitorError::EmptyRules => write!(f, "rule list is present but empty"),
            MonitorError::DuplicateRule(name) => {
                write!(f, "rule name '{}' is configured more than once", name)
            }
            MonitorError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            MonitorError::UnknownChannel(id) => {
                write!(f, "notification channel '{}' is not configured", id)
            }
            MonitorError::Delivery { channel, reason } => {
                write!(f, "delivery to channel '{}' failed: {}", channel, reason)
            }
            MonitorError::Http(err) => write!(f, "failed to build HTTP client: {}", err),
            MonitorError::Io(err) => write!(f, "I/O error: {}", err),
            MonitorError::Parse(err) => write!(f, "invalid configuration file: {}", err),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Http(err) => Some(err),
            MonitorError::Io(err) => Some(err),
            MonitorError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Io(err)
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Parse(err)
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::Http(err)
    }
}
