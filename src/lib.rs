pub mod alerts;
pub mod channels;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod monitors;
pub mod rules;
pub mod util;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monitored agent endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub endpoint: String,
}

impl Target {
    pub fn new(name: impl ToString, endpoint: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Reachable,
    Unreachable,
    Error,
}

impl ProbeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProbeStatus::Reachable => "reachable",
            ProbeStatus::Unreachable => "unreachable",
            ProbeStatus::Error => "error",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of probing a single target once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub target_name: String,
    pub status: ProbeStatus,

    /// Round-trip time until response headers, only set when reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,

    /// HTTP status code of a non-success response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    /// Transport-level cause, only set for `ProbeStatus::Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl Measurement {
    pub fn reachable(target_name: impl ToString, latency_ms: f64) -> Self {
        Self {
            target_name: target_name.to_string(),
            status: ProbeStatus::Reachable,
            latency_ms: Some(latency_ms),
            http_status: None,
            error_detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn unreachable(target_name: impl ToString, http_status: u16) -> Self {
        Self {
            target_name: target_name.to_string(),
            status: ProbeStatus::Unreachable,
            latency_ms: None,
            http_status: Some(http_status),
            error_detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(target_name: impl ToString, detail: impl ToString) -> Self {
        Self {
            target_name: target_name.to_string(),
            status: ProbeStatus::Error,
            latency_ms: None,
            http_status: None,
            error_detail: Some(detail.to_string()),
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_reachable(&self) -> bool {
        self.status == ProbeStatus::Reachable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Warning => "⚠️",
            Severity::Critical => "🚨",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An alert produced when a rule matches a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub rule_name: String,
    pub target_name: String,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    /// Synthetic alert not tied to any rule evaluation
    pub fn manual(message: impl ToString) -> Self {
        Self {
            rule_name: "manual-test".to_string(),
            target_name: "all".to_string(),
            severity: Severity::Info,
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}
