//! Rule evaluation against a cycle's measurements
//!
//! Rules are static predicates over a single [`Measurement`]. The engine keeps
//! no state between cycles: a condition that persists re-alerts every cycle.
//!
//! ```text
//! for measurement in configuration order:
//!     for rule in rule order:
//!         rule.condition(measurement) → AlertEvent
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{AlertEvent, Measurement, ProbeStatus, Severity};

pub const AGENT_DOWN: &str = "agent-down";
pub const HIGH_LATENCY: &str = "high-latency";

/// Predicate a rule applies to each measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    /// Status is anything but reachable
    NotReachable,

    /// Reachable with a latency strictly above the threshold
    LatencyAboveMs(f64),

    /// Status equals the given one
    StatusIs(ProbeStatus),
}

impl RuleCondition {
    pub fn matches(&self, measurement: &Measurement) -> bool {
        match self {
            RuleCondition::NotReachable => measurement.status != ProbeStatus::Reachable,
            // a missing latency is "no data", never a breach
            RuleCondition::LatencyAboveMs(threshold) => {
                measurement.is_reachable()
                    && measurement
                        .latency_ms
                        .is_some_and(|latency| latency > *threshold)
            }
            RuleCondition::StatusIs(status) => measurement.status == *status,
        }
    }

    pub fn default_template(&self) -> &'static str {
        match self {
            RuleCondition::NotReachable | RuleCondition::StatusIs(_) => "Agent {target} is {status}",
            RuleCondition::LatencyAboveMs(_) => {
                "Agent {target} latency {latency}ms exceeds {threshold}ms threshold"
            }
        }
    }

    fn threshold(&self) -> Option<f64> {
        match self {
            RuleCondition::LatencyAboveMs(threshold) => Some(*threshold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub condition: RuleCondition,
    pub severity: Severity,
    pub message_template: String,
}

impl Rule {
    pub fn new(name: impl ToString, condition: RuleCondition, severity: Severity) -> Self {
        let message_template = condition.default_template().to_string();
        Self {
            name: name.to_string(),
            condition,
            severity,
            message_template,
        }
    }

    pub fn with_template(mut self, template: impl ToString) -> Self {
        self.message_template = template.to_string();
        self
    }

    /// Fires with severity critical for any non-reachable agent
    pub fn agent_down() -> Self {
        Self::new(AGENT_DOWN, RuleCondition::NotReachable, Severity::Critical)
    }

    /// Fires with severity warning for reachable agents slower than `threshold_ms`
    pub fn high_latency(threshold_ms: f64) -> Self {
        Self::new(
            HIGH_LATENCY,
            RuleCondition::LatencyAboveMs(threshold_ms),
            Severity::Warning,
        )
    }

    pub fn evaluate(&self, measurement: &Measurement) -> Option<AlertEvent> {
        if !self.condition.matches(measurement) {
            return None;
        }

        Some(AlertEvent {
            rule_name: self.name.clone(),
            target_name: measurement.target_name.clone(),
            severity: self.severity,
            message: self.render_message(measurement),
            timestamp: measurement.timestamp,
        })
    }

    fn render_message(&self, measurement: &Measurement) -> String {
        let latency = measurement
            .latency_ms
            .map(|latency| latency.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let threshold = self
            .condition
            .threshold()
            .map(|threshold| threshold.to_string())
            .unwrap_or_default();

        self.message_template
            .replace("{target}", &measurement.target_name)
            .replace("{rule}", &self.name)
            .replace("{status}", measurement.status.label())
            .replace("{latency}", &latency)
            .replace("{threshold}", &threshold)
            .replace("{error}", measurement.error_detail.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The agent-down and high-latency rules
    pub fn builtin(latency_threshold_ms: f64) -> Self {
        Self::new(vec![
            Rule::agent_down(),
            Rule::high_latency(latency_threshold_ms),
        ])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn evaluate(&self, measurements: &[Measurement]) -> Vec<AlertEvent> {
        let alerts: Vec<AlertEvent> = measurements
            .iter()
            .flat_map(|measurement| {
                self.rules
                    .iter()
                    .filter_map(move |rule| rule.evaluate(measurement))
            })
            .collect();

        trace!(
            "evaluated {} rules against {} measurements -> {} alerts",
            self.rules.len(),
            measurements.len(),
            alerts.len()
        );

        alerts
    }
}
