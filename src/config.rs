use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use tracing::trace;

use crate::{
    Severity, Target,
    alerts::HistoryOrder,
    error::{MonitorError, MonitorResult},
    rules::{Rule, RuleCondition},
    util::{
        get_default_delivery_timeout, get_default_history_size, get_default_host,
        get_default_interval, get_default_latency_threshold, get_default_status_path,
        get_default_timeout, get_default_track_resources,
    },
};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub agents: Vec<AgentConfig>,

    /// Per-probe timeout in seconds
    #[serde(default = "get_default_timeout")]
    pub timeout_secs: u64,

    /// Pause between cycles when running continuously
    #[serde(default = "get_default_interval")]
    pub interval_secs: u64,

    /// Threshold of the built-in high-latency rule
    #[serde(default = "get_default_latency_threshold")]
    pub latency_threshold_ms: f64,

    /// Rules to evaluate (defaults to agent-down and high-latency)
    pub rules: Option<Vec<RuleConfig>>,

    /// Sample memory, disk and load of the local host every cycle
    #[serde(default = "get_default_track_resources")]
    pub track_resources: bool,

    #[serde(default)]
    pub alerts: AlertsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agents: vec![
                AgentConfig::local("main", 18789),
                AgentConfig::local("dev", 19001),
                AgentConfig::local("apprentice2", 19002),
            ],
            timeout_secs: get_default_timeout(),
            interval_secs: get_default_interval(),
            latency_threshold_ms: get_default_latency_threshold(),
            rules: None,
            track_resources: get_default_track_resources(),
            alerts: AlertsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default = "get_default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default = "get_default_status_path")]
    pub path: String,
}

impl AgentConfig {
    pub fn local(name: impl ToString, port: u16) -> Self {
        Self {
            name: name.to_string(),
            host: get_default_host(),
            port,
            path: get_default_status_path(),
        }
    }

    pub fn endpoint(&self) -> String {
        let AgentConfig { host, port, path, .. } = self;
        if path.starts_with('/') {
            format!("http://{host}:{port}{path}")
        } else {
            format!("http://{host}:{port}/{path}")
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RuleConfig {
    pub name: String,
    pub condition: RuleCondition,
    pub severity: Severity,
    pub message: Option<String>,
}

impl From<RuleConfig> for Rule {
    fn from(config: RuleConfig) -> Self {
        let RuleConfig {
            name,
            condition,
            severity,
            message,
        } = config;
        let rule = Rule::new(name, condition, severity);
        match message {
            Some(template) => rule.with_template(template),
            None => rule,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AlertsConfig {
    /// Notification channels keyed by their id
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,

    /// Channel ids every alert is forwarded to (defaults to all)
    pub notify: Option<Vec<String>>,

    /// Number of alerts kept for the dashboard
    #[serde(default = "get_default_history_size")]
    pub history_size: usize,

    #[serde(default)]
    pub history_order: HistoryOrder,

    /// Seconds a single channel may take to accept an alert
    #[serde(default = "get_default_delivery_timeout")]
    pub delivery_timeout_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            channels: BTreeMap::new(),
            notify: None,
            history_size: get_default_history_size(),
            history_order: HistoryOrder::default(),
            delivery_timeout_secs: get_default_delivery_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelConfig {
    Discord(Discord),
    Webhook(Webhook),
    Console,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Discord {
    pub url: String,
    pub user_id: Option<String>,
}

/// Validated configuration, immutable for the lifetime of a monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub targets: Vec<Target>,
    pub timeout: Duration,
    pub interval: Duration,
    pub rules: Vec<Rule>,
    pub track_resources: bool,
    pub channels: BTreeMap<String, ChannelConfig>,
    pub notify: Vec<String>,
    pub history_size: usize,
    pub history_order: HistoryOrder,
    pub delivery_timeout: Duration,
}

impl Config {
    /// Validate and fill in defaults
    ///
    /// Fails fast on anything that would make a cycle meaningless: no agents,
    /// ambiguous names, an explicitly empty rule list, or zero-sized limits.
    pub fn resolve(self) -> MonitorResult<MonitorConfig> {
        let Config {
            agents,
            timeout_secs,
            interval_secs,
            latency_threshold_ms,
            rules,
            track_resources,
            alerts,
        } = self;

        if agents.is_empty() {
            return Err(MonitorError::EmptyTargets);
        }

        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(agents.len());
        for agent in agents {
            if !seen.insert(agent.name.clone()) {
                return Err(MonitorError::DuplicateTarget(agent.name));
            }
            targets.push(Target::new(&agent.name, agent.endpoint()));
        }

        if timeout_secs == 0 {
            return Err(MonitorError::InvalidConfig(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if interval_secs == 0 {
            return Err(MonitorError::InvalidConfig(
                "interval_secs must be greater than 0".to_string(),
            ));
        }

        if !(latency_threshold_ms.is_finite() && latency_threshold_ms > 0.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "latency_threshold_ms must be a positive number, got {latency_threshold_ms}"
            )));
        }

        let rules: Vec<Rule> = match rules {
            None => vec![Rule::agent_down(), Rule::high_latency(latency_threshold_ms)],
            Some(rules) if rules.is_empty() => return Err(MonitorError::EmptyRules),
            Some(rules) => rules.into_iter().map(Rule::from).collect(),
        };

        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(MonitorError::DuplicateRule(rule.name.clone()));
            }
        }

        let AlertsConfig {
            mut channels,
            notify,
            history_size,
            history_order,
            delivery_timeout_secs,
        } = alerts;

        if history_size == 0 {
            return Err(MonitorError::InvalidConfig(
                "alerts.history_size must be greater than 0".to_string(),
            ));
        }

        if delivery_timeout_secs == 0 {
            return Err(MonitorError::InvalidConfig(
                "alerts.delivery_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if channels.is_empty() {
            channels.insert("console".to_string(), ChannelConfig::Console);
        }

        // unknown ids in `notify` are reported per alert at dispatch time
        let notify = notify.unwrap_or_else(|| channels.keys().cloned().collect());

        Ok(MonitorConfig {
            targets,
            timeout: Duration::from_secs(timeout_secs),
            interval: Duration::from_secs(interval_secs),
            rules,
            track_resources,
            channels,
            notify,
            history_size,
            history_order,
            delivery_timeout: Duration::from_secs(delivery_timeout_secs),
        })
    }
}

pub fn read_config_file(path: impl AsRef<Path>) -> MonitorResult<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(MonitorError::from)
        .inspect(|config| trace!("loaded config: {config:?}"))
}
