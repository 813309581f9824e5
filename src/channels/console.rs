use async_trait::async_trait;
use tracing::{error, info, warn};

use super::NotificationChannel;
use crate::{AlertEvent, Severity};

/// Writes alerts to the log at a level matching their severity
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleChannel;

impl ConsoleChannel {
    pub fn format(alert: &AlertEvent) -> String {
        format!(
            "[ALERT] {}: {}",
            alert.severity.label().to_uppercase(),
            alert.message
        )
    }
}

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    fn kind(&self) -> &'static str {
        "console"
    }

    async fn send(&self, alert: &AlertEvent) -> anyhow::Result<()> {
        let line = Self::format(alert);
        match alert.severity {
            Severity::Critical => error!(target: "agent_watch::alert", "{line}"),
            Severity::Warning => warn!(target: "agent_watch::alert", "{line}"),
            Severity::Info => info!(target: "agent_watch::alert", "{line}"),
        }
        Ok(())
    }
}
