use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

use super::NotificationChannel;
use crate::AlertEvent;
use crate::config::Webhook;

/// Posts alerts as a flat JSON document to an arbitrary URL
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: Client,
    config: Webhook,
}

impl WebhookChannel {
    pub fn new(client: Client, config: Webhook) -> Self {
        Self { client, config }
    }

    pub fn payload(alert: &AlertEvent) -> serde_json::Value {
        json!({
            "message": format!("{} {}", alert.severity.emoji(), alert.message),
            "rule": alert.rule_name,
            "target": alert.target_name,
            "severity": alert.severity,
            "timestamp": alert.timestamp.to_rfc3339()
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn kind(&self) -> &'static str {
        "webhook"
    }

    #[instrument(skip_all, fields(rule = %alert.rule_name, agent = %alert.target_name))]
    async fn send(&self, alert: &AlertEvent) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&Self::payload(alert))
            .send()
            .await
            .context("webhook request failed")?;

        if !response.status().is_success() {
            bail!("webhook responded with {}", response.status());
        }

        debug!("successfully sent webhook alert");
        Ok(())
    }
}
