use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use super::NotificationChannel;
use crate::config::Discord;
use crate::{AlertEvent, Severity};

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Default)]
pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

/// Posts alerts as embeds to a Discord webhook
#[derive(Debug, Clone)]
pub struct DiscordChannel {
    client: Client,
    config: Discord,
}

impl DiscordChannel {
    pub fn new(client: Client, config: Discord) -> Self {
        Self { client, config }
    }

    fn color(severity: Severity) -> u32 {
        match severity {
            Severity::Critical => 15158332, // Red
            Severity::Warning => 15105570,  // Orange
            Severity::Info => 5793266,      // Light blue
        }
    }

    pub fn build_alert_embed(&self, alert: &AlertEvent) -> Embed {
        Embed {
            title: Some(format!(
                "{} {} Alert",
                alert.severity.emoji(),
                capitalize(alert.severity.label())
            )),
            description: Some(alert.message.clone()),
            color: Some(Self::color(alert.severity)),
            fields: vec![
                EmbedField {
                    name: "🧠 Agent".to_string(),
                    value: alert.target_name.clone(),
                    inline: true,
                },
                EmbedField {
                    name: "📏 Rule".to_string(),
                    value: alert.rule_name.clone(),
                    inline: true,
                },
            ],
            footer: Some(EmbedFooter {
                text: format!("agent-watch | {}", alert.rule_name),
            }),
            timestamp: Some(alert.timestamp.to_rfc3339()),
        }
    }

    pub fn build_message(&self, alert: &AlertEvent) -> Message {
        let mut builder = MessageBuilder::new().add_embed(self.build_alert_embed(alert));
        if let Some(user_id) = &self.config.user_id {
            builder = builder.content(format!(
                "{} `{}` <@{user_id}>",
                alert.severity.emoji(),
                alert.target_name
            ));
        }
        builder.build()
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    fn kind(&self) -> &'static str {
        "discord"
    }

    #[instrument(skip_all, fields(rule = %alert.rule_name, agent = %alert.target_name))]
    async fn send(&self, alert: &AlertEvent) -> anyhow::Result<()> {
        let message = self.build_message(alert);
        let response = self
            .client
            .post(&self.config.url)
            .json(&message)
            .send()
            .await
            .context("Discord request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Discord responded with {status}: {body}");
        }

        debug!("successfully sent Discord message");
        Ok(())
    }
}
