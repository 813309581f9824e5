//! Notification channels
//!
//! A channel is anything that can accept an [`AlertEvent`]. The dispatcher only
//! sees the [`NotificationChannel`] trait, so transports can be added without
//! touching dispatch logic.
//!
//! ## Implementations
//!
//! - [`ConsoleChannel`]: writes the alert to the log
//! - [`DiscordChannel`]: posts an embed to a Discord webhook
//! - [`WebhookChannel`]: posts a JSON payload to an arbitrary URL

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::AlertEvent;
use crate::config::ChannelConfig;

pub mod console;
pub mod discord;
pub mod webhook;

pub use console::ConsoleChannel;
pub use discord::DiscordChannel;
pub use webhook::WebhookChannel;

/// Capability to deliver an alert somewhere
///
/// Implementations must be `Send + Sync`: deliveries for one alert run
/// concurrently across channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short transport name used in logs
    fn kind(&self) -> &'static str;

    /// Deliver a single alert
    ///
    /// Any error means the alert did not reach this channel. It never
    /// affects other channels or the alert history.
    async fn send(&self, alert: &AlertEvent) -> anyhow::Result<()>;
}

/// Instantiate every configured channel, sharing one HTTP client
pub fn build_channels(
    configs: &BTreeMap<String, ChannelConfig>,
    client: &Client,
) -> BTreeMap<String, Arc<dyn NotificationChannel>> {
    configs
        .iter()
        .map(|(id, config)| {
            let channel: Arc<dyn NotificationChannel> = match config {
                ChannelConfig::Console => Arc::new(ConsoleChannel),
                ChannelConfig::Discord(discord) => {
                    Arc::new(DiscordChannel::new(client.clone(), discord.clone()))
                }
                ChannelConfig::Webhook(webhook) => {
                    Arc::new(WebhookChannel::new(client.clone(), webhook.clone()))
                }
            };
            (id.clone(), channel)
        })
        .collect()
}
