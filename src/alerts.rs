//! Alert dispatching and bounded alert history
//!
//! ```text
//! AlertEvent → dispatch → [channel A, channel B, ...] (concurrently)
//!                  └────→ history (always, regardless of delivery)
//! ```
//!
//! Delivery failures are collected in a [`DispatchReport`] and logged per
//! channel; they never abort a cycle. Every send is bounded by the delivery
//! timeout, so a channel that never answers counts as a failed delivery.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use crate::AlertEvent;
use crate::channels::NotificationChannel;
use crate::error::MonitorError;
use crate::util::get_default_delivery_timeout;

/// Order in which [`AlertHistory::recent`] returns alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// FIFO ring of the most recent alerts
#[derive(Debug, Clone)]
pub struct AlertHistory {
    entries: VecDeque<AlertEvent>,
    capacity: usize,
    order: HistoryOrder,
}

impl AlertHistory {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize, order: HistoryOrder) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            order,
        }
    }

    pub fn record(&mut self, alert: AlertEvent) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(alert);
    }

    /// Retained alerts in display order
    pub fn recent(&self) -> Vec<AlertEvent> {
        match self.order {
            HistoryOrder::NewestFirst => self.entries.iter().rev().cloned().collect(),
            HistoryOrder::OldestFirst => self.entries.iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Outcome of dispatching one alert
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Channel ids that accepted the alert
    pub delivered: Vec<String>,

    /// Channel ids that failed, with the reason
    pub failed: Vec<MonitorError>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// True when at least one route was attempted and none succeeded
    pub fn all_failed(&self) -> bool {
        self.delivered.is_empty() && !self.failed.is_empty()
    }
}

pub struct AlertDispatcher {
    channels: BTreeMap<String, Arc<dyn NotificationChannel>>,
    notify: Vec<String>,
    history: AlertHistory,
    delivery_timeout: Duration,
}

impl AlertDispatcher {
    /// `notify` lists the channel ids each alert is forwarded to
    pub fn new(
        channels: BTreeMap<String, Arc<dyn NotificationChannel>>,
        notify: Vec<String>,
        history: AlertHistory,
    ) -> Self {
        Self {
            channels,
            notify,
            history,
            delivery_timeout: Duration::from_secs(get_default_delivery_timeout()),
        }
    }

    /// Upper bound for a single channel send
    pub fn with_delivery_timeout(mut self, delivery_timeout: Duration) -> Self {
        self.delivery_timeout = delivery_timeout;
        self
    }

    pub fn delivery_timeout(&self) -> Duration {
        self.delivery_timeout
    }

    pub fn history(&self) -> &AlertHistory {
        &self.history
    }

    pub fn channel_ids(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Forward an alert to every notified channel and record it
    #[instrument(skip_all, fields(rule = %alert.rule_name, agent = %alert.target_name))]
    pub async fn dispatch(&mut self, alert: AlertEvent) -> DispatchReport {
        let report = self.deliver(&self.notify, &alert).await;
        self.history.record(alert);
        report
    }

    /// Forward an alert to a single channel and record it
    #[instrument(skip(self, alert))]
    pub async fn dispatch_to(&mut self, channel_id: &str, alert: AlertEvent) -> DispatchReport {
        let route = [channel_id.to_string()];
        let report = self.deliver(&route, &alert).await;
        self.history.record(alert);
        report
    }

    async fn deliver(&self, route: &[String], alert: &AlertEvent) -> DispatchReport {
        let deliveries = route.iter().map(|id| async move {
            let Some(channel) = self.channels.get(id) else {
                return Err(MonitorError::UnknownChannel(id.clone()));
            };

            let reason = match timeout(self.delivery_timeout, channel.send(alert)).await {
                Ok(Ok(())) => return Ok(id.clone()),
                Ok(Err(e)) => format!("{e:#}"),
                Err(_) => format!(
                    "no response within {}ms",
                    self.delivery_timeout.as_millis()
                ),
            };

            Err(MonitorError::Delivery {
                channel: id.clone(),
                reason,
            })
        });

        let mut report = DispatchReport::default();
        for result in join_all(deliveries).await {
            match result {
                Ok(id) => {
                    debug!("alert delivered to channel '{id}'");
                    report.delivered.push(id);
                }
                Err(e) => {
                    error!("{e}");
                    report.failed.push(e);
                }
            }
        }

        report
    }
}
