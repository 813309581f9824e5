//! Helper functions for integration tests

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_watch::{
    AlertEvent, Target,
    alerts::{AlertDispatcher, AlertHistory, HistoryOrder},
    channels::NotificationChannel,
    monitors::{Monitor, Probe},
    rules::RuleEngine,
};
use async_trait::async_trait;
use wiremock::MockServer;

/// Target pointing at the `/status` path of a mock server
pub fn mock_target(name: &str, server: &MockServer) -> Target {
    let mock_url = url::Url::parse(&server.uri()).unwrap();
    Target::new(
        name,
        format!(
            "http://{}:{}/status",
            mock_url.host_str().unwrap(),
            mock_url.port().unwrap()
        ),
    )
}

/// A local port nothing listens on
pub fn refused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Target on a local port nothing listens on
pub fn refused_target(name: &str) -> Target {
    Target::new(name, format!("http://127.0.0.1:{}/status", refused_port()))
}

/// Channel remembering every alert it received
#[derive(Default)]
pub struct RecordingChannel {
    pub received: Mutex<Vec<AlertEvent>>,
}

impl RecordingChannel {
    pub fn messages(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|alert| alert.message.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn kind(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, alert: &AlertEvent) -> anyhow::Result<()> {
        self.received.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Channel rejecting every alert
pub struct FailingChannel;

#[async_trait]
impl NotificationChannel for FailingChannel {
    fn kind(&self) -> &'static str {
        "failing"
    }

    async fn send(&self, _alert: &AlertEvent) -> anyhow::Result<()> {
        anyhow::bail!("channel is down")
    }
}

/// Pair a channel id with a channel for [`create_test_monitor`]
pub fn route<C: NotificationChannel + 'static>(
    id: &str,
    channel: Arc<C>,
) -> (&str, Arc<dyn NotificationChannel>) {
    (id, channel as Arc<dyn NotificationChannel>)
}

pub fn create_test_monitor(
    targets: Vec<Target>,
    channels: Vec<(&str, Arc<dyn NotificationChannel>)>,
    timeout: Duration,
    latency_threshold_ms: f64,
    history_size: usize,
) -> Monitor {
    let notify = channels.iter().map(|(id, _)| id.to_string()).collect();
    let channels: BTreeMap<String, Arc<dyn NotificationChannel>> = channels
        .into_iter()
        .map(|(id, channel)| (id.to_string(), channel))
        .collect();

    let dispatcher = AlertDispatcher::new(
        channels,
        notify,
        AlertHistory::new(history_size, HistoryOrder::NewestFirst),
    );

    Monitor::new(
        targets,
        Probe::new(reqwest::Client::new(), timeout),
        RuleEngine::builtin(latency_threshold_ms),
        dispatcher,
    )
    .unwrap()
}
