//! End-to-end cycle tests against mock agents

use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_watch::{
    ProbeStatus, Severity,
    config::{AgentConfig, Config},
    monitors::Monitor,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

async fn healthy_agent() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_one_reachable_one_refused() {
    let main = healthy_agent().await;
    let recording = Arc::new(RecordingChannel::default());

    let mut monitor = create_test_monitor(
        vec![mock_target("main", &main), refused_target("dev")],
        vec![route("log", recording.clone())],
        Duration::from_secs(5),
        5000.0,
        5,
    );

    let outcome = monitor.run_cycle().await;

    assert_eq!(outcome.measurements.len(), 2);

    let main_measurement = &outcome.measurements[0];
    assert_eq!(main_measurement.target_name, "main");
    assert_eq!(main_measurement.status, ProbeStatus::Reachable);
    assert!(main_measurement.latency_ms.is_some_and(|latency| latency > 0.0));

    let dev_measurement = &outcome.measurements[1];
    assert_eq!(dev_measurement.target_name, "dev");
    assert_eq!(dev_measurement.status, ProbeStatus::Error);
    assert!(dev_measurement.latency_ms.is_none());
    assert!(dev_measurement.error_detail.is_some());

    assert_eq!(outcome.alerts.len(), 1);
    assert_eq!(outcome.alerts[0].rule_name, "agent-down");
    assert_eq!(outcome.alerts[0].target_name, "dev");
    assert_eq!(outcome.alerts[0].severity, Severity::Critical);
    assert_eq!(recording.messages(), vec!["Agent dev is error"]);

    let dashboard = monitor.dashboard();
    assert_eq!(dashboard.lines().filter(|l| l.starts_with("✅")).count(), 1);
    assert_eq!(dashboard.lines().filter(|l| l.starts_with("❌")).count(), 1);
    assert!(dashboard.contains("[critical] Agent dev is error"));
}

#[tokio::test]
async fn test_non_success_status_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut monitor = create_test_monitor(
        vec![mock_target("main", &server)],
        vec![],
        Duration::from_secs(5),
        5000.0,
        5,
    );

    let outcome = monitor.run_cycle().await;

    let measurement = &outcome.measurements[0];
    assert_eq!(measurement.status, ProbeStatus::Unreachable);
    assert_eq!(measurement.http_status, Some(503));
    assert!(measurement.latency_ms.is_none());

    assert_eq!(outcome.alerts.len(), 1);
    assert_eq!(outcome.alerts[0].message, "Agent main is unreachable");
}

#[tokio::test]
async fn test_measurements_keep_configuration_order() {
    let fast = healthy_agent().await;
    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&slow)
        .await;

    let mut monitor = create_test_monitor(
        vec![
            mock_target("slow", &slow),
            refused_target("down"),
            mock_target("fast", &fast),
        ],
        vec![],
        Duration::from_secs(5),
        5000.0,
        5,
    );

    let outcome = monitor.run_cycle().await;

    let names: Vec<_> = outcome
        .measurements
        .iter()
        .map(|m| m.target_name.as_str())
        .collect();
    assert_eq!(names, vec!["slow", "down", "fast"]);
}

#[tokio::test]
async fn test_probes_run_concurrently() {
    let mut servers = vec![];
    for _ in 0..3 {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(400)))
            .mount(&server)
            .await;
        servers.push(server);
    }

    let targets = servers
        .iter()
        .enumerate()
        .map(|(i, server)| mock_target(&format!("agent-{i}"), server))
        .collect();
    let mut monitor = create_test_monitor(targets, vec![], Duration::from_secs(5), 5000.0, 5);

    let start = Instant::now();
    let outcome = monitor.run_cycle().await;
    let elapsed = start.elapsed();

    assert_eq!(outcome.measurements.len(), 3);
    assert!(
        outcome
            .measurements
            .iter()
            .all(|m| m.status == ProbeStatus::Reachable)
    );
    // sequential probing would take at least 1200ms
    assert!(elapsed < Duration::from_millis(1100), "cycle took {elapsed:?}");
}

#[tokio::test]
async fn test_high_latency_alert() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let mut monitor = create_test_monitor(
        vec![mock_target("main", &server)],
        vec![],
        Duration::from_secs(5),
        50.0,
        5,
    );

    let outcome = monitor.run_cycle().await;

    assert_eq!(outcome.measurements[0].status, ProbeStatus::Reachable);
    assert!(outcome.measurements[0].latency_ms.unwrap() > 50.0);
    assert_eq!(outcome.alerts.len(), 1);
    assert_eq!(outcome.alerts[0].rule_name, "high-latency");
    assert_eq!(outcome.alerts[0].severity, Severity::Warning);
}

#[tokio::test]
async fn test_latest_tracks_last_cycle() {
    let main = healthy_agent().await;
    let mut monitor = create_test_monitor(
        vec![mock_target("main", &main)],
        vec![],
        Duration::from_secs(5),
        5000.0,
        5,
    );

    assert!(monitor.latest().is_empty());

    let outcome = monitor.run_cycle().await;

    assert_eq!(monitor.latest(), outcome.measurements.as_slice());
    assert!(outcome.alerts.is_empty());
    assert!(!monitor.dashboard().contains("Recent Alerts"));
}

#[tokio::test]
async fn test_watch_repeats_cycles_until_shutdown() {
    let main = healthy_agent().await;
    let mut monitor = create_test_monitor(
        vec![mock_target("main", &main)],
        vec![],
        Duration::from_secs(5),
        5000.0,
        5,
    );

    let mut seen = 0;
    let completed = monitor
        .watch(
            Duration::from_millis(50),
            tokio::time::sleep(Duration::from_millis(260)),
            |monitor, outcome| {
                seen += 1;
                assert_eq!(monitor.latest(), outcome.measurements.as_slice());
            },
        )
        .await;

    assert!(completed >= 2, "only {completed} cycles ran");
    assert_eq!(seen, completed);
}

#[tokio::test]
async fn test_watch_stops_during_slow_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut monitor = create_test_monitor(
        vec![mock_target("main", &server)],
        vec![],
        Duration::from_secs(10),
        5000.0,
        5,
    );

    let start = Instant::now();
    let completed = monitor
        .watch(
            Duration::from_secs(60),
            tokio::time::sleep(Duration::from_millis(200)),
            |_, _| {},
        )
        .await;

    assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
    assert_eq!(completed, 0);
    assert!(monitor.latest().is_empty());
}

#[tokio::test]
async fn test_cycle_samples_host_resources() {
    let config = Config {
        agents: vec![AgentConfig::local("dev", refused_port())],
        timeout_secs: 1,
        ..Config::default()
    };
    let mut monitor = Monitor::from_config(&config.resolve().unwrap()).unwrap();

    let outcome = monitor.run_cycle().await;

    let resources = outcome
        .resources
        .as_ref()
        .expect("resource tracking is on by default");
    assert!(resources.memory_total_mb > 0);
    assert_eq!(monitor.latest_resources(), Some(resources));
    assert!(monitor.dashboard().contains("Host Resources:"));

    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json["resources"]["memory_used_mb"].is_u64());
}
