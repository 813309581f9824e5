//! Monitor - runs complete monitoring cycles
//!
//! ## Cycle
//!
//! ```text
//!            ┌──── probe(target 1) ────┐
//! run_cycle ─┼──── probe(target 2) ────┼─→ measurements ─→ RuleEngine ─→ AlertDispatcher
//!            └──── probe(target N) ────┘         │
//!                  (concurrent, joined)          └─→ latest (dashboard)
//! ```
//!
//! All probes of a cycle are started together and joined; a slow or failing
//! agent delays the cycle by at most one probe timeout and never hides the
//! others. Alert delivery is bounded by the dispatcher's delivery timeout.
//! Cycles never overlap: `run_cycle` takes `&mut self`.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

use crate::{
    AlertEvent, Measurement, Target,
    alerts::{AlertDispatcher, AlertHistory, DispatchReport},
    channels::build_channels,
    config::MonitorConfig,
    dashboard,
    error::{MonitorError, MonitorResult},
    rules::RuleEngine,
};

use super::probe::Probe;
use super::resources::{ResourceSnapshot, ResourceTracker};

/// Everything a single cycle produced
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    /// One entry per target, in configuration order
    pub measurements: Vec<Measurement>,

    /// Alerts raised by the rule engine, in evaluation order
    pub alerts: Vec<AlertEvent>,

    /// Host resources sampled during the cycle, if tracking is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceSnapshot>,
}

pub struct Monitor {
    targets: Vec<Target>,
    probe: Probe,
    rules: RuleEngine,
    dispatcher: AlertDispatcher,
    resources: Option<ResourceTracker>,
    latest: Vec<Measurement>,
    latest_resources: Option<ResourceSnapshot>,
}

impl Monitor {
    pub fn new(
        targets: Vec<Target>,
        probe: Probe,
        rules: RuleEngine,
        dispatcher: AlertDispatcher,
    ) -> MonitorResult<Self> {
        if targets.is_empty() {
            return Err(MonitorError::EmptyTargets);
        }

        Ok(Self {
            targets,
            probe,
            rules,
            dispatcher,
            resources: None,
            latest: Vec::new(),
            latest_resources: None,
        })
    }

    /// Sample host resources alongside every cycle
    pub fn with_resources(mut self, tracker: ResourceTracker) -> Self {
        self.resources = Some(tracker);
        self
    }

    /// Build a monitor and its HTTP session from validated configuration
    ///
    /// The session is owned by the monitor and released when it is dropped.
    pub fn from_config(config: &MonitorConfig) -> MonitorResult<Self> {
        let client = Client::builder().build()?;

        let channels = build_channels(&config.channels, &client);
        let dispatcher = AlertDispatcher::new(
            channels,
            config.notify.clone(),
            AlertHistory::new(config.history_size, config.history_order),
        )
        .with_delivery_timeout(config.delivery_timeout);

        let monitor = Self::new(
            config.targets.clone(),
            Probe::new(client, config.timeout),
            RuleEngine::new(config.rules.clone()),
            dispatcher,
        )?;

        if config.track_resources {
            Ok(monitor.with_resources(ResourceTracker::new()))
        } else {
            Ok(monitor)
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Measurements of the last completed cycle (empty before the first)
    pub fn latest(&self) -> &[Measurement] {
        &self.latest
    }

    /// Host resources of the last completed cycle
    pub fn latest_resources(&self) -> Option<&ResourceSnapshot> {
        self.latest_resources.as_ref()
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// Probe every target concurrently and wait for all of them
    pub async fn probe_all(&self) -> Vec<Measurement> {
        join_all(self.targets.iter().map(|target| self.probe.check(target))).await
    }

    /// Probe, evaluate, dispatch and retain the measurements as latest
    #[instrument(skip(self), fields(targets = self.targets.len()))]
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let measurements = self.probe_all().await;
        debug_assert_eq!(measurements.len(), self.targets.len());
        let resources = self.resources.as_mut().map(ResourceTracker::snapshot);

        let alerts = self.rules.evaluate(&measurements);
        for alert in &alerts {
            let report = self.dispatcher.dispatch(alert.clone()).await;
            if !report.is_success() {
                warn!(
                    "alert '{}' for '{}' reached {} of {} channels",
                    alert.rule_name,
                    alert.target_name,
                    report.delivered.len(),
                    report.delivered.len() + report.failed.len()
                );
            }
        }

        let reachable = measurements.iter().filter(|m| m.is_reachable()).count();
        debug!(
            "cycle complete: {reachable}/{} reachable, {} alerts",
            measurements.len(),
            alerts.len()
        );

        self.latest = measurements.clone();
        self.latest_resources = resources.clone();

        CycleOutcome {
            measurements,
            alerts,
            resources,
        }
    }

    /// Run cycles every `period` until `shutdown` resolves
    ///
    /// `shutdown` is polled for the whole lifetime of the loop, including
    /// while a cycle is in flight. An interrupted cycle is dropped and leaves
    /// the previous results in place. Returns the number of completed cycles.
    pub async fn watch<S, F>(&mut self, period: Duration, shutdown: S, mut on_cycle: F) -> usize
    where
        S: Future,
        F: FnMut(&Self, &CycleOutcome),
    {
        info!(
            "monitoring {} agents every {}s",
            self.targets.len(),
            period.as_secs_f64()
        );

        tokio::pin!(shutdown);
        let mut ticker = interval(period);
        // a slow cycle delays the next one instead of overlapping it
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut completed = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                outcome = self.run_cycle() => outcome,
            };

            completed += 1;
            on_cycle(&*self, &outcome);
        }

        debug!("shutdown requested after {completed} cycles");
        completed
    }

    /// Dispatch a synthetic info alert, to one channel or to all notified ones
    pub async fn send_test_alert(
        &mut self,
        channel: Option<&str>,
        message: impl ToString,
    ) -> DispatchReport {
        let alert = AlertEvent::manual(message);
        match channel {
            Some(channel) => self.dispatcher.dispatch_to(channel, alert).await,
            None => self.dispatcher.dispatch(alert).await,
        }
    }

    /// Render the latest measurements with the recent alert history
    pub fn dashboard(&self) -> String {
        let mut output = dashboard::render(&self.latest, &self.dispatcher.history().recent());
        if let Some(snapshot) = &self.latest_resources {
            output.push_str(&dashboard::render_resources(snapshot));
        }
        output
    }
}
