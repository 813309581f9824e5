//! Single health request against one agent
//!
//! A probe never fails outward. Every outcome becomes a [`Measurement`]:
//!
//! ```text
//! 2xx response         → Reachable   (latency until headers)
//! non-2xx response     → Unreachable (status code kept)
//! timeout / transport  → Error       (cause kept)
//! ```

use std::error::Error as _;
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{instrument, trace, warn};

use crate::{Measurement, Target, util::round_ms};

/// Smallest latency a reachable agent can report
pub const MIN_LATENCY_MS: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct Probe {
    /// Shared connection pool, safe for concurrent probes
    client: Client,

    /// Upper bound for a single request
    timeout: Duration,
}

impl Probe {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip_all, fields(agent = %target.name))]
    pub async fn check(&self, target: &Target) -> Measurement {
        trace!("probing {}", target.endpoint);

        let start = Instant::now();
        let response = self
            .client
            .get(&target.endpoint)
            .timeout(self.timeout)
            .send()
            .await;
        // `send` resolves once the response headers are in
        let latency_ms = latency_ms(start.elapsed());

        match response {
            Ok(response) if response.status().is_success() => {
                trace!("reachable in {latency_ms}ms");
                Measurement::reachable(&target.name, latency_ms)
            }
            Ok(response) => {
                warn!("{} responded with {}", target.endpoint, response.status());
                Measurement::unreachable(&target.name, response.status().as_u16())
            }
            Err(e) => {
                let detail = self.describe(&e);
                warn!("{}: {detail}", target.endpoint);
                Measurement::error(&target.name, detail)
            }
        }
    }

    fn describe(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            return format!("timed out after {}ms", self.timeout.as_millis());
        }

        // reqwest's Display omits the underlying cause (refused, DNS, ...)
        let mut detail = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}

/// Elapsed time in milliseconds, rounded and kept strictly positive
fn latency_ms(elapsed: Duration) -> f64 {
    round_ms(elapsed.as_secs_f64() * 1000.0).max(MIN_LATENCY_MS)
}
