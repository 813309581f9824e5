//! Host resource sampling (memory, root disk, load average)
//!
//! Sampling is local to the machine running the monitor and independent of
//! the agents being probed. Values that the platform cannot report are left
//! empty instead of failing the cycle.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sysinfo::{Disks, System};
use tracing::{instrument, trace};

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,

    /// Share of the root filesystem in use, `None` without a `/` mount
    pub disk_usage_percent: Option<f64>,

    /// `None` on platforms without a load average
    pub load_average: Option<LoadAverage>,

    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ResourceTracker {
    system: System,
}

impl Default for ResourceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    #[instrument(skip_all)]
    pub fn snapshot(&mut self) -> ResourceSnapshot {
        self.system.refresh_memory();
        let disks = Disks::new_with_refreshed_list();

        let disk_usage_percent = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .and_then(|disk| disk_usage_percent(disk.total_space(), disk.available_space()));

        let load = System::load_average();
        let load_average = LoadAverage {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        };

        let snapshot = ResourceSnapshot {
            memory_used_mb: self.system.used_memory() / BYTES_PER_MB,
            memory_total_mb: self.system.total_memory() / BYTES_PER_MB,
            disk_usage_percent,
            load_average: cfg!(unix).then_some(load_average),
            timestamp: Utc::now(),
        };
        trace!("resources: {snapshot:?}");
        snapshot
    }
}

/// Used share of a filesystem in percent, rounded to one decimal
pub fn disk_usage_percent(total: u64, available: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(available) as f64;
    Some((used / total as f64 * 1000.0).round() / 10.0)
}
