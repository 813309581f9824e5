//! Plain-text status dashboard
//!
//! Rendering is a pure function of its inputs so the output can be compared
//! byte for byte.

use std::fmt::Write;

use crate::{AlertEvent, Measurement, monitors::resources::ResourceSnapshot};

const TITLE: &str = "=== Agent Observability Dashboard ===";

/// Column width of the agent name
pub const NAME_WIDTH: usize = 12;

/// Column width of the status label, wide enough for "unreachable"
pub const STATUS_WIDTH: usize = 11;

pub fn render(measurements: &[Measurement], alerts: &[AlertEvent]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out);

    if measurements.is_empty() {
        let _ = writeln!(out, "No measurements yet");
    }

    for measurement in measurements {
        let _ = writeln!(
            out,
            "{} {:<name_width$} status={:<status_width$} latency={}",
            glyph(measurement),
            measurement.target_name,
            measurement.status.label(),
            latency(measurement),
            name_width = NAME_WIDTH,
            status_width = STATUS_WIDTH,
        );
    }

    if !measurements.is_empty() {
        let reachable = measurements.iter().filter(|m| m.is_reachable()).count();
        let _ = writeln!(out);
        let _ = writeln!(out, "{reachable}/{} agents reachable", measurements.len());
    }

    if !alerts.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Recent Alerts:");
        for alert in alerts {
            let _ = writeln!(out, "  [{}] {}", alert.severity, alert.message);
        }
    }

    out
}

/// Host resource section, appended below the agent overview
pub fn render_resources(snapshot: &ResourceSnapshot) -> String {
    let disk = snapshot
        .disk_usage_percent
        .map_or_else(|| "N/A".to_string(), |percent| format!("{percent:.1}%"));
    let load = snapshot.load_average.map_or_else(
        || "N/A".to_string(),
        |load| format!("{:.2} {:.2} {:.2}", load.one, load.five, load.fifteen),
    );

    format!(
        "\nHost Resources:\n  memory={}/{}MB disk={disk} load={load}\n",
        snapshot.memory_used_mb, snapshot.memory_total_mb
    )
}

fn glyph(measurement: &Measurement) -> &'static str {
    if measurement.is_reachable() {
        "✅"
    } else {
        "❌"
    }
}

fn latency(measurement: &Measurement) -> String {
    match measurement.latency_ms {
        // malformed values are clamped rather than rejected
        Some(latency) if latency.is_finite() => format!("{:.2}ms", latency.max(0.0)),
        _ => "N/A".to_string(),
    }
}
