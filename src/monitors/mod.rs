//! Health probing and the monitoring cycle
//!
//! - **Probe**: one bounded request against one agent
//! - **Monitor**: fans probes out over all agents, evaluates rules and
//!   dispatches alerts
//! - **ResourceTracker**: samples memory, disk and load of the local host

pub mod cycle;
pub mod probe;
pub mod resources;

pub use cycle::{CycleOutcome, Monitor};
pub use probe::Probe;
pub use resources::{ResourceSnapshot, ResourceTracker};
