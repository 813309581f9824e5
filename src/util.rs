const CONFIG_PATH: &str = "AGENT_WATCH_CONFIG";

const DEFAULT_HOST: &str = "127.0.0.1";

const DEFAULT_STATUS_PATH: &str = "/status";

const DEFAULT_TIMEOUT_SECS: u64 = 5;

const DEFAULT_INTERVAL_SECS: u64 = 60;

const DEFAULT_LATENCY_THRESHOLD_MS: f64 = 5000.0;

const DEFAULT_HISTORY_SIZE: usize = 5;

const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;

pub fn get_default_host() -> String {
    DEFAULT_HOST.to_string()
}

pub fn get_default_status_path() -> String {
    DEFAULT_STATUS_PATH.to_string()
}

pub fn get_default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

pub fn get_default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

pub fn get_default_latency_threshold() -> f64 {
    DEFAULT_LATENCY_THRESHOLD_MS
}

pub fn get_default_history_size() -> usize {
    DEFAULT_HISTORY_SIZE
}

pub fn get_default_delivery_timeout() -> u64 {
    DEFAULT_DELIVERY_TIMEOUT_SECS
}

pub fn get_default_track_resources() -> bool {
    true
}

pub fn get_config_path() -> Option<String> {
    std::env::var(CONFIG_PATH).ok().filter(|path| !path.is_empty())
}

/// Round a millisecond value to two decimal places
pub fn round_ms(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
