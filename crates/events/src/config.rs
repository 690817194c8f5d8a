use std::time::Duration;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_LEASE_SECS: u64 = 60;
const DEFAULT_TASK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;
const DEFAULT_EMAIL_INTERVAL_SECS: u64 = 600;
const DEFAULT_SITE_ADDRESS: &str = "http://localhost:8012";

/// Task runner settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between polls when the queue is empty.
    pub poll_interval: Duration,
    /// How long a leased task stays invisible to other workers.
    pub lease: Duration,
    /// Upper bound on a single task execution.
    pub task_timeout: Duration,
    pub tick_interval: Duration,
    pub email_interval: Duration,
    /// Scheme and host of the public site, used to recognise page URLs.
    pub site_address: String,
}

impl WorkerConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// | Variable              | Default                  |
    /// |-----------------------|--------------------------|
    /// | `POLL_INTERVAL_MS`    | `1000`                   |
    /// | `LEASE_SECS`          | `60`                     |
    /// | `TASK_TIMEOUT_SECS`   | `30`                     |
    /// | `TICK_INTERVAL_SECS`  | `60`                     |
    /// | `EMAIL_INTERVAL_SECS` | `600`                    |
    /// | `SITE_ADDRESS`        | `http://localhost:8012`  |
    pub fn from_env() -> Self {
        Self {
            poll_interval: Duration::from_millis(env_u64(
                "POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )),
            lease: Duration::from_secs(env_u64("LEASE_SECS", DEFAULT_LEASE_SECS)),
            task_timeout: Duration::from_secs(env_u64(
                "TASK_TIMEOUT_SECS",
                DEFAULT_TASK_TIMEOUT_SECS,
            )),
            tick_interval: Duration::from_secs(env_u64(
                "TICK_INTERVAL_SECS",
                DEFAULT_TICK_INTERVAL_SECS,
            )),
            email_interval: Duration::from_secs(env_u64(
                "EMAIL_INTERVAL_SECS",
                DEFAULT_EMAIL_INTERVAL_SECS,
            )),
            site_address: std::env::var("SITE_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_SITE_ADDRESS.to_string()),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            lease: Duration::from_secs(DEFAULT_LEASE_SECS),
            task_timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS),
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            email_interval: Duration::from_secs(DEFAULT_EMAIL_INTERVAL_SECS),
            site_address: DEFAULT_SITE_ADDRESS.to_string(),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
