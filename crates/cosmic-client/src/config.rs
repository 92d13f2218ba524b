//! Client configuration.
//!
//! Defaults match the production game; `from_args` lets the simtest and
//! local tooling point at another API or a data directory.

use std::path::PathBuf;
use std::time::Duration;

/// Telemetry batching knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Flush as soon as this many events are queued.
    pub batch_size: usize,
    pub flush_interval_secs: u64,
    /// Oldest events are dropped beyond this many queued.
    pub max_queue: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_interval_secs: 30,
            max_queue: 1000,
        }
    }
}

impl TelemetryConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the REST API, without trailing slash.
    pub api_base: String,
    pub timeout_secs: u64,
    /// `None` keeps all stores in memory.
    pub data_dir: Option<PathBuf>,
    pub telemetry: TelemetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000/api".to_string(),
            timeout_secs: 10,
            data_dir: None,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_args() -> Self {
        Self::parse_args(std::env::args().skip(1))
    }

    /// Parse flags from an argument list (program name already stripped).
    pub fn parse_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut config = Self::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--api" | "-a" if i + 1 < args.len() => {
                    config.api_base = args[i + 1].trim_end_matches('/').to_string();
                    i += 2;
                }
                "--data-dir" | "-d" if i + 1 < args.len() => {
                    config.data_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                }
                "--timeout" if i + 1 < args.len() => {
                    if let Ok(secs) = args[i + 1].parse() {
                        config.timeout_secs = secs;
                    } else {
                        log::warn!("Ignoring invalid --timeout value: {}", args[i + 1]);
                    }
                    i += 2;
                }
                _ => i += 1,
            }
        }
        config
    }
}
