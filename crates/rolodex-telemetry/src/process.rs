//! Build and process metrics appended to the `/metrics` output.

use crate::metrics::series;
use std::fmt::Write as _;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Build metadata, rendered as a constant `build_info{...} 1` gauge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Program name.
    pub title: String,
    /// Program version.
    pub version: String,
    /// Source revision, empty when unknown.
    pub revision: String,
    /// Build timestamp, empty when unknown.
    pub created: String,
}

impl BuildInfo {
    /// Creates build info with an unknown revision and timestamp.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            revision: String::new(),
            created: String::new(),
        }
    }

    /// Sets the source revision.
    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// Sets the build timestamp.
    #[must_use]
    pub fn with_created(mut self, created: impl Into<String>) -> Self {
        self.created = created.into();
        self
    }

    /// Renders the `build_info` family.
    pub fn render(&self) -> String {
        let key = series(
            "build_info",
            &[
                ("title", &self.title),
                ("version", &self.version),
                ("revision", &self.revision),
                ("created", &self.created),
            ],
        );
        format!("# TYPE build_info gauge\n{key} 1\n")
    }
}

/// Process start time and uptime.
#[derive(Debug, Clone, Copy)]
pub struct ProcessMetrics {
    started_at: SystemTime,
    started: Instant,
}

impl ProcessMetrics {
    /// Captures the current time as the process start.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started_at: SystemTime::now(),
            started: Instant::now(),
        }
    }

    /// Seconds since the Unix epoch at start.
    pub fn start_time_seconds(&self) -> f64 {
        self.started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }

    /// Seconds since start.
    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Renders `process_start_time_seconds` and `process_uptime_seconds`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# TYPE process_start_time_seconds gauge");
        let _ = writeln!(out, "process_start_time_seconds {}", self.start_time_seconds());
        let _ = writeln!(out, "# TYPE process_uptime_seconds gauge");
        let _ = writeln!(out, "process_uptime_seconds {}", self.uptime_seconds());
        out
    }
}

impl Default for ProcessMetrics {
    fn default() -> Self {
        Self::start()
    }
}
