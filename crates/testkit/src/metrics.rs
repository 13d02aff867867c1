//! Run metrics exported as JSON by headless runs and long-running tests.
//!
//! A report captures what the world looked like at the end of a run and how
//! much gameplay happened along the way, so regressions in generation or
//! balance show up as diffs between runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Top-level metrics report for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Run identifier
    pub run_name: String,

    /// Timestamp when the report was built (RFC 3339)
    pub timestamp: String,

    /// World seed
    pub seed: u64,

    /// Overall result
    pub result: RunResult,

    /// World state at the end of the run
    pub world: WorldMetrics,

    /// Gameplay counters accumulated over the run
    pub gameplay: GameplayMetrics,

    /// Wall-clock cost of the run
    pub execution: ExecutionMetrics,
}

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    /// Run completed and every check held
    Pass,
    /// A check failed
    Fail,
}

/// Resident world state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldMetrics {
    /// Chunks held in memory at the end
    pub chunks_resident: usize,

    /// Resource nodes known to the registry
    pub resource_nodes: usize,

    /// Entities alive at the end (player included)
    pub entities: usize,
}

/// Gameplay counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameplayMetrics {
    /// Ticks stepped
    pub ticks: u64,

    /// Simulated seconds
    pub sim_seconds: f64,

    /// Successful gathers
    pub gathers: usize,

    /// Failed gather attempts
    pub gather_failures: usize,

    /// Creatures killed by the player
    pub kills: usize,

    /// Player deaths
    pub deaths: usize,

    /// Items crafted or cooked
    pub crafts: usize,

    /// Quests turned in
    pub quests_completed: usize,
}

/// Wall-clock execution metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Total run duration (seconds)
    pub duration_seconds: f64,

    /// Hash of the final state, if one was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_hash: Option<String>,
}

/// Builder for constructing metrics reports
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Create a new builder with run name and seed
    pub fn new(run_name: impl Into<String>, seed: u64) -> Self {
        Self {
            report: MetricsReport {
                run_name: run_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                seed,
                result: RunResult::Pass,
                world: WorldMetrics::default(),
                gameplay: GameplayMetrics::default(),
                execution: ExecutionMetrics::default(),
            },
        }
    }

    /// Set run result
    pub fn result(mut self, result: RunResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set world metrics
    pub fn world(mut self, metrics: WorldMetrics) -> Self {
        self.report.world = metrics;
        self
    }

    /// Set gameplay metrics
    pub fn gameplay(mut self, metrics: GameplayMetrics) -> Self {
        self.report.gameplay = metrics;
        self
    }

    /// Set execution metrics
    pub fn execution(mut self, metrics: ExecutionMetrics) -> Self {
        self.report.execution = metrics;
        self
    }

    /// Build the metrics report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Sink for writing metrics reports to JSON files
pub struct MetricsSink {
    path: PathBuf,
}

impl MetricsSink {
    /// Create a new metrics sink at the specified path
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        Ok(Self { path })
    }

    /// Path the report is written to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write metrics report to file
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn metrics_report_roundtrip() {
        let report = MetricsReportBuilder::new("headless", 12345)
            .result(RunResult::Pass)
            .world(WorldMetrics {
                chunks_resident: 25,
                resource_nodes: 4100,
                entities: 5,
            })
            .gameplay(GameplayMetrics {
                ticks: 600,
                sim_seconds: 30.0,
                gathers: 4,
                kills: 1,
                ..GameplayMetrics::default()
            })
            .build();

        let json = serde_json::to_string_pretty(&report).unwrap();
        let parsed: MetricsReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.run_name, "headless");
        assert_eq!(parsed.seed, 12345);
        assert_eq!(parsed.world.chunks_resident, 25);
        assert_eq!(parsed.gameplay.kills, 1);
        assert!(!json.contains("state_hash"));
    }

    #[test]
    fn metrics_sink_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "tileworld-metrics-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let report = MetricsReportBuilder::new("sink_test", 1)
            .execution(ExecutionMetrics {
                duration_seconds: 1.0,
                state_hash: Some("00ff00ff".into()),
            })
            .build();

        let sink = MetricsSink::create(&path).unwrap();
        sink.write(&report).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("sink_test"));
        assert!(contents.contains("\"result\": \"pass\""));
        assert!(contents.contains("00ff00ff"));

        fs::remove_file(&path).ok();
    }
}
