//! Harness run report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version for harness reports
pub const HARNESS_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for harness reports
pub const HARNESS_SCHEMA_ID: &str = "oclp/harness_report@1";

/// Record of one successful build + validate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IterationRecord {
    /// Settings profile name ("default" or "inverted")
    pub profile: String,
    /// Target source ("supported_models" or "fixtures")
    pub source: String,
    /// Catalog identifier or fixture label
    pub target: String,
    /// Model handed to the builder
    pub model: String,
    pub build_ms: u64,
    pub validate_ms: u64,
}

/// Report of a completed harness run
///
/// Only successful runs produce a report; the first failure aborts with an
/// error instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessReport {
    pub schema_version: u32,
    pub schema_id: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub iteration_count: usize,
    pub duration_ms: u64,
    pub iterations: Vec<IterationRecord>,
}

impl HarnessReport {
    pub fn new() -> Self {
        Self {
            schema_version: HARNESS_SCHEMA_VERSION,
            schema_id: HARNESS_SCHEMA_ID.to_string(),
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            iteration_count: 0,
            duration_ms: 0,
            iterations: Vec::new(),
        }
    }

    pub fn record(&mut self, iteration: IterationRecord) {
        self.iteration_count += 1;
        self.duration_ms += iteration.build_ms + iteration.validate_ms;
        self.iterations.push(iteration);
    }

    pub fn finalize(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Iterations run under the named profile
    pub fn profile_count(&self, profile: &str) -> usize {
        self.iterations.iter().filter(|i| i.profile == profile).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary on stdout
    pub fn print_summary(&self) {
        println!("\n=== Validation Summary ===");
        println!("Run: {}", self.run_id);
        println!(
            "Iterations: {} ({} default, {} inverted)",
            self.iteration_count,
            self.profile_count("default"),
            self.profile_count("inverted")
        );
        println!("Duration: {:.2}s", self.duration_ms as f64 / 1000.0);
    }
}

impl Default for HarnessReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iteration(profile: &str, target: &str) -> IterationRecord {
        IterationRecord {
            profile: profile.to_string(),
            source: "supported_models".to_string(),
            target: target.to_string(),
            model: target.to_string(),
            build_ms: 10,
            validate_ms: 5,
        }
    }

    #[test]
    fn test_record_accumulates() {
        let mut report = HarnessReport::new();
        report.record(iteration("default", "iMac8,1"));
        report.record(iteration("inverted", "iMac8,1"));
        report.finalize();

        assert_eq!(report.iteration_count, 2);
        assert_eq!(report.duration_ms, 30);
        assert_eq!(report.profile_count("inverted"), 1);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_json_shape() {
        let mut report = HarnessReport::new();
        report.record(iteration("default", "MacPro3,1"));
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["schema_id"], HARNESS_SCHEMA_ID);
        assert_eq!(value["iterations"][0]["target"], "MacPro3,1");
        assert_eq!(value["run_id"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn test_run_ids_differ() {
        assert_ne!(HarnessReport::new().run_id, HarnessReport::new().run_id);
    }
}
