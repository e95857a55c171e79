//! Allure report directory sink
//!
//! Writes one `<uuid>-result.json` file per test report as it arrives and a
//! `<uuid>-container.json` grouping all of them when the run is finalized.
//! The directory can be rendered with the Allure command line tool.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gauntlet_application::ports::{OutputSink, SinkError};
use gauntlet_domain::{OutcomeKind, TestReport, generate_id};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllureLabel {
    name: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllureStatusDetails {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllureResult {
    uuid: Uuid,
    history_id: String,
    name: String,
    full_name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_details: Option<AllureStatusDetails>,
    stage: &'static str,
    start: i64,
    stop: i64,
    labels: Vec<AllureLabel>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllureContainer {
    uuid: Uuid,
    name: String,
    children: Vec<Uuid>,
    start: i64,
    stop: i64,
}

/// Writes Allure-compatible result files into a report directory.
pub struct AllureSink {
    dir: PathBuf,
    suite: String,
    children: Vec<Uuid>,
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
    error: Option<SinkError>,
    finalized: bool,
}

impl AllureSink {
    /// Creates the report directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>, suite: impl Into<String>) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            suite: suite.into(),
            children: Vec::new(),
            started: None,
            finished: None,
            error: None,
            finalized: false,
        })
    }

    /// The report directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    const fn status(kind: OutcomeKind) -> &'static str {
        match kind {
            OutcomeKind::Passed => "passed",
            OutcomeKind::Failed => "failed",
            OutcomeKind::Skipped => "skipped",
            OutcomeKind::Broken => "broken",
        }
    }

    fn result_for(&self, report: &TestReport) -> AllureResult {
        let suite = report
            .file
            .as_deref()
            .and_then(Path::file_stem)
            .map_or_else(|| self.suite.clone(), |s| s.to_string_lossy().into_owned());
        let full_name = format!("{suite}::{}", report.name);

        AllureResult {
            uuid: generate_id(),
            history_id: full_name.clone(),
            name: report.name.clone(),
            full_name,
            status: Self::status(report.kind()),
            status_details: report
                .outcome
                .message()
                .map(|message| AllureStatusDetails { message }),
            stage: "finished",
            start: report.started_at.timestamp_millis(),
            stop: report.finished_at().timestamp_millis(),
            labels: vec![
                AllureLabel {
                    name: "suite",
                    value: suite,
                },
                AllureLabel {
                    name: "framework",
                    value: "gauntlet".to_string(),
                },
            ],
        }
    }

    fn write_json(&self, file_name: &str, value: &impl Serialize) -> Result<(), SinkError> {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| SinkError::Serialization(e.to_string()))?;
        fs::write(self.dir.join(file_name), json)?;
        Ok(())
    }
}

impl OutputSink for AllureSink {
    fn name(&self) -> &str {
        "allure"
    }

    fn receive(&mut self, report: &TestReport) {
        let result = self.result_for(report);
        self.started.get_or_insert(report.started_at);
        self.finished = Some(report.finished_at());

        match self.write_json(&format!("{}-result.json", result.uuid), &result) {
            Ok(()) => self.children.push(result.uuid),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
            }
        }
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        let now = Utc::now();
        let container = AllureContainer {
            uuid: generate_id(),
            name: self.suite.clone(),
            children: std::mem::take(&mut self.children),
            start: self.started.unwrap_or(now).timestamp_millis(),
            stop: self.finished.unwrap_or(now).timestamp_millis(),
        };
        self.write_json(&format!("{}-container.json", container.uuid), &container)?;
        debug!(
            dir = %self.dir.display(),
            results = container.children.len(),
            "allure report written"
        );
        self.error.take().map_or(Ok(()), Err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use gauntlet_domain::Outcome;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tempfile::tempdir;

    fn report(name: &str, outcome: Outcome) -> TestReport {
        TestReport {
            name: name.to_string(),
            file: Some(PathBuf::from("tests/users.yaml")),
            outcome,
            started_at: Utc::now(),
            duration: Duration::from_millis(12),
            request: None,
            response: None,
        }
    }

    fn read_files(dir: &Path, suffix: &str) -> Vec<Value> {
        let mut files: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().ends_with(suffix))
            .collect();
        files.sort();
        files
            .iter()
            .map(|p| serde_json::from_slice(&fs::read(p).unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_result_per_report_and_container_at_finalize() {
        let dir = tempdir().unwrap();
        let mut sink = AllureSink::new(dir.path().join("allure"), "gauntlet").unwrap();

        sink.receive(&report("create_user", Outcome::Passed));
        sink.receive(&report(
            "seed",
            Outcome::Broken {
                cause: "fixture `users` not found".to_string(),
            },
        ));
        assert!(read_files(sink.dir(), "-container.json").is_empty());
        sink.finalize().unwrap();

        let mut results = read_files(sink.dir(), "-result.json");
        results.sort_by_key(|r| r["name"].as_str().unwrap().to_string());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["name"], "create_user");
        assert_eq!(results[0]["status"], "passed");
        assert_eq!(results[0]["fullName"], "users::create_user");
        assert_eq!(results[1]["status"], "broken");
        assert_eq!(
            results[1]["statusDetails"]["message"],
            "fixture `users` not found"
        );

        let containers = read_files(sink.dir(), "-container.json");
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0]["children"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_finalize_writes_single_container() {
        let dir = tempdir().unwrap();
        let mut sink = AllureSink::new(dir.path(), "gauntlet").unwrap();
        sink.finalize().unwrap();
        sink.finalize().unwrap();
        assert_eq!(read_files(dir.path(), "-container.json").len(), 1);
    }
}
