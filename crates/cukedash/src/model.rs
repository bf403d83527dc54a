//! Cucumber JSON result model.
//!
//! Mirrors the array-of-features document written by the runner's JSON
//! formatter. Fields this crate does not interpret are kept in `extra` so a
//! bucket-scoped subset written back to disk is still a valid runner document.
//! Fields whose shape differs between runners (`id`, `duration`) are held as
//! raw JSON and read through accessors, so an unexpected shape never rejects
//! the document.

use crate::result::{CukedashError, CukedashResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Status of a step, scenario or feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step passed
    Passed,
    /// Step failed
    Failed,
    /// Step skipped after an earlier failure
    Skipped,
    /// Step marked pending
    Pending,
    /// No step definition matched
    Undefined,
    /// More than one step definition matched
    Ambiguous,
    /// Any status this crate does not know
    #[default]
    #[serde(other)]
    Unknown,
}

impl StepStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Lower-case label as written by the runner
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Pending => "pending",
            Self::Undefined => "undefined",
            Self::Ambiguous => "ambiguous",
            Self::Unknown => "unknown",
        }
    }

    /// Roll a sequence of child statuses up into one.
    ///
    /// Failed if any child failed, passed if every child passed (vacuously for
    /// none), otherwise the first child that did not pass.
    pub fn roll_up(statuses: impl IntoIterator<Item = Self>) -> Self {
        let mut first_other = None;
        for status in statuses {
            if status.is_failed() {
                return Self::Failed;
            }
            if !status.is_passed() && first_other.is_none() {
                first_other = Some(status);
            }
        }
        first_other.unwrap_or(Self::Passed)
    }
}

/// Tag attached to a feature or scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag text including the leading `@`
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    #[serde(default)]
    pub status: StepStatus,
    /// Duration in nanoseconds; integer or float depending on the runner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StepOutcome {
    /// Duration in milliseconds, if the runner recorded a non-negative number
    #[must_use]
    pub fn duration_ms(&self) -> Option<f64> {
        self.duration
            .as_ref()
            .and_then(Value::as_f64)
            .filter(|ns| ns.is_finite() && *ns >= 0.0)
            .map(|ns| ns / 1_000_000.0)
    }
}

/// Attachment recorded against a step (screenshots, logs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Base64 payload
    pub data: String,
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Embedding {
    /// Whether the payload is an image the browser can show inline
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StepOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeddings: Vec<Embedding>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StepResult {
    /// Step status; a step without a result is unknown
    #[must_use]
    pub fn status(&self) -> StepStatus {
        self.result
            .as_ref()
            .map_or(StepStatus::Unknown, |r| r.status)
    }
}

/// One scenario (cucumber calls these "elements")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScenarioResult {
    /// Rolled-up status of all steps
    #[must_use]
    pub fn status(&self) -> StepStatus {
        StepStatus::roll_up(self.steps.iter().map(StepResult::status))
    }

    /// Total recorded step time in milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.steps
            .iter()
            .filter_map(|s| s.result.as_ref().and_then(StepOutcome::duration_ms))
            .sum()
    }
}

/// One feature file's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub elements: Vec<ScenarioResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureResult {
    /// Rolled-up status of all scenarios
    #[must_use]
    pub fn status(&self) -> StepStatus {
        StepStatus::roll_up(self.elements.iter().map(ScenarioResult::status))
    }

    /// The slice of this feature the classifier reads
    #[must_use]
    pub fn record(&self) -> TestResultRecord {
        TestResultRecord {
            uri: self.uri.clone(),
            name: self.name.clone(),
            status: self.status(),
        }
    }
}

/// What the classifier needs to know about a result
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestResultRecord {
    /// Source path of the feature file, if known
    pub uri: Option<String>,
    /// Human-readable feature or scenario title
    pub name: String,
    /// Final status
    pub status: StepStatus,
}

impl TestResultRecord {
    /// Record with a title only
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the feature file path
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the status
    #[must_use]
    pub const fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }
}

/// Parse a runner result document
pub fn parse_results(json: &str) -> CukedashResult<Vec<FeatureResult>> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse the runner's result file.
///
/// # Errors
///
/// `MissingResults` when the file has not been written yet, `Json` when it is
/// only partially flushed or otherwise malformed.
pub fn load_results(path: &Path) -> CukedashResult<Vec<FeatureResult>> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(CukedashError::MissingResults {
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(err.into()),
    };
    parse_results(&json)
}
