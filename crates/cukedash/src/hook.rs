//! Per-scenario capture and report refresh.
//!
//! The test runner calls [`ScenarioHook::before_scenario`] and
//! [`ScenarioHook::after_scenario`] around every scenario. The browser side
//! is reached through [`ScenarioWorld`], so the hook works with any driver
//! that can take a PNG screenshot and attach bytes to the runner output.
//!
//! ```ignore
//! let hook = ScenarioHook::new(&ReportConfig::new());
//! hook.before_scenario(&ctx).await;
//! // ... run steps ...
//! let outcome = hook.after_scenario(&ctx, &mut world).await;
//! ```

use crate::classify::{Classification, ClassificationTier, ClassificationTrace};
use crate::config::ReportConfig;
use crate::model::{StepStatus, TestResultRecord};
use crate::organize::CaptureOutcome;
use crate::pipeline::{BucketRefresh, ReportPipeline};
use crate::result::CukedashResult;
use crate::tree::ReportTree;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// MIME type of attached captures
pub const PNG_MIME: &str = "image/png";

/// What the runner knows about a finished scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioContext {
    pub scenario_name: String,
    pub feature_name: Option<String>,
    /// Feature file path as reported by the runner
    pub uri: Option<String>,
    pub status: StepStatus,
}

impl ScenarioContext {
    #[must_use]
    pub fn new(scenario_name: impl Into<String>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            feature_name: None,
            uri: None,
            status: StepStatus::default(),
        }
    }

    #[must_use]
    pub fn with_feature(mut self, name: impl Into<String>) -> Self {
        self.feature_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    fn record(&self, name: &str) -> TestResultRecord {
        TestResultRecord {
            uri: self.uri.clone(),
            name: name.to_string(),
            status: self.status,
        }
    }
}

/// Browser session the hook captures from
#[async_trait]
pub trait ScenarioWorld: Send {
    /// Capture the page as PNG bytes
    async fn screenshot(&mut self, full_page: bool) -> CukedashResult<Vec<u8>>;

    /// Attach bytes to the runner's result output
    fn attach(&mut self, data: Vec<u8>, mime_type: &str);
}

/// What `after_scenario` produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub classification: Classification,
    /// Capture written to disk
    pub screenshot: Option<PathBuf>,
    /// Whether the capture was attached to the runner output
    pub attached: bool,
    pub report: Option<PathBuf>,
    pub index: Option<PathBuf>,
}

/// Runner hook bound to one report tree
#[derive(Debug, Clone)]
pub struct ScenarioHook {
    tree: ReportTree,
    flush_delay: Duration,
    pipeline: Arc<ReportPipeline>,
}

impl ScenarioHook {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            tree: config.tree(),
            flush_delay: config.flush_delay(),
            pipeline: Arc::new(ReportPipeline::new(config)),
        }
    }

    /// Use a preconfigured pipeline
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: ReportPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    /// Bucket for a scenario.
    ///
    /// Keyword matching uses the feature title, then the scenario title.
    pub fn classify(&self, ctx: &ScenarioContext) -> ClassificationTrace {
        let classifier = self.pipeline.scenario_classifier();
        let primary = ctx.feature_name.as_deref().unwrap_or(&ctx.scenario_name);
        let trace = classifier.explain(&ctx.record(primary));
        if trace.tier == ClassificationTier::Fallback && ctx.feature_name.is_some() {
            return classifier.explain(&ctx.record(&ctx.scenario_name));
        }
        trace
    }

    /// Prepare the bucket's capture folder
    pub async fn before_scenario(&self, ctx: &ScenarioContext) -> Classification {
        let trace = self.classify(ctx);
        let dir = self.tree.bucket_captures(&trace.classification);
        if let Err(err) = tokio::fs::create_dir_all(&dir).await {
            warn!(dir = %dir.display(), error = %err, "cannot create screenshot folder");
        }
        info!(
            scenario = %ctx.scenario_name,
            bucket = %trace.classification,
            tier = ?trace.tier,
            "scenario started"
        );
        trace.classification
    }

    /// Capture, wait for the runner to flush, then refresh the bucket.
    ///
    /// Never fails; each stage that goes wrong is logged and left empty in
    /// the outcome.
    pub async fn after_scenario<W>(&self, ctx: &ScenarioContext, world: &mut W) -> HookOutcome
    where
        W: ScenarioWorld + ?Sized,
    {
        let classification = self.classify(ctx).classification;
        let (screenshot, attached) = self.capture(ctx, &classification, world).await;

        if !self.flush_delay.is_zero() {
            debug!(delay = ?self.flush_delay, "waiting for result flush");
            tokio::time::sleep(self.flush_delay).await;
        }

        let pipeline = Arc::clone(&self.pipeline);
        let bucket = classification.clone();
        let refresh = tokio::task::spawn_blocking(move || pipeline.refresh_bucket(&bucket))
            .await
            .unwrap_or_else(|err| {
                error!(error = %err, "report refresh task failed");
                BucketRefresh::default()
            });

        HookOutcome {
            classification,
            screenshot,
            attached,
            report: refresh.report,
            index: refresh.index,
        }
    }

    async fn capture<W>(
        &self,
        ctx: &ScenarioContext,
        bucket: &Classification,
        world: &mut W,
    ) -> (Option<PathBuf>, bool)
    where
        W: ScenarioWorld + ?Sized,
    {
        let png = match world.screenshot(true).await {
            Ok(png) => png,
            Err(err) => {
                warn!(scenario = %ctx.scenario_name, error = %err, "screenshot failed");
                return (None, false);
            }
        };

        let outcome = CaptureOutcome::from_status(ctx.status);
        let path = self
            .tree
            .bucket_captures(bucket)
            .join(capture_file_name(&ctx.scenario_name, outcome, Utc::now()));
        let written = match write_capture(&path, &png).await {
            Ok(()) => {
                info!(path = %path.display(), outcome = outcome.as_str(), "screenshot saved");
                Some(path)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "screenshot not saved");
                None
            }
        };

        world.attach(png, PNG_MIME);
        (written, true)
    }
}

async fn write_capture(path: &std::path::Path, png: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, png).await
}

#[allow(clippy::expect_used)]
fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("literal pattern"))
}

/// File-system safe form of a scenario title
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let cleaned = unsafe_chars().replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "scenario".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<scenario>_<outcome>_<timestamp>.png`
#[must_use]
pub fn capture_file_name(scenario: &str, outcome: CaptureOutcome, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}.png",
        sanitize_name(scenario),
        outcome.as_str(),
        at.format("%Y-%m-%dT%H-%M-%S-%3fZ")
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::tests::SAMPLE;
    use crate::result::CukedashError;
    use chrono::TimeZone;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct MemoryWorld {
        png: Option<Vec<u8>>,
        attachments: Vec<(Vec<u8>, String)>,
    }

    impl MemoryWorld {
        fn with_png(bytes: &[u8]) -> Self {
            Self {
                png: Some(bytes.to_vec()),
                attachments: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl ScenarioWorld for MemoryWorld {
        async fn screenshot(&mut self, _full_page: bool) -> CukedashResult<Vec<u8>> {
            self.png
                .clone()
                .ok_or_else(|| CukedashError::capture("page closed"))
        }

        fn attach(&mut self, data: Vec<u8>, mime_type: &str) {
            self.attachments.push((data, mime_type.to_string()));
        }
    }

    fn hook(root: &Path) -> ScenarioHook {
        ScenarioHook::new(&ReportConfig::new().with_reports_root(root).with_flush_delay_ms(0))
    }

    fn price_book_ctx(status: StepStatus) -> ScenarioContext {
        ScenarioContext::new("Create a new Price Book")
            .with_feature("Price Books")
            .with_uri("features/sales/salesforce_price-books.feature")
            .with_status(status)
    }

    mod naming_tests {
        use super::*;

        #[test]
        fn test_sanitize_name() {
            assert_eq!(sanitize_name("Create a new Price Book"), "Create_a_new_Price_Book");
            assert_eq!(sanitize_name("a/b: c?"), "a_b_c");
            assert_eq!(sanitize_name("  ??  "), "scenario");
        }

        #[test]
        fn test_capture_file_name() {
            let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
            assert_eq!(
                capture_file_name("Login works", CaptureOutcome::Success, at),
                "Login_works_success_2024-03-05T14-07-09-000Z.png"
            );
        }
    }

    mod classify_tests {
        use super::*;

        #[test]
        fn test_uri_wins() {
            let tmp = TempDir::new().unwrap();
            let trace = hook(tmp.path()).classify(&price_book_ctx(StepStatus::Passed));
            assert_eq!(trace.classification, Classification::new("sales", "price-books"));
        }

        #[test]
        fn test_scenario_title_when_feature_title_misses() {
            let tmp = TempDir::new().unwrap();
            let ctx = ScenarioContext::new("Close an invoice").with_feature("Month end");
            let trace = hook(tmp.path()).classify(&ctx);
            assert_eq!(trace.classification, Classification::new("finance", "invoices"));
            assert_eq!(trace.tier, ClassificationTier::Keyword);
        }

        #[test]
        fn test_unknown_scenario_falls_back() {
            let tmp = TempDir::new().unwrap();
            let ctx = ScenarioContext::new("Something odd");
            let trace = hook(tmp.path()).classify(&ctx);
            assert_eq!(
                trace.classification,
                Classification::new("otherfunctionality", "general")
            );
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_before_scenario_creates_capture_folder() {
            let tmp = TempDir::new().unwrap();
            let bucket = hook(tmp.path())
                .before_scenario(&price_book_ctx(StepStatus::Passed))
                .await;
            assert_eq!(bucket, Classification::new("sales", "price-books"));
            assert!(tmp.path().join("screenshots/sales/price-books").is_dir());
        }

        #[tokio::test]
        async fn test_after_scenario_full_flow() {
            let tmp = TempDir::new().unwrap();
            fs::write(tmp.path().join("cucumber-report.json"), SAMPLE).unwrap();
            let mut world = MemoryWorld::with_png(b"\x89PNG");

            let outcome = hook(tmp.path())
                .after_scenario(&price_book_ctx(StepStatus::Failed), &mut world)
                .await;

            let shot = outcome.screenshot.unwrap();
            let name = shot.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("Create_a_new_Price_Book_failure_"));
            assert!(shot.starts_with(tmp.path().join("screenshots/sales/price-books")));
            assert!(tmp
                .path()
                .join("sales/price-books/screenshots")
                .join(&name)
                .is_file());
            assert_eq!(world.attachments, vec![(b"\x89PNG".to_vec(), PNG_MIME.to_string())]);
            assert!(outcome.report.unwrap().is_file());
            assert!(outcome.index.unwrap().is_file());
        }

        #[tokio::test]
        async fn test_passed_scenario_is_tagged_success() {
            let tmp = TempDir::new().unwrap();
            let mut world = MemoryWorld::with_png(b"png");
            let outcome = hook(tmp.path())
                .after_scenario(&price_book_ctx(StepStatus::Passed), &mut world)
                .await;
            let name = outcome.screenshot.unwrap();
            assert!(name.to_string_lossy().contains("_success_"));
            assert!(outcome.report.is_none());
        }

        #[tokio::test]
        async fn test_attaches_even_when_write_fails() {
            let tmp = TempDir::new().unwrap();
            let blocker = tmp.path().join("not-a-dir");
            fs::write(&blocker, "file").unwrap();
            let mut world = MemoryWorld::with_png(b"png");

            let outcome = hook(&blocker)
                .after_scenario(&price_book_ctx(StepStatus::Failed), &mut world)
                .await;

            assert!(outcome.screenshot.is_none());
            assert!(outcome.attached);
            assert_eq!(world.attachments.len(), 1);
            assert!(outcome.index.is_none());
        }

        #[tokio::test]
        async fn test_screenshot_failure_is_tolerated() {
            let tmp = TempDir::new().unwrap();
            let mut world = MemoryWorld::default();
            let outcome = hook(tmp.path())
                .after_scenario(&price_book_ctx(StepStatus::Failed), &mut world)
                .await;
            assert!(outcome.screenshot.is_none());
            assert!(!outcome.attached);
            assert!(world.attachments.is_empty());
            assert!(outcome.index.is_some());
        }
    }
}
