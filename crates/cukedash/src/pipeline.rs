//! End-to-end report refresh.
//!
//! Two flows share the same stages (subset, organize, render, index):
//!
//! - [`ReportPipeline::refresh_bucket`] runs after every scenario and keeps a
//!   single bucket current, copying captures from the hierarchical tree.
//! - [`ReportPipeline::build_all`] runs once after a whole suite, splits the
//!   result file into every bucket and moves captures out of the flat folder.
//!
//! Stage failures are logged and the remaining stages still run.

use crate::classify::{Classification, ClassificationMode, Classifier};
use crate::config::ReportConfig;
use crate::fsio;
use crate::index::IndexBuilder;
use crate::model::{load_results, FeatureResult};
use crate::organize::{OrganizeSummary, ScreenshotOrganizer};
use crate::render::{ReportGenerator, ReportRenderer};
use crate::result::{CukedashError, CukedashResult};
use crate::tree::ReportTree;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Result features grouped by bucket
pub type BatchPlan = BTreeMap<Classification, Vec<FeatureResult>>;

/// What one bucket refresh produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketRefresh {
    /// Bucket-scoped result file, when results could be read
    pub results: Option<PathBuf>,
    /// Rendered report, when rendering succeeded
    pub report: Option<PathBuf>,
    /// Captures relocated into the bucket
    pub screenshots: usize,
    /// Dashboard, when it could be written
    pub index: Option<PathBuf>,
}

/// Totals for a batch build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Buckets planned from the result file
    pub buckets: usize,
    /// Reports rendered successfully
    pub reports: usize,
    /// Captures moved out of the flat folder
    pub screenshots_moved: usize,
}

/// Classify, organize, render and index
#[derive(Debug)]
pub struct ReportPipeline {
    tree: ReportTree,
    scenario: Classifier,
    simple: Classifier,
    organizer: ScreenshotOrganizer,
    renderer: ReportRenderer,
    index: IndexBuilder,
}

impl ReportPipeline {
    /// Pipeline for `config` with the HTML generator
    pub fn new(config: &ReportConfig) -> Self {
        let tree = config.tree();
        Self {
            scenario: config.classifier(ClassificationMode::Scenario),
            simple: config.classifier(ClassificationMode::Simple),
            organizer: ScreenshotOrganizer::new(tree.clone()),
            renderer: ReportRenderer::new(tree.clone(), config.metadata.clone()),
            index: IndexBuilder::new(tree.clone()),
            tree,
        }
    }

    /// Swap in another report generator
    #[must_use]
    pub fn with_generator(mut self, generator: Box<dyn ReportGenerator>) -> Self {
        self.renderer = self.renderer.with_generator(generator);
        self
    }

    pub fn tree(&self) -> &ReportTree {
        &self.tree
    }

    /// Classifier used for per-scenario refreshes
    pub fn scenario_classifier(&self) -> &Classifier {
        &self.scenario
    }

    /// Classifier used for batch builds
    pub fn simple_classifier(&self) -> &Classifier {
        &self.simple
    }

    /// Refresh one bucket after a scenario.
    ///
    /// Missing or half-written results skip the render; captures are still
    /// organized and the dashboard is still rebuilt.
    pub fn refresh_bucket(&self, bucket: &Classification) -> BucketRefresh {
        let mut outcome = BucketRefresh::default();

        match load_results(&self.tree.results_json()) {
            Ok(features) => {
                let subset = self.scenario_subset(bucket, features);
                outcome.results = self.write_subset(bucket, &subset);
            }
            Err(err @ CukedashError::MissingResults { .. }) => {
                warn!(bucket = %bucket, error = %err, "results not written yet, skipping render");
            }
            Err(err) => {
                warn!(bucket = %bucket, error = %err, "results unreadable, skipping render");
            }
        }

        outcome.screenshots = self.organizer.copy_bucket(bucket).count();

        if let Some(json) = &outcome.results {
            outcome.report =
                self.renderer
                    .render_bucket(bucket, json, &self.tree.bucket_screenshots(bucket));
        }

        outcome.index = self.rebuild_index();
        outcome
    }

    /// Group features by their batch bucket
    pub fn plan_batch(&self, features: Vec<FeatureResult>) -> BatchPlan {
        let mut plan = BatchPlan::new();
        for feature in features {
            let bucket = self.simple.classify(&feature.record());
            plan.entry(bucket).or_default().push(feature);
        }
        plan
    }

    /// Write, organize and render one planned bucket.
    ///
    /// The report links captures where the move left them, under
    /// `screenshots/<module>/<feature>/`.
    pub fn build_bucket(
        &self,
        bucket: &Classification,
        features: &[FeatureResult],
    ) -> (OrganizeSummary, Option<PathBuf>) {
        let json = self.write_subset(bucket, features);
        let moved = self.organizer.move_flat(bucket);
        let report = json.and_then(|json| {
            self.renderer
                .render_bucket(bucket, &json, &self.tree.bucket_captures(bucket))
        });
        (moved, report)
    }

    /// Split the whole result file into buckets and rebuild the dashboard
    pub fn build_all(&self) -> CukedashResult<BatchSummary> {
        self.build_all_with(|_, _| {})
    }

    /// [`Self::build_all`], calling `on_bucket(done, bucket)` after each bucket
    pub fn build_all_with<F>(&self, mut on_bucket: F) -> CukedashResult<BatchSummary>
    where
        F: FnMut(usize, &Classification),
    {
        let features = load_results(&self.tree.results_json())?;
        let plan = self.plan_batch(features);
        info!(buckets = plan.len(), "building reports");

        let mut summary = BatchSummary {
            buckets: plan.len(),
            ..BatchSummary::default()
        };
        for (done, (bucket, features)) in plan.iter().enumerate() {
            let (moved, report) = self.build_bucket(bucket, features);
            summary.screenshots_moved += moved.count();
            if report.is_some() {
                summary.reports += 1;
            }
            on_bucket(done + 1, bucket);
        }

        let _ = self.rebuild_index();
        info!(
            buckets = summary.buckets,
            reports = summary.reports,
            moved = summary.screenshots_moved,
            "batch complete"
        );
        Ok(summary)
    }

    /// Rebuild the dashboard, logging failures
    pub fn rebuild_index(&self) -> Option<PathBuf> {
        match self.index.rebuild_index() {
            Ok(_) => Some(self.index.index_path()),
            Err(err) => {
                error!(error = %err, "dashboard rebuild failed");
                None
            }
        }
    }

    fn scenario_subset(
        &self,
        bucket: &Classification,
        features: Vec<FeatureResult>,
    ) -> Vec<FeatureResult> {
        let (matching, other): (Vec<_>, Vec<_>) = features
            .into_iter()
            .partition(|f| self.scenario.classify(&f.record()) == *bucket);
        if matching.is_empty() {
            debug!(bucket = %bucket, "no feature classified into bucket, using whole result set");
            other
        } else {
            matching
        }
    }

    fn write_subset(&self, bucket: &Classification, features: &[FeatureResult]) -> Option<PathBuf> {
        let path = self.tree.bucket_results(bucket);
        let written = fsio::ensure_dir(&self.tree.bucket_dir(bucket))
            .map_err(CukedashError::from)
            .and_then(|()| Ok(serde_json::to_vec_pretty(features)?))
            .and_then(|bytes| Ok(fsio::write_atomic(&path, &bytes)?));
        match written {
            Ok(()) => {
                debug!(bucket = %bucket, features = features.len(), path = %path.display(), "bucket results written");
                Some(path)
            }
            Err(err) => {
                error!(bucket = %bucket, error = %err, "cannot write bucket results");
                None
            }
        }
    }
}
