//! Cukedash: report aggregation for BDD test suites
//!
//! Cukedash takes the JSON results a Cucumber-style runner writes, sorts
//! every feature into a `(module, feature)` bucket, gathers the screenshots
//! captured during the run, renders one HTML report per bucket and keeps a
//! dashboard linking all of them up to date.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     CUKEDASH Report Flow                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  cucumber-report.json                                            │
//! │        │                                                         │
//! │        ▼                                                         │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌─────────┐  │
//! │  │ Classifier │──►│ Organizer  │──►│ Renderer   │──►│ Index   │  │
//! │  │ path/table │   │ copy/move  │   │ report.html│   │ Builder │  │
//! │  │ /keyword   │   │ screenshots│   │ per bucket │   │         │  │
//! │  └────────────┘   └────────────┘   └────────────┘   └─────────┘  │
//! │        ▲                                                         │
//! │  ScenarioHook (after every scenario) / ReportPipeline::build_all │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Output tree
//!
//! ```text
//! cucumber-reports/
//! ├── cucumber-report.json          runner output
//! ├── index.html                    dashboard
//! ├── screenshots/<module>/<feature>/*.png
//! └── <module>/<feature>/
//!     ├── cucumber-report.json      bucket subset
//!     ├── report.html
//!     └── screenshots/*.png
//! ```

// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod classify;
mod config;
mod fsio;
#[allow(clippy::must_use_candidate)]
mod hook;
#[allow(clippy::must_use_candidate, clippy::missing_errors_doc)]
mod index;
mod model;
#[allow(clippy::must_use_candidate)]
mod organize;
#[allow(clippy::must_use_candidate, clippy::missing_errors_doc)]
mod pipeline;
#[allow(clippy::must_use_candidate, clippy::missing_errors_doc)]
mod render;
mod result;
#[allow(clippy::must_use_candidate)]
mod tree;

pub use classify::{
    feature_key, feature_name, normalize_segment, parse_uri, Classification, ClassificationMode,
    ClassificationTier, ClassificationTrace, Classifier, FeatureMapping, FeatureModuleMap,
    KeywordTrigger, UriParts,
};
pub use config::{
    ReportConfig, DEFAULT_FLUSH_DELAY_MS, DEFAULT_REPORTS_ROOT, DEFAULT_RESULTS_FILE,
    DEFAULT_SCREENSHOTS_DIR,
};
pub use hook::{
    capture_file_name, sanitize_name, HookOutcome, ScenarioContext, ScenarioHook, ScenarioWorld,
    PNG_MIME,
};
pub use index::{render_index, IndexBuilder, ReportIndex};
pub use model::{
    load_results, parse_results, Embedding, FeatureResult, ScenarioResult, StepOutcome,
    StepResult, StepStatus, Tag, TestResultRecord,
};
pub use organize::{
    CaptureOutcome, OrganizeMode, OrganizeSummary, ScreenshotArtifact, ScreenshotOrganizer,
};
pub use pipeline::{BatchPlan, BatchSummary, BucketRefresh, ReportPipeline};
pub use render::{
    render_report_html, HtmlReportGenerator, RenderRequest, ReportGenerator, ReportMetadata,
    ReportRenderer,
};
pub use result::{CukedashError, CukedashResult};
pub use tree::{relative_link, ReportTree, DIR_SCREENSHOTS, FILE_INDEX_HTML, FILE_REPORT_HTML};

/// Re-export async-trait so `ScenarioWorld` can be implemented without a direct dependency
pub use async_trait::async_trait;
