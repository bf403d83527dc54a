//! Per-bucket HTML reports.
//!
//! [`ReportRenderer`] marshals a [`RenderRequest`] for one bucket and hands it
//! to a [`ReportGenerator`]. Generator failures are logged and swallowed: a
//! broken report must never fail the scenario that triggered it, and the
//! index rebuild that follows still has to run.
//!
//! [`HtmlReportGenerator`] is the default generator. It reads the bucket's
//! result JSON and writes a single self-contained page.

use crate::classify::Classification;
use crate::fsio;
use crate::model::{load_results, FeatureResult, ScenarioResult, StepStatus};
use crate::result::CukedashResult;
use crate::tree::{relative_link, ReportTree};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Static run metadata shown at the top of every report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportMetadata {
    pub browser: String,
    pub platform: String,
    pub environment: String,
    pub app_name: String,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            browser: "chromium".to_string(),
            platform: std::env::consts::OS.to_string(),
            environment: "QA".to_string(),
            app_name: "Salesforce".to_string(),
        }
    }
}

/// Everything a generator needs to produce one report
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Result JSON to read
    pub json_file: PathBuf,
    /// `report.html` to write
    pub output: PathBuf,
    /// Directory whose PNGs are linked from the report
    pub screenshots_dir: PathBuf,
    pub metadata: ReportMetadata,
    /// Page title, e.g. `sales / price-books`
    pub title: String,
    pub generated_at: DateTime<Utc>,
}

/// Produces a report file from a request
pub trait ReportGenerator: Send + Sync + fmt::Debug {
    /// Write `request.output`
    ///
    /// # Errors
    ///
    /// Any failure to read the input or write the output.
    fn generate(&self, request: &RenderRequest) -> CukedashResult<()>;
}

/// Default self-contained HTML generator
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReportGenerator;

impl ReportGenerator for HtmlReportGenerator {
    fn generate(&self, request: &RenderRequest) -> CukedashResult<()> {
        let features = load_results(&request.json_file)?;
        let report_dir = request
            .output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let screenshots = list_screenshots(&request.screenshots_dir)?
            .into_iter()
            .map(|path| relative_link(&report_dir, &path))
            .collect::<Vec<_>>();

        let html = render_report_html(request, &features, &screenshots);
        fsio::write_atomic(&request.output, html.as_bytes())?;
        Ok(())
    }
}

/// PNG files directly inside `dir`, sorted by name; a missing dir is empty
fn list_screenshots(dir: &Path) -> CukedashResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut shots = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && fsio::is_png(&path) {
            shots.push(path);
        }
    }
    shots.sort();
    Ok(shots)
}

/// Wraps a generator with bucket-aware parameter marshaling
#[derive(Debug)]
pub struct ReportRenderer {
    tree: ReportTree,
    metadata: ReportMetadata,
    generator: Box<dyn ReportGenerator>,
}

impl ReportRenderer {
    /// Renderer using [`HtmlReportGenerator`]
    pub fn new(tree: ReportTree, metadata: ReportMetadata) -> Self {
        Self {
            tree,
            metadata,
            generator: Box::new(HtmlReportGenerator),
        }
    }

    /// Swap in another generator
    #[must_use]
    pub fn with_generator(mut self, generator: Box<dyn ReportGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Render `<module>/<feature>/report.html` from `json_file`, linking the
    /// bucket's own `screenshots/` folder.
    ///
    /// Never fails; the returned path may not exist if the generator failed.
    pub fn render(&self, module: &str, feature: &str, json_file: &Path) -> PathBuf {
        let bucket = Classification::new(module, feature);
        let screenshots = self.tree.bucket_screenshots(&bucket);
        let _ = self.render_bucket(&bucket, json_file, &screenshots);
        self.tree.bucket_report(&bucket)
    }

    /// Render one bucket with an explicit screenshot directory.
    ///
    /// Returns the report path on success; failures are logged and yield `None`.
    pub fn render_bucket(
        &self,
        bucket: &Classification,
        json_file: &Path,
        screenshots_dir: &Path,
    ) -> Option<PathBuf> {
        let request = self.request(bucket, json_file, screenshots_dir);
        debug!(
            module = %bucket.module,
            feature = %bucket.feature,
            json = %json_file.display(),
            "rendering report"
        );
        match self.generator.generate(&request) {
            Ok(()) => {
                info!(report = %request.output.display(), "report generated");
                Some(request.output)
            }
            Err(err) => {
                error!(
                    module = %bucket.module,
                    feature = %bucket.feature,
                    error = %err,
                    "report generation failed"
                );
                None
            }
        }
    }

    fn request(
        &self,
        bucket: &Classification,
        json_file: &Path,
        screenshots_dir: &Path,
    ) -> RenderRequest {
        RenderRequest {
            json_file: json_file.to_path_buf(),
            output: self.tree.bucket_report(bucket),
            screenshots_dir: screenshots_dir.to_path_buf(),
            metadata: self.metadata.clone(),
            title: format!("{} / {}", bucket.module, bucket.feature),
            generated_at: Utc::now(),
        }
    }
}

/// Escape HTML special characters
pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const fn status_class(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Passed => "pass",
        StepStatus::Failed => "fail",
        _ => "skip",
    }
}

/// Render report HTML content
#[must_use]
pub fn render_report_html(
    request: &RenderRequest,
    features: &[FeatureResult],
    screenshots: &[String],
) -> String {
    let scenarios: Vec<&ScenarioResult> = features.iter().flat_map(|f| &f.elements).collect();
    let passed = scenarios.iter().filter(|s| s.status().is_passed()).count();
    let failed = scenarios.iter().filter(|s| s.status().is_failed()).count();
    let total = scenarios.len();
    let pass_rate = if total == 0 {
        100.0
    } else {
        passed as f64 / total as f64 * 100.0
    };
    let title = escape_html(&request.title);

    let mut html = String::new();

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; background: #f5f5f5; }}
        .summary {{ background: white; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
        .meta td {{ padding: 2px 12px 2px 0; color: #555; }}
        .progress-bar {{ background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }}
        .passed {{ background: #4caf50; height: 100%; }}
        .feature {{ background: white; padding: 16px; border-radius: 8px; margin-bottom: 16px; }}
        .scenario {{ padding: 10px; margin: 8px 0; border-radius: 4px; }}
        .scenario.pass {{ background: #e8f5e9; border-left: 4px solid #4caf50; }}
        .scenario.fail {{ background: #ffebee; border-left: 4px solid #f44336; }}
        .scenario.skip {{ background: #fff3e0; border-left: 4px solid #ff9800; }}
        .step {{ margin: 2px 0; font-family: monospace; }}
        .step.fail {{ color: #d32f2f; }}
        .step.skip {{ color: #999; }}
        .error {{ color: #d32f2f; font-family: monospace; white-space: pre-wrap; }}
        .gallery {{ display: flex; flex-wrap: wrap; gap: 10px; }}
        .gallery figure {{ margin: 0; }}
        .gallery img {{ max-width: 300px; border: 1px solid #ddd; }}
    </style>
</head>
<body>
"#
    ));

    html.push_str(&format!(
        r#"<div class="summary">
    <h1>{title}</h1>
    <table class="meta">
        <tr><td>Application</td><td>{}</td></tr>
        <tr><td>Browser</td><td>{}</td></tr>
        <tr><td>Platform</td><td>{}</td></tr>
        <tr><td>Environment</td><td>{}</td></tr>
        <tr><td>Generated</td><td>{}</td></tr>
    </table>
    <h2>Scenarios: {passed}/{total} passed, {failed} failed ({pass_rate:.1}%)</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {pass_rate:.1}%"></div>
    </div>
</div>
"#,
        escape_html(&request.metadata.app_name),
        escape_html(&request.metadata.browser),
        escape_html(&request.metadata.platform),
        escape_html(&request.metadata.environment),
        request.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    ));

    for feature in features {
        html.push_str(&format!(
            "<div class=\"feature\">\n    <h2>{} {}</h2>\n",
            escape_html(feature.keyword.trim()),
            escape_html(&feature.name)
        ));
        if let Some(uri) = &feature.uri {
            html.push_str(&format!("    <p><code>{}</code></p>\n", escape_html(uri)));
        }

        for scenario in &feature.elements {
            let status = scenario.status();
            html.push_str(&format!(
                "    <div class=\"scenario {}\">\n        <strong>{}</strong> - {} ({:.2}ms)\n",
                status_class(status),
                escape_html(&scenario.name),
                status.as_str(),
                scenario.duration_ms()
            ));

            for step in &scenario.steps {
                let step_status = step.status();
                html.push_str(&format!(
                    "        <div class=\"step {}\">{}{} [{}]</div>\n",
                    status_class(step_status),
                    escape_html(&step.keyword),
                    escape_html(&step.name),
                    step_status.as_str()
                ));
                if let Some(message) = step.result.as_ref().and_then(|r| r.error_message.as_ref()) {
                    html.push_str(&format!(
                        "        <div class=\"error\">{}</div>\n",
                        escape_html(message)
                    ));
                }
                for embedding in step.embeddings.iter().filter(|e| e.is_image()) {
                    html.push_str(&format!(
                        "        <img alt=\"attachment\" src=\"data:{};base64,{}\">\n",
                        escape_html(&embedding.mime_type),
                        escape_html(&embedding.data)
                    ));
                }
            }

            html.push_str("    </div>\n");
        }

        html.push_str("</div>\n");
    }

    if !screenshots.is_empty() {
        html.push_str("<h2>Screenshots</h2>\n<div class=\"gallery\">\n");
        for link in screenshots {
            let name = link.rsplit('/').next().unwrap_or(link);
            html.push_str(&format!(
                "    <figure><a href=\"{link}\"><img loading=\"lazy\" alt=\"{name}\" src=\"{link}\"></a><figcaption>{name}</figcaption></figure>\n",
                link = escape_html(link),
                name = escape_html(name)
            ));
        }
        html.push_str("</div>\n");
    }

    html.push_str(
        r"
<footer>
    <p>Generated by cukedash</p>
</footer>
</body>
</html>
",
    );

    html
}
