//! Build command handler

use crate::error::CliResult;
use crate::output::ProgressReporter;
use cukedash::{load_results, BatchSummary, ReportConfig, ReportPipeline};

/// Execute the build command, advancing `reporter` once per bucket
pub fn execute_build(
    config: &ReportConfig,
    reporter: &mut ProgressReporter,
) -> CliResult<BatchSummary> {
    let pipeline = ReportPipeline::new(config);

    // Size the bar up front; the pipeline reloads the same file.
    let features = load_results(&config.tree().results_json())?;
    let total = pipeline.plan_batch(features).len();
    reporter.start_progress(total as u64, "building reports");

    let summary = pipeline.build_all_with(|done, bucket| {
        reporter.set_message(&bucket.to_string());
        reporter.set_position(done as u64);
    })?;
    reporter.finish();
    Ok(summary)
}

/// One-line description of a batch build
#[must_use]
pub fn describe(summary: &BatchSummary) -> String {
    format!(
        "{} report(s) rendered from {} bucket(s), {} screenshot(s) moved",
        summary.reports, summary.buckets, summary.screenshots_moved
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const RESULTS: &str = r#"[
        {"uri": "features/sales/leads.feature", "name": "Leads", "elements": []},
        {"uri": "features/finance/invoices.feature", "name": "Invoices", "elements": []}
    ]"#;

    #[test]
    fn test_build_renders_every_bucket() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("cucumber-report.json"), RESULTS).unwrap();
        let mut reporter = ProgressReporter::new(false, true);

        let summary = execute_build(
            &ReportConfig::new().with_reports_root(tmp.path()),
            &mut reporter,
        )
        .unwrap();

        assert_eq!(summary.buckets, 2);
        assert_eq!(summary.reports, 2);
        assert!(tmp.path().join("finance/invoices/report.html").is_file());
        assert_eq!(
            describe(&summary),
            "2 report(s) rendered from 2 bucket(s), 0 screenshot(s) moved"
        );
    }

    #[test]
    fn test_build_without_results_fails() {
        let tmp = TempDir::new().unwrap();
        let mut reporter = ProgressReporter::new(false, true);
        assert!(execute_build(
            &ReportConfig::new().with_reports_root(tmp.path()),
            &mut reporter
        )
        .is_err());
    }
}
