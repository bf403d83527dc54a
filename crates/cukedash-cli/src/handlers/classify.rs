//! Classify command handler

use crate::commands::{ClassifyArgs, FormatArg};
use crate::error::{CliError, CliResult};
use cukedash::{
    load_results, Classifier, CukedashError, FeatureResult, ReportConfig, TestResultRecord,
};
use serde::Serialize;

/// One classified result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifyRow {
    /// Title that was classified
    pub name: String,
    /// Feature file path, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Bucket module
    pub module: String,
    /// Bucket feature
    pub feature: String,
    /// Tier that decided
    pub tier: cukedash::ClassificationTier,
}

/// Classify one record
#[must_use]
pub fn classify_record(classifier: &Classifier, record: &TestResultRecord) -> ClassifyRow {
    let trace = classifier.explain(record);
    ClassifyRow {
        name: record.name.clone(),
        uri: record.uri.clone(),
        module: trace.classification.module,
        feature: trace.classification.feature,
        tier: trace.tier,
    }
}

/// Classify every feature of a result document
#[must_use]
pub fn classify_features(classifier: &Classifier, features: &[FeatureResult]) -> Vec<ClassifyRow> {
    features
        .iter()
        .map(|f| classify_record(classifier, &f.record()))
        .collect()
}

/// Render rows as aligned text or JSON
pub fn format_rows(rows: &[ClassifyRow], format: FormatArg) -> CliResult<String> {
    match format {
        FormatArg::Json => Ok(serde_json::to_string_pretty(rows).map_err(CukedashError::from)?),
        FormatArg::Text => {
            let buckets: Vec<String> = rows
                .iter()
                .map(|r| format!("{}/{}", r.module, r.feature))
                .collect();
            let width = buckets.iter().map(String::len).max().unwrap_or(0);
            let mut out = String::new();
            for (row, bucket) in rows.iter().zip(&buckets) {
                out.push_str(&format!(
                    "{bucket:<width$}  {:<8}  {}\n",
                    format!("{:?}", row.tier).to_lowercase(),
                    row.name
                ));
            }
            Ok(out)
        }
    }
}

/// Execute the classify command
pub fn execute_classify(config: &ReportConfig, args: &ClassifyArgs) -> CliResult<String> {
    if args.is_single() && args.results.is_some() {
        return Err(CliError::invalid_argument(
            "--results cannot be combined with --uri or --name",
        ));
    }
    let classifier = config.classifier(args.mode.into());

    let rows = if args.is_single() {
        let mut record = TestResultRecord::named(args.name.clone().unwrap_or_default());
        record.uri.clone_from(&args.uri);
        vec![classify_record(&classifier, &record)]
    } else {
        let path = args
            .results
            .clone()
            .unwrap_or_else(|| config.tree().results_json());
        let features = load_results(&path)?;
        classify_features(&classifier, &features)
    };

    format_rows(&rows, args.format)
}
