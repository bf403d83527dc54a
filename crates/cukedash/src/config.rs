//! Report aggregation configuration.
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields a working setup rooted at `cucumber-reports/`:
//!
//! ```yaml
//! reports_root: cucumber-reports
//! flush_delay_ms: 2000
//! metadata:
//!   browser: chromium
//!   environment: UAT
//! features:
//!   - { key: ledgers, module: finance, feature: ledgers }
//! keywords:
//!   - { trigger: ledger, module: finance, feature: ledgers }
//! ```

use crate::classify::{ClassificationMode, Classifier, FeatureMapping, KeywordTrigger};
use crate::render::ReportMetadata;
use crate::result::{CukedashError, CukedashResult};
use crate::tree::ReportTree;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default reports root
pub const DEFAULT_REPORTS_ROOT: &str = "cucumber-reports";
/// Default runner result file name
pub const DEFAULT_RESULTS_FILE: &str = "cucumber-report.json";
/// Default capture directory name
pub const DEFAULT_SCREENSHOTS_DIR: &str = "screenshots";
/// Default wait for the JSON formatter to flush (milliseconds)
pub const DEFAULT_FLUSH_DELAY_MS: u64 = 2000;

/// Report aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Root of the report tree
    pub reports_root: PathBuf,
    /// Runner result file, relative to the root
    pub results_file: String,
    /// Capture directory, relative to the root
    pub screenshots_dir: String,
    /// Delay before reading the result file after a scenario
    pub flush_delay_ms: u64,
    /// Static metadata shown in every report
    pub metadata: ReportMetadata,
    /// Extra feature table entries
    pub features: Vec<FeatureMapping>,
    /// Extra title triggers, tried after the built-ins
    pub keywords: Vec<KeywordTrigger>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            reports_root: PathBuf::from(DEFAULT_REPORTS_ROOT),
            results_file: DEFAULT_RESULTS_FILE.to_string(),
            screenshots_dir: DEFAULT_SCREENSHOTS_DIR.to_string(),
            flush_delay_ms: DEFAULT_FLUSH_DELAY_MS,
            metadata: ReportMetadata::default(),
            features: Vec::new(),
            keywords: Vec::new(),
        }
    }
}

impl ReportConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> CukedashResult<Self> {
        let config: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| CukedashError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject table entries and triggers whose names normalize to nothing
    pub fn validate(&self) -> CukedashResult<()> {
        if let Some(bad) = self.features.iter().find(|m| !m.is_usable()) {
            return Err(CukedashError::config(format!(
                "feature mapping {:?} -> {:?}/{:?} needs a non-empty key, module and feature",
                bad.key, bad.module, bad.feature
            )));
        }
        if let Some(bad) = self.keywords.iter().find(|t| !t.is_usable()) {
            return Err(CukedashError::config(format!(
                "keyword trigger {:?} -> {:?}/{:?} needs a non-empty trigger, module and feature",
                bad.trigger, bad.module, bad.feature
            )));
        }
        Ok(())
    }

    /// Load a YAML file
    pub fn load(path: &Path) -> CukedashResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            CukedashError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> CukedashResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| CukedashError::config(e.to_string()))
    }

    /// Set the reports root
    #[must_use]
    pub fn with_reports_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.reports_root = root.into();
        self
    }

    /// Set the flush delay
    #[must_use]
    pub const fn with_flush_delay_ms(mut self, ms: u64) -> Self {
        self.flush_delay_ms = ms;
        self
    }

    /// Set report metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: ReportMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a feature table entry
    #[must_use]
    pub fn with_feature(mut self, mapping: FeatureMapping) -> Self {
        self.features.push(mapping);
        self
    }

    /// Add a keyword trigger
    #[must_use]
    pub fn with_keyword(mut self, trigger: KeywordTrigger) -> Self {
        self.keywords.push(trigger);
        self
    }

    /// Flush delay as a duration
    #[must_use]
    pub const fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms)
    }

    /// Layout of the configured tree
    #[must_use]
    pub fn tree(&self) -> ReportTree {
        ReportTree::new(&self.reports_root)
            .with_results_file(&self.results_file)
            .with_screenshots_dir(&self.screenshots_dir)
    }

    /// Classifier for `mode` with the configured extras applied
    #[must_use]
    pub fn classifier(&self, mode: ClassificationMode) -> Classifier {
        Classifier::new(mode)
            .with_features(&self.features)
            .with_keywords(&self.keywords)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::model::TestResultRecord;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::new();
        assert_eq!(config.reports_root, PathBuf::from("cucumber-reports"));
        assert_eq!(config.flush_delay(), Duration::from_secs(2));
        assert_eq!(
            config.tree().results_json(),
            PathBuf::from("cucumber-reports/cucumber-report.json")
        );
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = ReportConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r"
reports_root: out/reports
flush_delay_ms: 0
metadata:
  environment: UAT
keywords:
  - { trigger: Ledger, module: finance, feature: ledgers }
";
        let config = ReportConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.reports_root, PathBuf::from("out/reports"));
        assert_eq!(config.flush_delay_ms, 0);
        assert_eq!(config.metadata.environment, "UAT");
        assert_eq!(config.metadata.browser, "chromium");
        assert_eq!(config.results_file, DEFAULT_RESULTS_FILE);

        let classifier = config.classifier(ClassificationMode::Simple);
        assert_eq!(
            classifier.classify(&TestResultRecord::named("Ledger close")),
            Classification::new("finance", "ledgers")
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ReportConfig::from_yaml("flush_delay_ms: [nope").unwrap_err();
        assert!(matches!(err, CukedashError::Config { .. }));
    }

    #[test]
    fn test_trigger_with_empty_module_rejected() {
        let yaml = "keywords:\n  - { trigger: ledger, module: '', feature: ledgers }\n";
        let err = ReportConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, CukedashError::Config { .. }));
        assert!(err.to_string().contains("keyword trigger"));
    }

    #[test]
    fn test_mapping_with_blank_feature_rejected() {
        let yaml = "features:\n  - { key: ledgers, module: finance, feature: '  ' }\n";
        let err = ReportConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("feature mapping"));
    }

    #[test]
    fn test_builder_entries_validate() {
        let config = ReportConfig::new().with_keyword(KeywordTrigger::new("x", "..", "y"));
        assert!(config.validate().is_err());
        assert!(ReportConfig::new().validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ReportConfig::new()
            .with_reports_root("r")
            .with_flush_delay_ms(10)
            .with_feature(FeatureMapping {
                key: "ledgers".to_string(),
                module: "finance".to_string(),
                feature: "ledgers".to_string(),
            });
        let yaml = config.to_yaml().unwrap();
        assert_eq!(ReportConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ReportConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
