//! On-disk layout of the report tree.
//!
//! ```text
//! cucumber-reports/
//! ├── index.html
//! ├── cucumber-report.json
//! ├── screenshots/
//! │   ├── <flat captures>.png
//! │   └── <module>/<feature>/*.png
//! └── <module>/<feature>/
//!     ├── report.html
//!     ├── cucumber-report.json
//!     └── screenshots/*.png
//! ```

use crate::classify::Classification;
use std::path::{Component, Path, PathBuf};

/// Dashboard file at the root of the tree
pub const FILE_INDEX_HTML: &str = "index.html";
/// Per-bucket HTML report
pub const FILE_REPORT_HTML: &str = "report.html";
/// Directory holding captures; never treated as a module
pub const DIR_SCREENSHOTS: &str = "screenshots";

/// Path helper for a reports root
#[derive(Debug, Clone)]
pub struct ReportTree {
    root: PathBuf,
    results_file: String,
    screenshots_dir: String,
}

impl ReportTree {
    /// Layout with the default file names
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            results_file: "cucumber-report.json".to_string(),
            screenshots_dir: DIR_SCREENSHOTS.to_string(),
        }
    }

    /// Override the runner's result file name
    #[must_use]
    pub fn with_results_file(mut self, name: impl Into<String>) -> Self {
        self.results_file = name.into();
        self
    }

    /// Override the capture directory name
    #[must_use]
    pub fn with_screenshots_dir(mut self, name: impl Into<String>) -> Self {
        self.screenshots_dir = name.into();
        self
    }

    /// Reports root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the capture directory (excluded from the module scan)
    pub fn screenshots_dir_name(&self) -> &str {
        &self.screenshots_dir
    }

    /// `index.html`
    pub fn index_html(&self) -> PathBuf {
        self.root.join(FILE_INDEX_HTML)
    }

    /// `cucumber-report.json`
    pub fn results_json(&self) -> PathBuf {
        self.root.join(&self.results_file)
    }

    /// `screenshots/`
    pub fn flat_captures(&self) -> PathBuf {
        self.root.join(&self.screenshots_dir)
    }

    /// `screenshots/<module>/<feature>/`
    pub fn bucket_captures(&self, bucket: &Classification) -> PathBuf {
        self.flat_captures()
            .join(&bucket.module)
            .join(&bucket.feature)
    }

    /// `<module>/<feature>/`
    pub fn bucket_dir(&self, bucket: &Classification) -> PathBuf {
        self.root.join(&bucket.module).join(&bucket.feature)
    }

    /// `<module>/<feature>/report.html`
    pub fn bucket_report(&self, bucket: &Classification) -> PathBuf {
        self.bucket_dir(bucket).join(FILE_REPORT_HTML)
    }

    /// `<module>/<feature>/cucumber-report.json`
    pub fn bucket_results(&self, bucket: &Classification) -> PathBuf {
        self.bucket_dir(bucket).join(&self.results_file)
    }

    /// `<module>/<feature>/screenshots/`
    pub fn bucket_screenshots(&self, bucket: &Classification) -> PathBuf {
        self.bucket_dir(bucket).join(&self.screenshots_dir)
    }
}

/// Relative URL from `from_dir` to `target`, both expressed from the same base.
///
/// Used to link screenshots from a report without assuming where the tree is served.
pub fn relative_link(from_dir: &Path, target: &Path) -> String {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = target.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().to_string());
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> Classification {
        Classification::new("sales", "price-books")
    }

    #[test]
    fn test_paths_are_stable() {
        let tree = ReportTree::new("/tmp/cucumber-reports");
        assert_eq!(
            tree.index_html(),
            PathBuf::from("/tmp/cucumber-reports/index.html")
        );
        assert_eq!(
            tree.results_json(),
            PathBuf::from("/tmp/cucumber-reports/cucumber-report.json")
        );
        assert_eq!(
            tree.bucket_report(&bucket()),
            PathBuf::from("/tmp/cucumber-reports/sales/price-books/report.html")
        );
        assert_eq!(
            tree.bucket_captures(&bucket()),
            PathBuf::from("/tmp/cucumber-reports/screenshots/sales/price-books")
        );
        assert_eq!(
            tree.bucket_screenshots(&bucket()),
            PathBuf::from("/tmp/cucumber-reports/sales/price-books/screenshots")
        );
    }

    #[test]
    fn test_overrides() {
        let tree = ReportTree::new("out")
            .with_results_file("results.json")
            .with_screenshots_dir("captures");
        assert_eq!(tree.results_json(), PathBuf::from("out/results.json"));
        assert_eq!(tree.flat_captures(), PathBuf::from("out/captures"));
        assert_eq!(tree.screenshots_dir_name(), "captures");
    }

    #[test]
    fn test_relative_link_inside_bucket() {
        let tree = ReportTree::new("r");
        let link = relative_link(
            &tree.bucket_dir(&bucket()),
            &tree.bucket_screenshots(&bucket()).join("a.png"),
        );
        assert_eq!(link, "screenshots/a.png");
    }

    #[test]
    fn test_relative_link_to_capture_tree() {
        let tree = ReportTree::new("r");
        let link = relative_link(
            &tree.bucket_dir(&bucket()),
            &tree.bucket_captures(&bucket()).join("a.png"),
        );
        assert_eq!(link, "../../screenshots/sales/price-books/a.png");
    }
}
