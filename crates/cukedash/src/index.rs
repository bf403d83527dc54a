//! Dashboard regeneration.
//!
//! The dashboard is derived purely from what is on disk: every
//! `<module>/<feature>/report.html` under the reports root gets a card, no
//! matter which run or worker produced it. The file is rebuilt in full on
//! every call and replaced atomically, so concurrent rebuilds settle on
//! whichever finished last.

use crate::fsio;
use crate::render::escape_html;
use crate::result::CukedashResult;
use crate::tree::{ReportTree, FILE_REPORT_HTML};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Modules and their rendered features, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportIndex {
    modules: BTreeMap<String, Vec<String>>,
}

impl ReportIndex {
    /// Features of a module
    pub fn features(&self, module: &str) -> Option<&[String]> {
        self.modules.get(module).map(Vec::as_slice)
    }

    /// Iterate modules in order
    pub fn modules(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.modules.iter()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn report_count(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Scans the tree and writes `index.html`
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    tree: ReportTree,
}

impl IndexBuilder {
    pub fn new(tree: ReportTree) -> Self {
        Self { tree }
    }

    /// Build the module -> features map from directory presence.
    ///
    /// A missing root yields an empty index.
    pub fn scan(&self) -> ReportIndex {
        let mut modules = BTreeMap::new();
        for module_dir in subdirectories(self.tree.root()) {
            let Some(module) = dir_name(&module_dir) else {
                continue;
            };
            if module == self.tree.screenshots_dir_name() {
                continue;
            }
            let mut features: Vec<String> = subdirectories(&module_dir)
                .into_iter()
                .filter(|dir| dir.join(FILE_REPORT_HTML).is_file())
                .filter_map(|dir| dir_name(&dir))
                .collect();
            if features.is_empty() {
                continue;
            }
            features.sort();
            let _ = modules.insert(module, features);
        }
        ReportIndex { modules }
    }

    /// Regenerate `index.html` from the current tree
    pub fn rebuild_index(&self) -> CukedashResult<ReportIndex> {
        let index = self.scan();
        let html = render_index(&index, Utc::now());
        fsio::write_atomic(&self.tree.index_html(), html.as_bytes())?;
        info!(
            modules = index.module_count(),
            reports = index.report_count(),
            path = %self.tree.index_html().display(),
            "dashboard rebuilt"
        );
        Ok(index)
    }

    /// Path of the dashboard
    pub fn index_path(&self) -> PathBuf {
        self.tree.index_html()
    }
}

fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %dir.display(), error = %err, "cannot scan report directory");
            }
            return Vec::new();
        }
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect()
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

/// Title-case a bucket name for display: `price-books` -> `Price Books`
fn display_name(name: &str) -> String {
    name.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the dashboard.
///
/// Pure: the same index and timestamp always produce the same bytes.
#[must_use]
pub fn render_index(index: &ReportIndex, updated_at: DateTime<Utc>) -> String {
    let mut html = String::new();

    html.push_str(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Test Report Dashboard</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 40px; background: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; }
        h1 { color: #333; border-bottom: 2px solid #4CAF50; padding-bottom: 10px; }
        .timestamp { color: #999; font-size: 0.9em; }
        details.module { background: white; border-radius: 8px; margin: 16px 0; padding: 12px 20px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        details.module summary { font-size: 1.3em; font-weight: bold; cursor: pointer; }
        .count { color: #666; font-weight: normal; font-size: 0.8em; }
        .cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 12px; margin-top: 12px; }
        .card { display: block; background: #f9f9f9; border-left: 4px solid #4CAF50; padding: 14px; border-radius: 6px; color: #333; text-decoration: none; }
        .card:hover { background: #e8f5e9; }
        .empty { color: #666; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Test Report Dashboard</h1>
"#,
    );

    html.push_str(&format!(
        "        <p class=\"timestamp\">Last updated: {}</p>\n",
        updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if index.is_empty() {
        html.push_str("        <p class=\"empty\">No reports generated yet.</p>\n");
    }

    for (module, features) in index.modules() {
        html.push_str(&format!(
            "        <details class=\"module\" open>\n            <summary>{} <span class=\"count\">({} features)</span></summary>\n            <div class=\"cards\">\n",
            escape_html(&display_name(module)),
            features.len()
        ));
        for feature in features {
            html.push_str(&format!(
                "                <a class=\"card\" href=\"{}/{}/{}\">{}</a>\n",
                escape_html(module),
                escape_html(feature),
                FILE_REPORT_HTML,
                escape_html(&display_name(feature))
            ));
        }
        html.push_str("            </div>\n        </details>\n");
    }

    html.push_str("    </div>\n</body>\n</html>\n");
    html
}
