//! Result classification into `(module, feature)` buckets.
//!
//! A result is resolved by the first tier that produces an answer:
//!
//! 1. **Path**: the directory after `features/` in the result's `uri` is the
//!    module, the feature-file basename (minus `salesforce_` / `.feature`) is
//!    the feature.
//! 2. **Table**: a basename listed in [`FeatureModuleMap`] returns the table
//!    entry, overriding the module read from the path. The lookup is an exact
//!    match on the lower-cased basename, so `price_books` does not hit the
//!    `price-books` entry.
//! 3. **Keyword**: the lower-cased title is tested against an ordered list of
//!    substring triggers.
//! 4. **Fallback**: the mode's sentinel bucket.
//!
//! Trigger order is significant. Titles such as "Account Report" contain more
//! than one trigger and existing report trees depend on the first one winning.

use crate::model::TestResultRecord;
use crate::result::{CukedashError, CukedashResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::warn;

/// Prefixes stripped from feature-file basenames
const FEATURE_FILE_PREFIXES: [&str; 2] = ["salesforce_", "salesforce-"];
/// Suffix stripped from feature-file basenames
const FEATURE_FILE_SUFFIX: &str = ".feature";
/// Path segment that precedes the module directory
const FEATURES_SEGMENT: &str = "features";
/// Stands in for a bucket name with nothing left after normalization
const PLACEHOLDER_SEGMENT: &str = "general";

/// Canonical feature basename -> (module, feature)
const BUILTIN_FEATURES: &[(&str, &str, &str)] = &[
    ("price-books", "sales", "price-books"),
    ("opportunities", "sales", "opportunities"),
    ("quotes", "sales", "quotes"),
    ("products", "sales", "products"),
    ("orders", "sales", "orders"),
    ("contracts", "sales", "contracts"),
    ("leads", "sales", "leads"),
    ("invoices", "finance", "invoices"),
    ("payments", "finance", "payments"),
    ("credit-notes", "finance", "credit-notes"),
    ("taxes", "finance", "taxes"),
    ("contacts", "customerdata", "contacts"),
    ("cases", "service", "cases"),
    ("knowledge-articles", "service", "knowledge"),
    ("campaigns", "marketing", "campaigns"),
    ("email-templates", "marketing", "email-templates"),
    ("scorecards", "otherfunctionality", "scorecards"),
    ("tasks", "otherfunctionality", "tasks"),
    ("events", "otherfunctionality", "events"),
    ("dashboards", "analytics", "dashboards"),
    ("reports", "analytics", "reports"),
    ("users", "administration", "users"),
    ("permission-sets", "administration", "permission-sets"),
    ("profiles", "administration", "profiles"),
];

/// Title substring -> (module, feature), first match wins
const BUILTIN_KEYWORDS: &[(&str, &str, &str)] = &[
    ("price book", "sales", "price-books"),
    ("scorecard", "otherfunctionality", "scorecards"),
    ("dashboard", "analytics", "dashboards"),
    ("report", "analytics", "reports"),
    ("opportunit", "sales", "opportunities"),
    ("quote", "sales", "quotes"),
    ("product", "sales", "products"),
    ("order", "sales", "orders"),
    ("contract", "sales", "contracts"),
    ("lead", "sales", "leads"),
    ("invoice", "finance", "invoices"),
    ("payment", "finance", "payments"),
    ("credit note", "finance", "credit-notes"),
    ("tax", "finance", "taxes"),
    ("contact", "customerdata", "contacts"),
    ("account", "customerdata", "accounts"),
    ("case", "service", "cases"),
    ("knowledge", "service", "knowledge"),
    ("campaign", "marketing", "campaigns"),
    ("email template", "marketing", "email-templates"),
    ("task", "otherfunctionality", "tasks"),
    ("event", "otherfunctionality", "events"),
    ("user", "administration", "users"),
    ("login", "administration", "login"),
];

/// Lower-case, hyphenated form used for bucket names.
///
/// Every run of characters other than letters and digits becomes one hyphen,
/// so the result never contains `.` or a path separator and is safe to join
/// onto the reports root. May be empty.
pub fn normalize_segment(raw: &str) -> String {
    raw.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Table key of a feature-file basename: lower-cased, without the
/// `salesforce_` prefix and `.feature` suffix, otherwise verbatim.
///
/// `Salesforce_Price-Books.feature` -> `price-books`
pub fn feature_key(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    let without_suffix = lower.strip_suffix(FEATURE_FILE_SUFFIX).unwrap_or(&lower);
    FEATURE_FILE_PREFIXES
        .iter()
        .find_map(|prefix| without_suffix.strip_prefix(prefix))
        .unwrap_or(without_suffix)
        .to_string()
}

/// Bucket feature name of a feature-file basename.
///
/// `Salesforce_Price_Books.feature` -> `price-books`
pub fn feature_name(file_name: &str) -> String {
    normalize_segment(&feature_key(file_name))
}

fn segment_or_placeholder(raw: &str) -> String {
    let segment = normalize_segment(raw);
    if segment.is_empty() {
        PLACEHOLDER_SEGMENT.to_string()
    } else {
        segment
    }
}

/// A `(module, feature)` bucket
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Classification {
    /// Business-domain bucket, e.g. `sales`
    pub module: String,
    /// Capability within the module, e.g. `price-books`
    pub feature: String,
}

impl Classification {
    /// Bucket from raw names; both are normalized, and a name that
    /// normalizes to nothing becomes `general`
    pub fn new(module: &str, feature: &str) -> Self {
        Self {
            module: segment_or_placeholder(module),
            feature: segment_or_placeholder(feature),
        }
    }

    /// Bucket from user-supplied names.
    ///
    /// # Errors
    ///
    /// `InvalidBucket` when either name has no letters or digits, e.g. `..`.
    pub fn try_new(module: &str, feature: &str) -> CukedashResult<Self> {
        let (m, f) = (normalize_segment(module), normalize_segment(feature));
        if m.is_empty() || f.is_empty() {
            return Err(CukedashError::invalid_bucket(format!(
                "{module:?}/{feature:?} has no usable module or feature name"
            )));
        }
        Ok(Self { module: m, feature: f })
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module, self.feature)
    }
}

/// Which report flavour is classifying; decides the fallback bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Per-scenario refresh driven by the after-scenario hook
    #[default]
    Scenario,
    /// Batch rebuild over the whole result file
    Simple,
}

impl ClassificationMode {
    /// Sentinel bucket when no tier matches
    #[must_use]
    pub fn fallback(self) -> Classification {
        match self {
            Self::Scenario => Classification::new("otherfunctionality", "general"),
            Self::Simple => Classification::new("general", "general"),
        }
    }
}

/// Which tier produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationTier {
    /// Module directory and basename from the uri
    Path,
    /// Static table entry
    Table,
    /// Title keyword
    Keyword,
    /// Nothing matched
    Fallback,
}

/// Extra table entry supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMapping {
    /// Canonical feature basename
    pub key: String,
    pub module: String,
    pub feature: String,
}

impl FeatureMapping {
    /// Whether key, module and feature all survive normalization
    pub fn is_usable(&self) -> bool {
        !feature_key(&self.key).trim().is_empty()
            && !normalize_segment(&self.module).is_empty()
            && !normalize_segment(&self.feature).is_empty()
    }
}

/// Extra keyword trigger supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTrigger {
    /// Substring looked for in the lower-cased title
    pub trigger: String,
    pub module: String,
    pub feature: String,
}

impl KeywordTrigger {
    /// New trigger; the substring is lower-cased
    pub fn new(trigger: &str, module: &str, feature: &str) -> Self {
        Self {
            trigger: trigger.to_lowercase(),
            module: module.to_string(),
            feature: feature.to_string(),
        }
    }

    /// Whether trigger, module and feature all survive normalization
    pub fn is_usable(&self) -> bool {
        !self.trigger.trim().is_empty()
            && !normalize_segment(&self.module).is_empty()
            && !normalize_segment(&self.feature).is_empty()
    }

    fn bucket(&self) -> Classification {
        Classification::new(&self.module, &self.feature)
    }
}

/// Immutable lookup from canonical feature basename to bucket
#[derive(Debug, Clone, Default)]
pub struct FeatureModuleMap {
    entries: BTreeMap<String, Classification>,
}

impl FeatureModuleMap {
    /// The built-in table, constructed on first use
    pub fn builtin() -> &'static Self {
        static BUILTIN: OnceLock<FeatureModuleMap> = OnceLock::new();
        BUILTIN.get_or_init(|| Self {
            entries: BUILTIN_FEATURES
                .iter()
                .map(|(key, module, feature)| {
                    ((*key).to_string(), Classification::new(module, feature))
                })
                .collect(),
        })
    }

    /// Copy of this table with `overrides` layered on top
    #[must_use]
    pub fn with_overrides(&self, overrides: &[FeatureMapping]) -> Self {
        let mut entries = self.entries.clone();
        for mapping in overrides {
            if !mapping.is_usable() {
                warn!(key = %mapping.key, module = %mapping.module, feature = %mapping.feature,
                    "ignoring feature mapping with an empty name");
                continue;
            }
            let _ = entries.insert(
                feature_key(&mapping.key),
                Classification::new(&mapping.module, &mapping.feature),
            );
        }
        Self { entries }
    }

    /// Look up a canonical key
    pub fn get(&self, key: &str) -> Option<&Classification> {
        self.entries.get(key)
    }

    /// Check if a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pieces of a feature-file uri
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    /// Directory right after the first `features` segment
    pub module: Option<String>,
    /// Table key of the basename
    pub feature_key: Option<String>,
    /// Normalized feature name of the basename
    pub feature: Option<String>,
}

/// Split a uri on either separator and pick out module and feature key
pub fn parse_uri(uri: &str) -> UriParts {
    let segments: Vec<&str> = uri
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    let Some((file_name, dirs)) = segments.split_last() else {
        return UriParts::default();
    };

    let module = dirs
        .iter()
        .position(|s| s.eq_ignore_ascii_case(FEATURES_SEGMENT))
        .and_then(|idx| dirs.get(idx + 1))
        .map(|s| normalize_segment(s))
        .filter(|m| !m.is_empty());
    let key = feature_key(file_name);
    let feature = normalize_segment(&key);

    UriParts {
        module,
        feature_key: (!key.is_empty()).then_some(key),
        feature: (!feature.is_empty()).then_some(feature),
    }
}

/// Classification plus the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationTrace {
    pub classification: Classification,
    pub tier: ClassificationTier,
}

/// Layered result classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    mode: ClassificationMode,
    table: FeatureModuleMap,
    triggers: Vec<KeywordTrigger>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassificationMode::default())
    }
}

impl Classifier {
    /// Classifier with the built-in table and triggers
    pub fn new(mode: ClassificationMode) -> Self {
        Self {
            mode,
            table: FeatureModuleMap::builtin().clone(),
            triggers: BUILTIN_KEYWORDS
                .iter()
                .map(|(trigger, module, feature)| KeywordTrigger::new(trigger, module, feature))
                .collect(),
        }
    }

    /// Layer extra table entries over the built-ins
    #[must_use]
    pub fn with_features(mut self, overrides: &[FeatureMapping]) -> Self {
        self.table = self.table.with_overrides(overrides);
        self
    }

    /// Append triggers after the built-ins; triggers with an empty name are
    /// skipped
    #[must_use]
    pub fn with_keywords(mut self, extra: &[KeywordTrigger]) -> Self {
        for t in extra {
            if !t.is_usable() {
                warn!(trigger = %t.trigger, module = %t.module, feature = %t.feature,
                    "ignoring keyword trigger with an empty name");
                continue;
            }
            self.triggers
                .push(KeywordTrigger::new(&t.trigger, &t.module, &t.feature));
        }
        self
    }

    /// Mode this classifier falls back for
    pub const fn mode(&self) -> ClassificationMode {
        self.mode
    }

    /// The lookup table in use
    pub const fn table(&self) -> &FeatureModuleMap {
        &self.table
    }

    /// Bucket for a result; never fails
    pub fn classify(&self, record: &TestResultRecord) -> Classification {
        self.explain(record).classification
    }

    /// Bucket for a result together with the tier that decided it
    pub fn explain(&self, record: &TestResultRecord) -> ClassificationTrace {
        let parts = record.uri.as_deref().map(parse_uri).unwrap_or_default();

        if let Some(hit) = parts.feature_key.as_deref().and_then(|k| self.table.get(k)) {
            return trace(hit.clone(), ClassificationTier::Table);
        }

        if let (Some(module), Some(feature)) = (&parts.module, &parts.feature) {
            return trace(
                Classification {
                    module: module.clone(),
                    feature: feature.clone(),
                },
                ClassificationTier::Path,
            );
        }

        if let Some(hit) = self.match_keyword(&record.name) {
            return trace(hit, ClassificationTier::Keyword);
        }

        let mut fallback = self.mode.fallback();
        if let Some(feature) = parts.feature {
            fallback.feature = feature;
        }
        trace(fallback, ClassificationTier::Fallback)
    }

    /// First trigger contained in the lower-cased title
    pub fn match_keyword(&self, title: &str) -> Option<Classification> {
        let title = title.to_lowercase();
        self.triggers
            .iter()
            .find(|t| !t.trigger.is_empty() && title.contains(&t.trigger))
            .map(KeywordTrigger::bucket)
    }
}

fn trace(classification: Classification, tier: ClassificationTier) -> ClassificationTrace {
    ClassificationTrace {
        classification,
        tier,
    }
}
