//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use cukedash::{ClassificationMode, OrganizeMode};
use std::path::PathBuf;

/// Cukedash: sort BDD results into module/feature reports with a dashboard
#[derive(Parser, Debug)]
#[command(name = "cukedash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML file with report settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root of the report tree
    #[arg(long, env = "CUKEDASH_REPORTS_ROOT", global = true)]
    pub reports_root: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which bucket each result lands in
    Classify(ClassifyArgs),

    /// Relocate screenshots into a bucket
    Organize(OrganizeArgs),

    /// Refresh one bucket's report and the dashboard
    Render(RenderArgs),

    /// Rebuild the dashboard from the report tree
    Index,

    /// Split the result file into every bucket and render all reports
    Build,

    /// Print the effective configuration as YAML
    Config,
}

/// Arguments for the classify command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Result file (defaults to the one under the reports root)
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Classify a single feature file path instead of a result file
    #[arg(long)]
    pub uri: Option<String>,

    /// Classify a single title instead of a result file
    #[arg(long)]
    pub name: Option<String>,

    /// Fallback flavour
    #[arg(long, value_enum, default_value = "scenario")]
    pub mode: ModeArg,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,
}

impl ClassifyArgs {
    /// Whether a single record was given on the command line
    #[must_use]
    pub const fn is_single(&self) -> bool {
        self.uri.is_some() || self.name.is_some()
    }
}

/// Arguments for the organize command
#[derive(Parser, Debug)]
pub struct OrganizeArgs {
    /// Module of the bucket
    #[arg(long)]
    pub module: String,

    /// Feature of the bucket
    #[arg(long)]
    pub feature: String,

    /// Copy from the bucket capture tree or move from the flat folder
    #[arg(long, value_enum, default_value = "copy")]
    pub mode: OrganizeModeArg,
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Module of the bucket
    #[arg(long)]
    pub module: String,

    /// Feature of the bucket
    #[arg(long)]
    pub feature: String,
}

/// Classification mode argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModeArg {
    /// Per-scenario buckets, unknowns under otherfunctionality/general
    #[default]
    Scenario,
    /// Batch buckets, unknowns under general/general
    Simple,
}

impl From<ModeArg> for ClassificationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Scenario => Self::Scenario,
            ModeArg::Simple => Self::Simple,
        }
    }
}

/// Screenshot relocation argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrganizeModeArg {
    /// Copy, keeping the sources
    #[default]
    Copy,
    /// Move out of the flat folder
    Move,
}

impl From<OrganizeModeArg> for OrganizeMode {
    fn from(arg: OrganizeModeArg) -> Self {
        match arg {
            OrganizeModeArg::Copy => Self::Copy,
            OrganizeModeArg::Move => Self::Move,
        }
    }
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
