//! Index command handler

use crate::error::CliResult;
use cukedash::{IndexBuilder, ReportConfig, ReportIndex};
use std::path::PathBuf;

/// Execute the index command
pub fn execute_index(config: &ReportConfig) -> CliResult<(PathBuf, ReportIndex)> {
    let builder = IndexBuilder::new(config.tree());
    let index = builder.rebuild_index()?;
    Ok((builder.index_path(), index))
}
