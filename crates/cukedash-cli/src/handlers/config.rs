//! Config command handler

use crate::error::CliResult;
use cukedash::ReportConfig;

/// Execute the config command: the effective settings as YAML
pub fn execute_config(config: &ReportConfig) -> CliResult<String> {
    Ok(config.to_yaml()?)
}
