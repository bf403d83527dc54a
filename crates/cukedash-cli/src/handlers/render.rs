//! Render command handler

use crate::commands::RenderArgs;
use crate::error::CliResult;
use cukedash::{BucketRefresh, Classification, ReportConfig, ReportPipeline};

/// Execute the render command: refresh one bucket the way the scenario hook does
pub fn execute_render(config: &ReportConfig, args: &RenderArgs) -> CliResult<BucketRefresh> {
    let bucket = Classification::try_new(&args.module, &args.feature)?;
    Ok(ReportPipeline::new(config).refresh_bucket(&bucket))
}
