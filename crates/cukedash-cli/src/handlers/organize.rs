//! Organize command handler

use crate::commands::OrganizeArgs;
use crate::error::CliResult;
use cukedash::{Classification, OrganizeMode, OrganizeSummary, ReportConfig, ScreenshotOrganizer};

/// Execute the organize command
pub fn execute_organize(
    config: &ReportConfig,
    args: &OrganizeArgs,
) -> CliResult<OrganizeSummary> {
    let bucket = Classification::try_new(&args.module, &args.feature)?;
    let organizer = ScreenshotOrganizer::new(config.tree());
    Ok(match OrganizeMode::from(args.mode) {
        OrganizeMode::Copy => organizer.copy_bucket(&bucket),
        OrganizeMode::Move => organizer.move_flat(&bucket),
    })
}

/// One-line description of an organize run
#[must_use]
pub fn describe(summary: &OrganizeSummary, mode: OrganizeMode) -> String {
    let verb = match mode {
        OrganizeMode::Copy => "copied",
        OrganizeMode::Move => "moved",
    };
    format!(
        "{} screenshot(s) {verb}, {} skipped",
        summary.count(),
        summary.skipped
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::OrganizeModeArg;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_move_from_flat_folder() {
        let tmp = TempDir::new().unwrap();
        let flat = tmp.path().join("screenshots");
        fs::create_dir_all(&flat).unwrap();
        fs::write(flat.join("leads_success_1.png"), b"png").unwrap();

        let args = OrganizeArgs {
            module: "sales".to_string(),
            feature: "leads".to_string(),
            mode: OrganizeModeArg::Move,
        };
        let summary =
            execute_organize(&ReportConfig::new().with_reports_root(tmp.path()), &args).unwrap();

        assert_eq!(summary.count(), 1);
        assert!(flat.join("sales/leads/leads_success_1.png").is_file());
        assert_eq!(
            describe(&summary, OrganizeMode::Move),
            "1 screenshot(s) moved, 0 skipped"
        );
    }

    #[test]
    fn test_copy_without_sources() {
        let tmp = TempDir::new().unwrap();
        let args = OrganizeArgs {
            module: "sales".to_string(),
            feature: "leads".to_string(),
            mode: OrganizeModeArg::Copy,
        };
        let summary =
            execute_organize(&ReportConfig::new().with_reports_root(tmp.path()), &args).unwrap();
        assert_eq!(
            describe(&summary, OrganizeMode::Copy),
            "0 screenshot(s) copied, 0 skipped"
        );
    }

    #[test]
    fn test_parent_dir_module_rejected() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("reports");
        let args = OrganizeArgs {
            module: "..".to_string(),
            feature: "leads".to_string(),
            mode: OrganizeModeArg::Copy,
        };
        let err = execute_organize(&ReportConfig::new().with_reports_root(&root), &args)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid bucket"));
        assert!(!tmp.path().join("leads").exists());
        assert!(!root.exists());
    }
}
