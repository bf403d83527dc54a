//! Cukedash CLI: report aggregation for BDD suites
//!
//! ## Usage
//!
//! ```bash
//! cukedash classify --name "Create invoice"          # Which bucket?
//! cukedash render --module sales --feature leads      # Refresh one bucket
//! cukedash build                                      # Whole suite, flat screenshots
//! cukedash index                                      # Dashboard only
//! ```

use clap::Parser;
use cukedash::ReportConfig;
use cukedash_cli::{
    handlers::{self, build, organize},
    logging, Cli, CliConfig, CliResult, ColorChoice, Commands, ProgressReporter, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    logging::init_logging(&config);
    let report_config = config.report_config()?;
    let mut reporter = ProgressReporter::new(
        config.color.should_color(),
        config.verbosity.is_quiet(),
    );

    match cli.command {
        Commands::Classify(args) => {
            print!("{}", handlers::execute_classify(&report_config, &args)?);
            Ok(())
        }
        Commands::Organize(args) => {
            let summary = handlers::execute_organize(&report_config, &args)?;
            reporter.success(&organize::describe(&summary, args.mode.into()));
            Ok(())
        }
        Commands::Render(args) => run_render(&report_config, &args, &reporter),
        Commands::Index => {
            let (path, index) = handlers::execute_index(&report_config)?;
            reporter.success(&format!(
                "Dashboard {} ({} modules, {} reports)",
                path.display(),
                index.module_count(),
                index.report_count()
            ));
            Ok(())
        }
        Commands::Build => {
            let summary = handlers::execute_build(&report_config, &mut reporter)?;
            reporter.success(&build::describe(&summary));
            Ok(())
        }
        Commands::Config => {
            print!("{}", handlers::execute_config(&report_config)?);
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
        .with_config_file(cli.config.clone())
        .with_reports_root(cli.reports_root.clone())
}

fn run_render(
    config: &ReportConfig,
    args: &cukedash_cli::RenderArgs,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    let outcome = handlers::execute_render(config, args)?;
    match &outcome.report {
        Some(report) => reporter.success(&format!("Report {}", report.display())),
        None => reporter.warning(&format!(
            "No report rendered for {}/{}; see logs",
            args.module, args.feature
        )),
    }
    if outcome.screenshots > 0 {
        reporter.info(&format!("{} screenshot(s) copied", outcome.screenshots));
    }
    if let Some(index) = &outcome.index {
        reporter.info(&format!("Dashboard {}", index.display()));
    }
    Ok(())
}
