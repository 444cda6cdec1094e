//! ci-cpp
//!
//! Verifies the calibration products written by the ci_cpp pipeline run.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cpp_compare::{CompareStrategy, ComparisonReport, Tolerance};
use cpp_config::{HarnessConfig, PipelineMode};
use cpp_store::{load_document, DirectoryExpectationStore};
use cpp_verify::{
    FrameSuite, OutputCheck, VerificationHarness, VerificationReport, VerificationSuite,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Calibration product verification
#[derive(Parser, Debug)]
#[command(name = "ci-cpp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Harness configuration file (default: $CI_CPP_DIR/ci_cpp.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Check against the legacy pipeline release
    #[arg(long, global = true)]
    legacy: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare statistics products against archived expectations
    Verify {
        /// Suites to run (default: all)
        suites: Vec<String>,

        /// Report every mismatch instead of stopping at the first
        #[arg(long)]
        fail_all: bool,
    },
    /// Check that every calibration product was written
    Outputs,
    /// Check processed frame levels and noise
    Frames {
        /// Suites to run (default: all)
        suites: Vec<String>,
    },
    /// Compare two document files
    Compare {
        produced: PathBuf,
        expected: PathBuf,

        /// Absolute tolerance for numbers
        #[arg(short, long, default_value_t = Tolerance::default())]
        delta: Tolerance,

        #[arg(long)]
        fail_all: bool,
    },
    /// Archive a suite's current products as its expectations
    Archive {
        suite: String,
    },
}

fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(args: &Args) -> Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("Failed to load configuration {:?}", path))?,
        None => HarnessConfig::from_env().context("Failed to load configuration")?,
    };
    if args.legacy {
        config.mode = PipelineMode::Legacy;
    }
    Ok(config)
}

fn select_suites(names: &[String]) -> Result<Vec<VerificationSuite>> {
    if names.is_empty() {
        return Ok(VerificationSuite::catalog());
    }
    names
        .iter()
        .map(|name| match VerificationSuite::find(name) {
            Some(suite) => Ok(suite),
            None => bail!("Unknown verification suite: {}", name),
        })
        .collect()
}

fn select_frame_suites(names: &[String]) -> Result<Vec<FrameSuite>> {
    if names.is_empty() {
        return Ok(FrameSuite::catalog());
    }
    names
        .iter()
        .map(|name| match FrameSuite::find(name) {
            Some(suite) => Ok(suite),
            None => bail!("Unknown frame suite: {}", name),
        })
        .collect()
}

fn finish(report: &VerificationReport) -> ExitCode {
    report.print_summary();
    if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    match &args.command {
        Command::Verify { suites, fail_all } => {
            let mut config = load_config(&args)?;
            if *fail_all {
                config.strategy = CompareStrategy::FailAll;
            }
            info!("Verifying against {:?} ({})", config.expectation_dir(), config.mode);

            let suites = select_suites(suites)?;
            let harness = VerificationHarness::from_config(config);
            Ok(finish(&harness.run_suites(&suites)))
        }
        Command::Outputs => {
            let harness = VerificationHarness::from_config(load_config(&args)?);
            Ok(finish(&harness.check_outputs(&OutputCheck::catalog())))
        }
        Command::Frames { suites } => {
            let suites = select_frame_suites(suites)?;
            let harness = VerificationHarness::from_config(load_config(&args)?);
            Ok(finish(&harness.run_frame_suites(&suites)))
        }
        Command::Compare {
            produced,
            expected,
            delta,
            fail_all,
        } => {
            let produced_doc = load_document(produced)?;
            let expected_doc = load_document(expected)?;
            let strategy = if *fail_all {
                CompareStrategy::FailAll
            } else {
                CompareStrategy::FailFast
            };

            let label = format!("{} vs {}", produced.display(), expected.display());
            let mismatches = strategy.run(&produced_doc, &expected_doc, *delta);
            let report = ComparisonReport::new(label, mismatches);
            report.print_summary();
            Ok(if report.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Archive { suite } => {
            let config = load_config(&args)?;
            let suite = VerificationSuite::find(suite)
                .with_context(|| format!("Unknown verification suite: {}", suite))?;
            let target = DirectoryExpectationStore::new(config.expectation_dir());

            let harness = VerificationHarness::from_config(config);
            let written = harness
                .archive_suite(&suite, &target)
                .with_context(|| format!("Failed to archive {}", suite.name))?;
            for path in written {
                println!("✓ {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verify() {
        let args =
            Args::try_parse_from(["ci-cpp", "verify", "bias", "dark", "--fail-all"]).unwrap();
        match args.command {
            Command::Verify { suites, fail_all } => {
                assert_eq!(suites, vec!["bias", "dark"]);
                assert!(fail_all);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_compare_delta() {
        let args =
            Args::try_parse_from(["ci-cpp", "compare", "a.yaml", "b.yaml", "--delta", "0.5"])
                .unwrap();
        match args.command {
            Command::Compare { delta, fail_all, .. } => {
                assert_eq!(delta.value(), 0.5);
                assert!(!fail_all);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Args::try_parse_from(["ci-cpp", "compare", "a", "b", "--delta", "-1"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let args = Args::try_parse_from(["ci-cpp", "outputs", "--legacy", "-v"]).unwrap();
        assert!(args.legacy);
        assert!(args.verbose);
    }

    #[test]
    fn test_unknown_suite() {
        assert!(select_suites(&["bogus".to_string()]).is_err());
        assert_eq!(select_suites(&[]).unwrap().len(), VerificationSuite::catalog().len());
        assert_eq!(select_frame_suites(&["flat".to_string()]).unwrap()[0].name, "flat");
    }
}
