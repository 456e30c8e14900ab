//! Viewport World Interaction Simulator entry point
//!
//! Usage: `vwi-sim <scenario.ron> [--config <config.ron>]`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use vwi_core::InteractionConfig;
use vwi_sim::{Scenario, ScenarioError, Simulation};

/// Runs a scripted interaction scenario and prints its report as RON
#[derive(Debug, Parser)]
#[command(name = "vwi-sim", version, about)]
struct Args {
    /// Scenario file
    scenario: PathBuf,

    /// Configuration file replacing the scenario's own configuration
    #[arg(long, env = "VWI_SIM_CONFIG")]
    config: Option<PathBuf>,
}

fn run(scenario_path: &Path, config_path: Option<&Path>) -> Result<String, ScenarioError> {
    let mut scenario = Scenario::load(scenario_path)?;
    if let Some(path) = config_path {
        scenario.config = InteractionConfig::load(path)?;
        tracing::info!(path = %path.display(), "using configuration override");
    }

    let report = Simulation::new(scenario)?.run()?;
    ron::ser::to_string_pretty(&report, ron::ser::PrettyConfig::default())
        .map_err(|e| ScenarioError::Invalid(format!("cannot serialize report: {e}")))
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vwi_sim=info,vwi_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&args.scenario, args.config.as_deref()) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_args_parse_scenario_and_config() {
        let args = Args::try_parse_from(["vwi-sim", "demos/throw.ron", "--config", "demos/snapping.config.ron"]).unwrap();
        assert_eq!(args.scenario, PathBuf::from("demos/throw.ron"));
        assert_eq!(args.config, Some(PathBuf::from("demos/snapping.config.ron")));

        assert!(Args::try_parse_from(["vwi-sim"]).is_err());
    }

    #[test]
    fn test_run_reports_bundled_scenario() {
        let scenario = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/axis_snap.ron");
        let report = run(&scenario, None).unwrap();
        assert!(report.contains("actors"));
    }
}
