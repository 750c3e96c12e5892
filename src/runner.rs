use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, ValueEnum};
use log::{info, LevelFilter};

use crate::comparison::{Comparison, FitSummary};
use crate::error::SeihrdError;
use crate::log::{set_log_level, LogSpec};
use crate::observed::{ObservationWindow, ObservedSeries};
use crate::ode::{DormandPrince, Rk4, SolverConfig};
use crate::report::{write_comparison_report, write_trajectory_report, ReportOptions};
use crate::scenario::Scenario;
use crate::trajectory::Trajectory;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SolverChoice {
    /// Adaptive Dormand-Prince 5(4) with default tolerances
    DormandPrince,
    /// Fixed-step fourth order Runge-Kutta with the default step
    Rk4,
}

impl From<SolverChoice> for SolverConfig {
    fn from(choice: SolverChoice) -> Self {
        match choice {
            SolverChoice::DormandPrince => DormandPrince::default().into(),
            SolverChoice::Rk4 => Rk4::default().into(),
        }
    }
}

/// Default cli arguments for the seihrd runner
#[derive(Args, Debug, Clone, Default)]
pub struct BaseArgs {
    /// Optional path to a scenario JSON file; the Belgium spring 2020 scenario otherwise
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional path to a hospitalization CSV (DATE, REGION, NEW_IN columns) to compare against
    #[arg(long)]
    pub observed: Option<PathBuf>,

    /// Only use observed rows from this region
    #[arg(long)]
    pub region: Option<String>,

    /// First observed date to use
    #[arg(long, default_value = "2020-03-15")]
    pub window_start: Option<NaiveDate>,

    /// Last observed date to use
    #[arg(long, default_value = "2020-06-29")]
    pub window_end: Option<NaiveDate>,

    /// Optional path for report output; no reports are written without it
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Prefix for report file names
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Overwrite existing report files
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Override the solver chosen in the scenario
    #[arg(long, value_enum)]
    pub solver: Option<SolverChoice>,

    /// Enable logging: a level (`info`) or `module=level` filters separated by commas
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Parser, Debug)]
#[command(name = "seihrd")]
#[command(about = "Simulate the SEIHRD model and compare it with observed hospital admissions")]
struct Cli {
    #[command(flatten)]
    args: BaseArgs,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub scenario: Scenario,
    pub trajectory: Trajectory,
    pub comparison: Option<Comparison>,
    pub reports: Vec<PathBuf>,
}

impl RunOutcome {
    #[must_use]
    pub fn fit(&self) -> Option<FitSummary> {
        self.comparison.as_ref().and_then(Comparison::summary)
    }
}

fn setup_logging(args: &BaseArgs) -> Result<(), SeihrdError> {
    let verbosity = match args.verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = verbosity {
        set_log_level(level);
    }
    if let Some(spec) = &args.log_level {
        spec.parse::<LogSpec>()?.apply();
    }
    Ok(())
}

/// Runs the simulation described by the command line of the current process.
///
/// # Errors
///
/// Returns an error if argument parsing or the run fails
pub fn run_with_args() -> Result<RunOutcome, SeihrdError> {
    let cli = Cli::parse();
    run_with_base_args(cli.args)
}

/// Loads the scenario, simulates it, compares against observed data if given
/// and writes reports if an output directory is given.
///
/// # Errors
///
/// Returns the first error from any of those steps.
pub fn run_with_base_args(args: BaseArgs) -> Result<RunOutcome, SeihrdError> {
    setup_logging(&args)?;

    let mut scenario = match &args.config {
        Some(path) => Scenario::from_json_file(path)?,
        None => {
            info!("Using the built-in Belgium spring 2020 scenario");
            Scenario::belgium_spring_2020()
        }
    };
    if let Some(choice) = args.solver {
        scenario = scenario.with_solver(choice.into());
    }

    let trajectory = scenario.simulate()?;

    let comparison = match &args.observed {
        Some(path) => {
            let defaults = ObservationWindow::default();
            let window = ObservationWindow::new(
                args.window_start.unwrap_or(defaults.start),
                args.window_end.unwrap_or(defaults.end),
            )?;
            let observed = ObservedSeries::from_csv_path(path, &window, args.region.as_deref())?;
            Some(Comparison::new(&trajectory, &observed))
        }
        None => None,
    };

    let mut reports = Vec::new();
    if let Some(output_dir) = &args.output_dir {
        let mut options = ReportOptions::new();
        options
            .directory(output_dir.clone())
            .file_prefix(args.prefix.clone())
            .overwrite(args.force_overwrite);
        reports.push(write_trajectory_report(&options, &trajectory)?);
        if let Some(comparison) = &comparison {
            reports.push(write_comparison_report(&options, comparison)?);
        }
    }

    Ok(RunOutcome {
        scenario,
        trajectory,
        comparison,
        reports,
    })
}
