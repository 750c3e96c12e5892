//! CSV reports of simulation output.
//!
//! Reports are written to `<directory>/<file_prefix><name>.csv`. Existing
//! files are left alone unless `overwrite` is set, so a second run cannot
//! silently replace the output of the first.
//!
//! ```no_run
//! use seihrd::report::{write_trajectory_report, ReportOptions};
//! use seihrd::scenario::Scenario;
//!
//! let trajectory = Scenario::default().simulate().unwrap();
//! let mut options = ReportOptions::new();
//! options.directory("output".into()).file_prefix("belgium_".into()).overwrite(true);
//! write_trajectory_report(&options, &trajectory).unwrap();
//! ```

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::info;
use serde::Serialize;

use crate::comparison::Comparison;
use crate::error::SeihrdError;
use crate::trajectory::Trajectory;

/// Where and how reports are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportOptions {
    /// Reports go to the current directory, no prefix, no overwriting.
    #[must_use]
    pub fn new() -> Self {
        ReportOptions {
            directory: PathBuf::from("."),
            file_prefix: String::new(),
            overwrite: false,
        }
    }

    pub fn directory(&mut self, directory: PathBuf) -> &mut Self {
        self.directory = directory;
        self
    }

    pub fn file_prefix(&mut self, file_prefix: String) -> &mut Self {
        self.file_prefix = file_prefix;
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    /// Full path of the report called `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}.csv", self.file_prefix, name))
    }
}

/// Checks that the path is valid. Creates the file and all parent directories
/// if they do not exist.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, SeihrdError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            if path.exists() && !overwrite {
                return Err(SeihrdError::ReportError(format!(
                    "{} already exists; set overwrite to replace it",
                    path.display()
                )));
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(SeihrdError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

fn write_rows<T: Serialize>(
    options: &ReportOptions,
    name: &str,
    rows: impl IntoIterator<Item = T>,
) -> Result<PathBuf, SeihrdError> {
    let path = options.path_for(name);
    let file = generate_validate_filepath(&path, options.overwrite)?;
    let mut writer = Writer::from_writer(file);
    let mut count = 0_usize;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;
    info!("wrote {count} rows to {}", path.display());
    Ok(path)
}

#[derive(Serialize)]
struct TrajectoryReportItem {
    t: f64,
    susceptible: f64,
    exposed: f64,
    infected: f64,
    hospitalized: f64,
    recovered: f64,
    deceased: f64,
    new_hospitalizations: f64,
}

/// Writes `trajectory.csv`: one row per output time with every compartment
/// and the derived daily admissions.
///
/// # Errors
///
/// Returns `SeihrdError::ReportError` if the file exists and overwriting is
/// off, or an I/O or CSV error if writing fails.
pub fn write_trajectory_report(
    options: &ReportOptions,
    trajectory: &Trajectory,
) -> Result<PathBuf, SeihrdError> {
    let rates = trajectory.rates();
    write_rows(
        options,
        "trajectory",
        trajectory.iter().map(|point| TrajectoryReportItem {
            t: point.time,
            susceptible: point.state.susceptible,
            exposed: point.state.exposed,
            infected: point.state.infected,
            hospitalized: point.state.hospitalized,
            recovered: point.state.recovered,
            deceased: point.state.deceased,
            new_hospitalizations: point.new_hospitalizations(rates),
        }),
    )
}

/// Writes `comparison.csv`: observed against modeled admissions per day.
///
/// # Errors
///
/// As [`write_trajectory_report`].
pub fn write_comparison_report(
    options: &ReportOptions,
    comparison: &Comparison,
) -> Result<PathBuf, SeihrdError> {
    write_rows(options, "comparison", comparison.rows().iter().copied())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compartments::CompartmentState;
    use crate::observed::ObservedSeries;
    use crate::parameters::RateParameters;
    use crate::simulator::simulate;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn trajectory() -> Trajectory {
        let times: Vec<f64> = (0..=5).map(f64::from).collect();
        simulate(
            &CompartmentState::seeded(1000.0, 10.0, 5.0),
            &RateParameters::belgium_spring_2020(),
            &times,
        )
        .unwrap()
    }

    #[test]
    fn trajectory_report_columns_and_rows() {
        let temp_dir = tempdir().unwrap();
        let mut options = ReportOptions::new();
        options
            .directory(temp_dir.path().join("nested"))
            .file_prefix("run1_".to_string());

        let path = write_trajectory_report(&options, &trajectory()).unwrap();
        assert_eq!(path, temp_dir.path().join("nested").join("run1_trajectory.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        assert_eq!(
            headers,
            [
                "t",
                "susceptible",
                "exposed",
                "infected",
                "hospitalized",
                "recovered",
                "deceased",
                "new_hospitalizations"
            ]
        );
        let rows = reader.records().count();
        assert_eq!(rows, 6);
    }

    #[test]
    fn refuses_to_overwrite_without_permission() {
        let temp_dir = tempdir().unwrap();
        let mut options = ReportOptions::new();
        options.directory(temp_dir.path().to_path_buf());

        write_trajectory_report(&options, &trajectory()).unwrap();
        let error = write_trajectory_report(&options, &trajectory()).unwrap_err();
        assert!(matches!(error, SeihrdError::ReportError(_)));

        options.overwrite(true);
        assert!(write_trajectory_report(&options, &trajectory()).is_ok());
    }

    #[test]
    fn comparison_report() {
        let temp_dir = tempdir().unwrap();
        let mut options = ReportOptions::new();
        options.directory(temp_dir.path().to_path_buf());

        let observed = ObservedSeries::from_pairs([
            (NaiveDate::from_ymd_opt(2020, 3, 15).unwrap(), 3),
            (NaiveDate::from_ymd_opt(2020, 3, 16).unwrap(), 4),
        ]);
        let comparison = Comparison::new(&trajectory(), &observed);
        let path = write_comparison_report(&options, &comparison).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "day,date,observed,modeled_new_hospitalizations,modeled_hospitalized"
        );
        assert!(lines.next().unwrap().starts_with("0,2020-03-15,3,"));
        assert!(lines.next().unwrap().starts_with("1,2020-03-16,4,"));
    }

    #[test]
    fn only_csvs_allowed() {
        let temp_dir = tempdir().unwrap();
        let res = generate_validate_filepath(&temp_dir.path().join("sample_report.tsv"), false);
        match res {
            Err(SeihrdError::ReportError(message)) => {
                assert_eq!(message, "Report output files must be CSVs at this time");
            }
            _ => panic!("expected a report error"),
        }
    }
}
