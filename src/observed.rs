//! Observed daily hospital admissions.
//!
//! The loader reads the Sciensano `COVID19BE_HOSP` layout, one row per date
//! and province:
//!
//! ```text
//! DATE,PROVINCE,REGION,NB_REPORTING,TOTAL_IN,TOTAL_IN_ICU,TOTAL_IN_RESP,TOTAL_IN_ECMO,NEW_IN,NEW_OUT
//! 2020-03-15,Antwerpen,Flanders,17,163,37,24,1,79,14
//! ```
//!
//! Only `DATE`, `REGION` and `NEW_IN` are used. Admissions are summed over
//! provinces for each date, optionally restricted to one region, and kept
//! only inside an inclusive date window. The first date in the resulting
//! series is day offset 0, which is how observations line up with the
//! integer output times of a simulated trajectory.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::SeihrdError;

/// One row of the hospitalization file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HospitalizationRecord {
    #[serde(rename = "DATE")]
    pub date: NaiveDate,
    #[serde(rename = "PROVINCE", default)]
    pub province: Option<String>,
    #[serde(rename = "REGION", default)]
    pub region: Option<String>,
    #[serde(rename = "NEW_IN", default)]
    pub new_in: Option<u64>,
}

/// An inclusive range of dates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ObservationWindow {
    /// # Errors
    ///
    /// Returns `SeihrdError::InvalidInput` if `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SeihrdError> {
        if end < start {
            return Err(SeihrdError::invalid_input(format!(
                "observation window ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    /// 2020-03-15 through 2020-06-29.
    #[must_use]
    pub fn belgium_spring_2020() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 3, 15).expect("valid date"),
            end: NaiveDate::from_ymd_opt(2020, 6, 29).expect("valid date"),
        }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the window, both ends included.
    #[must_use]
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl Default for ObservationWindow {
    fn default() -> Self {
        Self::belgium_spring_2020()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub count: u64,
}

/// Daily counts sorted by date, at most one per date.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObservedSeries {
    observations: Vec<Observation>,
}

impl ObservedSeries {
    /// Builds a series from `(date, count)` pairs. Counts on the same date are
    /// added together.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, u64)>,
    {
        let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for (date, count) in pairs {
            *by_date.entry(date).or_insert(0) += count;
        }
        Self {
            observations: by_date
                .into_iter()
                .map(|(date, count)| Observation { date, count })
                .collect(),
        }
    }

    /// Aggregates `records` by date, keeping those inside `window` and, if
    /// `region` is given, those in that region. Records without a `NEW_IN`
    /// value are skipped.
    pub fn from_records<I>(records: I, window: &ObservationWindow, region: Option<&str>) -> Self
    where
        I: IntoIterator<Item = HospitalizationRecord>,
    {
        let mut skipped = 0_usize;
        let pairs: Vec<(NaiveDate, u64)> = records
            .into_iter()
            .filter(|record| window.contains(record.date))
            .filter(|record| match region {
                Some(region) => record.region.as_deref() == Some(region),
                None => true,
            })
            .filter_map(|record| match record.new_in {
                Some(count) => Some((record.date, count)),
                None => {
                    skipped += 1;
                    None
                }
            })
            .collect();
        if skipped > 0 {
            warn!("skipped {skipped} hospitalization records without NEW_IN");
        }
        Self::from_pairs(pairs)
    }

    /// Reads and aggregates a CSV file. See [`ObservedSeries::from_records`].
    ///
    /// # Errors
    ///
    /// Returns `SeihrdError::CSVError` for unreadable or malformed rows.
    pub fn from_reader<R: Read>(
        reader: R,
        window: &ObservationWindow,
        region: Option<&str>,
    ) -> Result<Self, SeihrdError> {
        let mut reader = csv::Reader::from_reader(reader);
        let records = reader
            .deserialize::<HospitalizationRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        debug!("read {} hospitalization records", records.len());
        Ok(Self::from_records(records, window, region))
    }

    /// # Errors
    ///
    /// Returns `SeihrdError::IoError` if the file cannot be opened, otherwise
    /// as [`ObservedSeries::from_reader`].
    pub fn from_csv_path(
        path: &Path,
        window: &ObservationWindow,
        region: Option<&str>,
    ) -> Result<Self, SeihrdError> {
        info!("Loading observed hospitalizations from {}", path.display());
        let file = File::open(path)?;
        let series = Self::from_reader(file, window, region)?;
        info!(
            "{} observed days between {} and {}",
            series.len(),
            window.start,
            window.end
        );
        Ok(series)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|observation| observation.date)
    }

    /// Whole days from the first observed date to `date`; `None` for an
    /// empty series.
    #[must_use]
    pub fn day_offset(&self, date: NaiveDate) -> Option<i64> {
        self.first_date().map(|first| (date - first).num_days())
    }

    /// The observations paired with their day offsets.
    pub fn with_offsets(&self) -> impl Iterator<Item = (i64, &Observation)> {
        let first = self.first_date();
        self.observations.iter().map(move |observation| {
            let offset = first.map_or(0, |first| (observation.date - first).num_days());
            (offset, observation)
        })
    }

    /// The observation with the most admissions; the earliest wins ties.
    #[must_use]
    pub fn peak(&self) -> Option<&Observation> {
        self.observations.iter().fold(None, |best, observation| match best {
            Some(best) if best.count >= observation.count => Some(best),
            _ => Some(observation),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
DATE,PROVINCE,REGION,NB_REPORTING,TOTAL_IN,TOTAL_IN_ICU,TOTAL_IN_RESP,TOTAL_IN_ECMO,NEW_IN,NEW_OUT
2020-03-14,Antwerpen,Flanders,17,100,20,10,1,40,3
2020-03-15,Antwerpen,Flanders,17,163,37,24,1,79,14
2020-03-15,Liège,Wallonia,12,120,30,20,0,61,9
2020-03-16,Antwerpen,Flanders,17,200,40,30,1,50,10
2020-03-16,Liège,Wallonia,12,150,35,22,0,,11
2020-03-17,Brussels,Brussels,15,210,44,31,2,90,20
2020-06-30,Antwerpen,Flanders,17,20,5,2,0,1,3
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_window_spans_107_days() {
        let window = ObservationWindow::default();
        assert_eq!(window.len_days(), 107);
        assert!(window.contains(date(2020, 3, 15)));
        assert!(window.contains(date(2020, 6, 29)));
        assert!(!window.contains(date(2020, 6, 30)));
    }

    #[test]
    fn window_must_be_ordered() {
        assert!(ObservationWindow::new(date(2020, 6, 1), date(2020, 5, 1))
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn aggregates_provinces_within_window() {
        let series =
            ObservedSeries::from_reader(SAMPLE.as_bytes(), &ObservationWindow::default(), None)
                .unwrap();
        let counts: Vec<(NaiveDate, u64)> = series
            .iter()
            .map(|observation| (observation.date, observation.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                (date(2020, 3, 15), 140),
                (date(2020, 3, 16), 50),
                (date(2020, 3, 17), 90),
            ]
        );
        assert_eq!(series.peak().unwrap().date, date(2020, 3, 15));
    }

    #[test]
    fn region_filter() {
        let series = ObservedSeries::from_reader(
            SAMPLE.as_bytes(),
            &ObservationWindow::default(),
            Some("Wallonia"),
        )
        .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.observations()[0].count, 61);
    }

    #[test]
    fn day_offsets_count_from_first_observation() {
        let series = ObservedSeries::from_pairs([
            (date(2020, 3, 20), 5),
            (date(2020, 3, 15), 1),
            (date(2020, 3, 15), 2),
        ]);
        assert_eq!(series.first_date(), Some(date(2020, 3, 15)));
        assert_eq!(series.day_offset(date(2020, 3, 20)), Some(5));
        let offsets: Vec<(i64, u64)> = series
            .with_offsets()
            .map(|(offset, observation)| (offset, observation.count))
            .collect();
        assert_eq!(offsets, vec![(0, 3), (5, 5)]);
        assert_eq!(ObservedSeries::default().day_offset(date(2020, 3, 20)), None);
    }

    #[test]
    fn malformed_date_is_csv_error() {
        let data = "DATE,NEW_IN\n15/03/2020,4\n";
        let error =
            ObservedSeries::from_reader(data.as_bytes(), &ObservationWindow::default(), None)
                .unwrap_err();
        assert!(matches!(error, SeihrdError::CSVError(_)));
    }
}
