//! Sorted event tables (`firings.mda`).

use std::collections::BTreeSet;
use std::path::Path;

use crate::constants::firings::{LABEL_ROW, MIN_ROWS, TIME_ROW};
use crate::error::{Error, Result};
use crate::mda::{read_mda, write_mda_f64};

/// Event times and unit labels from a sorting result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firings {
    times: Vec<i64>,
    labels: Vec<i64>,
}

impl Firings {
    /// Build a table from parallel time and label vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors differ in length.
    pub fn new(times: Vec<i64>, labels: Vec<i64>) -> Result<Self> {
        if times.len() != labels.len() {
            return Err(Error::InvalidFirings {
                path: Path::new("<memory>").to_path_buf(),
                message: format!("{} times but {} labels", times.len(), labels.len()),
            });
        }
        Ok(Self { times, labels })
    }

    /// Load an `R x L` firings array (row 1 times, row 2 labels).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has fewer than three
    /// rows, or holds non-integer times or labels.
    pub fn load(path: &Path) -> Result<Self> {
        let invalid = |message: String| Error::InvalidFirings {
            path: path.to_path_buf(),
            message,
        };

        let array = read_mda(path)?;
        let (rows, events) = array
            .shape_2d()
            .ok_or_else(|| invalid(format!("expected a 2-D array, got dims {:?}", array.dims())))?;
        if rows < MIN_ROWS {
            return Err(invalid(format!(
                "expected at least {MIN_ROWS} rows, got {rows}"
            )));
        }

        let row = |r: usize, name: &str| -> Result<Vec<i64>> {
            (0..events)
                .map(|event| {
                    let value = array.get_2d(r, event).unwrap_or(f64::NAN);
                    as_integer(value)
                        .ok_or_else(|| invalid(format!("{name} {value} at event {event} is not an integer")))
                })
                .collect()
        };
        let times = row(TIME_ROW, "time")?;
        let labels = row(LABEL_ROW, "label")?;

        Ok(Self { times, labels })
    }

    /// Write a firings array with a zero channel row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[allow(clippy::cast_precision_loss)]
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut data = Vec::with_capacity(MIN_ROWS * self.times.len());
        for (&time, &label) in self.times.iter().zip(&self.labels) {
            data.extend_from_slice(&[0.0, time as f64, label as f64]);
        }
        write_mda_f64(path, &[MIN_ROWS, self.times.len()], &data)
    }

    /// Number of events.
    #[must_use]
    pub fn num_events(&self) -> usize {
        self.times.len()
    }

    /// Event times in frames.
    #[must_use]
    pub fn times(&self) -> &[i64] {
        &self.times
    }

    /// 1-based unit label of each event.
    #[must_use]
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Highest unit label (labels are 1-based), or 0 for an empty table.
    #[must_use]
    pub fn num_units(&self) -> usize {
        self.labels
            .iter()
            .copied()
            .max()
            .and_then(|max| usize::try_from(max).ok())
            .unwrap_or(0)
    }

    /// Distinct unit labels in ascending order.
    #[must_use]
    pub fn unit_ids(&self) -> Vec<i64> {
        self.labels
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Times of `unit` within `[start, end)`, in file order.
    ///
    /// A missing bound leaves that side of the window open.
    #[must_use]
    pub fn unit_spike_train(&self, unit: i64, start: Option<i64>, end: Option<i64>) -> Vec<i64> {
        let start = start.unwrap_or(i64::MIN);
        let end = end.unwrap_or(i64::MAX);
        self.times
            .iter()
            .zip(&self.labels)
            .filter(|&(&time, &label)| label == unit && start <= time && time < end)
            .map(|(&time, _)| time)
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}
