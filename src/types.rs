//! Core data types shared across the pipeline.

use ndarray::{Array2, Array3, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Result};

/// One (time, spatial unit) coordinate of a statistic map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Time-sample index.
    pub time: usize,
    /// Spatial-unit index (sensor or vertex).
    pub unit: usize,
}

impl Cell {
    /// Create a cell.
    pub const fn new(time: usize, unit: usize) -> Self {
        Self { time, unit }
    }
}

/// Sign of the statistic excursion a cluster was formed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Cells with t above the forming threshold.
    Positive,
    /// Cells with t below minus the forming threshold.
    Negative,
}

impl Polarity {
    /// +1.0 or -1.0.
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }
}

/// Per-subject contrast values indexed (subject, time, unit).
///
/// Every subject shares the same sampling grid and unit set. The optional
/// time axis (seconds) is only used to label cluster summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTensor {
    data: Array3<f64>,
    times: Option<Vec<f64>>,
}

impl ObservationTensor {
    /// Wrap an existing (subject, time, unit) array.
    pub fn new(data: Array3<f64>) -> Self {
        Self { data, times: None }
    }

    /// Stack per-subject (time, unit) arrays.
    ///
    /// # Errors
    ///
    /// `RaggedSubjects` if any subject's shape differs from the first one;
    /// `InsufficientSubjects` if `subjects` is empty.
    pub fn from_subjects(subjects: &[Array2<f64>]) -> Result<Self> {
        let first = subjects
            .first()
            .ok_or(ConfigurationError::InsufficientSubjects { n_subjects: 0 })?;
        let expected = first.dim();

        if let Some((subject, found)) = subjects
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.dim()))
            .find(|(_, dim)| *dim != expected)
        {
            return Err(ConfigurationError::RaggedSubjects {
                subject,
                expected,
                found,
            }
            .into());
        }

        let views: Vec<_> = subjects.iter().map(|s| s.view()).collect();
        let data = ndarray::stack(Axis(0), &views).map_err(|_| ConfigurationError::RaggedSubjects {
            subject: 0,
            expected,
            found: expected,
        })?;
        Ok(Self::new(data))
    }

    /// Attach a time axis in seconds, one entry per sample.
    ///
    /// # Errors
    ///
    /// `TimeAxisMismatch` if the length differs from the number of samples.
    pub fn with_times(mut self, times: Vec<f64>) -> Result<Self> {
        if times.len() != self.n_times() {
            return Err(ConfigurationError::TimeAxisMismatch {
                times: times.len(),
                samples: self.n_times(),
            }
            .into());
        }
        self.times = Some(times);
        Ok(self)
    }

    /// Number of subjects.
    pub fn n_subjects(&self) -> usize {
        self.data.dim().0
    }

    /// Number of time samples.
    pub fn n_times(&self) -> usize {
        self.data.dim().1
    }

    /// Number of spatial units.
    pub fn n_units(&self) -> usize {
        self.data.dim().2
    }

    /// (subjects, times, units).
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Borrow the raw data.
    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// Time axis, if one was attached.
    pub fn times(&self) -> Option<&[f64]> {
        self.times.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterError;

    #[test]
    fn stacks_subjects_in_order() {
        let a = Array2::from_elem((2, 3), 1.0);
        let b = Array2::from_elem((2, 3), 2.0);
        let tensor = ObservationTensor::from_subjects(&[a, b]).unwrap();
        assert_eq!(tensor.shape(), (2, 2, 3));
        assert_eq!(tensor.view()[[1, 0, 0]], 2.0);
    }

    #[test]
    fn rejects_ragged_subjects() {
        let a = Array2::zeros((2, 3));
        let b = Array2::zeros((3, 3));
        let err = ObservationTensor::from_subjects(&[a, b]).unwrap_err();
        assert!(matches!(
            err,
            ClusterError::Configuration(ConfigurationError::RaggedSubjects { subject: 1, .. })
        ));
    }

    #[test]
    fn time_axis_must_match() {
        let tensor = ObservationTensor::new(Array3::zeros((2, 4, 1)));
        assert!(tensor.clone().with_times(vec![0.0, 0.1, 0.2]).is_err());
        let tensor = tensor.with_times(vec![0.0, 0.1, 0.2, 0.3]).unwrap();
        assert_eq!(tensor.times().map(<[f64]>::len), Some(4));
    }
}
