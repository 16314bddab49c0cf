//! Input consistency checks.
//!
//! All of these are fatal: the test cannot run on inputs that fail them.

use crate::adjacency::Adjacency;
use crate::error::ConfigurationError;
use crate::types::ObservationTensor;

/// Check the tensor against itself and against the adjacency.
///
/// Checks, in order: at least two subjects, non-empty time and unit axes,
/// unit axis matching the adjacency, and finite observations. The first
/// failing check is reported.
pub fn shape_check(tensor: &ObservationTensor, adjacency: &Adjacency) -> Result<(), ConfigurationError> {
    let shape = tensor.shape();
    let (n_subjects, n_times, n_units) = shape;

    if n_subjects < 2 {
        return Err(ConfigurationError::InsufficientSubjects { n_subjects });
    }
    if n_times == 0 || n_units == 0 {
        return Err(ConfigurationError::EmptyAxis { shape });
    }
    if n_units != adjacency.len() {
        return Err(ConfigurationError::SpatialMismatch {
            data_units: n_units,
            adjacency_units: adjacency.len(),
        });
    }
    if let Some(times) = tensor.times() {
        if times.len() != n_times {
            return Err(ConfigurationError::TimeAxisMismatch {
                times: times.len(),
                samples: n_times,
            });
        }
    }
    if let Some(((subject, time, unit), _)) = tensor.view().indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ConfigurationError::NonFiniteObservation { subject, time, unit });
    }
    Ok(())
}
