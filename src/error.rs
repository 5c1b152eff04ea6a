use std::path::PathBuf;

use thiserror::Error;

use crate::partition::Isotopologue;

/// Failures at the boundary between the analysis and its callers
///
/// The numerical core never fails: degenerate line pairs and non-physical noise draws are
/// reported as undefined values instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("line table columns have mismatched lengths: {wavenumber} wavenumbers, {line_strength} line strengths, {lower_state_energy} lower state energies")]
    MismatchedColumns {
        wavenumber: usize,
        line_strength: usize,
        lower_state_energy: usize,
    },
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("no partition function data for {0}")]
    UnknownIsotopologue(Isotopologue),
    #[error("temperature {temperature} K is outside the tabulated partition function range [{low}, {high}] K")]
    TemperatureOutOfRange { temperature: f64, low: f64, high: f64 },
    #[error("partition function table needs at least two rows, found {0}")]
    InsufficientPartitionData(usize),
    #[error("requested file {0:?} not found")]
    MissingFile(PathBuf),
}

impl AnalysisError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
