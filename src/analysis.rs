use log::info;
use ndarray::Array1;
use ndarray_rand::rand_distr::{Distribution, StandardNormal};
use num_traits::Float;

use crate::error::AnalysisError;
use crate::estimator::EstimatorSettings;
use crate::intensity::ThermalState;
use crate::lines::LineSource;
use crate::partition::{Isotopologue, PartitionFunction};
use crate::region::{Region, SpectralUnit};
use crate::sweep::{build_matrix, Deviation, SweepParameters, UncertaintyMatrix};
use crate::Result;

/// A complete request for a line pair uncertainty analysis
///
/// Region bounds are given in `unit`, and the selected line positions are reported back in the
/// same unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisRequest<E> {
    pub isotopologue: Isotopologue,
    /// Simulated temperature in K
    pub temperature: E,
    /// Temperature at which the line strengths are tabulated, in K
    pub reference_temperature: E,
    pub unit: SpectralUnit,
    pub region_1: [E; 2],
    pub region_2: [E; 2],
    pub line_count: usize,
    pub trial_count: usize,
    pub relative_noise: E,
    pub seed: u64,
    pub deviation: Deviation,
    pub estimator: EstimatorSettings<E>,
}

/// Result of an analysis, with line positions in the requested unit
#[derive(Clone, Debug)]
pub struct AnalysisOutcome<E> {
    pub matrix: UncertaintyMatrix<E>,
    pub unit: SpectralUnit,
    /// Positions of the lines labelling the matrix rows
    pub row_positions: Array1<E>,
    /// Positions of the lines labelling the matrix columns
    pub column_positions: Array1<E>,
}

impl<E: Float> AnalysisRequest<E> {
    /// Check the request describes a physical analysis
    ///
    /// # Errors
    /// Returns an error naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if !(self.temperature > E::zero()) {
            return Err(AnalysisError::invalid("temperature", "must be positive").into());
        }
        if !(self.reference_temperature > E::zero()) {
            return Err(
                AnalysisError::invalid("reference_temperature", "must be positive").into(),
            );
        }
        for (name, bounds) in [("region_1", self.region_1), ("region_2", self.region_2)] {
            if bounds.iter().any(|bound| !bound.is_finite() || *bound <= E::zero()) {
                return Err(
                    AnalysisError::invalid(name, "bounds must be positive and finite").into(),
                );
            }
        }
        if self.line_count == 0 {
            return Err(
                AnalysisError::invalid("line_count", "at least one line is needed").into(),
            );
        }
        if self.trial_count == 0 {
            return Err(
                AnalysisError::invalid("trial_count", "at least one trial is needed").into(),
            );
        }
        if !(self.relative_noise >= E::zero()) {
            return Err(AnalysisError::invalid("relative_noise", "must not be negative").into());
        }
        if !(self.estimator.tolerance > E::zero()) || self.estimator.max_iterations == 0 {
            return Err(AnalysisError::invalid(
                "estimator",
                "tolerance and iteration limit must be positive",
            )
            .into());
        }
        Ok(())
    }

    /// The two regions in wavenumber
    pub fn regions(&self) -> (Region<E>, Region<E>) {
        (
            Region::from_bounds(self.region_1[0], self.region_1[1], self.unit),
            Region::from_bounds(self.region_2[0], self.region_2[1], self.unit),
        )
    }

    fn sweep_parameters(&self) -> SweepParameters<E> {
        SweepParameters {
            line_count: self.line_count,
            trial_count: self.trial_count,
            relative_noise: self.relative_noise,
            seed: self.seed,
            deviation: self.deviation,
            estimator: self.estimator,
        }
    }
}

/// Run a line pair uncertainty analysis
///
/// Lines covering both regions are fetched from `lines`, and the partition sums at the simulated
/// and reference temperatures from `partition_function`.
///
/// # Errors
/// Returns an error if the request is invalid, or either collaborator fails.
pub fn analyse<E, L, P>(
    request: &AnalysisRequest<E>,
    lines: &L,
    partition_function: &P,
) -> Result<AnalysisOutcome<E>>
where
    E: Float + Send + Sync,
    L: LineSource<E>,
    P: PartitionFunction<E>,
    StandardNormal: Distribution<E>,
{
    request.validate()?;

    let (region_1, region_2) = request.regions();
    let span = region_1.span(&region_2);
    let table = lines.fetch(request.isotopologue, span.low, span.high)?;
    info!(
        "fetched {} lines for {} between {} and {} cm-1",
        table.len(),
        request.isotopologue,
        span.low.to_f64().unwrap_or(f64::NAN),
        span.high.to_f64().unwrap_or(f64::NAN)
    );

    let state = ThermalState {
        temperature: request.temperature,
        reference_temperature: request.reference_temperature,
        partition_sum: partition_function
            .partition_sum(request.isotopologue, request.temperature)?,
        reference_partition_sum: partition_function
            .partition_sum(request.isotopologue, request.reference_temperature)?,
    };

    let matrix = build_matrix(
        &table,
        &state,
        &region_1,
        &region_2,
        &request.sweep_parameters(),
    );
    let (row_positions, column_positions) = matrix.positions_in(request.unit);
    info!("built {:?} uncertainty matrix", matrix.dim());

    Ok(AnalysisOutcome {
        matrix,
        unit: request.unit,
        row_positions,
        column_positions,
    })
}
