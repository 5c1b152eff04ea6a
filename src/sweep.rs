use itertools::Itertools;
use log::{debug, info, trace};
use ndarray::{Array1, Array2};
use ndarray_rand::rand::{Rng, SeedableRng};
use ndarray_rand::rand_distr::{Distribution, StandardNormal};
use num_traits::Float;
use rand_isaac::Isaac64Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::estimator::{estimate_temperature, EstimatorSettings, LinePair};
use crate::intensity::{intensities, ThermalState};
use crate::lines::LineTable;
use crate::region::{Region, SpectralUnit};
use crate::selection::select_strongest;

/// How the spread of the trial temperatures in a cell is measured
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    /// Root-mean-square deviation from the simulated temperature
    #[default]
    FromTruth,
    /// Sample standard deviation about the mean of the trials
    FromSampleMean,
}

/// Everything controlling a sweep, apart from the line data and regions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepParameters<E> {
    /// Number of most intense lines kept in each region
    pub line_count: usize,
    /// Number of noisy realisations per line pair
    pub trial_count: usize,
    /// Noise standard deviation as a fraction of the most intense line
    pub relative_noise: E,
    /// Seed for the random number generator
    pub seed: u64,
    pub deviation: Deviation,
    pub estimator: EstimatorSettings<E>,
}

/// The temperature uncertainty of every line pair drawn from two regions
#[derive(Clone, Debug)]
pub struct UncertaintyMatrix<E> {
    /// Spread of the recovered temperatures in K, `NaN` where fewer than two trials were defined
    sigma: Array2<E>,
    /// Number of trials in each cell which produced a temperature
    valid_trials: Array2<usize>,
    /// Number of trials in each cell which ran out of iterations before converging
    unconverged_trials: Array2<usize>,
    /// Wavenumbers of the lines labelling the rows, ascending
    region_1_positions: Array1<E>,
    /// Wavenumbers of the lines labelling the columns, ascending
    region_2_positions: Array1<E>,
    /// Absolute standard deviation of the intensity noise
    noise_scale: E,
}

impl<E: Float> UncertaintyMatrix<E> {
    pub const fn sigma(&self) -> &Array2<E> {
        &self.sigma
    }

    pub const fn valid_trials(&self) -> &Array2<usize> {
        &self.valid_trials
    }

    pub const fn unconverged_trials(&self) -> &Array2<usize> {
        &self.unconverged_trials
    }

    pub const fn region_1_positions(&self) -> &Array1<E> {
        &self.region_1_positions
    }

    pub const fn region_2_positions(&self) -> &Array1<E> {
        &self.region_2_positions
    }

    pub const fn noise_scale(&self) -> E {
        self.noise_scale
    }

    /// Number of rows and columns
    pub fn dim(&self) -> (usize, usize) {
        self.sigma.dim()
    }

    /// Row and column labels expressed in `unit`
    ///
    /// Wavelength labels are returned in the same order as the wavenumbers, so they descend.
    pub fn positions_in(&self, unit: SpectralUnit) -> (Array1<E>, Array1<E>) {
        (
            self.region_1_positions.mapv(|nu| unit.express(nu)),
            self.region_2_positions.mapv(|nu| unit.express(nu)),
        )
    }

    /// The defined cell with the smallest spread, as `(row, column, sigma)`
    pub fn most_robust_pair(&self) -> Option<(usize, usize, E)> {
        self.sigma
            .indexed_iter()
            .filter(|(_, sigma)| !sigma.is_nan())
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|((ii, jj), &sigma)| (ii, jj, sigma))
    }

    /// The defined cell with the largest spread, as `(row, column, sigma)`
    pub fn least_robust_pair(&self) -> Option<(usize, usize, E)> {
        self.sigma
            .indexed_iter()
            .filter(|(_, sigma)| !sigma.is_nan())
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|((ii, jj), &sigma)| (ii, jj, sigma))
    }
}

/// Absolute intensity noise for the sweep
///
/// The scale is `relative_noise` times the largest modelled intensity of any line in `span`,
/// whether or not that line is later selected. Returns zero when `span` holds no lines.
pub fn noise_scale<E: Float>(
    lines: &LineTable<E>,
    modelled: &Array1<E>,
    span: &Region<E>,
    relative_noise: E,
) -> E {
    let strongest = lines
        .wavenumber()
        .iter()
        .zip(modelled)
        .filter(|(nu, intensity)| span.contains(**nu) && !intensity.is_nan())
        .map(|(_, &intensity)| intensity)
        .fold(None, |max: Option<E>, intensity| {
            Some(max.map_or(intensity, |max| max.max(intensity)))
        });

    strongest.map_or_else(E::zero, |strongest| relative_noise * strongest)
}

/// Spread of the defined trial temperatures, `NaN` if fewer than two are available
pub fn spread<E: Float>(estimates: &[E], temperature: E, deviation: Deviation) -> E {
    if estimates.len() < 2 {
        return E::nan();
    }
    let count = E::from(estimates.len()).expect("trial count must fit in `E`");

    match deviation {
        Deviation::FromTruth => {
            let sum_of_squares = estimates
                .iter()
                .fold(E::zero(), |acc, &t| acc + (t - temperature).powi(2));
            (sum_of_squares / count).sqrt()
        }
        Deviation::FromSampleMean => {
            let mean = estimates.iter().fold(E::zero(), |acc, &t| acc + t) / count;
            let sum_of_squares = estimates
                .iter()
                .fold(E::zero(), |acc, &t| acc + (t - mean).powi(2));
            (sum_of_squares / (count - E::one())).sqrt()
        }
    }
}

struct PairStatistics<E> {
    sigma: E,
    valid: usize,
    unconverged: usize,
}

/// Run the noisy trials for a single line pair
///
/// Every trial starts the temperature iteration from the simulated temperature, so the trials are
/// independent of one another.
fn evaluate_pair<E, R>(
    pair: &LinePair<E>,
    modelled: [E; 2],
    noise: E,
    state: &ThermalState<E>,
    parameters: &SweepParameters<E>,
    rng: &mut R,
) -> PairStatistics<E>
where
    E: Float,
    R: Rng,
    StandardNormal: Distribution<E>,
{
    let mut estimates = Vec::with_capacity(parameters.trial_count);
    let mut unconverged = 0;

    for _ in 0..parameters.trial_count {
        let first: E = StandardNormal.sample(rng);
        let second: E = StandardNormal.sample(rng);
        let perturbed = [modelled[0] + noise * first, modelled[1] + noise * second];

        if let Some(estimate) = estimate_temperature(
            pair,
            perturbed,
            state.reference_temperature,
            state.temperature,
            &parameters.estimator,
        ) {
            if !estimate.converged {
                unconverged += 1;
            }
            estimates.push(estimate.temperature);
        }
    }

    PairStatistics {
        sigma: spread(&estimates, state.temperature, parameters.deviation),
        valid: estimates.len(),
        unconverged,
    }
}

/// Build the temperature uncertainty matrix for line pairs drawn from two regions
///
/// The modelled intensity of every line in `lines` is computed at `state`. The
/// `parameters.line_count` most intense lines of each region are kept and every pair formed from
/// one line of each region is perturbed `parameters.trial_count` times with Gaussian noise. The
/// temperature recovered from each perturbed pair feeds the cell's spread.
///
/// Pairs are evaluated in parallel. Each pair draws from its own generator, seeded in turn from a
/// generator seeded with `parameters.seed`, so the result does not depend on scheduling.
pub fn build_matrix<E>(
    lines: &LineTable<E>,
    state: &ThermalState<E>,
    region_1: &Region<E>,
    region_2: &Region<E>,
    parameters: &SweepParameters<E>,
) -> UncertaintyMatrix<E>
where
    E: Float + Send + Sync,
    StandardNormal: Distribution<E>,
{
    let modelled = intensities(lines, state);
    let noise = noise_scale(
        lines,
        &modelled,
        &region_1.span(region_2),
        parameters.relative_noise,
    );

    let rows = select_strongest(lines, &modelled, region_1, parameters.line_count);
    let columns = select_strongest(lines, &modelled, region_2, parameters.line_count);
    debug!(
        "selected {} lines in region 1 and {} in region 2, noise scale {}",
        rows.len(),
        columns.len(),
        noise.to_f64().unwrap_or(f64::NAN)
    );

    let mut master = Isaac64Rng::seed_from_u64(parameters.seed);
    let pairs = rows
        .iter()
        .copied()
        .enumerate()
        .cartesian_product(columns.iter().copied().enumerate())
        .map(|(row, column)| (row, column, master.gen::<u64>()))
        .collect::<Vec<_>>();

    info!(
        "running {} trials on each of {} line pairs",
        parameters.trial_count,
        pairs.len()
    );

    let cells = pairs
        .into_par_iter()
        .map(|((ii, row), (jj, column), seed)| {
            let mut rng = Isaac64Rng::seed_from_u64(seed);
            let pair = LinePair {
                first: lines.record(row),
                second: lines.record(column),
            };
            let statistics = evaluate_pair(
                &pair,
                [modelled[row], modelled[column]],
                noise,
                state,
                parameters,
                &mut rng,
            );
            trace!(
                "pair ({ii}, {jj}): {} of {} trials defined",
                statistics.valid,
                parameters.trial_count
            );
            ((ii, jj), statistics)
        })
        .collect::<Vec<_>>();

    let shape = (rows.len(), columns.len());
    let mut sigma = Array2::from_elem(shape, E::nan());
    let mut valid_trials = Array2::zeros(shape);
    let mut unconverged_trials = Array2::zeros(shape);
    for (index, statistics) in cells {
        sigma[index] = statistics.sigma;
        valid_trials[index] = statistics.valid;
        unconverged_trials[index] = statistics.unconverged;
    }

    let undefined = sigma.iter().filter(|s| s.is_nan()).count();
    if undefined > 0 {
        debug!("{undefined} of {} cells are undefined", sigma.len());
    }

    UncertaintyMatrix {
        sigma,
        valid_trials,
        unconverged_trials,
        region_1_positions: rows.iter().map(|&ii| lines.wavenumber()[ii]).collect(),
        region_2_positions: columns.iter().map(|&jj| lines.wavenumber()[jj]).collect(),
        noise_scale: noise,
    }
}
