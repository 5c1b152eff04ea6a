use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::lines::LineRecord;
use crate::thermal::{c2, correction};

/// Stopping criteria for the temperature iteration
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, bound(deserialize = "E: Float + Deserialize<'de>"))]
pub struct EstimatorSettings<E> {
    /// Successive estimates closer than this (in K) are considered converged
    pub tolerance: E,
    /// Upper bound on the number of fixed-point steps
    pub max_iterations: usize,
}

impl<E: Float> Default for EstimatorSettings<E> {
    fn default() -> Self {
        Self {
            tolerance: E::one(),
            max_iterations: 10,
        }
    }
}

/// The two lines whose intensity ratio encodes the temperature
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePair<E> {
    pub first: LineRecord<E>,
    pub second: LineRecord<E>,
}

/// A recovered temperature
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate<E> {
    /// Temperature in K
    pub temperature: E,
    /// Number of fixed-point steps taken
    pub iterations: usize,
    /// False when the iteration ran out of steps, in which case `temperature` is the last step
    pub converged: bool,
}

/// Recover the temperature from the measured intensities of a line pair
///
/// The ratio of the measured intensities, corrected for the reference strengths and the
/// stimulated emission factors $F_i(T)$, is
///
/// $$
///     R = \frac{I_1}{I_2} \frac{S_2}{S_1} \frac{F_2(T)}{F_1(T)}
///         \exp\left[-\frac{c_2 (E_1 - E_2)}{T_{ref}}\right]
///       = \exp\left[-\frac{c_2 (E_1 - E_2)}{T}\right].
/// $$
///
/// As $F_i$ depends weakly on $T$ the relation is solved by fixed-point iteration, starting at
/// `initial_guess`. Running out of iterations is not an error: the last step is returned with
/// `converged` unset.
///
/// Returns `None` when no physical temperature can be recovered: either measured intensity is
/// non-positive, the lines share a lower state energy, or the corrected ratio is not positive.
pub fn estimate_temperature<E: Float>(
    pair: &LinePair<E>,
    measured: [E; 2],
    reference_temperature: E,
    initial_guess: E,
    settings: &EstimatorSettings<E>,
) -> Option<Estimate<E>> {
    let [first_intensity, second_intensity] = measured;
    // Negated comparisons so NaN intensities are rejected too
    if !(first_intensity > E::zero())
        || !(second_intensity > E::zero())
        || pair.first.lower_state_energy == pair.second.lower_state_energy
    {
        return None;
    }

    let c2 = c2::<E>();
    let energy_difference = pair.first.lower_state_energy - pair.second.lower_state_energy;
    // Temperature independent part of the ratio
    let base_ratio = (first_intensity / second_intensity)
        * (pair.second.line_strength / pair.first.line_strength)
        * (-c2 * energy_difference / reference_temperature).exp();

    let mut temperature = initial_guess;
    for iteration in 1..=settings.max_iterations {
        let first_factor = correction(pair.first.wavenumber, temperature, reference_temperature);
        let second_factor =
            correction(pair.second.wavenumber, temperature, reference_temperature);

        let ratio = base_ratio * (second_factor / first_factor);
        if !(ratio > E::zero()) || ratio.is_infinite() {
            return None;
        }

        let updated = -c2 * energy_difference / ratio.ln();
        if !updated.is_finite() {
            return None;
        }

        if (updated - temperature).abs() < settings.tolerance {
            return Some(Estimate {
                temperature: updated,
                iterations: iteration,
                converged: true,
            });
        }
        temperature = updated;
    }

    Some(Estimate {
        temperature,
        iterations: settings.max_iterations,
        converged: false,
    })
}

#[cfg(test)]
mod tests {
    use ndarray_rand::rand::{Rng, SeedableRng};
    use proptest::prelude::*;
    use rand_isaac::Isaac64Rng;

    use super::{estimate_temperature, EstimatorSettings, LinePair};
    use crate::intensity::{intensity, ThermalState};
    use crate::lines::LineRecord;

    fn pair() -> LinePair<f64> {
        LinePair {
            first: LineRecord {
                wavenumber: 7444.35,
                line_strength: 1.1e-21,
                lower_state_energy: 1774.75,
            },
            second: LineRecord {
                wavenumber: 7185.6,
                line_strength: 3.0e-21,
                lower_state_energy: 300.36,
            },
        }
    }

    fn state(temperature: f64) -> ThermalState<f64> {
        ThermalState {
            temperature,
            reference_temperature: 296.0,
            partition_sum: 3725.6,
            reference_partition_sum: 174.58,
        }
    }

    #[test]
    fn noiseless_intensities_recover_the_temperature() {
        let seed = 40;
        let mut rng = Isaac64Rng::seed_from_u64(seed);
        let pair = pair();
        let settings = EstimatorSettings {
            tolerance: 1e-6,
            max_iterations: 50,
        };

        for _ in 0..20 {
            let temperature = rng.gen_range(500.0..2500.0);
            let state = state(temperature);
            let measured = [
                intensity(&pair.first, &state),
                intensity(&pair.second, &state),
            ];

            let estimate =
                estimate_temperature(&pair, measured, 296.0, 1000.0, &settings).unwrap();

            assert!(estimate.converged);
            approx::assert_relative_eq!(estimate.temperature, temperature, max_relative = 1e-6);
        }
    }

    #[test]
    fn warm_start_at_the_truth_converges_in_one_step() {
        let pair = pair();
        let state = state(1500.0);
        let measured = [
            intensity(&pair.first, &state),
            intensity(&pair.second, &state),
        ];

        let estimate =
            estimate_temperature(&pair, measured, 296.0, 1500.0, &EstimatorSettings::default())
                .unwrap();

        assert_eq!(estimate.iterations, 1);
        approx::assert_relative_eq!(estimate.temperature, 1500.0, max_relative = 1e-10);
    }

    #[test]
    fn identical_lines_with_distinct_energies_recover_the_reference_temperature() {
        let line = LineRecord {
            wavenumber: 7000.0_f64,
            line_strength: 1e-21,
            lower_state_energy: 500.0,
        };
        let pair = LinePair {
            first: line,
            second: LineRecord {
                lower_state_energy: 1500.0,
                ..line
            },
        };
        let settings = EstimatorSettings {
            tolerance: 1e-3,
            max_iterations: 100,
        };

        let estimate = estimate_temperature(&pair, [2.0, 2.0], 296.0, 1000.0, &settings).unwrap();

        assert!(estimate.converged);
        assert!((estimate.temperature - 296.0_f64).abs() < settings.tolerance);
    }

    #[test]
    fn exhausted_iterations_return_the_last_step() {
        let pair = pair();
        let state = state(1500.0);
        let measured = [
            intensity(&pair.first, &state),
            intensity(&pair.second, &state),
        ];
        let settings = EstimatorSettings {
            tolerance: 0.0,
            max_iterations: 3,
        };

        let estimate = estimate_temperature(&pair, measured, 296.0, 300.0, &settings).unwrap();

        assert!(!estimate.converged);
        assert_eq!(estimate.iterations, 3);
        assert!(estimate.temperature.is_finite());
    }

    #[test]
    fn zero_wavenumber_is_undefined() {
        let mut pair = pair();
        pair.first.wavenumber = 0.0;

        let estimate =
            estimate_temperature(&pair, [1.0, 1.0], 296.0, 1500.0, &EstimatorSettings::default());
        assert!(estimate.is_none());
    }

    #[test]
    fn unit_ratio_is_undefined() {
        // A corrected ratio of exactly one corresponds to an infinite temperature
        let line = LineRecord {
            wavenumber: 7000.0,
            line_strength: 1e-21,
            lower_state_energy: 0.0,
        };
        let pair = LinePair {
            first: line,
            second: LineRecord {
                lower_state_energy: 1e-300,
                ..line
            },
        };
        let estimate =
            estimate_temperature(&pair, [1.0, 1.0], 296.0, 1500.0, &EstimatorSettings::default());
        assert!(estimate.is_none());
    }

    proptest! {
        #[test]
        fn non_positive_intensities_are_undefined(
            first in -1.0f64..=0.0,
            second in 1e-25f64..1.0,
            guess in 100.0f64..3000.0,
        ) {
            let pair = pair();
            let settings = EstimatorSettings::default();
            prop_assert!(estimate_temperature(&pair, [first, second], 296.0, guess, &settings).is_none());
            prop_assert!(estimate_temperature(&pair, [second, first], 296.0, guess, &settings).is_none());
        }

        #[test]
        fn equal_lower_state_energies_are_undefined(
            energy in 0.0f64..5000.0,
            first in 1e-25f64..1.0,
            second in 1e-25f64..1.0,
            guess in 100.0f64..3000.0,
        ) {
            let mut pair = pair();
            pair.first.lower_state_energy = energy;
            pair.second.lower_state_energy = energy;
            let settings = EstimatorSettings::default();
            prop_assert!(estimate_temperature(&pair, [first, second], 296.0, guess, &settings).is_none());
        }
    }
}
