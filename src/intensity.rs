use ndarray::Array1;
use num_traits::Float;

use crate::lines::{LineRecord, LineTable};
use crate::thermal::{c2, correction};

/// Partition sums and temperatures needed to move line strengths away from the reference
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThermalState<E> {
    /// Temperature of the sample in K
    pub temperature: E,
    /// Temperature at which line strengths are tabulated in K
    pub reference_temperature: E,
    /// Partition sum at `temperature`
    pub partition_sum: E,
    /// Partition sum at `reference_temperature`
    pub reference_partition_sum: E,
}

/// Intensity of a line at an arbitrary temperature
///
/// Rescales the reference strength $S_{ref}$ for the change in lower state population, the
/// partition function and stimulated emission:
///
/// $$
///     I = S_{ref} \frac{Q(T_{ref})}{Q(T)} \exp\left[-c_2 E'' \left(\frac{1}{T} -
///     \frac{1}{T_{ref}}\right)\right] F(T)
/// $$
///
/// Extreme lower state energies can overflow; this is not guarded.
pub fn intensity<E: Float>(line: &LineRecord<E>, state: &ThermalState<E>) -> E {
    let boltzmann = (-c2::<E>()
        * line.lower_state_energy
        * (state.temperature.recip() - state.reference_temperature.recip()))
    .exp();

    line.line_strength * (state.reference_partition_sum / state.partition_sum)
        * boltzmann
        * correction(
            line.wavenumber,
            state.temperature,
            state.reference_temperature,
        )
}

/// Modelled intensity of every line in `lines`, aligned with the table rows
pub fn intensities<E: Float>(lines: &LineTable<E>, state: &ThermalState<E>) -> Array1<E> {
    lines.records().map(|line| intensity(&line, state)).collect()
}
