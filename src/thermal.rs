use num_traits::Float;

/// The second radiation constant $c_2 = hc / k_B$ in cm K
pub const SECOND_RADIATION_CONSTANT: f64 = 1.4387769;

/// Convert an `f64` constant into the working float type
///
/// # Panics
/// If `value` cannot be represented in `E`, which does not happen for the IEEE float types.
pub(crate) fn constant<E: Float>(value: f64) -> E {
    E::from(value).expect("f64 constant must fit in `E`")
}

/// The second radiation constant in the working float type
pub(crate) fn c2<E: Float>() -> E {
    constant(SECOND_RADIATION_CONSTANT)
}

/// Stimulated emission correction factor for a line at `wavenumber` (cm⁻¹)
///
/// $$
///     F(T) = \frac{1 - \exp(-c_2 \nu / T)}{1 - \exp(-c_2 \nu / T_{ref})}
/// $$
///
/// The factor is unity at the reference temperature. A line at zero wavenumber evaluates to
/// `0 / 0` and yields `NaN`, which callers are expected to detect.
pub fn correction<E: Float>(wavenumber: E, temperature: E, reference_temperature: E) -> E {
    let c2 = c2::<E>();
    (E::one() - (-c2 * wavenumber / temperature).exp())
        / (E::one() - (-c2 * wavenumber / reference_temperature).exp())
}
