use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::thermal::constant;

/// Nanometres per centimetre; $\lambda(\mathrm{nm}) = 10^7 / \nu(\mathrm{cm}^{-1})$
const NM_PER_CM: f64 = 1e7;

/// Convert a vacuum wavelength in nm to a wavenumber in cm⁻¹
pub fn wavelength_to_wavenumber<E: Float>(wavelength: E) -> E {
    constant::<E>(NM_PER_CM) / wavelength
}

/// Convert a wavenumber in cm⁻¹ to a vacuum wavelength in nm
pub fn wavenumber_to_wavelength<E: Float>(wavenumber: E) -> E {
    constant::<E>(NM_PER_CM) / wavenumber
}

/// The unit spectral positions are expressed in at the caller boundary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectralUnit {
    /// cm⁻¹
    Wavenumber,
    /// nm
    #[default]
    Wavelength,
}

impl SpectralUnit {
    /// Express `wavenumber` in this unit
    pub fn express<E: Float>(self, wavenumber: E) -> E {
        match self {
            Self::Wavenumber => wavenumber,
            Self::Wavelength => wavenumber_to_wavelength(wavenumber),
        }
    }

    /// Convert `value`, expressed in this unit, to a wavenumber
    pub fn to_wavenumber<E: Float>(self, value: E) -> E {
        match self {
            Self::Wavenumber => value,
            Self::Wavelength => wavelength_to_wavenumber(value),
        }
    }
}

/// A closed interval of wavenumber, in cm⁻¹
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region<E> {
    pub low: E,
    pub high: E,
}

impl<E: Float> Region<E> {
    /// Build a region from two bounds given in `unit`
    ///
    /// As the wavelength to wavenumber map is decreasing, a wavelength window
    /// $[\lambda_0, \lambda_1]$ becomes $[10^7 / \lambda_1, 10^7 / \lambda_0]$. The bounds may be
    /// given in either order.
    pub fn from_bounds(first: E, second: E, unit: SpectralUnit) -> Self {
        let first = unit.to_wavenumber(first);
        let second = unit.to_wavenumber(second);
        Self {
            low: first.min(second),
            high: first.max(second),
        }
    }

    pub fn contains(&self, wavenumber: E) -> bool {
        wavenumber >= self.low && wavenumber <= self.high
    }

    /// The smallest region covering both `self` and `other`
    pub fn span(&self, other: &Self) -> Self {
        Self {
            low: self.low.min(other.low),
            high: self.high.max(other.high),
        }
    }
}
