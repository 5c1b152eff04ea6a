use std::fmt;
use std::fs;
use std::path::Path;

use num_traits::Float;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::Result;

/// A molecule and isotope pair, identified by HITRAN numbering
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Deserialize, Serialize)]
pub struct Isotopologue {
    pub molecule: u32,
    pub isotope: u32,
}

impl Isotopologue {
    /// H₂¹⁶O
    pub const WATER: Self = Self {
        molecule: 1,
        isotope: 1,
    };
}

impl Default for Isotopologue {
    fn default() -> Self {
        Self::WATER
    }
}

impl fmt::Display for Isotopologue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "molecule {} isotope {}", self.molecule, self.isotope)
    }
}

/// Total internal partition sum of an isotopologue
pub trait PartitionFunction<E> {
    /// Evaluate the partition sum $Q(T)$
    ///
    /// # Errors
    /// Implementations fail if they hold no data for `isotopologue`, or cannot evaluate
    /// `temperature`.
    fn partition_sum(&self, isotopologue: Isotopologue, temperature: E) -> Result<E>;
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
struct Row<E> {
    temperature: E,
    partition_sum: E,
}

/// A partition function tabulated against temperature, in the manner of the TIPS tables
///
/// Values between tabulated temperatures are linearly interpolated. There is no extrapolation.
#[derive(Clone, Debug)]
pub struct TabulatedPartitionFunction<E> {
    isotopologue: Isotopologue,
    temperature: Vec<E>,
    partition_sum: Vec<E>,
}

impl<E: Float> TabulatedPartitionFunction<E> {
    /// Build a table from `(temperature, partition_sum)` pairs in any order
    ///
    /// # Errors
    /// Returns an error if fewer than two rows are given, or any value is non-positive.
    pub fn new(isotopologue: Isotopologue, mut rows: Vec<(E, E)>) -> Result<Self> {
        if rows.len() < 2 {
            return Err(AnalysisError::InsufficientPartitionData(rows.len()).into());
        }
        if rows
            .iter()
            .any(|(t, q)| !(*t > E::zero()) || !(*q > E::zero()))
        {
            return Err(AnalysisError::invalid(
                "partition_sum",
                "tabulated temperatures and partition sums must be positive",
            )
            .into());
        }
        rows.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("NaN rejected above"));
        if rows.windows(2).any(|pair| pair[0].0 == pair[1].0) {
            return Err(AnalysisError::invalid(
                "partition_sum",
                "tabulated temperatures must be unique",
            )
            .into());
        }
        let (temperature, partition_sum) = rows.into_iter().unzip();

        Ok(Self {
            isotopologue,
            temperature,
            partition_sum,
        })
    }

    pub const fn isotopologue(&self) -> Isotopologue {
        self.isotopologue
    }

    fn interpolate(&self, temperature: E) -> Result<E> {
        let low = self.temperature[0];
        let high = self.temperature[self.temperature.len() - 1];
        if !(temperature >= low && temperature <= high) {
            return Err(AnalysisError::TemperatureOutOfRange {
                temperature: temperature.to_f64().unwrap_or(f64::NAN),
                low: low.to_f64().unwrap_or(f64::NAN),
                high: high.to_f64().unwrap_or(f64::NAN),
            }
            .into());
        }

        // Index of the first tabulated temperature strictly above the request
        let upper = self
            .temperature
            .partition_point(|&t| t <= temperature)
            .min(self.temperature.len() - 1);
        let lower = upper - 1;

        let (t0, t1) = (self.temperature[lower], self.temperature[upper]);
        let (q0, q1) = (self.partition_sum[lower], self.partition_sum[upper]);
        let fraction = (temperature - t0) / (t1 - t0);

        Ok(fraction.mul_add(q1 - q0, q0))
    }
}

impl<E: Float + DeserializeOwned> TabulatedPartitionFunction<E> {
    /// Read a partition function table from a csv file with header
    /// `temperature,partition_sum`
    ///
    /// # Errors
    /// Returns an error if the file is missing, a row cannot be parsed or the table is invalid.
    pub fn from_file(isotopologue: Isotopologue, filepath: &Path) -> Result<Self> {
        if !filepath.exists() {
            return Err(AnalysisError::MissingFile(filepath.to_path_buf()).into());
        }

        let file = fs::read(filepath)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(&file[..]);

        let mut rows = vec![];
        for result in rdr.deserialize() {
            let row: Row<E> = result?;
            rows.push((row.temperature, row.partition_sum));
        }

        Self::new(isotopologue, rows)
    }
}

impl<E: Float> PartitionFunction<E> for TabulatedPartitionFunction<E> {
    fn partition_sum(&self, isotopologue: Isotopologue, temperature: E) -> Result<E> {
        if isotopologue != self.isotopologue {
            return Err(AnalysisError::UnknownIsotopologue(isotopologue).into());
        }
        self.interpolate(temperature)
    }
}
