use std::fs;
use std::path::Path;

use log::info;
use ndarray_rand::rand_distr::{Distribution, StandardNormal};
use num_traits::Float;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::analysis::{analyse, AnalysisOutcome, AnalysisRequest};
use crate::error::AnalysisError;
use crate::estimator::EstimatorSettings;
use crate::lines::{LineCatalogue, LineTable};
use crate::partition::{Isotopologue, TabulatedPartitionFunction};
use crate::region::SpectralUnit;
use crate::sweep::Deviation;
use crate::Result;

/// Name of the analysis configuration inside a working directory
pub const CONFIG_FILE: &str = "analysis.toml";
/// Name of the line list inside a working directory
pub const LINES_FILE: &str = "lines.csv";
/// Name of the partition function table inside a working directory
pub const PARTITION_FILE: &str = "partition.csv";

/// On-disk description of an analysis
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(bound(deserialize = "E: Float + Deserialize<'de>"))]
pub struct AnalysisConfig<E> {
    pub temperature: E,
    #[serde(default = "default_reference_temperature")]
    pub reference_temperature: E,
    #[serde(default)]
    pub unit: SpectralUnit,
    pub region_1: [E; 2],
    pub region_2: [E; 2],
    pub line_count: usize,
    pub trial_count: usize,
    pub relative_noise: E,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub deviation: Deviation,
    #[serde(default)]
    pub isotopologue: Isotopologue,
    #[serde(default)]
    pub estimator: EstimatorSettings<E>,
}

// HITRAN line strengths are tabulated at 296 K
fn default_reference_temperature<E: Float>() -> E {
    crate::thermal::constant(296.0)
}

const fn default_seed() -> u64 {
    40
}

impl<E: Float + DeserializeOwned> AnalysisConfig<E> {
    /// Read a configuration from a toml file
    ///
    /// # Errors
    /// Returns an error if the file is missing or malformed.
    pub fn from_file(filepath: &Path) -> Result<Self> {
        if !filepath.exists() {
            return Err(AnalysisError::MissingFile(filepath.to_path_buf()).into());
        }
        let contents = fs::read_to_string(filepath)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

impl<E> From<AnalysisConfig<E>> for AnalysisRequest<E> {
    fn from(config: AnalysisConfig<E>) -> Self {
        Self {
            isotopologue: config.isotopologue,
            temperature: config.temperature,
            reference_temperature: config.reference_temperature,
            unit: config.unit,
            region_1: config.region_1,
            region_2: config.region_2,
            line_count: config.line_count,
            trial_count: config.trial_count,
            relative_noise: config.relative_noise,
            seed: config.seed,
            deviation: config.deviation,
            estimator: config.estimator,
        }
    }
}

/// Run the analysis described by a working directory
///
/// The directory holds the configuration in `analysis.toml`, the line list in `lines.csv` and the
/// partition function of the configured isotopologue in `partition.csv`.
///
/// # Errors
/// Returns an error if any file is missing or malformed, or the analysis itself fails.
pub fn run<E>(working_directory: &Path) -> Result<AnalysisOutcome<E>>
where
    E: Float + DeserializeOwned + Send + Sync,
    StandardNormal: Distribution<E>,
{
    let config: AnalysisConfig<E> =
        AnalysisConfig::from_file(&working_directory.join(CONFIG_FILE))?;
    info!("read analysis configuration for {}", config.isotopologue);

    let catalogue = LineCatalogue {
        isotopologue: config.isotopologue,
        lines: LineTable::from_file(&working_directory.join(LINES_FILE))?,
    };
    info!("read {} lines", catalogue.lines.len());

    let partition_function = TabulatedPartitionFunction::from_file(
        config.isotopologue,
        &working_directory.join(PARTITION_FILE),
    )?;

    let request = AnalysisRequest::from(config);
    analyse(&request, &catalogue, &partition_function)
}

#[cfg(test)]
mod tests {
    use super::AnalysisConfig;
    use crate::analysis::AnalysisRequest;
    use crate::estimator::EstimatorSettings;
    use crate::partition::Isotopologue;
    use crate::region::SpectralUnit;
    use crate::sweep::Deviation;

    #[test]
    fn minimal_config_takes_defaults() {
        let config: AnalysisConfig<f64> = toml::from_str(
            r#"
            temperature = 1500.0
            region_1 = [1342.937, 1345.779]
            region_2 = [1390.13, 1393.17]
            line_count = 10
            trial_count = 100
            relative_noise = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.reference_temperature, 296.0);
        assert_eq!(config.unit, SpectralUnit::Wavelength);
        assert_eq!(config.seed, 40);
        assert_eq!(config.deviation, Deviation::FromTruth);
        assert_eq!(config.isotopologue, Isotopologue::WATER);
        assert_eq!(config.estimator, EstimatorSettings::default());
    }

    #[test]
    fn full_config_is_read() {
        let config: AnalysisConfig<f64> = toml::from_str(
            r#"
            temperature = 1200.0
            reference_temperature = 298.0
            unit = "wavenumber"
            region_1 = [7440.0, 7450.0]
            region_2 = [7180.0, 7190.0]
            line_count = 5
            trial_count = 50
            relative_noise = 0.02
            seed = 7
            deviation = "from_sample_mean"

            [isotopologue]
            molecule = 2
            isotope = 1

            [estimator]
            tolerance = 0.01
            max_iterations = 25
            "#,
        )
        .unwrap();

        let request = AnalysisRequest::from(config);
        assert_eq!(request.reference_temperature, 298.0);
        assert_eq!(request.unit, SpectralUnit::Wavenumber);
        assert_eq!(request.deviation, Deviation::FromSampleMean);
        assert_eq!(
            request.isotopologue,
            Isotopologue {
                molecule: 2,
                isotope: 1
            }
        );
        assert_eq!(request.estimator.max_iterations, 25);
        assert_eq!(request.seed, 7);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn partial_estimator_settings_keep_remaining_defaults() {
        let config: AnalysisConfig<f64> = toml::from_str(
            r#"
            temperature = 1500.0
            region_1 = [1342.937, 1345.779]
            region_2 = [1390.13, 1393.17]
            line_count = 10
            trial_count = 100
            relative_noise = 0.1

            [estimator]
            max_iterations = 40
            "#,
        )
        .unwrap();

        assert_eq!(config.estimator.tolerance, 1.0);
        assert_eq!(config.estimator.max_iterations, 40);
    }
}
