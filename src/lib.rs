#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// #![warn(clippy::cargo)]

//! Temperature uncertainty of two-line ratio thermometry
//!
//! Lines are drawn from two spectral regions, their intensities modelled at a simulated
//! temperature and repeatedly perturbed with Gaussian noise. The temperature recovered from each
//! perturbed pair gives the spread of the estimate for every pair of lines, collected in an
//! [`sweep::UncertaintyMatrix`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod estimator;
pub mod intensity;
pub mod lines;
pub mod partition;
pub mod region;
pub mod selection;
pub mod sweep;
pub mod thermal;

pub use analysis::{analyse, AnalysisOutcome, AnalysisRequest};
pub use error::AnalysisError;

pub type Result<T> = ::std::result::Result<T, Box<dyn ::std::error::Error>>;
