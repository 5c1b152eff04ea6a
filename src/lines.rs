use std::fs;
use std::path::Path;

use ndarray::Array1;
use num_traits::Float;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::partition::Isotopologue;
use crate::Result;

/// A single absorption line as tabulated in a HITRAN style line list
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct LineRecord<E> {
    /// Line position in cm⁻¹
    pub wavenumber: E,
    /// Line strength at the reference temperature
    pub line_strength: E,
    /// Energy of the lower state of the transition in cm⁻¹
    pub lower_state_energy: E,
}

/// Index-aligned columns of line data
///
/// Row `ii` of every column describes the same transition. The columns are guaranteed to have
/// equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct LineTable<E> {
    wavenumber: Array1<E>,
    line_strength: Array1<E>,
    lower_state_energy: Array1<E>,
}

impl<E: Float> LineTable<E> {
    /// Build a table from aligned columns
    ///
    /// # Errors
    /// Returns an error if the columns do not all have the same length.
    pub fn new(
        wavenumber: Array1<E>,
        line_strength: Array1<E>,
        lower_state_energy: Array1<E>,
    ) -> Result<Self> {
        if wavenumber.len() != line_strength.len()
            || wavenumber.len() != lower_state_energy.len()
        {
            return Err(AnalysisError::MismatchedColumns {
                wavenumber: wavenumber.len(),
                line_strength: line_strength.len(),
                lower_state_energy: lower_state_energy.len(),
            }
            .into());
        }
        Ok(Self {
            wavenumber,
            line_strength,
            lower_state_energy,
        })
    }

    pub fn len(&self) -> usize {
        self.wavenumber.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavenumber.is_empty()
    }

    pub const fn wavenumber(&self) -> &Array1<E> {
        &self.wavenumber
    }

    pub const fn line_strength(&self) -> &Array1<E> {
        &self.line_strength
    }

    pub const fn lower_state_energy(&self) -> &Array1<E> {
        &self.lower_state_energy
    }

    /// The record in row `index`
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn record(&self, index: usize) -> LineRecord<E> {
        LineRecord {
            wavenumber: self.wavenumber[index],
            line_strength: self.line_strength[index],
            lower_state_energy: self.lower_state_energy[index],
        }
    }

    pub fn records(&self) -> impl Iterator<Item = LineRecord<E>> + '_ {
        (0..self.len()).map(|ii| self.record(ii))
    }

    /// The lines with wavenumber inside the closed interval `[nu_min, nu_max]`, in table order
    pub fn window(&self, nu_min: E, nu_max: E) -> Self {
        self.records()
            .filter(|record| record.wavenumber >= nu_min && record.wavenumber <= nu_max)
            .collect()
    }
}

impl<E: Float> FromIterator<LineRecord<E>> for LineTable<E> {
    fn from_iter<I: IntoIterator<Item = LineRecord<E>>>(iter: I) -> Self {
        let mut wavenumber = vec![];
        let mut line_strength = vec![];
        let mut lower_state_energy = vec![];
        for record in iter {
            wavenumber.push(record.wavenumber);
            line_strength.push(record.line_strength);
            lower_state_energy.push(record.lower_state_energy);
        }
        Self {
            wavenumber: Array1::from(wavenumber),
            line_strength: Array1::from(line_strength),
            lower_state_energy: Array1::from(lower_state_energy),
        }
    }
}

impl<E: Float + DeserializeOwned> LineTable<E> {
    /// Read a line list from a csv file with header
    /// `wavenumber,line_strength,lower_state_energy`
    ///
    /// # Errors
    /// Returns an error if the file is missing or a row cannot be parsed.
    pub fn from_file(filepath: &Path) -> Result<Self> {
        if !filepath.exists() {
            return Err(AnalysisError::MissingFile(filepath.to_path_buf()).into());
        }

        let file = fs::read(filepath)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(&file[..]);

        let mut records = vec![];
        for result in rdr.deserialize() {
            let record: LineRecord<E> = result?;
            records.push(record);
        }

        Ok(records.into_iter().collect())
    }
}

/// Access to a spectroscopic line database
pub trait LineSource<E> {
    /// Fetch every line of `isotopologue` with wavenumber in `[nu_min, nu_max]`
    ///
    /// # Errors
    /// Implementations fail if the database has no data for the requested isotopologue.
    fn fetch(&self, isotopologue: Isotopologue, nu_min: E, nu_max: E) -> Result<LineTable<E>>;
}

/// An in-memory line list for a single isotopologue
#[derive(Clone, Debug)]
pub struct LineCatalogue<E> {
    pub isotopologue: Isotopologue,
    pub lines: LineTable<E>,
}

impl<E: Float> LineSource<E> for LineCatalogue<E> {
    fn fetch(&self, isotopologue: Isotopologue, nu_min: E, nu_max: E) -> Result<LineTable<E>> {
        if isotopologue != self.isotopologue {
            return Err(AnalysisError::UnknownIsotopologue(isotopologue).into());
        }
        Ok(self.lines.window(nu_min, nu_max))
    }
}
