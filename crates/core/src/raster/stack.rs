//! Time series of multispectral observations

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::raster::BandSet;

/// One dated acquisition over the study region
#[derive(Debug, Clone)]
pub struct Observation {
    pub id: String,
    pub date: NaiveDate,
    /// Cloud-covered share of the scene, in percent (0-100)
    pub cloud_cover: f64,
    pub bands: BandSet,
}

/// Observations over one region, all with the same band layout and grid
#[derive(Debug, Clone, Default)]
pub struct ImageStack {
    observations: Vec<Observation>,
}

impl ImageStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation.
    ///
    /// Its band names must match the stack's and its grid must line up with
    /// the first observation's.
    pub fn push(&mut self, observation: Observation) -> Result<()> {
        if let Some(first) = self.observations.first() {
            if first.bands.names() != observation.bands.names() {
                return Err(Error::SchemaMismatch {
                    expected: first.bands.names().to_vec(),
                    found: observation.bands.names().to_vec(),
                });
            }
            if let (Some(a), Some(b)) = (first.bands.template(), observation.bands.template()) {
                a.ensure_same_grid(b)?;
            }
        }
        self.observations.push(observation);
        Ok(())
    }

    /// Build a stack from observations, validating each as in [`ImageStack::push`]
    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Result<Self> {
        let mut stack = Self::new();
        for obs in observations {
            stack.push(obs)?;
        }
        Ok(stack)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Observations whose cloud cover does not exceed `threshold` percent
    pub fn clear_observations(&self, threshold: f64) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|o| o.cloud_cover <= threshold)
            .collect()
    }
}
