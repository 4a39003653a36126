//! Normalized-difference spectral indices
//!
//! Every index here has the form `(a - b) / (a + b)` over two bands of the
//! same observation. Band names default to Sentinel-2 MSI naming and can be
//! remapped through [`IndexDefinition`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::maybe_rayon::*;
use cropsense_core::raster::{BandSet, Raster};
use cropsense_core::{Error, Result};

/// Below this magnitude `a + b` is treated as zero
const ZERO_SUM_EPSILON: f64 = 1e-10;

/// The four indices used as crop-health predictors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralIndex {
    /// Normalized Difference Vegetation Index, `(NIR - Red) / (NIR + Red)`
    Ndvi,
    /// Normalized Difference Water Index (McFeeters), `(Green - NIR) / (Green + NIR)`
    Ndwi,
    /// Normalized Difference Salinity Index, `(SWIR1 - SWIR2) / (SWIR1 + SWIR2)`
    Ndsi,
    /// Pigment Index Ratio, `(Red - Blue) / (Red + Blue)`
    Pir,
}

impl SpectralIndex {
    pub const ALL: [SpectralIndex; 4] = [
        SpectralIndex::Ndvi,
        SpectralIndex::Ndwi,
        SpectralIndex::Ndsi,
        SpectralIndex::Pir,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpectralIndex::Ndvi => "NDVI",
            SpectralIndex::Ndwi => "NDWI",
            SpectralIndex::Ndsi => "NDSI",
            SpectralIndex::Pir => "PIR",
        }
    }

    /// Sentinel-2 (positive, negative) band pair
    pub fn default_bands(self) -> (&'static str, &'static str) {
        match self {
            SpectralIndex::Ndvi => ("B8", "B4"),
            SpectralIndex::Ndwi => ("B3", "B8"),
            SpectralIndex::Ndsi => ("B11", "B12"),
            SpectralIndex::Pir => ("B4", "B2"),
        }
    }

    pub fn definition(self) -> IndexDefinition {
        let (positive, negative) = self.default_bands();
        IndexDefinition::new(self.name(), positive, negative)
    }
}

impl fmt::Display for SpectralIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpectralIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SpectralIndex::ALL
            .into_iter()
            .find(|idx| idx.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_param("index", s, "expected one of NDVI, NDWI, NDSI, PIR"))
    }
}

/// A named normalized difference over two bands of a [`BandSet`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Output band name, e.g. `NDVI`
    pub name: String,
    /// Band added in the numerator
    pub positive: String,
    /// Band subtracted in the numerator
    pub negative: String,
}

impl IndexDefinition {
    pub fn new(
        name: impl Into<String>,
        positive: impl Into<String>,
        negative: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            positive: positive.into(),
            negative: negative.into(),
        }
    }

    /// NDVI, NDWI, NDSI and PIR with Sentinel-2 band names
    pub fn defaults() -> Vec<IndexDefinition> {
        SpectralIndex::ALL.iter().map(|i| i.definition()).collect()
    }
}

/// Normalized difference `(a - b) / (a + b)` per pixel.
///
/// Output lies in [-1, 1] for non-negative inputs. A pixel is NaN when
/// either input is no-data or when `a + b` is zero.
///
/// # Errors
/// [`Error::GridMismatch`] if the two bands are not on the same grid.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    band_a.ensure_same_grid(band_b)?;

    let (rows, cols) = band_a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if band_a.is_nodata(a) || band_b.is_nodata(b) {
                    continue;
                }

                let sum = a + b;
                if sum.abs() < ZERO_SUM_EPSILON {
                    continue;
                }

                *out = (a - b) / sum;
            }
            row_data
        })
        .collect();

    band_a.with_data(data)
}

/// `NDVI = (NIR - Red) / (NIR + Red)`
///
/// Dense green canopy sits around 0.6-0.9, bare soil near 0.1-0.2 and open
/// water below zero.
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

/// `NDWI = (Green - NIR) / (Green + NIR)`; positive over open water
pub fn ndwi(green: &Raster<f64>, nir: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(green, nir)
}

/// `NDSI = (SWIR1 - SWIR2) / (SWIR1 + SWIR2)`; rises with surface salt crusts
pub fn ndsi(swir1: &Raster<f64>, swir2: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(swir1, swir2)
}

/// `PIR = (Red - Blue) / (Red + Blue)`; tracks carotenoid/chlorophyll balance
pub fn pir(red: &Raster<f64>, blue: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(red, blue)
}

/// Evaluate one index definition against a band set
///
/// # Errors
/// [`Error::MissingBand`] if either referenced band is absent.
pub fn compute_index(bands: &BandSet, definition: &IndexDefinition) -> Result<Raster<f64>> {
    let a = bands.get(&definition.positive)?;
    let b = bands.get(&definition.negative)?;
    normalized_difference(a, b)
}

/// Evaluate several index definitions into a band set keyed by index name
pub fn compute_indices(bands: &BandSet, definitions: &[IndexDefinition]) -> Result<BandSet> {
    let mut out = BandSet::new::<String>(Vec::new())?;
    for def in definitions {
        out.push(def.name.clone(), compute_index(bands, def)?)?;
    }
    Ok(out)
}
