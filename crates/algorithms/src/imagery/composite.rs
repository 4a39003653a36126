//! Cloud-filtered temporal median compositing
//!
//! Reduces an [`ImageStack`] to one raster per spectral index: observations
//! above the cloud-cover threshold are dropped, the index is evaluated on
//! each remaining observation, and every pixel takes the median of its
//! valid values through time.

use serde::{Deserialize, Serialize};

use crate::imagery::{compute_index, IndexDefinition};
use crate::maybe_rayon::*;
use cropsense_core::raster::{BandSet, ImageStack, Raster};
use cropsense_core::{Error, Result};

/// Parameters for [`composite`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeParams {
    /// Maximum cloud cover (percent) an observation may have to be used.
    /// Default: 10
    pub cloud_threshold: f64,
    /// Indices to composite. Default: NDVI, NDWI, NDSI, PIR
    pub indices: Vec<IndexDefinition>,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            cloud_threshold: 10.0,
            indices: IndexDefinition::defaults(),
        }
    }
}

/// Per-index median composites and the observations that went into them
#[derive(Debug, Clone)]
pub struct Composite {
    /// One band per index definition, named after the index
    pub indices: BandSet,
    /// Ids of the observations that passed the cloud filter, in stack order
    pub observations: Vec<String>,
}

/// Median of the finite values in `values` (reordered in place); NaN if none
fn nan_median(values: &mut Vec<f64>) -> f64 {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_unstable_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Pixel-wise median across rasters on one grid.
///
/// No-data cells are ignored; a pixel with no valid value in any raster
/// is NaN. The result does not depend on the order of `rasters`.
///
/// # Errors
/// [`Error::GridMismatch`] if the rasters are not co-registered,
/// [`Error::InvalidParameter`] if `rasters` is empty.
pub fn median_composite(rasters: &[&Raster<f64>]) -> Result<Raster<f64>> {
    let first = *rasters
        .first()
        .ok_or_else(|| Error::invalid_param("rasters", 0, "at least one raster is required"))?;
    for r in &rasters[1..] {
        first.ensure_same_grid(*r)?;
    }

    let (rows, cols) = first.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values = Vec::with_capacity(rasters.len());
            for (col, out) in row_data.iter_mut().enumerate() {
                values.clear();
                for r in rasters {
                    let v = unsafe { r.get_unchecked(row, col) };
                    if !r.is_nodata(v) {
                        values.push(v);
                    }
                }
                *out = nan_median(&mut values);
            }
            row_data
        })
        .collect();

    first.with_data(data)
}

/// Cloud-filter the stack and build one median composite per index.
///
/// # Errors
/// - [`Error::EmptyStack`] if no observation passes the cloud filter
/// - [`Error::MissingBand`] if an index references an absent band
pub fn composite(stack: &ImageStack, params: &CompositeParams) -> Result<Composite> {
    let clear = stack.clear_observations(params.cloud_threshold);
    if clear.is_empty() {
        return Err(Error::EmptyStack {
            total: stack.len(),
            threshold: params.cloud_threshold,
        });
    }

    let mut indices = BandSet::new::<String>(Vec::new())?;
    for def in &params.indices {
        let per_date = clear
            .iter()
            .map(|obs| compute_index(&obs.bands, def))
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&Raster<f64>> = per_date.iter().collect();
        indices.push(def.name.clone(), median_composite(&refs)?)?;
    }

    Ok(Composite {
        indices,
        observations: clear.iter().map(|o| o.id.clone()).collect(),
    })
}
