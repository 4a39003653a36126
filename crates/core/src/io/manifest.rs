//! Scene manifests: per-observation metadata plus band file paths.
//!
//! ```json
//! {
//!   "observations": [
//!     {
//!       "id": "S2A_20240105",
//!       "date": "2024-01-05",
//!       "cloud_cover": 4.2,
//!       "epsg": 32643,
//!       "bands": { "B4": "20240105/B4.tif", "B8": "20240105/B8.tif" }
//!     }
//!   ]
//! }
//! ```
//!
//! Band paths are relative to the manifest's directory. `geotransform`
//! (GDAL coefficient order) and `epsg` override what the GeoTIFF tags say.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::io::read_geotiff;
use crate::raster::{BandSet, GeoTransform, ImageStack, Observation, Raster};

/// Metadata record for one observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub id: String,
    pub date: NaiveDate,
    /// Percent of the scene under cloud
    pub cloud_cover: f64,
    /// Band name to GeoTIFF path
    pub bands: BTreeMap<String, PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geotransform: Option<[f64; 6]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsg: Option<u32>,
}

/// All observations of one study region
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneManifest {
    pub observations: Vec<ObservationRecord>,
}

impl SceneManifest {
    /// Parse a manifest file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let manifest: SceneManifest = serde_json::from_reader(BufReader::new(file))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        for record in &self.observations {
            if !(0.0..=100.0).contains(&record.cloud_cover) {
                return Err(Error::invalid_param(
                    "cloud_cover",
                    record.cloud_cover,
                    format!("observation {} must be within 0-100 percent", record.id),
                ));
            }
            if record.bands.is_empty() {
                return Err(Error::invalid_param(
                    "bands",
                    &record.id,
                    "observation lists no band files",
                ));
            }
        }
        Ok(())
    }

    /// Read every band file and assemble the image stack.
    ///
    /// Relative band paths resolve against `base_dir`.
    pub fn load_stack(&self, base_dir: &Path) -> Result<ImageStack> {
        let observations = self
            .observations
            .iter()
            .map(|record| record.load(base_dir))
            .collect::<Result<Vec<_>>>()?;
        ImageStack::from_observations(observations)
    }
}

impl ObservationRecord {
    fn load(&self, base_dir: &Path) -> Result<Observation> {
        let mut bands = Vec::with_capacity(self.bands.len());
        for (name, rel_path) in &self.bands {
            let path = base_dir.join(rel_path);
            let mut raster: Raster<f64> = read_geotiff(&path)?;
            if let Some(coeffs) = self.geotransform {
                raster.set_transform(GeoTransform::from_gdal(coeffs));
            }
            if let Some(code) = self.epsg {
                raster.set_crs(Some(CRS::from_epsg(code)));
            }
            bands.push((name.clone(), raster));
        }

        Ok(Observation {
            id: self.id.clone(),
            date: self.date,
            cloud_cover: self.cloud_cover,
            bands: BandSet::new(bands)?,
        })
    }
}

/// Load the image stack described by a manifest file
pub fn read_image_stack<P: AsRef<Path>>(manifest_path: P) -> Result<ImageStack> {
    let manifest_path = manifest_path.as_ref();
    let manifest = SceneManifest::from_path(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    manifest.load_stack(base_dir)
}
