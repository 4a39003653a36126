//! Per-pixel application of a trained forest

use serde::Serialize;
use std::collections::BTreeMap;

use super::RandomForest;
use crate::maybe_rayon::*;
use cropsense_core::raster::{BandSet, Raster};
use cropsense_core::{Error, Result};

/// Output of [`classify`]: class codes, vote confidence and the code legend
#[derive(Debug, Clone)]
pub struct ClassificationRaster {
    /// Class labels; code `i + 1` in `labels` means `classes[i]`
    pub classes: Vec<String>,
    /// 1-based class code per pixel, NaN where unclassified
    pub labels: Raster<f64>,
    /// Fraction of trees voting for the winning class, NaN where unclassified
    pub confidence: Raster<f64>,
}

/// One legend entry, as written to `classes.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEntry {
    pub code: u32,
    pub label: String,
    pub pixels: usize,
}

impl ClassificationRaster {
    /// Label of the class with 1-based `code`
    pub fn label_for(&self, code: f64) -> Option<&str> {
        if !code.is_finite() || code < 1.0 || code.fract() != 0.0 {
            return None;
        }
        self.classes.get(code as usize - 1).map(String::as_str)
    }

    /// Predicted label at a cell, `None` if unclassified
    pub fn label_at(&self, row: usize, col: usize) -> Option<&str> {
        self.labels.get(row, col).ok().and_then(|c| self.label_for(c))
    }

    /// 1-based code of `label`
    pub fn code_of(&self, label: &str) -> Option<u32> {
        self.classes
            .iter()
            .position(|c| c == label)
            .map(|i| i as u32 + 1)
    }

    /// Pixel count per class, keyed by label
    pub fn class_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts: BTreeMap<&str, usize> =
            self.classes.iter().map(|c| (c.as_str(), 0)).collect();
        for &code in self.labels.data().iter() {
            if let Some(label) = self.label_for(code) {
                *counts.entry(label).or_default() += 1;
            }
        }
        counts
    }

    /// Code legend with per-class pixel counts
    pub fn legend(&self) -> Vec<ClassEntry> {
        let counts = self.class_counts();
        self.classes
            .iter()
            .enumerate()
            .map(|(i, label)| ClassEntry {
                code: i as u32 + 1,
                label: label.clone(),
                pixels: counts.get(label.as_str()).copied().unwrap_or(0),
            })
            .collect()
    }
}

/// Apply `model` to every pixel of `bands`.
///
/// `bands` must hold exactly the model's predictors, in training order.
/// Pixels with any non-finite predictor stay unclassified (NaN).
///
/// # Errors
/// [`Error::SchemaMismatch`] if band names or order differ from training.
pub fn classify(model: &RandomForest, bands: &BandSet) -> Result<ClassificationRaster> {
    if bands.names() != model.predictors() {
        return Err(Error::SchemaMismatch {
            expected: model.predictors().to_vec(),
            found: bands.names().to_vec(),
        });
    }
    let template = bands.template().ok_or_else(|| Error::SchemaMismatch {
        expected: model.predictors().to_vec(),
        found: Vec::new(),
    })?;

    let (rows, cols) = template.shape();
    let rasters = bands.rasters();

    let cells: Vec<(f64, f64)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![(f64::NAN, f64::NAN); cols];
            let mut x = vec![0.0; rasters.len()];
            for (col, out) in row_data.iter_mut().enumerate() {
                for (i, r) in rasters.iter().enumerate() {
                    let v = unsafe { r.get_unchecked(row, col) };
                    x[i] = if r.is_nodata(v) { f64::NAN } else { v };
                }
                if let Some((class, confidence)) = model.predict(&x) {
                    *out = ((class + 1) as f64, confidence);
                }
            }
            row_data
        })
        .collect();

    let (codes, confidence): (Vec<f64>, Vec<f64>) = cells.into_iter().unzip();

    Ok(ClassificationRaster {
        classes: model.classes().to_vec(),
        labels: template.with_data(codes)?,
        confidence: template.with_data(confidence)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{train, ForestParams};
    use crate::sampling::FeatureVector;
    use cropsense_core::{Coordinate, GeoTransform};

    fn band(values: &[f64]) -> Raster<f64> {
        let mut r = Raster::from_vec(values.to_vec(), 2, 3).unwrap();
        r.set_transform(GeoTransform::new(0.0, 20.0, 10.0, -10.0));
        r
    }

    fn model() -> RandomForest {
        let features: Vec<FeatureVector> = (0..30)
            .map(|i| {
                let healthy = i % 2 == 0;
                let base = if healthy { 0.7 } else { 0.2 };
                let ndvi = base + i as f64 * 0.001;
                FeatureVector {
                    point_id: format!("P{}", i),
                    location: Coordinate::new(0.0, 0.0),
                    label: if healthy { "healthy" } else { "stressed" }.to_string(),
                    values: [("NDVI".to_string(), ndvi), ("NDWI".to_string(), 0.0)]
                        .into_iter()
                        .collect(),
                }
            })
            .collect();
        train(&features, &["NDVI".into(), "NDWI".into()], &ForestParams::default()).unwrap()
    }

    #[test]
    fn test_classify_pixels() {
        let bands = BandSet::new(vec![
            ("NDVI", band(&[0.8, 0.1, f64::NAN, 0.75, 0.15, 0.7])),
            ("NDWI", band(&[0.0; 6])),
        ])
        .unwrap();

        let out = classify(&model(), &bands).unwrap();
        assert_eq!(out.label_at(0, 0), Some("healthy"));
        assert_eq!(out.label_at(0, 1), Some("stressed"));
        assert_eq!(out.label_at(0, 2), None);
        assert!(out.confidence.get(0, 2).unwrap().is_nan());
        assert_eq!(out.labels.get(1, 1).unwrap(), 2.0);
        assert_eq!(out.labels.transform(), bands.template().unwrap().transform());

        let c = out.confidence.get(0, 0).unwrap();
        assert!(c > 0.5 && c <= 1.0);

        let counts = out.class_counts();
        assert_eq!(counts["healthy"], 3);
        assert_eq!(counts["stressed"], 2);
        assert_eq!(out.code_of("stressed"), Some(2));
        assert_eq!(out.legend()[0].pixels, 3);
    }

    #[test]
    fn test_missing_band_is_schema_mismatch() {
        let bands = BandSet::new(vec![("NDVI", band(&[0.5; 6]))]).unwrap();
        let err = classify(&model(), &bands).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_reordered_bands_is_schema_mismatch() {
        let bands = BandSet::new(vec![("NDWI", band(&[0.0; 6])), ("NDVI", band(&[0.5; 6]))]).unwrap();
        assert!(matches!(classify(&model(), &bands), Err(Error::SchemaMismatch { .. })));
    }
}
