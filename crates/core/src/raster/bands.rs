//! Named, co-registered band collections

use crate::error::{Error, Result};
use crate::raster::Raster;

/// An ordered set of uniquely named `f64` rasters sharing one grid.
///
/// Band order is significant: classifiers bind predictors to positions, so
/// two sets with the same names in a different order are different schemas.
#[derive(Debug, Clone)]
pub struct BandSet {
    names: Vec<String>,
    bands: Vec<Raster<f64>>,
}

impl BandSet {
    /// Build a band set, checking names are unique and grids agree
    pub fn new<S: Into<String>>(bands: Vec<(S, Raster<f64>)>) -> Result<Self> {
        let mut set = Self {
            names: Vec::with_capacity(bands.len()),
            bands: Vec::with_capacity(bands.len()),
        };
        for (name, raster) in bands {
            set.push(name, raster)?;
        }
        Ok(set)
    }

    /// Append a band; fails on duplicate names or a different grid
    pub fn push(&mut self, name: impl Into<String>, raster: Raster<f64>) -> Result<()> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(Error::invalid_param("band", &name, "duplicate band name"));
        }
        if let Some(first) = self.bands.first() {
            first.ensure_same_grid(&raster)?;
        }
        self.names.push(name);
        self.bands.push(raster);
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Band by name
    pub fn get(&self, name: &str) -> Result<&Raster<f64>> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.bands[i])
            .ok_or_else(|| Error::MissingBand(name.to_string()))
    }

    /// Any band, used as the grid template
    pub fn template(&self) -> Option<&Raster<f64>> {
        self.bands.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Raster<f64>)> {
        self.names.iter().map(String::as_str).zip(self.bands.iter())
    }

    /// Rasters in band order
    pub fn rasters(&self) -> &[Raster<f64>] {
        &self.bands
    }

    /// New set holding `names` in the given order.
    ///
    /// Fails with [`Error::SchemaMismatch`] if any name is absent.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<BandSet> {
        let mut out = BandSet::new::<String>(Vec::new())?;
        for name in names {
            let name = name.as_ref();
            let raster = self.get(name).map_err(|_| Error::SchemaMismatch {
                expected: names.iter().map(|n| n.as_ref().to_string()).collect(),
                found: self.names.clone(),
            })?;
            out.push(name, raster.clone())?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;

    fn band(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(3, 3, value);
        r.set_transform(GeoTransform::new(0.0, 30.0, 10.0, -10.0));
        r
    }

    #[test]
    fn test_lookup_and_order() {
        let set = BandSet::new(vec![("B4", band(0.1)), ("B8", band(0.5))]).unwrap();
        assert_eq!(set.names(), &["B4".to_string(), "B8".to_string()]);
        assert_eq!(set.get("B8").unwrap().get(0, 0).unwrap(), 0.5);
        assert!(matches!(set.get("B2"), Err(Error::MissingBand(_))));
    }

    #[test]
    fn test_rejects_duplicates_and_mismatched_grids() {
        assert!(BandSet::new(vec![("B4", band(0.1)), ("B4", band(0.2))]).is_err());

        let mut shifted = band(0.2);
        shifted.set_transform(GeoTransform::new(10.0, 30.0, 10.0, -10.0));
        let err = BandSet::new(vec![("B4", band(0.1)), ("B8", shifted)]).unwrap_err();
        assert!(matches!(err, Error::GridMismatch(_)));
    }

    #[test]
    fn test_select_reorders_and_checks_schema() {
        let set = BandSet::new(vec![("NDVI", band(0.1)), ("NDWI", band(0.2))]).unwrap();
        let picked = set.select(&["NDWI", "NDVI"]).unwrap();
        assert_eq!(picked.names(), &["NDWI".to_string(), "NDVI".to_string()]);
        assert!(matches!(
            set.select(&["NDVI", "PIR"]),
            Err(Error::SchemaMismatch { .. })
        ));
    }
}
