//! Connected regions of equal predicted class

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AdvisoryTable, AlertLabels, AlertPredicate};
use crate::classification::ClassificationRaster;
use cropsense_core::raster::{Connectivity, GeoTransform};
use cropsense_core::Coordinate;

/// Map-coordinate bounding box of a region's cells
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// A maximal connected set of pixels sharing one predicted label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRegion {
    /// 1-based, in row-major order of each region's first pixel
    pub id: usize,
    pub label: String,
    pub class_code: u32,
    pub pixel_count: usize,
    /// Mean of member pixel centres
    pub centroid: Coordinate,
    pub bounds: Bounds,
    pub advisory: String,
    /// Whether the alert predicate fired for this region's label
    pub triggered: bool,
}

impl fmt::Display for AlertRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Region {} [{}] {} px at ({:.6}, {:.6}): {}",
            self.id, self.label, self.pixel_count, self.centroid.x, self.centroid.y, self.advisory
        )
    }
}

/// Parameters for [`regions_with`]
#[derive(Debug, Clone)]
pub struct AlertParams {
    /// Pixel adjacency (default: 8)
    pub connectivity: Connectivity,
    /// Regions with fewer pixels are not reported (default: 1)
    pub min_region_pixels: usize,
    pub advisories: AdvisoryTable,
}

impl Default for AlertParams {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Eight,
            min_region_pixels: 1,
            advisories: AdvisoryTable::default(),
        }
    }
}

/// Group classified pixels into regions with the default advisory table,
/// alerting on `stressed`.
pub fn regions(classification: &ClassificationRaster, connectivity: Connectivity) -> Vec<AlertRegion> {
    let params = AlertParams {
        connectivity,
        ..Default::default()
    };
    regions_with(classification, &params, &AlertLabels::default())
}

/// Group classified pixels into maximal connected components of equal class,
/// attaching centroid, bounds, advisory and the predicate's verdict.
///
/// Unclassified (NaN) pixels belong to no region.
pub fn regions_with<P>(
    classification: &ClassificationRaster,
    params: &AlertParams,
    predicate: &P,
) -> Vec<AlertRegion>
where
    P: AlertPredicate + ?Sized,
{
    let raster = &classification.labels;
    let (rows, cols) = raster.shape();
    let offsets = params.connectivity.offsets();
    let transform = raster.transform();

    let mut visited = vec![false; rows * cols];
    let mut out = Vec::new();

    for r in 0..rows {
        for c in 0..cols {
            if visited[r * cols + c] {
                continue;
            }
            let code = unsafe { raster.get_unchecked(r, c) };
            let label = match classification.label_for(code) {
                Some(l) => l,
                None => continue,
            };

            let cells = flood_fill(classification, &offsets, &mut visited, r, c, code);
            if cells.len() < params.min_region_pixels {
                continue;
            }

            out.push(AlertRegion {
                id: out.len() + 1,
                label: label.to_string(),
                class_code: code as u32,
                pixel_count: cells.len(),
                centroid: centroid(transform, &cells),
                bounds: bounds(transform, &cells),
                advisory: params.advisories.advisory_for(label),
                triggered: predicate.triggers(label),
            });
        }
    }

    out
}

/// Cells of the component containing (r, c), marking them visited
fn flood_fill(
    classification: &ClassificationRaster,
    offsets: &[(isize, isize)],
    visited: &mut [bool],
    r: usize,
    c: usize,
    code: f64,
) -> Vec<(usize, usize)> {
    let raster = &classification.labels;
    let (rows, cols) = raster.shape();

    let mut cells = Vec::new();
    let mut stack = vec![(r, c)];
    visited[r * cols + c] = true;

    while let Some((cr, cc)) = stack.pop() {
        cells.push((cr, cc));
        for &(dr, dc) in offsets {
            let nr = cr as isize + dr;
            let nc = cc as isize + dc;
            if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            let idx = nr * cols + nc;
            if visited[idx] {
                continue;
            }
            if unsafe { raster.get_unchecked(nr, nc) } == code {
                visited[idx] = true;
                stack.push((nr, nc));
            }
        }
    }

    cells
}

fn centroid(transform: &GeoTransform, cells: &[(usize, usize)]) -> Coordinate {
    let (sx, sy) = cells.iter().fold((0.0, 0.0), |(sx, sy), &(row, col)| {
        let (x, y) = transform.pixel_to_geo(col, row);
        (sx + x, sy + y)
    });
    let n = cells.len() as f64;
    Coordinate::new(sx / n, sy / n)
}

fn bounds(transform: &GeoTransform, cells: &[(usize, usize)]) -> Bounds {
    let mut b = Bounds {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for &(row, col) in cells {
        for (dc, dr) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let (x, y) = transform.pixel_to_geo_corner(col + dc, row + dr);
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropsense_core::Raster;

    const NAN: f64 = f64::NAN;

    /// Codes: 1 = healthy, 2 = stressed, 3 = saline
    fn classification(codes: &[f64], rows: usize, cols: usize) -> ClassificationRaster {
        let mut labels = Raster::from_vec(codes.to_vec(), rows, cols).unwrap();
        labels.set_transform(GeoTransform::new(100.0, 200.0, 10.0, -10.0));
        ClassificationRaster {
            classes: vec!["healthy".into(), "stressed".into(), "saline".into()],
            confidence: labels.like(1.0),
            labels,
        }
    }

    #[test]
    fn test_two_disjoint_stressed_pixels() {
        #[rustfmt::skip]
        let c = classification(&[
            2.0, NAN, NAN, NAN,
            NAN, NAN, NAN, NAN,
            NAN, NAN, NAN, 2.0,
        ], 3, 4);

        let found = regions(&c, Connectivity::Eight);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.label == "stressed" && r.pixel_count == 1));
        assert!(found.iter().all(|r| r.triggered));
        assert_eq!(found[0].centroid, Coordinate::new(105.0, 195.0));
        assert_eq!(found[1].centroid, Coordinate::new(135.0, 175.0));
    }

    #[test]
    fn test_diagonal_neighbours_depend_on_connectivity() {
        #[rustfmt::skip]
        let c = classification(&[
            2.0, 1.0,
            1.0, 2.0,
        ], 2, 2);

        let eight = regions(&c, Connectivity::Eight);
        assert_eq!(eight.len(), 2);
        assert_eq!(eight[0].label, "stressed");
        assert_eq!(eight[0].pixel_count, 2);
        assert_eq!(eight[1].label, "healthy");
        assert!(!eight[1].triggered);

        assert_eq!(regions(&c, Connectivity::Four).len(), 4);
    }

    #[test]
    fn test_centroid_bounds_and_ids() {
        #[rustfmt::skip]
        let c = classification(&[
            1.0, 1.0, 3.0,
            1.0, 1.0, 3.0,
        ], 2, 3);

        let found = regions(&c, Connectivity::Four);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, 1);
        assert_eq!(found[0].pixel_count, 4);
        assert_eq!(found[0].centroid, Coordinate::new(110.0, 190.0));
        assert_eq!(
            found[0].bounds,
            Bounds {
                min_x: 100.0,
                min_y: 180.0,
                max_x: 120.0,
                max_y: 200.0
            }
        );
        assert_eq!(found[1].id, 2);
        assert_eq!(found[1].label, "saline");
        assert!(found[1].advisory.contains("salinity"));
    }

    #[test]
    fn test_min_region_pixels_and_custom_predicate() {
        #[rustfmt::skip]
        let c = classification(&[
            3.0, 1.0, 1.0,
            1.0, 1.0, 2.0,
        ], 2, 3);

        let params = AlertParams {
            connectivity: Connectivity::Four,
            min_region_pixels: 2,
            ..Default::default()
        };
        let not_healthy = |label: &str| label != "healthy";
        let found = regions_with(&c, &params, &not_healthy);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "healthy");
        assert_eq!(found[0].id, 1);
        assert!(!found[0].triggered);
    }

    #[test]
    fn test_all_unclassified_yields_nothing() {
        let c = classification(&[NAN; 6], 2, 3);
        assert!(regions(&c, Connectivity::Eight).is_empty());
    }
}
