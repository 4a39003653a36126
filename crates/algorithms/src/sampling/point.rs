//! Neighborhood-mean sampling of a raster at a map coordinate

use cropsense_core::raster::{Neighborhood, Raster};
use cropsense_core::{Coordinate, Error, Result};

/// Slack so that e.g. 30 m / 10 m cells is not floored to 2.999.. cells
const WINDOW_EPSILON: f64 = 1e-9;

/// Radius (in cells) of the square window approximating a `scale`-wide footprint.
///
/// `scale` at or below the cell size gives radius 0 (the containing cell);
/// three cells' worth gives radius 1 (3x3), five gives radius 2, and so on.
pub fn window_radius(scale: f64, cell_size: f64) -> usize {
    let cells = scale / cell_size;
    (((cells - 1.0) / 2.0) + WINDOW_EPSILON).floor().max(0.0) as usize
}

/// Mean of `raster` over the window around `point` at resolution `scale`
/// (map units, usually meters).
///
/// The window is centred on the cell containing the point, clipped to the
/// raster, and skips no-data cells. A window with no valid cell gives NaN.
///
/// # Errors
/// - [`Error::OutOfBounds`] if the point is outside the raster extent
/// - [`Error::InvalidParameter`] if `scale` is not a positive number
pub fn sample(raster: &Raster<f64>, point: Coordinate, scale: f64) -> Result<f64> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::invalid_param("scale", scale, "must be a positive number"));
    }

    let (row, col) = raster.cell_at(point.x, point.y).ok_or_else(|| {
        let (min_x, min_y, max_x, max_y) = raster.bounds();
        Error::OutOfBounds {
            x: point.x,
            y: point.y,
            min_x,
            min_y,
            max_x,
            max_y,
        }
    })?;

    let (rows, cols) = raster.shape();
    let radius = window_radius(scale, raster.cell_size());

    let mut sum = 0.0;
    let mut count = 0usize;
    for (dr, dc) in Neighborhood::Square(radius).offsets() {
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
            continue;
        }
        let v = unsafe { raster.get_unchecked(nr as usize, nc as usize) };
        if raster.is_nodata(v) {
            continue;
        }
        sum += v;
        count += 1;
    }

    Ok(if count > 0 { sum / count as f64 } else { f64::NAN })
}
