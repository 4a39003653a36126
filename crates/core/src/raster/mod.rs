//! Raster data structures and operations

mod bands;
mod element;
mod geotransform;
mod grid;
mod neighborhood;
mod stack;

pub use bands::BandSet;
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use neighborhood::{Connectivity, Neighborhood};
pub use stack::{ImageStack, Observation};
