//! # CropSense Core
//!
//! Core types and I/O for the CropSense crop-health pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2D grid
//! - `GeoTransform` and `CRS`: georeferencing
//! - `BandSet` / `ImageStack`: named co-registered bands and dated observations
//! - `SamplePoint`: labeled ground-truth locations
//! - GeoTIFF, scene-manifest and sample-point readers

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{
    BandSet, Connectivity, GeoTransform, ImageStack, Observation, Raster, RasterElement,
};
pub use vector::{Coordinate, SamplePoint};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{
        BandSet, Connectivity, GeoTransform, ImageStack, Observation, Raster, RasterElement,
    };
    pub use crate::vector::{Coordinate, SamplePoint};
}
