//! Reading and writing rasters, scene manifests and sample points

mod geotiff;
mod manifest;
mod samples;

pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
pub use manifest::{read_image_stack, ObservationRecord, SceneManifest};
pub use samples::{read_sample_points, read_sample_points_csv, read_sample_points_json};
