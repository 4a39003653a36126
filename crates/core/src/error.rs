//! Error types for CropSense

use thiserror::Error;

/// Main error type for CropSense operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Rasters combined in one operation do not share a grid.
    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    /// No observation survived the cloud-cover filter.
    #[error("Empty stack: none of {total} observations has cloud cover <= {threshold}%")]
    EmptyStack { total: usize, threshold: f64 },

    /// A geographic point lies outside the raster extent.
    #[error(
        "Point ({x}, {y}) is outside raster extent ({min_x}, {min_y}) - ({max_x}, {max_y})"
    )]
    OutOfBounds {
        x: f64,
        y: f64,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    #[error("Degenerate training data: {classes} distinct label(s), at least 2 required")]
    DegenerateTraining { classes: usize },

    #[error("Schema mismatch: expected bands {expected:?}, got {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Band not found: {0}")]
    MissingBand(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Tiff(e.to_string())
    }
}

impl Error {
    /// Shorthand for [`Error::InvalidParameter`]
    pub fn invalid_param(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for CropSense operations
pub type Result<T> = std::result::Result<T, Error>;
