use thiserror::Error;

#[derive(Error, Debug)]
pub enum LandscapeError {
    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Grid cell not found in reference grid: {0}")]
    UnknownGridCell(String),

    #[error("Grid cell {0} has an empty geometry")]
    EmptyGeometry(String),

    #[error("Invalid buffer radius: {0} (must be positive)")]
    InvalidRadius(f64),

    #[error("Clip bounds [{0}, {1}]-[{2}, {3}] do not intersect the raster")]
    EmptyClip(f64, f64, f64, f64),

    #[error("Invalid scale {scale} m: {reason}")]
    InvalidScale { scale: u32, reason: String },

    #[error("Input raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Pixel size is non-positive: {0}")]
    InvalidPixelSize(f64),

    #[error("No grid cells assigned to job {0}")]
    NoGridCells(u32),

    #[error("Grid feature is missing attribute or geometry: {0}")]
    MissingAttribute(String),

    #[error("No grid cells selected: pass --grid-ref, or --params together with --job-id")]
    MissingJobSelection,
}

impl LandscapeError {
    pub(crate) fn invalid_scale(scale: u32, reason: impl Into<String>) -> Self {
        LandscapeError::InvalidScale {
            scale,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LandscapeError>;
