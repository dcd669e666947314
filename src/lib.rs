// Library exports for testing and reuse

pub mod classify;
pub mod cli;
pub mod coastal;
#[cfg(feature = "gdal")]
pub mod crs;
pub mod error;
pub mod focal;
pub mod grid;
#[cfg(feature = "gdal")]
pub mod io;
pub mod job;
pub mod landscape;
pub mod raster;
pub mod tables;

// Re-export commonly used types
pub use classify::{classify, HabitatSet};
pub use coastal::{is_coastal, SEA_NODATA};
pub use error::{LandscapeError, Result};
pub use focal::{compute_focal_metrics, window_cells};
pub use grid::ReferenceGrid;
pub use job::{run_job, JobResults, DEFAULT_SCALES};
pub use landscape::{compute_scale_metrics, CoastalRow, LandscapeContext, MetricsRow, ScaleOutcome};
pub use raster::{ClippedRaster, LandCoverRaster, RasterMetadata};
