use crate::error::{LandscapeError, Result};
use crate::grid::ReferenceGrid;
use crate::raster::{LandCoverRaster, RasterMetadata};
use gdal::vector::LayerAccess;
use gdal::Dataset;
use geo::{coord, Rect};
use log::{debug, info, warn};
use ndarray::Array2;
use std::path::Path;

/// Read band 1 of the land cover raster.
///
/// Dimension and pixel-size checks happen in [`LandCoverRaster::new`].
pub fn read_land_cover<P: AsRef<Path>>(path: P) -> Result<LandCoverRaster> {
    info!("Opening land cover raster: {}", path.as_ref().display());
    let dataset = Dataset::open(path.as_ref())?;
    let band = dataset.rasterband(1)?;

    let (width, height) = band.size();
    let geotransform = dataset.geo_transform()?;
    let metadata = RasterMetadata {
        width,
        height,
        geotransform,
        projection: dataset.projection(),
        nodata: band.no_data_value(),
        pixel_width: geotransform[1].abs(),
        pixel_height: geotransform[5].abs(),
    };
    debug!(
        "Land cover grid {}x{} at {:.6} x {:.6} map units",
        width, height, metadata.pixel_width, metadata.pixel_height
    );

    let classes = band.read_as::<i32>((0, 0), (width, height), (width, height), None)?;
    let data = Array2::from_shape_vec((height, width), classes.into_iter().collect())?;

    LandCoverRaster::new(data, metadata)
}

/// Read the reference grid (layer 0), keyed by the `field` attribute.
///
/// Each cell is stored as the bounding rectangle of its geometry.
pub fn read_reference_grid<P: AsRef<Path>>(path: P, field: &str) -> Result<ReferenceGrid> {
    info!("Opening reference grid: {}", path.as_ref().display());
    let dataset = Dataset::open(path.as_ref())?;
    let mut layer = dataset.layer(0)?;

    let mut grid = ReferenceGrid::new();
    for feature in layer.features() {
        let grid_ref = feature
            .field_as_string_by_name(field)?
            .ok_or_else(|| LandscapeError::MissingAttribute(field.to_string()))?;
        let geometry = feature
            .geometry()
            .ok_or_else(|| LandscapeError::MissingAttribute(format!("geometry of {}", grid_ref)))?;

        let envelope = geometry.envelope();
        let rect = Rect::new(
            coord! { x: envelope.MinX, y: envelope.MinY },
            coord! { x: envelope.MaxX, y: envelope.MaxY },
        );

        if grid.contains(&grid_ref) {
            warn!("Duplicate grid reference {}, keeping the last feature", grid_ref);
        }
        grid.insert(grid_ref, rect.to_polygon());
    }

    info!("Loaded {} grid cells", grid.len());
    Ok(grid)
}
