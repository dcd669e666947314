use crate::classify::{classify, HabitatSet};
use crate::coastal::is_coastal;
use crate::error::{LandscapeError, Result};
use crate::focal::{compute_focal_metrics, window_cells};
use crate::grid::ReferenceGrid;
use crate::raster::{ClippedRaster, LandCoverRaster};
use log::debug;
use ndarray::{s, Array2, ArrayView2};
use serde::Serialize;

/// Read-only inputs shared by every (grid cell, scale) computation
#[derive(Debug, Clone, Copy)]
pub struct LandscapeContext<'a> {
    pub raster: &'a LandCoverRaster,
    pub grid: &'a ReferenceGrid,
    pub habitat: &'a HabitatSet,
    pub nodata: i32,
}

/// Mean landscape metrics of one grid cell at one scale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRow {
    pub grid_ref: String,
    pub scale: u32,
    pub ls_amount: f64,
    pub ls_hetero: f64,
    pub ls_both: f64,
}

/// A (grid cell, scale) pair skipped because its clip reaches the sea
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoastalRow {
    pub grid_ref: String,
    pub scale: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScaleOutcome {
    Metrics(MetricsRow),
    Coastal(CoastalRow),
}

/// Index window of the clip that belongs to the unbuffered cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteriorBounds {
    pub skirt: usize,
    pub row_max: usize,
    pub col_max: usize,
}

impl InteriorBounds {
    pub fn height(&self) -> usize {
        self.row_max - self.skirt
    }

    pub fn width(&self) -> usize {
        self.col_max - self.skirt
    }

    pub fn slice<'a>(&self, grid: &'a Array2<f64>) -> ArrayView2<'a, f64> {
        grid.slice(s![self.skirt..self.row_max, self.skirt..self.col_max])
    }
}

/// Interior left after removing the `scale / 2` buffer skirt from a clip of
/// shape `dim`. The skirt is `round((scale / 2) / resolution)` pixels on
/// every side.
pub fn interior_bounds(dim: (usize, usize), scale: u32, resolution: f64) -> Result<InteriorBounds> {
    let (nrows, ncols) = dim;
    if !(resolution > 0.0) || !resolution.is_finite() {
        return Err(LandscapeError::InvalidPixelSize(resolution));
    }

    let skirt_px = (f64::from(scale) / 2.0 / resolution).round();
    let no_interior = || {
        LandscapeError::invalid_scale(
            scale,
            format!(
                "a {} pixel buffer skirt leaves no interior in a {}x{} clip",
                skirt_px, ncols, nrows
            ),
        )
    };

    // Compared as f64 first so huge skirts never reach the usize arithmetic
    if skirt_px >= nrows.min(ncols) as f64 {
        return Err(no_interior());
    }
    let skirt = skirt_px as usize;
    match skirt.checked_mul(2) {
        Some(span) if span < nrows && span < ncols => {}
        _ => return Err(no_interior()),
    }

    Ok(InteriorBounds {
        skirt,
        row_max: nrows - skirt,
        col_max: ncols - skirt,
    })
}

fn mean(view: ArrayView2<'_, f64>, scale: u32) -> Result<f64> {
    view.mean()
        .ok_or_else(|| LandscapeError::invalid_scale(scale, "empty interior"))
}

/// Metrics for an already clipped grid: coastal gate, habitat mask, focal
/// pass, interior trim and reduction to means.
pub fn summarise_clip(
    grid_ref: &str,
    scale: u32,
    clip: &ClippedRaster,
    habitat: &HabitatSet,
    nodata: i32,
) -> Result<ScaleOutcome> {
    if is_coastal(&clip.data, nodata) {
        debug!("{} at {} m reaches no-data pixels, recorded as coastal", grid_ref, scale);
        return Ok(ScaleOutcome::Coastal(CoastalRow {
            grid_ref: grid_ref.to_string(),
            scale,
        }));
    }

    let interior = interior_bounds(clip.data.dim(), scale, clip.resolution)?;
    let window = window_cells(scale, clip.resolution)?;

    let mask = classify(&clip.data, habitat);
    let metrics = compute_focal_metrics(&clip.data, &mask, window, habitat)?;

    let amount = interior.slice(&metrics.amount);
    let hetero = interior.slice(&metrics.heterogeneity);
    let both = &amount * &hetero;

    debug!(
        "{} at {} m: window {} px, interior {}x{} px",
        grid_ref,
        scale,
        window,
        interior.width(),
        interior.height()
    );

    Ok(ScaleOutcome::Metrics(MetricsRow {
        grid_ref: grid_ref.to_string(),
        scale,
        ls_amount: mean(amount, scale)?,
        ls_hetero: mean(hetero, scale)?,
        ls_both: mean(both.view(), scale)?,
    }))
}

/// Buffer the cell by half the scale, clip the land cover and summarise.
pub fn compute_scale_metrics(ctx: &LandscapeContext<'_>, grid_ref: &str, scale: u32) -> Result<ScaleOutcome> {
    if scale == 0 {
        return Err(LandscapeError::invalid_scale(scale, "scale must be positive"));
    }
    let buffer = ctx.grid.buffer(grid_ref, f64::from(scale) / 2.0)?;
    // Pixels beyond the raster extent read as no-data and trip the coastal gate
    let clip = ctx.raster.clip(&buffer, ctx.nodata)?;
    summarise_clip(grid_ref, scale, &clip, ctx.habitat, ctx.nodata)
}
