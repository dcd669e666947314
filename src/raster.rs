use crate::error::{LandscapeError, Result};
use geo::{BoundingRect, Polygon};
use log::debug;
use ndarray::{s, Array2};

/// Fractional pixel positions this close to a pixel edge snap onto it
const EDGE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub geotransform: [f64; 6],
    pub projection: String,
    pub nodata: Option<f64>,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl RasterMetadata {
    /// Metadata for a north-up raster with square pixels
    pub fn north_up(width: usize, height: usize, origin_x: f64, origin_y: f64, resolution: f64) -> Self {
        Self {
            width,
            height,
            geotransform: [origin_x, resolution, 0.0, origin_y, 0.0, -resolution],
            projection: String::new(),
            nodata: None,
            pixel_width: resolution,
            pixel_height: resolution,
        }
    }
}

/// Categorical land cover raster held in memory
#[derive(Debug, Clone)]
pub struct LandCoverRaster {
    data: Array2<i32>,
    metadata: RasterMetadata,
}

/// Rectangular window cut out of a [`LandCoverRaster`]
#[derive(Debug, Clone)]
pub struct ClippedRaster {
    pub data: Array2<i32>,
    /// Source raster pixel size, in map units
    pub resolution: f64,
}

impl LandCoverRaster {
    pub fn new(data: Array2<i32>, metadata: RasterMetadata) -> Result<Self> {
        let (height, width) = data.dim();
        if width == 0 || height == 0 || width != metadata.width || height != metadata.height {
            return Err(LandscapeError::InvalidDimensions(width, height));
        }
        if !(metadata.pixel_width > 0.0) {
            return Err(LandscapeError::InvalidPixelSize(metadata.pixel_width));
        }
        if metadata.geotransform[1] == 0.0 || metadata.geotransform[5] == 0.0 {
            return Err(LandscapeError::InvalidPixelSize(0.0));
        }
        Ok(Self { data, metadata })
    }

    /// North-up raster whose top-left corner sits at (origin_x, origin_y)
    pub fn from_origin(data: Array2<i32>, origin_x: f64, origin_y: f64, resolution: f64) -> Result<Self> {
        let (height, width) = data.dim();
        let metadata = RasterMetadata::north_up(width, height, origin_x, origin_y, resolution);
        Self::new(data, metadata)
    }

    pub fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }

    /// Pixel size used for window calculations (pixel width)
    pub fn resolution(&self) -> f64 {
        self.metadata.pixel_width
    }

    /// Cut the smallest pixel-aligned window covering `polygon`.
    ///
    /// Pixels are kept whole and unmasked. Parts of the window beyond the
    /// raster extent are filled with `fill`, so the window always spans the
    /// full polygon extent. Fails only when nothing of the raster is covered.
    pub fn clip(&self, polygon: &Polygon<f64>, fill: i32) -> Result<ClippedRaster> {
        let bounds = polygon
            .bounding_rect()
            .ok_or(LandscapeError::EmptyClip(f64::NAN, f64::NAN, f64::NAN, f64::NAN))?;
        let (min, max) = (bounds.min(), bounds.max());
        let empty = || LandscapeError::EmptyClip(min.x, min.y, max.x, max.y);

        let gt = &self.metadata.geotransform;
        let cols = PixelWindow::covering(pixel_span(min.x, max.x, gt[0], gt[1]));
        let rows = PixelWindow::covering(pixel_span(min.y, max.y, gt[3], gt[5]));

        let (col_min, col_max) = cols.overlap(self.metadata.width).ok_or_else(empty)?;
        let (row_min, row_max) = rows.overlap(self.metadata.height).ok_or_else(empty)?;

        let mut data = Array2::from_elem((rows.len(), cols.len()), fill);
        data.slice_mut(s![
            rows.local(row_min)..rows.local(row_max),
            cols.local(col_min)..cols.local(col_max)
        ])
        .assign(&self.data.slice(s![row_min..row_max, col_min..col_max]));

        debug!(
            "Clip [{:.1}, {:.1}]-[{:.1}, {:.1}] -> rows {}..{}, cols {}..{} ({}x{} px inside the raster)",
            min.x,
            min.y,
            max.x,
            max.y,
            rows.start,
            rows.end,
            cols.start,
            cols.end,
            col_max - col_min,
            row_max - row_min
        );

        Ok(ClippedRaster {
            data,
            resolution: self.resolution(),
        })
    }
}

/// Fractional pixel coordinates of a map-space interval along one axis
fn pixel_span(a: f64, b: f64, origin: f64, step: f64) -> (f64, f64) {
    let p = (a - origin) / step;
    let q = (b - origin) / step;
    (p.min(q), p.max(q))
}

fn snap(value: f64) -> Option<f64> {
    let nearest = value.round();
    ((value - nearest).abs() < EDGE_TOLERANCE).then_some(nearest)
}

/// Whole-pixel index range along one axis, possibly outside the raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelWindow {
    start: isize,
    end: isize,
}

impl PixelWindow {
    /// Pixels covering the fractional span [lo, hi)
    fn covering((lo, hi): (f64, f64)) -> Self {
        let start = snap(lo).unwrap_or_else(|| lo.floor()) as isize;
        let end = snap(hi).unwrap_or_else(|| hi.ceil()) as isize;
        Self {
            start,
            end: end.max(start),
        }
    }

    fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Part of the window inside [0, len), None without overlap
    fn overlap(&self, len: usize) -> Option<(usize, usize)> {
        let start = self.start.max(0);
        let end = self.end.min(len as isize);
        (start < end).then(|| (start as usize, end as usize))
    }

    /// Raster index to window-local index
    fn local(&self, index: usize) -> usize {
        (index as isize - self.start) as usize
    }
}
