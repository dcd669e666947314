use crate::classify::HabitatSet;
use crate::error::{LandscapeError, Result};
use log::debug;
use ndarray::Array2;
use rayon::prelude::*;
use std::collections::HashMap;

/// Convert a scale in metres to a window side in pixels.
///
/// Uses `f64::round`, i.e. halves round away from zero (1010 m at 20 m
/// resolution gives a 51 pixel window).
pub fn window_cells(scale: u32, resolution: f64) -> Result<usize> {
    if scale == 0 {
        return Err(LandscapeError::invalid_scale(scale, "scale must be positive"));
    }
    if !(resolution > 0.0) || !resolution.is_finite() {
        return Err(LandscapeError::InvalidPixelSize(resolution));
    }

    let cells = (f64::from(scale) / resolution).round();
    if !(cells <= isize::MAX as f64) {
        return Err(LandscapeError::invalid_scale(
            scale,
            format!("window is too wide at {} m resolution", resolution),
        ));
    }
    if cells < 1.0 {
        return Err(LandscapeError::invalid_scale(
            scale,
            format!("window is narrower than one {} m pixel", resolution),
        ));
    }

    Ok(cells as usize)
}

/// Offset of the first window row/column relative to the centre pixel.
/// Even sides put the extra pixel before the centre.
#[inline]
fn window_start(size: usize) -> isize {
    -((size / 2) as isize)
}

/// Toroidal index: positions past an edge continue from the opposite edge
#[inline]
fn wrap(center: usize, offset: isize, len: usize) -> usize {
    (center as isize + offset).rem_euclid(len as isize) as usize
}

/// Copy out the wrap-around window of side `size` centred on (row, col).
pub fn wrapped_window(data: &Array2<i32>, row: usize, col: usize, size: usize) -> Array2<i32> {
    let (nrows, ncols) = data.dim();
    let start = window_start(size);
    Array2::from_shape_fn((size, size), |(i, j)| {
        data[[
            wrap(row, start + i as isize, nrows),
            wrap(col, start + j as isize, ncols),
        ]]
    })
}

/// Fraction of window pixels whose class is habitat, in [0, 1]
pub fn amount_at<'a, I>(window: I, habitat: &HabitatSet) -> f64
where
    I: IntoIterator<Item = &'a i32>,
{
    let mut habitat_count = 0usize;
    let mut total = 0usize;
    for &value in window {
        total += 1;
        if habitat.contains(value) {
            habitat_count += 1;
        }
    }

    if total > 0 {
        habitat_count as f64 / total as f64
    } else {
        0.0
    }
}

/// Shannon diversity over every class present in the window.
///
/// Not restricted to the habitat set; no-data pixels count as a class of
/// their own.
pub fn shannon_at<'a, I>(window: I) -> f64
where
    I: IntoIterator<Item = &'a i32>,
{
    let mut histogram = ClassHistogram::default();
    for &value in window {
        histogram.add(value);
    }
    histogram.shannon()
}

/// Class counts of the current window, updated column by column as the
/// window slides along a row.
#[derive(Debug, Default)]
struct ClassHistogram {
    counts: HashMap<i32, usize>,
    total: usize,
}

impl ClassHistogram {
    fn add(&mut self, value: i32) {
        *self.counts.entry(value).or_insert(0) += 1;
        self.total += 1;
    }

    fn remove(&mut self, value: i32) {
        if let Some(count) = self.counts.get_mut(&value) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&value);
            }
            self.total -= 1;
        }
    }

    fn proportion(&self, habitat: &HabitatSet) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let habitat_count: usize = self
            .counts
            .iter()
            .filter(|(class_value, _)| habitat.contains(**class_value))
            .map(|(_, count)| count)
            .sum();
        habitat_count as f64 / self.total as f64
    }

    fn shannon(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        let mut h = 0.0;
        for &count in self.counts.values() {
            let p = count as f64 / total;
            if p > 0.0 {
                h -= p * p.ln();
            }
        }
        h
    }
}

/// Slide a wrap-around window along one row, scoring every position.
fn sweep_row<T, F>(data: &Array2<i32>, row: usize, size: usize, score: &F) -> Vec<T>
where
    F: Fn(&ClassHistogram) -> T,
{
    let (nrows, ncols) = data.dim();
    let start = window_start(size);
    let window_rows: Vec<usize> = (0..size)
        .map(|i| wrap(row, start + i as isize, nrows))
        .collect();

    let mut histogram = ClassHistogram::default();
    for j in 0..size {
        let c = wrap(0, start + j as isize, ncols);
        for &r in &window_rows {
            histogram.add(data[[r, c]]);
        }
    }

    let mut scores = Vec::with_capacity(ncols);
    scores.push(score(&histogram));

    for col in 1..ncols {
        let leaving = wrap(col - 1, start, ncols);
        let entering = wrap(col, start + size as isize - 1, ncols);
        for &r in &window_rows {
            histogram.remove(data[[r, leaving]]);
            histogram.add(data[[r, entering]]);
        }
        scores.push(score(&histogram));
    }

    scores
}

/// Apply `score` to the window around every pixel, rows in parallel
fn focal_map<T, F>(data: &Array2<i32>, size: usize, score: F) -> Result<Array2<T>>
where
    T: Send,
    F: Fn(&ClassHistogram) -> T + Sync,
{
    let (nrows, ncols) = data.dim();
    if nrows == 0 || ncols == 0 {
        return Err(LandscapeError::InvalidDimensions(ncols, nrows));
    }
    debug_assert!(size > 0, "window side must be at least one pixel");

    let rows: Vec<Vec<T>> = (0..nrows)
        .into_par_iter()
        .map(|row| sweep_row(data, row, size, &score))
        .collect();

    let flat: Vec<T> = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((nrows, ncols), flat)?)
}

/// Habitat proportion in the window around each pixel (not yet gated)
pub fn habitat_amount(data: &Array2<i32>, size: usize, habitat: &HabitatSet) -> Result<Array2<f64>> {
    focal_map(data, size, |histogram| histogram.proportion(habitat))
}

/// Shannon diversity of the window around each pixel
pub fn habitat_heterogeneity(data: &Array2<i32>, size: usize) -> Result<Array2<f64>> {
    focal_map(data, size, ClassHistogram::shannon)
}

#[derive(Debug, Clone)]
pub struct FocalMetrics {
    /// Window habitat proportion, zeroed where the centre pixel is not habitat
    pub amount: Array2<f64>,
    pub heterogeneity: Array2<f64>,
}

/// Compute both window metrics in one pass over the grid.
pub fn compute_focal_metrics(
    data: &Array2<i32>,
    mask: &Array2<bool>,
    size: usize,
    habitat: &HabitatSet,
) -> Result<FocalMetrics> {
    if mask.dim() != data.dim() {
        let (nrows, ncols) = mask.dim();
        return Err(LandscapeError::InvalidDimensions(ncols, nrows));
    }

    debug!(
        "Focal pass over {}x{} pixels with a {} pixel window",
        data.ncols(),
        data.nrows(),
        size
    );

    let both = focal_map(data, size, |histogram| {
        (histogram.proportion(habitat), histogram.shannon())
    })?;

    let mut amount = both.mapv(|(proportion, _)| proportion);
    amount.zip_mut_with(mask, |value, &is_habitat| {
        if !is_habitat {
            *value = 0.0;
        }
    });
    let heterogeneity = both.mapv(|(_, shannon)| shannon);

    Ok(FocalMetrics {
        amount,
        heterogeneity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    /// Deterministic pseudo-random class grid
    fn scrambled_grid(nrows: usize, ncols: usize, classes: i32) -> Array2<i32> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        Array2::from_shape_fn((nrows, ncols), |_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((state >> 33) % classes as u64) as i32 + 1
        })
    }

    #[test]
    fn test_window_cells_exact() {
        assert_eq!(window_cells(1000, 25.0).unwrap(), 40);
        assert_eq!(window_cells(1500, 25.0).unwrap(), 60);
        assert_eq!(window_cells(2000, 25.0).unwrap(), 80);
    }

    #[test]
    fn test_window_cells_rounds_half_away_from_zero() {
        assert_eq!(window_cells(1010, 20.0).unwrap(), 51); // 50.5
        assert_eq!(window_cells(1030, 20.0).unwrap(), 52); // 51.5
        assert_eq!(window_cells(1009, 20.0).unwrap(), 50); // 50.45
        assert_eq!(window_cells(5, 2.0).unwrap(), 3); // 2.5
    }

    #[test]
    fn test_window_cells_rejects_sub_pixel_scale() {
        assert!(matches!(
            window_cells(10, 25.0),
            Err(LandscapeError::InvalidScale { scale: 10, .. })
        ));
        assert!(window_cells(0, 25.0).is_err());
        assert!(window_cells(1000, 0.0).is_err());
    }

    #[test]
    fn test_window_cells_rejects_unbounded_window() {
        assert!(matches!(
            window_cells(u32::MAX, 1e-300),
            Err(LandscapeError::InvalidScale { .. })
        ));
        assert!(window_cells(u32::MAX, f64::MIN_POSITIVE).is_err());
    }

    #[test]
    fn test_wrapped_window_reaches_opposite_corner() {
        let mut data = Array2::from_elem((5, 5), 1);
        data[[4, 4]] = 99;

        let window = wrapped_window(&data, 0, 0, 3);
        assert_eq!(window[[0, 0]], 99);
        assert_eq!(window.iter().filter(|&&v| v == 99).count(), 1);

        // A window centred well inside the grid never sees the marker
        let inner = wrapped_window(&data, 2, 2, 3);
        assert!(inner.iter().all(|&v| v == 1));
    }

    #[test]
    fn test_wrapped_window_even_side_offsets() {
        let data = arr2(&[[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12], [13, 14, 15, 16]]);
        // Side 2 covers offsets -1..=0
        let window = wrapped_window(&data, 0, 0, 2);
        assert_eq!(window, arr2(&[[16, 13], [4, 1]]));
    }

    #[test]
    fn test_amount_at_bounds() {
        let habitat = HabitatSet::farmland();
        assert_abs_diff_eq!(amount_at(&[1, 2, 3, 4], &habitat), 1.0);
        assert_abs_diff_eq!(amount_at(&[12, 13, 14, 0], &habitat), 0.0);
        assert_abs_diff_eq!(amount_at(&[1, 12, 2, 0], &habitat), 0.5);
    }

    #[test]
    fn test_shannon_single_class_is_zero() {
        assert_abs_diff_eq!(shannon_at(&[7; 9]), 0.0);
    }

    #[test]
    fn test_shannon_equal_classes_is_ln_k() {
        assert_abs_diff_eq!(shannon_at(&[1, 2, 1, 2]), 2f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(shannon_at(&[1, 2, 3, 4, 5, 6]), 6f64.ln(), epsilon = 1e-12);
        // Uneven frequencies stay below the maximum
        assert!(shannon_at(&[1, 1, 1, 2]) < 2f64.ln());
    }

    #[test]
    fn test_shannon_counts_nodata_as_a_class() {
        assert_abs_diff_eq!(shannon_at(&[0, 5, 0, 5]), 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_sliding_window_matches_direct_computation() {
        let data = scrambled_grid(7, 9, 4);
        let habitat = HabitatSet::new([1, 3]);

        for size in 1..=10 {
            let amount = habitat_amount(&data, size, &habitat).unwrap();
            let hetero = habitat_heterogeneity(&data, size).unwrap();
            for ((row, col), &value) in amount.indexed_iter() {
                let window = wrapped_window(&data, row, col, size);
                assert_abs_diff_eq!(value, amount_at(&window, &habitat), epsilon = 1e-12);
                assert_abs_diff_eq!(hetero[[row, col]], shannon_at(&window), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_uniform_grid_metrics() {
        let data = Array2::from_elem((9, 9), 5);
        let habitat = HabitatSet::farmland();
        let mask = classify(&data, &habitat);
        let metrics = compute_focal_metrics(&data, &mask, 3, &habitat).unwrap();

        assert!(metrics.amount.iter().all(|&v| (v - 1.0).abs() < 1e-12));
        assert!(metrics.heterogeneity.iter().all(|&v| v.abs() < 1e-12));
    }

    #[test]
    fn test_checkerboard_metrics() {
        let data = Array2::from_shape_fn((8, 8), |(r, c)| if (r + c) % 2 == 0 { 1 } else { 2 });
        let habitat = HabitatSet::farmland();
        let mask = classify(&data, &habitat);

        for size in [2, 4] {
            let metrics = compute_focal_metrics(&data, &mask, size, &habitat).unwrap();
            for &v in metrics.heterogeneity.iter() {
                assert_abs_diff_eq!(v, 2f64.ln(), epsilon = 1e-12);
            }
            for &v in metrics.amount.iter() {
                assert_abs_diff_eq!(v, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_amount_is_gated_by_centre_pixel() {
        let data = arr2(&[[1, 1, 1], [1, 20, 1], [1, 1, 1]]);
        let habitat = HabitatSet::farmland();
        let mask = classify(&data, &habitat);
        let metrics = compute_focal_metrics(&data, &mask, 3, &habitat).unwrap();

        // Every wrapped 3x3 window holds the whole grid: 8 of 9 habitat
        assert_abs_diff_eq!(metrics.amount[[1, 1]], 0.0);
        assert_abs_diff_eq!(metrics.amount[[0, 0]], 8.0 / 9.0, epsilon = 1e-12);
        // Heterogeneity is not gated
        assert!(metrics.heterogeneity[[1, 1]] > 0.0);
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let data = Array2::from_elem((3, 3), 1);
        let mask = Array2::from_elem((2, 3), true);
        assert!(compute_focal_metrics(&data, &mask, 3, &HabitatSet::farmland()).is_err());
    }
}
