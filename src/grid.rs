use crate::error::{LandscapeError, Result};
use geo::{coord, BoundingRect, Polygon, Rect};
use std::collections::HashMap;

/// Named cells of the reference grid (e.g. 10 km national grid squares)
#[derive(Debug, Clone, Default)]
pub struct ReferenceGrid {
    cells: HashMap<String, Polygon<f64>>,
}

impl ReferenceGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, grid_ref: impl Into<String>, polygon: Polygon<f64>) {
        self.cells.insert(grid_ref.into(), polygon);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, grid_ref: &str) -> bool {
        self.cells.contains_key(grid_ref)
    }

    pub fn cell(&self, grid_ref: &str) -> Result<&Polygon<f64>> {
        self.cells
            .get(grid_ref)
            .ok_or_else(|| LandscapeError::UnknownGridCell(grid_ref.to_string()))
    }

    /// Square buffer of `radius` map units around the cell's bounding box.
    pub fn buffer(&self, grid_ref: &str, radius: f64) -> Result<Polygon<f64>> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(LandscapeError::InvalidRadius(radius));
        }

        let bounds = self
            .cell(grid_ref)?
            .bounding_rect()
            .ok_or_else(|| LandscapeError::EmptyGeometry(grid_ref.to_string()))?;

        let (min, max) = (bounds.min(), bounds.max());
        let buffered = Rect::new(
            coord! { x: min.x - radius, y: min.y - radius },
            coord! { x: max.x + radius, y: max.y + radius },
        );
        Ok(buffered.to_polygon())
    }
}

impl FromIterator<(String, Polygon<f64>)> for ReferenceGrid {
    fn from_iter<I: IntoIterator<Item = (String, Polygon<f64>)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn grid_with_cell() -> ReferenceGrid {
        let mut grid = ReferenceGrid::new();
        grid.insert(
            "SU41",
            Rect::new(coord! { x: 440_000.0, y: 110_000.0 }, coord! { x: 450_000.0, y: 120_000.0 })
                .to_polygon(),
        );
        grid
    }

    #[test]
    fn test_buffer_expands_every_side() {
        let grid = grid_with_cell();
        let buffered = grid.buffer("SU41", 500.0).unwrap();
        let bounds = buffered.bounding_rect().unwrap();
        assert_eq!(bounds.min(), coord! { x: 439_500.0, y: 109_500.0 });
        assert_eq!(bounds.max(), coord! { x: 450_500.0, y: 120_500.0 });
    }

    #[test]
    fn test_unknown_cell() {
        let grid = grid_with_cell();
        match grid.buffer("NZ99", 500.0) {
            Err(LandscapeError::UnknownGridCell(grid_ref)) => assert_eq!(grid_ref, "NZ99"),
            other => panic!("expected UnknownGridCell, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_radius() {
        let grid = grid_with_cell();
        assert!(matches!(grid.buffer("SU41", 0.0), Err(LandscapeError::InvalidRadius(_))));
        assert!(matches!(grid.buffer("SU41", -1.0), Err(LandscapeError::InvalidRadius(_))));
    }

    #[test]
    fn test_empty_geometry() {
        let mut grid = ReferenceGrid::new();
        grid.insert("EMPTY", Polygon::new(LineString::new(vec![]), vec![]));
        assert!(matches!(grid.buffer("EMPTY", 10.0), Err(LandscapeError::EmptyGeometry(_))));
    }

    #[test]
    fn test_from_iterator() {
        let grid: ReferenceGrid = vec![(
            "A".to_string(),
            Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }).to_polygon(),
        )]
        .into_iter()
        .collect();
        assert_eq!(grid.len(), 1);
        assert!(grid.contains("A"));
    }
}
