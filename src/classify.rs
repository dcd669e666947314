use ndarray::Array2;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Land-cover classes used by the farmland indicator species.
pub const FARMLAND_CLASSES: RangeInclusive<i32> = 1..=11;

/// Set of land-cover class codes counted as habitat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitatSet {
    classes: BTreeSet<i32>,
}

impl HabitatSet {
    pub fn new<I: IntoIterator<Item = i32>>(classes: I) -> Self {
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    /// Classes 1-11 of the land cover map
    pub fn farmland() -> Self {
        Self::new(FARMLAND_CLASSES)
    }

    #[inline]
    pub fn contains(&self, class_value: i32) -> bool {
        self.classes.contains(&class_value)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for HabitatSet {
    fn default() -> Self {
        Self::farmland()
    }
}

/// Boolean habitat mask with the same shape as `data`.
/// Anything outside the set, no-data included, maps to false.
pub fn classify(data: &Array2<i32>, habitat: &HabitatSet) -> Array2<bool> {
    data.mapv(|value| habitat.contains(value))
}
