//! Uniform grid bucketing for 2D spatial queries.
//!
//! Used by the stroke merger to find endpoints within tolerance and by the
//! reference color index to find the nearest colored segment.

use std::collections::HashMap;

use glam::DVec2;

/// Integer grid cell coordinate
pub type CellKey = (i64, i64);

/// Items bucketed by the grid cells they overlap.
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<T>>,
    /// Inclusive range of occupied cells (min, max)
    extent: Option<(CellKey, CellKey)>,
}

impl<T: Copy> SpatialGrid<T> {
    /// Create an empty grid. `cell_size` must be positive.
    pub fn new(cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "grid cell size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
            extent: None,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell containing a point
    pub fn cell_of(&self, point: DVec2) -> CellKey {
        (
            (point.x / self.cell_size).floor() as i64,
            (point.y / self.cell_size).floor() as i64,
        )
    }

    /// Insert an item at a single point
    pub fn insert_point(&mut self, point: DVec2, item: T) {
        let key = self.cell_of(point);
        self.insert_into(key, item);
    }

    /// Insert an item into every cell overlapped by the bounding box of `a`-`b`
    pub fn insert_segment(&mut self, a: DVec2, b: DVec2, item: T) {
        let (min_x, min_y) = self.cell_of(a.min(b));
        let (max_x, max_y) = self.cell_of(a.max(b));
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                self.insert_into((cx, cy), item);
            }
        }
    }

    fn insert_into(&mut self, key: CellKey, item: T) {
        self.cells.entry(key).or_default().push(item);
        self.extent = Some(match self.extent {
            None => (key, key),
            Some((min, max)) => (
                (min.0.min(key.0), min.1.min(key.1)),
                (max.0.max(key.0), max.1.max(key.1)),
            ),
        });
    }

    /// Items in one cell
    pub fn cell(&self, key: CellKey) -> &[T] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Items in every cell overlapping the square of half-size `radius`
    /// around `center`. Items spanning several cells may repeat.
    pub fn query_square(&self, center: DVec2, radius: f64) -> Vec<T> {
        let (min_x, min_y) = self.cell_of(center - DVec2::splat(radius));
        let (max_x, max_y) = self.cell_of(center + DVec2::splat(radius));
        let mut results = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                results.extend_from_slice(self.cell((cx, cy)));
            }
        }
        results
    }

    /// Items in the cells at Chebyshev distance exactly `ring` from `center`
    ///
    /// Only cells inside the occupied extent are visited, so the cost is
    /// bounded by the extent however far away `center` is.
    pub fn ring(&self, center: CellKey, ring: i64) -> Vec<T> {
        let mut results = Vec::new();
        let Some(((min_x, min_y), (max_x, max_y))) = self.extent else {
            return results;
        };
        if ring < 0 {
            return results;
        }
        if ring == 0 {
            results.extend_from_slice(self.cell(center));
            return results;
        }

        let (cx, cy) = center;
        let (left, right) = (cx.saturating_sub(ring), cx.saturating_add(ring));
        let (low, high) = (cy.saturating_sub(ring), cy.saturating_add(ring));
        for y in [low, high] {
            if (min_y..=max_y).contains(&y) {
                for x in left.max(min_x)..=right.min(max_x) {
                    results.extend_from_slice(self.cell((x, y)));
                }
            }
        }
        // Corners were covered by the rows
        for x in [left, right] {
            if (min_x..=max_x).contains(&x) {
                for y in low.saturating_add(1).max(min_y)..=high.saturating_sub(1).min(max_y) {
                    results.extend_from_slice(self.cell((x, y)));
                }
            }
        }
        results
    }

    /// Smallest ring around `center` that reaches an occupied cell's extent
    pub fn min_ring(&self, center: CellKey) -> Option<i64> {
        let ((min_x, min_y), (max_x, max_y)) = self.extent?;
        let gap = [
            min_x.saturating_sub(center.0),
            center.0.saturating_sub(max_x),
            min_y.saturating_sub(center.1),
            center.1.saturating_sub(max_y),
        ];
        Some(gap.into_iter().max().unwrap_or(0).max(0))
    }

    /// Largest ring around `center` that still reaches an occupied cell
    pub fn max_ring(&self, center: CellKey) -> Option<i64> {
        let ((min_x, min_y), (max_x, max_y)) = self.extent?;
        let reach = [
            center.0.saturating_sub(min_x),
            max_x.saturating_sub(center.0),
            center.1.saturating_sub(min_y),
            max_y.saturating_sub(center.1),
        ];
        Some(reach.into_iter().max().unwrap_or(0).max(0))
    }
}
