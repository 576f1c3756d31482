//! Conversion between world coordinates and grid cell indices
//!
//! The grid origin is the rounded lower-left corner of the obstacle
//! bounding box. Cell `(ix, iy)` sits at world position
//! `(ix * resolution + min_x, iy * resolution + min_y)`.

use log::debug;

use crate::common::{GridNode, Obstacles, PlanningError, PlanningResult, Point2D};

/// Bounds and resolution of a planning grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridIndexer {
    pub resolution: f64,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub x_width: usize,
    pub y_width: usize,
}

impl GridIndexer {
    /// Derive grid bounds from the bounding box of the obstacle points
    pub fn from_obstacles(obstacles: &Obstacles, resolution: f64) -> PlanningResult<Self> {
        if obstacles.is_empty() {
            return Err(PlanningError::EmptyObstacleSet);
        }
        if !(resolution > 0.0) {
            return Err(PlanningError::InvalidParameter(
                format!("resolution must be > 0, got {}", resolution),
            ));
        }

        let xs = obstacles.x_coords();
        let ys = obstacles.y_coords();
        let min_x = xs.iter().fold(f64::INFINITY, |a, &b| a.min(b)).round();
        let min_y = ys.iter().fold(f64::INFINITY, |a, &b| a.min(b)).round();
        let max_x = xs.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)).round();
        let max_y = ys.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)).round();

        let x_width = ((max_x - min_x) / resolution).round() as usize;
        let y_width = ((max_y - min_y) / resolution).round() as usize;

        debug!(
            "grid bounds x: [{}, {}], y: [{}, {}], width: {} x {}",
            min_x, max_x, min_y, max_y, x_width, y_width
        );

        Ok(GridIndexer { resolution, min_x, min_y, max_x, max_y, x_width, y_width })
    }

    /// `round((position - min_position) / resolution)`
    pub fn to_index(position: f64, min_position: f64, resolution: f64) -> i32 {
        ((position - min_position) / resolution).round() as i32
    }

    /// `index * resolution + min_position`
    pub fn to_world(index: i32, min_position: f64, resolution: f64) -> f64 {
        f64::from(index) * resolution + min_position
    }

    pub fn calc_x_index(&self, x: f64) -> i32 {
        Self::to_index(x, self.min_x, self.resolution)
    }

    pub fn calc_y_index(&self, y: f64) -> i32 {
        Self::to_index(y, self.min_y, self.resolution)
    }

    pub fn calc_x_position(&self, ix: i32) -> f64 {
        Self::to_world(ix, self.min_x, self.resolution)
    }

    pub fn calc_y_position(&self, iy: i32) -> f64 {
        Self::to_world(iy, self.min_y, self.resolution)
    }

    pub fn world_to_grid(&self, p: Point2D) -> GridNode {
        GridNode::new(self.calc_x_index(p.x), self.calc_y_index(p.y))
    }

    pub fn grid_to_world(&self, node: GridNode) -> Point2D {
        Point2D::new(self.calc_x_position(node.x), self.calc_y_position(node.y))
    }

    /// Whether the cell lies inside `[min, max)` on both axes
    pub fn contains(&self, node: GridNode) -> bool {
        node.x >= 0
            && node.y >= 0
            && (node.x as usize) < self.x_width
            && (node.y as usize) < self.y_width
    }

    pub fn cell_count(&self) -> usize {
        self.x_width * self.y_width
    }

    /// Row-major key of an in-bounds cell, `iy * x_width + ix`.
    ///
    /// Returns `None` for cells outside the grid, where the key would
    /// collide with a cell on another row.
    pub fn calc_grid_index(&self, node: GridNode) -> Option<usize> {
        if self.contains(node) {
            Some(node.y as usize * self.x_width + node.x as usize)
        } else {
            None
        }
    }
}
