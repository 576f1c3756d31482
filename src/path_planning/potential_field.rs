//! Artificial potential field over the planning grid
//!
//! Each cell carries an attractive term that grows linearly with the
//! distance to the goal and a repulsive term that is non-zero only within
//! the influence radius of the nearest obstacle. The summed field is
//! rescaled into `[0, 1]` and used to weight the A* heuristic.

use itertools::{Itertools, MinMaxResult};
use log::{debug, warn};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::common::{GridNode, Obstacles, PlanningError, PlanningResult, Point2D};
use crate::utils::GridIndexer;

// Parameters
pub const KP: f64 = 5.0;  // attractive potential gain
pub const ETA: f64 = 100.0;  // repulsive potential gain
pub const MIN_OBSTACLE_DISTANCE: f64 = 0.1;  // floor for the repulsive distance [m]

/// Gains and radii of the potential field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotentialFieldConfig {
    /// Attractive potential gain
    pub kp: f64,
    /// Repulsive potential gain
    pub eta: f64,
    /// Repulsion cut-off; the robot radius is used when unset
    pub influence_radius: Option<f64>,
    /// Obstacle distances below this are clamped before inversion
    pub min_distance: f64,
}

impl Default for PotentialFieldConfig {
    fn default() -> Self {
        Self {
            kp: KP,
            eta: ETA,
            influence_radius: None,
            min_distance: MIN_OBSTACLE_DISTANCE,
        }
    }
}

impl PotentialFieldConfig {
    pub fn validate(&self) -> PlanningResult<()> {
        if !self.kp.is_finite() || !self.eta.is_finite() {
            return Err(PlanningError::InvalidParameter(
                format!("potential gains must be finite, got kp={} eta={}", self.kp, self.eta),
            ));
        }
        if let Some(rr) = self.influence_radius {
            if !(rr > 0.0) {
                return Err(PlanningError::InvalidParameter(
                    format!("influence radius must be > 0, got {}", rr),
                ));
            }
        }
        if !(self.min_distance > 0.0) {
            return Err(PlanningError::InvalidParameter(
                format!("minimum obstacle distance must be > 0, got {}", self.min_distance),
            ));
        }
        Ok(())
    }
}

/// Normalized potential field, one value per grid cell
#[derive(Debug, Clone)]
pub struct PotentialField {
    values: DMatrix<f64>,
    raw_min: f64,
    raw_max: f64,
    degenerate: bool,
}

impl PotentialField {
    /// Compute and normalize the field for `goal` over the cells of `indexer`
    pub fn compute(
        indexer: &GridIndexer,
        obstacles: &Obstacles,
        goal: Point2D,
        influence_radius: f64,
        config: &PotentialFieldConfig,
    ) -> Self {
        let raw = DMatrix::from_fn(indexer.x_width, indexer.y_width, |ix, iy| {
            let p = indexer.grid_to_world(GridNode::new(ix as i32, iy as i32));
            let ug = calc_attractive_potential(&p, &goal, config.kp);
            let uo = calc_repulsive_potential(&p, obstacles, influence_radius, config);
            ug + uo
        });
        Self::normalize(raw)
    }

    /// Rescale raw values into `[0, 1]` by the global min and max.
    ///
    /// A uniform (or empty) field cannot be rescaled; every value is set
    /// to 0 and the field is flagged as degenerate.
    pub fn normalize(raw: DMatrix<f64>) -> Self {
        let (raw_min, raw_max) = match raw.iter().copied().minmax() {
            MinMaxResult::MinMax(min, max) => (min, max),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::NoElements => (0.0, 0.0),
        };

        let span = raw_max - raw_min;
        if span > 0.0 {
            debug!("potential field range [{}, {}]", raw_min, raw_max);
            let values = raw.map(|v| ((v - raw_min) / span).clamp(0.0, 1.0));
            PotentialField { values, raw_min, raw_max, degenerate: false }
        } else {
            warn!("potential field is uniform ({}), using a zero field", raw_min);
            let values = DMatrix::zeros(raw.nrows(), raw.ncols());
            PotentialField { values, raw_min, raw_max, degenerate: true }
        }
    }

    /// Normalized value at a cell, `None` outside the grid
    pub fn value(&self, node: GridNode) -> Option<f64> {
        if node.x < 0 || node.y < 0 {
            return None;
        }
        self.values.get((node.x as usize, node.y as usize)).copied()
    }

    /// Normalized values as an `(x_width, y_width)` matrix
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Minimum and maximum before normalization
    pub fn raw_range(&self) -> (f64, f64) {
        (self.raw_min, self.raw_max)
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Fail with `DegenerateField` for callers that need a non-uniform field
    pub fn ensure_non_degenerate(&self) -> PlanningResult<()> {
        if self.degenerate {
            Err(PlanningError::DegenerateField { value: self.raw_min })
        } else {
            Ok(())
        }
    }
}

/// `0.5 * kp * |p - goal|`
pub fn calc_attractive_potential(p: &Point2D, goal: &Point2D, kp: f64) -> f64 {
    0.5 * kp * p.distance(goal)
}

/// `0.5 * eta * (1/dq - 1/rr)^2` for the nearest obstacle within `rr`, else 0
pub fn calc_repulsive_potential(
    p: &Point2D,
    obstacles: &Obstacles,
    influence_radius: f64,
    config: &PotentialFieldConfig,
) -> f64 {
    let dq = match obstacles.nearest_distance(p) {
        Some(d) => d,
        None => return 0.0,
    };

    if dq <= influence_radius {
        let dq = dq.max(config.min_distance);
        0.5 * config.eta * (1.0 / dq - 1.0 / influence_radius).powi(2)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner_obstacles() -> Obstacles {
        Obstacles::from_xy(&[0.0, 10.0, 5.0], &[0.0, 10.0, 5.0])
    }

    #[test]
    fn test_attractive_potential_is_linear() {
        let goal = Point2D::new(0.0, 0.0);
        let a = calc_attractive_potential(&Point2D::new(3.0, 4.0), &goal, 2.0);
        let b = calc_attractive_potential(&Point2D::new(6.0, 8.0), &goal, 2.0);
        assert!((a - 5.0).abs() < 1e-12);
        assert!((b - 2.0 * a).abs() < 1e-12);
    }

    #[test]
    fn test_repulsive_potential_outside_radius_is_zero() {
        let obstacles = Obstacles::from_xy(&[0.0], &[0.0]);
        let config = PotentialFieldConfig::default();
        let u = calc_repulsive_potential(&Point2D::new(2.0, 0.0), &obstacles, 1.0, &config);
        assert_eq!(u, 0.0);
    }

    #[test]
    fn test_repulsive_potential_is_clamped() {
        let obstacles = Obstacles::from_xy(&[0.0], &[0.0]);
        let config = PotentialFieldConfig::default();
        let at_obstacle = calc_repulsive_potential(&Point2D::origin(), &obstacles, 1.0, &config);
        let at_floor = calc_repulsive_potential(&Point2D::new(0.1, 0.0), &obstacles, 1.0, &config);
        let expected = 0.5 * ETA * (1.0 / 0.1 - 1.0_f64).powi(2);
        assert!((at_obstacle - expected).abs() < 1e-9);
        assert!((at_floor - expected).abs() < 1e-9);

        let farther = calc_repulsive_potential(&Point2D::new(0.5, 0.0), &obstacles, 1.0, &config);
        assert!(farther < at_floor);
        assert!(farther > 0.0);
    }

    #[test]
    fn test_field_is_normalized() {
        let obstacles = corner_obstacles();
        let indexer = GridIndexer::from_obstacles(&obstacles, 0.5).unwrap();
        let config = PotentialFieldConfig::default();
        let field = PotentialField::compute(&indexer, &obstacles, Point2D::new(8.0, 2.0), 2.0, &config);

        assert!(!field.is_degenerate());
        assert!(field.values().iter().all(|&v| (0.0..=1.0).contains(&v)));
        let max = field.values().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = field.values().iter().cloned().fold(f64::INFINITY, f64::min);
        assert!((max - 1.0).abs() < 1e-12);
        assert!(min.abs() < 1e-12);
    }

    #[test]
    fn test_goal_cell_is_minimum_away_from_obstacles() {
        let obstacles = corner_obstacles();
        let indexer = GridIndexer::from_obstacles(&obstacles, 1.0).unwrap();
        let config = PotentialFieldConfig::default();
        let goal = Point2D::new(8.0, 2.0);
        let field = PotentialField::compute(&indexer, &obstacles, goal, 1.0, &config);

        let goal_value = field.value(indexer.world_to_grid(goal)).unwrap();
        assert!(goal_value.abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_field_is_zero() {
        let raw = DMatrix::from_element(3, 4, 7.5);
        let field = PotentialField::normalize(raw);
        assert!(field.is_degenerate());
        assert!(field.values().iter().all(|&v| v == 0.0));
        assert_eq!(field.raw_range(), (7.5, 7.5));
        assert!(matches!(
            field.ensure_non_degenerate(),
            Err(PlanningError::DegenerateField { .. })
        ));
    }

    #[test]
    fn test_empty_field_is_degenerate() {
        let field = PotentialField::normalize(DMatrix::zeros(0, 5));
        assert!(field.is_degenerate());
        assert_eq!(field.value(GridNode::new(0, 0)), None);
    }

    #[test]
    fn test_value_outside_grid() {
        let field = PotentialField::normalize(DMatrix::from_fn(2, 2, |i, j| (i + j) as f64));
        assert_eq!(field.value(GridNode::new(-1, 0)), None);
        assert_eq!(field.value(GridNode::new(2, 0)), None);
        assert_eq!(field.value(GridNode::new(1, 1)), Some(1.0));
        assert!(field.ensure_non_degenerate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(PotentialFieldConfig::default().validate().is_ok());
        let bad = PotentialFieldConfig { influence_radius: Some(-1.0), ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = PotentialFieldConfig { kp: f64::NAN, ..Default::default() };
        assert!(bad.validate().is_err());
    }
}
