//! Common traits defining interfaces for planners

use crate::common::types::*;
use crate::common::error::PlanningError;

/// Trait for path planning algorithms
pub trait PathPlanner {
    /// Plan a path from start to goal
    fn plan(&self, start: Point2D, goal: Point2D) -> Result<Path2D, PlanningError>;
}
