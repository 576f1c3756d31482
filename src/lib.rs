//! potential_astar - grid A* guided by an artificial potential field
//!
//! The planner builds an occupancy grid from obstacle points, computes a
//! normalized attractive/repulsive potential field for the goal, and runs
//! an 8-connected A* search whose heuristic is scaled by that field.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod path_planning;

// Re-export common types for convenience
pub use common::{Point2D, Path2D, GridNode, Obstacles, Endpoint};
pub use common::PathPlanner;
pub use common::{PlanningError, PlanningResult};
pub use path_planning::{plan, PlannedPath, PotentialAStarConfig, PotentialAStarPlanner};
pub use path_planning::{PotentialField, PotentialFieldConfig};
