//! Utility modules for potential_astar

pub mod grid_indexer;
pub mod grid_map_planner;
pub mod visualization;

pub use grid_indexer::*;
pub use grid_map_planner::*;
pub use visualization::{Visualizer, PathStyle, PointStyle, colors};
