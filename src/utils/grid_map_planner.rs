// Occupancy grid for the potential-weighted A* planner
// Based on PythonRobotics implementation

use log::debug;
use nalgebra::DMatrix;

use crate::common::{GridNode, Obstacles, PlanningError, PlanningResult};
use crate::utils::GridIndexer;

/// Boolean occupancy grid inflated by the robot radius
///
/// Stored as a `(x_width, y_width)` matrix indexed by `(ix, iy)`.
#[derive(Debug, Clone)]
pub struct ObstacleMap {
    indexer: GridIndexer,
    occupancy: DMatrix<bool>,
}

impl ObstacleMap {
    /// Derive bounds from the obstacles and mark every cell within
    /// `robot_radius` of an obstacle point as occupied.
    pub fn new(obstacles: &Obstacles, resolution: f64, robot_radius: f64) -> PlanningResult<Self> {
        let indexer = GridIndexer::from_obstacles(obstacles, resolution)?;
        Self::build(indexer, obstacles, robot_radius)
    }

    /// Build the occupancy grid over already derived bounds
    pub fn build(indexer: GridIndexer, obstacles: &Obstacles, robot_radius: f64) -> PlanningResult<Self> {
        if !(robot_radius > 0.0) {
            return Err(PlanningError::InvalidParameter(
                format!("robot radius must be > 0, got {}", robot_radius),
            ));
        }

        let occupancy = DMatrix::from_fn(indexer.x_width, indexer.y_width, |ix, iy| {
            let p = indexer.grid_to_world(GridNode::new(ix as i32, iy as i32));
            obstacles.any_within(&p, robot_radius)
        });

        let map = ObstacleMap { indexer, occupancy };
        debug!(
            "obstacle map: {} of {} cells occupied",
            map.occupied_count(),
            map.indexer.cell_count()
        );
        Ok(map)
    }

    pub fn indexer(&self) -> &GridIndexer {
        &self.indexer
    }

    /// Occupancy of a cell; cells outside the grid count as occupied
    pub fn is_occupied(&self, node: GridNode) -> bool {
        if !self.indexer.contains(node) {
            return true;
        }
        self.occupancy[(node.x as usize, node.y as usize)]
    }

    /// True if the cell is inside the map and not occupied
    pub fn verify_node(&self, node: GridNode) -> bool {
        self.indexer.contains(node) && !self.occupancy[(node.x as usize, node.y as usize)]
    }

    pub fn occupied_count(&self) -> usize {
        self.occupancy.iter().filter(|&&o| o).count()
    }
}
