//! Potential-field weighted A* path planning
//!
//! Grid A* over an 8-connected motion model where the Euclidean heuristic
//! of each node is scaled by the normalized artificial potential of its
//! cell. Cells near obstacles carry a high potential, so the search is
//! pulled toward the goal while keeping clearance from obstacles.
//!
//! `heuristic(n) = weight * |n - goal| * field(n)`
//!
//! The field only ever shrinks the Euclidean estimate; optimality of the
//! returned path is not guaranteed.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::path::Path;

use log::{info, trace, warn};
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::common::{
    Endpoint, GridNode, Obstacles, Path2D, PathPlanner, PlanningError, PlanningResult, Point2D,
};
use crate::path_planning::path_reconstruction::calc_final_path;
use crate::path_planning::potential_field::{PotentialField, PotentialFieldConfig};
use crate::utils::{GridIndexer, ObstacleMap};

/// Configuration for the potential-weighted A* planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotentialAStarConfig {
    /// Grid resolution in meters
    pub resolution: f64,
    /// Robot radius for obstacle inflation
    pub robot_radius: f64,
    /// Heuristic weight
    pub heuristic_weight: f64,
    /// Potential field gains
    pub potential: PotentialFieldConfig,
}

impl Default for PotentialAStarConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            robot_radius: 0.5,
            heuristic_weight: 1.0,
            potential: PotentialFieldConfig::default(),
        }
    }
}

impl PotentialAStarConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> PlanningResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> PlanningResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlanningResult<()> {
        if !(self.resolution > 0.0) {
            return Err(PlanningError::InvalidParameter(
                format!("resolution must be > 0, got {}", self.resolution),
            ));
        }
        if !(self.robot_radius > 0.0) {
            return Err(PlanningError::InvalidParameter(
                format!("robot radius must be > 0, got {}", self.robot_radius),
            ));
        }
        if !(self.heuristic_weight >= 0.0) || !self.heuristic_weight.is_finite() {
            return Err(PlanningError::InvalidParameter(
                format!("heuristic weight must be finite and >= 0, got {}", self.heuristic_weight),
            ));
        }
        self.potential.validate()
    }

    fn influence_radius(&self) -> f64 {
        self.potential.influence_radius.unwrap_or(self.robot_radius)
    }
}

/// Search node: grid cell, accumulated cost and parent key
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub x: i32,
    pub y: i32,
    pub cost: f64,
    pub parent_index: Option<usize>,
}

impl Node {
    pub fn new(x: i32, y: i32, cost: f64, parent_index: Option<usize>) -> Self {
        Node { x, y, cost, parent_index }
    }

    pub fn grid_node(&self) -> GridNode {
        GridNode::new(self.x, self.y)
    }
}

/// Outcome of a successful search
#[derive(Debug, Clone)]
pub struct PlannedPath {
    /// Waypoints from start to goal in world coordinates
    pub path: Path2D,
    /// Accumulated motion cost in grid units
    pub cost: f64,
    /// Goal cell
    pub goal: GridNode,
    /// Cells in the order they were closed
    pub expanded: Vec<GridNode>,
}

/// Potential-field weighted A* planner
///
/// The obstacle map is built once; each query computes its own potential
/// field and open/closed sets.
pub struct PotentialAStarPlanner {
    obstacles: Obstacles,
    grid_map: ObstacleMap,
    config: PotentialAStarConfig,
}

impl PotentialAStarPlanner {
    /// Create a new planner with obstacle positions
    pub fn new(obstacles: Obstacles, config: PotentialAStarConfig) -> PlanningResult<Self> {
        config.validate()?;
        let grid_map = ObstacleMap::new(&obstacles, config.resolution, config.robot_radius)?;
        Ok(PotentialAStarPlanner { obstacles, grid_map, config })
    }

    /// Create from obstacle x/y vectors with default gains
    pub fn from_obstacles(
        ox: &[f64],
        oy: &[f64],
        resolution: f64,
        robot_radius: f64,
    ) -> PlanningResult<Self> {
        if ox.len() != oy.len() {
            return Err(PlanningError::InvalidParameter(
                format!("obstacle x/y lengths differ: {} vs {}", ox.len(), oy.len()),
            ));
        }
        let config = PotentialAStarConfig {
            resolution,
            robot_radius,
            ..Default::default()
        };
        Self::new(Obstacles::from_xy(ox, oy), config)
    }

    /// Plan a path returning (rx, ry) vectors (legacy interface)
    pub fn planning(&self, sx: f64, sy: f64, gx: f64, gy: f64) -> Option<(Vec<f64>, Vec<f64>)> {
        match self.plan(Point2D::new(sx, sy), Point2D::new(gx, gy)) {
            Ok(path) => Some((path.x_coords(), path.y_coords())),
            Err(e) => {
                warn!("planning from ({}, {}) to ({}, {}) failed: {}", sx, sy, gx, gy, e);
                None
            }
        }
    }

    /// Get reference to the grid map
    pub fn grid_map(&self) -> &ObstacleMap {
        &self.grid_map
    }

    /// Potential field for `goal`, as used to weight the heuristic
    pub fn potential_field(&self, goal: Point2D) -> PlanningResult<PotentialField> {
        calc_grid_node(self.grid_map.indexer(), goal, Endpoint::Goal)?;
        Ok(self.calc_potential_field(goal))
    }

    /// Run a search and report path, cost and expansion order
    pub fn search(&self, start: Point2D, goal: Point2D) -> PlanningResult<PlannedPath> {
        let indexer = self.grid_map.indexer();
        let start_node = calc_grid_node(indexer, start, Endpoint::Start)?;
        let goal_node = calc_grid_node(indexer, goal, Endpoint::Goal)?;

        let field = self.calc_potential_field(goal);
        run_search(&self.grid_map, &field, start_node, goal_node, self.config.heuristic_weight)
    }

    fn calc_potential_field(&self, goal: Point2D) -> PotentialField {
        PotentialField::compute(
            self.grid_map.indexer(),
            &self.obstacles,
            goal,
            self.config.influence_radius(),
            &self.config.potential,
        )
    }
}

impl PathPlanner for PotentialAStarPlanner {
    fn plan(&self, start: Point2D, goal: Point2D) -> Result<Path2D, PlanningError> {
        self.search(start, goal).map(|planned| planned.path)
    }
}

/// One-shot planning query.
///
/// Bounds are derived and start/goal are checked before the obstacle map
/// or the potential field is allocated.
pub fn plan(
    obstacles: &Obstacles,
    start: Point2D,
    goal: Point2D,
    config: &PotentialAStarConfig,
) -> PlanningResult<PlannedPath> {
    config.validate()?;
    let indexer = GridIndexer::from_obstacles(obstacles, config.resolution)?;
    let start_node = calc_grid_node(&indexer, start, Endpoint::Start)?;
    let goal_node = calc_grid_node(&indexer, goal, Endpoint::Goal)?;

    let grid_map = ObstacleMap::build(indexer, obstacles, config.robot_radius)?;
    let field = PotentialField::compute(
        grid_map.indexer(),
        obstacles,
        goal,
        config.influence_radius(),
        &config.potential,
    );
    run_search(&grid_map, &field, start_node, goal_node, config.heuristic_weight)
}

fn calc_grid_node(indexer: &GridIndexer, p: Point2D, which: Endpoint) -> PlanningResult<GridNode> {
    let node = indexer.world_to_grid(p);
    if indexer.contains(node) {
        Ok(node)
    } else {
        Err(PlanningError::OutOfBounds { which, x: p.x, y: p.y })
    }
}

fn get_motion_model() -> [(i32, i32, f64); 8] {
    // dx, dy, cost
    [
        (1, 0, 1.0),
        (0, 1, 1.0),
        (-1, 0, 1.0),
        (0, -1, 1.0),
        (-1, -1, std::f64::consts::SQRT_2),
        (-1, 1, std::f64::consts::SQRT_2),
        (1, -1, std::f64::consts::SQRT_2),
        (1, 1, std::f64::consts::SQRT_2),
    ]
}

fn calc_heuristic(node: GridNode, goal: GridNode, field: &PotentialField, weight: f64) -> f64 {
    let p = field.values()[(node.x as usize, node.y as usize)];
    weight * node.distance(&goal) * p
}

fn calc_priority(
    node: &Node,
    goal: GridNode,
    field: &PotentialField,
    weight: f64,
) -> PlanningResult<NotNan<f64>> {
    let f = node.cost + calc_heuristic(node.grid_node(), goal, field, weight);
    NotNan::new(f).map_err(|_| {
        PlanningError::InvalidParameter(format!("priority of ({}, {}) is NaN", node.x, node.y))
    })
}

/// A* expansion loop.
///
/// The open set is a hash map of the best known node per key plus a
/// min-heap of `(f, key)`; superseded heap entries are skipped when
/// popped. Equal `f` values resolve to the lowest key.
fn run_search(
    grid_map: &ObstacleMap,
    field: &PotentialField,
    start: GridNode,
    goal: GridNode,
    weight: f64,
) -> PlanningResult<PlannedPath> {
    let indexer = grid_map.indexer();
    let motion = get_motion_model();

    let mut open_set: HashMap<usize, Node> = HashMap::new();
    let mut closed_set: HashMap<usize, Node> = HashMap::new();
    let mut queue: BinaryHeap<Reverse<(NotNan<f64>, usize)>> = BinaryHeap::new();
    let mut expanded = Vec::new();

    let start_key = indexer
        .calc_grid_index(start)
        .ok_or(PlanningError::OutOfBounds {
            which: Endpoint::Start,
            x: indexer.calc_x_position(start.x),
            y: indexer.calc_y_position(start.y),
        })?;
    let start_node = Node::new(start.x, start.y, 0.0, None);
    queue.push(Reverse((calc_priority(&start_node, goal, field, weight)?, start_key)));
    open_set.insert(start_key, start_node);

    let mut iteration = 0usize;
    while let Some(Reverse((priority, c_id))) = queue.pop() {
        let current = match open_set.get(&c_id) {
            Some(node) if calc_priority(node, goal, field, weight)? == priority => node.clone(),
            // closed already or superseded by a cheaper entry
            _ => continue,
        };

        iteration += 1;
        if iteration % 100 == 0 {
            trace!(
                "iteration: {}, open set size: {}, closed set size: {}",
                iteration, open_set.len(), closed_set.len()
            );
        }

        if current.grid_node() == goal {
            info!(
                "found goal ({}, {}) after {} iterations, cost {:.3}",
                goal.x, goal.y, iteration, current.cost
            );
            let path = calc_final_path(&current, &closed_set, indexer)?;
            return Ok(PlannedPath { path, cost: current.cost, goal, expanded });
        }

        open_set.remove(&c_id);
        expanded.push(current.grid_node());
        closed_set.insert(c_id, current.clone());

        for &(dx, dy, move_cost) in &motion {
            let node = Node::new(
                current.x + dx,
                current.y + dy,
                current.cost + move_cost,
                Some(c_id),
            );

            // outside the map or blocked
            let n_id = match indexer.calc_grid_index(node.grid_node()) {
                Some(key) if grid_map.verify_node(node.grid_node()) => key,
                _ => continue,
            };

            if closed_set.contains_key(&n_id) {
                continue;
            }

            let improves = open_set
                .get(&n_id)
                .map_or(true, |existing| existing.cost > node.cost);
            if improves {
                queue.push(Reverse((calc_priority(&node, goal, field, weight)?, n_id)));
                open_set.insert(n_id, node);
            }
        }
    }

    info!("open set is empty after {} iterations", iteration);
    Err(PlanningError::NoPathFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use std::collections::HashSet;

    fn create_simple_obstacles() -> (Vec<f64>, Vec<f64>) {
        let mut ox = Vec::new();
        let mut oy = Vec::new();

        // Boundary
        for i in 0..21 {
            ox.push(i as f64); oy.push(0.0);
            ox.push(i as f64); oy.push(20.0);
            ox.push(0.0); oy.push(i as f64);
            ox.push(20.0); oy.push(i as f64);
        }

        // Internal obstacle (vertical wall)
        for i in 0..15 {
            ox.push(10.0);
            oy.push(i as f64);
        }

        (ox, oy)
    }

    /// Map whose cell indices equal world coordinates; free cells are
    /// x in 1..=5, y in 1..=3.
    fn room_obstacles(extra: &[(f64, f64)]) -> Obstacles {
        let mut obstacles = Obstacles::new();
        for i in 0..=6 {
            obstacles.push(Point2D::new(i as f64, 0.0));
            obstacles.push(Point2D::new(i as f64, 4.0));
        }
        for i in 0..=4 {
            obstacles.push(Point2D::new(0.0, i as f64));
            obstacles.push(Point2D::new(6.0, i as f64));
        }
        for &(x, y) in extra {
            obstacles.push(Point2D::new(x, y));
        }
        obstacles
    }

    fn planner() -> PotentialAStarPlanner {
        let (ox, oy) = create_simple_obstacles();
        PotentialAStarPlanner::from_obstacles(&ox, &oy, 1.0, 0.5).unwrap()
    }

    #[test]
    fn test_finds_path_around_wall() {
        let planner = planner();
        let start = Point2D::new(2.0, 2.0);
        let goal = Point2D::new(18.0, 2.0);

        let planned = planner.search(start, goal).unwrap();
        assert_eq!(planned.path.first(), Some(&start));
        assert_eq!(planned.path.last(), Some(&goal));

        // The wall ends at y = 14, so the path must climb above it
        let max_y = planned.path.y_coords().into_iter().fold(f64::NEG_INFINITY, f64::max);
        assert!(max_y >= 15.0);
    }

    #[test]
    fn test_path_avoids_occupied_cells() {
        let planner = planner();
        let planned = planner.search(Point2D::new(2.0, 2.0), Point2D::new(18.0, 2.0)).unwrap();
        let indexer = planner.grid_map().indexer();
        for p in &planned.path.points {
            assert!(!planner.grid_map().is_occupied(indexer.world_to_grid(*p)));
        }
    }

    #[test]
    fn test_path_steps_are_grid_neighbors() {
        let planner = planner();
        let planned = planner.search(Point2D::new(2.0, 2.0), Point2D::new(18.0, 18.0)).unwrap();
        for w in planned.path.points.windows(2) {
            let d = w[0].distance(&w[1]);
            assert!(d > 0.5 && d < 1.5, "step of length {}", d);
        }
        assert!((planned.path.total_length() - planned.cost).abs() < 1e-9);
    }

    #[test]
    fn test_closed_cells_expanded_once() {
        let planner = planner();
        let planned = planner.search(Point2D::new(2.0, 2.0), Point2D::new(18.0, 2.0)).unwrap();
        let unique: HashSet<_> = planned.expanded.iter().collect();
        assert_eq!(unique.len(), planned.expanded.len());
        assert!(!planned.expanded.contains(&planned.goal));
    }

    #[test]
    fn test_start_equals_goal() {
        let planner = planner();
        let p = Point2D::new(5.0, 5.0);
        let planned = planner.search(p, Point2D::new(5.2, 4.9)).unwrap();
        assert_eq!(planned.path.len(), 1);
        assert_eq!(planned.cost, 0.0);
        assert!(planned.expanded.is_empty());
    }

    #[test]
    fn test_unreachable_goal() {
        // goal inside a sealed room
        let (mut ox, mut oy) = create_simple_obstacles();
        for i in 14..19 {
            ox.push(i as f64); oy.push(14.0);
            ox.push(i as f64); oy.push(18.0);
            ox.push(14.0); oy.push(i as f64);
            ox.push(18.0); oy.push(i as f64);
        }
        let planner = PotentialAStarPlanner::from_obstacles(&ox, &oy, 1.0, 0.5).unwrap();
        let result = planner.search(Point2D::new(2.0, 2.0), Point2D::new(16.0, 16.0));
        assert!(matches!(result, Err(PlanningError::NoPathFound)));
        assert!(planner.planning(2.0, 2.0, 16.0, 16.0).is_none());
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let planner = planner();
        let result = planner.search(Point2D::new(-5.0, 2.0), Point2D::new(18.0, 2.0));
        assert!(matches!(
            result,
            Err(PlanningError::OutOfBounds { which: Endpoint::Start, .. })
        ));
        let result = planner.search(Point2D::new(2.0, 2.0), Point2D::new(18.0, 25.0));
        assert!(matches!(
            result,
            Err(PlanningError::OutOfBounds { which: Endpoint::Goal, .. })
        ));
    }

    #[test]
    fn test_search_is_deterministic() {
        let planner = planner();
        let a = planner.search(Point2D::new(2.0, 18.0), Point2D::new(18.0, 18.0)).unwrap();
        let b = planner.search(Point2D::new(2.0, 18.0), Point2D::new(18.0, 18.0)).unwrap();
        assert_eq!(a.path, b.path);
        assert_eq!(a.expanded, b.expanded);
    }

    #[test]
    fn test_legacy_interface() {
        let planner = planner();
        let (rx, ry) = planner.planning(2.0, 2.0, 18.0, 2.0).unwrap();
        assert!(rx.len() > 1);
        assert_eq!(rx.len(), ry.len());
    }

    #[test]
    fn test_one_shot_plan_matches_planner() {
        let (ox, oy) = create_simple_obstacles();
        let obstacles = Obstacles::from_xy(&ox, &oy);
        let config = PotentialAStarConfig::default();
        let planner = PotentialAStarPlanner::new(obstacles.clone(), config.clone()).unwrap();

        let start = Point2D::new(3.0, 4.0);
        let goal = Point2D::new(17.0, 6.0);
        let a = plan(&obstacles, start, goal, &config).unwrap();
        let b = planner.search(start, goal).unwrap();
        assert_eq!(a.path, b.path);
        assert_eq!(a.cost, b.cost);
    }

    #[test]
    fn test_potential_field_requires_goal_in_bounds() {
        let planner = planner();
        assert!(planner.potential_field(Point2D::new(18.0, 2.0)).is_ok());
        assert!(matches!(
            planner.potential_field(Point2D::new(40.0, 2.0)),
            Err(PlanningError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(PotentialAStarConfig::default().validate().is_ok());
        let bad = PotentialAStarConfig { resolution: 0.0, ..Default::default() };
        assert!(matches!(bad.validate(), Err(PlanningError::InvalidParameter(_))));
        let bad = PotentialAStarConfig { robot_radius: -0.5, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = PotentialAStarConfig { heuristic_weight: f64::INFINITY, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = "
resolution: 2.0
robot_radius: 1.0
potential:
  kp: 3.0
  influence_radius: 4.0
";
        let config = PotentialAStarConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.resolution, 2.0);
        assert_eq!(config.robot_radius, 1.0);
        assert_eq!(config.heuristic_weight, 1.0);
        assert_eq!(config.potential.kp, 3.0);
        assert_eq!(config.potential.eta, 100.0);
        assert_eq!(config.influence_radius(), 4.0);
    }

    #[test]
    fn test_config_from_yaml_rejects_invalid() {
        assert!(matches!(
            PotentialAStarConfig::from_yaml("resolution: -1.0"),
            Err(PlanningError::InvalidParameter(_))
        ));
        assert!(matches!(
            PotentialAStarConfig::from_yaml("resolution: [1, 2]"),
            Err(PlanningError::Config(_))
        ));
    }

    #[test]
    fn test_equal_priority_expands_lowest_key_first() {
        let grid_map = ObstacleMap::new(&room_obstacles(&[]), 1.0, 0.5).unwrap();
        assert_eq!((grid_map.indexer().x_width, grid_map.indexer().y_width), (6, 4));
        // zero field, so f == g and every ring of equal cost ties
        let field = PotentialField::normalize(DMatrix::zeros(6, 4));

        let planned = run_search(
            &grid_map,
            &field,
            GridNode::new(2, 2),
            GridNode::new(5, 3),
            1.0,
        )
        .unwrap();

        let expected = [
            (2, 2),
            // f = 1, keys 8, 13, 15, 20
            (2, 1),
            (1, 2),
            (3, 2),
            (2, 3),
            // f = sqrt(2), keys 7, 9, 19, 21
            (1, 1),
            (3, 1),
            (1, 3),
            (3, 3),
        ];
        let expected: Vec<GridNode> = expected.iter().map(|&(x, y)| GridNode::new(x, y)).collect();
        assert_eq!(&planned.expanded[..expected.len()], &expected[..]);
    }

    #[test]
    fn test_cheaper_route_replaces_open_entry() {
        // column 3 is blocked except for (3, 2)
        let grid_map =
            ObstacleMap::new(&room_obstacles(&[(3.0, 1.0), (3.0, 3.0)]), 1.0, 0.5).unwrap();
        // (2, 2) has a high potential, so (3, 2) is first reached diagonally
        // from (2, 1) and only later through (2, 2)
        let field = PotentialField::normalize(DMatrix::from_fn(6, 4, |ix, iy| match (ix, iy) {
            (2, 2) => 0.5,
            (0, 0) => 1.0,
            _ => 0.0,
        }));

        let planned = run_search(
            &grid_map,
            &field,
            GridNode::new(1, 2),
            GridNode::new(5, 2),
            1.0,
        )
        .unwrap();

        assert!((planned.cost - 4.0).abs() < 1e-9, "cost {}", planned.cost);
        let expected: Vec<Point2D> =
            (1..=5).map(|x| Point2D::new(x as f64, 2.0)).collect();
        assert_eq!(planned.path.points, expected);

        let expected: Vec<GridNode> = [
            (1, 2),
            (1, 1),
            (1, 3),
            (2, 1),
            (2, 3),
            (2, 2),
            (3, 2),
            (4, 2),
            (4, 1),
            (4, 3),
        ]
        .iter()
        .map(|&(x, y)| GridNode::new(x, y))
        .collect();
        assert_eq!(planned.expanded, expected);
    }

    #[test]
    fn test_legacy_interface_returns_none_on_error() {
        let planner = planner();
        assert!(planner.planning(-5.0, 2.0, 18.0, 2.0).is_none());
        assert!(planner.planning(2.0, 2.0, 18.0, 25.0).is_none());
    }

    #[test]
    fn test_from_obstacles_rejects_mismatched_lengths() {
        let result = PotentialAStarPlanner::from_obstacles(&[0.0, 1.0], &[0.0], 1.0, 0.5);
        assert!(matches!(result, Err(PlanningError::InvalidParameter(_))));
    }
}
