//! Parent-pointer walk from the goal node back to the start

use std::collections::HashMap;

use crate::common::{Path2D, PlanningError, PlanningResult};
use crate::path_planning::a_star::Node;
use crate::utils::GridIndexer;

/// Build the world-coordinate path ending at `goal_node`.
///
/// Parents are looked up in `closed_set` until a node without parent (the
/// start) is reached. Waypoints are returned in start → goal order. A
/// parent key missing from the closed set is reported as
/// `InconsistentParentLink`.
pub fn calc_final_path(
    goal_node: &Node,
    closed_set: &HashMap<usize, Node>,
    indexer: &GridIndexer,
) -> PlanningResult<Path2D> {
    let mut points = vec![indexer.grid_to_world(goal_node.grid_node())];
    let mut parent_index = goal_node.parent_index;

    while let Some(key) = parent_index {
        let node = closed_set
            .get(&key)
            .ok_or(PlanningError::InconsistentParentLink { key })?;
        points.push(indexer.grid_to_world(node.grid_node()));
        parent_index = node.parent_index;

        // every closed node has a distinct key, so a longer chain is a cycle
        if points.len() > closed_set.len() + 1 {
            return Err(PlanningError::InconsistentParentLink { key });
        }
    }

    points.reverse();
    Ok(Path2D::from_points(points))
}
