// Potential-field weighted A* demo
//
// Usage: potential_a_star [config.yaml]

use std::path::Path;

use log::{error, info};

use potential_astar::utils::{colors, PathStyle, Visualizer};
use potential_astar::{Obstacles, Point2D, PotentialAStarConfig, PotentialAStarPlanner};

const SHOW_ANIMATION: bool = true;

fn build_obstacles() -> Obstacles {
    let mut ox: Vec<f64> = Vec::new();
    let mut oy: Vec<f64> = Vec::new();

    // Boundary
    for i in -10..60 {
        ox.push(i as f64); oy.push(-10.0);
        ox.push(60.0); oy.push(i as f64);
    }
    for i in -10..61 {
        ox.push(i as f64); oy.push(60.0);
        ox.push(-10.0); oy.push(i as f64);
    }

    // Internal walls
    for i in -10..40 {
        ox.push(20.0); oy.push(i as f64);
    }
    for i in 0..40 {
        ox.push(40.0); oy.push(60.0 - i as f64);
    }
    for i in 30..40 {
        ox.push(i as f64); oy.push(20.0);
    }
    for i in 40..50 {
        ox.push(i as f64); oy.push(40.0);
    }
    for i in 0..20 {
        ox.push(i as f64); oy.push(40.0);
    }
    for i in 20..40 {
        ox.push(0.0); oy.push(i as f64);
    }

    Obstacles::from_xy(&ox, &oy)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Potential field A* path planning start!!");

    let config = match std::env::args().nth(1) {
        Some(path) => match PotentialAStarConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                error!("failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => PotentialAStarConfig {
            resolution: 2.0,
            robot_radius: 1.0,
            ..Default::default()
        },
    };

    let start = Point2D::new(10.0, 10.0);
    let goal = Point2D::new(50.0, 50.0);
    let obstacles = build_obstacles();
    info!("Created {} obstacles", obstacles.len());

    let planner = match PotentialAStarPlanner::new(obstacles.clone(), config) {
        Ok(planner) => planner,
        Err(e) => {
            error!("failed to build planner: {}", e);
            std::process::exit(1);
        }
    };

    let planned = match planner.search(start, goal) {
        Ok(planned) => planned,
        Err(e) => {
            error!("Planning failed: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Path found with {} points, cost {:.3}, {} cells expanded",
        planned.path.len(),
        planned.cost,
        planned.expanded.len()
    );

    if SHOW_ANIMATION {
        let indexer = planner.grid_map().indexer();
        let mut vis = Visualizer::new("Potential Field A* Path Planning");
        if let Ok(field) = planner.potential_field(goal) {
            vis.plot_potential_field(&field, indexer);
        }
        vis.plot_obstacles(&obstacles);
        vis.plot_expanded(&planned.expanded, indexer);
        vis.plot_endpoints(start, goal);
        vis.plot_path(&planned.path, &PathStyle::new(colors::PATH, "Path").with_line_width(2.5));

        let output_path = "img/path_planning/potential_a_star_result.png";
        match vis.save_png(output_path, 800, 600) {
            Ok(()) => info!("Plot saved to: {}", output_path),
            Err(e) => error!("failed to save plot: {}", e),
        }
        let _ = vis.show();
    }

    info!("Potential field A* path planning finish!!");
}
