//! Plotting of a planning result with gnuplot
//!
//! Layers are drawn in call order: potential field heat map, obstacles,
//! expanded cells, start/goal markers and the path.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{GridNode, Obstacles, Path2D, Point2D};
use crate::path_planning::PotentialField;
use crate::utils::GridIndexer;

pub mod colors {
    pub const OBSTACLE: &str = "#000000";
    pub const START: &str = "#00FF00";
    pub const GOAL: &str = "#0000FF";
    pub const PATH: &str = "#FF0000";
    pub const EXPANDED: &str = "#00FFFF";
}

#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self { color: color.to_string(), line_width: 2.0, caption: caption.to_string() }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self { color: color.to_string(), size: 1.0, symbol: 'O', caption: caption.to_string() }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

/// Single 2D figure in world coordinates with a fixed 1:1 aspect ratio
pub struct Visualizer {
    figure: Figure,
    title: String,
}

impl Visualizer {
    pub fn new(title: &str) -> Self {
        Self { figure: Figure::new(), title: title.to_string() }
    }

    /// Heat map of the normalized field, one pixel per grid cell
    pub fn plot_potential_field(&mut self, field: &PotentialField, indexer: &GridIndexer) -> &mut Self {
        let values = field.values();
        if values.is_empty() {
            return self;
        }

        // column-major (ix, iy) storage iterates rows of constant y
        let x_max = indexer.calc_x_position(values.nrows() as i32 - 1);
        let y_max = indexer.calc_y_position(values.ncols() as i32 - 1);
        self.figure.axes2d().image(
            values.iter().copied(),
            values.ncols(),
            values.nrows(),
            Some((indexer.min_x, indexer.min_y, x_max, y_max)),
            &[],
        );
        self
    }

    pub fn plot_obstacles(&mut self, obstacles: &Obstacles) -> &mut Self {
        let style = PointStyle::new(colors::OBSTACLE, "Obstacles").with_symbol('S').with_size(0.5);
        self.plot_points(&obstacles.points, &style)
    }

    /// Closed cells in expansion order, drawn at their world positions
    pub fn plot_expanded(&mut self, expanded: &[GridNode], indexer: &GridIndexer) -> &mut Self {
        let points: Vec<Point2D> = expanded.iter().map(|&n| indexer.grid_to_world(n)).collect();
        let style = PointStyle::new(colors::EXPANDED, "Expanded").with_symbol('x').with_size(0.5);
        self.plot_points(&points, &style)
    }

    pub fn plot_endpoints(&mut self, start: Point2D, goal: Point2D) -> &mut Self {
        self.plot_points(&[start], &PointStyle::new(colors::START, "Start").with_size(1.5));
        self.plot_points(&[goal], &PointStyle::new(colors::GOAL, "Goal").with_size(1.5).with_symbol('x'))
    }

    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.figure.axes2d().lines(&path.x_coords(), &path.y_coords(), &[
            Caption(&style.caption),
            Color(&style.color),
            LineWidth(style.line_width),
        ]);
        self
    }

    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();
        self.figure.axes2d().points(&x, &y, &[
            Caption(&style.caption),
            Color(&style.color),
            PointSymbol(style.symbol),
            PointSize(style.size),
        ]);
        self
    }

    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> Result<(), String> {
        self.apply_settings();
        self.figure.save_to_png(path, width, height).map_err(|e| e.to_string())
    }

    pub fn show(&mut self) -> Result<(), String> {
        self.apply_settings();
        self.figure.show().map(|_| ()).map_err(|e| e.to_string())
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();
        axes.set_title(&self.title, &[]);
        axes.set_x_label("X [m]", &[]);
        axes.set_y_label("Y [m]", &[]);
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
    }
}
