//! Visualization utilities for tl_rrt_star
//!
//! Provides a unified interface for plotting workspaces, product trees and
//! extracted paths using gnuplot. Multi-robot structures are drawn one
//! robot at a time, each projected onto the 2D workspace.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{PlanningError, PlanningResult, Point2D};
use crate::planning::{PlannedPath, ProductTree};
use crate::workspace::{Polygon, Workspace};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const CYAN: &str = "#00FFFF";
    pub const MAGENTA: &str = "#FF00FF";
    pub const ORANGE: &str = "#FFA500";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const REGION: &str = ORANGE;
    pub const TREE: &str = GRAY;
    pub const PATH: &str = RED;
    pub const ROOT: &str = GREEN;
    pub const GOAL: &str = BLUE;
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: colors::PATH.to_string(),
            line_width: 2.0,
            caption: "Path".to_string(),
        }
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
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

/// Main visualizer struct
pub struct Visualizer {
    figure: Figure,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    /// Create a new visualizer
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
        }
    }

    /// Set the plot title
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Set X axis range
    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    /// Set Y axis range
    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Get mutable reference to the internal figure for advanced usage
    pub fn figure_mut(&mut self) -> &mut Figure {
        &mut self.figure
    }

    /// Plot a polygon boundary as a closed line ring
    pub fn plot_polygon(&mut self, polygon: &Polygon, color: &str, caption: &str) -> &mut Self {
        let mut x: Vec<f64> = polygon.vertices().iter().map(|p| p.x).collect();
        let mut y: Vec<f64> = polygon.vertices().iter().map(|p| p.y).collect();
        if let (Some(&first_x), Some(&first_y)) = (x.first(), y.first()) {
            x.push(first_x);
            y.push(first_y);
        }
        self.figure.axes2d().lines(
            &x,
            &y,
            &[Caption(caption), Color(color), LineWidth(1.5)],
        );
        self
    }

    /// Plot workspace obstacles and labeled regions
    pub fn plot_workspace(&mut self, workspace: &Workspace) -> &mut Self {
        self.set_x_range(0.0, workspace.extents()[0]);
        self.set_y_range(0.0, workspace.extents()[1]);
        for (id, polygon) in workspace.obstacles() {
            self.plot_polygon(polygon, colors::OBSTACLE, id);
        }
        for (id, polygon) in workspace.regions() {
            self.plot_polygon(polygon, colors::REGION, id);
        }
        self
    }

    /// Plot the tree edges of one robot's projection
    pub fn plot_tree(&mut self, tree: &ProductTree, robot: usize) -> &mut Self {
        for node in tree.nodes() {
            if let Some(parent) = node.parent {
                let p = tree.node(parent).config[robot];
                let q = node.config[robot];
                self.figure.axes2d().lines(
                    &[p.x, q.x],
                    &[p.y, q.y],
                    &[Color(colors::TREE), LineWidth(0.5)],
                );
            }
        }
        let root = tree.node(0).config[robot];
        self.plot_point(root, &PointStyle::new(colors::ROOT, "Root").with_size(1.5))
    }

    /// Plot one robot's projection of an extracted path
    pub fn plot_planned_path(
        &mut self,
        path: &PlannedPath,
        robot: usize,
        style: &PathStyle,
    ) -> &mut Self {
        let x: Vec<f64> = path.states.iter().map(|s| s.config[robot].x).collect();
        let y: Vec<f64> = path.states.iter().map(|s| s.config[robot].y).collect();
        self.figure.axes2d().lines(
            &x,
            &y,
            &[
                Caption(&style.caption),
                Color(&style.color),
                LineWidth(style.line_width),
            ],
        );
        self
    }

    /// Plot a single point (root, goal, etc.)
    pub fn plot_point(&mut self, point: Point2D, style: &PointStyle) -> &mut Self {
        self.figure.axes2d().points(
            &[point.x],
            &[point.y],
            &[
                Caption(&style.caption),
                Color(&style.color),
                PointSymbol(style.symbol),
                PointSize(style.size),
            ],
        );
        self
    }

    /// Finalize and show the plot
    pub fn show(&mut self) -> PlanningResult<()> {
        self.apply_settings();
        self.figure
            .show()
            .map_err(|e| PlanningError::Visualization(e.to_string()))
            .map(|_| ())
    }

    /// Save plot to PNG file
    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> PlanningResult<()> {
        self.apply_settings();
        self.figure
            .save_to_png(path, width, height)
            .map_err(|e| PlanningError::Visualization(e.to_string()))
    }

    /// Save plot to SVG file
    pub fn save_svg(&mut self, path: &str) -> PlanningResult<()> {
        self.apply_settings();
        self.figure
            .save_to_svg(path, 800, 600)
            .map_err(|e| PlanningError::Visualization(e.to_string()))
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);

        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{Guard, TaskAutomaton};
    use crate::planning::{Segment, TreeConfig};

    #[test]
    fn test_visualizer_creation() {
        let vis = Visualizer::new();
        assert!(vis.aspect_ratio.is_some());
    }

    #[test]
    fn test_path_style() {
        let style = PathStyle::new(colors::RED, "Test Path").with_line_width(3.0);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.color, colors::RED);
    }

    #[test]
    fn test_plot_workspace_fixes_ranges() {
        let mut ws = Workspace::new(vec![8.0, 6.0]).unwrap();
        ws.add_obstacle("o1", Polygon::rectangle(1.0, 1.0, 2.0, 2.0));
        let mut vis = Visualizer::new();
        vis.plot_workspace(&ws);
        assert_eq!(vis.x_range, Some((0.0, 8.0)));
        assert_eq!(vis.y_range, Some((0.0, 6.0)));
    }

    #[test]
    fn test_plot_tree_and_path() {
        let ws = Workspace::new(vec![10.0, 10.0]).unwrap();
        let mut a = TaskAutomaton::new();
        let s0 = a.add_state("T0_init");
        a.add_transition(s0, s0, Guard::always());
        a.set_initial(s0);

        let init = vec![Point2D::new(5.0, 5.0)];
        let mut tree = ProductTree::new(
            ws,
            a,
            init,
            s0,
            vec![String::new()],
            Segment::Suffix,
            TreeConfig::default(),
        )
        .unwrap();
        let target = vec![Point2D::new(6.0, 5.0)];
        let label = tree.workspace().label_of(&target);
        let feasible = tree.feasible_edges(&target, &[0], &label);
        let goal = tree.extend(target, s0, label, &[0], &feasible).unwrap();
        let path = tree.backtrack(goal);

        // drawing only buffers gnuplot commands, no process is spawned
        let mut vis = Visualizer::new();
        vis.set_title("Suffix loop")
            .plot_workspace(tree.workspace())
            .plot_tree(&tree, 0)
            .plot_planned_path(&path, 0, &PathStyle::default());
    }
}
