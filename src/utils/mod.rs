//! Utility modules for tl_rrt_star

pub mod visualization;

pub use visualization::{colors, PathStyle, PointStyle, Visualizer};
