//! TL-RRT* - sampling-based optimal task and motion planning for
//! multi-robot teams under temporal-logic task specifications.
//!
//! This crate grows a product-space search tree whose nodes pair a joint
//! robot configuration with a task-automaton state, so that every tree edge
//! is simultaneously collision-free and a valid automaton transition. The
//! tree yields either a prefix path (first acceptance of the task) or a
//! suffix loop (return to the starting automaton state), the two halves of
//! an infinitely-satisfying plan.

// Core modules
pub mod common;
pub mod utils;

// Planning modules
pub mod workspace;
pub mod automaton;
pub mod planning;

// Re-export common types for convenience
pub use common::{flatten, joint_distance, unflatten, JointConfig, Point2D};
pub use common::{PlanningError, PlanningResult};
pub use workspace::{Label, Polygon, Workspace};
pub use automaton::{Guard, TaskAutomaton};
pub use planning::{position_key, PlannedPath, PositionKey, ProductNode, ProductState};
pub use planning::{ProductTree, Segment, TreeConfig};
