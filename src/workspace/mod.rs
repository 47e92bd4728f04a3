//! Multi-robot workspace: extents, obstacle and labeled-region polygons,
//! and the per-robot label oracle.

pub mod polygon;

pub use polygon::Polygon;

use crate::common::{JointConfig, PlanningError, PlanningResult, Point2D};

/// Per-robot label tuple. Each entry is either the robot-indexed token of
/// the obstacle/region containing that robot (e.g. region `l1` occupied by
/// robot 0 gives `"l1_1"`), or an empty string in unlabeled free space.
pub type Label = Vec<String>;

/// Bounded rectangular workspace with identifier-keyed obstacle and
/// labeled-region polygons.
///
/// Polygons are kept in registration order; when regions overlap, the first
/// registered polygon containing a point wins.
#[derive(Debug, Clone)]
pub struct Workspace {
    extents: Vec<f64>,
    obstacles: Vec<(String, Polygon)>,
    regions: Vec<(String, Polygon)>,
}

impl Workspace {
    /// Create a workspace spanning `[0, extents[d]]` along each dimension.
    pub fn new(extents: Vec<f64>) -> PlanningResult<Self> {
        if extents.len() != 2 {
            return Err(PlanningError::InvalidParameter(
                "workspace must be two-dimensional".to_string(),
            ));
        }
        if extents.iter().any(|&e| e <= 0.0) {
            return Err(PlanningError::InvalidParameter(
                "workspace extents must be positive".to_string(),
            ));
        }
        Ok(Workspace {
            extents,
            obstacles: Vec::new(),
            regions: Vec::new(),
        })
    }

    pub fn add_obstacle(&mut self, id: &str, polygon: Polygon) {
        self.obstacles.push((id.to_string(), polygon));
    }

    pub fn add_region(&mut self, id: &str, polygon: Polygon) {
        self.regions.push((id.to_string(), polygon));
    }

    pub fn dim(&self) -> usize {
        self.extents.len()
    }

    pub fn extents(&self) -> &[f64] {
        &self.extents
    }

    pub fn obstacles(&self) -> &[(String, Polygon)] {
        &self.obstacles
    }

    pub fn regions(&self) -> &[(String, Polygon)] {
        &self.regions
    }

    /// Identifier of the obstacle or region containing `p`, if any.
    /// Obstacles take priority over labeled regions.
    pub fn occupancy(&self, p: &Point2D) -> Option<&str> {
        for (id, polygon) in &self.obstacles {
            if polygon.contains(p) {
                return Some(id);
            }
        }
        for (id, polygon) in &self.regions {
            if polygon.contains(p) {
                return Some(id);
            }
        }
        None
    }

    /// Whether any robot of the joint configuration sits inside an obstacle.
    pub fn any_robot_in_obstacle(&self, config: &JointConfig) -> bool {
        config
            .iter()
            .any(|p| self.obstacles.iter().any(|(_, poly)| poly.contains(p)))
    }

    /// Robot-indexed proposition token, 1-based as in the task alphabet.
    pub fn robot_token(id: &str, robot: usize) -> String {
        format!("{}_{}", id, robot + 1)
    }

    /// Label of a joint configuration: one token per robot, empty where the
    /// robot is in unlabeled free space.
    pub fn label_of(&self, config: &JointConfig) -> Label {
        config
            .iter()
            .enumerate()
            .map(|(r, p)| match self.occupancy(p) {
                Some(id) => Self::robot_token(id, r),
                None => String::new(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled_workspace() -> Workspace {
        let mut ws = Workspace::new(vec![10.0, 10.0]).unwrap();
        ws.add_obstacle("o1", Polygon::rectangle(4.0, 4.0, 6.0, 6.0));
        ws.add_region("l1", Polygon::rectangle(1.0, 1.0, 3.0, 3.0));
        // overlaps the obstacle on purpose
        ws.add_region("l2", Polygon::rectangle(5.0, 5.0, 8.0, 8.0));
        ws
    }

    #[test]
    fn test_rejects_bad_extents() {
        assert!(Workspace::new(vec![10.0]).is_err());
        assert!(Workspace::new(vec![10.0, -1.0]).is_err());
    }

    #[test]
    fn test_obstacle_takes_priority_over_region() {
        let ws = labeled_workspace();
        // inside both o1 and l2
        assert_eq!(ws.occupancy(&Point2D::new(5.5, 5.5)), Some("o1"));
        assert_eq!(ws.occupancy(&Point2D::new(7.0, 7.0)), Some("l2"));
        assert_eq!(ws.occupancy(&Point2D::new(9.0, 1.0)), None);
    }

    #[test]
    fn test_label_tokens_carry_robot_index() {
        let ws = labeled_workspace();
        let config = vec![Point2D::new(2.0, 2.0), Point2D::new(9.0, 9.0)];
        assert_eq!(ws.label_of(&config), vec!["l1_1".to_string(), String::new()]);

        let swapped = vec![Point2D::new(9.0, 9.0), Point2D::new(2.0, 2.0)];
        assert_eq!(ws.label_of(&swapped), vec![String::new(), "l1_2".to_string()]);
    }

    #[test]
    fn test_any_robot_in_obstacle() {
        let ws = labeled_workspace();
        assert!(ws.any_robot_in_obstacle(&vec![Point2D::new(0.5, 0.5), Point2D::new(5.0, 5.0)]));
        assert!(!ws.any_robot_in_obstacle(&vec![Point2D::new(0.5, 0.5), Point2D::new(2.0, 2.0)]));
    }
}
