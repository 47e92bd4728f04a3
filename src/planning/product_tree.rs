//! TL-RRT* product tree
//!
//! Incrementally grows a rooted tree over product states (joint robot
//! configuration x task-automaton state). Every edge is collision-free for
//! each robot and enabled by the automaton guard evaluated on the parent's
//! label, so any root-to-node path is a jointly valid motion and task
//! prefix. Rewiring with a shrinking neighbor radius gives the RRT*
//! asymptotic optimality guarantee on accumulated path length.

use std::collections::HashMap;
use std::f64::consts::PI;

use itertools::Itertools;
use nalgebra::DVector;
use ordered_float::OrderedFloat;
use rand::Rng;

use crate::automaton::TaskAutomaton;
use crate::common::{flatten, joint_distance, unflatten, JointConfig};
use crate::common::{PlanningError, PlanningResult};
use crate::workspace::{Label, Workspace};

const ROOT: usize = 0;

/// Position component of a product state with bit-exact equality, used as
/// the key that dedupes geometric checks and indexes the node arena.
pub type PositionKey = Vec<(OrderedFloat<f64>, OrderedFloat<f64>)>;

type ProductKey = (PositionKey, usize);

/// Hashable key of a joint configuration.
pub fn position_key(config: &JointConfig) -> PositionKey {
    config
        .iter()
        .map(|p| (OrderedFloat(p.x), OrderedFloat(p.y)))
        .collect()
}

/// Which half of a looped temporal-logic plan the tree is growing.
///
/// Prefix trees search for a first acceptance of the task automaton;
/// suffix trees are rooted at an accepting product state and search for a
/// loop back to the root's automaton state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Prefix,
    Suffix,
}

/// Parameters for product-tree construction
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Maximum steering step in the flattened configuration space
    pub step_size: f64,
    /// Reduced neighbor queries: nearest-only, no rewiring
    pub lite: bool,
    /// Per-axis inter-robot separation threshold for the optional
    /// collision-avoidance filter
    pub collision_threshold: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            step_size: 1.0,
            lite: false,
            collision_threshold: 0.005,
        }
    }
}

/// A product state: joint configuration plus automaton state index.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductState {
    pub config: JointConfig,
    pub buchi: usize,
}

/// Node record of the arena tree.
#[derive(Debug, Clone)]
pub struct ProductNode {
    pub config: JointConfig,
    pub buchi: usize,
    /// Accumulated Euclidean path length from the root
    pub cost: f64,
    /// Label of `config`, cached at insertion
    pub label: Label,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Extracted solution: ordered product states from the root to a goal and
/// the total path cost. Suffix paths end with the root state repeated,
/// closing the loop.
#[derive(Debug, Clone)]
pub struct PlannedPath {
    pub cost: f64,
    pub states: Vec<ProductState>,
}

/// Outcome of one successful extension, before goal bookkeeping is applied
struct Extension {
    node: usize,
    goals: Vec<usize>,
}

/// TL-RRT* planner over the product of configuration space and task
/// automaton.
pub struct ProductTree {
    workspace: Workspace,
    automaton: TaskAutomaton,
    segment: Segment,
    config: TreeConfig,
    robots: usize,
    /// Connection-radius constant of the shrinking near-ball schedule
    gamma: f64,
    nodes: Vec<ProductNode>,
    index: HashMap<ProductKey, usize>,
    goals: Vec<usize>,
}

impl ProductTree {
    /// Create a tree rooted at `(init_config, init_buchi)` with cost 0 and
    /// the externally supplied initial label.
    pub fn new(
        workspace: Workspace,
        automaton: TaskAutomaton,
        init_config: JointConfig,
        init_buchi: usize,
        init_label: Label,
        segment: Segment,
        config: TreeConfig,
    ) -> PlanningResult<Self> {
        if init_config.is_empty() {
            return Err(PlanningError::InvalidParameter(
                "robot team must not be empty".to_string(),
            ));
        }
        if init_label.len() != init_config.len() {
            return Err(PlanningError::InvalidParameter(
                "initial label must have one entry per robot".to_string(),
            ));
        }
        if config.step_size <= 0.0 {
            return Err(PlanningError::InvalidParameter(
                "step size must be positive".to_string(),
            ));
        }
        if init_buchi >= automaton.num_states() {
            return Err(PlanningError::InvalidParameter(
                "initial automaton state out of range".to_string(),
            ));
        }

        let robots = init_config.len();
        let n = (workspace.dim() * robots) as f64;
        // RRT* connection-radius constant, derived from the volume of the
        // unit ball in the flattened configuration space
        let unit_ball = unit_ball_volume(workspace.dim() * robots);
        let gamma = 2.25 * (2.5 / (n + 1.0) * 4.0 * 0.84 / unit_ball).powf(1.0 / (n + 1.0));

        let root = ProductNode {
            config: init_config,
            buchi: init_buchi,
            cost: 0.0,
            label: init_label,
            parent: None,
            children: Vec::new(),
        };
        let mut index = HashMap::new();
        index.insert((position_key(&root.config), init_buchi), ROOT);

        Ok(ProductTree {
            workspace,
            automaton,
            segment,
            config,
            robots,
            gamma,
            nodes: vec![root],
            index,
            goals: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &ProductNode {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[ProductNode] {
        &self.nodes
    }

    /// Goal node indices in discovery order
    pub fn goals(&self) -> &[usize] {
        &self.goals
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn automaton(&self) -> &TaskAutomaton {
        &self.automaton
    }

    /// Uniform sample of a flattened joint configuration from the
    /// workspace extents.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        let extents = self.workspace.extents();
        let mut x_rand = Vec::with_capacity(self.robots * extents.len());
        for _ in 0..self.robots {
            for &extent in extents {
                x_rand.push(rng.gen_range(0.0..extent));
            }
        }
        x_rand
    }

    /// Move from `source` toward `target` by at most one step, re-nesting
    /// the result into per-robot positions. Returns `target` unchanged when
    /// it is within the step bound.
    pub fn steer(&self, target: &[f64], source: &[f64]) -> JointConfig {
        let t = DVector::from_column_slice(target);
        let s = DVector::from_column_slice(source);
        let diff = &t - &s;
        let dist = diff.norm();
        if dist <= self.config.step_size {
            unflatten(target)
        } else {
            let stepped = &s + diff * (self.config.step_size / dist);
            unflatten(stepped.as_slice())
        }
    }

    /// All tree nodes at minimum flattened Euclidean distance from
    /// `x_rand`; ties are all returned, in arena order.
    pub fn nearest(&self, x_rand: &[f64]) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .min_set_by_key(|(_, node)| OrderedFloat(flat_distance(x_rand, &node.config)))
            .into_iter()
            .map(|(i, _)| i)
            .collect()
    }

    /// Nodes within the shrinking near-ball around `x_new`. The radius
    /// never exceeds one steering step. In lite mode this degrades to the
    /// nearest tie set.
    pub fn near(&self, x_new: &[f64]) -> Vec<usize> {
        if self.config.lite {
            return self.nearest(x_new);
        }
        let n = self.nodes.len() as f64;
        let exponent = 1.0 / (self.workspace.dim() * self.robots) as f64;
        let radius = (self.gamma * ((n + 1.0).ln() / n).powf(exponent)).min(self.config.step_size);
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| flat_distance(x_new, &node.config) <= radius)
            .map(|(i, _)| i)
            .collect()
    }

    /// Per-robot feasibility of the straight edges between `x_new` and each
    /// distinct near-node position. A robot's segment may not touch any
    /// obstacle, and may only touch a labeled region named by that robot's
    /// label at either endpoint. The map covers every near position once.
    pub fn feasible_edges(
        &self,
        x_new: &JointConfig,
        near_nodes: &[usize],
        label: &Label,
    ) -> HashMap<PositionKey, bool> {
        let mut feasible = HashMap::new();
        for &i in near_nodes {
            let node = &self.nodes[i];
            let key = position_key(&node.config);
            if feasible.contains_key(&key) {
                continue;
            }
            let ok = self.edge_feasible(x_new, label, &node.config, &node.label);
            feasible.insert(key, ok);
        }
        feasible
    }

    fn edge_feasible(
        &self,
        a: &JointConfig,
        a_label: &Label,
        b: &JointConfig,
        b_label: &Label,
    ) -> bool {
        for r in 0..self.robots {
            for (_, polygon) in self.workspace.obstacles() {
                if polygon.intersects_segment(&a[r], &b[r]) {
                    return false;
                }
            }
            for (id, polygon) in self.workspace.regions() {
                if polygon.intersects_segment(&a[r], &b[r]) {
                    let token = Workspace::robot_token(id, r);
                    if token != a_label[r] && token != b_label[r] {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Try to insert the product state `(config, buchi)` with the
    /// minimum-cost feasible parent among `near_nodes`. Returns the new
    /// node's index, or `None` when no near node qualifies (a normal
    /// outcome, not an error). Discovered goals are recorded in insertion
    /// order and never dropped.
    pub fn extend(
        &mut self,
        config: JointConfig,
        buchi: usize,
        label: Label,
        near_nodes: &[usize],
        feasible: &HashMap<PositionKey, bool>,
    ) -> Option<usize> {
        let extension = self.try_extend(config, buchi, label, near_nodes, feasible)?;
        for goal in extension.goals {
            if !self.goals.contains(&goal) {
                self.goals.push(goal);
            }
        }
        Some(extension.node)
    }

    fn try_extend(
        &mut self,
        config: JointConfig,
        buchi: usize,
        label: Label,
        near_nodes: &[usize],
        feasible: &HashMap<PositionKey, bool>,
    ) -> Option<Extension> {
        let new_key = position_key(&config);
        if self.index.contains_key(&(new_key.clone(), buchi)) {
            return None;
        }

        // minimum cost-to-come parent; ties break to the first candidate
        // in near order
        let mut best: Option<(usize, f64)> = None;
        for &i in near_nodes {
            let node = &self.nodes[i];
            let key = position_key(&node.config);
            if key == new_key {
                continue;
            }
            if !feasible.get(&key).copied().unwrap_or(false) {
                continue;
            }
            if !self.automaton.transition_enabled(node.buchi, &node.label, buchi) {
                continue;
            }
            let cost = node.cost + joint_distance(&node.config, &config);
            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((i, cost));
            }
        }
        let (parent, cost) = best?;

        let node = self.insert_node(config, buchi, cost, label, parent);
        let goals = match self.segment {
            Segment::Prefix => self.prefix_goals(node, parent),
            Segment::Suffix => self.suffix_goals(node),
        };
        Some(Extension { node, goals })
    }

    /// Prefix goal decision: an accepting automaton component spawns a
    /// normalized goal node at the parent's configuration carrying the
    /// accepting state, under the same parent with the parent's cost and
    /// label. If the parent already carries the accepting state it was
    /// goal-marked at its own insertion and nothing is synthesized.
    fn prefix_goals(&mut self, node: usize, parent: usize) -> Vec<usize> {
        let buchi = self.nodes[node].buchi;
        if !self.automaton.is_accepting(buchi) || self.nodes[parent].buchi == buchi {
            return Vec::new();
        }
        let key = (position_key(&self.nodes[parent].config), buchi);
        if let Some(&existing) = self.index.get(&key) {
            return vec![existing];
        }
        let config = self.nodes[parent].config.clone();
        let cost = self.nodes[parent].cost;
        let label = self.nodes[parent].label.clone();
        let goal = self.insert_node(config, buchi, cost, label, parent);
        vec![goal]
    }

    /// Suffix goal decision: returning to the root's automaton state closes
    /// the loop, the node itself is the goal.
    fn suffix_goals(&self, node: usize) -> Vec<usize> {
        if self.nodes[node].buchi == self.nodes[ROOT].buchi {
            vec![node]
        } else {
            Vec::new()
        }
    }

    fn insert_node(
        &mut self,
        config: JointConfig,
        buchi: usize,
        cost: f64,
        label: Label,
        parent: usize,
    ) -> usize {
        let idx = self.nodes.len();
        let key = (position_key(&config), buchi);
        self.nodes.push(ProductNode {
            config,
            buchi,
            cost,
            label,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(idx);
        self.index.insert(key, idx);
        idx
    }

    /// Re-parent near nodes under `new_node` wherever that strictly lowers
    /// their cost-to-come, pushing the cost reduction through each rewired
    /// subtree.
    pub fn rewire(
        &mut self,
        new_node: usize,
        near_nodes: &[usize],
        feasible: &HashMap<PositionKey, bool>,
    ) {
        for &i in near_nodes {
            if i == new_node || self.nodes[i].parent.is_none() {
                continue;
            }
            let key = position_key(&self.nodes[i].config);
            if !feasible.get(&key).copied().unwrap_or(false) {
                continue;
            }
            let enabled = self.automaton.transition_enabled(
                self.nodes[new_node].buchi,
                &self.nodes[new_node].label,
                self.nodes[i].buchi,
            );
            if !enabled {
                continue;
            }
            let candidate = self.nodes[new_node].cost
                + joint_distance(&self.nodes[new_node].config, &self.nodes[i].config);
            let delta = self.nodes[i].cost - candidate;
            if delta > 0.0 {
                self.reparent(i, new_node);
                self.propagate_cost_reduction(i, delta);
            }
        }
    }

    fn reparent(&mut self, node: usize, new_parent: usize) {
        if let Some(old_parent) = self.nodes[node].parent {
            self.nodes[old_parent].children.retain(|&c| c != node);
        }
        self.nodes[node].parent = Some(new_parent);
        self.nodes[new_parent].children.push(node);
    }

    /// Subtract `delta` from the rewired node and every descendant,
    /// walking forward tree edges only.
    fn propagate_cost_reduction(&mut self, from: usize, delta: f64) {
        let mut stack = vec![from];
        while let Some(i) = stack.pop() {
            self.nodes[i].cost -= delta;
            stack.extend(self.nodes[i].children.iter().copied());
        }
    }

    /// One construction iteration: sample, steer from the nearest node,
    /// and try to attach the steered point under every automaton state,
    /// rewiring after each successful extension. Returns whether any node
    /// was added.
    pub fn expand_once<R: Rng>(&mut self, rng: &mut R) -> bool {
        let x_rand = self.sample(rng);
        let nearest = self.nearest(&x_rand);
        // ties break to the lowest arena index
        let source = flatten(&self.nodes[nearest[0]].config);
        let x_new = self.steer(&x_rand, source.as_slice());
        if self.workspace.any_robot_in_obstacle(&x_new) {
            return false;
        }
        let label = self.workspace.label_of(&x_new);
        let flat_new = flatten(&x_new);
        let near_nodes = self.near(flat_new.as_slice());
        let feasible = self.feasible_edges(&x_new, &near_nodes, &label);

        let mut added = false;
        for buchi in 0..self.automaton.num_states() {
            if let Some(idx) =
                self.extend(x_new.clone(), buchi, label.clone(), &near_nodes, &feasible)
            {
                added = true;
                if !self.config.lite {
                    self.rewire(idx, &near_nodes, &feasible);
                }
            }
        }
        added
    }

    /// Grow the tree for a fixed iteration budget. Termination policy
    /// beyond the budget (e.g. stop at first goal) is the caller's.
    pub fn construct<R: Rng>(&mut self, iterations: usize, rng: &mut R) {
        for i in 0..iterations {
            if i % 100 == 0 {
                println!(
                    "Iter: {}, number of nodes: {}, goals: {}",
                    i,
                    self.nodes.len(),
                    self.goals.len()
                );
            }
            self.expand_once(rng);
        }
    }

    /// Whether robot `robot_index` keeps the configured per-axis distance
    /// from every other robot. Optional filter, composed by callers on top
    /// of edge feasibility; extension does not apply it implicitly.
    pub fn robots_separated(&self, config: &JointConfig, robot_index: usize) -> bool {
        config.iter().enumerate().all(|(i, p)| {
            i == robot_index
                || (p.x - config[robot_index].x).abs() > self.config.collision_threshold
                || (p.y - config[robot_index].y).abs() > self.config.collision_threshold
        })
    }

    fn product_state(&self, idx: usize) -> ProductState {
        ProductState {
            config: self.nodes[idx].config.clone(),
            buchi: self.nodes[idx].buchi,
        }
    }

    /// Follow parent pointers from `goal` back to the root. Suffix paths
    /// get the root state appended and the loop-closing distance added to
    /// the cost.
    pub fn backtrack(&self, goal: usize) -> PlannedPath {
        let mut states = vec![self.product_state(goal)];
        let mut current = goal;
        while let Some(parent) = self.nodes[current].parent {
            current = parent;
            states.push(self.product_state(current));
        }
        states.reverse();

        let mut cost = self.nodes[goal].cost;
        if self.segment == Segment::Suffix {
            cost += joint_distance(&self.nodes[goal].config, &self.nodes[ROOT].config);
            states.push(self.product_state(ROOT));
        }
        PlannedPath { cost, states }
    }

    /// Paths for every discovered goal, in goal discovery order.
    pub fn find_path(&self) -> Vec<PlannedPath> {
        self.goals.iter().map(|&g| self.backtrack(g)).collect()
    }
}

fn flat_distance(x: &[f64], config: &JointConfig) -> f64 {
    (DVector::from_column_slice(x) - flatten(config)).norm()
}

/// Volume of the unit ball in dimension `n`, by the two-step recurrence
fn unit_ball_volume(n: usize) -> f64 {
    let mut volume = if n % 2 == 0 { 1.0 } else { 2.0 };
    let mut k = if n % 2 == 0 { 2 } else { 3 };
    while k <= n {
        volume *= 2.0 * PI / k as f64;
        k += 2;
    }
    volume
}
