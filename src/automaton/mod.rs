//! Task automaton over per-robot labels
//!
//! A finite acceptance automaton derived from a temporal-logic task formula.
//! States are connected by guarded edges; a guard is either trivially true
//! or a pair of literal sets (propositions that must be present in the
//! label, propositions that must be absent). The planner treats the
//! automaton as read-only and only asks whether a transition is enabled.

use crate::workspace::Label;

/// Guard attached to an automaton edge.
#[derive(Debug, Clone)]
pub enum Guard {
    /// The edge is always enabled ("1" in the task alphabet)
    Always,
    /// Conjunction of positive and negated proposition literals
    Literals {
        requires: Vec<String>,
        forbids: Vec<String>,
    },
}

impl Guard {
    pub fn always() -> Self {
        Guard::Always
    }

    pub fn literals(requires: Vec<&str>, forbids: Vec<&str>) -> Self {
        Guard::Literals {
            requires: requires.into_iter().map(str::to_string).collect(),
            forbids: forbids.into_iter().map(str::to_string).collect(),
        }
    }

    /// Whether the given label enables this guard. Membership is exact
    /// token equality against any robot's entry.
    pub fn satisfied(&self, label: &Label) -> bool {
        match self {
            Guard::Always => true,
            Guard::Literals { requires, forbids } => {
                requires.iter().all(|t| label.iter().any(|l| l == t))
                    && !forbids.iter().any(|t| label.iter().any(|l| l == t))
            }
        }
    }
}

/// Finite-state acceptance automaton with guarded transitions.
#[derive(Debug, Clone)]
pub struct TaskAutomaton {
    states: Vec<String>,
    edges: Vec<Vec<(usize, Guard)>>,
    init: usize,
    accept: Vec<usize>,
}

impl TaskAutomaton {
    pub fn new() -> Self {
        TaskAutomaton {
            states: Vec::new(),
            edges: Vec::new(),
            init: 0,
            accept: Vec::new(),
        }
    }

    /// Register a state and return its index.
    pub fn add_state(&mut self, name: &str) -> usize {
        self.states.push(name.to_string());
        self.edges.push(Vec::new());
        self.states.len() - 1
    }

    pub fn add_transition(&mut self, from: usize, to: usize, guard: Guard) {
        self.edges[from].push((to, guard));
    }

    pub fn set_initial(&mut self, state: usize) {
        self.init = state;
    }

    pub fn add_accepting(&mut self, state: usize) {
        if !self.accept.contains(&state) {
            self.accept.push(state);
        }
    }

    pub fn initial(&self) -> usize {
        self.init
    }

    pub fn accepting(&self) -> &[usize] {
        &self.accept
    }

    pub fn is_accepting(&self, state: usize) -> bool {
        self.accept.contains(&state)
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn state_name(&self, state: usize) -> &str {
        &self.states[state]
    }

    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s == name)
    }

    pub fn successors(&self, state: usize) -> &[(usize, Guard)] {
        &self.edges[state]
    }

    /// Guard of the edge `from -> to`, if the edge exists.
    pub fn guard(&self, from: usize, to: usize) -> Option<&Guard> {
        self.edges[from]
            .iter()
            .find(|(succ, _)| *succ == to)
            .map(|(_, guard)| guard)
    }

    /// Whether `from -- label --> to` is an enabled transition.
    ///
    /// Fails closed: if `to` is not a successor of `from` the answer is
    /// false without evaluating any guard.
    pub fn transition_enabled(&self, from: usize, label: &Label, to: usize) -> bool {
        match self.guard(from, to) {
            Some(guard) => guard.satisfied(label),
            None => false,
        }
    }
}

impl Default for TaskAutomaton {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reach_region_automaton() -> TaskAutomaton {
        // accept once some robot reaches l1
        let mut a = TaskAutomaton::new();
        let s0 = a.add_state("T0_init");
        let s1 = a.add_state("accept_all");
        a.add_transition(s0, s0, Guard::always());
        a.add_transition(s0, s1, Guard::literals(vec!["l1_1"], vec![]));
        a.add_transition(s1, s1, Guard::always());
        a.set_initial(s0);
        a.add_accepting(s1);
        a
    }

    #[test]
    fn test_transition_fails_closed() {
        let a = reach_region_automaton();
        // s1 -> s0 edge does not exist, label content irrelevant
        assert!(!a.transition_enabled(1, &vec!["l1_1".to_string()], 0));
    }

    #[test]
    fn test_always_guard() {
        let a = reach_region_automaton();
        assert!(a.transition_enabled(0, &vec![String::new()], 0));
        assert!(a.transition_enabled(1, &vec![String::new()], 1));
    }

    #[test]
    fn test_literal_guard_requires_token() {
        let a = reach_region_automaton();
        assert!(!a.transition_enabled(0, &vec![String::new()], 1));
        assert!(a.transition_enabled(0, &vec!["l1_1".to_string()], 1));
        // token for the wrong robot does not satisfy the literal
        assert!(!a.transition_enabled(0, &vec!["l1_2".to_string()], 1));
    }

    #[test]
    fn test_forbidden_literal_blocks() {
        let mut a = TaskAutomaton::new();
        let s0 = a.add_state("q0");
        let s1 = a.add_state("q1");
        a.add_transition(s0, s1, Guard::literals(vec!["l1_1"], vec!["l2_2"]));
        let ok = vec!["l1_1".to_string(), String::new()];
        let blocked = vec!["l1_1".to_string(), "l2_2".to_string()];
        assert!(a.transition_enabled(s0, &ok, s1));
        assert!(!a.transition_enabled(s0, &blocked, s1));
    }

    #[test]
    fn test_state_lookup() {
        let a = reach_region_automaton();
        assert_eq!(a.state_index("accept_all"), Some(1));
        assert_eq!(a.state_name(0), "T0_init");
        assert!(a.is_accepting(1));
        assert_eq!(a.initial(), 0);
    }
}
