//! Reachability search for an execution order.
//!
//! Depth-first search over markings with an explicit stack. Each frame owns
//! the marking it fires from and the firing history that led there, so
//! branches never share mutable state and backtracking is just popping.

use super::marking::Marking;
use super::petri::PetriNet;
use serde::{Deserialize, Serialize};
use sluice_core::error::{Result, SluiceError};
use sluice_core::types::NodeId;
use std::collections::HashSet;
use tracing::{debug, instrument, trace};

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on explored markings. `None` searches exhaustively.
    pub max_states: Option<usize>,
    /// Skip markings already reached through another branch.
    pub prune_visited: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_states: None,
            prune_visited: true,
        }
    }
}

impl SchedulerConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SLUICE_MAX_SEARCH_STATES`: bound on explored markings
    /// - `SLUICE_SCHEDULER_PRUNE`: "false" to disable visited-marking pruning
    pub fn from_env() -> Self {
        let max_states = std::env::var("SLUICE_MAX_SEARCH_STATES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok());

        let prune_visited = std::env::var("SLUICE_SCHEDULER_PRUNE")
            .map(|s| !(s.eq_ignore_ascii_case("false") || s == "0"))
            .unwrap_or(true);

        Self {
            max_states,
            prune_visited,
        }
    }

    /// Set the explored-marking bound.
    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }

    /// Enable or disable visited-marking pruning.
    pub fn with_prune_visited(mut self, prune: bool) -> Self {
        self.prune_visited = prune;
        self
    }
}

struct Frame {
    marking: Marking,
    transition: usize,
    history: Vec<usize>,
}

/// Finds a firing sequence from M0 to the terminal marking.
#[derive(Debug, Clone, Default)]
pub struct ReachabilityScheduler {
    config: SchedulerConfig,
}

impl ReachabilityScheduler {
    /// Create a scheduler.
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Search `net` for a firing sequence reaching its terminal marking.
    ///
    /// Returns the nodes in firing order. The first sequence found wins;
    /// among enabled transitions the lowest index is tried first.
    #[instrument(
        skip_all,
        fields(places = net.places().len(), transitions = net.transitions().len())
    )]
    pub fn schedule(&self, net: &PetriNet) -> Result<Vec<NodeId>> {
        let initial = net.initial_marking();
        let mut stack: Vec<Frame> = Vec::new();
        let mut visited: HashSet<Marking> = HashSet::new();
        let mut explored = 0usize;

        push_enabled(net, &mut stack, initial, &[]);

        while let Some(frame) = stack.pop() {
            explored += 1;
            if let Some(limit) = self.config.max_states {
                if explored > limit {
                    return Err(SluiceError::SearchLimitExceeded { limit });
                }
            }

            let marking = net.fire(&frame.marking, frame.transition);
            let mut history = frame.history;
            history.push(frame.transition);
            trace!(
                node_id = %net.transitions()[frame.transition],
                depth = history.len(),
                "Fired transition"
            );

            if net.is_terminal(&marking) {
                let order: Vec<NodeId> = history.iter().map(|t| net.transitions()[*t]).collect();
                debug!(explored, length = order.len(), "Execution order found");
                return Ok(order);
            }

            if self.config.prune_visited && !visited.insert(marking.clone()) {
                continue;
            }
            push_enabled(net, &mut stack, &marking, &history);
        }

        debug!(explored, "No firing sequence reaches the terminal marking");
        Err(SluiceError::NoExecutionSequence {
            nodes: net.transitions().len(),
            explored,
        })
    }
}

/// Push one frame per transition enabled in `marking`, highest index first
/// so the lowest index is popped next.
fn push_enabled(net: &PetriNet, stack: &mut Vec<Frame>, marking: &Marking, history: &[usize]) {
    let enabled: Vec<usize> = net.enabled(marking).collect();
    for t in enabled.into_iter().rev() {
        stack.push(Frame {
            marking: marking.clone(),
            transition: t,
            history: history.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::node::{NodeArena, NodeKind};
    use sluice_core::traits::PassThrough;

    fn diamond() -> (NodeArena, Vec<NodeId>) {
        // i -> s -> {x, y} -> m -> o
        let mut arena = NodeArena::new();
        let i = arena.inlet("i");
        let s = arena.add(NodeKind::FanOut, "s", PassThrough);
        let x = arena.add(NodeKind::Element, "x", PassThrough);
        let y = arena.add(NodeKind::Element, "y", PassThrough);
        let m = arena.add(NodeKind::FanIn, "m", PassThrough);
        let o = arena.outlet("o");
        arena.connect(i, s).unwrap();
        arena.connect(s, x).unwrap();
        arena.connect(s, y).unwrap();
        arena.connect(x, m).unwrap();
        arena.connect(y, m).unwrap();
        arena.connect(m, o).unwrap();
        (arena, vec![i, s, x, y, m, o])
    }

    #[test]
    fn diamond_order_respects_edges() {
        let (arena, nodes) = diamond();
        let net = PetriNet::build(&arena, &nodes, &nodes[..1], &nodes[5..]).unwrap();
        let order = ReachabilityScheduler::default().schedule(&net).unwrap();
        assert_eq!(order, nodes);
    }

    #[test]
    fn transition_order_breaks_ties() {
        let (arena, nodes) = diamond();
        let reordered = vec![nodes[0], nodes[1], nodes[3], nodes[2], nodes[4], nodes[5]];
        let net = PetriNet::build(&arena, &reordered, &nodes[..1], &nodes[5..]).unwrap();
        let order = ReachabilityScheduler::default().schedule(&net).unwrap();
        assert_eq!(order, reordered);
    }

    #[test]
    fn edge_cycle_has_no_sequence() {
        // i -> m <-> x, m -> s -> {x, o}
        let mut arena = NodeArena::new();
        let i = arena.inlet("i");
        let m = arena.add(NodeKind::FanIn, "m", PassThrough);
        let s = arena.add(NodeKind::FanOut, "s", PassThrough);
        let x = arena.add(NodeKind::Element, "x", PassThrough);
        let o = arena.outlet("o");
        arena.connect(i, m).unwrap();
        arena.connect(m, s).unwrap();
        arena.connect(s, x).unwrap();
        arena.connect(s, o).unwrap();
        arena.connect(x, m).unwrap();

        let net = PetriNet::build(&arena, &[i, m, s, x, o], &[i], &[o]).unwrap();
        let err = ReachabilityScheduler::default().schedule(&net).unwrap_err();
        assert!(matches!(err, SluiceError::NoExecutionSequence { nodes: 5, .. }));
    }

    #[test]
    fn search_limit_is_enforced() {
        let (arena, nodes) = diamond();
        let net = PetriNet::build(&arena, &nodes, &nodes[..1], &nodes[5..]).unwrap();
        let scheduler = ReachabilityScheduler::new(SchedulerConfig::default().with_max_states(2));
        let err = scheduler.schedule(&net).unwrap_err();
        assert!(matches!(err, SluiceError::SearchLimitExceeded { limit: 2 }));
    }

    #[test]
    fn pruning_does_not_change_the_result() {
        let (arena, nodes) = diamond();
        let net = PetriNet::build(&arena, &nodes, &nodes[..1], &nodes[5..]).unwrap();
        let pruned = ReachabilityScheduler::default().schedule(&net).unwrap();
        let exhaustive =
            ReachabilityScheduler::new(SchedulerConfig::default().with_prune_visited(false))
                .schedule(&net)
                .unwrap();
        assert_eq!(pruned, exhaustive);
    }

    #[test]
    fn config_defaults() {
        let config = SchedulerConfig::default();
        assert!(config.max_states.is_none());
        assert!(config.prune_visited);
    }
}
