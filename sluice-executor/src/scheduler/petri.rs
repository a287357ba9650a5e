//! Place/transition model of a pipeline.

use super::marking::Marking;
use sluice_core::error::{Result, SluiceError};
use sluice_core::node::NodeArena;
use sluice_core::types::NodeId;
use std::collections::HashMap;
use std::fmt;

/// What a place stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Place {
    /// The node has executed. Produced by the node's own transition.
    Meta(NodeId),
    /// One edge `from -> to` has delivered. Parallel edges get one place each.
    Edge {
        /// Source node.
        from: NodeId,
        /// Target node.
        to: NodeId,
    },
    /// External data is available for an inlet. Marked initially.
    Source(NodeId),
    /// An outlet has emitted its result.
    Sink(NodeId),
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meta(n) => write!(f, "meta({})", n),
            Self::Edge { from, to } => write!(f, "edge({} -> {})", from, to),
            Self::Source(n) => write!(f, "source({})", n),
            Self::Sink(n) => write!(f, "sink({})", n),
        }
    }
}

/// A Petri net built from a pipeline.
///
/// Transition `t` fires node `transitions[t]`. The consume and produce
/// matrices are stored column-wise, one [`Marking`] per transition, so that
/// "is `t` enabled in `m`" is a single covering check.
///
/// The terminal target covers every sink place and every meta place: a
/// run is complete once every outlet has emitted and every node has run.
#[derive(Debug, Clone)]
pub struct PetriNet {
    places: Vec<Place>,
    transitions: Vec<NodeId>,
    consume: Vec<Marking>,
    produce: Vec<Marking>,
    initial: Marking,
    terminal: Marking,
}

impl PetriNet {
    /// Build the net for `nodes`.
    ///
    /// `nodes` fixes the transition order; every edge and requirement of
    /// those nodes must stay within `nodes`.
    pub fn build(
        arena: &NodeArena,
        nodes: &[NodeId],
        inlets: &[NodeId],
        outlets: &[NodeId],
    ) -> Result<Self> {
        let index: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(t, id)| (*id, t)).collect();
        let transition = |id: NodeId| {
            index
                .get(&id)
                .copied()
                .ok_or(SluiceError::UnknownNode { node_id: id })
        };

        // (place, producing transitions, consuming transitions)
        let mut arcs: Vec<(Place, Vec<usize>, Vec<usize>)> = Vec::new();

        for (t, id) in nodes.iter().enumerate() {
            arcs.push((Place::Meta(*id), vec![t], Vec::new()));
        }

        for (t, id) in nodes.iter().enumerate() {
            let node = arena.get(*id)?;
            for to in node.downstream() {
                arcs.push((Place::Edge { from: *id, to: *to }, vec![t], vec![transition(*to)?]));
            }
            for req in node.requirements() {
                let meta = transition(req.producer)?;
                arcs[meta].1.push(t);
                arcs[meta].2.push(t);
            }
        }

        for inlet in inlets {
            arcs.push((Place::Source(*inlet), Vec::new(), vec![transition(*inlet)?]));
        }
        for outlet in outlets {
            arcs.push((Place::Sink(*outlet), vec![transition(*outlet)?], Vec::new()));
        }

        let place_count = arcs.len();
        let mut consume = vec![Marking::empty(place_count); nodes.len()];
        let mut produce = vec![Marking::empty(place_count); nodes.len()];
        let mut initial = Marking::empty(place_count);
        let mut terminal = Marking::empty(place_count);
        let mut places = Vec::with_capacity(place_count);

        for (p, (place, producers, consumers)) in arcs.into_iter().enumerate() {
            for t in producers {
                produce[t].set(p);
            }
            for t in consumers {
                consume[t].set(p);
            }
            match place {
                Place::Source(_) => initial.set(p),
                Place::Sink(_) | Place::Meta(_) => terminal.set(p),
                Place::Edge { .. } => {}
            }
            places.push(place);
        }

        Ok(Self {
            places,
            transitions: nodes.to_vec(),
            consume,
            produce,
            initial,
            terminal,
        })
    }

    /// All places, in index order.
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// The node each transition fires, in index order.
    pub fn transitions(&self) -> &[NodeId] {
        &self.transitions
    }

    /// Index of the transition firing `node`.
    pub fn transition_of(&self, node: NodeId) -> Option<usize> {
        self.transitions.iter().position(|n| *n == node)
    }

    /// Index of `place`.
    pub fn place_index(&self, place: Place) -> Option<usize> {
        self.places.iter().position(|p| *p == place)
    }

    /// W⁻[p, t]: whether firing `t` consumes a token from `p`.
    pub fn consumes(&self, place: usize, transition: usize) -> bool {
        self.consume[transition].get(place)
    }

    /// W⁺[p, t]: whether firing `t` puts a token on `p`.
    pub fn produces(&self, place: usize, transition: usize) -> bool {
        self.produce[transition].get(place)
    }

    /// Wt[p, t] = W⁺[p, t] - W⁻[p, t].
    pub fn weight(&self, place: usize, transition: usize) -> i8 {
        i8::from(self.produces(place, transition)) - i8::from(self.consumes(place, transition))
    }

    /// M0: a token on every source place.
    pub fn initial_marking(&self) -> &Marking {
        &self.initial
    }

    /// F: the places that must all be marked at the end.
    pub fn terminal(&self) -> &Marking {
        &self.terminal
    }

    /// Whether every place `t` consumes from is marked in `m`.
    pub fn is_enabled(&self, m: &Marking, transition: usize) -> bool {
        m.covers(&self.consume[transition])
    }

    /// Transitions enabled in `m`, ascending.
    pub fn enabled(&self, m: &Marking) -> impl Iterator<Item = usize> {
        (0..self.transitions.len()).filter(move |&t| self.is_enabled(m, t))
    }

    /// m' = m + Wt[:, t].
    pub fn fire(&self, m: &Marking, transition: usize) -> Marking {
        m.fire(&self.consume[transition], &self.produce[transition])
    }

    /// Whether `m` marks every terminal place.
    pub fn is_terminal(&self, m: &Marking) -> bool {
        m.covers(&self.terminal)
    }
}
