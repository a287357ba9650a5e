//! Arena owning every node of a pipeline.

use super::{FlowData, Node, NodeKind, Requirement};
use crate::error::{Result, SluiceError};
use crate::traits::{Kernel, KernelContext, PassThrough};
use crate::types::NodeId;
use crate::value::Value;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Owner of all nodes, keyed by [`NodeId`].
///
/// Every edge is stored twice, as a downstream entry on its source and an
/// upstream entry on its target. The arena is the only place edges are
/// changed, and each change either updates both ends or neither.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u32,
}

impl NodeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    pub fn add(
        &mut self,
        kind: NodeKind,
        name: impl Into<String>,
        kernel: impl Kernel + 'static,
    ) -> NodeId {
        self.add_boxed(kind, name, Box::new(kernel))
    }

    /// Add a node with an already boxed kernel.
    pub fn add_boxed(
        &mut self,
        kind: NodeKind,
        name: impl Into<String>,
        kernel: Box<dyn Kernel>,
    ) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.nodes.insert(id, Node::new(id, kind, name, kernel));
        id
    }

    /// Add a pass-through inlet.
    pub fn inlet(&mut self, name: impl Into<String>) -> NodeId {
        self.add(NodeKind::Inlet, name, PassThrough)
    }

    /// Add a pass-through outlet.
    pub fn outlet(&mut self, name: impl Into<String>) -> NodeId {
        self.add(NodeKind::Outlet, name, PassThrough)
    }

    /// Add a node under a caller-chosen id.
    ///
    /// The largest id is reserved so that later [`NodeArena::add`] calls
    /// always have a fresh id to hand out.
    pub fn insert_with_id(
        &mut self,
        id: NodeId,
        kind: NodeKind,
        name: impl Into<String>,
        kernel: Box<dyn Kernel>,
    ) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(SluiceError::DuplicateNodeId { node_id: id });
        }
        let successor = id
            .as_u32()
            .checked_add(1)
            .ok_or_else(|| SluiceError::InvalidTopology {
                cause: format!("node id {} is out of range", id),
            })?;
        self.nodes.insert(id, Node::new(id, kind, name, kernel));
        self.next_id = self.next_id.max(successor);
        Ok(())
    }

    /// Declare the fan arity of a node.
    ///
    /// Fails if existing edges already exceed the new capacity.
    pub fn set_n_result(&mut self, id: NodeId, n_result: Option<usize>) -> Result<()> {
        let node = self.get_mut(id)?;
        let up_cap = node.kind.upstream_capacity(n_result);
        let down_cap = node.kind.downstream_capacity(n_result);
        if node.upstream.len() > up_cap {
            return Err(SluiceError::ArityExceeded {
                node_id: id,
                direction: "upstream",
                capacity: up_cap,
            });
        }
        if node.downstream.len() > down_cap {
            return Err(SluiceError::ArityExceeded {
                node_id: id,
                direction: "downstream",
                capacity: down_cap,
            });
        }
        node.n_result = n_result;
        Ok(())
    }

    /// Record a declared fan arity without checking the existing edges.
    ///
    /// Used when rebuilding a stored pipeline: a fan-out whose declared
    /// arity disagrees with its edges is corrected when the pipeline is
    /// constructed.
    pub fn declare_n_result(&mut self, id: NodeId, n_result: Option<usize>) -> Result<()> {
        self.get_mut(id)?.n_result = n_result;
        Ok(())
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or(SluiceError::UnknownNode { node_id: id })
    }

    /// Look up a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or(SluiceError::UnknownNode { node_id: id })
    }

    /// Check whether the arena holds `id`.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// All nodes, by ascending id.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    // =========================================================================
    // Wiring
    // =========================================================================

    /// Add the edge `from -> to`.
    ///
    /// Both capacities are checked before either side changes. Repeating
    /// the call adds a parallel edge, which fan nodes accept.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let source = self.get(from)?;
        if source.downstream.len() >= source.downstream_capacity() {
            return Err(SluiceError::ArityExceeded {
                node_id: from,
                direction: "downstream",
                capacity: source.downstream_capacity(),
            });
        }
        let target = self.get(to)?;
        if target.upstream.len() >= target.upstream_capacity() {
            return Err(SluiceError::ArityExceeded {
                node_id: to,
                direction: "upstream",
                capacity: target.upstream_capacity(),
            });
        }
        self.get_mut(from)?.downstream.push(to);
        self.get_mut(to)?.upstream.push(from);
        trace!(%from, %to, "Connected");
        Ok(())
    }

    /// Attach `downstream` after `node`.
    pub fn attach_downstream(&mut self, node: NodeId, downstream: NodeId) -> Result<()> {
        self.connect(node, downstream)
    }

    /// Attach `upstream` before `node`.
    pub fn attach_upstream(&mut self, node: NodeId, upstream: NodeId) -> Result<()> {
        self.connect(upstream, node)
    }

    /// Detach downstream edges of `node`.
    ///
    /// With `Some(other)` one edge to `other` is removed; with `None` every
    /// downstream edge is.
    pub fn detach_downstream(&mut self, node: NodeId, other: Option<NodeId>) -> Result<()> {
        let targets = match other {
            Some(other) => vec![other],
            None => self.get(node)?.downstream.clone(),
        };
        for target in targets {
            self.remove_edge(node, target, "downstream")?;
        }
        Ok(())
    }

    /// Detach upstream edges of `node`.
    ///
    /// With `Some(other)` one edge from `other` is removed; with `None` every
    /// upstream edge is.
    pub fn detach_upstream(&mut self, node: NodeId, other: Option<NodeId>) -> Result<()> {
        let sources = match other {
            Some(other) => vec![other],
            None => self.get(node)?.upstream.clone(),
        };
        for source in sources {
            self.remove_edge(source, node, "upstream")?;
        }
        Ok(())
    }

    /// Reorder the upstream edges of `node` to `order`.
    ///
    /// `order` must list exactly the current edges, parallel edges included.
    pub fn order_upstream(&mut self, node: NodeId, order: &[NodeId]) -> Result<()> {
        let mut current = self.get(node)?.upstream.clone();
        let mut requested = order.to_vec();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            return Err(SluiceError::InvalidTopology {
                cause: format!("upstream order of {} does not match its edges", node),
            });
        }
        self.get_mut(node)?.upstream = order.to_vec();
        Ok(())
    }

    fn remove_edge(&mut self, from: NodeId, to: NodeId, direction: &'static str) -> Result<()> {
        let (node_id, other) = match direction {
            "upstream" => (to, from),
            _ => (from, to),
        };
        let not_attached = SluiceError::NotAttached {
            node_id,
            other,
            direction,
        };
        let down_pos = self
            .get(from)?
            .downstream
            .iter()
            .position(|&d| d == to);
        let up_pos = self.get(to)?.upstream.iter().position(|&u| u == from);
        match (down_pos, up_pos) {
            (Some(d), Some(u)) => {
                self.get_mut(from)?.downstream.remove(d);
                self.get_mut(to)?.upstream.remove(u);
                Ok(())
            }
            _ => Err(not_attached),
        }
    }

    /// Add requirements to `consumer`. Duplicates collapse.
    ///
    /// Each producer must exist and expose the attribute, and the consumer's
    /// kernel must accept the argument.
    pub fn add_requirement(
        &mut self,
        consumer: NodeId,
        requirements: impl IntoIterator<Item = Requirement>,
    ) -> Result<()> {
        let requirements: Vec<Requirement> = requirements.into_iter().collect();
        for req in &requirements {
            self.check_requirement(consumer, req)?;
        }
        self.get_mut(consumer)?.requirements.extend(requirements);
        Ok(())
    }

    /// Check one requirement against the current arena.
    pub fn check_requirement(&self, consumer: NodeId, req: &Requirement) -> Result<()> {
        let producer = self.get(req.producer)?;
        if !producer.exposes(&req.attribute) {
            return Err(SluiceError::UnknownAttribute {
                producer: req.producer,
                attribute: req.attribute.clone(),
            });
        }
        if !self.get(consumer)?.accepts(&req.argument) {
            return Err(SluiceError::UnknownArgument {
                consumer,
                argument: req.argument.clone(),
            });
        }
        Ok(())
    }

    /// Remove a node, detaching all its edges first.
    pub fn remove(&mut self, id: NodeId) -> Result<Node> {
        self.detach_upstream(id, None)?;
        self.detach_downstream(id, None)?;
        self.nodes
            .remove(&id)
            .ok_or(SluiceError::UnknownNode { node_id: id })
    }

    /// Move every node of `other` into this arena under fresh ids.
    ///
    /// Returns the mapping from the old ids to the new ones.
    pub fn absorb(&mut self, other: NodeArena) -> BTreeMap<NodeId, NodeId> {
        let mut mapping = BTreeMap::new();
        for old in other.nodes.keys() {
            mapping.insert(*old, NodeId::new(self.next_id));
            self.next_id += 1;
        }
        let remap = |id: &NodeId| mapping.get(id).copied().unwrap_or(*id);
        for (old, mut node) in other.nodes {
            node.id = remap(&old);
            node.upstream = node.upstream.iter().map(remap).collect();
            node.downstream = node.downstream.iter().map(remap).collect();
            node.requirements = node
                .requirements
                .into_iter()
                .map(|r| Requirement {
                    producer: remap(&r.producer),
                    ..r
                })
                .collect();
            self.nodes.insert(node.id, node);
        }
        mapping
    }

    /// Replace the pair `outlet`, `inlet` by a single pass-through element.
    ///
    /// The new node takes the outlet's place downstream of its producer and
    /// the inlet's place upstream of each of its consumers, keeping edge
    /// positions, so fan-in input order is unchanged. Requirements on either
    /// removed node are moved to the new one.
    pub fn splice(
        &mut self,
        outlet: NodeId,
        inlet: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId> {
        let roles = [
            (outlet, "outlet", NodeKind::Outlet),
            (inlet, "inlet", NodeKind::Inlet),
        ];
        for (id, role, kind) in roles {
            let actual = self.get(id)?.kind;
            if actual != kind {
                return Err(SluiceError::WrongNodeKind {
                    node_id: id,
                    role,
                    actual,
                });
            }
        }
        let producer = self
            .get(outlet)?
            .upstream
            .first()
            .copied()
            .ok_or(SluiceError::DanglingNode { node_id: outlet })?;
        let consumers = self.get(inlet)?.downstream.clone();

        let bridge = self.add(NodeKind::Element, name, PassThrough);
        replace_first(&mut self.get_mut(producer)?.downstream, outlet, bridge);
        for consumer in &consumers {
            replace_first(&mut self.get_mut(*consumer)?.upstream, inlet, bridge);
        }
        {
            let node = self.get_mut(bridge)?;
            node.upstream = vec![producer];
            node.downstream = consumers;
        }

        for node in self.nodes.values_mut() {
            node.requirements = std::mem::take(&mut node.requirements)
                .into_iter()
                .map(|r| {
                    if r.producer == outlet || r.producer == inlet {
                        Requirement { producer: bridge, ..r }
                    } else {
                        r
                    }
                })
                .collect();
        }
        self.nodes.remove(&outlet);
        self.nodes.remove(&inlet);
        debug!(%outlet, %inlet, %bridge, "Spliced outlet into inlet");
        Ok(bridge)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Nodes that must run before `id` and have not.
    pub fn waiting_on(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.get(id)?;
        let mut waiting = Vec::new();
        let producers = node.requirements.iter().map(|r| r.producer);
        for dep in node.upstream.iter().copied().chain(producers) {
            if !self.get(dep)?.executed && !waiting.contains(&dep) {
                waiting.push(dep);
            }
        }
        Ok(waiting)
    }

    /// Whether every upstream node and requirement producer of `id` has run.
    pub fn can_execute(&self, id: NodeId) -> Result<bool> {
        Ok(self.waiting_on(id)?.is_empty())
    }

    /// Run one node on the envelopes delivered to it.
    ///
    /// Checks preconditions and addressing, injects requirement values,
    /// records shapes, runs the kernel, marks the node executed and wraps
    /// the outputs addressed to the downstream nodes in edge order.
    pub fn flow(&mut self, id: NodeId, inputs: Vec<FlowData>) -> Result<Vec<FlowData>> {
        let waiting = self.waiting_on(id)?;
        if !waiting.is_empty() {
            return Err(SluiceError::PreconditionFailed {
                node_id: id,
                waiting_on: waiting,
            });
        }
        let payloads = self.order_inputs(id, inputs)?;

        let injected = self.requirement_values(id)?;
        let node = self.get_mut(id)?;
        for (argument, value) in injected {
            node.kernel.set_argument(&argument, value)?;
        }

        node.input_shapes = Some(payloads.iter().map(Value::shape).collect());
        let ctx = KernelContext::new(id, node.name.as_str(), node.expected_outputs());
        let outputs = node.kernel.transform(&ctx, payloads)?;
        node.output_shapes = Some(outputs.iter().map(Value::shape).collect());
        node.executed = true;
        debug!(
            node_id = %id,
            node = %node.name,
            inputs = node.input_shapes.as_ref().map_or(0, Vec::len),
            outputs = outputs.len(),
            "Kernel transformed"
        );

        if outputs.len() != ctx.expected_outputs {
            return Err(SluiceError::OutputArityMismatch {
                node_id: id,
                expected: ctx.expected_outputs,
                actual: outputs.len(),
            });
        }
        Ok(wrap_outputs(node, outputs))
    }

    fn order_inputs(&self, id: NodeId, inputs: Vec<FlowData>) -> Result<Vec<Value>> {
        let node = self.get(id)?;
        for fd in &inputs {
            if fd.to != Some(id) {
                return Err(SluiceError::Misaddressed {
                    node_id: id,
                    addressed_to: fd.to,
                });
            }
        }

        let senders: Vec<Option<NodeId>> = if node.kind == NodeKind::Inlet {
            vec![None]
        } else {
            node.upstream.iter().copied().map(Some).collect()
        };

        let mut pending: Vec<Option<FlowData>> = inputs.into_iter().map(Some).collect();
        let mut payloads = Vec::with_capacity(senders.len());
        for sender in senders {
            let slot = pending
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|fd| fd.from == sender))
                .and_then(Option::take)
                .ok_or(SluiceError::MissingInput {
                    node_id: id,
                    from: sender,
                })?;
            payloads.push(slot.payload);
        }
        // A fan-out with a declared arity sends several envelopes over one
        // edge; they follow the per-edge payloads in arrival order.
        for extra in pending.into_iter().flatten() {
            match extra.from {
                Some(from) if node.upstream.contains(&from) => payloads.push(extra.payload),
                from => return Err(SluiceError::UnexpectedSender { node_id: id, from }),
            }
        }
        Ok(payloads)
    }

    fn requirement_values(&self, id: NodeId) -> Result<Vec<(String, Value)>> {
        let node = self.get(id)?;
        node.requirements
            .iter()
            .map(|req| {
                let value = self.get(req.producer)?.attribute(&req.attribute).ok_or_else(|| {
                    SluiceError::UnknownAttribute {
                        producer: req.producer,
                        attribute: req.attribute.clone(),
                    }
                })?;
                Ok((req.argument.clone(), value))
            })
            .collect()
    }

    /// Reset one node.
    pub fn reset(&mut self, id: NodeId) -> Result<()> {
        self.get_mut(id)?.reset();
        Ok(())
    }

    /// Reset every node.
    pub fn reset_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.reset();
        }
    }
}

fn replace_first(ids: &mut [NodeId], old: NodeId, new: NodeId) {
    if let Some(slot) = ids.iter_mut().find(|id| **id == old) {
        *slot = new;
    }
}

fn wrap_outputs(node: &Node, outputs: Vec<Value>) -> Vec<FlowData> {
    let from = Some(node.id);
    match node.downstream.as_slice() {
        [] => outputs
            .into_iter()
            .map(|payload| FlowData::new(from, None, payload))
            .collect(),
        [only] => outputs
            .into_iter()
            .map(|payload| FlowData::new(from, Some(*only), payload))
            .collect(),
        many => outputs
            .into_iter()
            .zip(many.iter())
            .map(|(payload, to)| FlowData::new(from, Some(*to), payload))
            .collect(),
    }
}
