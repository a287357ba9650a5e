//! Scheduled pipelines.
//!
//! A [`Pipeline`] takes ownership of a wired [`NodeArena`], validates the
//! part of it reachable from the inlets, builds the Petri net for that
//! part and searches it for an execution order. Construction fails if no
//! order exists, so every `Pipeline` value can be run.

mod compose;

use crate::scheduler::{
    CancellationToken, Executor, ExecutorConfig, PetriNet, ReachabilityScheduler,
};
use sluice_core::error::{Result, SluiceError};
use sluice_core::node::{Node, NodeArena, NodeKind};
use sluice_core::types::NodeId;
use sluice_core::value::{DataShape, Value};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, instrument, warn};

/// Default name of a pipeline built without one.
pub const DEFAULT_PIPELINE_NAME: &str = "pipeline";

/// A validated, scheduled pipeline.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    arena: NodeArena,
    inlets: Vec<NodeId>,
    outlets: Vec<NodeId>,
    nodes: Vec<NodeId>,
    net: PetriNet,
    order: Vec<NodeId>,
    config: ExecutorConfig,
    executor: Executor,
}

impl Pipeline {
    /// Build a pipeline with the default configuration.
    pub fn new(arena: NodeArena, inlets: Vec<NodeId>, outlets: Vec<NodeId>) -> Result<Self> {
        Self::with_config(arena, inlets, outlets, ExecutorConfig::default())
    }

    /// Build a pipeline.
    ///
    /// `inlets` and `outlets` fix the payload order of [`Pipeline::run`].
    /// The pipeline's nodes are those reachable from the inlets along
    /// downstream edges; other nodes in the arena are ignored.
    #[instrument(skip_all, fields(inlets = inlets.len(), outlets = outlets.len()))]
    pub fn with_config(
        mut arena: NodeArena,
        inlets: Vec<NodeId>,
        outlets: Vec<NodeId>,
        config: ExecutorConfig,
    ) -> Result<Self> {
        check_endpoints(&arena, &inlets, &outlets)?;
        let nodes = closure(&arena, &inlets)?;
        check_closure(&arena, &nodes, &outlets)?;
        reconcile_fan_arity(&mut arena, &nodes)?;

        let net = PetriNet::build(&arena, &nodes, &inlets, &outlets)?;
        let order = ReachabilityScheduler::new(config.scheduler.clone()).schedule(&net)?;
        info!(
            nodes = nodes.len(),
            places = net.places().len(),
            "Pipeline scheduled"
        );

        Ok(Self {
            name: DEFAULT_PIPELINE_NAME.to_string(),
            arena,
            inlets,
            outlets,
            nodes,
            net,
            order,
            config,
            executor: Executor::new(),
        })
    }

    /// Set the pipeline name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check `token` between node invocations.
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.executor = Executor::new().with_cancellation(token);
    }

    /// Run the pipeline once.
    ///
    /// `payloads[i]` enters through the i-th inlet; the result holds one
    /// payload per outlet in outlet order. With `auto_reset` enabled the
    /// nodes are reset first; otherwise call [`Pipeline::reset`] between
    /// runs.
    #[instrument(skip_all, fields(pipeline = %self.name, payloads = payloads.len()))]
    pub fn run(&mut self, payloads: Vec<Value>) -> Result<Vec<Value>> {
        if self.config.auto_reset {
            self.reset()?;
        }
        let results = self.executor.run(
            &mut self.arena,
            &self.order,
            &self.inlets,
            &self.outlets,
            payloads,
        )?;
        debug!(results = results.len(), "Pipeline run complete");
        Ok(results)
    }

    /// Clear the per-run state of every node. Wiring is kept.
    pub fn reset(&mut self) -> Result<()> {
        for id in &self.nodes {
            self.arena.reset(*id)?;
        }
        Ok(())
    }

    /// Pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inlets, in payload order.
    pub fn inlets(&self) -> &[NodeId] {
        &self.inlets
    }

    /// Outlets, in result order.
    pub fn outlets(&self) -> &[NodeId] {
        &self.outlets
    }

    /// Every node of the pipeline, in discovery order from the inlets.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The execution order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the pipeline has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is one of the pipeline's nodes.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// The underlying arena.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// The Petri net the order was found in.
    pub fn net(&self) -> &PetriNet {
        &self.net
    }

    /// Get the configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Shapes of the payloads the inlets last received.
    ///
    /// `None` until every inlet has run.
    pub fn input_shapes(&self) -> Option<Vec<DataShape>> {
        self.collect_shapes(&self.inlets, |node| node.input_shapes())
    }

    /// Shapes of the payloads the outlets last emitted.
    ///
    /// `None` until every outlet has run.
    pub fn output_shapes(&self) -> Option<Vec<DataShape>> {
        self.collect_shapes(&self.outlets, |node| node.output_shapes())
    }

    fn collect_shapes(
        &self,
        ids: &[NodeId],
        f: impl Fn(&Node) -> Option<&[DataShape]>,
    ) -> Option<Vec<DataShape>> {
        let mut shapes = Vec::new();
        for id in ids {
            let node = self.arena.get(*id).ok()?;
            shapes.extend_from_slice(f(node)?);
        }
        Some(shapes)
    }

    /// Give up the arena and the endpoint lists.
    pub fn into_parts(self) -> (NodeArena, Vec<NodeId>, Vec<NodeId>) {
        (self.arena, self.inlets, self.outlets)
    }
}

fn check_endpoints(arena: &NodeArena, inlets: &[NodeId], outlets: &[NodeId]) -> Result<()> {
    if inlets.is_empty() {
        return Err(SluiceError::InvalidTopology {
            cause: "a pipeline needs at least one inlet".to_string(),
        });
    }
    for id in inlets {
        let node = arena.get(*id)?;
        if node.kind() != NodeKind::Inlet {
            return Err(SluiceError::WrongNodeKind {
                node_id: *id,
                role: "inlet",
                actual: node.kind(),
            });
        }
        if !node.upstream().is_empty() {
            return Err(SluiceError::InletHasUpstream { node_id: *id });
        }
    }
    for id in outlets {
        let node = arena.get(*id)?;
        if node.kind() != NodeKind::Outlet {
            return Err(SluiceError::WrongNodeKind {
                node_id: *id,
                role: "outlet",
                actual: node.kind(),
            });
        }
        if !node.downstream().is_empty() {
            return Err(SluiceError::OutletHasDownstream { node_id: *id });
        }
    }

    let mut seen = HashSet::new();
    if let Some(dup) = inlets.iter().chain(outlets).find(|id| !seen.insert(**id)) {
        return Err(SluiceError::InvalidTopology {
            cause: format!("{} is listed more than once as an inlet or outlet", dup),
        });
    }
    Ok(())
}

/// Nodes reachable from `inlets` along downstream edges, breadth first.
fn closure(arena: &NodeArena, inlets: &[NodeId]) -> Result<Vec<NodeId>> {
    let mut seen: HashSet<NodeId> = inlets.iter().copied().collect();
    let mut queue: VecDeque<NodeId> = inlets.iter().copied().collect();
    let mut nodes = Vec::new();
    while let Some(id) = queue.pop_front() {
        nodes.push(id);
        for next in arena.get(id)?.downstream() {
            if seen.insert(*next) {
                queue.push_back(*next);
            }
        }
    }
    Ok(nodes)
}

fn check_closure(arena: &NodeArena, nodes: &[NodeId], outlets: &[NodeId]) -> Result<()> {
    let members: HashSet<NodeId> = nodes.iter().copied().collect();
    let declared: HashSet<NodeId> = outlets.iter().copied().collect();

    for id in nodes {
        let node = arena.get(*id)?;
        if let Some(upstream) = node.upstream().iter().find(|u| !members.contains(*u)) {
            return Err(SluiceError::UnreachableUpstream {
                node_id: *id,
                upstream: *upstream,
            });
        }
        match node.kind() {
            NodeKind::Outlet if !declared.contains(id) => {
                return Err(SluiceError::InvalidTopology {
                    cause: format!("outlet {} is reachable but not declared", id),
                });
            }
            NodeKind::Outlet => {}
            _ if node.downstream().is_empty() => {
                return Err(SluiceError::DanglingNode { node_id: *id });
            }
            _ => {}
        }
        for req in node.requirements() {
            if !members.contains(&req.producer) {
                return Err(SluiceError::RequirementOutsideGraph {
                    consumer: *id,
                    producer: req.producer,
                });
            }
            arena.check_requirement(*id, req)?;
        }
    }

    if let Some(outlet) = outlets.iter().find(|o| !members.contains(*o)) {
        return Err(SluiceError::InvalidTopology {
            cause: format!("outlet {} is not reachable from any inlet", outlet),
        });
    }
    Ok(())
}

/// A fan-out node wired to several consumers emits one output per edge.
/// A declared arity that disagrees is replaced by the edge count.
fn reconcile_fan_arity(arena: &mut NodeArena, nodes: &[NodeId]) -> Result<()> {
    for id in nodes {
        let node = arena.get(*id)?;
        let edges = node.downstream().len();
        match (node.kind(), node.n_result()) {
            (NodeKind::FanOut, Some(declared)) if edges > 1 && declared != edges => {
                warn!(
                    node_id = %id,
                    declared,
                    edges,
                    "Declared fan-out arity disagrees with wiring; using edge count"
                );
                arena.set_n_result(*id, Some(edges))?;
            }
            _ => {}
        }
    }
    Ok(())
}
