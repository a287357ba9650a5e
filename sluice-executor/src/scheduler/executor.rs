//! Dataflow execution along a precomputed order.
//!
//! The executor walks the schedule once per run. Every node's inbound
//! envelopes wait in a per-node buffer until the node's turn comes; a
//! fan-in node's buffer therefore fills across several upstream steps
//! before it is drained.

use super::reachability::SchedulerConfig;
use serde::{Deserialize, Serialize};
use sluice_core::error::{Result, SluiceError};
use sluice_core::node::{FlowData, NodeArena};
use sluice_core::types::NodeId;
use sluice_core::value::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, debug_span, instrument};

/// Configuration for pipeline construction and execution.
///
/// Deserializes from a partial document; missing fields keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Scheduler search settings.
    pub scheduler: SchedulerConfig,
    /// Reset every node before each run.
    ///
    /// When disabled the caller resets between runs.
    pub auto_reset: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            auto_reset: true,
        }
    }
}

impl ExecutorConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads the scheduler variables (see [`SchedulerConfig::from_env`]) and
    /// `SLUICE_AUTO_RESET` ("false" to disable).
    pub fn from_env() -> Self {
        let auto_reset = std::env::var("SLUICE_AUTO_RESET")
            .map(|s| !(s.eq_ignore_ascii_case("false") || s == "0"))
            .unwrap_or(true);

        Self {
            scheduler: SchedulerConfig::from_env(),
            auto_reset,
        }
    }

    /// Set the scheduler configuration.
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Enable or disable resetting before each run.
    pub fn with_auto_reset(mut self, auto_reset: bool) -> Self {
        self.auto_reset = auto_reset;
        self
    }
}

/// Cooperative cancellation flag checked between node invocations.
///
/// Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create an uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs a scheduled pipeline over an arena.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    cancel: Option<CancellationToken>,
}

impl Executor {
    /// Create an executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `token` before every node.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run `order` once.
    ///
    /// `payloads[i]` is injected into `inlets[i]`; the result holds one
    /// payload per outlet, in `outlets` order.
    #[instrument(
        skip_all,
        fields(nodes = order.len(), inlets = inlets.len(), outlets = outlets.len())
    )]
    pub fn run(
        &self,
        arena: &mut NodeArena,
        order: &[NodeId],
        inlets: &[NodeId],
        outlets: &[NodeId],
        payloads: Vec<Value>,
    ) -> Result<Vec<Value>> {
        if payloads.len() != inlets.len() {
            return Err(SluiceError::InputCountMismatch {
                expected: inlets.len(),
                actual: payloads.len(),
            });
        }

        let mut buffers: HashMap<NodeId, Vec<FlowData>> = HashMap::new();
        for (inlet, payload) in inlets.iter().zip(payloads) {
            buffers
                .entry(*inlet)
                .or_default()
                .push(FlowData::injected(*inlet, payload));
        }

        let mut results: HashMap<NodeId, Value> = HashMap::new();
        for &node_id in order {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(SluiceError::Cancelled { node_id });
            }

            let inputs = buffers.remove(&node_id).unwrap_or_default();
            let outputs = {
                let _span = debug_span!("node", node_id = %node_id).entered();
                let outputs = arena.flow(node_id, inputs)?;
                debug!(outputs = outputs.len(), "Node executed");
                outputs
            };

            for fd in outputs {
                route(&mut buffers, &mut results, node_id, fd)?;
            }
        }

        outlets
            .iter()
            .map(|outlet| {
                results
                    .remove(outlet)
                    .ok_or_else(|| SluiceError::InvalidTopology {
                        cause: format!("outlet {} is not in the execution order", outlet),
                    })
            })
            .collect()
    }
}

/// Queue an envelope for its addressee, or record it as a pipeline result
/// when it leaves an outlet.
fn route(
    buffers: &mut HashMap<NodeId, Vec<FlowData>>,
    results: &mut HashMap<NodeId, Value>,
    node_id: NodeId,
    fd: FlowData,
) -> Result<()> {
    match (fd.to, fd.from) {
        (Some(to), _) => buffers.entry(to).or_default().push(fd),
        (None, Some(from)) => {
            results.insert(from, fd.payload);
        }
        (None, None) => {
            return Err(SluiceError::Misaddressed {
                node_id,
                addressed_to: None,
            });
        }
    }
    Ok(())
}
