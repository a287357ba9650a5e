//! Combining pipelines.

use super::Pipeline;
use crate::scheduler::ExecutorConfig;
use sluice_core::error::{Result, SluiceError};
use sluice_core::node::NodeArena;
use sluice_core::types::NodeId;
use std::collections::BTreeMap;
use tracing::debug;

impl Pipeline {
    /// Run several pipelines side by side as one.
    ///
    /// The inlets and outlets of the result are those of `pipelines`, in
    /// order. The configuration of the first pipeline is kept.
    pub fn merge(pipelines: Vec<Pipeline>) -> Result<Pipeline> {
        let config = first_config(&pipelines)?;
        let name = joined_name(&pipelines, " | ");

        let mut arena = NodeArena::new();
        let mut inlets = Vec::new();
        let mut outlets = Vec::new();
        for pipeline in pipelines {
            let (part, part_inlets, part_outlets) = pipeline.into_parts();
            let mapping = arena.absorb(part);
            inlets.extend(remap(&mapping, &part_inlets)?);
            outlets.extend(remap(&mapping, &part_outlets)?);
        }

        debug!(inlets = inlets.len(), outlets = outlets.len(), "Merged pipelines");
        Ok(Pipeline::with_config(arena, inlets, outlets, config)?.with_name(name))
    }

    /// Chain pipelines so each one feeds the next.
    ///
    /// Outlet `i` of one pipeline is joined to inlet `i` of the next: both
    /// are removed and replaced by a pass-through element. Adjacent
    /// pipelines must have matching outlet and inlet counts.
    pub fn concatenate(pipelines: Vec<Pipeline>) -> Result<Pipeline> {
        let config = first_config(&pipelines)?;
        let name = joined_name(&pipelines, " -> ");

        let mut arena = NodeArena::new();
        let mut inlets: Vec<NodeId> = Vec::new();
        let mut outlets: Vec<NodeId> = Vec::new();
        for (position, pipeline) in pipelines.into_iter().enumerate() {
            let (part, part_inlets, part_outlets) = pipeline.into_parts();
            let mapping = arena.absorb(part);
            let part_inlets = remap(&mapping, &part_inlets)?;
            let part_outlets = remap(&mapping, &part_outlets)?;

            if position == 0 {
                inlets = part_inlets;
            } else {
                if outlets.len() != part_inlets.len() {
                    return Err(SluiceError::InvalidTopology {
                        cause: format!(
                            "pipeline {} has {} inlet(s) but the previous one has {} outlet(s)",
                            position,
                            part_inlets.len(),
                            outlets.len()
                        ),
                    });
                }
                for (slot, (outlet, inlet)) in outlets.iter().zip(&part_inlets).enumerate() {
                    arena.splice(*outlet, *inlet, format!("bridge_{}_{}", position, slot))?;
                }
            }
            outlets = part_outlets;
        }

        debug!(inlets = inlets.len(), outlets = outlets.len(), "Concatenated pipelines");
        Ok(Pipeline::with_config(arena, inlets, outlets, config)?.with_name(name))
    }
}

fn first_config(pipelines: &[Pipeline]) -> Result<ExecutorConfig> {
    pipelines
        .first()
        .map(|p| p.config().clone())
        .ok_or_else(|| SluiceError::InvalidTopology {
            cause: "nothing to combine".to_string(),
        })
}

fn joined_name(pipelines: &[Pipeline], separator: &str) -> String {
    pipelines
        .iter()
        .map(Pipeline::name)
        .collect::<Vec<_>>()
        .join(separator)
}

fn remap(mapping: &BTreeMap<NodeId, NodeId>, ids: &[NodeId]) -> Result<Vec<NodeId>> {
    ids.iter()
        .map(|id| {
            mapping
                .get(id)
                .copied()
                .ok_or(SluiceError::UnknownNode { node_id: *id })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::node::NodeKind;
    use sluice_core::traits::FnKernel;
    use sluice_core::value::Value;

    fn adder(n: i64) -> Pipeline {
        let mut arena = NodeArena::new();
        let i = arena.inlet("i");
        let t = arena.add(
            NodeKind::Element,
            "add",
            FnKernel::map("add", move |v| {
                Ok(Value::int(v.inner().as_i64().unwrap_or(0) + n))
            }),
        );
        let o = arena.outlet("o");
        arena.connect(i, t).unwrap();
        arena.connect(t, o).unwrap();
        Pipeline::new(arena, vec![i], vec![o])
            .unwrap()
            .with_name(format!("add{}", n))
    }

    #[test]
    fn merge_keeps_endpoint_order() {
        let mut merged = Pipeline::merge(vec![adder(1), adder(10)]).unwrap();
        assert_eq!(merged.name(), "add1 | add10");
        assert_eq!(merged.len(), 6);
        let out = merged.run(vec![Value::int(0), Value::int(0)]).unwrap();
        assert_eq!(out, vec![Value::int(1), Value::int(10)]);
    }

    #[test]
    fn concatenate_feeds_forward() {
        let mut chained = Pipeline::concatenate(vec![adder(1), adder(10), adder(100)]).unwrap();
        // 3 x (i, t, o) minus two spliced pairs plus two bridges
        assert_eq!(chained.len(), 7);
        assert_eq!(chained.inlets().len(), 1);
        let out = chained.run(vec![Value::int(0)]).unwrap();
        assert_eq!(out, vec![Value::int(111)]);
    }

    #[test]
    fn concatenate_checks_counts() {
        let two = Pipeline::merge(vec![adder(1), adder(2)]).unwrap();
        let err = Pipeline::concatenate(vec![two, adder(3)]).unwrap_err();
        assert_eq!(err.code(), "E113");
    }

    #[test]
    fn nothing_to_combine() {
        assert!(Pipeline::merge(Vec::new()).is_err());
    }
}
