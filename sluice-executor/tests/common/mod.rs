//! Common test utilities for integration tests.

#![allow(dead_code)]

use sluice_core::error::Result;
use sluice_core::node::{NodeArena, NodeKind, Requirement};
use sluice_core::traits::{FnKernel, Kernel, KernelContext, KernelInfo, PassThrough};
use sluice_core::types::NodeId;
use sluice_core::value::Value;
use sluice_executor::pipeline::Pipeline;

/// Emits whatever was injected into its `shape` argument.
#[derive(Debug, Default)]
pub struct ShapeEcho {
    shape: Option<Value>,
}

impl Kernel for ShapeEcho {
    fn info(&self) -> KernelInfo {
        KernelInfo::new("test", "shape_echo")
    }

    fn transform(&mut self, _ctx: &KernelContext, _inputs: Vec<Value>) -> Result<Vec<Value>> {
        Ok(vec![self.shape.clone().unwrap_or_default()])
    }

    fn arguments(&self) -> &[&'static str] {
        &["shape"]
    }

    fn set_argument(&mut self, _name: &str, value: Value) -> Result<()> {
        self.shape = Some(value);
        Ok(())
    }

    fn reset(&mut self) {
        self.shape = None;
    }
}

/// Adds `n` to an integer payload.
pub fn adder(n: i64) -> FnKernel {
    FnKernel::map(format!("add{}", n), move |v| {
        Ok(Value::int(v.inner().as_i64().unwrap_or(0) + n))
    })
}

/// Build `inlet -> e_1 -> ... -> e_n -> outlet` with pass-through elements.
///
/// Returns the arena and all ids in wiring order.
pub fn linear_arena(n: usize) -> (NodeArena, Vec<NodeId>) {
    let mut arena = NodeArena::new();
    let mut ids = vec![arena.inlet("in")];
    for k in 0..n {
        ids.push(arena.add(NodeKind::Element, format!("e{}", k), PassThrough));
    }
    ids.push(arena.outlet("out"));
    for pair in ids.windows(2) {
        arena.connect(pair[0], pair[1]).unwrap();
    }
    (arena, ids)
}

/// Build `I -> S -> {X -> OX, Y -> OY}` with `S` declaring `n_result = 2`.
///
/// Returns the pipeline and `[I, S, X, Y, OX, OY]`.
pub fn fan_out_pipeline() -> (Pipeline, Vec<NodeId>) {
    let mut arena = NodeArena::new();
    let i = arena.inlet("I");
    let s = arena.add(NodeKind::FanOut, "S", PassThrough);
    arena.set_n_result(s, Some(2)).unwrap();
    let x = arena.add(NodeKind::Element, "X", PassThrough);
    let y = arena.add(NodeKind::Element, "Y", PassThrough);
    let ox = arena.outlet("OX");
    let oy = arena.outlet("OY");
    arena.connect(i, s).unwrap();
    arena.connect(s, x).unwrap();
    arena.connect(s, y).unwrap();
    arena.connect(x, ox).unwrap();
    arena.connect(y, oy).unwrap();

    let pipeline = Pipeline::new(arena, vec![i], vec![ox, oy]).unwrap();
    (pipeline, vec![i, s, x, y, ox, oy])
}

/// Build `I -> S -> {A, B} -> M -> O` where `A` adds 1 and `B` adds 10.
///
/// Returns the pipeline and `[I, S, A, B, M, O]`.
pub fn diamond_pipeline() -> (Pipeline, Vec<NodeId>) {
    let mut arena = NodeArena::new();
    let i = arena.inlet("I");
    let s = arena.add(NodeKind::FanOut, "S", PassThrough);
    let a = arena.add(NodeKind::Element, "A", adder(1));
    let b = arena.add(NodeKind::Element, "B", adder(10));
    let m = arena.add(NodeKind::FanIn, "M", PassThrough);
    let o = arena.outlet("O");
    arena.connect(i, s).unwrap();
    arena.connect(s, a).unwrap();
    arena.connect(s, b).unwrap();
    arena.connect(a, m).unwrap();
    arena.connect(b, m).unwrap();
    arena.connect(m, o).unwrap();

    let pipeline = Pipeline::new(arena, vec![i], vec![o]).unwrap();
    (pipeline, vec![i, s, a, b, m, o])
}

/// Build two independent chains `I1 -> A -> O1` and `I2 -> B -> O2` where
/// `B` takes `A`'s `output_shape` through a requirement.
///
/// `B` is created before `A`, so only the requirement puts `A` first.
/// Returns the arena and `[I1, I2, A, B, O1, O2]`.
pub fn requirement_arena() -> (NodeArena, Vec<NodeId>) {
    let mut arena = NodeArena::new();
    let i2 = arena.inlet("I2");
    let b = arena.add(NodeKind::Element, "B", ShapeEcho::default());
    let o2 = arena.outlet("O2");
    let i1 = arena.inlet("I1");
    let a = arena.add(NodeKind::Element, "A", PassThrough);
    let o1 = arena.outlet("O1");
    arena.connect(i1, a).unwrap();
    arena.connect(a, o1).unwrap();
    arena.connect(i2, b).unwrap();
    arena.connect(b, o2).unwrap();
    arena
        .add_requirement(b, [Requirement::new(a, "output_shape", "shape")])
        .unwrap();
    (arena, vec![i1, i2, a, b, o1, o2])
}

/// Position of `id` in `order`.
pub fn position(order: &[NodeId], id: NodeId) -> usize {
    order
        .iter()
        .position(|n| *n == id)
        .unwrap_or_else(|| panic!("{} missing from order", id))
}

/// Check that every edge and requirement of `pipeline` points forward in
/// its order, and that the order lists every node exactly once.
pub fn assert_valid_order(pipeline: &Pipeline) {
    let order = pipeline.order();
    assert_eq!(order.len(), pipeline.len());
    for id in pipeline.nodes() {
        assert_eq!(order.iter().filter(|n| *n == id).count(), 1);
        let node = pipeline.arena().get(*id).unwrap();
        for down in node.downstream() {
            assert!(position(order, *id) < position(order, *down));
        }
        for req in node.requirements() {
            assert!(position(order, req.producer) < position(order, *id));
        }
    }
}
