//! Integration tests for dataflow execution.
//!
//! Tests payload routing, fan-out and fan-in arity, requirement injection,
//! reset and cancellation.

mod common;

use sluice_core::error::SluiceError;
use sluice_core::node::{FlowData, NodeArena, NodeKind};
use sluice_core::traits::{FnKernel, PassThrough};
use sluice_core::value::Value;
use sluice_executor::pipeline::Pipeline;
use sluice_executor::scheduler::CancellationToken;

use common::{diamond_pipeline, fan_out_pipeline, linear_arena, requirement_arena};

fn json(s: &str) -> Value {
    Value::from_json_str(s).unwrap()
}

#[test]
fn identity_chain_passes_payload_through() {
    let (arena, ids) = linear_arena(1);
    let mut pipeline = Pipeline::new(arena, vec![ids[0]], vec![ids[2]]).unwrap();
    assert_eq!(pipeline.order(), ids.as_slice());

    let out = pipeline.run(vec![json("[1, 2, 3]")]).unwrap();
    assert_eq!(out, vec![json("[1, 2, 3]")]);
}

#[test]
fn fan_out_copies_to_each_branch() {
    let (mut pipeline, _) = fan_out_pipeline();
    let out = pipeline.run(vec![json("[5]")]).unwrap();
    assert_eq!(out, vec![json("[5]"), json("[5]")]);
}

#[test]
fn fan_out_with_wrong_output_count_fails() {
    let mut arena = NodeArena::new();
    let i = arena.inlet("I");
    let s = arena.add(
        NodeKind::FanOut,
        "S",
        FnKernel::new("single", |_ctx, inputs| Ok(inputs)),
    );
    let a = arena.outlet("A");
    let b = arena.outlet("B");
    arena.connect(i, s).unwrap();
    arena.connect(s, a).unwrap();
    arena.connect(s, b).unwrap();
    let mut pipeline = Pipeline::new(arena, vec![i], vec![a, b]).unwrap();

    let err = pipeline.run(vec![Value::int(1)]).unwrap_err();
    assert!(matches!(
        err,
        SluiceError::OutputArityMismatch { node_id, expected: 2, actual: 1 } if node_id == s
    ));
    assert!(err.is_execution_error());
}

#[test]
fn fan_out_outputs_follow_edge_order() {
    let mut arena = NodeArena::new();
    let i = arena.inlet("I");
    let s = arena.add(
        NodeKind::FanOut,
        "S",
        FnKernel::new("count", |ctx, _inputs| {
            Ok((0..ctx.expected_outputs).map(|k| Value::int(k as i64)).collect())
        }),
    );
    let a = arena.outlet("A");
    let b = arena.outlet("B");
    let c = arena.outlet("C");
    arena.connect(i, s).unwrap();
    arena.connect(s, c).unwrap();
    arena.connect(s, a).unwrap();
    arena.connect(s, b).unwrap();
    let mut pipeline = Pipeline::new(arena, vec![i], vec![a, b, c]).unwrap();

    let out = pipeline.run(vec![Value::null()]).unwrap();
    assert_eq!(out, vec![Value::int(1), Value::int(2), Value::int(0)]);
}

#[test]
fn declared_arity_with_single_consumer_sends_all_outputs_there() {
    let mut arena = NodeArena::new();
    let i = arena.inlet("I");
    let s = arena.add(NodeKind::FanOut, "S", PassThrough);
    arena.set_n_result(s, Some(3)).unwrap();
    let t = arena.add(NodeKind::Element, "T", PassThrough);
    let o = arena.outlet("O");
    arena.connect(i, s).unwrap();
    arena.connect(s, t).unwrap();
    arena.connect(t, o).unwrap();
    let mut pipeline = Pipeline::new(arena, vec![i], vec![o]).unwrap();

    let out = pipeline.run(vec![Value::int(4)]).unwrap();
    assert_eq!(out, vec![json("[4, 4, 4]")]);
}

#[test]
fn parallel_edges_each_carry_one_output() {
    let mut arena = NodeArena::new();
    let i = arena.inlet("I");
    let s = arena.add(NodeKind::FanOut, "S", PassThrough);
    let m = arena.add(NodeKind::FanIn, "M", PassThrough);
    let o = arena.outlet("O");
    arena.connect(i, s).unwrap();
    arena.connect(s, m).unwrap();
    arena.connect(s, m).unwrap();
    arena.connect(m, o).unwrap();
    let mut pipeline = Pipeline::new(arena, vec![i], vec![o]).unwrap();

    let out = pipeline.run(vec![Value::int(4)]).unwrap();
    assert_eq!(out, vec![json("[4, 4]")]);
}

#[test]
fn fan_in_waits_for_both_branches() {
    let (mut pipeline, ids) = diamond_pipeline();
    let m = ids[4];
    let order = pipeline.order().to_vec();
    let m_at = order.iter().position(|n| *n == m).unwrap();
    // both branches ran before the join in the schedule
    assert!(order[..m_at].contains(&ids[2]));
    assert!(order[..m_at].contains(&ids[3]));

    let out = pipeline.run(vec![Value::int(0)]).unwrap();
    assert_eq!(out, vec![json("[1, 10]")]);
    assert_eq!(
        pipeline.arena().get(m).unwrap().input_shapes().unwrap().len(),
        2
    );
}

#[test]
fn fan_in_with_one_input_does_not_fire() {
    let mut arena = NodeArena::new();
    let a = arena.inlet("A");
    let b = arena.inlet("B");
    let m = arena.add(NodeKind::FanIn, "M", PassThrough);
    let o = arena.outlet("O");
    arena.connect(a, m).unwrap();
    arena.connect(b, m).unwrap();
    arena.connect(m, o).unwrap();
    let from_a = arena
        .flow(a, vec![FlowData::injected(a, Value::int(1))])
        .unwrap();

    // one of two inputs delivered: the join is still waiting
    assert_eq!(arena.waiting_on(m).unwrap(), vec![b]);
    assert!(!arena.can_execute(m).unwrap());
    let err = arena.flow(m, from_a.clone()).unwrap_err();
    assert!(matches!(
        err,
        SluiceError::PreconditionFailed { waiting_on, .. } if waiting_on == vec![b]
    ));

    // b ran but its envelope never arrived
    arena
        .flow(b, vec![FlowData::injected(b, Value::int(2))])
        .unwrap();
    let err = arena.flow(m, from_a).unwrap_err();
    assert!(matches!(
        err,
        SluiceError::MissingInput { from: Some(from), .. } if from == b
    ));
    assert!(!arena.get(m).unwrap().executed());

    let mut pipeline = Pipeline::new(arena, vec![a, b], vec![o]).unwrap();
    let out = pipeline.run(vec![Value::int(1), Value::int(2)]).unwrap();
    assert_eq!(out, vec![json("[1, 2]")]);
}

#[test]
fn requirement_value_reaches_consumer() {
    let (arena, ids) = requirement_arena();
    let (i1, i2, o1, o2) = (ids[0], ids[1], ids[4], ids[5]);
    let mut pipeline = Pipeline::new(arena, vec![i1, i2], vec![o1, o2]).unwrap();

    let out = pipeline
        .run(vec![json("[1, 2, 3, 4]"), Value::string("ignored")])
        .unwrap();
    assert_eq!(out[0], json("[1, 2, 3, 4]"));
    assert_eq!(out[1], json("[4]"));
}

#[test]
fn wrong_payload_count_is_rejected() {
    let (mut pipeline, _) = fan_out_pipeline();
    let err = pipeline.run(vec![]).unwrap_err();
    assert!(matches!(
        err,
        SluiceError::InputCountMismatch { expected: 1, actual: 0 }
    ));
}

#[test]
fn reset_allows_fresh_run() {
    let (mut pipeline, ids) = diamond_pipeline();
    pipeline.run(vec![Value::int(0)]).unwrap();
    pipeline.reset().unwrap();

    for id in &ids {
        let node = pipeline.arena().get(*id).unwrap();
        assert!(!node.executed());
        assert!(node.input_shapes().is_none());
        assert!(node.output_shapes().is_none());
    }
    assert!(pipeline.input_shapes().is_none());

    let out = pipeline.run(vec![Value::int(100)]).unwrap();
    assert_eq!(out, vec![json("[101, 110]")]);
}

#[test]
fn pipeline_shapes_reflect_last_run() {
    let (arena, ids) = linear_arena(2);
    let mut pipeline = Pipeline::new(arena, vec![ids[0]], vec![ids[3]]).unwrap();
    pipeline.run(vec![json("[[1, 2], [3, 4], [5, 6]]")]).unwrap();

    let input = pipeline.input_shapes().unwrap();
    assert_eq!(input[0].dims, vec![3, 2]);
    let output = pipeline.output_shapes().unwrap();
    assert_eq!(output[0].dims, vec![3, 2]);
}

#[test]
fn cancellation_stops_the_run() {
    let token = CancellationToken::new();
    let trip = token.clone();

    let mut arena = NodeArena::new();
    let i = arena.inlet("I");
    let t = arena.add(
        NodeKind::Element,
        "trip",
        FnKernel::map("trip", move |v| {
            if v == Value::int(1) {
                trip.cancel();
            }
            Ok(v)
        }),
    );
    let o = arena.outlet("O");
    arena.connect(i, t).unwrap();
    arena.connect(t, o).unwrap();
    let mut pipeline = Pipeline::new(arena, vec![i], vec![o]).unwrap();
    pipeline.set_cancellation(token.clone());

    let err = pipeline.run(vec![Value::int(1)]).unwrap_err();
    assert!(matches!(err, SluiceError::Cancelled { node_id } if node_id == o));
    assert!(!pipeline.arena().get(o).unwrap().executed());

    token.reset();
    assert_eq!(pipeline.run(vec![Value::int(2)]).unwrap(), vec![Value::int(2)]);
}

#[test]
fn kernel_errors_propagate_unchanged() {
    let mut arena = NodeArena::new();
    let i = arena.inlet("I");
    let t = arena.add(
        NodeKind::Element,
        "fail",
        FnKernel::new("fail", |ctx, _inputs| Err(ctx.fail("fn::fail", "no field 'x'"))),
    );
    let o = arena.outlet("O");
    arena.connect(i, t).unwrap();
    arena.connect(t, o).unwrap();
    let mut pipeline = Pipeline::new(arena, vec![i], vec![o]).unwrap();

    let err = pipeline.run(vec![Value::null()]).unwrap_err();
    assert_eq!(err.code(), "E401");
    assert!(err.to_string().contains("no field 'x'"));
}
