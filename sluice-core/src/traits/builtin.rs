//! Kernels the node model needs without a kernel library.

use super::kernel::{Kernel, KernelContext, KernelInfo};
use crate::error::Result;
use crate::value::Value;
use std::fmt;

/// Forwards its input unchanged.
///
/// Used by inlets and outlets, and as the bridge between concatenated
/// pipelines. With a single input and several expected outputs the input is
/// copied to each; with several inputs and one expected output the inputs
/// are collected into an array.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl PassThrough {
    /// Registered type name.
    pub const KERNEL_TYPE: &'static str = "std::identity";
}

impl Kernel for PassThrough {
    fn info(&self) -> KernelInfo {
        KernelInfo::new("std", "identity").with_description("Forward inputs unchanged")
    }

    fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>> {
        let expected = ctx.expected_outputs;
        match inputs.len() {
            n if n == expected => Ok(inputs),
            1 => {
                let input = &inputs[0];
                Ok((0..expected).map(|_| input.clone()).collect())
            }
            _ if expected == 1 => Ok(vec![Value::array(inputs)]),
            n => Err(ctx.invalid_input(format!(
                "cannot forward {} input(s) to {} output(s)",
                n, expected
            ))),
        }
    }
}

type TransformFn = dyn FnMut(&KernelContext, Vec<Value>) -> Result<Vec<Value>> + Send;

/// A kernel backed by a closure.
///
/// Closure kernels have no serializable configuration; saving a pipeline
/// that contains one writes a pass-through in its place.
pub struct FnKernel {
    name: String,
    f: Box<TransformFn>,
}

impl FnKernel {
    /// Wrap a full transform closure.
    pub fn new(
        name: impl Into<String>,
        f: impl FnMut(&KernelContext, Vec<Value>) -> Result<Vec<Value>> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }

    /// Wrap a 1-to-1 closure applied to each input.
    pub fn map(
        name: impl Into<String>,
        f: impl Fn(Value) -> Result<Value> + Send + 'static,
    ) -> Self {
        Self::new(name, move |_ctx, inputs| inputs.into_iter().map(&f).collect())
    }
}

impl fmt::Debug for FnKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnKernel").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Kernel for FnKernel {
    fn info(&self) -> KernelInfo {
        KernelInfo::new("fn", self.name.as_str())
    }

    fn transform(&mut self, ctx: &KernelContext, inputs: Vec<Value>) -> Result<Vec<Value>> {
        (self.f)(ctx, inputs)
    }

    fn serializable(&self) -> bool {
        false
    }
}
