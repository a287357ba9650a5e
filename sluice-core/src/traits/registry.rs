//! Kernel registry.

use super::builtin::PassThrough;
use super::kernel::{Kernel, KernelFactory};
use crate::error::{Result, SluiceError};
use crate::value::Value;
use std::collections::HashMap;

/// Maps kernel type names to the factories that build them.
///
/// A registry created with [`KernelRegistry::new`] already knows
/// `std::identity`.
pub struct KernelRegistry {
    factories: HashMap<String, Box<dyn KernelFactory>>,
}

impl KernelRegistry {
    /// Create a registry holding the built-in kernels.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(PassThroughFactory);
        registry
    }

    /// Create a registry with no factories.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory, replacing any factory for the same type.
    pub fn register(&mut self, factory: impl KernelFactory + 'static) {
        self.factories
            .insert(factory.kernel_type().to_string(), Box::new(factory));
    }

    /// Check whether a kernel type is known.
    pub fn contains(&self, kernel_type: &str) -> bool {
        self.factories.contains_key(kernel_type)
    }

    /// Registered type names, sorted.
    pub fn kernel_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Build a kernel of `kernel_type` from `config`.
    pub fn create(&self, kernel_type: &str, config: &Value) -> Result<Box<dyn Kernel>> {
        self.factories
            .get(kernel_type)
            .ok_or_else(|| SluiceError::UnknownKernel {
                kernel_type: kernel_type.to_string(),
            })?
            .create(config)
    }
}

impl Default for KernelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct PassThroughFactory;

impl KernelFactory for PassThroughFactory {
    fn kernel_type(&self) -> &str {
        PassThrough::KERNEL_TYPE
    }

    fn create(&self, _config: &Value) -> Result<Box<dyn Kernel>> {
        Ok(Box::new(PassThrough))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_identity_registered() {
        let registry = KernelRegistry::new();
        assert!(registry.contains("std::identity"));
        let kernel = registry.create("std::identity", &Value::null()).unwrap();
        assert_eq!(kernel.info().name, "std::identity");
    }

    #[test]
    fn unknown_kernel_type() {
        let registry = KernelRegistry::empty();
        let err = registry.create("std::identity", &Value::null()).unwrap_err();
        assert_eq!(err.code(), "E404");
    }
}
