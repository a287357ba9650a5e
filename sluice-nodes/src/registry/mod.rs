//! Kernel registry and metadata for the standard library.
//!
//! [`standard_registry`] returns a [`KernelRegistry`] that can build every
//! standard kernel from a definition. [`standard_catalog`] describes the
//! same kernels (arguments, attributes, configuration schema) for
//! introspection.

use crate::{data, flow};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sluice_core::error::{Result, SluiceError};
use sluice_core::node::NodeKind;
use sluice_core::traits::{Kernel, KernelFactory, KernelRegistry};
use sluice_core::value::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Kernel category for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelCategory {
    /// Kernels that shape the flow (duplicate, concat, identity).
    Flow,
    /// Kernels that transform payloads (split, scale, pad, select).
    Data,
}

/// Complete metadata for a kernel type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelDescriptor {
    /// Kernel type identifier (e.g., "std::pad").
    #[serde(rename = "type")]
    pub kernel_type: String,

    /// Category for organization.
    pub category: KernelCategory,

    /// The node kind the kernel is written for.
    pub kind: NodeKind,

    /// What the kernel does.
    pub description: String,

    /// Arguments a requirement can set.
    #[serde(default)]
    pub arguments: Vec<String>,

    /// Attributes a requirement can read, besides the built-in ones.
    #[serde(default)]
    pub attributes: Vec<String>,

    /// JSON schema of the `attributes` a definition passes to the factory.
    pub config_schema: serde_json::Value,
}

/// Kernels that can be built from a definition's `attributes`.
pub trait StandardKernel: Kernel + Sized + 'static {
    /// Registered type name.
    const KERNEL_TYPE: &'static str;

    /// Build the kernel from its configuration. Null selects the defaults.
    fn from_config(config: &Value) -> Result<Self>;

    /// Metadata for the catalog.
    fn descriptor() -> KernelDescriptor;
}

/// [`KernelFactory`] for any [`StandardKernel`].
pub struct StandardFactory<K>(PhantomData<fn() -> K>);

impl<K> Default for StandardFactory<K> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<K: StandardKernel> KernelFactory for StandardFactory<K> {
    fn kernel_type(&self) -> &str {
        K::KERNEL_TYPE
    }

    fn create(&self, config: &Value) -> Result<Box<dyn Kernel>> {
        Ok(Box::new(K::from_config(config)?))
    }
}

/// Parse a kernel configuration, using the defaults for null.
pub(crate) fn parse_config<T: DeserializeOwned + Default>(
    kernel_type: &str,
    config: &Value,
) -> Result<T> {
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.inner().clone()).map_err(|e| SluiceError::ConfigValue {
        field: format!("{}.attributes", kernel_type),
        cause: e.to_string(),
    })
}

/// JSON schema of a kernel's configuration type.
pub(crate) fn config_schema<T: JsonSchema>() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default()
}

/// Descriptions of kernel types, keyed by type name.
#[derive(Debug, Default)]
pub struct KernelCatalog {
    kernels: BTreeMap<String, KernelDescriptor>,
}

impl KernelCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kernel type by calling its descriptor() method.
    pub fn register<K: StandardKernel>(&mut self) {
        let descriptor = K::descriptor();
        self.kernels.insert(descriptor.kernel_type.clone(), descriptor);
    }

    /// Get metadata for a kernel type.
    pub fn get(&self, kernel_type: &str) -> Option<&KernelDescriptor> {
        self.kernels.get(kernel_type)
    }

    /// All descriptors, sorted by type name.
    pub fn all(&self) -> Vec<&KernelDescriptor> {
        self.kernels.values().collect()
    }
}

/// Registry that builds every standard kernel, plus `std::identity`.
pub fn standard_registry() -> KernelRegistry {
    let mut registry = KernelRegistry::new();
    registry.register(StandardFactory::<flow::Duplicate>::default());
    registry.register(StandardFactory::<flow::Concat>::default());
    registry.register(StandardFactory::<data::Split>::default());
    registry.register(StandardFactory::<data::Scale>::default());
    registry.register(StandardFactory::<data::Pad>::default());
    registry.register(StandardFactory::<data::Select>::default());
    registry
}

/// Catalog describing every standard kernel.
pub fn standard_catalog() -> KernelCatalog {
    let mut catalog = KernelCatalog::new();

    // Flow kernels
    catalog.register::<flow::Duplicate>();
    catalog.register::<flow::Concat>();

    // Data kernels
    catalog.register::<data::Split>();
    catalog.register::<data::Scale>();
    catalog.register::<data::Pad>();
    catalog.register::<data::Select>();

    catalog
}
