//! Writing pipelines back to definitions.

use crate::pipeline::Pipeline;
use sluice_core::error::Result;
use sluice_core::flow::{DefinitionSection, NodeConfig, PipelineDefinition};
use sluice_core::node::Node;
use sluice_core::traits::PassThrough;
use sluice_core::value::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

impl Pipeline {
    /// Describe the pipeline as a definition.
    ///
    /// Kernels that cannot be described by their configuration, such as
    /// closures, are written as `std::identity` with a warning.
    pub fn to_definition(&self) -> Result<PipelineDefinition> {
        let mut definition = PipelineDefinition::new(self.name());
        for id in self.inlets() {
            let node = self.arena().get(*id)?;
            definition.inlets.push(node_config(node, DefinitionSection::Inlets));
        }
        for id in self.outlets() {
            let node = self.arena().get(*id)?;
            definition.outlets.push(node_config(node, DefinitionSection::Outlets));
        }

        let endpoints: HashSet<_> = self.inlets().iter().chain(self.outlets()).collect();
        for id in self.nodes().iter().filter(|id| !endpoints.contains(id)) {
            let node = self.arena().get(*id)?;
            definition.elements.push(node_config(node, DefinitionSection::Elements));
        }
        Ok(definition)
    }

    /// Write the definition to a file, as JSON or YAML by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_definition()?.save(path.as_ref())
    }
}

fn node_config(node: &Node, section: DefinitionSection) -> NodeConfig {
    let kernel = node.kernel();
    let (kernel_type, attributes) = if kernel.serializable() {
        (kernel.info().name, kernel.config())
    } else {
        warn!(
            node_id = %node.id(),
            kernel = %kernel.info().name,
            "Kernel cannot be serialized; writing a pass-through instead"
        );
        (PassThrough::KERNEL_TYPE.to_string(), Value::null())
    };

    NodeConfig {
        id: node.id(),
        name: node.name().to_string(),
        kind: (node.kind() != section.default_kind()).then_some(node.kind()),
        kernel: kernel_type,
        upstream: node.upstream().to_vec(),
        downstream: node.downstream().to_vec(),
        requirements: node.requirements().iter().cloned().collect(),
        n_result: node.n_result(),
        attributes,
    }
}
