//! PipelineLoader - builds pipelines from definitions.

use crate::pipeline::Pipeline;
use crate::scheduler::ExecutorConfig;
use sluice_core::error::{Result, SluiceError};
use sluice_core::flow::PipelineDefinition;
use sluice_core::node::{NodeArena, NodeKind};
use sluice_core::traits::KernelRegistry;
use sluice_core::types::NodeId;
use std::path::Path;
use tracing::{debug, instrument};

/// Configuration for the pipeline loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Run the definition validator before building.
    ///
    /// The pipeline's own construction checks run either way.
    pub validate: bool,
    /// Configuration of the loaded pipelines.
    pub executor: ExecutorConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            validate: true,
            executor: ExecutorConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Create configuration from environment variables.
    ///
    /// See [`ExecutorConfig::from_env`].
    pub fn from_env() -> Self {
        Self {
            validate: true,
            executor: ExecutorConfig::from_env(),
        }
    }

    /// Skip the definition validator.
    pub fn minimal() -> Self {
        Self {
            validate: false,
            ..Self::default()
        }
    }

    /// Set the executor configuration.
    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }
}

/// Builds [`Pipeline`]s from [`PipelineDefinition`]s.
#[derive(Debug, Clone, Default)]
pub struct PipelineLoader {
    config: LoaderConfig,
}

impl PipelineLoader {
    /// Create a loader with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with custom configuration.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a pipeline from a YAML or JSON file.
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        registry: &KernelRegistry,
    ) -> Result<Pipeline> {
        let definition = PipelineDefinition::from_file(path.as_ref())?;
        self.load(&definition, registry)
    }

    /// Load a pipeline from a YAML string.
    pub fn load_yaml(&self, yaml: &str, registry: &KernelRegistry) -> Result<Pipeline> {
        let definition = PipelineDefinition::from_yaml(yaml)?;
        self.load(&definition, registry)
    }

    /// Build a pipeline from a definition.
    ///
    /// Nodes keep their ids. Edges are connected in each node's downstream
    /// order and then put in each node's upstream order, so fan-in inputs
    /// arrive as listed. Every requirement and every construction check of
    /// [`Pipeline::new`] is applied again.
    #[instrument(skip_all, fields(pipeline = %definition.name, nodes = definition.node_count()))]
    pub fn load(
        &self,
        definition: &PipelineDefinition,
        registry: &KernelRegistry,
    ) -> Result<Pipeline> {
        if self.config.validate {
            definition.ensure_valid()?;
        }

        let mut arena = NodeArena::new();
        for (section, node) in definition.nodes() {
            let kind = node.kind.unwrap_or(section.default_kind());
            let kernel = registry.create(&node.kernel, &node.attributes)?;
            arena.insert_with_id(node.id, kind, node.name.clone(), kernel)?;
        }

        for (_, node) in definition.nodes() {
            for to in &node.downstream {
                arena.connect(node.id, *to)?;
            }
        }
        for (_, node) in definition.nodes() {
            arena.order_upstream(node.id, &node.upstream)?;
        }
        for (section, node) in definition.nodes() {
            if node.n_result.is_none() {
                continue;
            }
            let kind = node.kind.unwrap_or(section.default_kind());
            let fans_out = kind == NodeKind::FanOut && node.downstream.len() > 1;
            match arena.set_n_result(node.id, node.n_result) {
                // Corrected to the edge count by Pipeline::with_config.
                Err(SluiceError::ArityExceeded {
                    direction: "downstream",
                    ..
                }) if fans_out => arena.declare_n_result(node.id, node.n_result)?,
                other => other?,
            }
        }
        for (_, node) in definition.nodes() {
            arena.add_requirement(node.id, node.requirements.iter().cloned())?;
        }

        let inlets: Vec<NodeId> = definition.inlets.iter().map(|n| n.id).collect();
        let outlets: Vec<NodeId> = definition.outlets.iter().map(|n| n.id).collect();
        debug!(nodes = arena.len(), "Definition wired");

        Ok(
            Pipeline::with_config(arena, inlets, outlets, self.config.executor.clone())?
                .with_name(definition.name.clone()),
        )
    }
}
