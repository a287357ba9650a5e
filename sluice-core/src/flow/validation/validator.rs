//! Definition validation logic.

use std::collections::{HashMap, HashSet};

use super::ValidationResult;
use super::error::{ValidationError, ValidationErrorKind};
use crate::flow::{DefinitionSection, NodeConfig, PipelineDefinition};
use crate::types::NodeId;

/// Validator for pipeline definitions.
///
/// Collects every problem instead of stopping at the first one.
#[derive(Default)]
pub struct DefinitionValidator {
    errors: Vec<ValidationError>,
}

impl DefinitionValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a pipeline definition.
    pub fn validate(mut self, def: &PipelineDefinition) -> ValidationResult {
        self.validate_metadata(def);
        let ids = self.validate_ids(def);
        self.validate_kinds(def);
        self.validate_references(def, &ids);
        self.validate_edge_symmetry(def, &ids);

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    fn validate_metadata(&mut self, def: &PipelineDefinition) {
        if def.name.is_empty() {
            self.add_error(ValidationError::missing_field("pipeline", "name"));
        }
        if def.inlets.is_empty() {
            self.add_error(ValidationError::missing_field("pipeline", "inlets"));
        }
        if def.outlets.is_empty() {
            self.add_error(ValidationError::missing_field("pipeline", "outlets"));
        }
    }

    fn validate_ids(&mut self, def: &PipelineDefinition) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        for (section, node) in def.nodes() {
            if !seen.insert(node.id) {
                self.add_error(ValidationError::duplicate_id(location(section, node), node.id));
            }
        }
        seen
    }

    fn validate_kinds(&mut self, def: &PipelineDefinition) {
        for (section, node) in def.nodes() {
            let loc = location(section, node);
            let kind = node.kind.unwrap_or(section.default_kind());
            if !section.admits(kind) {
                self.add_error(ValidationError::new(
                    ValidationErrorKind::InvalidKind,
                    &loc,
                    format!("{} node cannot be listed under '{}'", kind, section.key()),
                ));
            }
            if section == DefinitionSection::Inlets && !node.upstream.is_empty() {
                self.add_error(ValidationError::invalid_value(
                    &loc,
                    "inlets cannot have upstream nodes",
                ));
            }
            if section == DefinitionSection::Outlets && !node.downstream.is_empty() {
                self.add_error(ValidationError::invalid_value(
                    &loc,
                    "outlets cannot have downstream nodes",
                ));
            }
            if node.n_result == Some(0) {
                self.add_error(ValidationError::invalid_value(
                    &loc,
                    "n_result must be at least 1",
                ));
            }
        }
    }

    fn validate_references(&mut self, def: &PipelineDefinition, ids: &HashSet<NodeId>) {
        for (section, node) in def.nodes() {
            let loc = location(section, node);
            let edges = node.upstream.iter().chain(node.downstream.iter());
            let producers = node.requirements.iter().map(|r| &r.producer);
            let missing: Vec<NodeId> = edges
                .chain(producers)
                .filter(|id| !ids.contains(id))
                .copied()
                .collect();
            for id in missing {
                self.add_error(ValidationError::invalid_reference(&loc, id));
            }
        }
    }

    /// Every `a -> b` listed in `a.downstream` must appear as often in `b.upstream`.
    fn validate_edge_symmetry(&mut self, def: &PipelineDefinition, ids: &HashSet<NodeId>) {
        let mut downstream_edges: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        let mut upstream_edges: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        for (_, node) in def.nodes() {
            for to in &node.downstream {
                *downstream_edges.entry((node.id, *to)).or_default() += 1;
            }
            for from in &node.upstream {
                *upstream_edges.entry((*from, node.id)).or_default() += 1;
            }
        }

        let mut pairs: Vec<(NodeId, NodeId)> = downstream_edges
            .keys()
            .chain(upstream_edges.keys())
            .copied()
            .filter(|(from, to)| ids.contains(from) && ids.contains(to))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();

        for (from, to) in pairs {
            let down = downstream_edges.get(&(from, to)).copied().unwrap_or(0);
            let up = upstream_edges.get(&(from, to)).copied().unwrap_or(0);
            if down != up {
                self.add_error(ValidationError::new(
                    ValidationErrorKind::InconsistentEdge,
                    format!("edge {} -> {}", from, to),
                    format!(
                        "listed {} time(s) downstream of {} but {} time(s) upstream of {}",
                        down, from, up, to
                    ),
                ));
            }
        }
    }
}

fn location(section: DefinitionSection, node: &NodeConfig) -> String {
    format!("{}.{}", section.key(), node.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, Requirement};

    fn linear() -> PipelineDefinition {
        PipelineDefinition::new("linear")
            .with_inlet(NodeConfig::new(NodeId::new(0), "in").with_downstream([NodeId::new(1)]))
            .with_element(
                NodeConfig::new(NodeId::new(1), "t")
                    .with_upstream([NodeId::new(0)])
                    .with_downstream([NodeId::new(2)]),
            )
            .with_outlet(NodeConfig::new(NodeId::new(2), "out").with_upstream([NodeId::new(1)]))
    }

    fn kinds(def: &PipelineDefinition) -> Vec<ValidationErrorKind> {
        DefinitionValidator::new()
            .validate(def)
            .unwrap_err()
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn validate_linear_definition() {
        assert!(DefinitionValidator::new().validate(&linear()).is_ok());
    }

    #[test]
    fn validate_missing_name_and_sections() {
        let def = PipelineDefinition::new("");
        let errors = DefinitionValidator::new().validate(&def).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(
            errors
                .iter()
                .all(|e| e.kind == ValidationErrorKind::MissingField && e.location == "pipeline")
        );
    }

    #[test]
    fn validate_duplicate_ids() {
        let mut def = linear();
        def.elements[0].id = NodeId::new(0);
        assert!(kinds(&def).contains(&ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn validate_unknown_requirement_producer() {
        let mut def = linear();
        def.elements[0]
            .requirements
            .push(Requirement::new(NodeId::new(9), "name", "label"));
        let errors = DefinitionValidator::new().validate(&def).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidReference);
        assert_eq!(errors[0].location, "elements.node_1");
    }

    #[test]
    fn validate_kind_matches_section() {
        let mut def = linear();
        def.elements[0].kind = Some(NodeKind::Outlet);
        def.inlets[0].kind = Some(NodeKind::FanOut);
        let found = kinds(&def);
        assert_eq!(
            found
                .iter()
                .filter(|k| **k == ValidationErrorKind::InvalidKind)
                .count(),
            2
        );
    }

    #[test]
    fn validate_one_sided_edge() {
        let mut def = linear();
        def.outlets[0].upstream.clear();
        assert_eq!(kinds(&def), vec![ValidationErrorKind::InconsistentEdge]);
    }

    #[test]
    fn validate_inlet_with_upstream() {
        let mut def = linear();
        def.inlets[0].upstream.push(NodeId::new(1));
        def.elements[0].downstream.push(NodeId::new(0));
        let found = kinds(&def);
        assert!(found.contains(&ValidationErrorKind::InvalidValue));
    }
}
