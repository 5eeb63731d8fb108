// SPDX-License-Identifier: MIT OR Apache-2.0
//! Virtual filter expansion.
//!
//! Expansion walks a scene in authoring order and replaces every virtual
//! filter, depth first, with the nodes its macro produces. Produced nodes
//! take the place of the virtual filter in the output order. Each virtual
//! output port is recorded in the substitution table so links to it can be
//! redirected when they are bound.

use crate::error::{CompileError, Result};
use crate::filter::{Filter, FilterNode};
use crate::resolver::SubstitutionTable;
use crate::virtual_filters::MacroLibrary;

/// Expands the virtual filters of one scene
pub struct Expander<'a> {
    library: &'a MacroLibrary,
    scene: u32,
    max_depth: usize,
}

impl<'a> Expander<'a> {
    /// Create an expander allowing `max_depth` levels of nested macros
    pub fn new(library: &'a MacroLibrary, scene: u32, max_depth: usize) -> Self {
        Self {
            library,
            scene,
            max_depth,
        }
    }

    /// Expand `nodes` into concrete filters, recording virtual ports in `table`
    pub fn expand<'n>(
        &self,
        nodes: impl IntoIterator<Item = &'n FilterNode>,
        table: &mut SubstitutionTable,
    ) -> Result<Vec<Filter>> {
        let mut output = Vec::new();

        // Work stack of (node, remaining depth); pushed in reverse so pops
        // follow authoring order.
        let mut pending: Vec<(FilterNode, usize)> = nodes
            .into_iter()
            .map(|node| (node.clone(), self.max_depth))
            .collect();
        pending.reverse();

        while let Some((node, budget)) = pending.pop() {
            let filter = match node {
                FilterNode::Concrete(filter) => {
                    output.push(filter);
                    continue;
                }
                FilterNode::Virtual(filter) => filter,
            };

            let produced = self.expand_one(&filter, budget, table)?;
            pending.extend(produced.into_iter().rev().map(|inner| (inner, budget - 1)));
        }

        Ok(output)
    }

    fn expand_one(
        &self,
        filter: &Filter,
        budget: usize,
        table: &mut SubstitutionTable,
    ) -> Result<Vec<FilterNode>> {
        if budget == 0 {
            return Err(CompileError::ExpansionDepthExceeded {
                scene: self.scene,
                filter: filter.id.clone(),
                depth: self.max_depth,
            });
        }

        let expander = self
            .library
            .get(filter.kind)
            .ok_or_else(|| CompileError::MissingExpander {
                filter: filter.id.clone(),
                kind: filter.kind,
            })?;

        // Links must target declared inputs; macros forward nothing else.
        let inputs = filter
            .ports()
            .map_err(|err| CompileError::mapping(&filter.id, err))?
            .inputs;
        if let Some(port) = filter.channel_links.keys().find(|port| !inputs.contains_key(*port)) {
            return Err(CompileError::UndeclaredInput {
                scene: self.scene,
                filter: filter.id.clone(),
                port: port.clone(),
            });
        }

        let mut produced = Vec::new();
        expander.instantiate(filter, &mut produced)?;

        for port in expander.output_ports(filter)?.keys() {
            let target = expander.resolve_output_port(filter, port).ok_or_else(|| {
                CompileError::UnsupportedVirtualPort {
                    filter: filter.id.clone(),
                    port: port.clone(),
                }
            })?;
            table.insert(filter.output(port.as_str()), target);
        }

        tracing::debug!(
            "Expanded {} '{}' into {} filters",
            filter.kind,
            filter.id,
            produced.len()
        );
        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::FilterKind;
    use crate::port::PortRef;
    use crate::resolver::Resolver;

    fn expand(nodes: &[FilterNode], max_depth: usize) -> Result<(Vec<Filter>, SubstitutionTable)> {
        let library = MacroLibrary::builtin();
        let mut table = SubstitutionTable::new();
        let filters = Expander::new(&library, 1, max_depth).expand(nodes, &mut table)?;
        Ok((filters, table))
    }

    #[test]
    fn test_concrete_nodes_pass_through() {
        let nodes = vec![
            FilterNode::new(Filter::new("a", FilterKind::ConstantFloat)),
            FilterNode::new(Filter::new("b", FilterKind::Sine)),
        ];
        let (filters, table) = expand(&nodes, 8).unwrap();
        assert_eq!(filters.len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_expansion_keeps_authoring_order() {
        let nodes = vec![
            FilterNode::new(Filter::new("first", FilterKind::ConstantColor)),
            FilterNode::new(Filter::new("wash", FilterKind::DimmedColor)),
            FilterNode::new(Filter::new("last", FilterKind::DebugColor)),
        ];
        let (filters, _) = expand(&nodes, 8).unwrap();
        let ids: Vec<_> = filters.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["first", "wash__main", "wash__mix", "last"]);
    }

    #[test]
    fn test_nested_virtual_ports_chain() {
        let nodes = vec![FilterNode::new(Filter::new("dim", FilterKind::OscillatingDimmer))];
        let (filters, table) = expand(&nodes, 8).unwrap();

        assert!(filters.iter().all(|f| !f.kind.is_virtual()));
        assert!(filters.iter().any(|f| f.id == "dim__osc__time"));

        let resolver = Resolver::new(&table, 8);
        assert_eq!(
            resolver.resolve(&PortRef::new("dim", "value")).unwrap(),
            PortRef::new("dim__convert", "value")
        );
        assert_eq!(
            resolver.resolve(&PortRef::new("dim__osc", "value")).unwrap(),
            PortRef::new("dim__osc__scale", "value")
        );
    }

    #[test]
    fn test_delay_chain_resolves_to_last_stage() {
        let nodes = vec![FilterNode::new(
            Filter::new("d", FilterKind::DelayChain).with_configuration("stages", "3"),
        )];
        let (filters, table) = expand(&nodes, 8).unwrap();

        let ids: Vec<_> = filters.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["d__stage", "d__rest__stage", "d__rest__rest__stage"]);

        let resolver = Resolver::new(&table, 8);
        assert_eq!(
            resolver.resolve(&PortRef::new("d", "value")).unwrap(),
            PortRef::new("d__rest__rest__stage", "value")
        );
    }

    #[test]
    fn test_depth_ceiling() {
        let nodes = vec![FilterNode::new(
            Filter::new("d", FilterKind::DelayChain).with_configuration("stages", "100000"),
        )];
        match expand(&nodes, 16) {
            Err(CompileError::ExpansionDepthExceeded { filter, depth, .. }) => {
                assert!(filter.starts_with("d__rest"));
                assert_eq!(depth, 16);
            }
            other => panic!("expected depth error, got {other:?}"),
        }
    }

    #[test]
    fn test_undeclared_virtual_inputs_are_rejected() {
        let nodes = vec![FilterNode::new(
            Filter::new("osc", FilterKind::SineOscillator)
                .with_link("speed", PortRef::new("missing", "value")),
        )];
        assert_eq!(
            expand(&nodes, 8).unwrap_err(),
            CompileError::UndeclaredInput {
                scene: 1,
                filter: "osc".to_string(),
                port: "speed".to_string(),
            }
        );

        let nodes = vec![FilterNode::new(
            Filter::new("d", FilterKind::DelayChain)
                .with_configuration("stages", "2")
                .with_link("value", PortRef::new("btn", "value"))
                .with_link("bogus", PortRef::new("btn", "value")),
        )];
        assert!(matches!(
            expand(&nodes, 8),
            Err(CompileError::UndeclaredInput { port, .. }) if port == "bogus"
        ));
    }

    #[test]
    fn test_declared_virtual_inputs_are_forwarded() {
        let nodes = vec![FilterNode::new(
            Filter::new("wash", FilterKind::DimmedColor)
                .with_link("color", PortRef::new("desk", "color")),
        )];
        let (filters, _) = expand(&nodes, 8).unwrap();
        assert_eq!(filters[1].channel_links["color"], PortRef::new("desk", "color"));
    }

    #[test]
    fn test_missing_expander() {
        let library = MacroLibrary::new();
        let mut table = SubstitutionTable::new();
        let nodes = vec![FilterNode::new(Filter::new("p", FilterKind::PositionConstant))];
        let err = Expander::new(&library, 1, 8).expand(&nodes, &mut table).unwrap_err();
        assert!(matches!(err, CompileError::MissingExpander { .. }));
    }
}
