// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port reference resolution.
//!
//! Expansion and deduplication never edit links in place. They record
//! rewrite rules in a [`SubstitutionTable`] instead, and the [`Resolver`]
//! applies those rules when a link is finally bound. Because rules chain, a
//! link to a virtual port can be redirected to the macro's inner node and
//! then again to the canonical instance of a deduplicated singleton.

use crate::error::{CompileError, Result};
use crate::filter::Filter;
use crate::port::{PortRef, PortSignature};
use crate::value::ValueType;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Rewrite rules from eliminated references to their replacements
///
/// Scoped to one scene of one compile.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionTable {
    entries: HashMap<PortRef, PortRef>,
}

impl SubstitutionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` must be replaced by `to`
    pub fn insert(&mut self, from: PortRef, to: PortRef) -> Option<PortRef> {
        self.entries.insert(from, to)
    }

    /// Direct replacement for a reference, without following chains
    pub fn get(&self, reference: &PortRef) -> Option<&PortRef> {
        self.entries.get(reference)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no rules
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output ports of the concrete filters emitted for a scene
#[derive(Debug, Default)]
pub struct OutputIndex {
    outputs: HashMap<String, IndexMap<String, ValueType>>,
}

impl OutputIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the outputs of an emitted filter
    pub fn insert(&mut self, filter: &str, signature: &PortSignature) {
        self.outputs.insert(filter.to_string(), signature.outputs.clone());
    }

    /// Type of the referenced output, if it exists
    pub fn port_type(&self, reference: &PortRef) -> Option<ValueType> {
        self.outputs
            .get(&reference.filter)
            .and_then(|ports| ports.get(&reference.port))
            .copied()
    }
}

/// Applies a substitution table to references
pub struct Resolver<'a> {
    table: &'a SubstitutionTable,
    max_steps: usize,
}

impl<'a> Resolver<'a> {
    /// Create a resolver following at most `max_steps` rewrites per reference
    pub fn new(table: &'a SubstitutionTable, max_steps: usize) -> Self {
        Self { table, max_steps }
    }

    /// Follow rewrite rules until the reference is no longer substituted
    pub fn resolve(&self, reference: &PortRef) -> Result<PortRef> {
        let mut current = reference;
        let mut chain = vec![reference.clone()];

        for _ in 0..=self.max_steps {
            match self.table.get(current) {
                None => return Ok(current.clone()),
                Some(next) => {
                    chain.push(next.clone());
                    current = next;
                }
            }
        }

        Err(CompileError::CyclicSubstitution { chain })
    }

    /// Resolve every link of a concrete filter and check it against `outputs`
    ///
    /// Returns the links in their original order with final references.
    pub fn bind_links(
        &self,
        scene: u32,
        filter: &Filter,
        signature: &PortSignature,
        outputs: &OutputIndex,
    ) -> Result<IndexMap<String, PortRef>> {
        let mut bound = IndexMap::with_capacity(filter.channel_links.len());

        for (port, reference) in &filter.channel_links {
            let Some(expected) = signature.inputs.get(port).copied() else {
                return Err(CompileError::UndeclaredInput {
                    scene,
                    filter: filter.id.clone(),
                    port: port.clone(),
                });
            };

            let target = self.resolve(reference)?;
            let Some(found) = outputs.port_type(&target) else {
                return Err(CompileError::UnresolvedReference {
                    scene,
                    filter: filter.id.clone(),
                    port: port.clone(),
                    target,
                });
            };

            if found != expected {
                return Err(CompileError::TypeMismatch {
                    scene,
                    filter: filter.id.clone(),
                    port: port.clone(),
                    expected,
                    target,
                    found,
                });
            }

            bound.insert(port.clone(), target);
        }

        Ok(bound)
    }
}
