// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-scene deduplication of singleton filters.
//!
//! Scenes are often assembled from reusable fragments, so a scene can end up
//! with several time sources or main brightness faders. The engine only
//! needs one of each. The first instance seen becomes canonical; later ones
//! are elided and links to their outputs are redirected through the
//! substitution table.

use crate::error::{CompileError, Result};
use crate::filter::{Filter, FilterNode};
use crate::kind::FilterKind;
use crate::resolver::SubstitutionTable;
use std::collections::HashMap;

/// Tracks canonical singleton instances for one scene
#[derive(Debug)]
pub struct SceneOptimizer {
    scene: u32,
    canonical: HashMap<FilterKind, Filter>,
}

impl SceneOptimizer {
    /// Create an optimizer for a scene
    pub fn new(scene: u32) -> Self {
        Self {
            scene,
            canonical: HashMap::new(),
        }
    }

    /// Decide whether `node` is elided in favor of an earlier instance
    ///
    /// The first singleton of each kind is recorded as canonical and kept.
    /// Later instances have all their outputs mapped onto the canonical
    /// instance in `table` and are reported as substituted.
    pub fn was_substituted(
        &mut self,
        scene: u32,
        node: &FilterNode,
        table: &mut SubstitutionTable,
    ) -> Result<bool> {
        let filter = node.filter();
        if node.is_virtual() || filter.kind.is_virtual() {
            return Err(CompileError::InvalidSubstitution {
                filter: filter.id.clone(),
                reason: "virtual filters must be expanded before optimization".to_string(),
            });
        }
        if scene != self.scene {
            return Err(CompileError::InvalidSubstitution {
                filter: filter.id.clone(),
                reason: format!(
                    "filter belongs to scene {scene}, optimizer to scene {}",
                    self.scene
                ),
            });
        }
        if !filter.kind.is_singleton() {
            return Ok(false);
        }

        let Some(canonical) = self.canonical.get(&filter.kind) else {
            self.canonical.insert(filter.kind, filter.clone());
            return Ok(false);
        };

        if canonical.id == filter.id {
            return Err(CompileError::DuplicateIdentifier {
                scene,
                filter: filter.id.clone(),
            });
        }

        substitute(canonical, filter, table)?;
        tracing::debug!(
            "Scene {}: folded {} '{}' into '{}'",
            scene,
            filter.kind,
            filter.id,
            canonical.id
        );
        Ok(true)
    }

    /// Canonical instance recorded for a kind
    pub fn canonical(&self, kind: FilterKind) -> Option<&Filter> {
        self.canonical.get(&kind)
    }
}

/// Map every output of `duplicate` onto the same output of `canonical`
pub fn substitute(
    canonical: &Filter,
    duplicate: &Filter,
    table: &mut SubstitutionTable,
) -> Result<()> {
    if canonical.kind != duplicate.kind {
        return Err(CompileError::InvalidSubstitution {
            filter: duplicate.id.clone(),
            reason: format!(
                "kind {} cannot stand in for {}",
                canonical.kind, duplicate.kind
            ),
        });
    }

    let signature = duplicate
        .ports()
        .map_err(|err| CompileError::mapping(&duplicate.id, err))?;
    for port in signature.outputs.keys() {
        table.insert(duplicate.output(port.as_str()), canonical.output(port.as_str()));
    }
    Ok(())
}
