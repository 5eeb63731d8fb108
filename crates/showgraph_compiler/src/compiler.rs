// SPDX-License-Identifier: MIT OR Apache-2.0
//! Document compilation.
//!
//! The compiler borrows a [`ShowDocument`] and derives a disposable output
//! tree from it. In authoring mode the tree mirrors the document, virtual
//! filters included. In deployment mode every scene is expanded, deduplicated
//! and fully resolved so that the engine only sees concrete filters with
//! links to outputs that exist.

use crate::config::CompilerConfig;
use crate::error::{CompileError, Result};
use crate::expansion::Expander;
use crate::filter::{Filter, FilterNode};
use crate::kind::FilterFamily;
use crate::optimizer::SceneOptimizer;
use crate::port::PortSignature;
use crate::resolver::{OutputIndex, Resolver, SubstitutionTable};
use crate::scene::Scene;
use crate::show::ShowDocument;
use crate::virtual_filters::MacroLibrary;
use std::collections::HashSet;
use std::fmt;

/// Output flavor of a compile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompileMode {
    /// Everything the editor needs to reopen the show
    #[default]
    Authoring,
    /// Only what the engine executes
    Deployment,
}

impl CompileMode {
    /// Whether presentation data is written
    pub fn includes_presentation(&self) -> bool {
        matches!(self, CompileMode::Authoring)
    }
}

impl fmt::Display for CompileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileMode::Authoring => write!(f, "authoring"),
            CompileMode::Deployment => write!(f, "deployment"),
        }
    }
}

/// Result of compiling a show
#[derive(Debug, Clone)]
pub struct CompiledShow<'a> {
    /// Mode the show was compiled in
    pub mode: CompileMode,
    /// Source document
    pub document: &'a ShowDocument,
    /// Compiled scenes in document order
    pub scenes: Vec<CompiledScene<'a>>,
}

impl CompiledShow<'_> {
    /// Compiled scene by id
    pub fn scene(&self, id: u32) -> Option<&CompiledScene<'_>> {
        self.scenes.iter().find(|s| s.scene.id == id)
    }

    /// Total number of emitted filters
    pub fn filter_count(&self) -> usize {
        self.scenes.iter().map(|s| s.filters.len()).sum()
    }
}

/// One scene of a compiled show
#[derive(Debug, Clone)]
pub struct CompiledScene<'a> {
    /// Source scene
    pub scene: &'a Scene,
    /// Filters to emit, in order
    pub filters: Vec<Filter>,
}

impl CompiledScene<'_> {
    /// Emitted filter by id
    pub fn filter(&self, id: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.id == id)
    }
}

/// Compiles show documents
#[derive(Debug, Default)]
pub struct Compiler {
    config: CompilerConfig,
    library: MacroLibrary,
}

impl Compiler {
    /// Create a compiler with the built-in macro library
    pub fn new(config: CompilerConfig) -> Self {
        Self::with_library(config, MacroLibrary::builtin())
    }

    /// Create a compiler with a custom macro library
    pub fn with_library(config: CompilerConfig, library: MacroLibrary) -> Self {
        Self { config, library }
    }

    /// Active configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Macro library used for expansion
    pub fn library(&self) -> &MacroLibrary {
        &self.library
    }

    /// Mutable macro library, for registering additional expansions
    pub fn library_mut(&mut self) -> &mut MacroLibrary {
        &mut self.library
    }

    /// Compile a show document
    ///
    /// The first failing scene aborts the compile; no partial output is
    /// returned.
    pub fn compile<'a>(
        &self,
        document: &'a ShowDocument,
        mode: CompileMode,
    ) -> Result<CompiledShow<'a>> {
        if document.scene(document.default_active_scene).is_none() && !document.scenes.is_empty() {
            tracing::warn!(
                "Default active scene {} does not exist in show '{}'",
                document.default_active_scene,
                document.name
            );
        }

        let mut seen = HashSet::with_capacity(document.scenes.len());
        let mut scenes = Vec::with_capacity(document.scenes.len());
        for scene in &document.scenes {
            if !seen.insert(scene.id) {
                return Err(CompileError::DuplicateScene { scene: scene.id });
            }
            let filters = match mode {
                CompileMode::Authoring => scene.filters().map(|n| n.filter().clone()).collect(),
                CompileMode::Deployment => self.compile_scene(scene)?,
            };
            scenes.push(CompiledScene { scene, filters });
        }

        let compiled = CompiledShow {
            mode,
            document,
            scenes,
        };
        tracing::info!(
            "Compiled show '{}' for {}: {} scenes, {} filters",
            document.name,
            mode,
            compiled.scenes.len(),
            compiled.filter_count()
        );
        Ok(compiled)
    }

    /// Expand, deduplicate and resolve one scene for deployment
    pub fn compile_scene(&self, scene: &Scene) -> Result<Vec<Filter>> {
        let mut table = SubstitutionTable::new();
        let expanded = Expander::new(&self.library, scene.id, self.config.max_expansion_depth)
            .expand(scene.filters(), &mut table)?;
        let expanded_count = expanded.len();

        let mut optimizer = SceneOptimizer::new(scene.id);
        let mut ids = HashSet::with_capacity(expanded.len());
        let mut outputs = OutputIndex::new();
        let mut kept: Vec<(Filter, PortSignature)> = Vec::with_capacity(expanded.len());

        for filter in expanded {
            // Elided singletons still claim their id.
            if !ids.insert(filter.id.clone()) {
                return Err(CompileError::DuplicateIdentifier {
                    scene: scene.id,
                    filter: filter.id,
                });
            }
            let node = FilterNode::Concrete(filter);
            if optimizer.was_substituted(scene.id, &node, &mut table)? {
                continue;
            }
            let filter = node.into_filter();
            let signature = filter
                .ports()
                .map_err(|err| CompileError::mapping(&filter.id, err))?;
            outputs.insert(&filter.id, &signature);
            kept.push((filter, signature));
        }

        let resolver = Resolver::new(&table, self.config.max_substitution_steps);
        let mut emitted = Vec::with_capacity(kept.len());
        for (mut filter, signature) in kept {
            filter.channel_links = resolver.bind_links(scene.id, &filter, &signature, &outputs)?;
            normalize_constant(&mut filter, &signature)?;
            filter.position = [0, 0];
            emitted.push(filter);
        }

        tracing::debug!(
            "Scene {} '{}': {} authored, {} expanded, {} emitted, {} substitutions",
            scene.id,
            scene.name,
            scene.filter_count(),
            expanded_count,
            emitted.len(),
            table.len()
        );
        Ok(emitted)
    }
}

/// Re-encode the `value` parameter of a constant in canonical form
fn normalize_constant(filter: &mut Filter, signature: &PortSignature) -> Result<()> {
    if filter.kind.family() != FilterFamily::Constant {
        return Ok(());
    }
    let Some(value_type) = signature.outputs.get("value").copied() else {
        return Ok(());
    };
    if let Some(raw) = filter.initial_parameters.get_mut("value") {
        let value = value_type
            .parse_value(raw)
            .map_err(|source| CompileError::InvalidValue {
                filter: filter.id.clone(),
                parameter: "value".to_string(),
                source,
            })?;
        *raw = value.to_string();
    }
    Ok(())
}
