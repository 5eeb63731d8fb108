// SPDX-License-Identifier: MIT OR Apache-2.0
//! Virtual filters: macros that unfold into concrete subgraphs.
//!
//! A virtual filter never reaches the realtime engine. At compile time its
//! [`VirtualFilter`] implementation appends the nodes that implement it and
//! tells the expansion engine which inner output each of its own output
//! ports stands for. Inner nodes are named `<virtual id>__<role>`.

mod delay_chain;
mod dimmed_color;
mod oscillator;
mod position;

pub use delay_chain::DelayChain;
pub use dimmed_color::DimmedColor;
pub use oscillator::{OscillatingDimmer, SineOscillator};
pub use position::PositionConstant;

use crate::error::{CompileError, Result};
use crate::filter::{Filter, FilterNode};
use crate::kind::FilterKind;
use crate::port::PortRef;
use crate::value::{Value, ValueType};
use indexmap::IndexMap;

/// Expansion behavior of one virtual filter kind
pub trait VirtualFilter: Send + Sync {
    /// Output ports consumers may link to
    fn output_ports(&self, node: &Filter) -> Result<IndexMap<String, ValueType>> {
        node.ports()
            .map(|signature| signature.outputs)
            .map_err(|err| CompileError::mapping(&node.id, err))
    }

    /// Reference consumers of `port` must ultimately bind to
    ///
    /// Returns `None` for ports this macro does not provide.
    fn resolve_output_port(&self, node: &Filter, port: &str) -> Option<PortRef>;

    /// Append the nodes implementing `node` to `output`
    ///
    /// Appended nodes may themselves be virtual.
    fn instantiate(&self, node: &Filter, output: &mut Vec<FilterNode>) -> Result<()>;
}

/// Registry of expansions by virtual kind
pub struct MacroLibrary {
    expanders: IndexMap<FilterKind, Box<dyn VirtualFilter>>,
}

impl MacroLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self {
            expanders: IndexMap::new(),
        }
    }

    /// Create a library with every built-in macro
    pub fn builtin() -> Self {
        let mut library = Self::new();
        library.register(FilterKind::PositionConstant, PositionConstant);
        library.register(FilterKind::SineOscillator, SineOscillator);
        library.register(FilterKind::DimmedColor, DimmedColor);
        library.register(FilterKind::DelayChain, DelayChain);
        library.register(FilterKind::OscillatingDimmer, OscillatingDimmer);
        library
    }

    /// Register or replace the expansion for a kind
    pub fn register(&mut self, kind: FilterKind, expander: impl VirtualFilter + 'static) {
        self.expanders.insert(kind, Box::new(expander));
    }

    /// Get the expansion for a kind
    pub fn get(&self, kind: FilterKind) -> Option<&dyn VirtualFilter> {
        self.expanders.get(&kind).map(|e| e.as_ref())
    }

    /// Kinds with a registered expansion
    pub fn kinds(&self) -> impl Iterator<Item = FilterKind> + '_ {
        self.expanders.keys().copied()
    }
}

impl Default for MacroLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for MacroLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.expanders.keys()).finish()
    }
}

/// Id of an inner node created for `node`
pub fn inner_id(node: &Filter, role: &str) -> String {
    format!("{}__{}", node.id, role)
}

/// Create an inner node for `node`, placed at the macro's canvas position
pub(crate) fn inner_filter(node: &Filter, role: &str, kind: FilterKind) -> Filter {
    let mut filter = Filter::new(inner_id(node, role), kind);
    filter.position = node.position;
    filter
}

/// Reference to an output of an inner node
pub(crate) fn inner_output(node: &Filter, role: &str, port: &str) -> PortRef {
    PortRef::new(inner_id(node, role), port)
}

/// Read a typed initial parameter, falling back to `default` when absent
pub(crate) fn parameter(
    node: &Filter,
    name: &str,
    value_type: ValueType,
    default: Value,
) -> Result<Value> {
    match node.initial_parameters.get(name) {
        None => Ok(default),
        Some(raw) => value_type
            .parse_value(raw)
            .map_err(|source| CompileError::InvalidValue {
                filter: node.id.clone(),
                parameter: name.to_string(),
                source,
            }),
    }
}

/// Read a float initial parameter, falling back to `default` when absent
pub(crate) fn float_parameter(node: &Filter, name: &str, default: f64) -> Result<f64> {
    match parameter(node, name, ValueType::Float, Value::Float(default))? {
        Value::Float(value) => Ok(value),
        _ => Ok(default),
    }
}
