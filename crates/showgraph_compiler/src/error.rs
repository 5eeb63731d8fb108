// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while compiling a show.
//!
//! Every variant is fatal for the compile that raised it. They all point at a
//! defect in the authored graph or in a macro expansion, so nothing here is
//! worth retrying.

use crate::kind::FilterKind;
use crate::port::PortRef;
use crate::value::{ValueError, ValueType};

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Compilation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// Link does not name an existing concrete output after rewriting
    #[error("Scene {scene}: input '{port}' of filter '{filter}' points at unresolved '{target}'")]
    UnresolvedReference {
        /// Scene id
        scene: u32,
        /// Consuming filter
        filter: String,
        /// Consuming input port
        port: String,
        /// Reference after rewriting
        target: PortRef,
    },

    /// Link connects ports of different value types
    #[error("Scene {scene}: input '{port}' of filter '{filter}' expects {expected} but '{target}' produces {found}")]
    TypeMismatch {
        /// Scene id
        scene: u32,
        /// Consuming filter
        filter: String,
        /// Consuming input port
        port: String,
        /// Declared input type
        expected: ValueType,
        /// Producer output
        target: PortRef,
        /// Declared output type
        found: ValueType,
    },

    /// Reference rewriting does not converge
    #[error("Cyclic substitution: {}", format_chain(.chain))]
    CyclicSubstitution {
        /// References visited, in order
        chain: Vec<PortRef>,
    },

    /// Macro expansion nests deeper than the configured ceiling
    #[error("Scene {scene}: expansion of '{filter}' exceeds depth {depth}")]
    ExpansionDepthExceeded {
        /// Scene id
        scene: u32,
        /// Virtual filter that could not be expanded
        filter: String,
        /// Configured ceiling
        depth: usize,
    },

    /// Optimizer asked to substitute incompatible nodes
    #[error("Invalid substitution of '{filter}': {reason}")]
    InvalidSubstitution {
        /// Node that was to be elided
        filter: String,
        /// What made the substitution invalid
        reason: String,
    },

    /// Two scenes of one document share an id
    #[error("Scene {scene} is defined more than once")]
    DuplicateScene {
        /// Scene id
        scene: u32,
    },

    /// Two concrete filters share an id after expansion
    #[error("Scene {scene}: duplicate filter id '{filter}'")]
    DuplicateIdentifier {
        /// Scene id
        scene: u32,
        /// Offending id
        filter: String,
    },

    /// Link on an input port the filter does not declare
    #[error("Scene {scene}: filter '{filter}' has no input '{port}'")]
    UndeclaredInput {
        /// Scene id
        scene: u32,
        /// Consuming filter
        filter: String,
        /// Linked port name
        port: String,
    },

    /// Macro cannot resolve one of its declared output ports
    #[error("Virtual filter '{filter}' cannot resolve output '{port}'")]
    UnsupportedVirtualPort {
        /// Virtual filter id
        filter: String,
        /// Output port name
        port: String,
    },

    /// No expansion is registered for a virtual kind
    #[error("No expansion registered for {kind} (filter '{filter}')")]
    MissingExpander {
        /// Virtual filter id
        filter: String,
        /// Its kind
        kind: FilterKind,
    },

    /// Filter configuration is malformed
    #[error("Filter '{filter}': invalid configuration '{key}' = '{value}'")]
    InvalidConfiguration {
        /// Filter id
        filter: String,
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Parameter value cannot be decoded
    #[error("Filter '{filter}': invalid value for '{parameter}': {source}")]
    InvalidValue {
        /// Filter id
        filter: String,
        /// Parameter name
        parameter: String,
        /// Codec error
        source: ValueError,
    },
}

fn format_chain(chain: &[PortRef]) -> String {
    chain
        .iter()
        .map(PortRef::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl CompileError {
    /// Build an [`CompileError::InvalidConfiguration`] from a port mapping failure
    pub(crate) fn mapping(filter: &str, err: crate::port::PortMappingError) -> Self {
        Self::InvalidConfiguration {
            filter: filter.to_string(),
            key: err.key,
            value: err.raw,
        }
    }
}
