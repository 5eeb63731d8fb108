// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filter node definitions for the show graph.

use crate::kind::FilterKind;
use crate::port::{PortMappingError, PortRef, PortSignature};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Data shared by concrete and virtual filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Identifier, unique within the scene
    pub id: String,
    /// Filter kind
    pub kind: FilterKind,
    /// Input port name to upstream output reference
    pub channel_links: IndexMap<String, PortRef>,
    /// Static configuration, fixed at compile time
    pub configuration: IndexMap<String, String>,
    /// Starting runtime state
    pub initial_parameters: IndexMap<String, String>,
    /// Position on the node canvas
    pub position: [i32; 2],
}

impl Filter {
    /// Create a filter with no links, configuration or parameters
    pub fn new(id: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            id: id.into(),
            kind,
            channel_links: IndexMap::new(),
            configuration: IndexMap::new(),
            initial_parameters: IndexMap::new(),
            position: [0, 0],
        }
    }

    /// Bind an input port to an upstream output
    pub fn with_link(mut self, input: impl Into<String>, source: PortRef) -> Self {
        self.channel_links.insert(input.into(), source);
        self
    }

    /// Add a configuration entry
    pub fn with_configuration(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.insert(key.into(), value.into());
        self
    }

    /// Add an initial parameter
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.initial_parameters.insert(key.into(), value.into());
        self
    }

    /// Set the canvas position
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = [x, y];
        self
    }

    /// Declared ports under the current configuration
    pub fn ports(&self) -> Result<PortSignature, PortMappingError> {
        PortSignature::for_kind(self.kind, &self.configuration)
    }

    /// Reference to one of this filter's output ports
    pub fn output(&self, port: impl Into<String>) -> PortRef {
        PortRef::new(self.id.clone(), port)
    }
}

/// A node in a scene graph
///
/// Concrete filters are executed by the realtime engine as they are.
/// Virtual filters are macros and must be expanded before deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterNode {
    /// Directly executable filter
    Concrete(Filter),
    /// Macro expanded at compile time
    Virtual(Filter),
}

impl FilterNode {
    /// Wrap a filter in the variant its kind requires
    pub fn new(filter: Filter) -> Self {
        if filter.kind.is_virtual() {
            Self::Virtual(filter)
        } else {
            Self::Concrete(filter)
        }
    }

    /// Shared filter data
    pub fn filter(&self) -> &Filter {
        match self {
            Self::Concrete(filter) | Self::Virtual(filter) => filter,
        }
    }

    /// Consume the node, returning its filter data
    pub fn into_filter(self) -> Filter {
        match self {
            Self::Concrete(filter) | Self::Virtual(filter) => filter,
        }
    }

    /// Filter id
    pub fn id(&self) -> &str {
        &self.filter().id
    }

    /// Filter kind
    pub fn kind(&self) -> FilterKind {
        self.filter().kind
    }

    /// Whether this node must be expanded
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }
}

impl From<Filter> for FilterNode {
    fn from(filter: Filter) -> Self {
        Self::new(filter)
    }
}
