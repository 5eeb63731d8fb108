// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenes: independently addressable filter graphs within a show.

use crate::filter::{Filter, FilterNode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scene graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene id, unique within the show
    pub id: u32,
    /// Human readable name
    pub name: String,
    /// Filters by id, in authoring order
    filters: IndexMap<String, FilterNode>,
    /// Control desk bank set linked to this scene
    pub bankset: Option<BankSet>,
    /// Filter groupings for the editor
    pub filter_pages: Vec<FilterPage>,
    /// Operator UI pages
    pub ui_pages: Vec<UiPage>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            filters: IndexMap::new(),
            bankset: None,
            filter_pages: Vec::new(),
            ui_pages: Vec::new(),
        }
    }

    /// Add a filter, choosing the concrete or virtual variant from its kind
    pub fn add_filter(&mut self, filter: impl Into<FilterNode>) -> Result<(), GraphError> {
        let node = filter.into();
        if self.filters.contains_key(node.id()) {
            return Err(GraphError::DuplicateFilter {
                scene: self.id,
                filter: node.id().to_string(),
            });
        }
        self.filters.insert(node.id().to_string(), node);
        Ok(())
    }

    /// Remove a filter
    ///
    /// Links pointing at it are left in place; the compiler reports them as
    /// unresolved.
    pub fn remove_filter(&mut self, id: &str) -> Option<FilterNode> {
        self.filters.shift_remove(id)
    }

    /// Get a filter by id
    pub fn filter(&self, id: &str) -> Option<&FilterNode> {
        self.filters.get(id)
    }

    /// Edit a filter in place
    ///
    /// The edited filter is re-wrapped so its variant follows its kind, and
    /// re-keyed at the same position if its id changed. A rename onto an id
    /// already in the scene fails and leaves the scene untouched.
    pub fn update_filter(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut Filter),
    ) -> Result<(), GraphError> {
        let Some(index) = self.filters.get_index_of(id) else {
            return Err(GraphError::UnknownFilter {
                scene: self.id,
                filter: id.to_string(),
            });
        };

        let mut filter = self.filters[index].filter().clone();
        edit(&mut filter);
        if filter.id != id && self.filters.contains_key(&filter.id) {
            return Err(GraphError::DuplicateFilter {
                scene: self.id,
                filter: filter.id,
            });
        }

        let node = FilterNode::new(filter);
        if node.id() == id {
            self.filters[index] = node;
        } else {
            self.filters.shift_remove_index(index);
            self.filters.shift_insert(index, node.id().to_string(), node);
        }
        Ok(())
    }

    /// All filters in authoring order
    pub fn filters(&self) -> impl Iterator<Item = &FilterNode> {
        self.filters.values()
    }

    /// Number of filters
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Whether any filter still needs expansion
    pub fn has_virtual_filters(&self) -> bool {
        self.filters.values().any(FilterNode::is_virtual)
    }
}

/// Fader bank configuration of the control desk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSet {
    /// Bank set id
    pub id: String,
    /// Description shown on the desk
    pub description: String,
    /// Bank selected when the scene activates
    pub active_bank: u32,
    /// Banks of fader columns
    pub banks: Vec<Vec<BankColumn>>,
}

/// Column type on the desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Hue/saturation/intensity column
    Color,
    /// Raw fader and encoder positions
    Raw,
}

impl ColumnKind {
    /// Wire encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Color => "hsi",
            ColumnKind::Raw => "raw",
        }
    }

    /// Decode the wire encoding
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "hsi" => Some(ColumnKind::Color),
            "raw" => Some(ColumnKind::Raw),
            _ => None,
        }
    }
}

/// One fader column in a bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankColumn {
    /// Column id referenced by console filters
    pub id: String,
    /// Column type
    pub kind: ColumnKind,
    /// Name shown on the column display
    pub display_name: String,
    /// LCD backlight color
    pub lcd_color: String,
    /// Invert the top display line
    pub top_inverted: bool,
    /// Invert the bottom display line
    pub bottom_inverted: bool,
}

/// Editor grouping of filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPage {
    /// Page name
    pub name: String,
    /// Parent page name, if nested
    pub parent: Option<String>,
    /// Filters shown on this page
    pub filter_ids: Vec<String>,
}

/// Operator UI page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPage {
    /// Page name
    pub name: String,
    /// Widgets on the page
    pub widgets: Vec<Widget>,
}

/// Widget placed on a UI page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Top-left corner
    pub position: [i32; 2],
    /// Width and height
    pub size: [u32; 2],
    /// Filter the widget controls
    pub filter_id: String,
    /// Widget variant tag
    pub variant: String,
    /// Free-form widget settings
    pub configuration: IndexMap<String, String>,
}

/// Error when editing a scene graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Filter id already used in the scene
    #[error("Filter '{filter}' already exists in scene {scene}")]
    DuplicateFilter {
        /// Scene id
        scene: u32,
        /// Offending filter id
        filter: String,
    },

    /// Filter id not present in the scene
    #[error("No filter '{filter}' in scene {scene}")]
    UnknownFilter {
        /// Scene id
        scene: u32,
        /// Requested filter id
        filter: String,
    },
}
