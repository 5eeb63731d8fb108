// SPDX-License-Identifier: MIT OR Apache-2.0
//! The show document: root of everything the editing layer owns.

use crate::scene::Scene;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An editable lighting show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDocument {
    /// Display name
    pub name: String,
    /// Free-text notes
    pub notes: String,
    /// Scene activated when the show loads
    pub default_active_scene: u32,
    /// Scenes in authoring order
    pub scenes: Vec<Scene>,
    /// DMX output universes
    pub universes: Vec<Universe>,
    /// Opaque device records
    pub devices: Vec<Device>,
    /// Editor hints, never deployed
    pub ui_hints: IndexMap<String, String>,
    /// Trigger-bound command scripts
    pub macros: Vec<ShowMacro>,
    /// Event sender descriptors
    pub event_senders: Vec<EventSender>,
}

impl ShowDocument {
    /// Create an empty show
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: String::new(),
            default_active_scene: 0,
            scenes: Vec::new(),
            universes: Vec::new(),
            devices: Vec::new(),
            ui_hints: IndexMap::new(),
            macros: Vec::new(),
            event_senders: Vec::new(),
        }
    }

    /// Get a scene by id
    pub fn scene(&self, id: u32) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Get a mutable scene by id
    pub fn scene_mut(&mut self, id: u32) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id == id)
    }

    /// Get a universe by id
    pub fn universe(&self, id: u32) -> Option<&Universe> {
        self.universes.iter().find(|u| u.id == id)
    }
}

impl Default for ShowDocument {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// A DMX universe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    /// Universe id referenced by output filters
    pub id: u32,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Where the signal leaves the system
    pub location: UniverseLocation,
    /// Fixtures patched into this universe
    pub patches: Vec<Patch>,
}

/// Physical or network location of a universe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniverseLocation {
    /// ArtNet node on the network
    ArtNet {
        /// Node address
        ip_address: String,
        /// UDP port
        udp_port: u16,
        /// Universe index on the node
        device_universe_id: u16,
    },
    /// USB DMX interface
    Usb {
        /// USB vendor id
        vendor_id: u16,
        /// USB product id
        product_id: u16,
        /// Device name
        device_name: String,
        /// Serial number
        serial_identifier: String,
    },
    /// Output port on the engine host
    Physical(u32),
}

/// A fixture placed in a universe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// First DMX channel
    pub start: u16,
    /// Fixture definition file
    pub fixture_file: String,
    /// Fixture mode name
    pub mode: String,
}

/// Opaque device record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Device name
    pub name: String,
    /// Device attributes
    pub attributes: IndexMap<String, String>,
}

/// Named command script bound to a trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowMacro {
    /// Macro name
    pub name: String,
    /// Trigger expression
    pub trigger: String,
    /// Command script
    pub content: String,
}

/// Event sender descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSender {
    /// Sender name
    pub name: String,
    /// Sender type tag
    pub sender_type: String,
    /// Sender settings
    pub configuration: IndexMap<String, String>,
}
