// SPDX-License-Identifier: MIT OR Apache-2.0
//! Show file reader.
//!
//! Parses a show file back into a [`ShowDocument`]. Authoring output reads
//! back into the document it was written from. Deployment output reads
//! back too, minus the presentation data it never carried.
//!
//! The document is built with a stack of open elements. Each element is
//! attached to its parent when it closes. Elements the reader does not know,
//! or that appear under an unexpected parent, are skipped with everything
//! they contain.

use crate::filter::Filter;
use crate::kind::{FilterKind, UnknownKindError};
use crate::port::{PortRef, ReferenceError};
use crate::scene::{
    BankColumn, BankSet, ColumnKind, FilterPage, GraphError, Scene, UiPage, Widget,
};
use crate::show::{Device, EventSender, Patch, ShowDocument, ShowMacro, Universe, UniverseLocation};
use indexmap::IndexMap;
use quick_xml::escape::EscapeError;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str::FromStr;

/// Error while reading a show file
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute syntax
    #[error("Attribute error: {0}")]
    Attribute(#[from] AttrError),

    /// Invalid entity or character reference
    #[error("Escape error: {0}")]
    Escape(#[from] EscapeError),

    /// Attribute is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Document has no `showfile` root element
    #[error("Missing <showfile> root element")]
    MissingRoot,

    /// Required attribute is absent
    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        /// Element name
        element: String,
        /// Attribute name
        attribute: &'static str,
    },

    /// Attribute value does not parse
    #[error("<{element}> has invalid {attribute}: '{value}'")]
    InvalidAttribute {
        /// Element name
        element: String,
        /// Attribute name
        attribute: &'static str,
        /// Offending value
        value: String,
    },

    /// Scene id repeated within the document
    #[error("Scene {scene} is defined more than once")]
    DuplicateScene {
        /// Scene id
        scene: u32,
    },

    /// Universe without an artnet, usb or physical location
    #[error("Universe {universe} has no location")]
    MissingLocation {
        /// Universe id
        universe: u32,
    },

    /// Filter type tag is not known
    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),

    /// Channel link target is not a port reference
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Filter id repeated within a scene
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Parse a show file
pub fn read_show(xml: &str) -> Result<ShowDocument, ReadError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parser = Parser::default();
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(ref e) => {
                let frame = parser.open(e)?;
                parser.stack.push(frame);
            }
            Event::Empty(ref e) => {
                let frame = parser.open(e)?;
                parser.close(frame)?;
            }
            Event::End(_) => {
                if let Some(frame) = parser.stack.pop() {
                    parser.close(frame)?;
                }
            }
            _ => {}
        }
    }

    let document = parser.document.ok_or(ReadError::MissingRoot)?;
    tracing::debug!(
        "Read show '{}': {} scenes, {} universes",
        document.name,
        document.scenes.len(),
        document.universes.len()
    );
    Ok(document)
}

/// Element under construction
enum Frame {
    Root(ShowDocument),
    Scene(Scene),
    BankSet(BankSet),
    Bank(Vec<BankColumn>),
    Filter(Filter),
    FilterPage(FilterPage),
    UiPage(UiPage),
    Widget(Widget),
    Universe(PartialUniverse),
    Device(Device),
    EventSender(EventSender),
    /// Element fully handled when opened
    Leaf,
    /// Element ignored along with its children
    Skip,
}

struct PartialUniverse {
    id: u32,
    name: String,
    description: String,
    location: Option<UniverseLocation>,
    patches: Vec<Patch>,
}

#[derive(Default)]
struct Parser {
    stack: Vec<Frame>,
    document: Option<ShowDocument>,
}

impl Parser {
    fn open(&mut self, element: &BytesStart<'_>) -> Result<Frame, ReadError> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        let attrs = Attributes::from_start(&name, element)?;

        let frame = match (name.as_str(), self.stack.last_mut()) {
            ("showfile", None) => {
                let mut document = ShowDocument::new(attrs.optional("show_name"));
                document.notes = attrs.optional("notes");
                document.default_active_scene = attrs.parse_or("default_active_scene", 0)?;
                Frame::Root(document)
            }

            ("scene", Some(Frame::Root(_))) => Frame::Scene(Scene::new(
                attrs.parse("id")?,
                attrs.optional("human_readable_name"),
            )),
            ("bankset", Some(Frame::Scene(_))) => Frame::BankSet(BankSet {
                id: attrs.required("id")?,
                description: attrs.optional("description"),
                active_bank: attrs.parse_or("active_bank", 0)?,
                banks: Vec::new(),
            }),
            ("bank", Some(Frame::BankSet(_))) => Frame::Bank(Vec::new()),
            ("column", Some(Frame::Bank(columns))) => {
                let kind = attrs.required("type")?;
                columns.push(BankColumn {
                    id: attrs.required("id")?,
                    kind: ColumnKind::from_wire(&kind).ok_or_else(|| attrs.invalid("type", kind))?,
                    display_name: attrs.optional("display_name"),
                    lcd_color: attrs.optional("lcd_color"),
                    top_inverted: attrs.parse_or("top_inverted", false)?,
                    bottom_inverted: attrs.parse_or("bottom_inverted", false)?,
                });
                Frame::Leaf
            }

            ("filter", Some(Frame::Scene(_))) => {
                let kind: FilterKind = attrs.required("type")?.parse()?;
                let mut filter = Filter::new(attrs.required("id")?, kind);
                if let Some(pos) = attrs.get("pos") {
                    filter.position = parse_position(pos).ok_or_else(|| attrs.invalid("pos", pos))?;
                }
                Frame::Filter(filter)
            }
            ("channellink", Some(Frame::Filter(filter))) => {
                let source: PortRef = attrs.required("output_channel_id")?.parse()?;
                filter
                    .channel_links
                    .insert(attrs.required("input_channel_id")?, source);
                Frame::Leaf
            }
            ("initialParameters", Some(Frame::Filter(filter))) => {
                filter
                    .initial_parameters
                    .insert(attrs.required("name")?, attrs.optional("value"));
                Frame::Leaf
            }
            ("filterConfiguration", Some(Frame::Filter(filter))) => {
                let name = attrs.required("name")?;
                let value = attrs.optional("value");
                if filter.kind.swapped_configuration_key() == Some(value.as_str()) {
                    filter.configuration.insert(value, name);
                } else {
                    filter.configuration.insert(name, value);
                }
                Frame::Leaf
            }

            ("filterpage", Some(Frame::Scene(_))) => Frame::FilterPage(FilterPage {
                name: attrs.required("name")?,
                parent: attrs.get("parent").map(str::to_string),
                filter_ids: Vec::new(),
            }),
            ("filterref", Some(Frame::FilterPage(page))) => {
                page.filter_ids.push(attrs.required("id")?);
                Frame::Leaf
            }
            ("uipage", Some(Frame::Scene(_))) => Frame::UiPage(UiPage {
                name: attrs.required("name")?,
                widgets: Vec::new(),
            }),
            ("widget", Some(Frame::UiPage(_))) => Frame::Widget(Widget {
                position: [attrs.parse_or("x", 0)?, attrs.parse_or("y", 0)?],
                size: [attrs.parse_or("width", 0)?, attrs.parse_or("height", 0)?],
                filter_id: attrs.optional("filter_id"),
                variant: attrs.optional("type"),
                configuration: IndexMap::new(),
            }),
            ("configuration", Some(Frame::Widget(Widget { configuration, .. })))
            | ("configuration", Some(Frame::EventSender(EventSender { configuration, .. }))) => {
                configuration.insert(attrs.required("name")?, attrs.optional("value"));
                Frame::Leaf
            }

            ("universe", Some(Frame::Root(_))) => Frame::Universe(PartialUniverse {
                id: attrs.parse("id")?,
                name: attrs.optional("name"),
                description: attrs.optional("description"),
                location: None,
                patches: Vec::new(),
            }),
            ("artnet", Some(Frame::Universe(universe))) => {
                universe.location = Some(UniverseLocation::ArtNet {
                    ip_address: attrs.required("ip_address")?,
                    udp_port: attrs.parse_or("udp_port", 6454)?,
                    device_universe_id: attrs.parse_or("device_universe_id", 0)?,
                });
                Frame::Leaf
            }
            ("usb", Some(Frame::Universe(universe))) => {
                universe.location = Some(UniverseLocation::Usb {
                    vendor_id: attrs.parse("vendor_id")?,
                    product_id: attrs.parse("product_id")?,
                    device_name: attrs.optional("device_name"),
                    serial_identifier: attrs.optional("serial_identifier"),
                });
                Frame::Leaf
            }
            ("physical", Some(Frame::Universe(universe))) => {
                universe.location = Some(UniverseLocation::Physical(attrs.parse("location")?));
                Frame::Leaf
            }
            ("patching", Some(Frame::Universe(universe))) => {
                universe.patches.push(Patch {
                    start: attrs.parse("start")?,
                    fixture_file: attrs.required("fixture_file")?,
                    mode: attrs.optional("mode"),
                });
                Frame::Leaf
            }

            ("device", Some(Frame::Root(_))) => Frame::Device(Device {
                name: attrs.required("name")?,
                attributes: IndexMap::new(),
            }),
            ("attribute", Some(Frame::Device(device))) => {
                device
                    .attributes
                    .insert(attrs.required("name")?, attrs.optional("value"));
                Frame::Leaf
            }
            ("uihint", Some(Frame::Root(document))) => {
                document
                    .ui_hints
                    .insert(attrs.required("name")?, attrs.optional("value"));
                Frame::Leaf
            }
            ("macro", Some(Frame::Root(document))) => {
                document.macros.push(ShowMacro {
                    name: attrs.required("name")?,
                    trigger: attrs.optional("trigger"),
                    content: attrs.optional("content"),
                });
                Frame::Leaf
            }
            ("eventsender", Some(Frame::Root(_))) => Frame::EventSender(EventSender {
                name: attrs.required("name")?,
                sender_type: attrs.optional("type"),
                configuration: IndexMap::new(),
            }),

            _ => {
                tracing::debug!("Skipping element <{}>", name);
                Frame::Skip
            }
        };
        Ok(frame)
    }

    fn close(&mut self, frame: Frame) -> Result<(), ReadError> {
        let parent = self.stack.last_mut();
        match (frame, parent) {
            (Frame::Root(document), _) => self.document = Some(document),
            (Frame::Scene(scene), Some(Frame::Root(document))) => {
                if document.scene(scene.id).is_some() {
                    return Err(ReadError::DuplicateScene { scene: scene.id });
                }
                document.scenes.push(scene);
            }
            (Frame::BankSet(bankset), Some(Frame::Scene(scene))) => scene.bankset = Some(bankset),
            (Frame::Bank(columns), Some(Frame::BankSet(bankset))) => bankset.banks.push(columns),
            (Frame::Filter(filter), Some(Frame::Scene(scene))) => scene.add_filter(filter)?,
            (Frame::FilterPage(page), Some(Frame::Scene(scene))) => scene.filter_pages.push(page),
            (Frame::UiPage(page), Some(Frame::Scene(scene))) => scene.ui_pages.push(page),
            (Frame::Widget(widget), Some(Frame::UiPage(page))) => page.widgets.push(widget),
            (Frame::Universe(partial), Some(Frame::Root(document))) => {
                let location = partial.location.ok_or(ReadError::MissingLocation {
                    universe: partial.id,
                })?;
                document.universes.push(Universe {
                    id: partial.id,
                    name: partial.name,
                    description: partial.description,
                    location,
                    patches: partial.patches,
                });
            }
            (Frame::Device(device), Some(Frame::Root(document))) => document.devices.push(device),
            (Frame::EventSender(sender), Some(Frame::Root(document))) => {
                document.event_senders.push(sender);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Unescaped attributes of one element
struct Attributes {
    element: String,
    values: IndexMap<String, String>,
}

impl Attributes {
    fn from_start(element: &str, start: &BytesStart<'_>) -> Result<Self, ReadError> {
        let mut values = IndexMap::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = std::str::from_utf8(attribute.key.as_ref())?;
            let raw = std::str::from_utf8(&attribute.value)?;
            values.insert(key.to_string(), quick_xml::escape::unescape(raw)?.into_owned());
        }
        Ok(Self {
            element: element.to_string(),
            values,
        })
    }

    fn get(&self, attribute: &str) -> Option<&str> {
        self.values.get(attribute).map(String::as_str)
    }

    fn required(&self, attribute: &'static str) -> Result<String, ReadError> {
        self.get(attribute)
            .map(str::to_string)
            .ok_or_else(|| ReadError::MissingAttribute {
                element: self.element.clone(),
                attribute,
            })
    }

    fn optional(&self, attribute: &str) -> String {
        self.get(attribute).unwrap_or_default().to_string()
    }

    fn parse<T: FromStr>(&self, attribute: &'static str) -> Result<T, ReadError> {
        let raw = self.required(attribute)?;
        raw.parse().map_err(|_| self.invalid(attribute, raw))
    }

    fn parse_or<T: FromStr>(&self, attribute: &'static str, default: T) -> Result<T, ReadError> {
        match self.get(attribute) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| self.invalid(attribute, raw)),
        }
    }

    fn invalid(&self, attribute: &'static str, value: impl Into<String>) -> ReadError {
        ReadError::InvalidAttribute {
            element: self.element.clone(),
            attribute,
            value: value.into(),
        }
    }
}

fn parse_position(raw: &str) -> Option<[i32; 2]> {
    let (x, y) = raw.split_once(',')?;
    Some([x.trim().parse().ok()?, y.trim().parse().ok()?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileMode, Compiler};
    use crate::config::CompilerConfig;
    use crate::writer::write_show;

    fn full_show() -> ShowDocument {
        let mut scene = Scene::new(3, "Finale <big>");
        scene
            .add_filter(Filter::new("t", FilterKind::TimeSource).with_position(-40, 12))
            .unwrap();
        scene
            .add_filter(
                Filter::new("osc", FilterKind::SineOscillator)
                    .with_parameter("period", "500")
                    .with_position(80, 12),
            )
            .unwrap();
        scene
            .add_filter(
                Filter::new("dim", FilterKind::FloatToEightBit)
                    .with_link("value", PortRef::new("osc", "value")),
            )
            .unwrap();
        scene
            .add_filter(
                Filter::new("out", FilterKind::UniverseOutput)
                    .with_configuration("universe", "2")
                    .with_configuration("dimmer", "1")
                    .with_link("dimmer", PortRef::new("dim", "value")),
            )
            .unwrap();
        scene.bankset = Some(BankSet {
            id: "desk".to_string(),
            description: "Main desk".to_string(),
            active_bank: 1,
            banks: vec![
                vec![BankColumn {
                    id: "col1".to_string(),
                    kind: ColumnKind::Color,
                    display_name: "Wash".to_string(),
                    lcd_color: "blue".to_string(),
                    top_inverted: true,
                    bottom_inverted: false,
                }],
                Vec::new(),
            ],
        });
        scene.filter_pages.push(FilterPage {
            name: "Motion".to_string(),
            parent: Some("Root".to_string()),
            filter_ids: vec!["osc".to_string(), "dim".to_string()],
        });
        scene.ui_pages.push(UiPage {
            name: "Operator".to_string(),
            widgets: vec![Widget {
                position: [10, 20],
                size: [200, 40],
                filter_id: "dim".to_string(),
                variant: "slider".to_string(),
                configuration: IndexMap::from([("min".to_string(), "0".to_string())]),
            }],
        });

        let mut show = ShowDocument::new("Gala");
        show.notes = "Line one\nline \"two\" & more".to_string();
        show.default_active_scene = 3;
        show.scenes.push(scene);
        show.scenes.push(Scene::new(4, "Empty"));
        show.universes.push(Universe {
            id: 2,
            name: "Truss".to_string(),
            description: "Front truss".to_string(),
            location: UniverseLocation::Usb {
                vendor_id: 0x0403,
                product_id: 0x6001,
                device_name: "FT232R".to_string(),
                serial_identifier: "A1B2".to_string(),
            },
            patches: vec![Patch {
                start: 1,
                fixture_file: "dimmer.xml".to_string(),
                mode: "1ch".to_string(),
            }],
        });
        show.universes.push(Universe {
            id: 3,
            name: "Local".to_string(),
            description: String::new(),
            location: UniverseLocation::Physical(0),
            patches: Vec::new(),
        });
        show.devices.push(Device {
            name: "desk".to_string(),
            attributes: IndexMap::from([("port".to_string(), "/dev/ttyACM0".to_string())]),
        });
        show.ui_hints.insert("grid".to_string(), "true".to_string());
        show.macros.push(ShowMacro {
            name: "blackout".to_string(),
            trigger: "button:7".to_string(),
            content: "set main 0 &&\n\twait 1".to_string(),
        });
        show.event_senders.push(EventSender {
            name: "osc".to_string(),
            sender_type: "udp".to_string(),
            configuration: IndexMap::from([("port".to_string(), "9000".to_string())]),
        });
        show
    }

    #[test]
    fn test_authoring_round_trip() {
        let show = full_show();
        let config = CompilerConfig::default();
        let compiled = Compiler::new(config.clone())
            .compile(&show, CompileMode::Authoring)
            .unwrap();
        let xml = write_show(&compiled, &config).unwrap();
        assert_eq!(read_show(&xml).unwrap(), show);
    }

    #[test]
    fn test_compact_round_trip() {
        let show = full_show();
        let config = CompilerConfig {
            indent: None,
            ..CompilerConfig::default()
        };
        let compiled = Compiler::new(config.clone())
            .compile(&show, CompileMode::Authoring)
            .unwrap();
        let xml = write_show(&compiled, &config).unwrap();
        assert_eq!(read_show(&xml).unwrap(), show);
    }

    #[test]
    fn test_round_trip_recompiles_identically() {
        let show = full_show();
        let compiler = Compiler::default();
        let authored = compiler.compile(&show, CompileMode::Authoring).unwrap();
        let reread = read_show(&write_show(&authored, compiler.config()).unwrap()).unwrap();

        let before = compiler.compile(&show, CompileMode::Deployment).unwrap();
        let after = compiler.compile(&reread, CompileMode::Deployment).unwrap();
        assert_eq!(
            write_show(&before, compiler.config()).unwrap(),
            write_show(&after, compiler.config()).unwrap()
        );
    }

    #[test]
    fn test_deployment_output_reads_back() {
        let show = full_show();
        let config = CompilerConfig::default();
        let compiled = Compiler::new(config.clone())
            .compile(&show, CompileMode::Deployment)
            .unwrap();
        let xml = write_show(&compiled, &config).unwrap();
        let deployed = read_show(&xml).unwrap();

        let scene = deployed.scene(3).unwrap();
        assert!(!scene.has_virtual_filters());
        assert!(scene.filter_pages.is_empty());
        assert!(deployed.ui_hints.is_empty());
        assert!(deployed.macros.is_empty());
        assert_eq!(deployed.universes, show.universes);
        assert_eq!(scene.bankset, show.scenes[0].bankset);

        let out = scene.filter("out").unwrap().filter();
        assert_eq!(out.configuration["universe"], "2");
        assert_eq!(out.channel_links["dimmer"], PortRef::new("dim", "value"));
        let dim = scene.filter("dim").unwrap().filter();
        assert_eq!(dim.channel_links["value"], PortRef::new("osc__scale", "value"));
    }

    #[test]
    fn test_swapped_configuration_is_restored() {
        let xml = r#"<showfile show_name="s" default_active_scene="1">
            <scene id="1" human_readable_name="a">
                <filter id="out" type="FILTER_UNIVERSE_OUTPUT">
                    <filterConfiguration name="5" value="universe"/>
                </filter>
            </scene>
        </showfile>"#;
        let show = read_show(xml).unwrap();
        let out = show.scenes[0].filter("out").unwrap().filter();
        assert_eq!(out.configuration["universe"], "5");
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let xml = r#"<showfile show_name="s">
            <visualizer><scene id="9" human_readable_name="ghost"/></visualizer>
            <scene id="1" human_readable_name="a"><annotation text="x"/></scene>
        </showfile>"#;
        let show = read_show(xml).unwrap();
        assert_eq!(show.scenes.len(), 1);
        assert_eq!(show.scenes[0].id, 1);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(read_show("<other/>"), Err(ReadError::MissingRoot)));
        assert!(matches!(
            read_show(r#"<showfile><scene human_readable_name="a"/></showfile>"#),
            Err(ReadError::MissingAttribute { attribute: "id", .. })
        ));
        assert!(matches!(
            read_show(r#"<showfile><scene id="x"/></showfile>"#),
            Err(ReadError::InvalidAttribute { attribute: "id", .. })
        ));
        assert!(matches!(
            read_show(r#"<showfile><scene id="1"><filter id="f" type="FILTER_NOPE"/></scene></showfile>"#),
            Err(ReadError::UnknownKind(_))
        ));
        assert!(matches!(
            read_show(
                r#"<showfile><scene id="1"><filter id="f" type="FILTER_TRIGONOMETRIC_SIN">
                <channellink input_channel_id="value" output_channel_id="nocolon"/>
                </filter></scene></showfile>"#
            ),
            Err(ReadError::Reference(_))
        ));
        assert!(matches!(
            read_show(
                r#"<showfile><scene id="1">
                <filter id="f" type="FILTER_TIME"/><filter id="f" type="FILTER_TIME"/>
                </scene></showfile>"#
            ),
            Err(ReadError::Graph(_))
        ));
        assert!(matches!(
            read_show(r#"<showfile><universe id="1" name="u"/></showfile>"#),
            Err(ReadError::MissingLocation { universe: 1 })
        ));
    }

    #[test]
    fn test_duplicate_scene_id() {
        let xml = r#"<showfile default_active_scene="1">
            <scene id="1" human_readable_name="First"/>
            <scene id="2" human_readable_name="Second"/>
            <scene id="1" human_readable_name="Again"/>
            </showfile>"#;
        assert!(matches!(
            read_show(xml),
            Err(ReadError::DuplicateScene { scene: 1 })
        ));
    }
}
