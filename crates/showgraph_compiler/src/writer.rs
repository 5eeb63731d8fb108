// SPDX-License-Identifier: MIT OR Apache-2.0
//! Show file writer.
//!
//! Renders a [`CompiledShow`] as the XML document the engine and the editor
//! load. Authoring output carries everything needed to reopen the show;
//! deployment output drops canvas positions, pages, UI hints, devices,
//! macros and event senders.

use crate::compiler::{CompiledScene, CompiledShow};
use crate::config::{CompilerConfig, SchemaInfo};
use crate::filter::Filter;
use crate::scene::{BankSet, Scene};
use crate::show::{ShowDocument, Universe, UniverseLocation};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Write;

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Error while writing a show file
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Output sink failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML encoding failed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Output buffer is not valid UTF-8
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Render a compiled show to a string
pub fn write_show(compiled: &CompiledShow<'_>, config: &CompilerConfig) -> Result<String, WriteError> {
    let mut buffer = Vec::new();
    write_show_to(compiled, config, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Render a compiled show into `out`
pub fn write_show_to<W: Write>(
    compiled: &CompiledShow<'_>,
    config: &CompilerConfig,
    out: W,
) -> Result<(), WriteError> {
    let writer = match config.indent {
        Some(width) => Writer::new_with_indent(out, b' ', width),
        None => Writer::new(out),
    };
    let mut doc = DocumentWriter {
        writer,
        presentation: compiled.mode.includes_presentation(),
    };
    doc.show(compiled, &config.schema)?;
    tracing::debug!(
        "Wrote show '{}' ({} mode)",
        compiled.document.name,
        compiled.mode
    );
    Ok(())
}

struct DocumentWriter<W: Write> {
    writer: Writer<W>,
    presentation: bool,
}

impl<W: Write> DocumentWriter<W> {
    fn event(&mut self, event: Event<'_>) -> Result<(), WriteError> {
        self.writer.write_event(event)?;
        Ok(())
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), WriteError> {
        self.event(Event::Start(start(name, attributes)))
    }

    fn leaf(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), WriteError> {
        self.event(Event::Empty(start(name, attributes)))
    }

    fn close(&mut self, name: &str) -> Result<(), WriteError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn show(&mut self, compiled: &CompiledShow<'_>, schema: &SchemaInfo) -> Result<(), WriteError> {
        let document = compiled.document;
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.open(
            "showfile",
            &[
                ("show_name", &document.name),
                ("default_active_scene", &document.default_active_scene.to_string()),
                ("notes", &document.notes),
                ("xmlns", &schema.namespace),
                ("xmlns:xsi", XSI_NAMESPACE),
                ("xsi:schemaLocation", &schema.schema_location),
            ],
        )?;

        for scene in &compiled.scenes {
            self.scene(scene)?;
        }
        for universe in &document.universes {
            self.universe(universe)?;
        }
        if self.presentation {
            self.show_presentation(document)?;
        }

        self.close("showfile")
    }

    fn show_presentation(&mut self, document: &ShowDocument) -> Result<(), WriteError> {
        for device in &document.devices {
            self.open("device", &[("name", &device.name)])?;
            for (name, value) in &device.attributes {
                self.leaf("attribute", &[("name", name), ("value", value)])?;
            }
            self.close("device")?;
        }
        for (name, value) in &document.ui_hints {
            self.leaf("uihint", &[("name", name), ("value", value)])?;
        }
        for show_macro in &document.macros {
            self.leaf(
                "macro",
                &[
                    ("name", &show_macro.name),
                    ("trigger", &show_macro.trigger),
                    ("content", &show_macro.content),
                ],
            )?;
        }
        for sender in &document.event_senders {
            self.open("eventsender", &[("name", &sender.name), ("type", &sender.sender_type)])?;
            for (name, value) in &sender.configuration {
                self.leaf("configuration", &[("name", name), ("value", value)])?;
            }
            self.close("eventsender")?;
        }
        Ok(())
    }

    fn scene(&mut self, compiled: &CompiledScene<'_>) -> Result<(), WriteError> {
        let scene = compiled.scene;
        let id = scene.id.to_string();
        let mut attributes = vec![("id", id.as_str()), ("human_readable_name", scene.name.as_str())];
        if let Some(bankset) = &scene.bankset {
            attributes.push(("linkedBankset", bankset.id.as_str()));
        }
        self.open("scene", &attributes)?;

        if let Some(bankset) = &scene.bankset {
            self.bankset(bankset)?;
        }
        for filter in &compiled.filters {
            self.filter(filter)?;
        }
        if self.presentation {
            self.scene_presentation(scene)?;
        }

        self.close("scene")
    }

    fn bankset(&mut self, bankset: &BankSet) -> Result<(), WriteError> {
        self.open(
            "bankset",
            &[
                ("id", &bankset.id),
                ("description", &bankset.description),
                ("active_bank", &bankset.active_bank.to_string()),
            ],
        )?;
        for bank in &bankset.banks {
            self.open("bank", &[])?;
            for column in bank {
                self.leaf(
                    "column",
                    &[
                        ("id", &column.id),
                        ("type", column.kind.as_str()),
                        ("display_name", &column.display_name),
                        ("lcd_color", &column.lcd_color),
                        ("top_inverted", bool_str(column.top_inverted)),
                        ("bottom_inverted", bool_str(column.bottom_inverted)),
                    ],
                )?;
            }
            self.close("bank")?;
        }
        self.close("bankset")
    }

    fn filter(&mut self, filter: &Filter) -> Result<(), WriteError> {
        let position = format!("{},{}", filter.position[0], filter.position[1]);
        let mut attributes = vec![("id", filter.id.as_str()), ("type", filter.kind.tag())];
        if self.presentation {
            attributes.push(("pos", position.as_str()));
        }

        let childless = filter.channel_links.is_empty()
            && filter.initial_parameters.is_empty()
            && filter.configuration.is_empty();
        if childless {
            return self.leaf("filter", &attributes);
        }

        self.open("filter", &attributes)?;
        for (input, source) in &filter.channel_links {
            self.leaf(
                "channellink",
                &[
                    ("input_channel_id", input),
                    ("output_channel_id", &source.to_string()),
                ],
            )?;
        }
        for (name, value) in &filter.initial_parameters {
            self.leaf("initialParameters", &[("name", name), ("value", value)])?;
        }
        let swapped = filter.kind.swapped_configuration_key();
        for (key, value) in &filter.configuration {
            // The engine reads this one entry with name and value exchanged.
            let entry = if swapped == Some(key.as_str()) {
                [("name", value.as_str()), ("value", key.as_str())]
            } else {
                [("name", key.as_str()), ("value", value.as_str())]
            };
            self.leaf("filterConfiguration", &entry)?;
        }
        self.close("filter")
    }

    fn scene_presentation(&mut self, scene: &Scene) -> Result<(), WriteError> {
        for page in &scene.filter_pages {
            let mut attributes = vec![("name", page.name.as_str())];
            if let Some(parent) = &page.parent {
                attributes.push(("parent", parent.as_str()));
            }
            self.open("filterpage", &attributes)?;
            for id in &page.filter_ids {
                self.leaf("filterref", &[("id", id)])?;
            }
            self.close("filterpage")?;
        }

        for page in &scene.ui_pages {
            self.open("uipage", &[("name", &page.name)])?;
            for widget in &page.widgets {
                self.open(
                    "widget",
                    &[
                        ("x", &widget.position[0].to_string()),
                        ("y", &widget.position[1].to_string()),
                        ("width", &widget.size[0].to_string()),
                        ("height", &widget.size[1].to_string()),
                        ("filter_id", &widget.filter_id),
                        ("type", &widget.variant),
                    ],
                )?;
                for (name, value) in &widget.configuration {
                    self.leaf("configuration", &[("name", name), ("value", value)])?;
                }
                self.close("widget")?;
            }
            self.close("uipage")?;
        }
        Ok(())
    }

    fn universe(&mut self, universe: &Universe) -> Result<(), WriteError> {
        self.open(
            "universe",
            &[
                ("id", &universe.id.to_string()),
                ("name", &universe.name),
                ("description", &universe.description),
            ],
        )?;

        match &universe.location {
            UniverseLocation::ArtNet {
                ip_address,
                udp_port,
                device_universe_id,
            } => self.leaf(
                "artnet",
                &[
                    ("ip_address", ip_address),
                    ("udp_port", &udp_port.to_string()),
                    ("device_universe_id", &device_universe_id.to_string()),
                ],
            )?,
            UniverseLocation::Usb {
                vendor_id,
                product_id,
                device_name,
                serial_identifier,
            } => self.leaf(
                "usb",
                &[
                    ("vendor_id", &vendor_id.to_string()),
                    ("product_id", &product_id.to_string()),
                    ("device_name", device_name),
                    ("serial_identifier", serial_identifier),
                ],
            )?,
            UniverseLocation::Physical(location) => {
                self.leaf("physical", &[("location", &location.to_string())])?
            }
        }

        for patch in &universe.patches {
            self.leaf(
                "patching",
                &[
                    ("start", &patch.start.to_string()),
                    ("fixture_file", &patch.fixture_file),
                    ("mode", &patch.mode),
                ],
            )?;
        }
        self.close("universe")
    }
}

fn start<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for (key, value) in attributes {
        let value = escape_attribute(value);
        // Raw byte pairs are pushed as is; the value is already escaped.
        element.push_attribute((key.as_bytes(), value.as_bytes()));
    }
    element
}

/// Escape an attribute value, keeping whitespace as character references
///
/// Parsers normalize literal newlines and tabs in attributes to spaces, so
/// multi-line notes and macro scripts would not survive a reload otherwise.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped;
    }
    Cow::Owned(
        escaped
            .replace('\n', "&#10;")
            .replace('\r', "&#13;")
            .replace('\t', "&#9;"),
    )
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileMode, Compiler};
    use crate::kind::FilterKind;
    use crate::port::PortRef;
    use crate::scene::FilterPage;

    fn sample_show() -> ShowDocument {
        let mut scene = Scene::new(1, "Opening & Intro");
        scene
            .add_filter(Filter::new("t", FilterKind::TimeSource).with_position(5, -7))
            .unwrap();
        scene
            .add_filter(
                Filter::new("out", FilterKind::UniverseOutput)
                    .with_configuration("universe", "1")
                    .with_configuration("dimmer", "12"),
            )
            .unwrap();
        scene.filter_pages.push(FilterPage {
            name: "Main".to_string(),
            parent: None,
            filter_ids: vec!["t".to_string()],
        });

        let mut show = ShowDocument::new("Demo");
        show.default_active_scene = 1;
        show.scenes.push(scene);
        show.ui_hints.insert("zoom".to_string(), "1.5".to_string());
        show
    }

    fn render(show: &ShowDocument, mode: CompileMode, config: &CompilerConfig) -> String {
        let compiled = Compiler::new(config.clone()).compile(show, mode).unwrap();
        write_show(&compiled, config).unwrap()
    }

    #[test]
    fn test_authoring_output() {
        let xml = render(&sample_show(), CompileMode::Authoring, &CompilerConfig::default());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("show_name=\"Demo\""));
        assert!(xml.contains("human_readable_name=\"Opening &amp; Intro\""));
        assert!(xml.contains("<filter id=\"t\" type=\"FILTER_TIME\" pos=\"5,-7\"/>"));
        assert!(xml.contains("<filterpage name=\"Main\">"));
        assert!(xml.contains("<uihint name=\"zoom\" value=\"1.5\"/>"));
    }

    #[test]
    fn test_deployment_omits_presentation() {
        let xml = render(&sample_show(), CompileMode::Deployment, &CompilerConfig::default());
        assert!(xml.contains("<filter id=\"t\" type=\"FILTER_TIME\"/>"));
        assert!(!xml.contains("pos="));
        assert!(!xml.contains("filterpage"));
        assert!(!xml.contains("uihint"));
    }

    #[test]
    fn test_universe_configuration_is_swapped() {
        let xml = render(&sample_show(), CompileMode::Deployment, &CompilerConfig::default());
        assert!(xml.contains("<filterConfiguration name=\"1\" value=\"universe\"/>"));
        assert!(xml.contains("<filterConfiguration name=\"dimmer\" value=\"12\"/>"));
    }

    #[test]
    fn test_links_are_written_as_references() {
        let mut show = sample_show();
        show.scenes[0]
            .add_filter(
                Filter::new("s", FilterKind::Sine).with_link("value", PortRef::new("t", "value")),
            )
            .unwrap();
        let xml = render(&show, CompileMode::Deployment, &CompilerConfig::default());
        assert!(xml.contains("<channellink input_channel_id=\"value\" output_channel_id=\"t:value\"/>"));
    }

    #[test]
    fn test_compact_output() {
        let config = CompilerConfig {
            indent: None,
            ..CompilerConfig::default()
        };
        let xml = render(&sample_show(), CompileMode::Deployment, &config);
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn test_multiline_attributes_keep_line_breaks() {
        let mut show = sample_show();
        show.notes = "Line one\nLine two".to_string();
        show.macros.push(crate::show::ShowMacro {
            name: "fade".to_string(),
            trigger: "button:1".to_string(),
            content: "set main 0\n\twait 1\r\n".to_string(),
        });
        let config = CompilerConfig {
            indent: None,
            ..CompilerConfig::default()
        };
        let xml = render(&show, CompileMode::Authoring, &config);
        assert!(xml.contains("notes=\"Line one&#10;Line two\""));
        assert!(xml.contains("content=\"set main 0&#10;&#9;wait 1&#13;&#10;\""));
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn test_universe_locations() {
        let mut show = sample_show();
        show.universes.push(Universe {
            id: 1,
            name: "Stage".to_string(),
            description: String::new(),
            location: UniverseLocation::ArtNet {
                ip_address: "10.0.0.5".to_string(),
                udp_port: 6454,
                device_universe_id: 2,
            },
            patches: vec![crate::show::Patch {
                start: 1,
                fixture_file: "par.xml".to_string(),
                mode: "8ch".to_string(),
            }],
        });
        let xml = render(&show, CompileMode::Deployment, &CompilerConfig::default());
        assert!(xml.contains(
            "<artnet ip_address=\"10.0.0.5\" udp_port=\"6454\" device_universe_id=\"2\"/>"
        ));
        assert!(xml.contains("<patching start=\"1\" fixture_file=\"par.xml\" mode=\"8ch\"/>"));
    }
}
