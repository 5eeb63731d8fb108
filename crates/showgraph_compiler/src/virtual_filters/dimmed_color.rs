// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color scaled by the desk's main brightness fader.

use super::{inner_filter, inner_output, VirtualFilter};
use crate::error::Result;
use crate::filter::{Filter, FilterNode};
use crate::kind::FilterKind;
use crate::port::PortRef;

/// Expansion of `VFILTER_DIMMED_COLOR`
#[derive(Debug, Clone, Copy, Default)]
pub struct DimmedColor;

impl VirtualFilter for DimmedColor {
    fn resolve_output_port(&self, node: &Filter, port: &str) -> Option<PortRef> {
        (port == "value").then(|| inner_output(node, "mix", "value"))
    }

    fn instantiate(&self, node: &Filter, output: &mut Vec<FilterNode>) -> Result<()> {
        let main = inner_filter(node, "main", FilterKind::MainBrightnessFader);

        let mut mix = inner_filter(node, "mix", FilterKind::ColorBrightnessMixin)
            .with_link("brightness", inner_output(node, "main", "value"));
        if let Some(color) = node.channel_links.get("color") {
            mix.channel_links.insert("color".to_string(), color.clone());
        }

        output.push(main.into());
        output.push(mix.into());
        Ok(())
    }
}
