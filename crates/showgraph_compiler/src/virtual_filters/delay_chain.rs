// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chains of switch-on delays.
//!
//! A chain of `n` stages is defined recursively: one delay stage followed by
//! a chain of `n - 1` stages. Each level of the chain is one level of
//! expansion, so long chains are bounded by the expansion depth ceiling.

use super::{inner_filter, inner_output, VirtualFilter};
use crate::error::{CompileError, Result};
use crate::filter::{Filter, FilterNode};
use crate::kind::FilterKind;
use crate::port::PortRef;

/// Expansion of `VFILTER_DELAY_CHAIN`
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayChain;

impl DelayChain {
    fn stages(node: &Filter) -> Result<u32> {
        let Some(raw) = node.configuration.get("stages") else {
            return Ok(1);
        };
        match raw.trim().parse::<u32>() {
            Ok(stages) if stages > 0 => Ok(stages),
            _ => Err(CompileError::InvalidConfiguration {
                filter: node.id.clone(),
                key: "stages".to_string(),
                value: raw.clone(),
            }),
        }
    }
}

impl VirtualFilter for DelayChain {
    fn resolve_output_port(&self, node: &Filter, port: &str) -> Option<PortRef> {
        if port != "value" {
            return None;
        }
        match Self::stages(node).ok()? {
            1 => Some(inner_output(node, "stage", "value")),
            _ => Some(inner_output(node, "rest", "value")),
        }
    }

    fn instantiate(&self, node: &Filter, output: &mut Vec<FilterNode>) -> Result<()> {
        let stages = Self::stages(node)?;

        let mut stage = inner_filter(node, "stage", FilterKind::DelaySwitchOn);
        if let Some(input) = node.channel_links.get("value") {
            stage.channel_links.insert("value".to_string(), input.clone());
        }
        if let Some(delay) = node.initial_parameters.get("delay") {
            stage.initial_parameters.insert("delay".to_string(), delay.clone());
        }
        output.push(stage.into());

        if stages > 1 {
            let mut rest = inner_filter(node, "rest", FilterKind::DelayChain)
                .with_link("value", inner_output(node, "stage", "value"))
                .with_configuration("stages", (stages - 1).to_string());
            rest.initial_parameters = node.initial_parameters.clone();
            output.push(rest.into());
        }
        Ok(())
    }
}
