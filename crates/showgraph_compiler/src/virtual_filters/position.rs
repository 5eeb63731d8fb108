// SPDX-License-Identifier: MIT OR Apache-2.0
//! Constant pan/tilt position for moving heads.
//!
//! Pan and tilt are given as fractions of the full range (0-1) and emitted
//! as 16-bit constants split into coarse and fine DMX channels.

use super::{float_parameter, inner_filter, inner_output, VirtualFilter};
use crate::error::Result;
use crate::filter::{Filter, FilterNode};
use crate::kind::FilterKind;
use crate::port::PortRef;

/// Expansion of `VFILTER_POSITION_CONSTANT`
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionConstant;

impl VirtualFilter for PositionConstant {
    fn resolve_output_port(&self, node: &Filter, port: &str) -> Option<PortRef> {
        match port {
            "pan" => Some(inner_output(node, "pan", "value_upper")),
            "pan_fine" => Some(inner_output(node, "pan", "value_lower")),
            "tilt" => Some(inner_output(node, "tilt", "value_upper")),
            "tilt_fine" => Some(inner_output(node, "tilt", "value_lower")),
            _ => None,
        }
    }

    fn instantiate(&self, node: &Filter, output: &mut Vec<FilterNode>) -> Result<()> {
        for axis in ["pan", "tilt"] {
            let fraction = float_parameter(node, axis, 0.5)?.clamp(0.0, 1.0);
            let raw = (fraction * u16::MAX as f64).round() as u16;

            let value_role = format!("{axis}_value");
            let constant = inner_filter(node, &value_role, FilterKind::Constant16Bit)
                .with_parameter("value", raw.to_string());
            let split = inner_filter(node, axis, FilterKind::SixteenBitToDualEightBit)
                .with_link("value", inner_output(node, &value_role, "value"));

            output.push(constant.into());
            output.push(split.into());
        }
        Ok(())
    }
}
