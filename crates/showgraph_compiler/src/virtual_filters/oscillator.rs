// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sine oscillators built from the engine's time and arithmetic filters.

use super::{float_parameter, inner_filter, inner_output, VirtualFilter};
use crate::error::{CompileError, Result};
use crate::filter::{Filter, FilterNode};
use crate::kind::FilterKind;
use crate::port::PortRef;
use crate::value::{ValueError, ValueType};
use std::f64::consts::TAU;

/// Expansion of `VFILTER_SINE_OSCILLATOR`
///
/// `value = amplitude * sin(time * 2π / period) + offset`, with `period` in
/// milliseconds. Every oscillator brings its own time source; the optimizer
/// folds them into one per scene.
#[derive(Debug, Clone, Copy, Default)]
pub struct SineOscillator;

impl VirtualFilter for SineOscillator {
    fn resolve_output_port(&self, node: &Filter, port: &str) -> Option<PortRef> {
        (port == "value").then(|| inner_output(node, "scale", "value"))
    }

    fn instantiate(&self, node: &Filter, output: &mut Vec<FilterNode>) -> Result<()> {
        let period = float_parameter(node, "period", 1000.0)?;
        if period <= 0.0 {
            return Err(CompileError::InvalidValue {
                filter: node.id.clone(),
                parameter: "period".to_string(),
                source: ValueError::Malformed {
                    value_type: ValueType::Float,
                    raw: period.to_string(),
                },
            });
        }
        let amplitude = float_parameter(node, "amplitude", 1.0)?;
        let offset = float_parameter(node, "offset", 0.0)?;

        let time = inner_filter(node, "time", FilterKind::TimeSource);
        let omega = inner_filter(node, "omega", FilterKind::ConstantFloat)
            .with_parameter("value", (TAU / period).to_string());
        let phase = inner_filter(node, "phase", FilterKind::Multiplication)
            .with_link("param1", inner_output(node, "time", "value"))
            .with_link("param2", inner_output(node, "omega", "value"));
        let sine = inner_filter(node, "sin", FilterKind::Sine)
            .with_link("value", inner_output(node, "phase", "value"));
        let scale = inner_filter(node, "scale", FilterKind::MultiplyAdd)
            .with_link("value", inner_output(node, "sin", "value"))
            .with_parameter("factor", amplitude.to_string())
            .with_parameter("offset", offset.to_string());

        output.extend([time, omega, phase, sine, scale].map(FilterNode::from));
        Ok(())
    }
}

/// Expansion of `VFILTER_OSCILLATING_DIMMER`
///
/// A nested sine oscillator converted to an 8-bit dimmer channel. Amplitude
/// and offset default to a full 0-1 swing.
#[derive(Debug, Clone, Copy, Default)]
pub struct OscillatingDimmer;

impl VirtualFilter for OscillatingDimmer {
    fn resolve_output_port(&self, node: &Filter, port: &str) -> Option<PortRef> {
        (port == "value").then(|| inner_output(node, "convert", "value"))
    }

    fn instantiate(&self, node: &Filter, output: &mut Vec<FilterNode>) -> Result<()> {
        let mut oscillator = inner_filter(node, "osc", FilterKind::SineOscillator)
            .with_parameter("amplitude", "0.5")
            .with_parameter("offset", "0.5");
        for (name, value) in &node.initial_parameters {
            oscillator.initial_parameters.insert(name.clone(), value.clone());
        }

        let convert = inner_filter(node, "convert", FilterKind::FloatToEightBit)
            .with_link("value", inner_output(node, "osc", "value"));

        output.push(oscillator.into());
        output.push(convert.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oscillator_wiring() {
        let node = Filter::new("osc", FilterKind::SineOscillator)
            .with_parameter("period", "2000")
            .with_parameter("amplitude", "0.5");

        let mut output = Vec::new();
        SineOscillator.instantiate(&node, &mut output).unwrap();

        let kinds: Vec<_> = output.iter().map(FilterNode::kind).collect();
        assert_eq!(
            kinds,
            [
                FilterKind::TimeSource,
                FilterKind::ConstantFloat,
                FilterKind::Multiplication,
                FilterKind::Sine,
                FilterKind::MultiplyAdd,
            ]
        );
        assert!(output.iter().all(|n| !n.is_virtual()));

        let scale = output[4].filter();
        assert_eq!(scale.initial_parameters.get("factor").map(String::as_str), Some("0.5"));
        assert_eq!(
            SineOscillator.resolve_output_port(&node, "value"),
            Some(PortRef::new("osc__scale", "value"))
        );
    }

    #[test]
    fn test_oscillator_rejects_non_positive_period() {
        let node = Filter::new("osc", FilterKind::SineOscillator).with_parameter("period", "0");
        let mut output = Vec::new();
        assert!(matches!(
            SineOscillator.instantiate(&node, &mut output),
            Err(CompileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_dimmer_nests_an_oscillator() {
        let node = Filter::new("dim", FilterKind::OscillatingDimmer)
            .with_parameter("period", "250")
            .with_parameter("offset", "0.25");

        let mut output = Vec::new();
        OscillatingDimmer.instantiate(&node, &mut output).unwrap();

        assert!(output[0].is_virtual());
        let nested = output[0].filter();
        assert_eq!(nested.id, "dim__osc");
        assert_eq!(nested.initial_parameters.get("offset").map(String::as_str), Some("0.25"));
        assert_eq!(nested.initial_parameters.get("period").map(String::as_str), Some("250"));
        assert_eq!(OscillatingDimmer.resolve_output_port(&node, "level"), None);
    }
}
