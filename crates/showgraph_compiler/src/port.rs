// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port references and per-kind port signatures.

use crate::kind::FilterKind;
use crate::value::ValueType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to an output port of a filter, encoded on the wire as `filter:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortRef {
    /// Producing filter id
    pub filter: String,
    /// Output port name on the producer
    pub port: String,
}

impl PortRef {
    /// Create a reference to `filter:port`
    pub fn new(filter: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filter, self.port)
    }
}

impl FromStr for PortRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Filter ids never contain ':'; port names may.
        match s.split_once(':') {
            Some((filter, port)) if !filter.is_empty() && !port.is_empty() => {
                Ok(PortRef::new(filter, port))
            }
            _ => Err(ReferenceError(s.to_string())),
        }
    }
}

/// Reference text is not of the form `filter:port`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed port reference: '{0}'")]
pub struct ReferenceError(pub String);

/// Declared input and output ports of a filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSignature {
    /// Input ports and their types
    pub inputs: IndexMap<String, ValueType>,
    /// Output ports and their types
    pub outputs: IndexMap<String, ValueType>,
}

impl PortSignature {
    fn fixed(inputs: &[(&str, ValueType)], outputs: &[(&str, ValueType)]) -> Self {
        Self {
            inputs: inputs.iter().map(|(n, t)| (n.to_string(), *t)).collect(),
            outputs: outputs.iter().map(|(n, t)| (n.to_string(), *t)).collect(),
        }
    }

    /// Compute the ports of a filter kind under the given configuration
    ///
    /// Most kinds have a fixed signature. Scripted filters declare their ports
    /// in mapping entries and universe outputs expose one input per patched
    /// channel.
    pub fn for_kind(
        kind: FilterKind,
        configuration: &IndexMap<String, String>,
    ) -> Result<Self, PortMappingError> {
        use FilterKind::*;
        use ValueType::{Bool, Color, EightBit as U8, Float, SixteenBit as U16};

        let unary = |t: ValueType| Self::fixed(&[("value", t)], &[("value", t)]);
        let convert = |from: ValueType, to: ValueType| Self::fixed(&[("value", from)], &[("value", to)]);
        let binary = |input: ValueType, output: ValueType| {
            Self::fixed(&[("param1", input), ("param2", input)], &[("value", output)])
        };

        let signature = match kind {
            Constant8Bit => Self::fixed(&[], &[("value", U8)]),
            Constant16Bit => Self::fixed(&[], &[("value", U16)]),
            ConstantFloat => Self::fixed(&[], &[("value", Float)]),
            ConstantColor => Self::fixed(&[], &[("value", Color)]),
            ConstantBool => Self::fixed(&[], &[("value", Bool)]),

            Debug8Bit => Self::fixed(&[("value", U8)], &[]),
            Debug16Bit => Self::fixed(&[("value", U16)], &[]),
            DebugFloat => Self::fixed(&[("value", Float)], &[]),
            DebugColor => Self::fixed(&[("value", Color)], &[]),
            DebugBool => Self::fixed(&[("value", Bool)], &[]),

            Addition | Subtraction | Multiplication | Division | Modulo | Maximum | Minimum => {
                binary(Float, Float)
            }
            Absolute | Ceil | Floor | Round | Logarithm | Exponential | SquareRoot
            | MultiplyAdd => unary(Float),

            LogicalAnd | LogicalOr | LogicalXor => binary(Bool, Bool),
            LogicalNot => unary(Bool),
            CompareGreater | CompareEqual => binary(Float, Bool),
            Switch8Bit => Self::fixed(
                &[("condition", Bool), ("value_true", U8), ("value_false", U8)],
                &[("value", U8)],
            ),

            Sine | Cosine | Tangent | Arcsine | Arccosine | Arctangent => unary(Float),

            SquareWave | TriangleWave | SawtoothWave | NoiseWave => {
                Self::fixed(&[("time", Float)], &[("value", Float)])
            }

            TimeSource | SceneTime => Self::fixed(&[], &[("value", Float)]),
            DelaySwitchOn | DelaySwitchOff | FadeSwitchOn | FadeSwitchOff => unary(U8),
            SampleAndHold => Self::fixed(&[("value", Float), ("trigger", Bool)], &[("value", Float)]),

            MainBrightnessFader => Self::fixed(&[], &[("value", U8)]),
            FaderColumnRaw => Self::fixed(&[], &[("fader", U16), ("encoder", U16)]),
            FaderColumnHsi => Self::fixed(&[], &[("color", Color)]),
            ConsoleButton => Self::fixed(&[], &[("value", Bool)]),
            ConsoleJogwheel => Self::fixed(&[], &[("value", Float)]),

            EightBitToFloat => convert(U8, Float),
            SixteenBitToFloat => convert(U16, Float),
            FloatToEightBit => convert(Float, U8),
            FloatToSixteenBit => convert(Float, U16),
            EightBitToBool => convert(U8, Bool),
            BoolToEightBit => convert(Bool, U8),
            EightBitToSixteenBit => convert(U8, U16),
            SixteenBitToDualEightBit => Self::fixed(
                &[("value", U16)],
                &[("value_upper", U8), ("value_lower", U8)],
            ),
            DualEightBitToSixteenBit => Self::fixed(
                &[("value_upper", U8), ("value_lower", U8)],
                &[("value", U16)],
            ),
            ColorToRgb => Self::fixed(&[("value", Color)], &[("r", U8), ("g", U8), ("b", U8)]),
            ColorToRgbw => Self::fixed(
                &[("value", Color)],
                &[("r", U8), ("g", U8), ("b", U8), ("w", U8)],
            ),
            ColorToRgbwa => Self::fixed(
                &[("value", Color)],
                &[("r", U8), ("g", U8), ("b", U8), ("w", U8), ("a", U8)],
            ),
            ColorToFloats => Self::fixed(
                &[("value", Color)],
                &[("h", Float), ("s", Float), ("i", Float)],
            ),
            FloatsToColor => Self::fixed(
                &[("h", Float), ("s", Float), ("i", Float)],
                &[("value", Color)],
            ),
            ColorBrightnessMixin => Self::fixed(
                &[("color", Color), ("brightness", U8)],
                &[("value", Color)],
            ),

            LuaScript => Self {
                inputs: parse_port_mapping(configuration, "in_mapping")?,
                outputs: parse_port_mapping(configuration, "out_mapping")?,
            },
            CueSequence => Self {
                inputs: Self::fixed(&[("time", Float)], &[]).inputs,
                outputs: parse_port_mapping(configuration, "mapping")?,
            },

            UniverseOutput => Self {
                inputs: configuration
                    .keys()
                    .filter(|key| Some(key.as_str()) != kind.swapped_configuration_key())
                    .map(|key| (key.clone(), U8))
                    .collect(),
                outputs: IndexMap::new(),
            },

            PositionConstant => Self::fixed(
                &[],
                &[("pan", U8), ("pan_fine", U8), ("tilt", U8), ("tilt_fine", U8)],
            ),
            SineOscillator => Self::fixed(&[], &[("value", Float)]),
            DimmedColor => Self::fixed(&[("color", Color)], &[("value", Color)]),
            DelayChain => unary(U8),
            OscillatingDimmer => Self::fixed(&[], &[("value", U8)]),
        };

        Ok(signature)
    }
}

/// Parse a `name:type;name:type` port mapping stored under `key`
///
/// A missing entry declares no ports.
pub fn parse_port_mapping(
    configuration: &IndexMap<String, String>,
    key: &str,
) -> Result<IndexMap<String, ValueType>, PortMappingError> {
    let Some(raw) = configuration.get(key) else {
        return Ok(IndexMap::new());
    };

    let invalid = || PortMappingError {
        key: key.to_string(),
        raw: raw.clone(),
    };

    let mut ports = IndexMap::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, type_name) = entry.split_once(':').ok_or_else(invalid)?;
        let value_type: ValueType = type_name.trim().parse().map_err(|_| invalid())?;
        let name = name.trim();
        if name.is_empty() || ports.insert(name.to_string(), value_type).is_some() {
            return Err(invalid());
        }
    }
    Ok(ports)
}

/// Encode ports as a `name:type;name:type` mapping
pub fn format_port_mapping(ports: &[(&str, ValueType)]) -> String {
    ports
        .iter()
        .map(|(name, value_type)| format!("{name}:{value_type}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Port mapping entry in a filter configuration is malformed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed port mapping '{key}': '{raw}'")]
pub struct PortMappingError {
    /// Configuration key holding the mapping
    pub key: String,
    /// Mapping text
    pub raw: String,
}
