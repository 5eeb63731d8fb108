// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value types that flow through filter ports, and their wire codec.
//!
//! Every port carries exactly one [`ValueType`]. Values are persisted as
//! strings; parsing clamps into the legal range of the type rather than
//! rejecting out-of-range input, so `"300"` read as 8-bit becomes `255`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data type carried by a filter port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Unsigned 8-bit (0-255)
    EightBit,
    /// Unsigned 16-bit (0-65535)
    SixteenBit,
    /// Double-precision float
    Float,
    /// Boolean
    Bool,
    /// Hue/saturation/intensity color
    Color,
}

impl ValueType {
    /// All value types, in wire order
    pub fn all() -> &'static [ValueType] {
        &[
            ValueType::EightBit,
            ValueType::SixteenBit,
            ValueType::Float,
            ValueType::Bool,
            ValueType::Color,
        ]
    }

    /// Canonical wire encoding of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::EightBit => "8bit",
            ValueType::SixteenBit => "16bit",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Color => "color",
        }
    }

    /// Zero value of this type
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::EightBit => Value::EightBit(0),
            ValueType::SixteenBit => Value::SixteenBit(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Color => Value::Color(ColorHsi::default()),
        }
    }

    /// Parse a wire-encoded value of this type, clamping into range
    pub fn parse_value(&self, raw: &str) -> Result<Value, ValueError> {
        let trimmed = raw.trim();
        match self {
            ValueType::EightBit => {
                let number = parse_number(trimmed, *self)?;
                Ok(Value::EightBit(number.round().clamp(0.0, u8::MAX as f64) as u8))
            }
            ValueType::SixteenBit => {
                let number = parse_number(trimmed, *self)?;
                Ok(Value::SixteenBit(number.round().clamp(0.0, u16::MAX as f64) as u16))
            }
            ValueType::Float => parse_number(trimmed, *self).map(Value::Float),
            ValueType::Bool => match trimmed {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(ValueError::Malformed {
                    value_type: *self,
                    raw: raw.to_string(),
                }),
            },
            ValueType::Color => trimmed.parse::<ColorHsi>().map(Value::Color),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValueError::UnknownType(s.to_string()))
    }
}

fn parse_number(raw: &str, value_type: ValueType) -> Result<f64, ValueError> {
    match raw.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(ValueError::Malformed {
            value_type,
            raw: raw.to_string(),
        }),
    }
}

/// A color in hue/saturation/intensity space
///
/// Hue is in degrees and wraps into `[0, 360)`. Saturation and intensity are
/// clamped into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorHsi {
    /// Hue in degrees
    pub hue: f64,
    /// Saturation (0-1)
    pub saturation: f64,
    /// Intensity (0-1)
    pub intensity: f64,
}

impl ColorHsi {
    /// Create a color, normalizing every component
    pub fn new(hue: f64, saturation: f64, intensity: f64) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: saturation.clamp(0.0, 1.0),
            intensity: intensity.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for ColorHsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.hue, self.saturation, self.intensity)
    }
}

impl FromStr for ColorHsi {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValueError::Malformed {
            value_type: ValueType::Color,
            raw: s.to_string(),
        };

        let components = s
            .split(',')
            .map(|part| parse_number(part.trim(), ValueType::Color))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;

        let [hue, saturation, intensity] = components.as_slice() else {
            return Err(malformed());
        };
        Ok(Self::new(*hue, *saturation, *intensity))
    }
}

/// A typed value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 8-bit value
    EightBit(u8),
    /// 16-bit value
    SixteenBit(u16),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Color value
    Color(ColorHsi),
}

impl Value {
    /// Get the type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::EightBit(_) => ValueType::EightBit,
            Self::SixteenBit(_) => ValueType::SixteenBit,
            Self::Float(_) => ValueType::Float,
            Self::Bool(_) => ValueType::Bool,
            Self::Color(_) => ValueType::Color,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EightBit(v) => write!(f, "{v}"),
            Self::SixteenBit(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Color(v) => write!(f, "{v}"),
        }
    }
}

/// Error while decoding a value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// Type name is not one of the wire encodings
    #[error("Unknown value type: {0}")]
    UnknownType(String),

    /// Value text does not parse as the requested type
    #[error("Malformed {value_type} value: '{raw}'")]
    Malformed {
        /// Requested type
        value_type: ValueType,
        /// Offending text
        raw: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codec() {
        for value_type in ValueType::all() {
            let parsed: ValueType = value_type.as_str().parse().unwrap();
            assert_eq!(parsed, *value_type);
        }
        assert!("rgb".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_integer_clamping() {
        assert_eq!(ValueType::EightBit.parse_value("300").unwrap(), Value::EightBit(255));
        assert_eq!(ValueType::EightBit.parse_value("-4").unwrap(), Value::EightBit(0));
        assert_eq!(ValueType::EightBit.parse_value("12.6").unwrap(), Value::EightBit(13));
        assert_eq!(
            ValueType::SixteenBit.parse_value("70000").unwrap(),
            Value::SixteenBit(65535)
        );
    }

    #[test]
    fn test_color_normalization() {
        let value = ValueType::Color.parse_value("370, 1.5, 0.25").unwrap();
        assert_eq!(value, Value::Color(ColorHsi::new(10.0, 1.0, 0.25)));
        assert_eq!(value.to_string(), "10,1,0.25");

        let negative = ColorHsi::new(-90.0, 0.5, -1.0);
        assert_eq!(negative.hue, 270.0);
        assert_eq!(negative.intensity, 0.0);
    }

    #[test]
    fn test_malformed_values() {
        assert!(ValueType::Float.parse_value("fast").is_err());
        assert!(ValueType::Float.parse_value("NaN").is_err());
        assert!(ValueType::Bool.parse_value("yes").is_err());
        assert!(ValueType::Color.parse_value("1,2").is_err());
        assert_eq!(ValueType::Bool.parse_value("1").unwrap(), Value::Bool(true));
    }
}
