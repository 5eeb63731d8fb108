// SPDX-License-Identifier: MIT OR Apache-2.0
//! The closed set of filter kinds understood by the realtime engine.
//!
//! Kinds are persisted by their symbolic tag (`FILTER_...` for kinds the
//! engine executes, `VFILTER_...` for macros that only exist at authoring
//! time and are expanded by the compiler).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Family a filter kind belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterFamily {
    /// Numeric, boolean and color constants
    Constant,
    /// Debug sinks printing their input
    Debug,
    /// Float arithmetic
    Arithmetic,
    /// Boolean logic and comparison
    Logic,
    /// Trigonometric functions
    Trigonometric,
    /// Periodic wave generators
    Wave,
    /// Time sources and delay elements
    Time,
    /// Control desk fader and button bindings
    Console,
    /// Type adapters and converters
    Converter,
    /// Script driven filters
    Scripted,
    /// DMX universe output
    Output,
    /// Macros expanded at compile time
    Virtual,
}

/// Kind of a filter node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum FilterKind {
    // Constants
    Constant8Bit,
    Constant16Bit,
    ConstantFloat,
    ConstantColor,
    ConstantBool,

    // Debug sinks
    Debug8Bit,
    Debug16Bit,
    DebugFloat,
    DebugColor,
    DebugBool,

    // Arithmetic
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    Maximum,
    Minimum,
    Absolute,
    Ceil,
    Floor,
    Round,
    Logarithm,
    Exponential,
    SquareRoot,
    MultiplyAdd,

    // Logic
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    LogicalNot,
    CompareGreater,
    CompareEqual,
    Switch8Bit,

    // Trigonometric
    Sine,
    Cosine,
    Tangent,
    Arcsine,
    Arccosine,
    Arctangent,

    // Waves
    SquareWave,
    TriangleWave,
    SawtoothWave,
    NoiseWave,

    // Time
    TimeSource,
    SceneTime,
    DelaySwitchOn,
    DelaySwitchOff,
    FadeSwitchOn,
    FadeSwitchOff,
    SampleAndHold,

    // Console
    MainBrightnessFader,
    FaderColumnRaw,
    FaderColumnHsi,
    ConsoleButton,
    ConsoleJogwheel,

    // Converters
    EightBitToFloat,
    SixteenBitToFloat,
    FloatToEightBit,
    FloatToSixteenBit,
    EightBitToBool,
    BoolToEightBit,
    EightBitToSixteenBit,
    SixteenBitToDualEightBit,
    DualEightBitToSixteenBit,
    ColorToRgb,
    ColorToRgbw,
    ColorToRgbwa,
    ColorToFloats,
    FloatsToColor,
    ColorBrightnessMixin,

    // Scripted
    LuaScript,
    CueSequence,

    // Output
    UniverseOutput,

    // Virtual
    PositionConstant,
    SineOscillator,
    DimmedColor,
    DelayChain,
    OscillatingDimmer,
}

impl FilterKind {
    /// Every kind, in wire order
    pub fn all() -> &'static [FilterKind] {
        use FilterKind::*;
        &[
            Constant8Bit, Constant16Bit, ConstantFloat, ConstantColor, ConstantBool,
            Debug8Bit, Debug16Bit, DebugFloat, DebugColor, DebugBool,
            Addition, Subtraction, Multiplication, Division, Modulo, Maximum, Minimum,
            Absolute, Ceil, Floor, Round, Logarithm, Exponential, SquareRoot, MultiplyAdd,
            LogicalAnd, LogicalOr, LogicalXor, LogicalNot, CompareGreater, CompareEqual,
            Switch8Bit,
            Sine, Cosine, Tangent, Arcsine, Arccosine, Arctangent,
            SquareWave, TriangleWave, SawtoothWave, NoiseWave,
            TimeSource, SceneTime, DelaySwitchOn, DelaySwitchOff, FadeSwitchOn, FadeSwitchOff,
            SampleAndHold,
            MainBrightnessFader, FaderColumnRaw, FaderColumnHsi, ConsoleButton, ConsoleJogwheel,
            EightBitToFloat, SixteenBitToFloat, FloatToEightBit, FloatToSixteenBit,
            EightBitToBool, BoolToEightBit, EightBitToSixteenBit, SixteenBitToDualEightBit,
            DualEightBitToSixteenBit, ColorToRgb, ColorToRgbw, ColorToRgbwa, ColorToFloats,
            FloatsToColor, ColorBrightnessMixin,
            LuaScript, CueSequence,
            UniverseOutput,
            PositionConstant, SineOscillator, DimmedColor, DelayChain, OscillatingDimmer,
        ]
    }

    /// Symbolic tag used on the wire
    pub fn tag(&self) -> &'static str {
        use FilterKind::*;
        match self {
            Constant8Bit => "FILTER_CONSTANT_8BIT",
            Constant16Bit => "FILTER_CONSTANT_16_BIT",
            ConstantFloat => "FILTER_CONSTANT_FLOAT",
            ConstantColor => "FILTER_CONSTANT_COLOR",
            ConstantBool => "FILTER_CONSTANT_BOOL",
            Debug8Bit => "FILTER_DEBUG_OUTPUT_8BIT",
            Debug16Bit => "FILTER_DEBUG_OUTPUT_16BIT",
            DebugFloat => "FILTER_DEBUG_OUTPUT_FLOAT",
            DebugColor => "FILTER_DEBUG_OUTPUT_COLOR",
            DebugBool => "FILTER_DEBUG_OUTPUT_BOOL",
            Addition => "FILTER_ARITHMETICS_ADDITION",
            Subtraction => "FILTER_ARITHMETICS_SUBTRACTION",
            Multiplication => "FILTER_ARITHMETICS_MULTIPLICATION",
            Division => "FILTER_ARITHMETICS_DIVISION",
            Modulo => "FILTER_ARITHMETICS_MODULO",
            Maximum => "FILTER_ARITHMETICS_MAX",
            Minimum => "FILTER_ARITHMETICS_MIN",
            Absolute => "FILTER_ARITHMETICS_ABS",
            Ceil => "FILTER_ARITHMETICS_CEIL",
            Floor => "FILTER_ARITHMETICS_FLOOR",
            Round => "FILTER_ARITHMETICS_ROUND",
            Logarithm => "FILTER_ARITHMETICS_LOG",
            Exponential => "FILTER_ARITHMETICS_EXP",
            SquareRoot => "FILTER_ARITHMETICS_SQRT",
            MultiplyAdd => "FILTER_TYPE_MULTIPLY_ADD",
            LogicalAnd => "FILTER_LOGIC_AND",
            LogicalOr => "FILTER_LOGIC_OR",
            LogicalXor => "FILTER_LOGIC_XOR",
            LogicalNot => "FILTER_LOGIC_NOT",
            CompareGreater => "FILTER_COMPARE_GREATER",
            CompareEqual => "FILTER_COMPARE_EQUAL",
            Switch8Bit => "FILTER_SWITCH_8BIT",
            Sine => "FILTER_TRIGONOMETRIC_SIN",
            Cosine => "FILTER_TRIGONOMETRIC_COS",
            Tangent => "FILTER_TRIGONOMETRIC_TAN",
            Arcsine => "FILTER_TRIGONOMETRIC_ARCSIN",
            Arccosine => "FILTER_TRIGONOMETRIC_ARCCOS",
            Arctangent => "FILTER_TRIGONOMETRIC_ARCTAN",
            SquareWave => "FILTER_WAVES_SQUARE",
            TriangleWave => "FILTER_WAVES_TRIANGLE",
            SawtoothWave => "FILTER_WAVES_SAWTOOTH",
            NoiseWave => "FILTER_WAVES_NOISE",
            TimeSource => "FILTER_TIME",
            SceneTime => "FILTER_SCENE_TIME",
            DelaySwitchOn => "FILTER_DELAY_SWITCH_ON",
            DelaySwitchOff => "FILTER_DELAY_SWITCH_OFF",
            FadeSwitchOn => "FILTER_FADE_SWITCH_ON",
            FadeSwitchOff => "FILTER_FADE_SWITCH_OFF",
            SampleAndHold => "FILTER_SAMPLE_AND_HOLD",
            MainBrightnessFader => "FILTER_MAIN_BRIGHTNESS_FADER",
            FaderColumnRaw => "FILTER_FADER_COLUMN_RAW",
            FaderColumnHsi => "FILTER_FADER_COLUMN_HSI",
            ConsoleButton => "FILTER_CONSOLE_BUTTON",
            ConsoleJogwheel => "FILTER_CONSOLE_JOGWHEEL",
            EightBitToFloat => "FILTER_8BIT_TO_FLOAT",
            SixteenBitToFloat => "FILTER_16BIT_TO_FLOAT",
            FloatToEightBit => "FILTER_FLOAT_TO_8BIT",
            FloatToSixteenBit => "FILTER_FLOAT_TO_16BIT",
            EightBitToBool => "FILTER_8BIT_TO_BOOL",
            BoolToEightBit => "FILTER_BOOL_TO_8BIT",
            EightBitToSixteenBit => "FILTER_8BIT_TO_16BIT",
            SixteenBitToDualEightBit => "FILTER_16BIT_TO_DUAL_8BIT",
            DualEightBitToSixteenBit => "FILTER_DUAL_8BIT_TO_16BIT",
            ColorToRgb => "FILTER_COLOR_TO_RGB",
            ColorToRgbw => "FILTER_COLOR_TO_RGBW",
            ColorToRgbwa => "FILTER_COLOR_TO_RGBWA",
            ColorToFloats => "FILTER_COLOR_TO_FLOAT",
            FloatsToColor => "FILTER_FLOAT_TO_COLOR",
            ColorBrightnessMixin => "FILTER_COLOR_BRIGHTNESS_MIXIN",
            LuaScript => "FILTER_SCRIPT_LUA",
            CueSequence => "FILTER_CUES",
            UniverseOutput => "FILTER_UNIVERSE_OUTPUT",
            PositionConstant => "VFILTER_POSITION_CONSTANT",
            SineOscillator => "VFILTER_SINE_OSCILLATOR",
            DimmedColor => "VFILTER_DIMMED_COLOR",
            DelayChain => "VFILTER_DELAY_CHAIN",
            OscillatingDimmer => "VFILTER_OSCILLATING_DIMMER",
        }
    }

    /// Look up a kind by its wire tag
    pub fn from_tag(tag: &str) -> Option<FilterKind> {
        Self::all().iter().copied().find(|k| k.tag() == tag)
    }

    /// Family this kind belongs to
    pub fn family(&self) -> FilterFamily {
        use FilterKind::*;
        match self {
            Constant8Bit | Constant16Bit | ConstantFloat | ConstantColor | ConstantBool => {
                FilterFamily::Constant
            }
            Debug8Bit | Debug16Bit | DebugFloat | DebugColor | DebugBool => FilterFamily::Debug,
            Addition | Subtraction | Multiplication | Division | Modulo | Maximum | Minimum
            | Absolute | Ceil | Floor | Round | Logarithm | Exponential | SquareRoot
            | MultiplyAdd => FilterFamily::Arithmetic,
            LogicalAnd | LogicalOr | LogicalXor | LogicalNot | CompareGreater | CompareEqual
            | Switch8Bit => FilterFamily::Logic,
            Sine | Cosine | Tangent | Arcsine | Arccosine | Arctangent => {
                FilterFamily::Trigonometric
            }
            SquareWave | TriangleWave | SawtoothWave | NoiseWave => FilterFamily::Wave,
            TimeSource | SceneTime | DelaySwitchOn | DelaySwitchOff | FadeSwitchOn
            | FadeSwitchOff | SampleAndHold => FilterFamily::Time,
            MainBrightnessFader | FaderColumnRaw | FaderColumnHsi | ConsoleButton
            | ConsoleJogwheel => FilterFamily::Console,
            EightBitToFloat | SixteenBitToFloat | FloatToEightBit | FloatToSixteenBit
            | EightBitToBool | BoolToEightBit | EightBitToSixteenBit | SixteenBitToDualEightBit
            | DualEightBitToSixteenBit | ColorToRgb | ColorToRgbw | ColorToRgbwa
            | ColorToFloats | FloatsToColor | ColorBrightnessMixin => FilterFamily::Converter,
            LuaScript | CueSequence => FilterFamily::Scripted,
            UniverseOutput => FilterFamily::Output,
            PositionConstant | SineOscillator | DimmedColor | DelayChain | OscillatingDimmer => {
                FilterFamily::Virtual
            }
        }
    }

    /// Whether this kind is a macro that must be expanded before deployment
    pub fn is_virtual(&self) -> bool {
        self.family() == FilterFamily::Virtual
    }

    /// Whether at most one instance of this kind may reach a compiled scene
    pub fn is_singleton(&self) -> bool {
        matches!(
            self,
            FilterKind::TimeSource | FilterKind::SceneTime | FilterKind::MainBrightnessFader
        )
    }

    /// Configuration key persisted with key and value swapped on the wire.
    ///
    /// Universe-targeting kinds store their `universe` entry as
    /// `name="<universe id>" value="universe"`.
    pub fn swapped_configuration_key(&self) -> Option<&'static str> {
        match self {
            FilterKind::UniverseOutput => Some("universe"),
            _ => None,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FilterKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownKindError(s.to_string()))
    }
}

/// Tag does not name a filter kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown filter kind: {0}")]
pub struct UnknownKindError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tags_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for kind in FilterKind::all() {
            assert!(seen.insert(kind.tag()), "duplicate tag {}", kind.tag());
            assert_eq!(FilterKind::from_tag(kind.tag()), Some(*kind));
        }
        assert!("FILTER_NOPE".parse::<FilterKind>().is_err());
    }

    #[test]
    fn test_virtual_kinds_use_vfilter_prefix() {
        for kind in FilterKind::all() {
            assert_eq!(kind.is_virtual(), kind.tag().starts_with("VFILTER_"));
        }
    }

    #[test]
    fn test_singletons_are_concrete() {
        let singletons: Vec<_> = FilterKind::all().iter().filter(|k| k.is_singleton()).collect();
        assert_eq!(singletons.len(), 3);
        assert!(singletons.iter().all(|k| !k.is_virtual()));
    }
}
