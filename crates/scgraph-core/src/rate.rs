//! Calculation and parameter rates.
//!
//! Every node runs at one [`CalculationRate`]. Declared graph parameters carry a
//! [`ParameterRate`], which decides which Control-family node packs them at
//! build time.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// How often a node computes its outputs.
///
/// The discriminants are the wire codes. Ordering follows the codes, so the
/// "fastest" rate of a set of operands is their maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CalculationRate {
    /// Computed once at synth start (`ir`).
    Scalar = 0,
    /// Computed once per control block (`kr`).
    Control = 1,
    /// Computed per sample (`ar`).
    Audio = 2,
    /// Computed on demand (`dr`).
    Demand = 3,
}

impl CalculationRate {
    /// Wire code written in node records.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decodes a wire code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Scalar),
            1 => Some(Self::Control),
            2 => Some(Self::Audio),
            3 => Some(Self::Demand),
            _ => None,
        }
    }

    /// Two-letter sclang token (`ir`, `kr`, `ar`, `dr`).
    pub const fn token(self) -> &'static str {
        match self {
            Self::Scalar => "ir",
            Self::Control => "kr",
            Self::Audio => "ar",
            Self::Demand => "dr",
        }
    }
}

impl fmt::Display for CalculationRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Rate class of a declared graph parameter.
///
/// The discriminant order is the order in which Control-family nodes are
/// emitted by [`SynthDefBuilder::build`](crate::SynthDefBuilder::build).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ParameterRate {
    /// Set once at synth creation (`Control.ir`).
    Scalar = 0,
    /// Trigger-style control that resets after one block (`TrigControl.kr`).
    Trigger = 1,
    /// Audio-rate control (`AudioControl.ar`).
    Audio = 2,
    /// Ordinary control-rate parameter (`Control.kr` / `LagControl.kr`).
    #[default]
    Control = 3,
}

impl ParameterRate {
    /// All rates in Control emission order.
    pub const ALL: [Self; 4] = [Self::Scalar, Self::Trigger, Self::Audio, Self::Control];

    /// Calculation rate of the Control node that packs this parameter.
    pub const fn calculation_rate(self) -> CalculationRate {
        match self {
            Self::Scalar => CalculationRate::Scalar,
            Self::Trigger | Self::Control => CalculationRate::Control,
            Self::Audio => CalculationRate::Audio,
        }
    }

    /// Short token used in configuration files.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Scalar => "ir",
            Self::Trigger => "tr",
            Self::Audio => "ar",
            Self::Control => "kr",
        }
    }
}

impl fmt::Display for ParameterRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when a rate name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown parameter rate '{0}' (expected ir, kr, ar or tr)")]
pub struct ParseRateError(pub String);

impl FromStr for ParameterRate {
    type Err = ParseRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ir" | "scalar" => Ok(Self::Scalar),
            "tr" | "trigger" => Ok(Self::Trigger),
            "ar" | "audio" => Ok(Self::Audio),
            "kr" | "control" => Ok(Self::Control),
            _ => Err(ParseRateError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_codes_round_trip() {
        for code in 0..4u8 {
            let rate = CalculationRate::from_code(code).unwrap();
            assert_eq!(rate.code(), code);
        }
        assert!(CalculationRate::from_code(4).is_none());
    }

    #[test]
    fn test_rate_ordering_picks_fastest() {
        let rates = [
            CalculationRate::Control,
            CalculationRate::Audio,
            CalculationRate::Scalar,
        ];
        assert_eq!(rates.iter().max(), Some(&CalculationRate::Audio));
    }

    #[test]
    fn test_trigger_runs_at_control_rate() {
        assert_eq!(
            ParameterRate::Trigger.calculation_rate(),
            CalculationRate::Control
        );
        assert_eq!(
            ParameterRate::Scalar.calculation_rate(),
            CalculationRate::Scalar
        );
    }

    #[test]
    fn test_parse_parameter_rate() {
        assert_eq!("ar".parse::<ParameterRate>(), Ok(ParameterRate::Audio));
        assert_eq!("Trigger".parse::<ParameterRate>(), Ok(ParameterRate::Trigger));
        assert_eq!(" kr ".parse::<ParameterRate>(), Ok(ParameterRate::Control));
        assert!("xr".parse::<ParameterRate>().is_err());
    }
}
