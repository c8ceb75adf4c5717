//! Operator codes for `BinaryOpUGen` and `UnaryOpUGen`.
//!
//! The special index of an operator node is the operator's wire code. Where a
//! float equivalent exists, [`BinaryOperator::fold`] and [`UnaryOperator::fold`]
//! evaluate the operator on constants so that constant-only arithmetic never
//! reaches the graph.

use core::fmt;

macro_rules! operator_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $code:literal => $label:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum $name {
            $($variant = $code,)+
        }

        impl $name {
            /// Wire code, used as the node's special index.
            pub const fn code(self) -> u16 {
                self as u16
            }

            /// Decodes a special index.
            pub const fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Upper-case operator name, as shown in graph dumps.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

operator_enum! {
    /// Two-operand math operators understood by `BinaryOpUGen`.
    BinaryOperator {
        Addition = 0 => "ADDITION",
        Subtraction = 1 => "SUBTRACTION",
        Multiplication = 2 => "MULTIPLICATION",
        IntegerDivision = 3 => "INTEGER_DIVISION",
        FloatDivision = 4 => "FLOAT_DIVISION",
        Modulo = 5 => "MODULO",
        Equal = 6 => "EQUAL",
        NotEqual = 7 => "NOT_EQUAL",
        LessThan = 8 => "LESS_THAN",
        GreaterThan = 9 => "GREATER_THAN",
        LessThanOrEqual = 10 => "LESS_THAN_OR_EQUAL",
        GreaterThanOrEqual = 11 => "GREATER_THAN_OR_EQUAL",
        Minimum = 12 => "MINIMUM",
        Maximum = 13 => "MAXIMUM",
        BitwiseAnd = 14 => "BITWISE_AND",
        BitwiseOr = 15 => "BITWISE_OR",
        BitwiseXor = 16 => "BITWISE_XOR",
        LeastCommonMultiple = 17 => "LEAST_COMMON_MULTIPLE",
        GreatestCommonDivisor = 18 => "GREATEST_COMMON_DIVISOR",
        Round = 19 => "ROUND",
        RoundUp = 20 => "ROUND_UP",
        Truncation = 21 => "TRUNCATION",
        Atan2 = 22 => "ATAN2",
        Hypot = 23 => "HYPOT",
        Hypotx = 24 => "HYPOTX",
        Power = 25 => "POWER",
        ShiftLeft = 26 => "SHIFT_LEFT",
        ShiftRight = 27 => "SHIFT_RIGHT",
        UnsignedShift = 28 => "UNSIGNED_SHIFT",
        Fill = 29 => "FILL",
        Ring1 = 30 => "RING1",
        Ring2 = 31 => "RING2",
        Ring3 = 32 => "RING3",
        Ring4 = 33 => "RING4",
        DifferenceOfSquares = 34 => "DIFFERENCE_OF_SQUARES",
        SumOfSquares = 35 => "SUM_OF_SQUARES",
        SquareOfSum = 36 => "SQUARE_OF_SUM",
        SquareOfDifference = 37 => "SQUARE_OF_DIFFERENCE",
        AbsoluteDifference = 38 => "ABSOLUTE_DIFFERENCE",
        Threshold = 39 => "THRESHOLD",
        Amclip = 40 => "AMCLIP",
        ScaleNeg = 41 => "SCALE_NEG",
        Clip2 = 42 => "CLIP2",
        Excess = 43 => "EXCESS",
        Fold2 = 44 => "FOLD2",
        Wrap2 = 45 => "WRAP2",
        FirstArg = 46 => "FIRST_ARG",
        Randrange = 47 => "RANDRANGE",
        Exprandrange = 48 => "EXPRANDRANGE",
    }
}

operator_enum! {
    /// One-operand math operators understood by `UnaryOpUGen`.
    UnaryOperator {
        Negative = 0 => "NEGATIVE",
        Not = 1 => "NOT",
        IsNil = 2 => "IS_NIL",
        NotNil = 3 => "NOT_NIL",
        BitNot = 4 => "BIT_NOT",
        AbsoluteValue = 5 => "ABSOLUTE_VALUE",
        AsFloat = 6 => "AS_FLOAT",
        AsInt = 7 => "AS_INT",
        Ceiling = 8 => "CEILING",
        Floor = 9 => "FLOOR",
        FractionalPart = 10 => "FRACTIONAL_PART",
        Sign = 11 => "SIGN",
        Squared = 12 => "SQUARED",
        Cubed = 13 => "CUBED",
        SquareRoot = 14 => "SQUARE_ROOT",
        Exponential = 15 => "EXPONENTIAL",
        Reciprocal = 16 => "RECIPROCAL",
        MidiToHz = 17 => "MIDI_TO_HZ",
        HzToMidi = 18 => "HZ_TO_MIDI",
        SemitonesToRatio = 19 => "SEMITONES_TO_RATIO",
        RatioToSemitones = 20 => "RATIO_TO_SEMITONES",
        DbToAmplitude = 21 => "DB_TO_AMPLITUDE",
        AmplitudeToDb = 22 => "AMPLITUDE_TO_DB",
        OctaveToHz = 23 => "OCTAVE_TO_HZ",
        HzToOctave = 24 => "HZ_TO_OCTAVE",
        Log = 25 => "LOG",
        Log2 = 26 => "LOG2",
        Log10 = 27 => "LOG10",
        Sin = 28 => "SIN",
        Cos = 29 => "COS",
        Tan = 30 => "TAN",
        Arcsin = 31 => "ARCSIN",
        Arccos = 32 => "ARCCOS",
        Arctan = 33 => "ARCTAN",
        Sinh = 34 => "SINH",
        Cosh = 35 => "COSH",
        Tanh = 36 => "TANH",
        Rand = 37 => "RAND",
        Rand2 = 38 => "RAND2",
        Linrand = 39 => "LINRAND",
        Bilinrand = 40 => "BILINRAND",
        Sum3rand = 41 => "SUM3RAND",
        Distort = 42 => "DISTORT",
        Softclip = 43 => "SOFTCLIP",
        Coin = 44 => "COIN",
        DigitValue = 45 => "DIGIT_VALUE",
        Silence = 46 => "SILENCE",
        Thru = 47 => "THRU",
        RectangleWindow = 48 => "RECTANGLE_WINDOW",
        HanningWindow = 49 => "HANNING_WINDOW",
        WelchWindow = 50 => "WELCH_WINDOW",
        TriangleWindow = 51 => "TRIANGLE_WINDOW",
        Ramp = 52 => "RAMP",
        SCurve = 53 => "S_CURVE",
    }
}

fn bool_to_float(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Floored modulo: the result takes the sign of the divisor.
fn floored_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn finite(value: f64) -> Option<f32> {
    let narrowed = value as f32;
    narrowed.is_finite().then_some(narrowed)
}

impl BinaryOperator {
    /// Evaluates the operator on two constants.
    ///
    /// Returns `None` when there is no float equivalent or the result is not
    /// finite; the caller then builds an operator node instead.
    pub fn fold(self, left: f32, right: f32) -> Option<f32> {
        let (a, b) = (f64::from(left), f64::from(right));
        let value = match self {
            Self::Addition => a + b,
            Self::Subtraction => a - b,
            Self::Multiplication => a * b,
            Self::FloatDivision => {
                if b == 0.0 {
                    return None;
                }
                a / b
            }
            Self::IntegerDivision => {
                if b == 0.0 {
                    return None;
                }
                (a / b).floor()
            }
            Self::Modulo => {
                if b == 0.0 {
                    return None;
                }
                floored_mod(a, b)
            }
            Self::Power => a.powf(b),
            Self::Minimum => a.min(b),
            Self::Maximum => a.max(b),
            Self::AbsoluteDifference => (a - b).abs(),
            Self::Equal => bool_to_float(a == b),
            Self::NotEqual => bool_to_float(a != b),
            Self::LessThan => bool_to_float(a < b),
            Self::GreaterThan => bool_to_float(a > b),
            Self::LessThanOrEqual => bool_to_float(a <= b),
            Self::GreaterThanOrEqual => bool_to_float(a >= b),
            Self::Atan2 => a.atan2(b),
            Self::Hypot => a.hypot(b),
            Self::Ring1 => a * b + a,
            Self::Ring2 => a * b + a + b,
            Self::Ring3 => a * a * b,
            Self::Ring4 => a * a * b - a * b * b,
            Self::DifferenceOfSquares => a * a - b * b,
            Self::SumOfSquares => a * a + b * b,
            Self::SquareOfSum => (a + b).powi(2),
            Self::SquareOfDifference => (a - b).powi(2),
            Self::Threshold => {
                if a < b {
                    0.0
                } else {
                    a
                }
            }
            _ => return None,
        };
        finite(value)
    }
}

impl UnaryOperator {
    /// Evaluates the operator on a constant.
    ///
    /// Returns `None` when there is no float equivalent or the result is not
    /// finite.
    pub fn fold(self, source: f32) -> Option<f32> {
        let x = f64::from(source);
        let value = match self {
            Self::Negative => -x,
            Self::AbsoluteValue => x.abs(),
            Self::Ceiling => x.ceil(),
            Self::Floor | Self::AsInt => x.floor(),
            Self::FractionalPart => floored_mod(x, 1.0),
            Self::Squared => x * x,
            Self::Cubed => x * x * x,
            Self::SquareRoot => {
                if x < 0.0 {
                    return None;
                }
                x.sqrt()
            }
            Self::Reciprocal => {
                if x == 0.0 {
                    return None;
                }
                1.0 / x
            }
            Self::Log => x.ln(),
            Self::Log2 => x.log2(),
            Self::Log10 => x.log10(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Arcsin => x.asin(),
            Self::Arccos => x.acos(),
            Self::Arctan => x.atan(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Distort => x / (1.0 + x.abs()),
            Self::Silence => 0.0,
            Self::Thru => x,
            _ => return None,
        };
        finite(value)
    }
}
