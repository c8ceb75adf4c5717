//! Arithmetic on graph values.
//!
//! Every operator broadcasts over vectors (shorter operands cycle) and then
//! simplifies each scalar pairing before anything is registered: identities
//! such as `x * 1` and `x + 0` return an operand, `x * 0` is zero, and an
//! operator over two constants folds on the host. Only what is left becomes a
//! `BinaryOpUGen` or `UnaryOpUGen`.
//!
//! ```rust
//! use scgraph_core::UGenOperable;
//!
//! let folded = UGenOperable::constant(3.0).mul(4.0)?;
//! assert_eq!(folded.as_constant(), Some(12.0));
//!
//! let spread = UGenOperable::from([1.0, 2.0]).add([10.0, 20.0, 30.0])?;
//! let values: Vec<_> = spread.scalars().iter().filter_map(|s| s.as_constant()).collect();
//! assert_eq!(values, [11.0, 22.0, 31.0]);
//! # Ok::<(), scgraph_core::SynthDefError>(())
//! ```

use crate::builder::{NewUGen, add_scalar_ugen};
use crate::error::SynthDefError;
use crate::kind::UGenKind;
use crate::operable::{UGenOperable, UGenVector};
use crate::operator::{BinaryOperator, UnaryOperator};
use crate::rate::CalculationRate;
use crate::system::{BINARY_OP_UGEN, SUM3, SUM4, UNARY_OP_UGEN};
use crate::ugen::{InputKey, UGenScalar};

impl UGenOperable {
    /// `self + rhs`.
    pub fn add(&self, rhs: impl Into<UGenOperable>) -> Result<UGenOperable, SynthDefError> {
        self.binary_op(BinaryOperator::Addition, rhs)
    }

    /// `self - rhs`.
    pub fn sub(&self, rhs: impl Into<UGenOperable>) -> Result<UGenOperable, SynthDefError> {
        self.binary_op(BinaryOperator::Subtraction, rhs)
    }

    /// `self * rhs`.
    pub fn mul(&self, rhs: impl Into<UGenOperable>) -> Result<UGenOperable, SynthDefError> {
        self.binary_op(BinaryOperator::Multiplication, rhs)
    }

    /// Float division `self / rhs`.
    pub fn div(&self, rhs: impl Into<UGenOperable>) -> Result<UGenOperable, SynthDefError> {
        self.binary_op(BinaryOperator::FloatDivision, rhs)
    }

    /// `-self`.
    pub fn neg(&self) -> Result<UGenOperable, SynthDefError> {
        self.unary_op(UnaryOperator::Negative)
    }

    /// Applies any binary operator, broadcasting over vectors.
    pub fn binary_op(
        &self,
        operator: BinaryOperator,
        rhs: impl Into<UGenOperable>,
    ) -> Result<UGenOperable, SynthDefError> {
        let rhs = rhs.into();
        broadcast(self, &rhs, &mut |left, right| {
            binary_scalar(operator, left, right).map(UGenOperable::Scalar)
        })
    }

    /// Applies any unary operator to every scalar.
    pub fn unary_op(&self, operator: UnaryOperator) -> Result<UGenOperable, SynthDefError> {
        match self {
            Self::Scalar(source) => unary_scalar(operator, *source).map(Self::Scalar),
            Self::Vector(vector) => vector
                .iter()
                .map(|value| value.unary_op(operator))
                .collect::<Result<UGenVector, _>>()
                .map(Self::Vector),
        }
    }

    /// Sums every scalar into one value using `Sum4`, `Sum3` and additions.
    ///
    /// Summing nothing yields the constant `0.0`.
    pub fn sum(&self) -> Result<UGenOperable, SynthDefError> {
        sum_scalars(self.scalars()).map(Self::Scalar)
    }

    /// Mixes down to a single channel. Same as [`sum`](Self::sum).
    pub fn mix(&self) -> Result<UGenOperable, SynthDefError> {
        self.sum()
    }

    /// Mixes down to `channel_count` channels.
    ///
    /// The flattened scalars are split into groups of `channel_count` and
    /// each column is summed. Columns stop at the shortest group.
    pub fn mix_channels(&self, channel_count: usize) -> Result<UGenOperable, SynthDefError> {
        if channel_count <= 1 {
            return self.sum();
        }
        let scalars = self.scalars();
        let groups: Vec<&[UGenScalar]> = scalars.chunks(channel_count).collect();
        let columns = groups.iter().map(|group| group.len()).min().unwrap_or(0);
        (0..columns)
            .map(|column| {
                let values = groups.iter().map(|group| group[column]).collect();
                sum_scalars(values).map(Self::Scalar)
            })
            .collect::<Result<UGenVector, _>>()
            .map(Self::Vector)
    }
}

fn broadcast<F>(
    left: &UGenOperable,
    right: &UGenOperable,
    apply: &mut F,
) -> Result<UGenOperable, SynthDefError>
where
    F: FnMut(UGenScalar, UGenScalar) -> Result<UGenOperable, SynthDefError>,
{
    if let (UGenOperable::Scalar(a), UGenOperable::Scalar(b)) = (left, right) {
        return apply(*a, *b);
    }
    if left.is_empty() || right.is_empty() {
        return Ok(UGenOperable::Vector(UGenVector::default()));
    }
    let size = left.len().max(right.len());
    (0..size)
        .map(|i| broadcast(cycle(left, i), cycle(right, i), apply))
        .collect::<Result<UGenVector, _>>()
        .map(UGenOperable::Vector)
}

fn cycle(value: &UGenOperable, index: usize) -> &UGenOperable {
    match value {
        UGenOperable::Scalar(_) => value,
        UGenOperable::Vector(vector) => &vector.as_slice()[index % vector.len()],
    }
}

pub(crate) fn binary_scalar(
    operator: BinaryOperator,
    left: UGenScalar,
    right: UGenScalar,
) -> Result<UGenScalar, SynthDefError> {
    if let (Some(a), Some(b)) = (left.as_constant(), right.as_constant()) {
        if let Some(value) = operator.fold(a, b) {
            return Ok(UGenScalar::Constant(value));
        }
    }
    match operator {
        BinaryOperator::Multiplication => {
            if left.is_constant(0.0) || right.is_constant(0.0) {
                return Ok(UGenScalar::Constant(0.0));
            }
            if left.is_constant(1.0) {
                return Ok(right);
            }
            if left.is_constant(-1.0) {
                return unary_scalar(UnaryOperator::Negative, right);
            }
            if right.is_constant(1.0) {
                return Ok(left);
            }
            if right.is_constant(-1.0) {
                return unary_scalar(UnaryOperator::Negative, left);
            }
        }
        BinaryOperator::Addition => {
            if left.is_constant(0.0) {
                return Ok(right);
            }
            if right.is_constant(0.0) {
                return Ok(left);
            }
        }
        BinaryOperator::Subtraction => {
            if left.is_constant(0.0) {
                return unary_scalar(UnaryOperator::Negative, right);
            }
            if right.is_constant(0.0) {
                return Ok(left);
            }
        }
        BinaryOperator::FloatDivision => {
            if right.is_constant(1.0) {
                return Ok(left);
            }
            if right.is_constant(-1.0) {
                return unary_scalar(UnaryOperator::Negative, left);
            }
        }
        _ => {}
    }
    add_scalar_ugen(NewUGen {
        kind: &BINARY_OP_UGEN,
        rate: left.calculation_rate().max(right.calculation_rate()),
        special_index: operator.code(),
        inputs: vec![left, right],
        input_keys: vec![InputKey::Named("left"), InputKey::Named("right")],
        output_count: 1,
    })
}

fn unary_scalar(
    operator: UnaryOperator,
    source: UGenScalar,
) -> Result<UGenScalar, SynthDefError> {
    if let Some(value) = source.as_constant().and_then(|x| operator.fold(x)) {
        return Ok(UGenScalar::Constant(value));
    }
    add_scalar_ugen(NewUGen {
        kind: &UNARY_OP_UGEN,
        rate: source.calculation_rate(),
        special_index: operator.code(),
        inputs: vec![source],
        input_keys: vec![InputKey::Named("source")],
        output_count: 1,
    })
}

fn sum_scalars(mut values: Vec<UGenScalar>) -> Result<UGenScalar, SynthDefError> {
    while values.len() > 1 {
        values = values
            .chunks(4)
            .map(|chunk| match *chunk {
                [a, b, c, d] => sum4(a, b, c, d),
                [a, b, c] => sum3(a, b, c),
                [a, b] => binary_scalar(BinaryOperator::Addition, a, b),
                _ => Ok(chunk[0]),
            })
            .collect::<Result<_, _>>()?;
    }
    Ok(values.first().copied().unwrap_or(UGenScalar::Constant(0.0)))
}

/// Three-way sum; a zero input falls back to a plain addition.
pub(crate) fn sum3(
    a: UGenScalar,
    b: UGenScalar,
    c: UGenScalar,
) -> Result<UGenScalar, SynthDefError> {
    if c.is_constant(0.0) {
        binary_scalar(BinaryOperator::Addition, a, b)
    } else if b.is_constant(0.0) {
        binary_scalar(BinaryOperator::Addition, a, c)
    } else if a.is_constant(0.0) {
        binary_scalar(BinaryOperator::Addition, b, c)
    } else {
        sum_node(&SUM3, vec![a, b, c])
    }
}

/// Four-way sum; a zero input falls back to [`sum3`].
pub(crate) fn sum4(
    a: UGenScalar,
    b: UGenScalar,
    c: UGenScalar,
    d: UGenScalar,
) -> Result<UGenScalar, SynthDefError> {
    if a.is_constant(0.0) {
        sum3(b, c, d)
    } else if b.is_constant(0.0) {
        sum3(a, c, d)
    } else if c.is_constant(0.0) {
        sum3(a, b, d)
    } else if d.is_constant(0.0) {
        sum3(a, b, c)
    } else {
        sum_node(&SUM4, vec![a, b, c, d])
    }
}

/// Inputs go fastest rate first; the node runs at that rate.
fn sum_node(
    kind: &'static UGenKind,
    mut inputs: Vec<UGenScalar>,
) -> Result<UGenScalar, SynthDefError> {
    inputs.sort_by(|x, y| y.calculation_rate().cmp(&x.calculation_rate()));
    let rate = inputs
        .first()
        .map(UGenScalar::calculation_rate)
        .unwrap_or(CalculationRate::Scalar);
    add_scalar_ugen(NewUGen {
        kind,
        rate,
        special_index: 0,
        input_keys: kind.input_names().map(InputKey::Named).collect(),
        inputs,
        output_count: 1,
    })
}
