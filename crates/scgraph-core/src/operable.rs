//! Values that can feed node inputs.
//!
//! [`UGenOperable`] is the tagged `Scalar | Vector` shape used throughout
//! graph construction. Vectors may nest; multichannel expansion walks them and
//! [`UGenVector::flatten`] collapses them.

use crate::rate::CalculationRate;
use crate::ugen::{OutputProxy, UGenScalar};

/// A scalar input or a (possibly nested) vector of inputs.
#[derive(Clone, Debug, PartialEq)]
pub enum UGenOperable {
    /// One constant or node output.
    Scalar(UGenScalar),
    /// An ordered group of operables.
    Vector(UGenVector),
}

/// Ordered, possibly nested group of operables.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct UGenVector(Vec<UGenOperable>);

impl UGenVector {
    /// Wraps a list of operables.
    pub fn new(values: Vec<UGenOperable>) -> Self {
        Self(values)
    }

    /// Number of top-level elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&UGenOperable> {
        self.0.get(index)
    }

    /// Iterates over top-level elements.
    pub fn iter(&self) -> std::slice::Iter<'_, UGenOperable> {
        self.0.iter()
    }

    /// Top-level elements as a slice.
    pub fn as_slice(&self) -> &[UGenOperable] {
        &self.0
    }

    /// Whether every top-level element is a scalar.
    pub fn is_flat(&self) -> bool {
        self.0
            .iter()
            .all(|value| matches!(value, UGenOperable::Scalar(_)))
    }

    /// All scalars in depth-first order.
    pub fn scalars(&self) -> Vec<UGenScalar> {
        let mut scalars = Vec::new();
        collect_scalars(&self.0, &mut scalars);
        scalars
    }

    /// Recursively flattens into scalars. A single scalar collapses.
    pub fn flatten(&self) -> UGenOperable {
        let mut scalars = self.scalars();
        if scalars.len() == 1 {
            return UGenOperable::Scalar(scalars.remove(0));
        }
        UGenOperable::Vector(scalars.into_iter().map(UGenOperable::Scalar).collect())
    }
}

fn collect_scalars(values: &[UGenOperable], out: &mut Vec<UGenScalar>) {
    for value in values {
        match value {
            UGenOperable::Scalar(scalar) => out.push(*scalar),
            UGenOperable::Vector(vector) => collect_scalars(&vector.0, out),
        }
    }
}

impl UGenOperable {
    /// A constant.
    pub fn constant(value: f32) -> Self {
        Self::Scalar(UGenScalar::Constant(value))
    }

    /// Fastest calculation rate among all contained scalars.
    pub fn calculation_rate(&self) -> CalculationRate {
        match self {
            Self::Scalar(scalar) => scalar.calculation_rate(),
            Self::Vector(vector) => vector
                .iter()
                .map(Self::calculation_rate)
                .max()
                .unwrap_or(CalculationRate::Scalar),
        }
    }

    /// The scalar, if this is one.
    pub fn as_scalar(&self) -> Option<&UGenScalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            Self::Vector(_) => None,
        }
    }

    /// The constant value, if this is a constant scalar.
    pub fn as_constant(&self) -> Option<f32> {
        self.as_scalar().and_then(UGenScalar::as_constant)
    }

    /// The output reference, if this is a node-output scalar.
    pub fn as_output(&self) -> Option<&OutputProxy> {
        self.as_scalar().and_then(UGenScalar::as_output)
    }

    /// The vector, if this is one.
    pub fn as_vector(&self) -> Option<&UGenVector> {
        match self {
            Self::Scalar(_) => None,
            Self::Vector(vector) => Some(vector),
        }
    }

    /// Number of top-level channels; a scalar counts as one.
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Vector(vector) => vector.len(),
        }
    }

    /// Whether this is an empty vector.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channel `index`; a scalar only has channel 0.
    pub fn get(&self, index: usize) -> Option<&UGenOperable> {
        match self {
            Self::Scalar(_) => (index == 0).then_some(self),
            Self::Vector(vector) => vector.get(index),
        }
    }

    /// Recursively flattens into scalars. A scalar returns itself.
    pub fn flatten(&self) -> UGenOperable {
        match self {
            Self::Scalar(_) => self.clone(),
            Self::Vector(vector) => vector.flatten(),
        }
    }

    /// All scalars in depth-first order.
    pub fn scalars(&self) -> Vec<UGenScalar> {
        match self {
            Self::Scalar(scalar) => vec![*scalar],
            Self::Vector(vector) => vector.scalars(),
        }
    }
}

/// Values that serialize themselves into a flat vector of inputs, such as
/// envelope descriptors.
pub trait UGenSerializable {
    /// Serializes into a vector of operables.
    fn serialize(&self) -> UGenVector;
}

impl FromIterator<UGenOperable> for UGenVector {
    fn from_iter<I: IntoIterator<Item = UGenOperable>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for UGenVector {
    type Item = UGenOperable;
    type IntoIter = std::vec::IntoIter<UGenOperable>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a UGenVector {
    type Item = &'a UGenOperable;
    type IntoIter = std::slice::Iter<'a, UGenOperable>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<f32> for UGenOperable {
    fn from(value: f32) -> Self {
        Self::constant(value)
    }
}

impl From<f64> for UGenOperable {
    fn from(value: f64) -> Self {
        Self::constant(value as f32)
    }
}

impl From<i32> for UGenOperable {
    fn from(value: i32) -> Self {
        Self::constant(value as f32)
    }
}

impl From<UGenScalar> for UGenOperable {
    fn from(value: UGenScalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<OutputProxy> for UGenOperable {
    fn from(value: OutputProxy) -> Self {
        Self::Scalar(UGenScalar::Output(value))
    }
}

impl From<UGenVector> for UGenOperable {
    fn from(value: UGenVector) -> Self {
        Self::Vector(value)
    }
}

impl From<&UGenOperable> for UGenOperable {
    fn from(value: &UGenOperable) -> Self {
        value.clone()
    }
}

impl<T: Into<UGenOperable>> From<Vec<T>> for UGenOperable {
    fn from(values: Vec<T>) -> Self {
        Self::Vector(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<UGenOperable>, const N: usize> From<[T; N]> for UGenOperable {
    fn from(values: [T; N]) -> Self {
        Self::Vector(values.into_iter().map(Into::into).collect())
    }
}
