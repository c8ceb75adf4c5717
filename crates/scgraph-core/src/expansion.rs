//! Generic node construction with multichannel expansion.
//!
//! A vector given for an ordinary input replicates the node once per element
//! of the longest such vector, cycling shorter ones. Unexpanded inputs take a
//! flat vector whole. Nested vectors expand recursively and produce nested
//! results.
//!
//! ```rust
//! use scgraph_core::{CalculationRate, InputDecl, SynthDefBuilder, UGenKind};
//!
//! static SIN_OSC: UGenKind = UGenKind::new("SinOsc")
//!     .inputs(&[InputDecl::new("frequency", 440.0), InputDecl::new("phase", 0.0)])
//!     .rates(&[CalculationRate::Audio, CalculationRate::Control])
//!     .pure();
//!
//! let builder = SynthDefBuilder::new();
//! let _guard = builder.enter();
//! let pair = SIN_OSC.ar().arg("frequency", [440.0, 443.0]).build()?;
//! assert_eq!(pair.len(), 2);
//! assert_eq!(builder.len(), 2);
//! # Ok::<(), scgraph_core::SynthDefError>(())
//! ```

use crate::builder::{NewUGen, add_ugen};
use crate::error::SynthDefError;
use crate::kind::UGenKind;
use crate::operable::{UGenOperable, UGenVector};
use crate::rate::CalculationRate;
use crate::ugen::{InputKey, UGenScalar};

/// Inputs of one node after expansion, or a group of such sets.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expansion {
    Leaf(Vec<(&'static str, UGenOperable)>),
    Branch(Vec<Expansion>),
}

/// Expands `params` over every vector-valued ordinary input.
pub(crate) fn expand_params(
    kind: &UGenKind,
    params: Vec<(&'static str, UGenOperable)>,
) -> Result<Expansion, SynthDefError> {
    let passes_whole = |key: &str, vector: &UGenVector| kind.is_unexpanded(key) && vector.is_flat();

    let mut size = 0;
    for (key, value) in &params {
        if let UGenOperable::Vector(vector) = value {
            if !passes_whole(key, vector) {
                size = size.max(vector.len());
            }
        }
    }
    if size == 0 {
        return Ok(Expansion::Leaf(params));
    }

    let mut branches = Vec::with_capacity(size);
    for i in 0..size {
        let mut reduced = Vec::with_capacity(params.len());
        for (key, value) in &params {
            let value = match value {
                UGenOperable::Vector(vector) if !passes_whole(key, vector) => {
                    if vector.is_empty() {
                        return Err(SynthDefError::MalformedExpansion {
                            ugen: kind.name,
                            key: (*key).to_string(),
                            reason: "empty vector cannot expand",
                        });
                    }
                    vector.as_slice()[i % vector.len()].clone()
                }
                _ => value.clone(),
            };
            reduced.push((*key, value));
        }
        branches.push(expand_params(kind, reduced)?);
    }
    Ok(Expansion::Branch(branches))
}

/// A pending node construction: kind, rate and keyword inputs.
///
/// Created with [`UGenKind::ar`] and friends; [`build`](Self::build)
/// registers the node (or nodes, after expansion) with the active builder.
#[derive(Debug, Clone)]
#[must_use = "nothing is constructed until build() is called"]
pub struct UGenCall {
    kind: &'static UGenKind,
    rate: CalculationRate,
    args: Vec<(&'static str, UGenOperable)>,
    unknown: Option<String>,
    channel_count: Option<usize>,
    special_index: u16,
}

impl UGenKind {
    /// Starts an audio-rate construction.
    pub fn ar(&'static self) -> UGenCall {
        self.call(CalculationRate::Audio)
    }

    /// Starts a control-rate construction.
    pub fn kr(&'static self) -> UGenCall {
        self.call(CalculationRate::Control)
    }

    /// Starts a scalar-rate construction.
    pub fn ir(&'static self) -> UGenCall {
        self.call(CalculationRate::Scalar)
    }

    /// Starts a demand-rate construction.
    pub fn dr(&'static self) -> UGenCall {
        self.call(CalculationRate::Demand)
    }

    /// Starts a construction at `rate`.
    pub fn call(&'static self, rate: CalculationRate) -> UGenCall {
        UGenCall {
            kind: self,
            rate,
            args: Vec::new(),
            unknown: None,
            channel_count: None,
            special_index: 0,
        }
    }
}

impl UGenCall {
    /// Sets a keyword input. Setting a key twice keeps the last value.
    pub fn arg(mut self, key: &str, value: impl Into<UGenOperable>) -> Self {
        match self.kind.input_decl(key) {
            Some(decl) => {
                let value = value.into();
                match self.args.iter_mut().find(|(name, _)| *name == decl.name) {
                    Some(slot) => slot.1 = value,
                    None => self.args.push((decl.name, value)),
                }
            }
            None => {
                self.unknown.get_or_insert_with(|| key.to_string());
            }
        }
        self
    }

    /// Sets the output count of a multichannel kind.
    pub fn channel_count(mut self, channel_count: usize) -> Self {
        self.channel_count = Some(channel_count);
        self
    }

    /// Sets the special index written to the node record.
    pub fn special_index(mut self, special_index: u16) -> Self {
        self.special_index = special_index;
        self
    }

    /// Kind being constructed.
    pub fn kind(&self) -> &'static UGenKind {
        self.kind
    }

    /// Registers the node(s) with the active builder.
    ///
    /// Returns a single output proxy for a single-output node, a vector of
    /// proxies for a multi-output node, and nested vectors when inputs
    /// expanded.
    pub fn build(self) -> Result<UGenOperable, SynthDefError> {
        let kind = self.kind;
        if !kind.supports_rate(self.rate) {
            return Err(SynthDefError::InvalidRate {
                ugen: kind.name,
                rate: self.rate,
            });
        }
        if let Some(key) = self.unknown {
            return Err(SynthDefError::UnknownInput {
                ugen: kind.name,
                key,
            });
        }
        let output_count = match self.channel_count {
            Some(_) if !kind.is_multichannel => {
                return Err(SynthDefError::FixedChannelCount { ugen: kind.name });
            }
            Some(count) => count,
            None => kind.channel_count,
        };

        let mut params = Vec::with_capacity(kind.inputs.len());
        for decl in kind.inputs {
            let value = match self.args.iter().find(|(name, _)| *name == decl.name) {
                Some((_, value)) => value.clone(),
                None => match (decl.default, decl.default_vector) {
                    (Some(default), _) => UGenOperable::constant(default),
                    (None, Some(values)) => UGenOperable::from(values.to_vec()),
                    (None, None) => {
                        return Err(SynthDefError::MissingInput {
                            ugen: kind.name,
                            key: decl.name,
                        });
                    }
                },
            };
            params.push((decl.name, value));
        }

        let template = Template {
            kind,
            rate: self.rate,
            special_index: self.special_index,
            output_count,
        };
        template.instantiate(expand_params(kind, params)?)
    }
}

struct Template {
    kind: &'static UGenKind,
    rate: CalculationRate,
    special_index: u16,
    output_count: usize,
}

impl Template {
    fn instantiate(&self, expansion: Expansion) -> Result<UGenOperable, SynthDefError> {
        match expansion {
            Expansion::Leaf(params) => self.single(params),
            Expansion::Branch(mut branches) if branches.len() == 1 => match branches.pop() {
                Some(branch) => self.instantiate(branch),
                None => Ok(UGenOperable::Vector(UGenVector::default())),
            },
            Expansion::Branch(branches) => branches
                .into_iter()
                .map(|branch| self.instantiate(branch))
                .collect::<Result<UGenVector, _>>()
                .map(UGenOperable::Vector),
        }
    }

    fn single(
        &self,
        params: Vec<(&'static str, UGenOperable)>,
    ) -> Result<UGenOperable, SynthDefError> {
        let mut inputs: Vec<UGenScalar> = Vec::new();
        let mut input_keys = Vec::new();
        for (key, value) in params {
            let unexpanded = self.kind.is_unexpanded(key);
            match value {
                UGenOperable::Scalar(scalar) if unexpanded => {
                    input_keys.push(InputKey::Indexed(key, 0));
                    inputs.push(scalar);
                }
                UGenOperable::Scalar(scalar) => {
                    input_keys.push(InputKey::Named(key));
                    inputs.push(scalar);
                }
                UGenOperable::Vector(vector) if unexpanded && vector.is_flat() => {
                    for (i, scalar) in vector.scalars().into_iter().enumerate() {
                        input_keys.push(InputKey::Indexed(key, i));
                        inputs.push(scalar);
                    }
                }
                UGenOperable::Vector(_) => {
                    return Err(SynthDefError::MalformedExpansion {
                        ugen: self.kind.name,
                        key: key.to_string(),
                        reason: "vector given for a single-valued input",
                    });
                }
            }
        }
        add_ugen(NewUGen {
            kind: self.kind,
            rate: self.rate,
            special_index: self.special_index,
            inputs,
            input_keys,
            output_count: self.output_count,
        })
    }
}
