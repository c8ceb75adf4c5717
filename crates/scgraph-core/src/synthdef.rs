//! The finalized, immutable graph.
//!
//! A [`SynthDef`] owns its nodes in execution order. Node inputs reference
//! producers by position, constants are pooled by first occurrence, and
//! parameters are addressable by name through their absolute control index.

use core::fmt;
use std::collections::HashMap;

use md5::{Digest, Md5};

use crate::codec::{self, same_constant};
use crate::error::{CodecError, SynthDefError};
use crate::operator::{BinaryOperator, UnaryOperator};
use crate::system::{BINARY_OP_UGEN, UNARY_OP_UGEN};
use crate::ugen::{NodeId, Parameter, UGen, UGenScalar};

/// A producer→consumer connection, for read-only graph consumers such as
/// diagram renderers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Producing node.
    pub from: NodeId,
    /// Output channel of the producer.
    pub output: u32,
    /// Consuming node.
    pub to: NodeId,
    /// Input position on the consumer.
    pub input: usize,
}

/// A compiled synthesis graph.
#[derive(Clone, Debug)]
pub struct SynthDef {
    name: Option<String>,
    ugens: Vec<UGen>,
    constants: Vec<f32>,
    parameters: Vec<(Parameter, usize)>,
    anonymous_name: String,
}

impl SynthDef {
    /// Finalizes `order` out of a build arena, renumbering references to
    /// execution positions.
    pub(crate) fn from_graph(
        name: Option<&str>,
        arena: &[UGen],
        order: &[NodeId],
    ) -> Result<Self, SynthDefError> {
        if order.is_empty() {
            return Err(SynthDefError::EmptyGraph);
        }
        let mut positions: Vec<Option<NodeId>> = vec![None; arena.len()];
        for (position, id) in order.iter().enumerate() {
            positions[id.slot()] = Some(NodeId::from_slot(position));
        }

        let mut ugens = Vec::with_capacity(order.len());
        for &id in order {
            let mut ugen = arena[id.slot()].clone();
            let consumer = ugen.kind.name;
            for input in &mut ugen.inputs {
                if let UGenScalar::Output(proxy) = input {
                    proxy.node = positions
                        .get(proxy.node.slot())
                        .copied()
                        .flatten()
                        .ok_or(SynthDefError::DetachedInput { ugen: consumer })?;
                }
            }
            ugens.push(ugen);
        }
        Ok(Self::from_ugens(name.map(str::to_string), ugens)?)
    }

    /// Wraps nodes already in execution order.
    pub(crate) fn from_ugens(name: Option<String>, ugens: Vec<UGen>) -> Result<Self, CodecError> {
        let mut constants: Vec<f32> = Vec::new();
        for ugen in &ugens {
            for value in ugen.inputs.iter().filter_map(UGenScalar::as_constant) {
                if !constants.iter().any(|&c| same_constant(c, value)) {
                    constants.push(value);
                }
            }
        }

        let mut parameters = Vec::new();
        for control in ugens.iter().filter(|ugen| ugen.is_control()) {
            let mut index = usize::from(control.special_index);
            for parameter in control.parameters() {
                parameters.push((parameter.clone(), index));
                index += parameter.len();
            }
        }

        let body = codec::encode_graph(&ugens, &constants, &parameters)?;
        let anonymous_name = Md5::digest(&body).iter().map(|b| format!("{b:02x}")).collect();

        Ok(Self {
            name,
            ugens,
            constants,
            parameters,
            anonymous_name,
        })
    }

    /// Drops the explicit name if it is just the content hash.
    pub(crate) fn without_anonymous_name(mut self) -> Self {
        if self.name.as_deref() == Some(self.anonymous_name.as_str()) {
            self.name = None;
        }
        self
    }

    /// Explicit name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Content-hash name: lowercase hex MD5 of the encoded graph body.
    pub fn anonymous_name(&self) -> &str {
        &self.anonymous_name
    }

    /// The explicit name, falling back to the anonymous name.
    pub fn effective_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.anonymous_name)
    }

    /// Nodes in execution order.
    pub fn ugens(&self) -> &[UGen] {
        &self.ugens
    }

    /// Constant pool, in first-use order.
    pub fn constants(&self) -> &[f32] {
        &self.constants
    }

    /// Control-family nodes, in execution order.
    pub fn controls(&self) -> impl Iterator<Item = &UGen> {
        self.ugens.iter().filter(|ugen| ugen.is_control())
    }

    /// Every parameter with its absolute control index, in control order.
    pub fn parameters(&self) -> &[(Parameter, usize)] {
        &self.parameters
    }

    /// Looks up a parameter and its absolute control index by name.
    pub fn parameter(&self, name: &str) -> Option<(&Parameter, usize)> {
        self.parameters
            .iter()
            .find(|(parameter, _)| parameter.name == name)
            .map(|(parameter, index)| (parameter, *index))
    }

    /// Parameters sorted by absolute control index.
    pub fn indexed_parameters(&self) -> Vec<(usize, &Parameter)> {
        let mut indexed: Vec<(usize, &Parameter)> =
            self.parameters.iter().map(|(p, index)| (*index, p)).collect();
        indexed.sort_by_key(|(index, _)| *index);
        indexed
    }

    /// Whether the graph declares a `gate` parameter.
    pub fn has_gate(&self) -> bool {
        self.parameter("gate").is_some()
    }

    /// Every data edge, ordered by consumer and then input position.
    pub fn edges(&self) -> Vec<Edge> {
        self.ugens
            .iter()
            .enumerate()
            .flat_map(|(to, ugen)| {
                ugen.inputs
                    .iter()
                    .enumerate()
                    .filter_map(move |(input, scalar)| {
                        scalar.as_output().map(|proxy| Edge {
                            from: proxy.node,
                            output: proxy.index,
                            to: NodeId::from_slot(to),
                            input,
                        })
                    })
            })
            .collect()
    }

    /// Encodes this SynthDef alone as an SCgf file.
    pub fn compile(&self) -> Result<Vec<u8>, CodecError> {
        codec::compile_synthdefs(&[self], false)
    }

    fn labels(&self) -> Vec<String> {
        let key = |ugen: &UGen| (ugen.kind.name, ugen.rate, ugen.special_index);
        let mut groups: HashMap<_, usize> = HashMap::new();
        for ugen in &self.ugens {
            *groups.entry(key(ugen)).or_default() += 1;
        }

        let mut seen: HashMap<_, usize> = HashMap::new();
        self.ugens
            .iter()
            .map(|ugen| {
                let mut label = ugen.kind.name.to_string();
                if *ugen.kind == BINARY_OP_UGEN {
                    if let Some(op) = BinaryOperator::from_code(ugen.special_index) {
                        label.push_str(&format!("({op})"));
                    }
                } else if *ugen.kind == UNARY_OP_UGEN {
                    if let Some(op) = UnaryOperator::from_code(ugen.special_index) {
                        label.push_str(&format!("({op})"));
                    }
                }
                label.push('.');
                label.push_str(ugen.rate.token());
                let group = key(ugen);
                if groups.get(&group).copied().unwrap_or(0) > 1 {
                    let index = seen.entry(group).or_default();
                    label.push_str(&format!("/{index}"));
                    *index += 1;
                }
                label
            })
            .collect()
    }
}

/// Names the parameter behind slot `index` of a Control node.
fn control_slot(control: &UGen, index: u32) -> Option<String> {
    let mut start = 0usize;
    let index = index as usize;
    for parameter in control.parameters() {
        if index < start + parameter.len() {
            return Some(if parameter.len() > 1 {
                format!(":{}[{}]", parameter.name, index - start)
            } else {
                format!(":{}", parameter.name)
            });
        }
        start += parameter.len();
    }
    None
}

impl fmt::Display for SynthDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "synthdef:")?;
        writeln!(f, "    name: {}", self.effective_name())?;
        write!(f, "    ugens:")?;

        let labels = self.labels();
        for (ugen, label) in self.ugens.iter().zip(&labels) {
            let mut lines: Vec<(String, String)> = Vec::new();
            for parameter in ugen.parameters() {
                if let [value] = parameter.value.as_slice() {
                    lines.push((parameter.name.clone(), format!("{value:?}")));
                } else {
                    for (i, value) in parameter.value.iter().enumerate() {
                        lines.push((format!("{}[{i}]", parameter.name), format!("{value:?}")));
                    }
                }
            }
            for (key, input) in ugen.input_keys.iter().zip(&ugen.inputs) {
                let value = match input {
                    UGenScalar::Constant(value) => format!("{value:?}"),
                    UGenScalar::Output(proxy) => {
                        let producer = &self.ugens[proxy.node.slot()];
                        let slot = control_slot(producer, proxy.index).unwrap_or_default();
                        format!("{}[{}{slot}]", labels[proxy.node.slot()], proxy.index)
                    }
                };
                lines.push((key.to_string(), value));
            }

            if lines.is_empty() {
                write!(f, "\n    -   {label}: null")?;
            } else {
                write!(f, "\n    -   {label}:")?;
                for (key, value) in lines {
                    write!(f, "\n            {key}: {value}")?;
                }
            }
        }
        Ok(())
    }
}
