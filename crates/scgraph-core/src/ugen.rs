//! Graph nodes and the references between them.
//!
//! Nodes live in an arena owned by a builder (or, once finalized, by a
//! [`SynthDef`](crate::SynthDef)). They refer to each other through
//! [`OutputProxy`] values that carry the producing node's [`NodeId`] and the
//! [`ScopeId`] of the arena it belongs to. A proxy never owns its node.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::kind::UGenKind;
use crate::operable::UGenOperable;
use crate::rate::{CalculationRate, ParameterRate};

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

/// Identity of a builder scope.
///
/// Every node records the scope it was constructed in; inputs from another
/// scope are rejected at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) u64);

impl ScopeId {
    /// Allocates a scope identity never handed out before in this process.
    pub(crate) fn next() -> Self {
        Self(NEXT_SCOPE.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

/// Index of a node within its arena.
///
/// Inside a builder this is the construction index. Inside a finalized
/// `SynthDef` it is the node's position in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_slot(slot: usize) -> Self {
        Self(slot as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Reference to one output channel of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputProxy {
    pub(crate) scope: ScopeId,
    pub(crate) node: NodeId,
    pub(crate) index: u32,
    pub(crate) rate: CalculationRate,
}

impl OutputProxy {
    /// The producing node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Output channel of the producing node.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Scope the producing node belongs to.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Calculation rate of the producing node.
    pub fn calculation_rate(&self) -> CalculationRate {
        self.rate
    }
}

/// A single node input: a literal constant or one node output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UGenScalar {
    /// A literal float (the constant proxy).
    Constant(f32),
    /// One output of another node.
    Output(OutputProxy),
}

impl UGenScalar {
    /// Calculation rate; constants count as scalar rate.
    pub fn calculation_rate(&self) -> CalculationRate {
        match self {
            Self::Constant(_) => CalculationRate::Scalar,
            Self::Output(proxy) => proxy.rate,
        }
    }

    /// The constant value, if this is a constant.
    pub fn as_constant(&self) -> Option<f32> {
        match self {
            Self::Constant(value) => Some(*value),
            Self::Output(_) => None,
        }
    }

    /// The output reference, if this is a node output.
    pub fn as_output(&self) -> Option<&OutputProxy> {
        match self {
            Self::Constant(_) => None,
            Self::Output(proxy) => Some(proxy),
        }
    }

    /// Whether this is exactly the constant `value`.
    pub(crate) fn is_constant(&self, value: f32) -> bool {
        self.as_constant() == Some(value)
    }
}

/// Name under which an input was supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKey {
    /// A plain input.
    Named(&'static str),
    /// Element `n` of an unexpanded (variadic) input.
    Indexed(&'static str, usize),
    /// An input beyond the kind's declarations, found while decoding.
    Extra(usize),
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Indexed(name, index) => write!(f, "{name}[{index}]"),
            Self::Extra(index) => write!(f, "input[{index}]"),
        }
    }
}

/// A named, declared input of a whole graph.
///
/// The length of `value` is the parameter's channel width.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    /// Parameter name, unique within one graph.
    pub name: String,
    /// Initial value per channel.
    pub value: Vec<f32>,
    /// Rate class; decides which Control node packs the parameter.
    pub rate: ParameterRate,
    /// Lag time for control-rate parameters.
    pub lag: Option<f32>,
}

impl Parameter {
    /// A single-channel control-rate parameter.
    pub fn new(name: impl Into<String>, value: f32) -> Self {
        Self::vector(name, vec![value])
    }

    /// A multichannel control-rate parameter.
    pub fn vector(name: impl Into<String>, value: impl Into<Vec<f32>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            rate: ParameterRate::Control,
            lag: None,
        }
    }

    /// Sets the rate class.
    pub fn with_rate(mut self, rate: ParameterRate) -> Self {
        self.rate = rate;
        self
    }

    /// Sets the lag time.
    pub fn with_lag(mut self, lag: f32) -> Self {
        self.lag = Some(lag);
        self
    }

    /// Channel width.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether the parameter has no channels.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Whether the parameter carries a non-zero lag.
    pub(crate) fn has_lag(&self) -> bool {
        self.lag.is_some_and(|lag| lag != 0.0)
    }
}

/// Extra data carried by parameter and Control-family nodes.
#[derive(Clone, Debug, PartialEq, Default)]
pub(crate) enum Payload {
    #[default]
    None,
    /// A declared parameter, replaced by a Control slot at build time.
    Parameter(Parameter),
    /// The parameters packed by a Control-family node, in slot order.
    Control(Vec<Parameter>),
}

/// One node of a synthesis graph.
#[derive(Clone, Debug)]
pub struct UGen {
    pub(crate) kind: &'static UGenKind,
    pub(crate) rate: CalculationRate,
    pub(crate) special_index: u16,
    pub(crate) inputs: Vec<UGenScalar>,
    pub(crate) input_keys: Vec<InputKey>,
    pub(crate) output_count: usize,
    pub(crate) scope: ScopeId,
    pub(crate) payload: Payload,
}

impl UGen {
    /// The node's kind.
    pub fn kind(&self) -> &'static UGenKind {
        self.kind
    }

    /// Type name, as written to the wire format.
    pub fn name(&self) -> &'static str {
        self.kind.name
    }

    /// Calculation rate.
    pub fn calculation_rate(&self) -> CalculationRate {
        self.rate
    }

    /// Special index: operator code, Control offset, or 0.
    pub fn special_index(&self) -> u16 {
        self.special_index
    }

    /// Flattened inputs, in wire order.
    pub fn inputs(&self) -> &[UGenScalar] {
        &self.inputs
    }

    /// Keys naming each input, parallel to [`inputs`](Self::inputs).
    pub fn input_keys(&self) -> &[InputKey] {
        &self.input_keys
    }

    /// Looks up a plain input by name.
    pub fn input(&self, name: &str) -> Option<&UGenScalar> {
        self.input_keys
            .iter()
            .position(|key| matches!(key, InputKey::Named(n) if *n == name))
            .map(|i| &self.inputs[i])
    }

    /// Number of outputs.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Scope the node belongs to.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Whether the node is side-effect free.
    pub fn is_pure(&self) -> bool {
        self.kind.is_pure
    }

    /// Whether the node is a width-first scheduling barrier.
    pub fn is_width_first(&self) -> bool {
        self.kind.is_width_first
    }

    /// Whether the node sets a done flag.
    pub fn has_done_flag(&self) -> bool {
        self.kind.has_done_flag
    }

    /// The declared parameter, for parameter placeholder nodes.
    pub fn parameter(&self) -> Option<&Parameter> {
        match &self.payload {
            Payload::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    /// Packed parameters, for Control-family nodes. Empty otherwise.
    pub fn parameters(&self) -> &[Parameter] {
        match &self.payload {
            Payload::Control(parameters) => parameters,
            _ => &[],
        }
    }

    /// Whether this is a Control-family node.
    pub fn is_control(&self) -> bool {
        matches!(self.payload, Payload::Control(_))
    }

    /// Output proxies referencing each output channel.
    pub(crate) fn proxies(&self, node: NodeId) -> impl Iterator<Item = OutputProxy> + '_ {
        (0..self.output_count as u32).map(move |index| OutputProxy {
            scope: self.scope,
            node,
            index,
            rate: self.rate,
        })
    }

    /// The value a constructor hands back: a bare proxy for single-output
    /// nodes, a vector otherwise (empty for output-only nodes).
    pub(crate) fn outputs(&self, node: NodeId) -> UGenOperable {
        let mut proxies: Vec<UGenOperable> = self.proxies(node).map(UGenOperable::from).collect();
        if proxies.len() == 1 {
            return proxies.remove(0);
        }
        UGenOperable::Vector(proxies.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_scalar_is_scalar_rate() {
        assert_eq!(
            UGenScalar::Constant(1.0).calculation_rate(),
            CalculationRate::Scalar
        );
        assert!(UGenScalar::Constant(0.0).is_constant(0.0));
        assert!(!UGenScalar::Constant(1.0).is_constant(0.0));
    }

    #[test]
    fn test_output_scalar_reports_producer_rate() {
        let proxy = OutputProxy {
            scope: ScopeId(7),
            node: NodeId(3),
            index: 1,
            rate: CalculationRate::Audio,
        };
        let scalar = UGenScalar::Output(proxy);
        assert_eq!(scalar.calculation_rate(), CalculationRate::Audio);
        assert_eq!(scalar.as_output().map(OutputProxy::index), Some(1));
        assert!(scalar.as_constant().is_none());
    }

    #[test]
    fn test_scopes_are_distinct() {
        let a = ScopeId::next();
        let b = ScopeId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_input_key_display() {
        assert_eq!(InputKey::Named("frequency").to_string(), "frequency");
        assert_eq!(InputKey::Indexed("source", 1).to_string(), "source[1]");
        assert_eq!(InputKey::Extra(4).to_string(), "input[4]");
    }

    #[test]
    fn test_parameter_builder() {
        let parameter = Parameter::vector("freqs", [300.0, 400.0])
            .with_rate(ParameterRate::Audio)
            .with_lag(0.5);
        assert_eq!(parameter.len(), 2);
        assert_eq!(parameter.rate, ParameterRate::Audio);
        assert!(parameter.has_lag());
        assert!(!Parameter::new("amp", 0.1).with_lag(0.0).has_lag());
    }
}
