//! Graph accumulation and the active-builder stack.
//!
//! Builders form a per-thread LIFO stack. Entering a builder returns a
//! [`BuilderGuard`]; while the guard lives, every node constructed on this
//! thread registers with that builder. Dropping the guard pops it again.
//!
//! ```rust
//! use scgraph_core::{Parameter, SynthDefBuilder};
//!
//! let builder = SynthDefBuilder::new();
//! let amplitude = builder.add_parameter(Parameter::new("amplitude", 0.5))?;
//! {
//!     let _guard = builder.enter();
//!     let _scaled = amplitude.mul(2.0)?;
//! }
//! let synthdef = builder.build(Some("scaled"), false)?;
//! assert_eq!(synthdef.ugens().len(), 2);
//! # Ok::<(), scgraph_core::SynthDefError>(())
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Index;
use std::rc::Rc;

use crate::error::SynthDefError;
use crate::graph::Snapshot;
use crate::kind::UGenKind;
use crate::operable::UGenOperable;
use crate::rate::{CalculationRate, ParameterRate};
use crate::sort;
use crate::synthdef::SynthDef;
use crate::system::PARAMETER;
use crate::ugen::{InputKey, NodeId, OutputProxy, Parameter, Payload, ScopeId, UGen, UGenScalar};

type SharedState = Rc<RefCell<BuilderState>>;

thread_local! {
    static ACTIVE_BUILDERS: RefCell<Vec<(ScopeId, SharedState)>> =
        const { RefCell::new(Vec::new()) };
}

/// A node about to be registered with the active builder.
pub(crate) struct NewUGen {
    pub(crate) kind: &'static UGenKind,
    pub(crate) rate: CalculationRate,
    pub(crate) special_index: u16,
    pub(crate) inputs: Vec<UGenScalar>,
    pub(crate) input_keys: Vec<InputKey>,
    pub(crate) output_count: usize,
}

pub(crate) struct BuilderState {
    scope: ScopeId,
    ugens: Vec<UGen>,
}

impl BuilderState {
    fn push(&mut self, node: NewUGen, payload: Payload) -> Result<NodeId, SynthDefError> {
        for input in &node.inputs {
            if let UGenScalar::Output(proxy) = input {
                if proxy.scope != self.scope {
                    return Err(SynthDefError::ScopeViolation {
                        expected: self.scope,
                        found: proxy.scope,
                    });
                }
            }
        }
        let id = NodeId::from_slot(self.ugens.len());
        let ugen = UGen {
            kind: node.kind,
            rate: node.rate,
            special_index: node.special_index,
            inputs: node.inputs,
            input_keys: node.input_keys,
            output_count: node.output_count,
            scope: self.scope,
            payload,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "add_ugen: {} {}.{} ({} inputs, {} outputs)",
            self.scope,
            ugen.kind.name,
            ugen.rate.token(),
            ugen.inputs.len(),
            ugen.output_count
        );

        self.ugens.push(ugen);
        Ok(id)
    }

    fn outputs(&self, id: NodeId) -> UGenOperable {
        self.ugens[id.slot()].outputs(id)
    }
}

fn with_active_builder<R>(
    node: NewUGen,
    register: impl FnOnce(&mut BuilderState, NewUGen) -> Result<R, SynthDefError>,
) -> Result<R, SynthDefError> {
    let state = ACTIVE_BUILDERS
        .with(|stack| stack.borrow().last().map(|(_, state)| Rc::clone(state)))
        .ok_or_else(|| SynthDefError::NoActiveBuilder(node.kind.name.to_string()))?;
    let mut state = state.borrow_mut();
    register(&mut state, node)
}

/// Registers a node with the builder on top of this thread's stack.
pub(crate) fn add_ugen(node: NewUGen) -> Result<UGenOperable, SynthDefError> {
    with_active_builder(node, |state, node| {
        let id = state.push(node, Payload::None)?;
        Ok(state.outputs(id))
    })
}

/// Registers a node and returns a reference to its first output.
pub(crate) fn add_scalar_ugen(node: NewUGen) -> Result<UGenScalar, SynthDefError> {
    with_active_builder(node, |state, node| {
        let id = state.push(node, Payload::None)?;
        Ok(UGenScalar::Output(OutputProxy {
            scope: state.scope,
            node: id,
            index: 0,
            rate: state.ugens[id.slot()].rate,
        }))
    })
}

/// Scope of the builder on top of this thread's stack, if any.
pub fn active_scope() -> Option<ScopeId> {
    ACTIVE_BUILDERS.with(|stack| stack.borrow().last().map(|(scope, _)| *scope))
}

/// Accumulates nodes and parameters for one graph.
///
/// A builder is tied to the thread that created it. Its nodes can only be
/// referenced by other nodes of the same builder.
pub struct SynthDefBuilder {
    scope: ScopeId,
    state: SharedState,
}

impl SynthDefBuilder {
    /// Creates an empty builder with a fresh scope.
    pub fn new() -> Self {
        let scope = ScopeId::next();
        Self {
            scope,
            state: Rc::new(RefCell::new(BuilderState {
                scope,
                ugens: Vec::new(),
            })),
        }
    }

    /// This builder's scope identity.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Makes this builder the active one until the guard is dropped.
    pub fn enter(&self) -> BuilderGuard<'_> {
        ACTIVE_BUILDERS.with(|stack| {
            stack.borrow_mut().push((self.scope, Rc::clone(&self.state)));
        });

        #[cfg(feature = "tracing")]
        tracing::debug!("builder_enter: {}", self.scope);

        BuilderGuard { builder: self }
    }

    /// Declares a graph parameter and returns its outputs.
    ///
    /// Names must be unique within the builder. A single-channel parameter
    /// yields a scalar, a wider one a vector.
    pub fn add_parameter(&self, parameter: Parameter) -> Result<UGenOperable, SynthDefError> {
        if parameter.name.is_empty() {
            return Err(SynthDefError::InvalidParameter {
                name: parameter.name,
                reason: "name is empty",
            });
        }
        if parameter.is_empty() {
            return Err(SynthDefError::InvalidParameter {
                name: parameter.name,
                reason: "value has no channels",
            });
        }
        if parameter.lag.is_some_and(|lag| !lag.is_finite() || lag < 0.0) {
            return Err(SynthDefError::InvalidParameter {
                name: parameter.name,
                reason: "lag must be finite and non-negative",
            });
        }
        if parameter.lag.is_some() && parameter.rate != ParameterRate::Control {
            return Err(SynthDefError::InvalidParameter {
                name: parameter.name,
                reason: "lag requires a control-rate parameter",
            });
        }
        let mut state = self.state.borrow_mut();
        if state
            .ugens
            .iter()
            .filter_map(UGen::parameter)
            .any(|existing| existing.name == parameter.name)
        {
            return Err(SynthDefError::DuplicateParameter(parameter.name));
        }
        let node = NewUGen {
            kind: &PARAMETER,
            rate: parameter.rate.calculation_rate(),
            special_index: 0,
            inputs: Vec::new(),
            input_keys: Vec::new(),
            output_count: parameter.len(),
        };
        let id = state.push(node, Payload::Parameter(parameter))?;
        Ok(state.outputs(id))
    }

    /// Outputs of a previously declared parameter.
    pub fn parameter(&self, name: &str) -> Option<UGenOperable> {
        let state = self.state.borrow();
        state.ugens.iter().enumerate().find_map(|(slot, ugen)| {
            ugen.parameter()
                .filter(|parameter| parameter.name == name)
                .map(|_| ugen.outputs(NodeId::from_slot(slot)))
        })
    }

    /// Number of nodes registered so far, parameters included.
    pub fn len(&self) -> usize {
        self.state.borrow().ugens.len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned copy of the accumulated nodes.
    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.scope, self.state.borrow().ugens.clone())
    }

    /// Finalizes the accumulated graph.
    ///
    /// Works on a snapshot, so the builder can keep growing and be built
    /// again. Parameters become Control nodes, FFT chains and local buffers
    /// are fixed up, nodes are sorted, and with `optimize` unused pure nodes
    /// are dropped.
    pub fn build(&self, name: Option<&str>, optimize: bool) -> Result<SynthDef, SynthDefError> {
        let mut graph = self.snapshot();
        graph.materialize_controls()?;
        graph.cleanup_pv_chains()?;
        graph.cleanup_local_bufs();

        let mut order = sort::sort_topologically(&graph.arena, &graph.order)?;
        if optimize {
            order = sort::optimize(&graph.arena, &order);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "build: {} -> {} ugens (optimize={})",
            name.unwrap_or("<anonymous>"),
            order.len(),
            optimize
        );

        SynthDef::from_graph(name, &graph.arena, &order)
    }
}

impl Default for SynthDefBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a builder active. Dropping it removes that builder from the stack.
#[must_use = "the builder is only active while the guard is alive"]
pub struct BuilderGuard<'a> {
    builder: &'a SynthDefBuilder,
}

impl BuilderGuard<'_> {
    /// The builder this guard keeps active.
    pub fn builder(&self) -> &SynthDefBuilder {
        self.builder
    }
}

impl Drop for BuilderGuard<'_> {
    fn drop(&mut self) {
        let scope = self.builder.scope;
        ACTIVE_BUILDERS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(position) = stack.iter().rposition(|(entry, _)| *entry == scope) {
                stack.remove(position);
            }
        });

        #[cfg(feature = "tracing")]
        tracing::debug!("builder_exit: {}", scope);
    }
}

/// A parameter of a function-style graph, see [`synthdef`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDecl {
    /// Parameter name.
    pub name: &'static str,
    /// Initial value per channel.
    pub value: &'static [f32],
    /// Rate class.
    pub rate: ParameterRate,
    /// Optional lag time.
    pub lag: Option<f32>,
}

impl ParameterDecl {
    /// A control-rate parameter defaulting to `0.0`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            value: &[0.0],
            rate: ParameterRate::Control,
            lag: None,
        }
    }

    /// Sets the initial value(s).
    pub const fn value(mut self, value: &'static [f32]) -> Self {
        self.value = value;
        self
    }

    /// Sets the rate class.
    pub const fn rate(mut self, rate: ParameterRate) -> Self {
        self.rate = rate;
        self
    }

    /// Sets the lag time.
    pub const fn lag(mut self, lag: f32) -> Self {
        self.lag = Some(lag);
        self
    }
}

impl From<&ParameterDecl> for Parameter {
    fn from(decl: &ParameterDecl) -> Self {
        Parameter {
            name: decl.name.to_string(),
            value: decl.value.to_vec(),
            rate: decl.rate,
            lag: decl.lag,
        }
    }
}

/// Declared parameters handed to a graph function, by name.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: HashMap<String, UGenOperable>,
}

impl Parameters {
    pub(crate) fn insert(&mut self, name: impl Into<String>, value: UGenOperable) {
        self.values.insert(name.into(), value);
    }

    /// Outputs of the parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&UGenOperable> {
        self.values.get(name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, UGenOperable)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (S, UGenOperable)>>(iter: I) -> Self {
        let mut parameters = Self::default();
        for (name, value) in iter {
            parameters.insert(name, value);
        }
        parameters
    }
}

impl Index<&str> for Parameters {
    type Output = UGenOperable;

    /// Panics if no parameter called `name` was declared.
    fn index(&self, name: &str) -> &UGenOperable {
        match self.values.get(name) {
            Some(value) => value,
            None => panic!("no parameter named '{name}'"),
        }
    }
}

/// Builds an optimized graph from a function.
///
/// Declares `parameters` in order on a fresh builder, runs `graph` with the
/// builder active, then builds.
///
/// ```rust
/// use scgraph_core::{ParameterDecl, synthdef};
///
/// let def = synthdef(
///     "halved",
///     &[ParameterDecl::new("level").value(&[0.8])],
///     |params| {
///         params["level"].div(2.0)?;
///         Ok(())
///     },
/// )?;
/// // The division has no consumer and is optimized away.
/// assert_eq!(def.ugens().len(), 1);
/// # Ok::<(), scgraph_core::SynthDefError>(())
/// ```
pub fn synthdef<F>(
    name: &str,
    parameters: &[ParameterDecl],
    graph: F,
) -> Result<SynthDef, SynthDefError>
where
    F: FnOnce(&Parameters) -> Result<(), SynthDefError>,
{
    let builder = SynthDefBuilder::new();
    let mut declared = Parameters::default();
    for decl in parameters {
        let outputs = builder.add_parameter(Parameter::from(decl))?;
        declared.insert(decl.name, outputs);
    }
    {
        let _guard = builder.enter();
        graph(&declared)?;
    }
    builder.build(Some(name), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operable::UGenOperable;

    #[test]
    fn test_no_active_builder() {
        let err = UGenOperable::constant(1.0)
            .add(UGenOperable::from(proxy_from_new_builder()))
            .unwrap_err();
        assert!(matches!(err, SynthDefError::NoActiveBuilder(_)), "got: {err}");
    }

    fn proxy_from_new_builder() -> UGenOperable {
        let builder = SynthDefBuilder::new();
        builder.add_parameter(Parameter::new("x", 1.0)).unwrap()
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let outer = SynthDefBuilder::new();
        let inner = SynthDefBuilder::new();
        assert_eq!(active_scope(), None);
        {
            let _outer = outer.enter();
            assert_eq!(active_scope(), Some(outer.scope()));
            {
                let _inner = inner.enter();
                assert_eq!(active_scope(), Some(inner.scope()));
            }
            assert_eq!(active_scope(), Some(outer.scope()));
        }
        assert_eq!(active_scope(), None);
    }

    #[test]
    fn test_out_of_order_guard_drop() {
        let a = SynthDefBuilder::new();
        let b = SynthDefBuilder::new();
        let guard_a = a.enter();
        let guard_b = b.enter();
        drop(guard_a);
        assert_eq!(active_scope(), Some(b.scope()));
        drop(guard_b);
        assert_eq!(active_scope(), None);
    }

    #[test]
    fn test_duplicate_parameter() {
        let builder = SynthDefBuilder::new();
        builder.add_parameter(Parameter::new("gate", 1.0)).unwrap();
        let err = builder
            .add_parameter(Parameter::new("gate", 0.0))
            .unwrap_err();
        assert!(matches!(err, SynthDefError::DuplicateParameter(name) if name == "gate"));
    }

    #[test]
    fn test_invalid_parameters() {
        let builder = SynthDefBuilder::new();
        assert!(builder.add_parameter(Parameter::new("", 1.0)).is_err());
        assert!(
            builder
                .add_parameter(Parameter::vector("empty", Vec::new()))
                .is_err()
        );
        assert!(
            builder
                .add_parameter(Parameter::new("lagged", 1.0).with_lag(f32::NAN))
                .is_err()
        );
        assert!(builder.is_empty());
    }

    #[test]
    fn test_lag_requires_control_rate() {
        let builder = SynthDefBuilder::new();
        for rate in [ParameterRate::Scalar, ParameterRate::Trigger, ParameterRate::Audio] {
            let result =
                builder.add_parameter(Parameter::new("lagged", 1.0).with_rate(rate).with_lag(0.5));
            assert!(matches!(
                result,
                Err(SynthDefError::InvalidParameter {
                    reason: "lag requires a control-rate parameter",
                    ..
                })
            ));
        }
        assert!(builder.is_empty());

        let lagged = Parameter::new("lagged", 1.0).with_lag(0.5);
        builder.add_parameter(lagged.clone()).unwrap();
        let synthdef = builder.build(Some("lagged"), false).unwrap();
        let decoded = crate::decompile_synthdef(
            &synthdef.compile().unwrap(),
            &crate::system::SYSTEM_KINDS,
        )
        .unwrap();
        assert_eq!(decoded.parameters(), synthdef.parameters());
        assert_eq!(synthdef.parameter("lagged").map(|(p, _)| p), Some(&lagged));
    }

    #[test]
    fn test_parameter_outputs_match_width() {
        let builder = SynthDefBuilder::new();
        let mono = builder.add_parameter(Parameter::new("amp", 0.1)).unwrap();
        let stereo = builder
            .add_parameter(Parameter::vector("pan", [0.0, 1.0]))
            .unwrap();
        assert!(mono.as_output().is_some());
        assert_eq!(stereo.len(), 2);
        assert_eq!(builder.parameter("pan"), Some(stereo));
        assert!(builder.parameter("missing").is_none());
    }

    #[test]
    fn test_cross_scope_reference_is_rejected() {
        let first = SynthDefBuilder::new();
        let second = SynthDefBuilder::new();
        let foreign = first.add_parameter(Parameter::new("x", 2.0)).unwrap();
        let _guard = second.enter();
        let err = foreign.mul(3.0).unwrap_err();
        match err {
            SynthDefError::ScopeViolation { expected, found } => {
                assert_eq!(expected, second.scope());
                assert_eq!(found, first.scope());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(second.is_empty());
    }

    #[test]
    fn test_build_leaves_builder_reusable() {
        let builder = SynthDefBuilder::new();
        builder.add_parameter(Parameter::new("amp", 0.1)).unwrap();
        let first = builder.build(Some("first"), false).unwrap();
        builder.add_parameter(Parameter::new("bus", 0.0)).unwrap();
        let second = builder.build(Some("second"), false).unwrap();
        assert_eq!(first.parameters().len(), 1);
        assert_eq!(second.parameters().len(), 2);
    }

    #[test]
    fn test_empty_graph_is_rejected() {
        let builder = SynthDefBuilder::new();
        assert!(matches!(
            builder.build(None, true),
            Err(SynthDefError::EmptyGraph)
        ));
    }

    #[test]
    fn test_synthdef_helper_declares_in_order() {
        let def = synthdef(
            "helper",
            &[
                ParameterDecl::new("b").value(&[1.0, 2.0]),
                ParameterDecl::new("a").rate(ParameterRate::Scalar),
            ],
            |params| {
                assert_eq!(params.len(), 2);
                assert_eq!(params["b"].len(), 2);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(def.name(), Some("helper"));
        let names: Vec<_> = def.ugens().iter().map(UGen::name).collect();
        assert_eq!(names, ["Control", "Control"]);
    }
}
