//! Property-based tests for graph finalization.
//!
//! Covers constant folding, control layout, dead-code elimination,
//! width-first ordering, scope isolation and codec round trips over randomly
//! generated graphs.

use std::collections::BTreeSet;

use proptest::prelude::*;
use scgraph_core::{
    CalculationRate, InputDecl, Parameter, ParameterRate, SynthDef, SynthDefBuilder,
    SynthDefError, UGenKind, UGenOperable, decompile_synthdef,
};

static MIX2: UGenKind = UGenKind::new("Mix2")
    .inputs(&[
        InputDecl::new("a", 0.0),
        InputDecl::new("b", 0.0),
        InputDecl::new("tag", 0.0),
    ])
    .rates(&[CalculationRate::Audio, CalculationRate::Control])
    .pure();

static PROBE: UGenKind = UGenKind::new("Probe")
    .inputs(&[InputDecl::new("source", 0.0), InputDecl::new("tag", 0.0)])
    .rates(&[CalculationRate::Audio])
    .width_first();

static OUT: UGenKind = UGenKind::new("Out")
    .inputs(&[InputDecl::new("bus", 0.0), InputDecl::unexpanded("source")])
    .rates(&[CalculationRate::Audio])
    .output();

static KINDS: [&UGenKind; 3] = [&MIX2, &PROBE, &OUT];

/// A random DAG of `Mix2` nodes.
///
/// Each node takes two inputs; an input pick of zero (or any pick on the
/// first node) is a constant, anything else selects an earlier node. `sinks`
/// lists the nodes routed to `Out`.
#[derive(Debug, Clone)]
struct Dag {
    inputs: Vec<[Option<usize>; 2]>,
    sinks: BTreeSet<usize>,
}

impl Dag {
    /// Nodes that reach `Out` through any path.
    fn live(&self) -> BTreeSet<usize> {
        let mut live = BTreeSet::new();
        let mut stack: Vec<usize> = self.sinks.iter().copied().collect();
        while let Some(node) = stack.pop() {
            if live.insert(node) {
                stack.extend(self.inputs[node].iter().flatten().copied());
            }
        }
        live
    }

    fn build(&self, optimize: bool) -> SynthDef {
        let builder = SynthDefBuilder::new();
        {
            let _guard = builder.enter();
            let mut nodes: Vec<UGenOperable> = Vec::new();
            for (tag, inputs) in self.inputs.iter().enumerate() {
                let [a, b] = inputs.map(|input| match input {
                    Some(node) => nodes[node].clone(),
                    None => UGenOperable::constant(0.5),
                });
                let node = MIX2
                    .ar()
                    .arg("a", a)
                    .arg("b", b)
                    .arg("tag", tag as f32)
                    .build()
                    .unwrap();
                nodes.push(node);
            }
            let source: Vec<UGenOperable> =
                self.sinks.iter().map(|&sink| nodes[sink].clone()).collect();
            let source = if source.is_empty() {
                UGenOperable::constant(0.0)
            } else {
                UGenOperable::from(source)
            };
            OUT.ar().arg("source", source).build().unwrap();
        }
        builder.build(Some("dag"), optimize).unwrap()
    }
}

fn dag() -> impl Strategy<Value = Dag> {
    (1usize..12)
        .prop_flat_map(|len| {
            (
                prop::collection::vec((0usize..8, 0usize..8), len),
                prop::collection::btree_set(0..len, 0..=len.min(3)),
            )
        })
        .prop_map(|(picks, sinks)| {
            let inputs = picks
                .into_iter()
                .enumerate()
                .map(|(node, (a, b))| {
                    let pick = |p: usize| (node > 0 && p > 0).then(|| (p - 1) % node);
                    [pick(a), pick(b)]
                })
                .collect();
            Dag { inputs, sinks }
        })
}

fn tag(synthdef: &SynthDef, position: usize) -> Option<usize> {
    synthdef.ugens()[position]
        .input("tag")
        .and_then(|input| input.as_constant())
        .map(|tag| tag as usize)
}

fn tags(synthdef: &SynthDef) -> BTreeSet<usize> {
    (0..synthdef.ugens().len())
        .filter(|&position| synthdef.ugens()[position].name() == "Mix2")
        .filter_map(|position| tag(synthdef, position))
        .collect()
}

fn parameter(name: &str, rate: usize, value: f32) -> Parameter {
    let rate = match rate % 4 {
        0 => ParameterRate::Scalar,
        1 => ParameterRate::Trigger,
        2 => ParameterRate::Audio,
        _ => ParameterRate::Control,
    };
    Parameter::new(name, value).with_rate(rate)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Operators over two constants never register a node.
    #[test]
    fn constants_fold_on_the_host(a in -1000.0f32..1000.0, b in -1000.0f32..1000.0) {
        let builder = SynthDefBuilder::new();
        let _guard = builder.enter();
        let left = UGenOperable::constant(a);

        prop_assert_eq!(left.add(b).unwrap().as_constant(), Some(a + b));
        prop_assert_eq!(left.sub(b).unwrap().as_constant(), Some(a - b));
        prop_assert_eq!(left.mul(b).unwrap().as_constant(), Some(a * b));
        prop_assert_eq!(left.neg().unwrap().as_constant(), Some(-a));
        prop_assert_eq!(builder.len(), 0);
    }

    /// Identity operands return the other operand unchanged.
    #[test]
    fn identities_do_not_register_nodes(tag in 0.0f32..100.0) {
        let builder = SynthDefBuilder::new();
        let _guard = builder.enter();
        let node = MIX2.ar().arg("tag", tag).build().unwrap();

        prop_assert_eq!(&node.mul(1.0).unwrap(), &node);
        prop_assert_eq!(&node.add(0.0).unwrap(), &node);
        prop_assert_eq!(&node.sub(0.0).unwrap(), &node);
        prop_assert_eq!(&node.div(1.0).unwrap(), &node);
        prop_assert_eq!(node.mul(0.0).unwrap().as_constant(), Some(0.0));
        prop_assert_eq!(builder.len(), 1);
    }

    /// The control layout depends on names and rates, not declaration order.
    #[test]
    fn control_layout_ignores_declaration_order(
        declared in prop::collection::btree_map("[a-z]{1,6}", (0usize..4, -10.0f32..10.0), 1..8)
            .prop_map(|map| map.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
        seed in any::<u64>(),
    ) {
        let mut shuffled = declared.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();

        let compile = |order: &[(String, (usize, f32))]| {
            let builder = SynthDefBuilder::new();
            for (name, (rate, value)) in order {
                builder.add_parameter(parameter(name, *rate, *value)).unwrap();
            }
            builder.build(Some("controls"), true).unwrap()
        };
        let first = compile(&declared);
        let second = compile(&shuffled);

        prop_assert_eq!(first.parameters(), second.parameters());
        prop_assert_eq!(first.compile().unwrap(), second.compile().unwrap());

        let slots: Vec<usize> = first.parameters().iter().map(|(_, index)| *index).collect();
        let mut expected = 0;
        for (index, (parameter, slot)) in first.parameters().iter().enumerate() {
            prop_assert_eq!(*slot, expected, "slot of parameter {}", index);
            expected += parameter.len();
        }
        prop_assert!(slots.windows(2).all(|pair| pair[0] < pair[1]));
    }

    /// Optimization keeps exactly the nodes that reach an output.
    #[test]
    fn dead_code_elimination_keeps_live_nodes(dag in dag()) {
        let optimized = dag.build(true);
        prop_assert_eq!(tags(&optimized), dag.live());

        let edges = optimized.edges();
        for (position, ugen) in optimized.ugens().iter().enumerate() {
            if ugen.is_pure() {
                prop_assert!(
                    edges.iter().any(|edge| edge.from.index() as usize == position),
                    "pure node {} has no consumer", position
                );
            }
        }
    }

    /// Without optimization every constructed node survives.
    #[test]
    fn unoptimized_graphs_keep_every_node(dag in dag()) {
        let all: BTreeSet<usize> = (0..dag.inputs.len()).collect();
        prop_assert_eq!(tags(&dag.build(false)), all);
    }

    /// When every node is live, optimization changes nothing.
    #[test]
    fn optimization_is_a_no_op_on_live_graphs(mut dag in dag()) {
        dag.sinks = (0..dag.inputs.len()).collect();
        prop_assert_eq!(
            dag.build(true).compile().unwrap(),
            dag.build(false).compile().unwrap()
        );
    }

    /// Nodes constructed after a width-first node are scheduled after it.
    #[test]
    fn width_first_nodes_precede_later_nodes(before in 0usize..5, after in 1usize..5) {
        let builder = SynthDefBuilder::new();
        {
            let _guard = builder.enter();
            let mut last = UGenOperable::constant(0.0);
            for tag in 0..before {
                last = MIX2.ar().arg("a", last).arg("tag", tag as f32).build().unwrap();
            }
            let probe = PROBE.ar().arg("tag", 100.0).build().unwrap();
            for tag in 0..after {
                let source = if tag == 0 { probe.clone() } else { last.clone() };
                last = MIX2
                    .ar()
                    .arg("a", source)
                    .arg("tag", (before + tag) as f32)
                    .build()
                    .unwrap();
            }
            OUT.ar().arg("source", last).build().unwrap();
        }
        let synthdef = builder.build(Some("probe"), false).unwrap();

        let probe = synthdef
            .ugens()
            .iter()
            .position(|ugen| ugen.name() == "Probe")
            .unwrap();
        for (position, _) in synthdef.ugens().iter().enumerate() {
            if let Some(tag) = tag(&synthdef, position) {
                if tag < before {
                    prop_assert!(position < probe);
                } else if tag < before + after {
                    prop_assert!(position > probe);
                }
            }
        }
    }

    /// Outputs from one builder are rejected inside another.
    #[test]
    fn outputs_stay_in_their_scope(count in 2usize..5, from in 0usize..5, to in 0usize..5) {
        let (from, to) = (from % count, to % count);
        prop_assume!(from != to);
        let builders: Vec<SynthDefBuilder> = (0..count).map(|_| SynthDefBuilder::new()).collect();

        let node = {
            let _guard = builders[from].enter();
            MIX2.ar().build().unwrap()
        };
        let _guard = builders[to].enter();
        let result = MIX2.ar().arg("a", node).build();
        match result {
            Err(SynthDefError::ScopeViolation { expected, found }) => {
                prop_assert_eq!(expected, builders[to].scope());
                prop_assert_eq!(found, builders[from].scope());
            }
            other => prop_assert!(false, "expected a scope violation, got {:?}", other),
        }
        prop_assert_eq!(builders[to].len(), 0);
    }

    /// Encoded graphs decode to graphs that encode identically.
    #[test]
    fn compiled_graphs_round_trip(dag in dag(), optimize in any::<bool>()) {
        let synthdef = dag.build(optimize);
        let bytes = synthdef.compile().unwrap();
        let decoded = decompile_synthdef(&bytes, &KINDS).unwrap();

        prop_assert_eq!(decoded.compile().unwrap(), bytes);
        prop_assert_eq!(decoded.anonymous_name(), synthdef.anonymous_name());
        prop_assert_eq!(decoded.to_string(), synthdef.to_string());
    }
}
