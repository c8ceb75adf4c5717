//! Property-based tests for registry lookups.
//!
//! Random effect chains are built by name through the registry, compiled,
//! and decoded back through the same registry.

use proptest::prelude::*;
use scgraph_core::{CalculationRate, SynthDef, SynthDefBuilder, UGenOperable};
use scgraph_registry::{UGenCategory, UGenRegistry};

const PROCESSORS: [&str; 6] = ["LPF", "HPF", "Lag", "Decay2", "DelayC", "CombC"];

fn chain(registry: &UGenRegistry, frequencies: &[f32], processors: &[usize]) -> SynthDef {
    let builder = SynthDefBuilder::new();
    {
        let _guard = builder.enter();
        let mut signal = registry
            .create("SinOsc", CalculationRate::Audio)
            .unwrap()
            .arg("frequency", frequencies.to_vec())
            .build()
            .unwrap();
        for &processor in processors {
            signal = registry
                .create(PROCESSORS[processor], CalculationRate::Audio)
                .unwrap()
                .arg("source", signal)
                .build()
                .unwrap();
        }
        registry
            .create("Out", CalculationRate::Audio)
            .unwrap()
            .arg("bus", UGenOperable::from(0.0))
            .arg("source", signal)
            .build()
            .unwrap();
    }
    builder.build(Some("chain"), true).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn chains_built_by_name_decode_by_name(
        frequencies in prop::collection::vec(20.0f32..2000.0, 1..4),
        processors in prop::collection::vec(0..PROCESSORS.len(), 0..5),
    ) {
        let registry = UGenRegistry::new();
        let synthdef = chain(&registry, &frequencies, &processors);
        prop_assert_eq!(
            synthdef.ugens().len(),
            frequencies.len() * (1 + processors.len()) + 1
        );

        let bytes = synthdef.compile().unwrap();
        let decoded = registry.decompile_synthdef(&bytes).unwrap();
        prop_assert_eq!(decoded.to_string(), synthdef.to_string());
        prop_assert_eq!(decoded.compile().unwrap(), bytes);
    }

    #[test]
    fn every_entry_is_found_by_its_own_name(index in 0usize..43) {
        let registry = UGenRegistry::new();
        let entry = &registry.all()[index % registry.len()];
        let found = registry.get(entry.name()).unwrap();
        prop_assert_eq!(found.name(), entry.name());
        prop_assert!(registry.in_category(found.category).iter().any(|d| d.name() == entry.name()));
        prop_assert_ne!(found.category.name(), "");
        if found.category == UGenCategory::System {
            prop_assert!(scgraph_core::system::SYSTEM_KINDS.iter().any(|k| k.name == entry.name()));
        }
    }
}
