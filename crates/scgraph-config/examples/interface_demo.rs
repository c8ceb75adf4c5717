//! SynthDef interface demo: declare parameters in TOML, build, compile, decode.
//!
//! Run with: cargo run -p scgraph-config --example interface_demo

use scgraph_config::{ParameterConfig, SynthDefConfig, validate_config};
use scgraph_core::{DoneAction, Envelope, EnvelopeCurve, ParameterRate};
use scgraph_registry::catalog::{ENV_GEN, OUT, PAN2, SAW};
use scgraph_registry::{UGenRegistry, decompile_synthdef};

fn main() {
    // --- Interface declaration ---
    println!("=== Interface ===\n");

    let config = SynthDefConfig::new("saw_pad")
        .with_description("Detuned saw with an ADSR")
        .with_parameter(ParameterConfig::new("frequency", [110.0, 110.7]).with_lag(0.2))
        .with_parameter(ParameterConfig::new("amplitude", 0.1))
        .with_parameter(ParameterConfig::new("position", 0.0))
        .with_parameter(ParameterConfig::new("gate", 1.0).with_rate(ParameterRate::Trigger));

    let toml = config.to_toml().expect("config should serialize");
    println!("{toml}");

    match validate_config(&config) {
        Ok(()) => println!("Validation: ok"),
        Err(e) => println!("Validation: {e}"),
    }

    // --- Build ---
    println!("\n=== Graph ===\n");

    let synthdef = config
        .build_with(|params| {
            let envelope = ENV_GEN
                .kr()
                .arg("gate", &params["gate"])
                .arg("done_action", DoneAction::FreeSynth)
                .arg(
                    "envelope",
                    Envelope::adsr(0.3, 0.2, 0.7, 1.5, 1.0, EnvelopeCurve::Curvature(-4.0)),
                )
                .build()?;
            let saws = SAW.ar().arg("frequency", &params["frequency"]).build()?;
            let mono = saws.sum()?.mul(&params["amplitude"])?.mul(envelope)?;
            let stereo = PAN2
                .ar()
                .arg("source", mono)
                .arg("position", &params["position"])
                .build()?;
            OUT.ar().arg("source", stereo).build()?;
            Ok(())
        })
        .expect("graph should build");

    println!("{synthdef}");
    println!("Anonymous name: {}", synthdef.anonymous_name());

    // --- Compile and decode ---
    println!("\n=== SCgf ===\n");

    let bytes = synthdef.compile().expect("graph should encode");
    println!(
        "{} bytes, {} nodes, {} constants",
        bytes.len(),
        synthdef.ugens().len(),
        synthdef.constants().len()
    );

    let decoded = decompile_synthdef(&bytes).expect("registry should decode its own kinds");
    println!("Decoded identical: {}", decoded.to_string() == synthdef.to_string());

    // --- Registry ---
    println!("\n=== Registry ===\n");

    let registry = UGenRegistry::new();
    for ugen in synthdef.ugens() {
        if let Some(entry) = registry.get(ugen.name()) {
            println!("  {:<14} {:<14} {}", entry.name(), entry.category.name(), entry.description);
        }
    }
}
