//! Integration tests for scgraph-config.
//!
//! Interface files on disk, built against the registry catalog and checked
//! through a full compile and decode.

use scgraph_config::{CompileOptions, ConfigError, ParameterConfig, SynthDefConfig, ValidationError};
use scgraph_core::{DoneAction, Envelope, EnvelopeCurve, ParameterRate, Parameters, SynthDefError};
use scgraph_registry::catalog::{ENV_GEN, LPF, OUT, SAW, SIN_OSC};
use scgraph_registry::decompile_synthdef;
use tempfile::TempDir;

const PAD: &str = r#"
name = "pad"
description = "Detuned saw pad"

[[parameters]]
name = "frequency"
value = [220.0, 221.5]
lag = 0.2

[[parameters]]
name = "cutoff"
value = 1200.0

[[parameters]]
name = "amplitude"
value = 0.1

[[parameters]]
name = "gate"
value = 1.0
rate = "tr"
"#;

fn pad_graph(params: &Parameters) -> Result<(), SynthDefError> {
    let envelope = ENV_GEN
        .kr()
        .arg("gate", &params["gate"])
        .arg("done_action", DoneAction::FreeSynth)
        .arg(
            "envelope",
            Envelope::adsr(0.5, 0.2, 0.8, 2.0, 1.0, EnvelopeCurve::Curvature(-4.0)),
        )
        .build()?;
    let saws = SAW.ar().arg("frequency", &params["frequency"]).build()?;
    let filtered = LPF
        .ar()
        .arg("source", saws)
        .arg("frequency", &params["cutoff"])
        .build()?;
    let voice = filtered.mul(&params["amplitude"])?.mul(envelope)?;
    OUT.ar().arg("bus", 0.0).arg("source", voice).build()?;
    Ok(())
}

// ============================================================================
// Files on disk
// ============================================================================

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("synthdefs").join("pad.toml");

    let config = SynthDefConfig::from_toml(PAD).expect("should parse");
    config.save(&path).expect("save should create parent directories");
    assert!(path.exists());

    let loaded = SynthDefConfig::load(&path).expect("should load");
    assert_eq!(loaded, config);
    assert_eq!(loaded.description.as_deref(), Some("Detuned saw pad"));
    assert_eq!(loaded.compile, CompileOptions::default());
    assert_eq!(loaded.len(), 4);
    assert_eq!(
        loaded.parameter("gate").and_then(|p| p.parameter_rate().ok()),
        Some(ParameterRate::Trigger)
    );
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("missing.toml");

    let result = SynthDefConfig::load(&path);
    assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
}

#[test]
fn test_load_malformed_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "name = \"broken\"\n[[parameters]]\nvalue = ").unwrap();

    let result = SynthDefConfig::load(&path);
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_programmatic_config_saves_as_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("blip.toml");

    let config = SynthDefConfig::new("blip")
        .with_parameter(ParameterConfig::new("frequency", 880.0).with_lag(0.05))
        .with_parameter(ParameterConfig::new("bus", 0.0).with_rate(ParameterRate::Scalar))
        .with_optimize(false);
    config.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("name = \"blip\""));
    assert!(text.contains("rate = \"ir\""));
    assert!(text.contains("optimize = false"));

    assert_eq!(SynthDefConfig::load(&path).unwrap(), config);
}

// ============================================================================
// Building and compiling
// ============================================================================

#[test]
fn test_config_to_synthdef() {
    let config = SynthDefConfig::from_toml(PAD).unwrap();
    let synthdef = config.build_with(pad_graph).expect("should build");

    assert_eq!(synthdef.name(), Some("pad"));
    assert!(synthdef.has_gate());

    let (frequency, _) = synthdef.parameter("frequency").unwrap();
    assert_eq!(frequency.value, vec![220.0, 221.5]);
    assert_eq!(frequency.lag, Some(0.2));

    let names: Vec<&str> = synthdef.ugens().iter().map(|u| u.name()).collect();
    // lagged and unlagged control-rate parameters share one LagControl
    assert!(!names.contains(&"Control"));
    for name in ["LagControl", "TrigControl", "EnvGen", "LPF", "Out"] {
        assert!(names.contains(&name), "missing {name} in {names:?}");
    }
    // two detuned voices
    assert_eq!(names.iter().filter(|&&n| n == "Saw").count(), 2);
    assert_eq!(synthdef.ugens().last().unwrap().inputs().len(), 3);
}

#[test]
fn test_compiled_config_decodes() {
    let config = SynthDefConfig::from_toml(PAD).unwrap();
    let bytes = config.compile_with(pad_graph).unwrap();
    assert_eq!(&bytes[..4], b"SCgf");

    let built = config.build_with(pad_graph).unwrap();
    let decoded = decompile_synthdef(&bytes).expect("registry should know every kind");
    assert_eq!(decoded.name(), Some("pad"));
    assert_eq!(decoded.to_string(), built.to_string());
    assert_eq!(decoded.parameters(), built.parameters());
}

#[test]
fn test_anonymous_compile() {
    let config = SynthDefConfig::from_toml(PAD).unwrap().with_anonymous(true);
    let synthdef = config.build_with(pad_graph).unwrap();

    assert_eq!(synthdef.name(), None);
    assert_eq!(synthdef.effective_name(), synthdef.anonymous_name());
    assert_eq!(synthdef.anonymous_name().len(), 32);

    let named = SynthDefConfig::from_toml(PAD).unwrap().build_with(pad_graph).unwrap();
    assert_eq!(named.anonymous_name(), synthdef.anonymous_name());
}

#[test]
fn test_optimize_option() {
    let graph = |params: &Parameters| -> Result<(), SynthDefError> {
        SIN_OSC.ar().arg("frequency", &params["frequency"]).build()?;
        OUT.ar().arg("source", 0.0).build()?;
        Ok(())
    };
    let config = SynthDefConfig::new("idle")
        .with_parameter(ParameterConfig::new("frequency", 440.0));

    let optimized = config.build_with(graph).unwrap();
    assert!(optimized.ugens().iter().all(|u| u.name() != "SinOsc"));

    let kept = config.clone().with_optimize(false).build_with(graph).unwrap();
    assert!(kept.ugens().iter().any(|u| u.name() == "SinOsc"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_invalid_config_is_not_built() {
    let config = SynthDefConfig::from_toml(PAD)
        .unwrap()
        .with_parameter(ParameterConfig::new("cutoff", 400.0));

    let result = config.build_with(pad_graph);
    assert!(matches!(
        result,
        Err(ConfigError::Validation(ValidationError::DuplicateParameter(ref name))) if name == "cutoff"
    ));
}

#[test]
fn test_graph_errors_name_the_synthdef() {
    let config = SynthDefConfig::from_toml(PAD).unwrap();
    let result = config.build_with(|_| {
        LPF.ar().arg("frequency", 100.0).build()?;
        Ok(())
    });

    match result {
        Err(ConfigError::Build { name, source }) => {
            assert_eq!(name, "pad");
            assert!(matches!(source, SynthDefError::MissingInput { .. }));
        }
        other => panic!("expected build error, got {other:?}"),
    }
}
