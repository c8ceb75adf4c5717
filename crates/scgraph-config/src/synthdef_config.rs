//! SynthDef interface file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use scgraph_core::{
    Parameter, ParameterRate, Parameters, SynthDef, SynthDefBuilder, SynthDefError,
};

use crate::error::ConfigError;
use crate::validation::{ValidationError, ValidationResult, validate_config};

/// Interface declaration for one SynthDef.
///
/// The file names the graph, lists its parameters and says how to compile
/// it. The graph body is supplied in code through [`build_with`].
///
/// # TOML Format
///
/// ```toml
/// name = "pad"
/// description = "Detuned saw pad"
///
/// [compile]
/// optimize = true
/// anonymous = false
///
/// [[parameters]]
/// name = "frequency"
/// value = [220.0, 221.5]
/// lag = 0.2
///
/// [[parameters]]
/// name = "gate"
/// value = 1.0
/// rate = "tr"
/// ```
///
/// [`build_with`]: SynthDefConfig::build_with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthDefConfig {
    /// SynthDef name written to the compiled file.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Compile options.
    #[serde(default)]
    pub compile: CompileOptions,

    /// Declared parameters, in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterConfig>,
}

/// How a configured SynthDef is finalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompileOptions {
    /// Drop unused side-effect-free nodes (defaults to true).
    #[serde(default = "default_optimize")]
    pub optimize: bool,

    /// Build without an explicit name so the content hash is used.
    #[serde(default)]
    pub anonymous: bool,
}

fn default_optimize() -> bool {
    true
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            anonymous: false,
        }
    }
}

/// A parameter value: one channel or several.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Single channel.
    Scalar(f32),
    /// One value per channel.
    Array(Vec<f32>),
}

impl ParameterValue {
    /// Values per channel.
    pub fn to_vec(&self) -> Vec<f32> {
        match self {
            ParameterValue::Scalar(value) => vec![*value],
            ParameterValue::Array(values) => values.clone(),
        }
    }
}

impl Default for ParameterValue {
    fn default() -> Self {
        ParameterValue::Scalar(0.0)
    }
}

impl From<f32> for ParameterValue {
    fn from(value: f32) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl From<Vec<f32>> for ParameterValue {
    fn from(values: Vec<f32>) -> Self {
        ParameterValue::Array(values)
    }
}

impl<const N: usize> From<[f32; N]> for ParameterValue {
    fn from(values: [f32; N]) -> Self {
        ParameterValue::Array(values.to_vec())
    }
}

/// One `[[parameters]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterConfig {
    /// Parameter name.
    pub name: String,

    /// Initial value(s), defaulting to `0.0`.
    #[serde(default)]
    pub value: ParameterValue,

    /// Rate name: `ir`, `kr`, `ar`, `tr` or the long forms. Defaults to `kr`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,

    /// Lag time for control-rate parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag: Option<f32>,
}

impl ParameterConfig {
    /// Create a control-rate parameter.
    pub fn new(name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            rate: None,
            lag: None,
        }
    }

    /// Set the rate.
    pub fn with_rate(mut self, rate: ParameterRate) -> Self {
        self.rate = Some(rate.token().to_string());
        self
    }

    /// Set the lag time.
    pub fn with_lag(mut self, lag: f32) -> Self {
        self.lag = Some(lag);
        self
    }

    /// Parsed rate; `kr` when unset.
    pub fn parameter_rate(&self) -> ValidationResult<ParameterRate> {
        match &self.rate {
            None => Ok(ParameterRate::Control),
            Some(rate) => rate.parse().map_err(|_| ValidationError::InvalidRate {
                parameter: self.name.clone(),
                rate: rate.clone(),
            }),
        }
    }

    /// Convert to a builder parameter.
    pub fn to_parameter(&self) -> ValidationResult<Parameter> {
        let mut parameter = Parameter::vector(self.name.as_str(), self.value.to_vec())
            .with_rate(self.parameter_rate()?);
        if let Some(lag) = self.lag {
            parameter = parameter.with_lag(lag);
        }
        Ok(parameter)
    }
}

impl SynthDefConfig {
    /// Create a config with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            compile: CompileOptions::default(),
            parameters: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a parameter.
    pub fn with_parameter(mut self, parameter: ParameterConfig) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Enable or disable dead-code elimination.
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.compile.optimize = optimize;
        self
    }

    /// Build under the content-hash name instead of `name`.
    pub fn with_anonymous(mut self, anonymous: bool) -> Self {
        self.compile.anonymous = anonymous;
        self
    }

    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the config to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::create_dir(parent, e))?;
            }
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterConfig> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Whether no parameters are declared.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Check names, rates and values.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Builder parameters in declaration order.
    pub fn to_parameters(&self) -> ValidationResult<Vec<Parameter>> {
        self.parameters.iter().map(ParameterConfig::to_parameter).collect()
    }

    /// Validate, then open a builder with every parameter declared.
    pub fn builder(&self) -> Result<SynthDefBuilder, ConfigError> {
        self.validate()?;
        let builder = SynthDefBuilder::new();
        for parameter in self.to_parameters()? {
            builder
                .add_parameter(parameter)
                .map_err(|e| ConfigError::build(&self.name, e))?;
        }
        Ok(builder)
    }

    /// Build a SynthDef whose body is produced by `graph`.
    ///
    /// `graph` runs with the builder active and receives the declared
    /// parameters by name. The compile options pick the name and whether
    /// unused nodes are dropped.
    pub fn build_with<F>(&self, graph: F) -> Result<SynthDef, ConfigError>
    where
        F: FnOnce(&Parameters) -> Result<(), SynthDefError>,
    {
        let builder = self.builder()?;
        let parameters: Parameters = self
            .parameters
            .iter()
            .filter_map(|p| builder.parameter(&p.name).map(|outputs| (p.name.as_str(), outputs)))
            .collect();
        {
            let _guard = builder.enter();
            graph(&parameters).map_err(|e| ConfigError::build(&self.name, e))?;
        }
        let name = (!self.compile.anonymous).then_some(self.name.as_str());
        builder
            .build(name, self.compile.optimize)
            .map_err(|e| ConfigError::build(&self.name, e))
    }

    /// Build with `graph` and encode the result as an SCgf file.
    pub fn compile_with<F>(&self, graph: F) -> Result<Vec<u8>, ConfigError>
    where
        F: FnOnce(&Parameters) -> Result<(), SynthDefError>,
    {
        let synthdef = self.build_with(graph)?;
        synthdef
            .compile()
            .map_err(|e| ConfigError::build(&self.name, e.into()))
    }
}

impl Default for SynthDefConfig {
    fn default() -> Self {
        Self::new("untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = SynthDefConfig::new("pad");
        assert_eq!(config.name, "pad");
        assert!(config.description.is_none());
        assert!(config.compile.optimize);
        assert!(!config.compile.anonymous);
        assert!(config.is_empty());
    }

    #[test]
    fn test_config_builder_methods() {
        let config = SynthDefConfig::new("pad")
            .with_description("Detuned pad")
            .with_optimize(false)
            .with_anonymous(true)
            .with_parameter(ParameterConfig::new("frequency", [220.0, 221.5]).with_lag(0.2))
            .with_parameter(ParameterConfig::new("gate", 1.0).with_rate(ParameterRate::Trigger));

        assert_eq!(config.description.as_deref(), Some("Detuned pad"));
        assert!(!config.compile.optimize);
        assert!(config.compile.anonymous);
        assert_eq!(config.len(), 2);
        assert_eq!(config.parameter("gate").unwrap().rate.as_deref(), Some("tr"));
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
name = "pad"
description = "Detuned saw pad"

[compile]
optimize = false

[[parameters]]
name = "frequency"
value = [220.0, 221.5]
lag = 0.2

[[parameters]]
name = "bus"
value = 2

[[parameters]]
name = "gate"
rate = "trigger"
"#;

        let config = SynthDefConfig::from_toml(toml).unwrap();
        assert_eq!(config.name, "pad");
        assert!(!config.compile.optimize);
        assert!(!config.compile.anonymous);
        assert_eq!(config.len(), 3);

        let frequency = config.parameter("frequency").unwrap();
        assert_eq!(frequency.value, ParameterValue::Array(vec![220.0, 221.5]));
        assert_eq!(frequency.lag, Some(0.2));

        assert_eq!(config.parameter("bus").unwrap().value, ParameterValue::Scalar(2.0));

        let gate = config.parameter("gate").unwrap();
        assert_eq!(gate.value, ParameterValue::Scalar(0.0));
        assert_eq!(gate.parameter_rate(), Ok(ParameterRate::Trigger));
    }

    #[test]
    fn test_minimal_toml() {
        let config = SynthDefConfig::from_toml("name = \"bare\"").unwrap();
        assert_eq!(config, SynthDefConfig::new("bare"));
    }

    #[test]
    fn test_config_roundtrip() {
        let original = SynthDefConfig::new("roundtrip")
            .with_description("Testing serialization")
            .with_anonymous(true)
            .with_parameter(ParameterConfig::new("amplitude", 0.5))
            .with_parameter(
                ParameterConfig::new("phase", 0.0).with_rate(ParameterRate::Audio),
            );

        let toml = original.to_toml().unwrap();
        assert!(toml.contains("name = \"roundtrip\""));
        assert!(toml.contains("rate = \"ar\""));

        let parsed = SynthDefConfig::from_toml(&toml).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_to_parameter() {
        let parameter = ParameterConfig::new("frequency", [440.0, 443.0])
            .with_lag(0.5)
            .to_parameter()
            .unwrap();
        assert_eq!(parameter.name, "frequency");
        assert_eq!(parameter.value, [440.0, 443.0]);
        assert_eq!(parameter.rate, ParameterRate::Control);
        assert_eq!(parameter.lag, Some(0.5));
    }

    #[test]
    fn test_unknown_rate() {
        let mut parameter = ParameterConfig::new("x", 0.0);
        parameter.rate = Some("fast".to_string());
        assert_eq!(
            parameter.to_parameter().unwrap_err(),
            ValidationError::InvalidRate {
                parameter: "x".to_string(),
                rate: "fast".to_string(),
            }
        );
    }

    #[test]
    fn test_builder_declares_parameters() {
        let config = SynthDefConfig::new("controls")
            .with_parameter(ParameterConfig::new("b", 1.0))
            .with_parameter(ParameterConfig::new("a", [2.0, 3.0]));
        let builder = config.builder().unwrap();
        assert_eq!(builder.len(), 2);
        assert_eq!(builder.parameter("a").unwrap().len(), 2);
    }

    #[test]
    fn test_build_with_anonymous_name() {
        let config = SynthDefConfig::new("hashed")
            .with_anonymous(true)
            .with_parameter(ParameterConfig::new("amplitude", 0.1));
        let synthdef = config.build_with(|_| Ok(())).unwrap();
        assert_eq!(synthdef.name(), None);
        assert_eq!(synthdef.effective_name(), synthdef.anonymous_name());
    }

    #[test]
    fn test_graph_errors_name_the_synthdef() {
        let config = SynthDefConfig::new("broken");
        let err = config.build_with(|_| Ok(())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Build { ref name, source: SynthDefError::EmptyGraph } if name == "broken"
        ));
    }
}
