//! Configuration for scgraph SynthDefs.
//!
//! A [`SynthDefConfig`] declares a graph's interface in TOML: its name, its
//! parameters (values, rates, lags) and how it should be compiled. The graph
//! body itself is still written in Rust against the builder the config opens.
//!
//! # Features
//!
//! - **TOML Files**: load and save interface declarations
//! - **Compile Options**: optimization and anonymous naming per SynthDef
//! - **Validation**: names, rates and values are checked before building
//!
//! # Example
//!
//! ```rust
//! use scgraph_config::SynthDefConfig;
//! use scgraph_core::{CalculationRate, InputDecl, UGenKind};
//!
//! static SIN_OSC: UGenKind = UGenKind::new("SinOsc")
//!     .inputs(&[InputDecl::new("frequency", 440.0), InputDecl::new("phase", 0.0)])
//!     .rates(&[CalculationRate::Audio, CalculationRate::Control])
//!     .pure();
//! static OUT: UGenKind = UGenKind::new("Out")
//!     .inputs(&[InputDecl::new("bus", 0.0), InputDecl::unexpanded("source")])
//!     .output();
//!
//! let config = SynthDefConfig::from_toml(r#"
//! name = "sine"
//!
//! [[parameters]]
//! name = "frequency"
//! value = [440.0, 443.0]
//! lag = 0.1
//!
//! [[parameters]]
//! name = "amplitude"
//! value = 0.2
//! "#)?;
//!
//! let synthdef = config.build_with(|params| {
//!     let sines = SIN_OSC.ar().arg("frequency", &params["frequency"]).build()?;
//!     OUT.ar().arg("source", sines.mul(&params["amplitude"])?).build()?;
//!     Ok(())
//! })?;
//! assert_eq!(synthdef.name(), Some("sine"));
//! # Ok::<(), scgraph_config::ConfigError>(())
//! ```

mod error;
mod synthdef_config;

/// Interface validation.
pub mod validation;

pub use error::ConfigError;
pub use synthdef_config::{CompileOptions, ParameterConfig, ParameterValue, SynthDefConfig};
pub use validation::{ValidationError, ValidationResult, validate_config, validate_parameter};
