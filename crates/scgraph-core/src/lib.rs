//! scgraph Core - SynthDef graph compiler
//!
//! This crate builds synthesis graphs ("SynthDefs") for a SuperCollider-style
//! server and compiles them to the server's binary `SCgf` format. It never
//! touches audio samples; its output is the graph description the server
//! loads.
//!
//! # Pipeline
//!
//! ## Construction
//!
//! - [`SynthDefBuilder`] - accumulates nodes under a scope identity
//! - [`BuilderGuard`] - RAII guard that makes a builder active on this thread
//! - [`UGenKind`] / [`UGenCall`] - static node descriptors and keyword
//!   construction with multichannel expansion
//! - [`UGenOperable`] - explicit `add`/`mul`/... methods with constant folding
//!   and algebraic short-circuits
//!
//! ## Finalization
//!
//! [`SynthDefBuilder::build`] snapshots the builder and then:
//!
//! 1. packs declared parameters into Control-family nodes
//! 2. copies FFT chains read by more than one consumer
//! 3. declares local buffers through a single `MaxLocalBufs` node
//! 4. sorts topologically, honoring width-first barriers
//! 5. optionally drops unused pure nodes
//!
//! ## Codec
//!
//! - [`SynthDef::compile`] / [`compile_synthdefs`] - bit-exact encoder
//! - [`decompile_synthdef`] / [`decompile_synthdefs`] - decoder against a
//!   closed [`UGenLookup`]
//!
//! # Example
//!
//! ```rust
//! use scgraph_core::{CalculationRate, InputDecl, ParameterDecl, UGenKind, synthdef};
//!
//! static SIN_OSC: UGenKind = UGenKind::new("SinOsc")
//!     .inputs(&[InputDecl::new("frequency", 440.0), InputDecl::new("phase", 0.0)])
//!     .rates(&[CalculationRate::Audio, CalculationRate::Control])
//!     .pure();
//! static OUT: UGenKind = UGenKind::new("Out")
//!     .inputs(&[InputDecl::new("bus", 0.0), InputDecl::unexpanded("source")])
//!     .output();
//!
//! let def = synthdef(
//!     "sine",
//!     &[
//!         ParameterDecl::new("frequency").value(&[440.0, 443.0]),
//!         ParameterDecl::new("amplitude").value(&[0.1]),
//!     ],
//!     |params| {
//!         let source = SIN_OSC.ar().arg("frequency", &params["frequency"]).build()?;
//!         let source = source.mul(&params["amplitude"])?;
//!         OUT.ar().arg("source", source).build()?;
//!         Ok(())
//!     },
//! )?;
//!
//! let bytes = def.compile()?;
//! assert_eq!(&bytes[..4], b"SCgf");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Logging
//!
//! With the `tracing` feature enabled, scope changes, build phases and codec
//! sizes are reported as `tracing` events. No subscriber is installed.

pub mod builder;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod expansion;
mod graph;
pub mod kind;
pub mod operable;
pub mod operator;
mod ops;
pub mod rate;
mod sort;
pub mod synthdef;
pub mod system;
pub mod ugen;

// Re-export main types at crate root
pub use builder::{
    BuilderGuard, ParameterDecl, Parameters, SynthDefBuilder, active_scope, synthdef,
};
pub use codec::{UGenLookup, compile_synthdefs, decompile_synthdef, decompile_synthdefs};
pub use envelope::{DEFAULT_ENVELOPE, DoneAction, Envelope, EnvelopeCurve, EnvelopeShape};
pub use error::{CodecError, SynthDefError};
pub use expansion::UGenCall;
pub use kind::{InputDecl, PvRole, UGenKind};
pub use operable::{UGenOperable, UGenSerializable, UGenVector};
pub use operator::{BinaryOperator, UnaryOperator};
pub use rate::{CalculationRate, ParameterRate, ParseRateError};
pub use synthdef::{Edge, SynthDef};
pub use ugen::{InputKey, NodeId, OutputProxy, Parameter, ScopeId, UGen, UGenScalar};
