//! UGen catalog and closed name registry for scgraph.
//!
//! This crate provides the name→kind table the SCgf decoder needs and a
//! representative catalog of node kinds to build graphs from. The table is
//! closed: every kind is a `static` declared in [`catalog`] or in
//! [`scgraph_core::system`], and unknown names are rejected rather than
//! resolved dynamically.
//!
//! # Features
//!
//! - **Kind Discovery**: list every registered kind with metadata
//! - **Construction by Name**: start a [`UGenCall`] from a type name and rate
//! - **Category System**: kinds organized by role (oscillators, filters, ...)
//! - **Decoding**: [`UGenLookup`] implementation plus convenience decoders
//!
//! # Example
//!
//! ```rust
//! use scgraph_core::{CalculationRate, SynthDefBuilder};
//! use scgraph_registry::{UGenCategory, UGenRegistry};
//!
//! let registry = UGenRegistry::new();
//!
//! let builder = SynthDefBuilder::new();
//! {
//!     let _guard = builder.enter();
//!     let sine = registry
//!         .create("SinOsc", CalculationRate::Audio)
//!         .unwrap()
//!         .arg("frequency", 220.0)
//!         .build()?;
//!     registry
//!         .create("Out", CalculationRate::Audio)
//!         .unwrap()
//!         .arg("source", sine)
//!         .build()?;
//! }
//! let bytes = builder.build(Some("sine"), true)?.compile()?;
//!
//! let decoded = registry.decompile_synthdef(&bytes)?;
//! assert_eq!(decoded.name(), Some("sine"));
//!
//! for descriptor in registry.in_category(UGenCategory::PhaseVocoder) {
//!     println!("{}: {}", descriptor.name(), descriptor.description);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;

use scgraph_core::system::{
    AUDIO_CONTROL, BINARY_OP_UGEN, BUF_FRAMES, CONTROL, FFT, LAG_CONTROL, LOCAL_BUF,
    MAX_LOCAL_BUFS, PV_COPY, SUM3, SUM4, TRIG_CONTROL, UNARY_OP_UGEN,
};
use scgraph_core::{CalculationRate, CodecError, SynthDef, UGenCall, UGenKind, UGenLookup};

use catalog::{
    BUF_DUR, BUF_SAMPLE_RATE, COMB_C, DC, DECAY2, DELAY_C, DONE, ENV_GEN, FREE_SELF, HPF, IFFT,
    IMPULSE, IN, LAG, LF_SAW, LINE, LPF, OUT, PAN2, PINK_NOISE, POLL, PV_ADD, PV_BIN_SCRAMBLE,
    PV_MAG_FREEZE, PV_MAG_MUL, REPLACE_OUT, SAW, SIN_OSC, WHITE_NOISE, X_LINE,
};

/// Role of a node kind, for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UGenCategory {
    /// Periodic signal sources
    Oscillator,
    /// Random signal sources
    Noise,
    /// Filters and lags
    Filter,
    /// Delay lines and combs
    Delay,
    /// Envelopes, ramps and lifetime control
    Envelope,
    /// Spatial placement
    Panning,
    /// Bus reads, writes and diagnostics
    InputOutput,
    /// Buffer metadata and scratch buffers
    Buffer,
    /// FFT chains
    PhaseVocoder,
    /// Kinds the compiler synthesizes itself
    System,
}

impl UGenCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            UGenCategory::Oscillator => "Oscillator",
            UGenCategory::Noise => "Noise",
            UGenCategory::Filter => "Filter",
            UGenCategory::Delay => "Delay",
            UGenCategory::Envelope => "Envelope",
            UGenCategory::Panning => "Panning",
            UGenCategory::InputOutput => "I/O",
            UGenCategory::Buffer => "Buffer",
            UGenCategory::PhaseVocoder => "Phase Vocoder",
            UGenCategory::System => "System",
        }
    }
}

/// Describes a node kind in the registry.
#[derive(Debug, Clone, Copy)]
pub struct UGenDescriptor {
    /// The kind itself.
    pub kind: &'static UGenKind,
    /// Category for organization.
    pub category: UGenCategory,
    /// Brief description.
    pub description: &'static str,
}

impl UGenDescriptor {
    /// Type name, as written to the wire format.
    pub fn name(&self) -> &'static str {
        self.kind.name
    }
}

/// Registry of every node kind this workspace knows.
///
/// Includes the compiler's own kinds (operators, Control family, FFT
/// helpers) so that any graph the core can produce also decodes.
pub struct UGenRegistry {
    entries: Vec<UGenDescriptor>,
}

impl Default for UGenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UGenRegistry {
    /// Create a new registry with all built-in kinds registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(48),
        };
        registry.register_catalog();
        registry.register_system();
        registry
    }

    fn register_catalog(&mut self) {
        use UGenCategory::{
            Buffer, Delay, Envelope, Filter, InputOutput, Noise, Oscillator, Panning,
            PhaseVocoder,
        };

        // Oscillators
        self.register(&SIN_OSC, Oscillator, "Sine oscillator");
        self.register(&SAW, Oscillator, "Band-limited sawtooth");
        self.register(&LF_SAW, Oscillator, "Non-band-limited sawtooth");
        self.register(&IMPULSE, Oscillator, "Single-sample impulse train");
        self.register(&DC, Oscillator, "Constant signal");

        // Noise
        self.register(&WHITE_NOISE, Noise, "White noise");
        self.register(&PINK_NOISE, Noise, "Pink noise");

        // Filters
        self.register(&LPF, Filter, "Butterworth lowpass");
        self.register(&HPF, Filter, "Butterworth highpass");
        self.register(&LAG, Filter, "Exponential lag");
        self.register(&DECAY2, Filter, "Exponential attack and decay");

        // Delays
        self.register(&DELAY_C, Delay, "Cubic-interpolating delay line");
        self.register(&COMB_C, Delay, "Cubic-interpolating comb filter");

        // Envelopes
        self.register(&ENV_GEN, Envelope, "Breakpoint envelope generator");
        self.register(&LINE, Envelope, "Linear ramp");
        self.register(&X_LINE, Envelope, "Exponential ramp");
        self.register(&DONE, Envelope, "Done flag reader");
        self.register(&FREE_SELF, Envelope, "Frees the synth on a trigger");

        // Panning
        self.register(&PAN2, Panning, "Equal-power stereo panner");

        // Bus I/O
        self.register(&IN, InputOutput, "Bus reader");
        self.register(&OUT, InputOutput, "Bus writer (mixing)");
        self.register(&REPLACE_OUT, InputOutput, "Bus writer (replacing)");
        self.register(&POLL, InputOutput, "Value poller");

        // Buffers
        self.register(&BUF_DUR, Buffer, "Buffer duration");
        self.register(&BUF_SAMPLE_RATE, Buffer, "Buffer sample rate");

        // Phase vocoder
        self.register(&IFFT, PhaseVocoder, "Inverse FFT");
        self.register(&PV_ADD, PhaseVocoder, "Complex addition");
        self.register(&PV_BIN_SCRAMBLE, PhaseVocoder, "Bin scrambler");
        self.register(&PV_MAG_FREEZE, PhaseVocoder, "Magnitude freeze");
        self.register(&PV_MAG_MUL, PhaseVocoder, "Magnitude multiply");
    }

    fn register_system(&mut self) {
        use UGenCategory::{Buffer, PhaseVocoder, System};

        self.register(&CONTROL, System, "Scalar and control-rate parameters");
        self.register(&AUDIO_CONTROL, System, "Audio-rate parameters");
        self.register(&TRIG_CONTROL, System, "Trigger parameters");
        self.register(&LAG_CONTROL, System, "Lagged control-rate parameters");
        self.register(&BINARY_OP_UGEN, System, "Two-operand math");
        self.register(&UNARY_OP_UGEN, System, "One-operand math");
        self.register(&SUM3, System, "Three-input sum");
        self.register(&SUM4, System, "Four-input sum");
        self.register(&LOCAL_BUF, Buffer, "Synth-local scratch buffer");
        self.register(&MAX_LOCAL_BUFS, Buffer, "Local buffer count");
        self.register(&BUF_FRAMES, Buffer, "Buffer frame count");
        self.register(&FFT, PhaseVocoder, "Forward FFT");
        self.register(&PV_COPY, PhaseVocoder, "FFT chain copy");
    }

    /// Register a kind. A later registration under the same name wins.
    pub fn register(
        &mut self,
        kind: &'static UGenKind,
        category: UGenCategory,
        description: &'static str,
    ) {
        self.entries.retain(|entry| entry.kind.name != kind.name);
        self.entries.push(UGenDescriptor {
            kind,
            category,
            description,
        });
    }

    /// Returns descriptors for all registered kinds.
    pub fn all(&self) -> &[UGenDescriptor] {
        &self.entries
    }

    /// Returns descriptors for kinds in a specific category.
    pub fn in_category(&self, category: UGenCategory) -> Vec<&UGenDescriptor> {
        self.entries
            .iter()
            .filter(|entry| entry.category == category)
            .collect()
    }

    /// Get a descriptor by type name.
    pub fn get(&self, name: &str) -> Option<&UGenDescriptor> {
        self.entries.iter().find(|entry| entry.kind.name == name)
    }

    /// Start constructing a node by type name.
    ///
    /// Returns `None` if the name is not registered. Rate support is checked
    /// when the call is built.
    pub fn create(&self, name: &str, rate: CalculationRate) -> Option<UGenCall> {
        self.get(name).map(|entry| entry.kind.call(rate))
    }

    /// Decode a buffer holding exactly one SynthDef.
    pub fn decompile_synthdef(&self, bytes: &[u8]) -> Result<SynthDef, CodecError> {
        scgraph_core::decompile_synthdef(bytes, self)
    }

    /// Decode a buffer holding any number of SynthDefs.
    pub fn decompile_synthdefs(&self, bytes: &[u8]) -> Result<Vec<SynthDef>, CodecError> {
        scgraph_core::decompile_synthdefs(bytes, self)
    }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UGenLookup for UGenRegistry {
    fn lookup(&self, name: &str) -> Option<&'static UGenKind> {
        self.get(name).map(|entry| entry.kind)
    }
}

/// Decode one SynthDef against the built-in registry.
pub fn decompile_synthdef(bytes: &[u8]) -> Result<SynthDef, CodecError> {
    UGenRegistry::new().decompile_synthdef(bytes)
}

/// Decode any number of SynthDefs against the built-in registry.
pub fn decompile_synthdefs(bytes: &[u8]) -> Result<Vec<SynthDef>, CodecError> {
    UGenRegistry::new().decompile_synthdefs(bytes)
}
