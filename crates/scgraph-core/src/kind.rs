//! Node-kind descriptors.
//!
//! A [`UGenKind`] is the static description of one node type: its name, its
//! ordered input declarations, the rates it may run at, and the flags the
//! compiler cares about (purity, width-first scheduling, done flags). Kinds are
//! `const`-constructed and live in `static` items, so a whole catalog costs no
//! runtime setup.
//!
//! ```rust
//! use scgraph_core::{CalculationRate, InputDecl, UGenKind};
//!
//! static SIN_OSC: UGenKind = UGenKind::new("SinOsc")
//!     .inputs(&[
//!         InputDecl::new("frequency", 440.0),
//!         InputDecl::new("phase", 0.0),
//!     ])
//!     .rates(&[CalculationRate::Audio, CalculationRate::Control])
//!     .pure();
//!
//! assert_eq!(SIN_OSC.input_names().collect::<Vec<_>>(), ["frequency", "phase"]);
//! ```

use core::fmt;

use crate::rate::CalculationRate;

/// Declaration of one named input of a node kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputDecl {
    /// Input name, used as the keyword when constructing nodes.
    pub name: &'static str,
    /// Default value, or `None` if the caller must supply one.
    pub default: Option<f32>,
    /// Whether a vector value is passed through whole instead of expanded.
    pub unexpanded: bool,
    /// Whole-vector default for an unexpanded input.
    pub default_vector: Option<&'static [f32]>,
}

impl InputDecl {
    /// An input with a default value.
    pub const fn new(name: &'static str, default: f32) -> Self {
        Self {
            name,
            default: Some(default),
            unexpanded: false,
            default_vector: None,
        }
    }

    /// An input the caller must always supply.
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            unexpanded: false,
            default_vector: None,
        }
    }

    /// A variadic input that takes a whole vector, e.g. an envelope array.
    /// The caller must always supply it.
    pub const fn unexpanded(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            unexpanded: true,
            default_vector: None,
        }
    }

    /// A variadic input that falls back to `default` when omitted.
    pub const fn unexpanded_or(name: &'static str, default: &'static [f32]) -> Self {
        Self {
            name,
            default: None,
            unexpanded: true,
            default_vector: Some(default),
        }
    }
}

/// Role of a node kind in a phase-vocoder (FFT) chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PvRole {
    /// Not part of an FFT chain.
    #[default]
    None,
    /// Consumes and produces an FFT chain in place.
    Chain,
    /// Starts an FFT chain; its first input is the FFT buffer.
    Source,
}

/// Static description of one node type.
#[derive(Debug, Clone, Copy)]
pub struct UGenKind {
    /// Type name written to the wire format.
    pub name: &'static str,
    /// Ordered input declarations.
    pub inputs: &'static [InputDecl],
    /// Rates this kind may run at. Empty means any rate.
    pub rates: &'static [CalculationRate],
    /// Output count when the caller does not set one.
    pub channel_count: usize,
    /// Whether the caller may choose the output count.
    pub is_multichannel: bool,
    /// Side-effect free; eligible for dead-code elimination.
    pub is_pure: bool,
    /// Must be scheduled before every node constructed after it.
    pub is_width_first: bool,
    /// Sets a done flag readable by `Done`-style nodes.
    pub has_done_flag: bool,
    /// Reads from a bus.
    pub is_input: bool,
    /// Writes to a bus.
    pub is_output: bool,
    /// Phase-vocoder chain role.
    pub pv_role: PvRole,
}

impl UGenKind {
    /// A single-output kind with no inputs, valid at any rate.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            inputs: &[],
            rates: &[],
            channel_count: 1,
            is_multichannel: false,
            is_pure: false,
            is_width_first: false,
            has_done_flag: false,
            is_input: false,
            is_output: false,
            pv_role: PvRole::None,
        }
    }

    /// Sets the ordered input declarations.
    pub const fn inputs(mut self, inputs: &'static [InputDecl]) -> Self {
        self.inputs = inputs;
        self
    }

    /// Restricts the valid calculation rates.
    pub const fn rates(mut self, rates: &'static [CalculationRate]) -> Self {
        self.rates = rates;
        self
    }

    /// Sets a fixed output count.
    pub const fn channels(mut self, channel_count: usize) -> Self {
        self.channel_count = channel_count;
        self
    }

    /// Lets callers choose the output count, defaulting to `channel_count`.
    pub const fn multichannel(mut self, channel_count: usize) -> Self {
        self.channel_count = channel_count;
        self.is_multichannel = true;
        self
    }

    /// Marks the kind side-effect free.
    pub const fn pure(mut self) -> Self {
        self.is_pure = true;
        self
    }

    /// Marks the kind as a width-first scheduling barrier.
    pub const fn width_first(mut self) -> Self {
        self.is_width_first = true;
        self
    }

    /// Marks the kind as setting a done flag.
    pub const fn done_flag(mut self) -> Self {
        self.has_done_flag = true;
        self
    }

    /// Marks the kind as a bus reader.
    pub const fn input(mut self) -> Self {
        self.is_input = true;
        self
    }

    /// Marks the kind as a bus writer. Output nodes have no outputs.
    pub const fn output(mut self) -> Self {
        self.is_output = true;
        self.channel_count = 0;
        self
    }

    /// Makes the kind an FFT chain member. Chain members are width-first.
    pub const fn pv_chain(mut self) -> Self {
        self.pv_role = PvRole::Chain;
        self.is_width_first = true;
        self
    }

    /// Makes the kind an FFT chain source. Sources are width-first.
    pub const fn pv_source(mut self) -> Self {
        self.pv_role = PvRole::Source;
        self.is_width_first = true;
        self
    }

    /// Whether the kind may run at `rate`.
    pub fn supports_rate(&self, rate: CalculationRate) -> bool {
        self.rates.is_empty() || self.rates.contains(&rate)
    }

    /// Looks up an input declaration by name.
    pub fn input_decl(&self, name: &str) -> Option<&'static InputDecl> {
        self.inputs.iter().find(|decl| decl.name == name)
    }

    /// Input names in declaration order.
    pub fn input_names(&self) -> impl Iterator<Item = &'static str> {
        self.inputs.iter().map(|decl| decl.name)
    }

    /// Whether `name` is an unexpanded (variadic) input.
    pub fn is_unexpanded(&self, name: &str) -> bool {
        self.input_decl(name).is_some_and(|decl| decl.unexpanded)
    }

    /// Whether nodes of this kind take part in FFT chains.
    pub fn is_pv(&self) -> bool {
        self.pv_role != PvRole::None
    }
}

impl PartialEq for UGenKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for UGenKind {}

impl fmt::Display for UGenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
