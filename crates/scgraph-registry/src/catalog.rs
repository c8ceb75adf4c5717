//! Static node kinds known to the registry.
//!
//! Each declaration mirrors the server plugin's input order; defaults are the
//! values sclang uses when an argument is omitted.

use scgraph_core::CalculationRate::{Audio, Control, Scalar};
use scgraph_core::{CalculationRate, DEFAULT_ENVELOPE, InputDecl, UGenKind};

const AR_KR: &[CalculationRate] = &[Audio, Control];
const IR_KR: &[CalculationRate] = &[Scalar, Control];

// ============================================================================
// Oscillators
// ============================================================================

/// Sine oscillator.
pub static SIN_OSC: UGenKind = UGenKind::new("SinOsc")
    .inputs(&[InputDecl::new("frequency", 440.0), InputDecl::new("phase", 0.0)])
    .rates(AR_KR)
    .pure();

/// Band-limited sawtooth.
pub static SAW: UGenKind = UGenKind::new("Saw")
    .inputs(&[InputDecl::new("frequency", 440.0)])
    .rates(AR_KR)
    .pure();

/// Non-band-limited sawtooth.
pub static LF_SAW: UGenKind = UGenKind::new("LFSaw")
    .inputs(&[
        InputDecl::new("frequency", 440.0),
        InputDecl::new("initial_phase", 0.0),
    ])
    .rates(AR_KR)
    .pure();

/// Single-sample impulse train.
pub static IMPULSE: UGenKind = UGenKind::new("Impulse")
    .inputs(&[InputDecl::new("frequency", 440.0), InputDecl::new("phase", 0.0)])
    .rates(AR_KR)
    .pure();

/// Constant signal.
pub static DC: UGenKind = UGenKind::new("DC")
    .inputs(&[InputDecl::required("source")])
    .rates(AR_KR)
    .multichannel(1)
    .pure();

// ============================================================================
// Noise
// ============================================================================

/// White noise.
pub static WHITE_NOISE: UGenKind = UGenKind::new("WhiteNoise").rates(AR_KR);

/// Pink (1/f) noise.
pub static PINK_NOISE: UGenKind = UGenKind::new("PinkNoise").rates(AR_KR);

// ============================================================================
// Filters
// ============================================================================

/// Second-order Butterworth lowpass.
pub static LPF: UGenKind = UGenKind::new("LPF")
    .inputs(&[InputDecl::required("source"), InputDecl::new("frequency", 440.0)])
    .rates(AR_KR)
    .pure();

/// Second-order Butterworth highpass.
pub static HPF: UGenKind = UGenKind::new("HPF")
    .inputs(&[InputDecl::required("source"), InputDecl::new("frequency", 440.0)])
    .rates(AR_KR)
    .pure();

/// Exponential lag.
pub static LAG: UGenKind = UGenKind::new("Lag")
    .inputs(&[InputDecl::required("source"), InputDecl::new("lag_time", 0.1)])
    .rates(AR_KR)
    .pure();

/// Exponential attack and decay.
pub static DECAY2: UGenKind = UGenKind::new("Decay2")
    .inputs(&[
        InputDecl::required("source"),
        InputDecl::new("attack_time", 0.01),
        InputDecl::new("decay_time", 1.0),
    ])
    .rates(AR_KR)
    .pure();

// ============================================================================
// Delays
// ============================================================================

/// Delay line with cubic interpolation.
pub static DELAY_C: UGenKind = UGenKind::new("DelayC")
    .inputs(&[
        InputDecl::required("source"),
        InputDecl::new("maximum_delay_time", 0.2),
        InputDecl::new("delay_time", 0.2),
    ])
    .rates(AR_KR)
    .pure();

/// Comb filter with cubic interpolation.
pub static COMB_C: UGenKind = UGenKind::new("CombC")
    .inputs(&[
        InputDecl::required("source"),
        InputDecl::new("maximum_delay_time", 0.2),
        InputDecl::new("delay_time", 0.2),
        InputDecl::new("decay_time", 1.0),
    ])
    .rates(AR_KR)
    .pure();

// ============================================================================
// Envelopes
// ============================================================================

/// Envelope generator. The `envelope` input takes a serialized
/// [`Envelope`](scgraph_core::Envelope) and defaults to the 0→1→0 envelope.
pub static ENV_GEN: UGenKind = UGenKind::new("EnvGen")
    .inputs(&[
        InputDecl::new("gate", 1.0),
        InputDecl::new("level_scale", 1.0),
        InputDecl::new("level_bias", 0.0),
        InputDecl::new("time_scale", 1.0),
        InputDecl::new("done_action", 0.0),
        InputDecl::unexpanded_or("envelope", DEFAULT_ENVELOPE),
    ])
    .rates(AR_KR)
    .done_flag();

/// Linear ramp.
pub static LINE: UGenKind = UGenKind::new("Line")
    .inputs(&[
        InputDecl::new("start", 0.0),
        InputDecl::new("stop", 1.0),
        InputDecl::new("duration", 1.0),
        InputDecl::new("done_action", 0.0),
    ])
    .rates(AR_KR)
    .done_flag();

/// Exponential ramp.
pub static X_LINE: UGenKind = UGenKind::new("XLine")
    .inputs(&[
        InputDecl::new("start", 1.0),
        InputDecl::new("stop", 2.0),
        InputDecl::new("duration", 1.0),
        InputDecl::new("done_action", 0.0),
    ])
    .rates(AR_KR)
    .done_flag();

/// Reads the done flag of another node.
pub static DONE: UGenKind = UGenKind::new("Done")
    .inputs(&[InputDecl::required("source")])
    .rates(&[Control]);

/// Frees the enclosing synth on a trigger.
pub static FREE_SELF: UGenKind = UGenKind::new("FreeSelf")
    .inputs(&[InputDecl::required("trigger")])
    .rates(&[Control]);

// ============================================================================
// Panning
// ============================================================================

/// Equal-power stereo panner.
pub static PAN2: UGenKind = UGenKind::new("Pan2")
    .inputs(&[
        InputDecl::required("source"),
        InputDecl::new("position", 0.0),
        InputDecl::new("level", 1.0),
    ])
    .rates(AR_KR)
    .channels(2);

// ============================================================================
// Bus I/O
// ============================================================================

/// Reads consecutive buses.
pub static IN: UGenKind = UGenKind::new("In")
    .inputs(&[InputDecl::new("bus", 0.0)])
    .rates(AR_KR)
    .multichannel(1)
    .input();

/// Mixes into consecutive buses.
pub static OUT: UGenKind = UGenKind::new("Out")
    .inputs(&[InputDecl::new("bus", 0.0), InputDecl::unexpanded("source")])
    .rates(AR_KR)
    .output();

/// Overwrites consecutive buses.
pub static REPLACE_OUT: UGenKind = UGenKind::new("ReplaceOut")
    .inputs(&[InputDecl::new("bus", 0.0), InputDecl::unexpanded("source")])
    .rates(AR_KR)
    .output();

/// Posts or sends a value whenever the trigger fires.
pub static POLL: UGenKind = UGenKind::new("Poll")
    .inputs(&[
        InputDecl::required("trigger"),
        InputDecl::required("source"),
        InputDecl::new("trigger_id", -1.0),
        InputDecl::unexpanded("label"),
    ])
    .rates(AR_KR);

// ============================================================================
// Buffer info
// ============================================================================

/// Buffer duration in seconds.
pub static BUF_DUR: UGenKind = UGenKind::new("BufDur")
    .inputs(&[InputDecl::required("buffer_id")])
    .rates(IR_KR);

/// Buffer sample rate.
pub static BUF_SAMPLE_RATE: UGenKind = UGenKind::new("BufSampleRate")
    .inputs(&[InputDecl::required("buffer_id")])
    .rates(IR_KR);

// ============================================================================
// Phase vocoder
// ============================================================================

/// Inverse FFT; ends a phase-vocoder chain.
pub static IFFT: UGenKind = UGenKind::new("IFFT")
    .inputs(&[
        InputDecl::required("pv_chain"),
        InputDecl::new("window_type", 0.0),
        InputDecl::new("window_size", 0.0),
    ])
    .rates(AR_KR)
    .width_first();

/// Complex addition of two chains.
pub static PV_ADD: UGenKind = UGenKind::new("PV_Add")
    .inputs(&[
        InputDecl::required("pv_chain_a"),
        InputDecl::required("pv_chain_b"),
    ])
    .rates(&[Control])
    .pv_chain();

/// Randomizes bin order.
pub static PV_BIN_SCRAMBLE: UGenKind = UGenKind::new("PV_BinScramble")
    .inputs(&[
        InputDecl::required("pv_chain"),
        InputDecl::new("wipe", 0.0),
        InputDecl::new("width", 0.2),
        InputDecl::new("trigger", 0.0),
    ])
    .rates(&[Control])
    .pv_chain();

/// Holds magnitudes while `freeze` is positive.
pub static PV_MAG_FREEZE: UGenKind = UGenKind::new("PV_MagFreeze")
    .inputs(&[InputDecl::required("pv_chain"), InputDecl::new("freeze", 0.0)])
    .rates(&[Control])
    .pv_chain();

/// Multiplies magnitudes of two chains.
pub static PV_MAG_MUL: UGenKind = UGenKind::new("PV_MagMul")
    .inputs(&[
        InputDecl::required("pv_chain_a"),
        InputDecl::required("pv_chain_b"),
    ])
    .rates(&[Control])
    .pv_chain();
