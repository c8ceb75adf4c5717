//! Node kinds the compiler synthesizes itself.
//!
//! Operators, the Control family, scratch buffers and the FFT copy nodes are
//! created by the build pipeline rather than by user code, so the core has to
//! know them. Every other kind comes from a catalog such as `scgraph-registry`.

use crate::kind::{InputDecl, UGenKind};
use crate::rate::CalculationRate::{Audio, Control, Scalar};

/// Placeholder node for a declared parameter. Never encoded.
pub static PARAMETER: UGenKind = UGenKind::new("Parameter").multichannel(1);

/// Packs scalar-rate (`ir`) and control-rate (`kr`) parameters.
pub static CONTROL: UGenKind = UGenKind::new("Control")
    .rates(&[Scalar, Control])
    .multichannel(1);

/// Packs audio-rate parameters.
pub static AUDIO_CONTROL: UGenKind = UGenKind::new("AudioControl")
    .rates(&[Audio])
    .multichannel(1);

/// Packs trigger parameters.
pub static TRIG_CONTROL: UGenKind = UGenKind::new("TrigControl")
    .rates(&[Control])
    .multichannel(1);

/// Packs control-rate parameters when any of them is lagged.
pub static LAG_CONTROL: UGenKind = UGenKind::new("LagControl")
    .inputs(&[InputDecl::unexpanded("lags")])
    .rates(&[Control])
    .multichannel(1);

/// Two-operand math.
pub static BINARY_OP_UGEN: UGenKind = UGenKind::new("BinaryOpUGen")
    .inputs(&[InputDecl::required("left"), InputDecl::required("right")])
    .pure();

/// One-operand math.
pub static UNARY_OP_UGEN: UGenKind = UGenKind::new("UnaryOpUGen")
    .inputs(&[InputDecl::required("source")])
    .pure();

/// Three-input sum.
pub static SUM3: UGenKind = UGenKind::new("Sum3")
    .inputs(&[
        InputDecl::required("input_one"),
        InputDecl::required("input_two"),
        InputDecl::required("input_three"),
    ])
    .pure();

/// Four-input sum.
pub static SUM4: UGenKind = UGenKind::new("Sum4")
    .inputs(&[
        InputDecl::required("input_one"),
        InputDecl::required("input_two"),
        InputDecl::required("input_three"),
        InputDecl::required("input_four"),
    ])
    .pure();

/// Synth-local scratch buffer. The third input is rewritten at build time
/// to the graph's single [`MAX_LOCAL_BUFS`] node.
pub static LOCAL_BUF: UGenKind = UGenKind::new("LocalBuf")
    .inputs(&[
        InputDecl::new("channel_count", 1.0),
        InputDecl::new("frame_count", 1.0),
        InputDecl::new("maximum_local_buffers", 0.0),
    ])
    .rates(&[Scalar])
    .width_first();

/// Declares how many [`LOCAL_BUF`] nodes a graph allocates.
pub static MAX_LOCAL_BUFS: UGenKind = UGenKind::new("MaxLocalBufs")
    .inputs(&[InputDecl::new("maximum", 0.0)])
    .rates(&[Scalar]);

/// Frame count of a buffer.
pub static BUF_FRAMES: UGenKind = UGenKind::new("BufFrames")
    .inputs(&[InputDecl::required("buffer_id")])
    .rates(&[Scalar, Control]);

/// Forward FFT; starts a phase-vocoder chain.
pub static FFT: UGenKind = UGenKind::new("FFT")
    .inputs(&[
        InputDecl::required("buffer_id"),
        InputDecl::required("source"),
        InputDecl::new("hop", 0.5),
        InputDecl::new("window_type", 0.0),
        InputDecl::new("active", 1.0),
        InputDecl::new("window_size", 0.0),
    ])
    .rates(&[Control])
    .pv_source();

/// Copies one FFT chain buffer into another.
pub static PV_COPY: UGenKind = UGenKind::new("PV_Copy")
    .inputs(&[
        InputDecl::required("pv_chain_a"),
        InputDecl::required("pv_chain_b"),
    ])
    .rates(&[Control])
    .pv_chain();

/// Every kind defined here that can appear in an encoded graph.
pub static SYSTEM_KINDS: &[&UGenKind] = &[
    &CONTROL,
    &AUDIO_CONTROL,
    &TRIG_CONTROL,
    &LAG_CONTROL,
    &BINARY_OP_UGEN,
    &UNARY_OP_UGEN,
    &SUM3,
    &SUM4,
    &LOCAL_BUF,
    &MAX_LOCAL_BUFS,
    &BUF_FRAMES,
    &FFT,
    &PV_COPY,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_kind_names_are_unique() {
        for (i, a) in SYSTEM_KINDS.iter().enumerate() {
            for b in &SYSTEM_KINDS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_fft_chain_kinds_are_width_first() {
        assert!(FFT.is_width_first);
        assert!(PV_COPY.is_width_first);
        assert!(LOCAL_BUF.is_width_first);
        assert!(!MAX_LOCAL_BUFS.is_width_first);
    }

    #[test]
    fn test_operators_are_pure() {
        assert!(BINARY_OP_UGEN.is_pure);
        assert!(UNARY_OP_UGEN.is_pure);
        assert!(!CONTROL.is_pure);
    }
}
