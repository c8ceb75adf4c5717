//! Breakpoint envelope descriptors.
//!
//! An [`Envelope`] serializes into the flat control array that `EnvGen`
//! reads through its unexpanded `envelope` input:
//!
//! ```text
//! [initial, segment_count, release_node | -99, loop_node | -99,
//!  amplitude, duration, shape, curvature,   // per segment
//!  ...]
//! ```

use crate::error::SynthDefError;
use crate::operable::{UGenOperable, UGenSerializable, UGenVector};

/// Marker written for an absent release or loop node.
const NO_NODE: f32 = -99.0;

/// Serialized form of [`Envelope::default`], for kinds whose envelope input
/// may be omitted.
pub const DEFAULT_ENVELOPE: &[f32] = &[
    0.0, 2.0, NO_NODE, NO_NODE, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0,
];

/// Segment interpolation shapes and their wire codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum EnvelopeShape {
    Step = 0,
    Linear = 1,
    Exponential = 2,
    Sine = 3,
    Welch = 4,
    Custom = 5,
    Squared = 6,
    Cubed = 7,
    Hold = 8,
}

impl EnvelopeShape {
    /// Wire code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Curve of one segment: a named shape or a numeric curvature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnvelopeCurve {
    /// A named shape, written with curvature 0.
    Shape(EnvelopeShape),
    /// A curvature, written with the custom shape.
    Curvature(f32),
}

impl From<EnvelopeShape> for EnvelopeCurve {
    fn from(shape: EnvelopeShape) -> Self {
        Self::Shape(shape)
    }
}

impl From<f32> for EnvelopeCurve {
    fn from(curvature: f32) -> Self {
        Self::Curvature(curvature)
    }
}

/// Actions the server takes when a node with a done flag finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum DoneAction {
    #[default]
    Nothing = 0,
    PauseSynth = 1,
    FreeSynth = 2,
    FreeSynthAndPrecedingNode = 3,
    FreeSynthAndFollowingNode = 4,
    FreeSynthAndFreeAllPrecedingNode = 5,
    FreeSynthAndFreeAllFollowingNode = 6,
    FreeSynthAndAllPrecedingNodesInGroup = 7,
    FreeSynthAndAllFollowingNodesInGroup = 8,
    FreeSynthAndPausePrecedingNode = 9,
    FreeSynthAndPauseFollowingNode = 10,
    FreeSynthAndDeepFreePrecedingNode = 11,
    FreeSynthAndDeepFreeFollowingNode = 12,
    FreeSynthAndAllSiblingNodes = 13,
    FreeSynthAndEnclosingGroup = 14,
}

impl DoneAction {
    /// Wire code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<DoneAction> for UGenOperable {
    fn from(action: DoneAction) -> Self {
        UGenOperable::constant(f32::from(action.code()))
    }
}

/// A breakpoint envelope.
///
/// `amplitudes` has one more entry than `durations`; curves cycle over the
/// segments.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    amplitudes: Vec<UGenOperable>,
    durations: Vec<UGenOperable>,
    curves: Vec<EnvelopeCurve>,
    release_node: Option<usize>,
    loop_node: Option<usize>,
    offset: UGenOperable,
}

impl Envelope {
    /// Creates an envelope from breakpoints.
    pub fn new<A, D>(
        amplitudes: impl IntoIterator<Item = A>,
        durations: impl IntoIterator<Item = D>,
        curves: impl IntoIterator<Item = EnvelopeCurve>,
    ) -> Result<Self, SynthDefError>
    where
        A: Into<UGenOperable>,
        D: Into<UGenOperable>,
    {
        let amplitudes: Vec<UGenOperable> = amplitudes.into_iter().map(Into::into).collect();
        let durations: Vec<UGenOperable> = durations.into_iter().map(Into::into).collect();
        let curves: Vec<EnvelopeCurve> = curves.into_iter().collect();
        if amplitudes.len() < 2 {
            return Err(SynthDefError::InvalidEnvelope("needs at least two amplitudes"));
        }
        if durations.len() + 1 != amplitudes.len() {
            return Err(SynthDefError::InvalidEnvelope(
                "needs exactly one duration per segment",
            ));
        }
        Ok(Self {
            amplitudes,
            durations,
            curves,
            release_node: None,
            loop_node: None,
            offset: UGenOperable::constant(0.0),
        })
    }

    /// Holds at breakpoint `node` until the gate closes.
    pub fn with_release_node(mut self, node: usize) -> Self {
        self.release_node = Some(node);
        self
    }

    /// Loops back to breakpoint `node` while the gate is open.
    pub fn with_loop_node(mut self, node: usize) -> Self {
        self.loop_node = Some(node);
        self
    }

    /// Sets the offset used by the interpolated form.
    pub fn with_offset(mut self, offset: impl Into<UGenOperable>) -> Self {
        self.offset = offset.into();
        self
    }

    /// Attack then release, with no sustain.
    pub fn percussive(
        attack_time: f32,
        release_time: f32,
        amplitude: f32,
        curve: EnvelopeCurve,
    ) -> Self {
        Self::preset(
            vec![0.0, amplitude, 0.0],
            vec![attack_time, release_time],
            curve,
        )
    }

    /// Attack, decay, sustain at `sustain * peak` until release.
    pub fn adsr(
        attack_time: f32,
        decay_time: f32,
        sustain: f32,
        release_time: f32,
        peak: f32,
        curve: EnvelopeCurve,
    ) -> Self {
        Self::preset(
            vec![0.0, peak, peak * sustain, 0.0],
            vec![attack_time, decay_time, release_time],
            curve,
        )
        .with_release_node(2)
    }

    /// Attack, sustain until release.
    pub fn asr(attack_time: f32, sustain: f32, release_time: f32, curve: EnvelopeCurve) -> Self {
        Self::preset(vec![0.0, sustain, 0.0], vec![attack_time, release_time], curve)
            .with_release_node(1)
    }

    /// Trapezoid: attack, fixed sustain time, release.
    pub fn linen(
        attack_time: f32,
        sustain_time: f32,
        release_time: f32,
        level: f32,
        curve: EnvelopeCurve,
    ) -> Self {
        Self::preset(
            vec![0.0, level, level, 0.0],
            vec![attack_time, sustain_time, release_time],
            curve,
        )
    }

    /// Symmetric rise and fall over `duration`.
    pub fn triangle(duration: f32, amplitude: f32) -> Self {
        let half = duration / 2.0;
        Self::preset(
            vec![0.0, amplitude, 0.0],
            vec![half, half],
            EnvelopeShape::Linear.into(),
        )
    }

    fn preset(amplitudes: Vec<f32>, durations: Vec<f32>, curve: EnvelopeCurve) -> Self {
        Self {
            amplitudes: amplitudes.into_iter().map(UGenOperable::constant).collect(),
            durations: durations.into_iter().map(UGenOperable::constant).collect(),
            curves: vec![curve],
            release_node: None,
            loop_node: None,
            offset: UGenOperable::constant(0.0),
        }
    }

    /// Breakpoint levels, initial level first.
    pub fn amplitudes(&self) -> &[UGenOperable] {
        &self.amplitudes
    }

    /// Segment durations.
    pub fn durations(&self) -> &[UGenOperable] {
        &self.durations
    }

    /// Curve of each segment, after cycling.
    pub fn curves(&self) -> Vec<EnvelopeCurve> {
        (0..self.segment_count()).map(|i| self.curve(i)).collect()
    }

    /// Release breakpoint, if any.
    pub fn release_node(&self) -> Option<usize> {
        self.release_node
    }

    /// Loop breakpoint, if any.
    pub fn loop_node(&self) -> Option<usize> {
        self.loop_node
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.durations.len()
    }

    fn curve(&self, segment: usize) -> EnvelopeCurve {
        if self.curves.is_empty() {
            return EnvelopeCurve::Shape(EnvelopeShape::Linear);
        }
        self.curves[segment % self.curves.len()]
    }

    fn shape_and_curvature(&self, segment: usize) -> (f32, f32) {
        match self.curve(segment) {
            EnvelopeCurve::Shape(shape) => (f32::from(shape.code()), 0.0),
            EnvelopeCurve::Curvature(value) => (f32::from(EnvelopeShape::Custom.code()), value),
        }
    }

    /// Form read by `IEnvGen`: offset, initial level, segment count, total
    /// duration, then per segment duration, shape, curvature and level.
    ///
    /// The total duration is only known for constant durations; otherwise
    /// it is written as 0.
    pub fn serialize_interpolated(&self) -> UGenVector {
        let total: f32 = self
            .durations
            .iter()
            .map(|duration| duration.as_constant().unwrap_or(0.0))
            .sum();
        let mut values = vec![
            self.offset.clone(),
            self.amplitudes[0].clone(),
            UGenOperable::constant(self.segment_count() as f32),
            UGenOperable::constant(total),
        ];
        for segment in 0..self.segment_count() {
            let (shape, curvature) = self.shape_and_curvature(segment);
            values.push(self.durations[segment].clone());
            values.push(UGenOperable::constant(shape));
            values.push(UGenOperable::constant(curvature));
            values.push(self.amplitudes[segment + 1].clone());
        }
        UGenVector::new(values)
    }
}

impl Default for Envelope {
    /// Linear rise from 0 to 1 and back over two seconds.
    fn default() -> Self {
        Self::preset(
            vec![0.0, 1.0, 0.0],
            vec![1.0, 1.0],
            EnvelopeShape::Linear.into(),
        )
    }
}

impl UGenSerializable for Envelope {
    fn serialize(&self) -> UGenVector {
        let node = |node: Option<usize>| UGenOperable::constant(node.map_or(NO_NODE, |n| n as f32));
        let mut values = vec![
            self.amplitudes[0].clone(),
            UGenOperable::constant(self.segment_count() as f32),
            node(self.release_node),
            node(self.loop_node),
        ];
        for segment in 0..self.segment_count() {
            let (shape, curvature) = self.shape_and_curvature(segment);
            values.push(self.amplitudes[segment + 1].clone());
            values.push(self.durations[segment].clone());
            values.push(UGenOperable::constant(shape));
            values.push(UGenOperable::constant(curvature));
        }
        UGenVector::new(values)
    }
}

impl From<&Envelope> for UGenOperable {
    fn from(envelope: &Envelope) -> Self {
        UGenOperable::Vector(envelope.serialize())
    }
}

impl From<Envelope> for UGenOperable {
    fn from(envelope: Envelope) -> Self {
        UGenOperable::from(&envelope)
    }
}
