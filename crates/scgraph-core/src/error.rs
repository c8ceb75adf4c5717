//! Error types for graph construction and the binary codec.

use thiserror::Error;

use crate::rate::CalculationRate;
use crate::ugen::ScopeId;

/// Errors raised while constructing or finalizing a graph.
#[derive(Debug, Error)]
pub enum SynthDefError {
    /// A node input references a node from another builder scope.
    #[error("UGen input in different scope: expected {expected}, found {found}")]
    ScopeViolation {
        /// Scope of the builder receiving the node.
        expected: ScopeId,
        /// Scope of the referenced output.
        found: ScopeId,
    },

    /// A node or parameter was constructed with no builder active.
    #[error("no active SynthDefBuilder for {0}")]
    NoActiveBuilder(String),

    /// An input value has a shape the node cannot take.
    #[error("malformed input '{key}' for {ugen}: {reason}")]
    MalformedExpansion {
        /// Node kind being constructed.
        ugen: &'static str,
        /// Offending input key.
        key: String,
        /// What was wrong with the value.
        reason: &'static str,
    },

    /// A required input was not supplied.
    #[error("missing required input '{key}' for {ugen}")]
    MissingInput {
        /// Node kind being constructed.
        ugen: &'static str,
        /// Missing key.
        key: &'static str,
    },

    /// An input key is not declared by the node kind.
    #[error("unknown input '{key}' for {ugen}")]
    UnknownInput {
        /// Node kind being constructed.
        ugen: &'static str,
        /// Undeclared key.
        key: String,
    },

    /// The node kind cannot run at the requested rate.
    #[error("{ugen} does not support rate {rate}")]
    InvalidRate {
        /// Node kind being constructed.
        ugen: &'static str,
        /// Requested rate.
        rate: CalculationRate,
    },

    /// A fixed-width node kind was given an output count.
    #[error("{ugen} has a fixed channel count")]
    FixedChannelCount {
        /// Node kind being constructed.
        ugen: &'static str,
    },

    /// A parameter with this name was already declared.
    #[error("duplicate parameter name: {0}")]
    DuplicateParameter(String),

    /// A parameter declaration is unusable.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Envelope breakpoints do not line up.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(&'static str),

    /// A finalized node references a node that is not part of the graph.
    #[error("{ugen} references a node outside the graph")]
    DetachedInput {
        /// Consuming node kind.
        ugen: &'static str,
    },

    /// The graph has no nodes to finalize.
    #[error("no UGens provided")]
    EmptyGraph,

    /// The dependency graph contains a cycle.
    #[error("graph contains a cycle")]
    CycleDetected,

    /// An FFT chain could not be traced back to its source.
    #[error("invalid FFT chain at {0}")]
    InvalidAnalysisChain(&'static str),

    /// Binary encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors raised by the SCgf encoder and decoder.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The buffer does not start with `SCgf`.
    #[error("bad magic bytes: expected SCgf, found {0:?}")]
    BadMagic([u8; 4]),

    /// The container version is not 2.
    #[error("unsupported SCgf version {0}")]
    UnsupportedVersion(u32),

    /// The buffer ended in the middle of a record.
    #[error("truncated SynthDef data")]
    Truncated,

    /// A length-prefixed string is not ASCII.
    #[error("invalid string at byte offset {0}")]
    InvalidString(u64),

    /// A string to encode contains non-ASCII characters.
    #[error("string is not ASCII: {0}")]
    NonAscii(String),

    /// A string is too long for its one-byte length prefix.
    #[error("string too long to encode ({len} bytes): {value}")]
    StringTooLong {
        /// The string.
        value: String,
        /// Its length in bytes.
        len: usize,
    },

    /// A node record names a kind missing from the registry.
    #[error("unknown UGen type: {0}")]
    UnknownUGen(String),

    /// A rate byte is out of range.
    #[error("invalid calculation rate {rate} for {ugen}")]
    InvalidRate {
        /// Node type name.
        ugen: String,
        /// The raw rate byte.
        rate: u8,
    },

    /// An input references a constant past the end of the pool.
    #[error("constant index {index} out of range ({count} constants)")]
    ConstantIndexOutOfRange {
        /// Referenced index.
        index: u32,
        /// Pool size.
        count: usize,
    },

    /// An input references a node at or after the consumer.
    #[error("node {node} references node {input} that is not decoded yet")]
    ForwardReference {
        /// Consuming node index.
        node: usize,
        /// Referenced node index.
        input: u32,
    },

    /// An input references an output the producer does not have.
    #[error("node {node} references output {output} of a node with {count} outputs")]
    OutputIndexOutOfRange {
        /// Producing node index.
        node: u32,
        /// Referenced output.
        output: u32,
        /// Producer output count.
        count: usize,
    },

    /// The single-SynthDef entry point saw another count.
    #[error("expected exactly 1 SynthDef, found {0}")]
    UnexpectedSynthDefCount(usize),

    /// A special index does not fit the two-byte field.
    #[error("special index {index} of {ugen} does not fit in 16 bits")]
    SpecialIndexOutOfRange {
        /// Node type name.
        ugen: &'static str,
        /// Offending value.
        index: usize,
    },

    /// The parameter table does not match the Control nodes.
    #[error("inconsistent parameter table: {0}")]
    ParameterTable(String),

    /// Reading or writing the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// A count exceeds what the format can hold.
    #[error("too many {what} to encode: {count}")]
    TooMany {
        /// What was counted.
        what: &'static str,
        /// The count.
        count: usize,
    },
}

impl From<std::io::Error> for CodecError {
    fn from(error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(error)
        }
    }
}
