//! The SCgf binary container.
//!
//! All integers and floats are big-endian. A file holds a header (`SCgf`,
//! version 2, SynthDef count) followed by one record per SynthDef: name,
//! constant pool, initial control values, parameter table, node records and a
//! variant count. Node records reference constants by pool index and other
//! nodes by position, so a file decodes in a single forward pass.

mod decode;
mod encode;

pub use decode::{decompile_synthdef, decompile_synthdefs};
pub use encode::compile_synthdefs;
pub(crate) use encode::encode_graph;

use crate::kind::UGenKind;

/// Container magic.
pub(crate) const MAGIC: [u8; 4] = *b"SCgf";

/// The only container version this codec reads or writes.
pub(crate) const VERSION: u32 = 2;

/// Input marker meaning "the next word is a constant-pool index".
pub(crate) const CONSTANT_INPUT: u32 = 0xFFFF_FFFF;

/// Resolves node type names found in encoded graphs.
///
/// Decoding is closed-world: a name the lookup does not know is rejected
/// with [`CodecError::UnknownUGen`](crate::CodecError::UnknownUGen).
pub trait UGenLookup {
    /// The kind registered under `name`.
    fn lookup(&self, name: &str) -> Option<&'static UGenKind>;
}

impl UGenLookup for [&'static UGenKind] {
    fn lookup(&self, name: &str) -> Option<&'static UGenKind> {
        self.iter().copied().find(|kind| kind.name == name)
    }
}

impl<const N: usize> UGenLookup for [&'static UGenKind; N] {
    fn lookup(&self, name: &str) -> Option<&'static UGenKind> {
        self.as_slice().lookup(name)
    }
}

impl<T: UGenLookup + ?Sized> UGenLookup for &T {
    fn lookup(&self, name: &str) -> Option<&'static UGenKind> {
        (**self).lookup(name)
    }
}

/// Whether two constants share a pool entry.
///
/// Pool entries compare by value, so `0.0` and `-0.0` share one. Every NaN
/// payload gets its own bit pattern compared exactly.
pub(crate) fn same_constant(a: f32, b: f32) -> bool {
    a == b || (a.is_nan() && b.is_nan() && a.to_bits() == b.to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{CONTROL, SYSTEM_KINDS};

    #[test]
    fn test_slice_lookup() {
        assert_eq!(SYSTEM_KINDS.lookup("Control"), Some(&CONTROL));
        assert!(SYSTEM_KINDS.lookup("SinOsc").is_none());
    }

    #[test]
    fn test_same_constant() {
        assert!(same_constant(0.0, -0.0));
        assert!(same_constant(f32::NAN, f32::NAN));
        assert!(!same_constant(1.0, 2.0));
    }
}
