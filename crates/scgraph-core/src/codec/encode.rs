//! SCgf encoder.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use super::{CONSTANT_INPUT, MAGIC, VERSION, same_constant};
use crate::error::CodecError;
use crate::synthdef::SynthDef;
use crate::ugen::{Parameter, UGen, UGenScalar};

/// Encodes any number of SynthDefs into one SCgf file.
///
/// With `use_anonymous_names`, every SynthDef is written under its anonymous
/// (content-hash) name even if it has an explicit one.
pub fn compile_synthdefs(
    synthdefs: &[&SynthDef],
    use_anonymous_names: bool,
) -> Result<Vec<u8>, CodecError> {
    let count = u16::try_from(synthdefs.len()).map_err(|_| CodecError::TooMany {
        what: "SynthDefs",
        count: synthdefs.len(),
    })?;

    let mut out = Vec::new();
    out.write_all(&MAGIC)?;
    out.write_u32::<BigEndian>(VERSION)?;
    out.write_u16::<BigEndian>(count)?;
    for synthdef in synthdefs {
        let name = if use_anonymous_names {
            synthdef.anonymous_name()
        } else {
            synthdef.effective_name()
        };
        write_pstring(&mut out, name)?;
        out.extend_from_slice(&encode_graph(
            synthdef.ugens(),
            synthdef.constants(),
            synthdef.parameters(),
        )?);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "compile_synthdefs: {} synthdefs, {} bytes",
        synthdefs.len(),
        out.len()
    );

    Ok(out)
}

/// Encodes one SynthDef record without its leading name.
///
/// This is also the input to the anonymous-name digest.
pub(crate) fn encode_graph(
    ugens: &[UGen],
    constants: &[f32],
    parameters: &[(Parameter, usize)],
) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();

    write_count(&mut out, constants.len(), "constants")?;
    for &constant in constants {
        out.write_f32::<BigEndian>(constant)?;
    }

    let initial_values: usize = parameters.iter().map(|(p, _)| p.len()).sum();
    write_count(&mut out, initial_values, "initial control values")?;
    for (parameter, _) in parameters {
        for &value in &parameter.value {
            out.write_f32::<BigEndian>(value)?;
        }
    }

    write_count(&mut out, parameters.len(), "parameters")?;
    for (parameter, index) in parameters {
        write_pstring(&mut out, &parameter.name)?;
        write_count(&mut out, *index, "parameter index")?;
    }

    write_count(&mut out, ugens.len(), "UGens")?;
    for ugen in ugens {
        write_ugen(&mut out, ugen, constants)?;
    }

    // Variants are never written.
    out.write_u16::<BigEndian>(0)?;
    Ok(out)
}

fn write_ugen(out: &mut Vec<u8>, ugen: &UGen, constants: &[f32]) -> Result<(), CodecError> {
    write_pstring(out, ugen.name())?;
    out.write_u8(ugen.rate.code())?;
    write_count(out, ugen.inputs.len(), "inputs")?;
    write_count(out, ugen.output_count, "outputs")?;
    out.write_u16::<BigEndian>(ugen.special_index)?;
    for input in &ugen.inputs {
        match input {
            UGenScalar::Constant(value) => {
                let index = constants
                    .iter()
                    .position(|&c| same_constant(c, *value))
                    .ok_or_else(|| CodecError::ConstantIndexOutOfRange {
                        index: CONSTANT_INPUT,
                        count: constants.len(),
                    })?;
                out.write_u32::<BigEndian>(CONSTANT_INPUT)?;
                write_count(out, index, "constant index")?;
            }
            UGenScalar::Output(proxy) => {
                out.write_u32::<BigEndian>(proxy.node.index())?;
                out.write_u32::<BigEndian>(proxy.index)?;
            }
        }
    }
    for _ in 0..ugen.output_count {
        out.write_u8(ugen.rate.code())?;
    }
    Ok(())
}

fn write_count(out: &mut Vec<u8>, count: usize, what: &'static str) -> Result<(), CodecError> {
    let count32 = u32::try_from(count).map_err(|_| CodecError::TooMany { what, count })?;
    out.write_u32::<BigEndian>(count32)?;
    Ok(())
}

fn write_pstring(out: &mut Vec<u8>, value: &str) -> Result<(), CodecError> {
    if !value.is_ascii() {
        return Err(CodecError::NonAscii(value.to_string()));
    }
    let len = u8::try_from(value.len()).map_err(|_| CodecError::StringTooLong {
        value: value.to_string(),
        len: value.len(),
    })?;
    out.write_u8(len)?;
    out.write_all(value.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pstring_layout() {
        let mut out = Vec::new();
        write_pstring(&mut out, "Out").unwrap();
        assert_eq!(out, [3, b'O', b'u', b't']);
    }

    #[test]
    fn test_pstring_rejects_long_and_non_ascii() {
        let mut out = Vec::new();
        let long = "x".repeat(256);
        assert!(matches!(
            write_pstring(&mut out, &long),
            Err(CodecError::StringTooLong { len: 256, .. })
        ));
        assert!(matches!(
            write_pstring(&mut out, "säge"),
            Err(CodecError::NonAscii(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_graph_body() {
        let body = encode_graph(&[], &[], &[]).unwrap();
        assert_eq!(body, [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_parameters_write_values_and_table() {
        let parameters = vec![
            (Parameter::new("amp", 0.5), 0),
            (Parameter::vector("freq", [440.0, 443.0]), 1),
        ];
        let body = encode_graph(&[], &[], &parameters).unwrap();
        let mut expected = vec![0, 0, 0, 0, 0, 0, 0, 3];
        expected.extend_from_slice(&0.5f32.to_be_bytes());
        expected.extend_from_slice(&440.0f32.to_be_bytes());
        expected.extend_from_slice(&443.0f32.to_be_bytes());
        expected.extend_from_slice(&[0, 0, 0, 2]);
        expected.extend_from_slice(&[3, b'a', b'm', b'p', 0, 0, 0, 0]);
        expected.extend_from_slice(&[4, b'f', b'r', b'e', b'q', 0, 0, 0, 1]);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        assert_eq!(body, expected);
    }
}
