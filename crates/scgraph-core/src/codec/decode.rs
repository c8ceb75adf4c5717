//! SCgf decoder.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use super::{CONSTANT_INPUT, MAGIC, UGenLookup, VERSION};
use crate::error::CodecError;
use crate::kind::UGenKind;
use crate::rate::{CalculationRate, ParameterRate};
use crate::synthdef::SynthDef;
use crate::system::{AUDIO_CONTROL, CONTROL, LAG_CONTROL, SYSTEM_KINDS, TRIG_CONTROL};
use crate::ugen::{
    InputKey, NodeId, OutputProxy, Parameter, Payload, ScopeId, UGen, UGenScalar,
};

/// Decodes every SynthDef in an SCgf file.
///
/// Node type names resolve through `lookup` first, then through the kinds
/// the compiler synthesizes itself (operators, Control family, ...).
pub fn decompile_synthdefs(
    bytes: &[u8],
    lookup: &dyn UGenLookup,
) -> Result<Vec<SynthDef>, CodecError> {
    let mut reader = Reader::new(bytes);

    let mut magic = [0u8; 4];
    reader.cursor.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CodecError::BadMagic(magic));
    }
    let version = reader.cursor.read_u32::<BigEndian>()?;
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let count = reader.cursor.read_u16::<BigEndian>()?;
    let synthdefs = (0..count)
        .map(|_| reader.synthdef(lookup))
        .collect::<Result<Vec<_>, _>>()?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "decompile_synthdefs: {} synthdefs from {} bytes",
        synthdefs.len(),
        bytes.len()
    );

    Ok(synthdefs)
}

/// Decodes an SCgf file that holds exactly one SynthDef.
pub fn decompile_synthdef(bytes: &[u8], lookup: &dyn UGenLookup) -> Result<SynthDef, CodecError> {
    let mut synthdefs = decompile_synthdefs(bytes, lookup)?;
    if synthdefs.len() != 1 {
        return Err(CodecError::UnexpectedSynthDefCount(synthdefs.len()));
    }
    Ok(synthdefs.remove(0))
}

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

/// One decoded parameter-table entry, before it is handed to its Control.
struct TableEntry {
    name: String,
    index: usize,
    values: Vec<f32>,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    fn count(&mut self) -> Result<usize, CodecError> {
        Ok(self.cursor.read_u32::<BigEndian>()? as usize)
    }

    fn pstring(&mut self) -> Result<String, CodecError> {
        let offset = self.cursor.position();
        let len = self.cursor.read_u8()?;
        let mut buf = vec![0u8; usize::from(len)];
        self.cursor.read_exact(&mut buf)?;
        if !buf.is_ascii() {
            return Err(CodecError::InvalidString(offset));
        }
        String::from_utf8(buf).map_err(|_| CodecError::InvalidString(offset))
    }

    fn floats(&mut self, count: usize) -> Result<Vec<f32>, CodecError> {
        let mut values = Vec::new();
        for _ in 0..count {
            values.push(self.cursor.read_f32::<BigEndian>()?);
        }
        Ok(values)
    }

    fn synthdef(&mut self, lookup: &dyn UGenLookup) -> Result<SynthDef, CodecError> {
        let name = self.pstring()?;

        let constant_count = self.count()?;
        let constants = self.floats(constant_count)?;
        let value_count = self.count()?;
        let values = self.floats(value_count)?;

        let parameter_count = self.count()?;
        let mut table = Vec::new();
        for _ in 0..parameter_count {
            let name = self.pstring()?;
            let index = self.count()?;
            table.push((name, index));
        }
        let mut entries = split_parameter_table(table, &values)?;

        let scope = ScopeId::next();
        let ugen_count = self.count()?;
        let mut ugens: Vec<UGen> = Vec::new();
        for position in 0..ugen_count {
            let ugen = self.ugen(position, scope, &constants, &ugens, lookup)?;
            let ugen = attach_parameters(ugen, &mut entries)?;

            #[cfg(feature = "tracing")]
            tracing::trace!(
                "decoded {} {}.{} ({} inputs)",
                position,
                ugen.name(),
                ugen.rate,
                ugen.inputs.len()
            );

            ugens.push(ugen);
        }
        if let Some(entry) = entries.first() {
            return Err(CodecError::ParameterTable(format!(
                "parameter '{}' is not covered by any Control",
                entry.name
            )));
        }

        let variant_count = self.cursor.read_u16::<BigEndian>()?;
        if variant_count > 0 {
            #[cfg(feature = "tracing")]
            tracing::warn!("{name}: skipping {variant_count} variants");
            for _ in 0..variant_count {
                self.pstring()?;
                self.floats(values.len())?;
            }
        }

        let synthdef = SynthDef::from_ugens(Some(name), ugens)?;
        Ok(synthdef.without_anonymous_name())
    }

    fn ugen(
        &mut self,
        position: usize,
        scope: ScopeId,
        constants: &[f32],
        decoded: &[UGen],
        lookup: &dyn UGenLookup,
    ) -> Result<UGen, CodecError> {
        let name = self.pstring()?;
        let kind = lookup
            .lookup(&name)
            .or_else(|| SYSTEM_KINDS.lookup(&name))
            .ok_or_else(|| CodecError::UnknownUGen(name.clone()))?;

        let rate_code = self.cursor.read_u8()?;
        let rate = CalculationRate::from_code(rate_code).ok_or_else(|| CodecError::InvalidRate {
            ugen: name.clone(),
            rate: rate_code,
        })?;
        let input_count = self.count()?;
        let output_count = self.count()?;
        let special_index = self.cursor.read_u16::<BigEndian>()?;

        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let first = self.cursor.read_u32::<BigEndian>()?;
            let second = self.cursor.read_u32::<BigEndian>()?;
            if first == CONSTANT_INPUT {
                let value = constants.get(second as usize).copied().ok_or(
                    CodecError::ConstantIndexOutOfRange {
                        index: second,
                        count: constants.len(),
                    },
                )?;
                inputs.push(UGenScalar::Constant(value));
                continue;
            }
            let producer = decoded
                .get(first as usize)
                .ok_or(CodecError::ForwardReference {
                    node: position,
                    input: first,
                })?;
            if second as usize >= producer.output_count {
                return Err(CodecError::OutputIndexOutOfRange {
                    node: first,
                    output: second,
                    count: producer.output_count,
                });
            }
            inputs.push(UGenScalar::Output(OutputProxy {
                scope,
                node: NodeId(first),
                index: second,
                rate: producer.rate,
            }));
        }
        for _ in 0..output_count {
            self.cursor.read_u8()?;
        }

        Ok(UGen {
            kind,
            rate,
            special_index,
            input_keys: input_keys(kind, inputs.len()),
            inputs,
            output_count,
            scope,
            payload: Payload::None,
        })
    }
}

/// Pairs each table entry with its slice of initial values.
///
/// Entries are ordered by index; each one extends to the next entry's index
/// or to the end of the values.
fn split_parameter_table(
    mut table: Vec<(String, usize)>,
    values: &[f32],
) -> Result<Vec<TableEntry>, CodecError> {
    table.sort_by_key(|(_, index)| *index);
    let mut entries = Vec::with_capacity(table.len());
    for (i, (name, index)) in table.iter().enumerate() {
        let end = table.get(i + 1).map_or(values.len(), |(_, next)| *next);
        if *index >= end || end > values.len() {
            return Err(CodecError::ParameterTable(format!(
                "parameter '{name}' at index {index} has no values"
            )));
        }
        entries.push(TableEntry {
            name: name.clone(),
            index: *index,
            values: values[*index..end].to_vec(),
        });
    }
    Ok(entries)
}

/// Hands a Control-family node the table entries covering its slots.
fn attach_parameters(mut ugen: UGen, entries: &mut Vec<TableEntry>) -> Result<UGen, CodecError> {
    let rate = match ugen.kind {
        kind if *kind == TRIG_CONTROL => ParameterRate::Trigger,
        kind if *kind == AUDIO_CONTROL => ParameterRate::Audio,
        kind if *kind == LAG_CONTROL => ParameterRate::Control,
        kind if *kind == CONTROL && ugen.rate == CalculationRate::Scalar => ParameterRate::Scalar,
        kind if *kind == CONTROL => ParameterRate::Control,
        _ => return Ok(ugen),
    };

    let start = usize::from(ugen.special_index);
    let end = start + ugen.output_count;
    let mut parameters = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let position = entries
            .iter()
            .position(|entry| entry.index == cursor)
            .ok_or_else(|| {
                CodecError::ParameterTable(format!(
                    "{} slot {cursor} does not start a parameter",
                    ugen.kind.name
                ))
            })?;
        let entry = entries.remove(position);
        let width = entry.values.len();
        if cursor + width > end {
            return Err(CodecError::ParameterTable(format!(
                "parameter '{}' overruns {}",
                entry.name, ugen.kind.name
            )));
        }
        let lag = if *ugen.kind == LAG_CONTROL {
            ugen.inputs
                .get(cursor - start)
                .and_then(UGenScalar::as_constant)
                .filter(|&lag| lag != 0.0)
        } else {
            None
        };
        parameters.push(Parameter {
            name: entry.name,
            value: entry.values,
            rate,
            lag,
        });
        cursor += width;
    }
    ugen.payload = Payload::Control(parameters);
    Ok(ugen)
}

/// Names decoded inputs after the kind's declarations.
///
/// An unexpanded declaration absorbs every input not claimed by the
/// declarations after it. Inputs past the declarations become extras.
fn input_keys(kind: &UGenKind, input_count: usize) -> Vec<InputKey> {
    let mut keys = Vec::with_capacity(input_count);
    for (i, decl) in kind.inputs.iter().enumerate() {
        let remaining = input_count - keys.len();
        if decl.unexpanded {
            let reserved = kind.inputs.len() - i - 1;
            let width = remaining.saturating_sub(reserved);
            keys.extend((0..width).map(|n| InputKey::Indexed(decl.name, n)));
        } else if remaining > 0 {
            keys.push(InputKey::Named(decl.name));
        }
    }
    let declared = keys.len();
    keys.extend((declared..input_count).map(InputKey::Extra));
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::InputDecl;

    static ENV_GEN: UGenKind = UGenKind::new("EnvGen").inputs(&[
        InputDecl::new("gate", 1.0),
        InputDecl::new("level_scale", 1.0),
        InputDecl::unexpanded("envelope"),
    ]);

    #[test]
    fn test_input_keys_fill_unexpanded_tail() {
        let keys = input_keys(&ENV_GEN, 5);
        assert_eq!(
            keys,
            [
                InputKey::Named("gate"),
                InputKey::Named("level_scale"),
                InputKey::Indexed("envelope", 0),
                InputKey::Indexed("envelope", 1),
                InputKey::Indexed("envelope", 2),
            ]
        );
    }

    #[test]
    fn test_input_keys_extras() {
        const INPUTS: &[InputDecl] = &[InputDecl::required("a")];
        let kind = UGenKind::new("Two").inputs(INPUTS);
        assert_eq!(
            input_keys(&kind, 3),
            [InputKey::Named("a"), InputKey::Extra(1), InputKey::Extra(2)]
        );
    }

    #[test]
    fn test_split_parameter_table() {
        let table = vec![("freq".to_string(), 1), ("amp".to_string(), 0)];
        let entries = split_parameter_table(table, &[0.5, 440.0, 443.0]).unwrap();
        assert_eq!(entries[0].name, "amp");
        assert_eq!(entries[0].values, [0.5]);
        assert_eq!(entries[1].values, [440.0, 443.0]);
    }

    #[test]
    fn test_split_parameter_table_rejects_overlap() {
        let table = vec![("a".to_string(), 0), ("b".to_string(), 0)];
        assert!(matches!(
            split_parameter_table(table, &[1.0]),
            Err(CodecError::ParameterTable(_))
        ));
        let table = vec![("a".to_string(), 2)];
        assert!(split_parameter_table(table, &[1.0]).is_err());
    }

    #[test]
    fn test_rejects_bad_header() {
        let lookup: &[&'static UGenKind] = &[];
        assert!(matches!(
            decompile_synthdefs(b"RIFF\0\0\0\x02\0\0", &lookup),
            Err(CodecError::BadMagic(m)) if &m == b"RIFF"
        ));
        assert!(matches!(
            decompile_synthdefs(b"SCgf\0\0\0\x01\0\0", &lookup),
            Err(CodecError::UnsupportedVersion(1))
        ));
        assert!(matches!(
            decompile_synthdefs(b"SCg", &lookup),
            Err(CodecError::Truncated)
        ));
    }

    #[test]
    fn test_single_entry_point_counts() {
        let lookup: &[&'static UGenKind] = &[];
        assert!(matches!(
            decompile_synthdef(b"SCgf\0\0\0\x02\0\0", &lookup),
            Err(CodecError::UnexpectedSynthDefCount(0))
        ));
    }
}
