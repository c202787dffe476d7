//! Decodes the `DNA1` block payload: the `SDNA` tag followed by the `NAME`,
//! `TYPE`, `TLEN` and `STRC` sub-blocks.

use super::Endianness;
use crate::error::BlendError;
use nom::{
    bytes::complete::{tag, take, take_while},
    combinator::map,
    multi::count,
    number::complete::{be_u16, be_u32, le_u16, le_u32},
    sequence::terminated,
    Err, IResult,
};
use std::convert::TryInto;

type Result<'a, T> = IResult<&'a [u8], T, BlendError>;

/// Legacy struct renames applied to the TYPE table on load. No other aliases
/// exist; everything else passes through unchanged.
const LEGACY_RENAMES: &[(&str, &str)] = &[
    ("bScreen", "Screen"),
    ("Collection", "Group"),
    ("CollectionObject", "GroupObject"),
];

fn apply_legacy_rename(name: &str) -> String {
    LEGACY_RENAMES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| (*to).to_owned())
        .unwrap_or_else(|| name.to_owned())
}

#[derive(Debug, Clone)]
pub struct SdnaType {
    pub name: String,
    pub bytes_len: usize,
}

#[derive(Debug, Clone)]
pub struct SdnaField {
    pub type_index: usize,
    pub name_index: usize,
}

#[derive(Debug, Clone)]
pub struct SdnaStruct {
    pub type_index: usize,
    pub fields: Vec<SdnaField>,
}

#[derive(Debug, Clone)]
pub struct Sdna {
    pub names: Vec<String>,
    pub types: Vec<SdnaType>,
    pub structs: Vec<SdnaStruct>,
}

impl Sdna {
    /// Struct index whose own type name is `type_name`, if any.
    pub fn struct_index_for_type(&self, type_name: &str) -> Option<usize> {
        self.structs
            .iter()
            .position(|s| self.types[s.type_index].name == type_name)
    }

    pub fn type_size(&self, type_name: &str) -> Option<usize> {
        self.types
            .iter()
            .find(|t| t.name == type_name)
            .map(|t| t.bytes_len)
    }
}

fn pad4(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn names(endianness: Endianness, input: &[u8]) -> Result<Vec<String>> {
    let (input, _) = tag("NAME")(input)?;
    let (input, names_len) = match endianness {
        Endianness::Little => le_u32(input)?,
        Endianness::Big => be_u32(input)?,
    };

    let total_len = std::cell::RefCell::new(0_usize);
    let (input, names) = count(
        terminated(
            map(take_while(|b: u8| b != 0), |b: &[u8]| {
                *total_len.borrow_mut() += b.len() + 1;
                String::from_utf8_lossy(b).into_owned()
            }),
            tag("\0"),
        ),
        names_len.try_into().expect("u32 to usize"),
    )(input)?;

    let (input, _) = take(pad4(*total_len.borrow()))(input)?;
    Ok((input, names))
}

fn types(endianness: Endianness, input: &[u8]) -> Result<Vec<SdnaType>> {
    let (input, _) = tag("TYPE")(input)?;
    let (input, types_len) = match endianness {
        Endianness::Little => le_u32(input)?,
        Endianness::Big => be_u32(input)?,
    };
    let types_len: usize = types_len.try_into().expect("u32 to usize");

    let total_len = std::cell::RefCell::new(0_usize);
    let (input, type_names) = count(
        terminated(
            map(take_while(|b: u8| b != 0), |b: &[u8]| {
                *total_len.borrow_mut() += b.len() + 1;
                apply_legacy_rename(&String::from_utf8_lossy(b))
            }),
            tag("\0"),
        ),
        types_len,
    )(input)?;
    let (input, _) = take(pad4(*total_len.borrow()))(input)?;

    let (input, _) = tag("TLEN")(input)?;
    let (input, lengths) = count(
        match endianness {
            Endianness::Little => le_u16,
            Endianness::Big => be_u16,
        },
        types_len,
    )(input)?;
    let (input, _) = take(pad4(types_len * 2))(input)?;

    Ok((
        input,
        type_names
            .into_iter()
            .zip(lengths)
            .map(|(name, bytes_len)| SdnaType {
                name,
                bytes_len: bytes_len as usize,
            })
            .collect(),
    ))
}

fn structs(endianness: Endianness, input: &[u8]) -> Result<Vec<SdnaStruct>> {
    let (input, _) = tag("STRC")(input)?;
    let (mut input, structs_len) = match endianness {
        Endianness::Little => le_u32(input)?,
        Endianness::Big => be_u32(input)?,
    };

    let mut structs = Vec::with_capacity(structs_len as usize);
    for _ in 0..structs_len {
        let (rest, type_index) = match endianness {
            Endianness::Little => le_u16(input)?,
            Endianness::Big => be_u16(input)?,
        };
        let (rest, field_count) = match endianness {
            Endianness::Little => le_u16(rest)?,
            Endianness::Big => be_u16(rest)?,
        };

        let mut cursor = rest;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let (rest, field_type) = match endianness {
                Endianness::Little => le_u16(cursor)?,
                Endianness::Big => be_u16(cursor)?,
            };
            let (rest, field_name) = match endianness {
                Endianness::Little => le_u16(rest)?,
                Endianness::Big => be_u16(rest)?,
            };
            cursor = rest;
            fields.push(SdnaField {
                type_index: field_type as usize,
                name_index: field_name as usize,
            });
        }

        structs.push(SdnaStruct {
            type_index: type_index as usize,
            fields,
        });
        input = cursor;
    }

    Ok((input, structs))
}

fn sdna(endianness: Endianness, input: &[u8]) -> Result<Sdna> {
    let (input, _) = tag("SDNA")(input).or(Err(Err::Failure(BlendError::BadSdnaTag)))?;
    let (input, names) = names(endianness, input)?;
    let (input, types) = types(endianness, input)?;
    let (input, structs) = structs(endianness, input)?;
    Ok((
        input,
        Sdna {
            names,
            types,
            structs,
        },
    ))
}

/// Parses a `DNA1` block payload into the four SDNA tables.
pub fn parse(endianness: Endianness, input: &[u8]) -> std::result::Result<Sdna, BlendError> {
    super::finish(sdna(endianness, input)).map(|(dna, _)| dna)
}
