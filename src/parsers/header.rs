use super::{Endianness, PointerSize};
use crate::error::BlendError;
use nom::{bytes::complete::tag, bytes::complete::take, Err, IResult};

type Result<'a, T> = IResult<&'a [u8], T, BlendError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub pointer_size: PointerSize,
    pub endianness: Endianness,
    pub version: u16,
}

fn pointer_size(input: &[u8]) -> Result<PointerSize> {
    let (input, code) = take(1_usize)(input)?;
    match code[0] {
        b'_' => Ok((input, PointerSize::Bits32)),
        b'-' => Ok((input, PointerSize::Bits64)),
        other => Err(Err::Failure(BlendError::BadPointerSizeCode(other))),
    }
}

fn endianness(input: &[u8]) -> Result<Endianness> {
    let (input, code) = take(1_usize)(input)?;
    match code[0] {
        b'v' => Ok((input, Endianness::Little)),
        b'V' => Ok((input, Endianness::Big)),
        other => Err(Err::Failure(BlendError::BadEndianCode(other))),
    }
}

fn version(input: &[u8]) -> Result<u16> {
    let (input, digits) = take(3_usize)(input)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(Err::Failure(BlendError::BadVersion));
    }
    let value = digits
        .iter()
        .fold(0_u16, |acc, &d| acc * 10 + u16::from(d - b'0'));
    Ok((input, value))
}

fn file_header(input: &[u8]) -> Result<FileHeader> {
    let (input, _) = tag("BLENDER")(input).or(Err(Err::Failure(BlendError::BadMagic)))?;
    let (input, pointer_size) = pointer_size(input)?;
    let (input, endianness) = endianness(input)?;

    if endianness != Endianness::host() {
        return Err(Err::Failure(BlendError::HostEndianMismatch));
    }

    let (input, version) = version(input)?;

    Ok((
        input,
        FileHeader {
            pointer_size,
            endianness,
            version,
        },
    ))
}

/// Parses the fixed 12-byte file header and returns it along with the
/// remaining bytes (the first block header starts there).
pub fn parse(input: &[u8]) -> std::result::Result<(FileHeader, &[u8]), BlendError> {
    if input.len() < 12 {
        return Err(BlendError::Truncated {
            context: "file header",
        });
    }
    super::finish(file_header(input))
}
