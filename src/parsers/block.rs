//! First pass over the file: walks the fixed-layout block headers without
//! interpreting any payload (besides locating the `DNA1` payload so the SDNA
//! can be decoded before anything else runs).

use super::{Endianness, PointerSize};
use nom::{
    bytes::complete::take,
    number::complete::{be_u32, be_u64, le_u32, le_u64},
    IResult,
};

#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub code: [u8; 4],
    pub length: usize,
    pub old_address: u64,
    pub sdna_index: i32,
    pub count: i32,
    /// Byte offset of the payload, relative to the same buffer the caller
    /// passed to [`scan`].
    pub payload_offset: usize,
}

fn read_u32(endianness: Endianness, input: &[u8]) -> IResult<&[u8], u32> {
    match endianness {
        Endianness::Little => le_u32(input),
        Endianness::Big => be_u32(input),
    }
}

fn read_i32(endianness: Endianness, input: &[u8]) -> IResult<&[u8], i32> {
    let (input, v) = read_u32(endianness, input)?;
    Ok((input, v as i32))
}

fn read_old_address(
    endianness: Endianness,
    pointer_size: PointerSize,
    input: &[u8],
) -> IResult<&[u8], u64> {
    match pointer_size {
        PointerSize::Bits32 => {
            let (input, v) = read_u32(endianness, input)?;
            Ok((input, u64::from(v)))
        }
        PointerSize::Bits64 => match endianness {
            Endianness::Little => le_u64(input),
            Endianness::Big => be_u64(input),
        },
    }
}

fn one_header(
    endianness: Endianness,
    pointer_size: PointerSize,
    input: &[u8],
) -> IResult<&[u8], BlockHeader> {
    let (input, code_bytes) = take(4_usize)(input)?;
    let code = [code_bytes[0], code_bytes[1], code_bytes[2], code_bytes[3]];
    let (input, length) = read_i32(endianness, input)?;
    let (input, old_address) = read_old_address(endianness, pointer_size, input)?;
    let (input, sdna_index) = read_i32(endianness, input)?;
    let (input, count) = read_i32(endianness, input)?;

    Ok((
        input,
        BlockHeader {
            code,
            length: length.max(0) as usize,
            old_address,
            sdna_index,
            count,
            payload_offset: 0,
        },
    ))
}

/// Scans every block header in `buffer` in file order, stopping at `ENDB`
/// (not itself stored) or at the first header/payload that doesn't fit. A
/// truncated tail is treated as end-of-file rather than an error, matching
/// the rest of this parser's "skip what doesn't fit" stance on partial data.
///
/// Returns the headers plus the byte range of the `DNA1` payload, if found.
pub fn scan(
    endianness: Endianness,
    pointer_size: PointerSize,
    buffer: &[u8],
) -> (Vec<BlockHeader>, Option<(usize, usize)>) {
    let mut headers = Vec::new();
    let mut dna_payload = None;
    let mut cursor = buffer;

    loop {
        let (rest, mut header) = match one_header(endianness, pointer_size, cursor) {
            Ok(v) => v,
            Err(_) => break,
        };

        if &header.code == b"ENDB" {
            break;
        }

        let payload_offset = buffer.len() - rest.len();
        if rest.len() < header.length {
            break;
        }

        header.payload_offset = payload_offset;

        if &header.code == b"DNA1" {
            dna_payload = Some((payload_offset, header.length));
        }

        cursor = &rest[header.length..];
        headers.push(header);
    }

    (headers, dna_payload)
}
