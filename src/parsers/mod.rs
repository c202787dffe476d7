//! Low level grammar: fixed-width header fields, the SDNA sub-blocks, and the
//! member-spelling mini-grammar. Nothing in this module understands what a
//! block's bytes *mean*; that is [`crate::materialize`]'s job.

pub mod block;
pub mod dna;
pub mod header;
pub mod name;
pub mod primitive;

use crate::error::BlendError;
use nom::{Err, IResult};

/// Collapses a nom `IResult` into a plain `Result`, the way every top-level
/// entry point into this module's grammars reports its outcome.
pub(crate) fn finish<'a, T>(
    r: IResult<&'a [u8], T, BlendError>,
) -> std::result::Result<(T, &'a [u8]), BlendError> {
    match r {
        Ok((rest, value)) => Ok((value, rest)),
        Err(Err::Error(e)) | Err(Err::Failure(e)) => Err(e),
        Err(Err::Incomplete(_)) => Err(BlendError::Truncated {
            context: "unexpected end of data",
        }),
    }
}

/// Pointer width declared by the file header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerSize {
    Bits32,
    Bits64,
}

impl PointerSize {
    pub fn bytes_num(self) -> usize {
        match self {
            PointerSize::Bits32 => 4,
            PointerSize::Bits64 => 8,
        }
    }
}

/// Byte order declared by the file header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn host() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}
