use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

/// Fatal conditions. Every one of these aborts the parse in progress; no
/// partial object graph is returned alongside them.
#[derive(Debug, Error)]
pub enum BlendError {
    #[error("missing BLENDER magic at start of file")]
    BadMagic,
    #[error("unrecognized pointer size code {0:#x}")]
    BadPointerSizeCode(u8),
    #[error("unrecognized endianness code {0:#x}")]
    BadEndianCode(u8),
    #[error("file endianness does not match the host's")]
    HostEndianMismatch,
    #[error("version field is not three ASCII digits")]
    BadVersion,
    #[error("unexpected end of data while reading {context}")]
    Truncated { context: &'static str },
    #[error("DNA1 payload does not start with the SDNA tag")]
    BadSdnaTag,
    #[error("I/O error reading blend file")]
    Io(#[from] std::io::Error),
    #[error("malformed input ({0:?})")]
    Nom(ErrorKind),
}

impl ParseError<&[u8]> for BlendError {
    fn from_error_kind(_input: &[u8], kind: ErrorKind) -> Self {
        BlendError::Nom(kind)
    }

    fn append(_input: &[u8], _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// A recoverable parse anomaly. Diagnostics never abort a parse; they
/// accumulate on the resulting [`crate::BlendFile`] alongside whatever
/// object graph was still reconstructible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownStructIndex {
        block_old_address: u64,
        struct_index: i32,
    },
    UnknownTypeName {
        block_old_address: u64,
        type_name: String,
    },
    ParseMemberSpelling {
        block_old_address: u64,
        spelling: String,
    },
    Utf8DecodeFallback {
        block_old_address: u64,
        member: String,
    },
}
