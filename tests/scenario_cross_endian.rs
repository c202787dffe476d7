mod common;

use blendgraph::parsers::Endianness;
use blendgraph::{BlendError, BlendFile};
use common::endb_block;

/// A file whose endian code doesn't match the host's byte order is rejected
/// outright - this crate doesn't attempt to byte-swap its way around it.
#[test]
fn mismatched_endian_code_is_rejected() {
    let wrong_code = if Endianness::host() == Endianness::Little { b'V' } else { b'v' };

    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"BLENDER-v300");
    buffer[8] = wrong_code;
    buffer.extend_from_slice(&endb_block());

    let err = BlendFile::from_bytes(&buffer).unwrap_err();
    assert!(matches!(err, BlendError::HostEndianMismatch));
}
