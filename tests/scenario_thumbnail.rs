mod common;

use blendgraph::BlendFile;
use common::{block_header_bytes, build_sdna, dna1_block, endb_block};

/// `TEST` blocks carry the file's thumbnail: width, height, then raw RGBA
/// bytes, with no SDNA struct backing it at all.
#[test]
fn test_block_decodes_to_thumbnail() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"BLENDER-v300");
    buffer.extend_from_slice(&dna1_block(&build_sdna(&[], &[], &[])));

    let width = 4u32;
    let height = 2u32;
    let mut payload = Vec::new();
    payload.extend_from_slice(&(width as i32).to_le_bytes());
    payload.extend_from_slice(&(height as i32).to_le_bytes());
    payload.extend_from_slice(&vec![200_u8; (width * height * 4) as usize]);

    buffer.extend_from_slice(&block_header_bytes(b"TEST", payload.len() as u32, 0, 0, 1));
    buffer.extend_from_slice(&payload);
    buffer.extend_from_slice(&endb_block());

    let blend = BlendFile::from_bytes(&buffer).expect("file parses");
    let thumb = blend.thumbnail().expect("thumbnail present");
    assert_eq!((thumb.width, thumb.height), (width, height));
    assert_eq!(thumb.rgba.len(), (width * height * 4) as usize);
    assert!(blend.blocks().iter().find(|b| &b.header.code == b"TEST").unwrap().processed);
}
