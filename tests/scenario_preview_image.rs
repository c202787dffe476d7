mod common;

use blendgraph::image_sink::InMemoryImageSink;
use blendgraph::model::{Scalar, Value};
use blendgraph::BlendFile;
use common::{block_header_bytes, build_sdna, dna1_block, endb_block};

/// `PreviewImage { int w[2]; int h[2]; int *rect[2]; }` with `w=[64,256]`,
/// `h=[64,256]` and `rect` pointing at two otherwise-untyped data blocks.
/// Neither data block has a real SDNA struct behind it - the heuristic
/// inferencer recognizes the `PreviewImage|int *rect[2]` shape, hands each
/// block's raw bytes to the image sink, and replaces it with a synthesized
/// `{width, height, name}` descriptor.
#[test]
fn preview_image_rects_become_sink_images_and_descriptors() {
    let names = ["w[2]", "h[2]", "*rect[2]"];
    let types: [(&str, u16); 2] = [("int", 4), ("PreviewImage", 32)];
    let structs: [(u16, &[(u16, u16)]); 2] = [
        (0, &[]),                               // index 0: unused sentinel
        (1, &[(0, 0), (0, 1), (0, 2)]),          // index 1: PreviewImage
    ];
    let dna = build_sdna(&names, &types, &structs);

    const PREVIEW_ADDR: u64 = 0x1;
    const SMALL_ADDR: u64 = 0x3000;
    const LARGE_ADDR: u64 = 0x4000;
    let small_len = 64 * 64 * 4;
    let large_len = 256 * 256 * 4;

    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"BLENDER-v300");
    buffer.extend_from_slice(&dna1_block(&dna));

    let mut preview_payload = Vec::new();
    preview_payload.extend_from_slice(&64i32.to_le_bytes());
    preview_payload.extend_from_slice(&256i32.to_le_bytes());
    preview_payload.extend_from_slice(&64i32.to_le_bytes());
    preview_payload.extend_from_slice(&256i32.to_le_bytes());
    preview_payload.extend_from_slice(&SMALL_ADDR.to_le_bytes());
    preview_payload.extend_from_slice(&LARGE_ADDR.to_le_bytes());
    buffer.extend_from_slice(&block_header_bytes(b"DATA", preview_payload.len() as u32, PREVIEW_ADDR, 1, 1));
    buffer.extend_from_slice(&preview_payload);

    buffer.extend_from_slice(&block_header_bytes(b"DATA", small_len as u32, SMALL_ADDR, 0, 1));
    buffer.extend_from_slice(&vec![111_u8; small_len]);

    buffer.extend_from_slice(&block_header_bytes(b"DATA", large_len as u32, LARGE_ADDR, 0, 1));
    buffer.extend_from_slice(&vec![222_u8; large_len]);

    buffer.extend_from_slice(&endb_block());

    let mut sink = InMemoryImageSink::new();
    let blend = BlendFile::from_bytes_with_sink(&buffer, &mut sink).expect("file parses");

    let small = blend.block_by_old_address(SMALL_ADDR).expect("small block exists");
    assert!(small.processed);
    assert_eq!(small.instances[0].type_name, "PreviewImageRaster");
    let small_width = match &small.instances[0].member("width").unwrap().value {
        Value::Scalar(Scalar::Int(v)) => *v,
        other => panic!("expected int width, got {:?}", other),
    };
    assert_eq!(small_width, 64);

    let large = blend.block_by_old_address(LARGE_ADDR).expect("large block exists");
    assert!(large.processed);
    let large_height = match &large.instances[0].member("height").unwrap().value {
        Value::Scalar(Scalar::Int(v)) => *v,
        other => panic!("expected int height, got {:?}", other),
    };
    assert_eq!(large_height, 256);

    assert!(sink.get(&format!("{:#x}", SMALL_ADDR)).is_some());
    assert!(sink.get(&format!("{:#x}", LARGE_ADDR)).is_some());
}
