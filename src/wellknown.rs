//! Block codes with a fixed, SDNA-independent layout: `TEST` (the file
//! thumbnail) and `REND` (the render-info list). Both are claimed and
//! decoded before the generic materializer runs, so it skips them.

use crate::{
    image_sink::ImageSink,
    model::Block,
    parsers::{primitive::parse_i32, Endianness},
};

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RenderInfo {
    pub start_frame: i32,
    pub end_frame: i32,
    pub scene_name: String,
}

const SCENE_NAME_LEN: usize = 64;

fn decode_thumbnail(endianness: Endianness, payload: &[u8]) -> Option<Thumbnail> {
    if payload.len() < 8 {
        return None;
    }
    let width = parse_i32(&payload[0..4], endianness).max(0) as u32;
    let height = parse_i32(&payload[4..8], endianness).max(0) as u32;
    let expected = width as usize * height as usize * 4;
    if payload.len() < 8 + expected {
        return None;
    }
    Some(Thumbnail {
        width,
        height,
        rgba: payload[8..8 + expected].to_vec(),
    })
}

fn decode_render_infos(endianness: Endianness, payload: &[u8]) -> Vec<RenderInfo> {
    const RECORD_LEN: usize = 4 + 4 + SCENE_NAME_LEN;
    let mut infos = Vec::new();
    let mut cursor = 0;
    while cursor + RECORD_LEN <= payload.len() {
        let start_frame = parse_i32(&payload[cursor..cursor + 4], endianness);
        let end_frame = parse_i32(&payload[cursor + 4..cursor + 8], endianness);
        let name_bytes = &payload[cursor + 8..cursor + 8 + SCENE_NAME_LEN];
        let trimmed: Vec<u8> = name_bytes.iter().take_while(|&&b| b != 0).cloned().collect();
        let scene_name = String::from_utf8_lossy(&trimmed).into_owned();
        infos.push(RenderInfo {
            start_frame,
            end_frame,
            scene_name,
        });
        cursor += RECORD_LEN;
    }
    infos
}

/// Scans every block for `TEST`/`REND`/`ENDB` codes, decodes the ones with a
/// fixed layout, and marks them processed so the generic SDNA materializer
/// leaves them alone.
pub fn handle_well_known<S: ImageSink>(
    endianness: Endianness,
    buffer: &[u8],
    blocks: &mut [Block],
    image_sink: &mut S,
) -> (Option<Thumbnail>, Vec<RenderInfo>) {
    let mut thumbnail = None;
    let mut render_infos = Vec::new();

    for block in blocks.iter_mut() {
        let payload = &buffer[block.header.payload_offset..block.header.payload_offset + block.header.length];
        match &block.header.code {
            b"TEST" => {
                if let Some(t) = decode_thumbnail(endianness, payload) {
                    image_sink.emit(t.width, t.height, &t.rgba, "file_thumbnail");
                    thumbnail = Some(t);
                }
                block.processed = true;
            }
            b"REND" => {
                render_infos = decode_render_infos(endianness, payload);
                block.processed = true;
            }
            _ => {}
        }
    }

    (thumbnail, render_infos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_sink::InMemoryImageSink;
    use crate::model::BackRefs;
    use crate::parsers::block::BlockHeader;

    fn block_with(code: &[u8; 4], payload: &[u8]) -> (Block, Vec<u8>) {
        let header = BlockHeader {
            code: *code,
            length: payload.len(),
            old_address: 1,
            sdna_index: 0,
            count: 1,
            payload_offset: 0,
        };
        (
            Block {
                header,
                processed: false,
                instances: Vec::new(),
                back_refs: BackRefs::default(),
                ad_hoc_layout: None,
            },
            payload.to_vec(),
        )
    }

    #[test]
    fn decodes_thumbnail() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&2i32.to_le_bytes());
        payload.extend_from_slice(&1i32.to_le_bytes());
        payload.extend_from_slice(&[255_u8; 2 * 1 * 4]);
        let (block, buffer) = block_with(b"TEST", &payload);
        let mut blocks = vec![block];
        let mut sink = InMemoryImageSink::new();
        let (thumb, _) = handle_well_known(Endianness::Little, &buffer, &mut blocks, &mut sink);
        let thumb = thumb.unwrap();
        assert_eq!((thumb.width, thumb.height), (2, 1));
        assert!(blocks[0].processed);
    }

    #[test]
    fn decodes_render_info() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1i32.to_le_bytes());
        payload.extend_from_slice(&250i32.to_le_bytes());
        let mut name = b"Scene".to_vec();
        name.resize(SCENE_NAME_LEN, 0);
        payload.extend_from_slice(&name);
        let (block, buffer) = block_with(b"REND", &payload);
        let mut blocks = vec![block];
        let mut sink = InMemoryImageSink::new();
        let (_, infos) = handle_well_known(Endianness::Little, &buffer, &mut blocks, &mut sink);
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].scene_name, "Scene");
        assert_eq!(infos[0].end_frame, 250);
    }
}
