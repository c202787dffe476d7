//! Public entry point: parses a whole `.blend` file into an in-memory graph
//! of typed blocks, running the full pipeline described by this crate's
//! modules in order.

use std::collections::HashMap;
use std::path::Path;

use crate::{
    error::{BlendError, Diagnostic},
    image_sink::{ImageSink, InMemoryImageSink},
    materialize,
    model::{Block, BlockRef},
    parsers::{block, dna, header, Endianness, PointerSize},
    wellknown::{self, RenderInfo, Thumbnail},
};

/// A parsed `.blend` file: its header, SDNA tables, and every block reduced
/// to a [`Block`] of typed struct instances.
pub struct BlendFile {
    pub header: header::FileHeader,
    pub sdna: dna::Sdna,
    blocks: Vec<Block>,
    diagnostics: Vec<Diagnostic>,
    thumbnail: Option<Thumbnail>,
    render_infos: Vec<RenderInfo>,
}

impl BlendFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BlendError> {
        let buffer = std::fs::read(path)?;
        Self::from_bytes(&buffer)
    }

    pub fn from_bytes(buffer: &[u8]) -> Result<Self, BlendError> {
        let mut sink = InMemoryImageSink::new();
        Self::from_bytes_with_sink(buffer, &mut sink)
    }

    /// Same as [`Self::from_bytes`] but lets the caller supply their own
    /// [`ImageSink`] (for example, one that writes thumbnails to disk
    /// instead of keeping them in memory).
    pub fn from_bytes_with_sink<S: ImageSink>(
        buffer: &[u8],
        image_sink: &mut S,
    ) -> Result<Self, BlendError> {
        let (file_header, rest) = header::parse(buffer)?;
        let body_offset = buffer.len() - rest.len();
        let endianness = file_header.endianness;
        let pointer_size = file_header.pointer_size;

        let (headers, dna_range) = block::scan(endianness, pointer_size, rest);
        let sdna = match dna_range {
            Some((dna_offset, dna_len)) => {
                let dna_payload = &rest[dna_offset..dna_offset + dna_len];
                dna::parse(endianness, dna_payload)?
            }
            None => dna::Sdna {
                names: Vec::new(),
                types: Vec::new(),
                structs: Vec::new(),
            },
        };

        let mut blocks: Vec<Block> = headers
            .into_iter()
            .map(|mut h| {
                h.payload_offset += body_offset;
                Block {
                    header: h,
                    processed: false,
                    instances: Vec::new(),
                    back_refs: Default::default(),
                    ad_hoc_layout: None,
                }
            })
            .collect();

        let mut diagnostics = Vec::new();

        let (thumbnail, render_infos) =
            wellknown::handle_well_known(endianness, buffer, &mut blocks, image_sink);

        let address_index: HashMap<u64, BlockRef> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.header.old_address, i))
            .collect();

        let pending = materialize::materialize_first_pass(
            &sdna,
            buffer,
            endianness,
            pointer_size,
            &address_index,
            &mut blocks,
            &mut diagnostics,
        );
        materialize::apply_pending_refs(&mut blocks, pending);

        crate::infer::infer_layouts(&sdna, pointer_size, buffer, &mut blocks, image_sink);

        let pending = materialize::materialize_second_pass(
            &sdna,
            buffer,
            endianness,
            pointer_size,
            &address_index,
            &mut blocks,
            &mut diagnostics,
        );
        materialize::apply_pending_refs(&mut blocks, pending);

        Ok(BlendFile {
            header: file_header,
            sdna,
            blocks,
            diagnostics,
            thumbnail,
            render_infos,
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, block_ref: BlockRef) -> Option<&Block> {
        self.blocks.get(block_ref)
    }

    pub fn blocks_by_code(&self, code: &[u8; 4]) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| &b.header.code == code)
    }

    pub fn block_by_old_address(&self, address: u64) -> Option<&Block> {
        self.blocks.iter().find(|b| b.header.old_address == address)
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    pub fn render_infos(&self) -> &[RenderInfo] {
        &self.render_infos
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn pointer_size(&self) -> PointerSize {
        self.header.pointer_size
    }

    pub fn endianness(&self) -> Endianness {
        self.header.endianness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dna_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"SDNA");
        buf.extend_from_slice(b"NAME");
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(b"id\0");
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
        buf.extend_from_slice(b"TYPE");
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(b"int\0");
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
        buf.extend_from_slice(b"TLEN");
        buf.extend_from_slice(&4u16.to_le_bytes());
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
        buf.extend_from_slice(b"STRC");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf
    }

    fn block_header_bytes(code: &[u8; 4], length: u32, old_address: u64, sdna_index: i32, count: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(code);
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&old_address.to_le_bytes());
        buf.extend_from_slice(&sdna_index.to_le_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
        buf
    }

    #[test]
    fn parses_minimal_file_with_no_struct_blocks() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"BLENDER-v300");

        let dna = sample_dna_bytes();
        buffer.extend_from_slice(&block_header_bytes(b"DNA1", dna.len() as u32, 0, 0, 1));
        buffer.extend_from_slice(&dna);

        buffer.extend_from_slice(&block_header_bytes(b"ENDB", 0, 0, 0, 0));

        let blend = BlendFile::from_bytes(&buffer).unwrap();
        assert_eq!(blend.pointer_size(), PointerSize::Bits64);
        assert!(blend.blocks().iter().any(|b| &b.header.code == b"DNA1"));
        assert!(blend.thumbnail().is_none());
        assert!(blend.render_infos().is_empty());
    }

    /// A file with no `DNA1` block at all is still a valid, if uninteresting,
    /// empty graph: just a header and the terminating `ENDB` block.
    #[test]
    fn missing_dna_block_parses_to_empty_graph() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"BLENDER-v300");
        buffer.extend_from_slice(&block_header_bytes(b"ENDB", 0, 0, 0, 0));

        let blend = BlendFile::from_bytes(&buffer).unwrap();
        assert!(blend.sdna.structs.is_empty());
        assert!(blend.blocks().iter().all(|b| b.instances.is_empty()));
        assert!(blend.thumbnail().is_none());
        assert!(blend.render_infos().is_empty());
    }

    /// A self-referential "Node { int id; Node *next; }" SDNA, with one
    /// instance's `next` pointing at another block's old address, exercises
    /// both the typed materializer and the pointer fixup/back-reference pass.
    ///
    /// Struct index 0 is left as an unused placeholder: a block header's
    /// `sdna_index` of 0 conventionally means "no associated struct" (every
    /// `TEST`/`REND`/`ENDB` header uses it), so a real, addressable struct
    /// always sits at index 1 or later.
    fn node_sdna_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"SDNA");

        buf.extend_from_slice(b"NAME");
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(b"id\0");
        buf.extend_from_slice(b"*next\0");
        while buf.len() % 4 != 0 {
            buf.push(0);
        }

        buf.extend_from_slice(b"TYPE");
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(b"Unused\0");
        buf.extend_from_slice(b"int\0");
        buf.extend_from_slice(b"Node\0");
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
        buf.extend_from_slice(b"TLEN");
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&4u16.to_le_bytes());
        buf.extend_from_slice(&12u16.to_le_bytes());
        while buf.len() % 4 != 0 {
            buf.push(0);
        }

        buf.extend_from_slice(b"STRC");
        buf.extend_from_slice(&2u32.to_le_bytes());
        // Struct index 0: unused placeholder, no fields.
        buf.extend_from_slice(&0u16.to_le_bytes()); // struct type -> Unused
        buf.extend_from_slice(&0u16.to_le_bytes()); // zero fields
        // Struct index 1: Node.
        buf.extend_from_slice(&2u16.to_le_bytes()); // struct type -> Node
        buf.extend_from_slice(&2u16.to_le_bytes()); // two fields
        buf.extend_from_slice(&1u16.to_le_bytes()); // field type -> int
        buf.extend_from_slice(&0u16.to_le_bytes()); // field name -> id
        buf.extend_from_slice(&2u16.to_le_bytes()); // field type -> Node
        buf.extend_from_slice(&1u16.to_le_bytes()); // field name -> *next
        buf
    }

    #[test]
    fn pointer_fixup_records_back_reference() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"BLENDER-v300");

        let dna = node_sdna_bytes();
        buffer.extend_from_slice(&block_header_bytes(b"DNA1", dna.len() as u32, 0, 0, 1));
        buffer.extend_from_slice(&dna);

        const NODE_STRUCT_INDEX: i32 = 1;
        const HEAD_ADDRESS: u64 = 0x1000;
        const TAIL_ADDRESS: u64 = 0x2000;

        buffer.extend_from_slice(&block_header_bytes(b"NO01", 12, HEAD_ADDRESS, NODE_STRUCT_INDEX, 1));
        buffer.extend_from_slice(&1i32.to_le_bytes());
        buffer.extend_from_slice(&TAIL_ADDRESS.to_le_bytes());

        buffer.extend_from_slice(&block_header_bytes(b"NO01", 12, TAIL_ADDRESS, NODE_STRUCT_INDEX, 1));
        buffer.extend_from_slice(&2i32.to_le_bytes());
        buffer.extend_from_slice(&0u64.to_le_bytes());

        buffer.extend_from_slice(&block_header_bytes(b"ENDB", 0, 0, 0, 0));

        let blend = BlendFile::from_bytes(&buffer).unwrap();

        let head = blend.block_by_old_address(HEAD_ADDRESS).unwrap();
        let tail_ref = head.instances[0]
            .member("next")
            .and_then(|m| match &m.value {
                crate::model::Value::Pointer(p) => p.target,
                _ => None,
            })
            .unwrap();

        let tail = blend.block(tail_ref).unwrap();
        assert_eq!(tail.header.old_address, TAIL_ADDRESS);
        assert_eq!(tail.back_refs.referrers.len(), 1);
        assert_eq!(tail.back_refs.referrers[0].owner_struct, "Node");
        assert_eq!(tail.back_refs.referrers[0].member_spelling, "*next");
    }
}
