//! Collaborator that turns raw RGBA bytes pulled out of a block (thumbnails,
//! preview images) into a usable in-memory image, kept behind a trait so a
//! caller can swap in their own handling (write to disk, skip decoding
//! entirely) without this crate depending on how it's consumed.

use image::{ImageBuffer, Rgba, RgbaImage};

pub trait ImageSink {
    /// `rgba` is exactly `width * height * 4` bytes, already extracted from
    /// a block's payload. `name` is a short human-readable label for the
    /// source (the block code, or a struct name) for sinks that log or
    /// write to disk.
    fn emit(&mut self, width: u32, height: u32, rgba: &[u8], name: &str) -> Option<RgbaImage>;
}

/// Default sink: decodes into an [`image::RgbaImage`] and keeps the most
/// recent one of each named source around for retrieval.
#[derive(Default)]
pub struct InMemoryImageSink {
    images: std::collections::HashMap<String, RgbaImage>,
}

impl InMemoryImageSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&RgbaImage> {
        self.images.get(name)
    }
}

impl ImageSink for InMemoryImageSink {
    fn emit(&mut self, width: u32, height: u32, rgba: &[u8], name: &str) -> Option<RgbaImage> {
        let image = ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba.to_vec())?;
        self.images.insert(name.to_owned(), image.clone());
        Some(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_retains_named_image() {
        let mut sink = InMemoryImageSink::new();
        let rgba = vec![255_u8; 2 * 2 * 4];
        let decoded = sink.emit(2, 2, &rgba, "preview_image").unwrap();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert!(sink.get("preview_image").is_some());
    }

    #[test]
    fn rejects_undersized_buffer() {
        let mut sink = InMemoryImageSink::new();
        assert!(sink.emit(4, 4, &[0_u8; 4], "too_small").is_none());
    }
}
