//! # blendgraph - a decoder for Blender's .blend file SDNA and block graph
//!
//! ## Example
//!
//! ```ignore
//! use blendgraph::BlendFile;
//!
//! fn main() {
//!     let blend = BlendFile::from_path("file.blend").unwrap();
//!
//!     for block in blend.blocks_by_code(b"OB\0\0") {
//!         for instance in &block.instances {
//!             println!("{}", instance.type_name);
//!         }
//!     }
//! }
//! ```
//!
//! ## The .blend file
//!
//! A .blend file is Blender's memory dumped to disk: a sequence of
//! fixed-size block headers, each introducing a payload that is one or more
//! C-like structs. The file is self-describing - it carries its own struct
//! layout table (the SDNA, stored in the `DNA1` block) so that a reader
//! built against a different Blender version than the one that wrote the
//! file can still make sense of it.
//!
//! ## This crate
//!
//! Unlike a lazy, on-demand reader, this crate eagerly decodes every block
//! it can make sense of into a [`model::StructInstance`] tree as soon as the
//! file is opened, resolves every pointer it finds against the block address
//! table, and records which structs point at which blocks. Blocks whose
//! shape the SDNA can't describe on its own - `void *` fields whose real
//! type depends on a sibling field, `char *` blobs, and the like - get a
//! second pass from a small set of heuristics that look at those recorded
//! back-references before giving up.
//!
//! Anomalies encountered along the way (an SDNA struct index the DNA1 table
//! doesn't know about, a member spelling the name grammar can't parse, a
//! `char` array that isn't valid UTF-8) are collected as
//! [`error::Diagnostic`]s on the resulting [`BlendFile`] rather than aborting
//! the parse. Only malformed framing - a bad magic number, a missing SDNA
//! block, a byte order the file declares that doesn't match this grammar's
//! expectations - is treated as fatal, via [`error::BlendError`].
//!
//! ### Supported versions
//!
//! As the file is self-describing this should parse files from any Blender
//! version; the primitive type table in [`materialize`] is the one place
//! where this crate assumes a fixed mapping (`int` is always 4 bytes, `long`
//! is read as a 4-byte signed value regardless of what it would be on the
//! writing platform's C compiler, matching how every shipped Blender actually
//! writes it).
//!
//! ### Limitations
//!
//! This crate does not support compressed `.blend` files or writing them
//! back out. The whole file is read into memory before parsing begins.

pub mod blendfile;
pub mod error;
pub mod image_sink;
pub mod infer;
pub mod materialize;
pub mod model;
pub mod parsers;
pub mod wellknown;

pub use blendfile::BlendFile;
pub use error::{BlendError, Diagnostic};
pub use model::{Block, BlockRef, MemberInstance, StructInstance, Value};
