//! The object graph a parsed file is reduced to: blocks, struct instances,
//! member values, and the back-reference edges pointer fixup produces.

use crate::parsers::block::BlockHeader;
use linked_hash_map::LinkedHashMap;
use std::collections::HashSet;

/// Index into [`crate::BlendFile`]'s block list. Blocks never move once
/// scanned, so this is stable for the lifetime of a parsed file.
pub type BlockRef = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Char(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    ULong(u32),
    Float(f32),
    Double(f64),
    Int64(i64),
    UInt64(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringValue {
    Utf8(String),
    Raw(Vec<u8>),
}

/// A resolved (or unresolved) persisted address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    pub address: u64,
    pub target: Option<BlockRef>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Scalar(Scalar),
    Str(StringValue),
    Pointer(Pointer),
    Struct(StructInstance),
    Array(Vec<Value>),
    /// The declared type could not be resolved against the SDNA; the bytes
    /// were skipped rather than guessed at.
    Unresolved,
}

#[derive(Debug, Clone)]
pub struct MemberInstance {
    pub declared_type: String,
    /// The raw NAME-table spelling, e.g. `*next` or `drw_corners[2][4][2]`.
    pub spelling: String,
    pub dimensions: Vec<usize>,
    pub is_primitive: bool,
    pub is_pointer: bool,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct StructInstance {
    pub type_name: String,
    /// Set only when this instance is nested inside another instance's member.
    pub member_name: Option<String>,
    pub block: BlockRef,
    pub members: LinkedHashMap<String, MemberInstance>,
}

impl StructInstance {
    pub fn member(&self, name: &str) -> Option<&MemberInstance> {
        self.members.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Referrer {
    pub owner_block: BlockRef,
    pub owner_struct: String,
    pub member_type: String,
    pub member_spelling: String,
}

#[derive(Debug, Clone, Default)]
pub struct BackRefs {
    pub quick_refs: HashSet<String>,
    pub referrers: Vec<Referrer>,
}

impl BackRefs {
    pub fn record(&mut self, referrer: Referrer) {
        self.quick_refs.insert(format!(
            "{}|{} {}",
            referrer.owner_struct, referrer.member_type, referrer.member_spelling
        ));
        self.referrers.push(referrer);
    }
}

/// A single member of a layout, whether it came from the SDNA or was
/// synthesized by the heuristic inferencer.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub declared_type: String,
    pub raw_spelling: String,
    pub name: String,
    pub dimensions: Vec<usize>,
    pub pointer_depth: usize,
}

/// A layout synthesized for a block the SDNA doesn't describe directly.
#[derive(Debug, Clone)]
pub struct AdHocLayout {
    pub struct_name: String,
    pub members: Vec<FieldSpec>,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub header: BlockHeader,
    pub processed: bool,
    pub instances: Vec<StructInstance>,
    pub back_refs: BackRefs,
    pub ad_hoc_layout: Option<AdHocLayout>,
}
