//! Turns SDNA struct definitions (or ad-hoc layouts from the inferencer)
//! into [`crate::model::Value`] trees, resolving pointers against the
//! block-address index as it goes.

use crate::{
    error::Diagnostic,
    model::{
        Block, BlockRef, FieldSpec, MemberInstance, Pointer, Referrer, Scalar, StringValue,
        StructInstance, Value,
    },
    parsers::{
        dna::Sdna,
        name::{parse_spelling, ParsedSpelling},
        primitive::{parse_f32, parse_f64, parse_i16, parse_i32, parse_i64, parse_i8, parse_u16,
            parse_u32, parse_u64, parse_u8},
        Endianness, PointerSize,
    },
};
use linked_hash_map::LinkedHashMap;
use std::collections::HashMap;
use std::convert::TryInto;

const PRIMITIVE_TYPES: &[&str] = &[
    "char", "uchar", "short", "ushort", "int", "long", "ulong", "float", "double", "int64_t",
    "uint64_t", "void",
];

pub fn is_primitive_type(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

pub struct MaterializeCtx<'a> {
    pub sdna: &'a Sdna,
    pub buffer: &'a [u8],
    pub endianness: Endianness,
    pub pointer_size: PointerSize,
    pub address_index: &'a HashMap<u64, BlockRef>,
}

/// Builds the field list for an SDNA struct, skipping (and diagnosing) any
/// member whose spelling the name grammar rejects.
pub fn field_specs_for_struct(
    sdna: &Sdna,
    struct_index: usize,
    diagnostics: &mut Vec<Diagnostic>,
    owner_old_address: u64,
) -> Vec<FieldSpec> {
    let def = &sdna.structs[struct_index];
    def.fields
        .iter()
        .filter_map(|field| {
            let declared_type = sdna.types[field.type_index].name.clone();
            let raw_spelling = sdna.names[field.name_index].clone();
            match parse_spelling(&raw_spelling) {
                Ok(parsed) => Some(field_spec_from_parsed(declared_type, raw_spelling, parsed)),
                Err(_) => {
                    diagnostics.push(Diagnostic::ParseMemberSpelling {
                        block_old_address: owner_old_address,
                        spelling: raw_spelling,
                    });
                    None
                }
            }
        })
        .collect()
}

fn field_spec_from_parsed(
    declared_type: String,
    raw_spelling: String,
    parsed: ParsedSpelling,
) -> FieldSpec {
    match parsed {
        ParsedSpelling::Value { name, dims } => FieldSpec {
            declared_type,
            raw_spelling,
            name,
            dimensions: dims,
            pointer_depth: 0,
        },
        ParsedSpelling::Pointer {
            name,
            pointer_depth,
            dims,
        } => FieldSpec {
            declared_type,
            raw_spelling,
            name,
            dimensions: dims,
            pointer_depth,
        },
        ParsedSpelling::FnPointer { name } => FieldSpec {
            declared_type,
            raw_spelling,
            name,
            dimensions: Vec::new(),
            pointer_depth: 1,
        },
    }
}

/// Materializes `count` consecutive instances of `struct_name` starting at
/// `base_offset`, as described by `fields`.
pub fn materialize_instances(
    ctx: &MaterializeCtx,
    block_ref: BlockRef,
    struct_name: &str,
    owner_old_address: u64,
    fields: &[FieldSpec],
    base_offset: usize,
    count: usize,
    diagnostics: &mut Vec<Diagnostic>,
    pending_refs: &mut Vec<(BlockRef, Referrer)>,
) -> Vec<StructInstance> {
    let mut cursor = base_offset;
    let mut instances = Vec::with_capacity(count);
    for _ in 0..count {
        let (instance, consumed) = materialize_struct(
            ctx,
            block_ref,
            struct_name,
            owner_old_address,
            fields,
            cursor,
            diagnostics,
            pending_refs,
        );
        cursor += consumed;
        instances.push(instance);
    }
    instances
}

fn materialize_struct(
    ctx: &MaterializeCtx,
    block_ref: BlockRef,
    struct_name: &str,
    owner_old_address: u64,
    fields: &[FieldSpec],
    offset: usize,
    diagnostics: &mut Vec<Diagnostic>,
    pending_refs: &mut Vec<(BlockRef, Referrer)>,
) -> (StructInstance, usize) {
    let mut members = LinkedHashMap::new();
    let mut cursor = offset;
    for field in fields {
        let (member, consumed) = materialize_member(
            ctx,
            block_ref,
            struct_name,
            owner_old_address,
            field,
            cursor,
            diagnostics,
            pending_refs,
        );
        cursor += consumed;
        members.insert(field.name.clone(), member);
    }
    (
        StructInstance {
            type_name: struct_name.to_owned(),
            member_name: None,
            block: block_ref,
            members,
        },
        cursor - offset,
    )
}

#[allow(clippy::too_many_arguments)]
fn materialize_member(
    ctx: &MaterializeCtx,
    block_ref: BlockRef,
    owner_struct: &str,
    owner_old_address: u64,
    field: &FieldSpec,
    offset: usize,
    diagnostics: &mut Vec<Diagnostic>,
    pending_refs: &mut Vec<(BlockRef, Referrer)>,
) -> (MemberInstance, usize) {
    let is_pointer = field.pointer_depth > 0;
    let is_primitive = !is_pointer && is_primitive_type(&field.declared_type);

    let (value, consumed) = if is_pointer {
        materialize_pointer(ctx, block_ref, owner_struct, field, offset, pending_refs)
    } else if field.declared_type == "char" && field.dimensions.len() == 1 {
        materialize_char_string(ctx, field, offset, diagnostics, owner_old_address)
    } else if !field.dimensions.is_empty() {
        materialize_array(
            ctx,
            block_ref,
            owner_struct,
            owner_old_address,
            field,
            offset,
            diagnostics,
            pending_refs,
        )
    } else if is_primitive {
        materialize_scalar(ctx, &field.declared_type, offset)
    } else {
        materialize_nested_struct(
            ctx,
            block_ref,
            owner_old_address,
            field,
            offset,
            diagnostics,
            pending_refs,
        )
    };

    (
        MemberInstance {
            declared_type: field.declared_type.clone(),
            spelling: field.raw_spelling.clone(),
            dimensions: field.dimensions.clone(),
            is_primitive,
            is_pointer,
            value,
        },
        consumed,
    )
}

fn read_pointer(ctx: &MaterializeCtx, offset: usize) -> (Pointer, usize) {
    let width = ctx.pointer_size.bytes_num();
    let bytes = &ctx.buffer[offset..offset + width];
    let address = match (ctx.pointer_size, ctx.endianness) {
        (PointerSize::Bits32, Endianness::Little) => {
            u64::from(u32::from_le_bytes(bytes.try_into().expect("4 bytes")))
        }
        (PointerSize::Bits32, Endianness::Big) => {
            u64::from(u32::from_be_bytes(bytes.try_into().expect("4 bytes")))
        }
        (PointerSize::Bits64, Endianness::Little) => {
            u64::from_le_bytes(bytes.try_into().expect("8 bytes"))
        }
        (PointerSize::Bits64, Endianness::Big) => {
            u64::from_be_bytes(bytes.try_into().expect("8 bytes"))
        }
    };
    let target = if address == 0 {
        None
    } else {
        ctx.address_index.get(&address).copied()
    };
    (Pointer { address, target }, width)
}

fn materialize_pointer(
    ctx: &MaterializeCtx,
    block_ref: BlockRef,
    owner_struct: &str,
    field: &FieldSpec,
    offset: usize,
    pending_refs: &mut Vec<(BlockRef, Referrer)>,
) -> (Value, usize) {
    let width = ctx.pointer_size.bytes_num();

    let record = |target: BlockRef, pending_refs: &mut Vec<(BlockRef, Referrer)>| {
        pending_refs.push((
            target,
            Referrer {
                owner_block: block_ref,
                owner_struct: owner_struct.to_owned(),
                member_type: field.declared_type.clone(),
                member_spelling: field.raw_spelling.clone(),
            },
        ));
    };

    if field.dimensions.is_empty() {
        let (pointer, _) = read_pointer(ctx, offset);
        if let Some(target) = pointer.target {
            record(target, pending_refs);
        }
        (Value::Pointer(pointer), width)
    } else {
        let count: usize = field.dimensions.iter().product();
        let mut items = Vec::with_capacity(count);
        let mut cursor = offset;
        for _ in 0..count {
            let (pointer, _) = read_pointer(ctx, cursor);
            if let Some(target) = pointer.target {
                record(target, pending_refs);
            }
            items.push(Value::Pointer(pointer));
            cursor += width;
        }
        (Value::Array(items), count * width)
    }
}

fn materialize_scalar(ctx: &MaterializeCtx, declared_type: &str, offset: usize) -> (Value, usize) {
    let buf = ctx.buffer;
    match declared_type {
        "char" => (
            Value::Scalar(Scalar::Char(parse_i8(&buf[offset..offset + 1], ctx.endianness))),
            1,
        ),
        "uchar" => (
            Value::Scalar(Scalar::UChar(parse_u8(&buf[offset..offset + 1], ctx.endianness))),
            1,
        ),
        "short" => (
            Value::Scalar(Scalar::Short(parse_i16(&buf[offset..offset + 2], ctx.endianness))),
            2,
        ),
        "ushort" => (
            Value::Scalar(Scalar::UShort(parse_u16(&buf[offset..offset + 2], ctx.endianness))),
            2,
        ),
        // `long` is read exactly like `int`: both are 4-byte signed values on
        // every platform this format is written from.
        "int" | "long" => (
            Value::Scalar(Scalar::Int(parse_i32(&buf[offset..offset + 4], ctx.endianness))),
            4,
        ),
        "ulong" => (
            Value::Scalar(Scalar::ULong(parse_u32(&buf[offset..offset + 4], ctx.endianness))),
            4,
        ),
        "float" => (
            Value::Scalar(Scalar::Float(parse_f32(&buf[offset..offset + 4], ctx.endianness))),
            4,
        ),
        "double" => (
            Value::Scalar(Scalar::Double(parse_f64(&buf[offset..offset + 8], ctx.endianness))),
            8,
        ),
        "int64_t" => (
            Value::Scalar(Scalar::Int64(parse_i64(&buf[offset..offset + 8], ctx.endianness))),
            8,
        ),
        "uint64_t" => (
            Value::Scalar(Scalar::UInt64(parse_u64(&buf[offset..offset + 8], ctx.endianness))),
            8,
        ),
        _ => (Value::Unresolved, 0),
    }
}

fn materialize_char_string(
    ctx: &MaterializeCtx,
    field: &FieldSpec,
    offset: usize,
    diagnostics: &mut Vec<Diagnostic>,
    owner_old_address: u64,
) -> (Value, usize) {
    let len = field.dimensions[0];
    let raw = &ctx.buffer[offset..offset + len];
    let trimmed: Vec<u8> = raw.iter().take_while(|&&b| b != 0).cloned().collect();
    let value = match String::from_utf8(trimmed.clone()) {
        Ok(s) => StringValue::Utf8(s),
        Err(_) => {
            diagnostics.push(Diagnostic::Utf8DecodeFallback {
                block_old_address: owner_old_address,
                member: field.raw_spelling.clone(),
            });
            StringValue::Raw(trimmed)
        }
    };
    (Value::Str(value), len)
}

#[allow(clippy::too_many_arguments)]
fn materialize_array(
    ctx: &MaterializeCtx,
    block_ref: BlockRef,
    owner_struct: &str,
    owner_old_address: u64,
    field: &FieldSpec,
    offset: usize,
    diagnostics: &mut Vec<Diagnostic>,
    pending_refs: &mut Vec<(BlockRef, Referrer)>,
) -> (Value, usize) {
    let mut inner = field.clone();
    let outer_dim = inner.dimensions.remove(0);

    let mut items = Vec::with_capacity(outer_dim);
    let mut cursor = offset;
    for _ in 0..outer_dim {
        let (member, consumed) = materialize_member(
            ctx,
            block_ref,
            owner_struct,
            owner_old_address,
            &inner,
            cursor,
            diagnostics,
            pending_refs,
        );
        cursor += consumed;
        items.push(member.value);
    }
    (Value::Array(items), cursor - offset)
}

fn materialize_nested_struct(
    ctx: &MaterializeCtx,
    block_ref: BlockRef,
    owner_old_address: u64,
    field: &FieldSpec,
    offset: usize,
    diagnostics: &mut Vec<Diagnostic>,
    pending_refs: &mut Vec<(BlockRef, Referrer)>,
) -> (Value, usize) {
    match ctx.sdna.struct_index_for_type(&field.declared_type) {
        Some(struct_index) => {
            let nested_fields =
                field_specs_for_struct(ctx.sdna, struct_index, diagnostics, owner_old_address);
            let (mut instance, consumed) = materialize_struct(
                ctx,
                block_ref,
                &field.declared_type,
                owner_old_address,
                &nested_fields,
                offset,
                diagnostics,
                pending_refs,
            );
            instance.member_name = Some(field.name.clone());
            (Value::Struct(instance), consumed)
        }
        None => {
            diagnostics.push(Diagnostic::UnknownTypeName {
                block_old_address: owner_old_address,
                type_name: field.declared_type.clone(),
            });
            // Skip the bytes the SDNA says this type occupies so sibling
            // members don't desync.
            let skip = ctx.sdna.type_size(&field.declared_type).unwrap_or(0);
            (Value::Unresolved, skip)
        }
    }
}

/// Materializes every block whose SDNA struct index names a known struct and
/// that hasn't already been claimed by a well-known block handler.
pub fn materialize_first_pass(
    sdna: &Sdna,
    buffer: &[u8],
    endianness: Endianness,
    pointer_size: PointerSize,
    address_index: &HashMap<u64, BlockRef>,
    blocks: &mut [Block],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<(BlockRef, Referrer)> {
    let ctx = MaterializeCtx {
        sdna,
        buffer,
        endianness,
        pointer_size,
        address_index,
    };
    let mut pending_refs = Vec::new();

    for block_ref in 0..blocks.len() {
        if blocks[block_ref].processed {
            continue;
        }
        let header = blocks[block_ref].header.clone();
        if header.sdna_index <= 0 {
            continue;
        }
        let struct_index = header.sdna_index as usize;
        let struct_def = match sdna.structs.get(struct_index) {
            Some(def) => def,
            None => {
                diagnostics.push(Diagnostic::UnknownStructIndex {
                    block_old_address: header.old_address,
                    struct_index: header.sdna_index,
                });
                continue;
            }
        };
        let struct_name = sdna.types[struct_def.type_index].name.clone();
        let fields =
            field_specs_for_struct(sdna, struct_index, diagnostics, header.old_address);

        let instances = materialize_instances(
            &ctx,
            block_ref,
            &struct_name,
            header.old_address,
            &fields,
            header.payload_offset,
            header.count.max(0) as usize,
            diagnostics,
            &mut pending_refs,
        );
        blocks[block_ref].instances = instances;
        blocks[block_ref].processed = true;
    }

    pending_refs
}

/// Materializes blocks the inferencer annotated with an ad-hoc layout, or
/// whose SDNA struct index it rewrote (the `bNodeSocket` rule).
pub fn materialize_second_pass(
    sdna: &Sdna,
    buffer: &[u8],
    endianness: Endianness,
    pointer_size: PointerSize,
    address_index: &HashMap<u64, BlockRef>,
    blocks: &mut [Block],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<(BlockRef, Referrer)> {
    let ctx = MaterializeCtx {
        sdna,
        buffer,
        endianness,
        pointer_size,
        address_index,
    };
    let mut pending_refs = Vec::new();

    for block_ref in 0..blocks.len() {
        if blocks[block_ref].processed {
            continue;
        }
        let header = blocks[block_ref].header.clone();

        let (struct_name, fields, count) =
            if let Some(layout) = blocks[block_ref].ad_hoc_layout.clone() {
                (layout.struct_name, layout.members, 1)
            } else if header.sdna_index > 0 {
                match sdna.structs.get(header.sdna_index as usize) {
                    Some(def) => {
                        let name = sdna.types[def.type_index].name.clone();
                        let fields = field_specs_for_struct(
                            sdna,
                            header.sdna_index as usize,
                            diagnostics,
                            header.old_address,
                        );
                        (name, fields, header.count.max(0) as usize)
                    }
                    None => continue,
                }
            } else {
                continue;
            };

        let instances = materialize_instances(
            &ctx,
            block_ref,
            &struct_name,
            header.old_address,
            &fields,
            header.payload_offset,
            count,
            diagnostics,
            &mut pending_refs,
        );
        blocks[block_ref].instances = instances;
        blocks[block_ref].processed = true;
    }

    pending_refs
}

/// Applies pointer fixup results gathered during a materialization pass to
/// the blocks they point at.
pub fn apply_pending_refs(blocks: &mut [Block], pending: Vec<(BlockRef, Referrer)>) {
    for (target, referrer) in pending {
        blocks[target].back_refs.record(referrer);
    }
}
