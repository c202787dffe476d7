//! Second pass over blocks the SDNA can't describe on its own: void pointers,
//! `char *` blobs, and anything else whose real shape only becomes apparent
//! by looking at who points at it and what else that owner's struct says.
//!
//! Every rule here only runs against blocks left unprocessed by
//! [`crate::materialize::materialize_first_pass`], using the back-references
//! that pass recorded to find the one or two owning structs worth inspecting
//! instead of scanning the whole file.

use crate::{
    image_sink::ImageSink,
    model::{AdHocLayout, Block, BlockRef, FieldSpec, MemberInstance, Referrer, Scalar, StructInstance, Value},
    parsers::{dna::Sdna, PointerSize},
};

fn field(declared_type: &str, name: &str, pointer_depth: usize, dims: Vec<usize>) -> FieldSpec {
    let stars = "*".repeat(pointer_depth);
    let dim_suffix: String = dims.iter().map(|d| format!("[{}]", d)).collect();
    FieldSpec {
        declared_type: declared_type.to_owned(),
        raw_spelling: format!("{}{}{}", stars, name, dim_suffix),
        name: name.to_owned(),
        dimensions: dims,
        pointer_depth,
    }
}

fn single_field_layout(struct_name: &str, f: FieldSpec) -> AdHocLayout {
    AdHocLayout {
        struct_name: struct_name.to_owned(),
        members: vec![f],
    }
}

/// Finds the first struct instance (searching into nested structs and
/// arrays) of type `owner_struct` that owns a member spelled exactly
/// `member_spelling` whose pointer resolves to `target`.
fn find_owning_instance<'a>(
    instances: &'a [StructInstance],
    owner_struct: &str,
    member_spelling: &str,
    target: BlockRef,
) -> Option<&'a StructInstance> {
    for instance in instances {
        if let Some(found) = search_nested(instance, owner_struct, member_spelling, target) {
            return Some(found);
        }
    }
    None
}

fn search_nested<'a>(
    instance: &'a StructInstance,
    owner_struct: &str,
    member_spelling: &str,
    target: BlockRef,
) -> Option<&'a StructInstance> {
    if instance.type_name == owner_struct {
        if let Some(member) = instance.members.values().find(|m| m.spelling == member_spelling) {
            if member_points_at(member, target) {
                return Some(instance);
            }
        }
    }
    for member in instance.members.values() {
        match &member.value {
            Value::Struct(nested) => {
                if let Some(found) = search_nested(nested, owner_struct, member_spelling, target) {
                    return Some(found);
                }
            }
            Value::Array(items) => {
                for item in items {
                    if let Value::Struct(nested) = item {
                        if let Some(found) = search_nested(nested, owner_struct, member_spelling, target) {
                            return Some(found);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn member_points_at(member: &MemberInstance, target: BlockRef) -> bool {
    match &member.value {
        Value::Pointer(p) => p.target == Some(target),
        Value::Array(items) => items
            .iter()
            .any(|v| matches!(v, Value::Pointer(p) if p.target == Some(target))),
        _ => false,
    }
}

/// Finds the nearest ancestor instance of type `IDProperty` whose nested
/// `data.pointer` member resolves to `target`.
fn find_idproperty_ancestor<'a>(
    instances: &'a [StructInstance],
    target: BlockRef,
) -> Option<&'a StructInstance> {
    for instance in instances {
        if let Some(found) = idproperty_ancestor_search(instance, target) {
            return Some(found);
        }
    }
    None
}

fn idproperty_ancestor_search<'a>(
    instance: &'a StructInstance,
    target: BlockRef,
) -> Option<&'a StructInstance> {
    if instance.type_name == "IDProperty" {
        if let Some(Value::Struct(data)) = instance.member("data").map(|m| &m.value) {
            if data.type_name == "IDPropertyData" {
                if let Some(pointer_member) = data.member("pointer") {
                    if member_points_at(pointer_member, target) {
                        return Some(instance);
                    }
                }
            }
        }
    }
    for member in instance.members.values() {
        match &member.value {
            Value::Struct(nested) => {
                if let Some(found) = idproperty_ancestor_search(nested, target) {
                    return Some(found);
                }
            }
            Value::Array(items) => {
                for item in items {
                    if let Value::Struct(nested) = item {
                        if let Some(found) = idproperty_ancestor_search(nested, target) {
                            return Some(found);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn scalar_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Scalar(Scalar::Int(v)) => Some(i64::from(*v)),
        Value::Scalar(Scalar::Short(v)) => Some(i64::from(*v)),
        Value::Scalar(Scalar::UShort(v)) => Some(i64::from(*v)),
        Value::Scalar(Scalar::Char(v)) => Some(i64::from(*v)),
        Value::Scalar(Scalar::UChar(v)) => Some(i64::from(*v)),
        Value::Scalar(Scalar::ULong(v)) => Some(i64::from(*v)),
        _ => None,
    }
}

/// `bNodeSocket.type` -> concrete value struct name, for the variants this
/// crate can resolve. `SOCK_SHADER` (3) and `SOCK_STRING` (5) have no fixed
/// struct backing `default_value` and are left unresolved.
fn node_socket_value_struct(socket_type: i64) -> Option<&'static str> {
    match socket_type {
        0 => Some("bNodeSocketValueFloat"),
        1 => Some("bNodeSocketValueVector"),
        2 => Some("bNodeSocketValueRGBA"),
        4 => Some("bNodeSocketValueBoolean"),
        6 => Some("bNodeSocketValueInt"),
        7 => Some("bNodeSocketValueString"),
        _ => None,
    }
}

/// Examines every unprocessed block's recorded referrers and, where one of
/// the known shapes applies, attaches an [`AdHocLayout`] or rewrites the
/// block's SDNA struct index so the next materialization pass handles it
/// like any other typed block.
pub fn infer_layouts<S: ImageSink>(
    sdna: &Sdna,
    pointer_size: PointerSize,
    buffer: &[u8],
    blocks: &mut [Block],
    image_sink: &mut S,
) {
    let snapshot: Vec<Block> = blocks.to_vec();

    for block_ref in 0..blocks.len() {
        if snapshot[block_ref].processed {
            continue;
        }
        let referrers = snapshot[block_ref].back_refs.referrers.clone();
        let length = snapshot[block_ref].header.length;

        for referrer in &referrers {
            let owner_instances = &snapshot[referrer.owner_block].instances;
            let layout = infer_ad_hoc_layout(referrer, owner_instances, block_ref, length, pointer_size);
            if layout.is_some() {
                blocks[block_ref].ad_hoc_layout = layout;
                break;
            }

            if referrer.owner_struct == "bNodeSocket" && referrer.member_spelling == "*default_value" {
                rewrite_node_socket_struct_index(sdna, owner_instances, block_ref, blocks);
            }
        }
    }

    infer_preview_images(blocks, buffer, image_sink);
}

fn infer_ad_hoc_layout(
    referrer: &Referrer,
    owner_instances: &[StructInstance],
    target: BlockRef,
    length: usize,
    pointer_size: PointerSize,
) -> Option<AdHocLayout> {
    match (referrer.owner_struct.as_str(), referrer.member_spelling.as_str()) {
        ("Paint", "*tool_slots") if referrer.member_type == "PaintToolSlot" => {
            let width = pointer_size.bytes_num();
            Some(single_field_layout(
                "PaintToolSlot",
                field("PaintToolSlot", "tool_slots", 1, vec![length / width.max(1)]),
            ))
        }
        (owner, "**mat")
            if referrer.member_type == "Material"
                && (owner == "Object" || owner == "Mesh")
                && length == pointer_size.bytes_num() =>
        {
            Some(single_field_layout("Material", field("Material", "mat", 1, Vec::new())))
        }
        ("Object", "*matbits") => Some(single_field_layout(
            "matbits",
            field("uchar", "matbits", 0, vec![length]),
        )),
        ("ConsoleLine", "*line") => Some(single_field_layout(
            "line",
            field("char", "line", 0, vec![length]),
        )),
        ("CustomDataLayer", "*data") if referrer.member_type == "void" => {
            find_owning_instance(owner_instances, "CustomDataLayer", "*data", target)
                .and_then(|owner| owner.member("type"))
                .and_then(|m| scalar_as_i64(&m.value))
                .filter(|&t| t == 34)
                .map(|_| single_field_layout("paintMask", field("float", "paintMask", 0, vec![length / 4])))
        }
        ("IDPropertyData", "*pointer") if referrer.member_type == "void" => {
            find_idproperty_ancestor(owner_instances, target).and_then(|ancestor| {
                let ty = ancestor.member("type").and_then(|m| scalar_as_i64(&m.value));
                let subtype = ancestor
                    .member("subtype")
                    .and_then(|m| scalar_as_i64(&m.value))
                    .unwrap_or(0);
                if ty == Some(0) && subtype == 0 {
                    Some(single_field_layout(
                        "stringData",
                        field("char", "stringData", 0, vec![length]),
                    ))
                } else {
                    None
                }
            })
        }
        _ => None,
    }
}

fn rewrite_node_socket_struct_index(
    sdna: &Sdna,
    owner_instances: &[StructInstance],
    target: BlockRef,
    blocks: &mut [Block],
) {
    let socket_type = find_owning_instance(owner_instances, "bNodeSocket", "*default_value", target)
        .and_then(|owner| owner.member("type"))
        .and_then(|m| scalar_as_i64(&m.value));

    let struct_index = socket_type
        .and_then(node_socket_value_struct)
        .and_then(|name| sdna.struct_index_for_type(name));

    if let Some(struct_index) = struct_index {
        blocks[target].header.sdna_index = struct_index as i32;
    }
}

/// `PreviewImage` blocks carry two embedded raster images (icon and preview
/// sizes) behind `int w[2]`, `int h[2]`, `int *rect[2]`. Each unprocessed
/// `rect[i]` target is `w[i] * h[i]` RGBA pixels, handed to the image sink
/// tagged with a hex rendering of the block's old address, then replaced
/// with a synthesized `{width, height, name}` descriptor rather than going
/// through the second-pass materializer at all.
fn infer_preview_images<S: ImageSink>(blocks: &mut [Block], buffer: &[u8], image_sink: &mut S) {
    let snapshot: Vec<Block> = blocks.to_vec();

    for block_ref in 0..blocks.len() {
        if snapshot[block_ref].processed || snapshot[block_ref].ad_hoc_layout.is_some() {
            continue;
        }

        let referrer = match snapshot[block_ref]
            .back_refs
            .referrers
            .iter()
            .find(|r| r.owner_struct == "PreviewImage" && r.member_spelling == "*rect[2]")
        {
            Some(r) => r.clone(),
            None => continue,
        };

        let owner = match find_owning_instance(
            &snapshot[referrer.owner_block].instances,
            "PreviewImage",
            "*rect[2]",
            block_ref,
        ) {
            Some(o) => o,
            None => continue,
        };

        let index = match owner.member("rect").and_then(|m| rect_index_for(&m.value, block_ref)) {
            Some(i) => i,
            None => continue,
        };

        let (width, height) = match (
            owner.member("w").and_then(|m| array_element(&m.value, index)),
            owner.member("h").and_then(|m| array_element(&m.value, index)),
        ) {
            (Some(w), Some(h)) => (w, h),
            _ => continue,
        };

        let expected = width as usize * height as usize * 4;
        let header = &snapshot[block_ref].header;
        if header.length < expected {
            continue;
        }
        let rgba = &buffer[header.payload_offset..header.payload_offset + expected];
        let name = format!("{:#x}", header.old_address);

        image_sink.emit(width, height, rgba, &name);

        blocks[block_ref].instances = vec![preview_descriptor(block_ref, width, height, &name)];
        blocks[block_ref].processed = true;
    }
}

fn rect_index_for(value: &Value, target: BlockRef) -> Option<usize> {
    match value {
        Value::Array(items) => items.iter().position(|v| matches!(v, Value::Pointer(p) if p.target == Some(target))),
        _ => None,
    }
}

fn array_element(value: &Value, index: usize) -> Option<u32> {
    match value {
        Value::Array(items) => items.get(index).and_then(scalar_as_i64).map(|v| v as u32),
        _ => None,
    }
}

fn preview_descriptor(block_ref: BlockRef, width: u32, height: u32, name: &str) -> StructInstance {
    let mut members = linked_hash_map::LinkedHashMap::new();
    members.insert(
        "width".to_owned(),
        MemberInstance {
            declared_type: "int".to_owned(),
            spelling: "width".to_owned(),
            dimensions: Vec::new(),
            is_primitive: true,
            is_pointer: false,
            value: Value::Scalar(Scalar::Int(width as i32)),
        },
    );
    members.insert(
        "height".to_owned(),
        MemberInstance {
            declared_type: "int".to_owned(),
            spelling: "height".to_owned(),
            dimensions: Vec::new(),
            is_primitive: true,
            is_pointer: false,
            value: Value::Scalar(Scalar::Int(height as i32)),
        },
    );
    let name_len = name.len() + 1;
    members.insert(
        "name".to_owned(),
        MemberInstance {
            declared_type: "char".to_owned(),
            spelling: format!("name[{}]", name_len),
            dimensions: vec![name_len],
            is_primitive: true,
            is_pointer: false,
            value: Value::Str(crate::model::StringValue::Utf8(name.to_owned())),
        },
    );

    StructInstance {
        type_name: "PreviewImageRaster".to_owned(),
        member_name: None,
        block: block_ref,
        members,
    }
}
