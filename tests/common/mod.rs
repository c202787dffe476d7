//! Byte-buffer builders shared by the end-to-end scenario tests. Mirrors the
//! hand-assembled SDNA/block-header fixtures used by the crate's own unit
//! tests, just reusable across multiple scenario files.

#![allow(dead_code)]

pub fn block_header_bytes(code: &[u8; 4], length: u32, old_address: u64, sdna_index: i32, count: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(code);
    buf.extend_from_slice(&length.to_le_bytes());
    buf.extend_from_slice(&old_address.to_le_bytes());
    buf.extend_from_slice(&sdna_index.to_le_bytes());
    buf.extend_from_slice(&count.to_le_bytes());
    buf
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Builds a full `SDNA` payload (the body of a `DNA1` block) from plain
/// descriptions: every name the NAME table holds, every (type name, byte
/// length) pair the TYPE table holds, and every struct as (type index, list
/// of (field type index, field name index)).
pub fn build_sdna(names: &[&str], types: &[(&str, u16)], structs: &[(u16, &[(u16, u16)])]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"SDNA");

    buf.extend_from_slice(b"NAME");
    buf.extend_from_slice(&(names.len() as u32).to_le_bytes());
    for name in names {
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
    }
    pad4(&mut buf);

    buf.extend_from_slice(b"TYPE");
    buf.extend_from_slice(&(types.len() as u32).to_le_bytes());
    for (name, _) in types {
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
    }
    pad4(&mut buf);

    buf.extend_from_slice(b"TLEN");
    for (_, bytes_len) in types {
        buf.extend_from_slice(&bytes_len.to_le_bytes());
    }
    pad4(&mut buf);

    buf.extend_from_slice(b"STRC");
    buf.extend_from_slice(&(structs.len() as u32).to_le_bytes());
    for (type_index, fields) in structs {
        buf.extend_from_slice(&type_index.to_le_bytes());
        buf.extend_from_slice(&(fields.len() as u16).to_le_bytes());
        for (field_type, field_name) in *fields {
            buf.extend_from_slice(&field_type.to_le_bytes());
            buf.extend_from_slice(&field_name.to_le_bytes());
        }
    }
    buf
}

pub fn dna1_block(dna: &[u8]) -> Vec<u8> {
    let mut buf = block_header_bytes(b"DNA1", dna.len() as u32, 0, 0, 1);
    buf.extend_from_slice(dna);
    buf
}

pub fn endb_block() -> Vec<u8> {
    block_header_bytes(b"ENDB", 0, 0, 0, 0)
}
