//! File delivery (FD) item framework: partitioning, FEC and file
//! reservoirs, session groups, and group id naming.

use super::{children_from, BoxFields};
use crate::cursor::Cursor;
use crate::error::Result;
use crate::header::read_box_header;
use crate::node::BoxNode;
use crate::registry::RawBox;
use crate::tree::Parent;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FdItemInformation {
    pub entry_count: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReservoir {
    pub entry_count: u32,
    pub entries: Vec<ReservoirEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FecReservoir {
    pub entry_count: u32,
    pub entries: Vec<ReservoirEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservoirEntry {
    pub item_id: u32,
    pub symbol_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilePartition {
    pub item_id: u32,
    pub packet_payload_size: u16,
    pub fec_encoding_id: u8,
    pub fec_instance_id: u16,
    pub max_source_block_length: u16,
    pub encoding_symbol_length: u16,
    pub max_number_of_encoding_symbols: u16,
    /// Hex rendering of the scheme-specific bytes.
    pub scheme_specific_info: String,
    pub entry_count: u32,
    pub entries: Vec<PartitionEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionEntry {
    pub block_count: u16,
    pub block_size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FdSessionGroup {
    pub num_session_groups: u16,
    pub session_groups: Vec<SessionGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionGroup {
    pub group_ids: Vec<u32>,
    pub channels: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupIdToName {
    pub entry_count: u16,
    pub entries: Vec<GroupName>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupName {
    pub group_id: u32,
    pub group_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtraData {
    pub data_offset: u64,
    pub data_len: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FecInformation {
    pub fec_encoding_id: u8,
    pub fec_instance_id: u16,
    pub source_block_number: u16,
    pub encoding_symbol_id: u16,
}

pub(crate) fn fiin(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u16()?;
    node.fields = BoxFields::FdItemInformation(FdItemInformation { entry_count });
    node.children = children_from(cur.remaining_slice(), cur.offset(), &node, depth)?;
    Ok(Some(node))
}

fn reservoir_entries(cur: &mut Cursor<'_>, version: u8) -> Result<(u32, Vec<ReservoirEntry>)> {
    let entry_count = if version == 0 {
        cur.read_u16()? as u32
    } else {
        cur.read_u32()?
    };
    let mut entries = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        let item_id = if version == 0 {
            cur.read_u16()? as u32
        } else {
            cur.read_u32()?
        };
        entries.push(ReservoirEntry { item_id, symbol_count: cur.read_u32()? });
    }
    Ok((entry_count, entries))
}

pub(crate) fn fire(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let (entry_count, entries) = reservoir_entries(&mut cur, fb.version)?;
    node.fields = BoxFields::FileReservoir(FileReservoir { entry_count, entries });
    Ok(Some(node))
}

pub(crate) fn fecr(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let (entry_count, entries) = reservoir_entries(&mut cur, fb.version)?;
    node.fields = BoxFields::FecReservoir(FecReservoir { entry_count, entries });
    Ok(Some(node))
}

/// NUL-terminated byte run, consumed including the terminator.
fn take_until_nul<'a>(cur: &mut Cursor<'a>) -> Result<&'a [u8]> {
    let rest = cur.remaining_slice();
    let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let bytes = &rest[..end];
    cur.skip((end + 1).min(rest.len()))?;
    Ok(bytes)
}

pub(crate) fn fpar(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let item_id = if fb.version == 0 {
        cur.read_u16()? as u32
    } else {
        cur.read_u32()?
    };
    let packet_payload_size = cur.read_u16()?;
    let fec_encoding_id = cur.read_u8()?;
    let fec_instance_id = cur.read_u16()?;
    let max_source_block_length = cur.read_u16()?;
    let encoding_symbol_length = cur.read_u16()?;
    let max_number_of_encoding_symbols = cur.read_u16()?;
    let scheme_specific_info = hex::encode(take_until_nul(&mut cur)?);

    let entry_count = if fb.version == 0 {
        cur.read_u16()? as u32
    } else {
        cur.read_u32()?
    };
    let mut entries = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        entries.push(PartitionEntry {
            block_count: cur.read_u16()?,
            block_size: cur.read_u32()?,
        });
    }

    node.fields = BoxFields::FilePartition(FilePartition {
        item_id,
        packet_payload_size,
        fec_encoding_id,
        fec_instance_id,
        max_source_block_length,
        encoding_symbol_length,
        max_number_of_encoding_symbols,
        scheme_specific_info,
        entry_count,
        entries,
    });
    Ok(Some(node))
}

pub(crate) fn segr(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let mut node = raw.node();
    let mut cur = raw.cursor();

    let num_session_groups = cur.read_u16()?;
    let mut session_groups = Vec::with_capacity(num_session_groups as usize);
    for _ in 0..num_session_groups {
        let entry_count = cur.read_u8()?;
        let mut group_ids = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            group_ids.push(cur.read_u32()?);
        }
        let num_channels = cur.read_u16()?;
        let mut channels = Vec::with_capacity(num_channels as usize);
        for _ in 0..num_channels {
            channels.push(cur.read_u32()?);
        }
        session_groups.push(SessionGroup { group_ids, channels });
    }

    node.fields = BoxFields::FdSessionGroup(FdSessionGroup { num_session_groups, session_groups });
    Ok(Some(node))
}

pub(crate) fn gitn(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u16()?;
    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        entries.push(GroupName {
            group_id: cur.read_u32()?,
            group_name: cur.read_cstring(),
        });
    }

    node.fields = BoxFields::GroupIdToName(GroupIdToName { entry_count, entries });
    Ok(Some(node))
}

/// An optional leading feci sub-box followed by opaque extra bytes. The
/// sub-box becomes a child node; the rest is recorded by position only.
pub(crate) fn extr(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let mut node = raw.node();
    let mut cur = raw.cursor();

    if let Some(peek) = cur.peek(8) {
        if &peek[4..8] == b"feci" {
            let header = read_box_header(cur.remaining_slice(), cur.offset())?;
            let span = (header.size as usize).min(cur.remaining());
            let sub = RawBox { header, data: &cur.remaining_slice()[..span] };
            if let Some(child) = feci(&sub, None, depth + 1)? {
                node.children.push(child);
            }
            cur.skip(span)?;
        }
    }

    node.fields = BoxFields::ExtraData(ExtraData {
        data_offset: cur.offset(),
        data_len: cur.remaining() as u64,
    });
    Ok(Some(node))
}

pub(crate) fn feci(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let mut node = raw.node();
    let mut cur = raw.cursor();

    node.fields = BoxFields::FecInformation(FecInformation {
        fec_encoding_id: cur.read_u8()?,
        fec_instance_id: cur.read_u16()?,
        source_block_number: cur.read_u16()?,
        encoding_symbol_id: cur.read_u16()?,
    });
    Ok(Some(node))
}
