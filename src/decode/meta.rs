//! Meta boxes: item location/information/reference tables, primary item,
//! protection scheme framing, and stereo video arrangement.

use super::{children_from, read_uint, BoxFields};
use crate::error::Result;
use crate::node::BoxNode;
use crate::registry::RawBox;
use crate::tree::Parent;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ItemLocation {
    pub offset_size: u8,
    pub length_size: u8,
    pub base_offset_size: u8,
    /// Versions 1 and 2 only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_size: Option<u8>,
    pub item_count: u32,
    pub items: Vec<ItemLocationEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemLocationEntry {
    pub item_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construction_method: Option<u16>,
    pub data_reference_index: u16,
    pub base_offset: u64,
    pub extent_count: u16,
    pub extents: Vec<ItemExtent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemExtent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent_index: Option<u64>,
    pub extent_offset: u64,
    pub extent_length: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemProtection {
    pub protection_count: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct SrtpProcess {
    pub encryption_algorithm_rtp: u32,
    pub encryption_algorithm_rtcp: u32,
    pub integrity_algorithm_rtp: u32,
    pub integrity_algorithm_rtcp: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OriginalFormat {
    pub data_format: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemeType {
    pub scheme_type: String,
    pub scheme_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StereoVideo {
    pub single_view_allowed: u32,
    pub stereo_scheme: u32,
    pub length: u32,
    pub stereo_indication_type: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemInformation {
    pub entry_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemInfoEntry {
    pub item_id: u32,
    pub item_protection_index: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_uri_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_type: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fd_extension: Option<FdItemInfoExtension>,
}

/// File delivery extension record carried by version 1 entries.
#[derive(Debug, Clone, Serialize)]
pub struct FdItemInfoExtension {
    pub content_location: String,
    pub content_md5: String,
    pub content_length: u64,
    pub transfer_length: u64,
    pub entry_count: u8,
    pub group_ids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrimaryItem {
    pub item_id: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReference {
    pub from_item_id: u32,
    pub reference_count: u16,
    pub to_item_ids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetaboxRelation {
    pub first_metabox_handler_type: u32,
    pub second_metabox_handler_type: u32,
    pub metabox_relation: u8,
}

pub(crate) fn meta(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.children = children_from(cur.remaining_slice(), cur.offset(), &node, depth)?;
    Ok(Some(node))
}

pub(crate) fn iloc(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 2 {
        return Ok(Some(node));
    }

    let b = cur.read_u8()?;
    let offset_size = b >> 4;
    let length_size = b & 0xf;
    let b = cur.read_u8()?;
    let base_offset_size = b >> 4;
    let index_size = if fb.version >= 1 { Some(b & 0xf) } else { None };

    let item_count = if fb.version == 2 {
        cur.read_u32()?
    } else {
        cur.read_u16()? as u32
    };

    let mut items = Vec::with_capacity(item_count.min(1 << 16) as usize);
    for _ in 0..item_count {
        let item_id = if fb.version == 2 {
            cur.read_u32()?
        } else {
            cur.read_u16()? as u32
        };
        let construction_method = if fb.version >= 1 {
            Some(cur.read_u16()? & 0xf)
        } else {
            None
        };
        let data_reference_index = cur.read_u16()?;
        let base_offset = read_uint(&mut cur, base_offset_size, "iloc base_offset")?;
        let extent_count = cur.read_u16()?;

        let mut extents = Vec::with_capacity(extent_count as usize);
        for _ in 0..extent_count {
            let extent_index = match index_size {
                Some(n) if n > 0 => Some(read_uint(&mut cur, n, "iloc extent_index")?),
                _ => None,
            };
            extents.push(ItemExtent {
                extent_index,
                extent_offset: read_uint(&mut cur, offset_size, "iloc extent_offset")?,
                extent_length: read_uint(&mut cur, length_size, "iloc extent_length")?,
            });
        }

        items.push(ItemLocationEntry {
            item_id,
            construction_method,
            data_reference_index,
            base_offset,
            extent_count,
            extents,
        });
    }

    node.fields = BoxFields::ItemLocation(ItemLocation {
        offset_size,
        length_size,
        base_offset_size,
        index_size,
        item_count,
        items,
    });
    Ok(Some(node))
}

pub(crate) fn ipro(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let protection_count = cur.read_u16()?;
    node.fields = BoxFields::ItemProtection(ItemProtection { protection_count });
    let mut children = children_from(cur.remaining_slice(), cur.offset(), &node, depth)?;
    children.truncate(protection_count as usize);
    node.children = children;
    Ok(Some(node))
}

pub(crate) fn srpp(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::SrtpProcess(SrtpProcess {
        encryption_algorithm_rtp: cur.read_u32()?,
        encryption_algorithm_rtcp: cur.read_u32()?,
        integrity_algorithm_rtp: cur.read_u32()?,
        integrity_algorithm_rtcp: cur.read_u32()?,
    });
    node.children = children_from(cur.remaining_slice(), cur.offset(), &node, depth)?;
    Ok(Some(node))
}

pub(crate) fn frma(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let mut node = raw.node();
    let mut cur = raw.cursor();

    node.fields = BoxFields::OriginalFormat(OriginalFormat {
        data_format: cur.read_fourcc()?.trimmed(),
    });
    Ok(Some(node))
}

pub(crate) fn schm(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let scheme_type = cur.read_fourcc()?.trimmed();
    let scheme_version = cur.read_u32()?;
    let scheme_uri = if fb.flag(0x1) { Some(cur.read_cstring()) } else { None };

    node.fields = BoxFields::SchemeType(SchemeType { scheme_type, scheme_version, scheme_uri });
    Ok(Some(node))
}

pub(crate) fn stvi(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let single_view_allowed = cur.read_u32()? & 0x3;
    let stereo_scheme = cur.read_u32()?;
    let length = cur.read_u32()?;
    let stereo_indication_type = cur.take(length as usize)?.to_vec();

    node.fields = BoxFields::StereoVideo(StereoVideo {
        single_view_allowed,
        stereo_scheme,
        length,
        stereo_indication_type,
    });
    node.children = children_from(cur.remaining_slice(), cur.offset(), &node, depth)?;
    Ok(Some(node))
}

pub(crate) fn iinf(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let entry_count = if fb.version == 0 {
        cur.read_u16()? as u32
    } else {
        cur.read_u32()?
    };

    node.fields = BoxFields::ItemInformation(ItemInformation { entry_count });
    node.children = children_from(cur.remaining_slice(), cur.offset(), &node, depth)?;
    Ok(Some(node))
}

pub(crate) fn infe(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 3 {
        return Ok(Some(node));
    }

    let mut entry = if fb.version <= 1 {
        let item_id = cur.read_u16()? as u32;
        let item_protection_index = cur.read_u16()?;
        ItemInfoEntry {
            item_id,
            item_protection_index,
            item_type: None,
            item_name: cur.read_cstring(),
            content_type: Some(cur.read_cstring()),
            content_encoding: Some(cur.read_cstring()),
            item_uri_type: None,
            extension_type: None,
            fd_extension: None,
        }
    } else {
        let item_id = if fb.version == 2 {
            cur.read_u16()? as u32
        } else {
            cur.read_u32()?
        };
        let item_protection_index = cur.read_u16()?;
        let item_type = cur.read_fourcc()?;
        let item_name = cur.read_cstring();
        let mut entry = ItemInfoEntry {
            item_id,
            item_protection_index,
            item_type: Some(item_type.trimmed()),
            item_name,
            content_type: None,
            content_encoding: None,
            item_uri_type: None,
            extension_type: None,
            fd_extension: None,
        };
        match &item_type.0 {
            b"mime" => {
                entry.content_type = Some(cur.read_cstring());
                entry.content_encoding = Some(cur.read_cstring());
            }
            b"uri " => entry.item_uri_type = Some(cur.read_cstring()),
            _ => {}
        }
        entry
    };

    if fb.version == 1 && cur.remaining() >= 4 {
        entry.extension_type = Some(cur.read_u32()?);
        let content_location = cur.read_cstring();
        let content_md5 = cur.read_cstring();
        let content_length = cur.read_u64()?;
        let transfer_length = cur.read_u64()?;
        let entry_count = cur.read_u8()?;
        let mut group_ids = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            group_ids.push(cur.read_u32()?);
        }
        entry.fd_extension = Some(FdItemInfoExtension {
            content_location,
            content_md5,
            content_length,
            transfer_length,
            entry_count,
            group_ids,
        });
    }

    node.fields = BoxFields::ItemInfoEntry(entry);
    Ok(Some(node))
}

pub(crate) fn pitm(
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

    node.fields = BoxFields::PrimaryItem(PrimaryItem { item_id });
    Ok(Some(node))
}

pub(crate) fn iref(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    node.children = children_from(cur.remaining_slice(), cur.offset(), &node, depth)?;
    Ok(Some(node))
}

/// Reference entries (hint, cdsc, font, hind, vdep, vplx, subt) only carry
/// a defined layout inside iref; the item id width follows its version.
/// Anywhere else the code is treated as opaque.
pub(crate) fn item_reference(
    raw: &RawBox<'_>,
    parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let version = match parent {
        Some(p) if p.typ.is("iref") => p.version.unwrap_or(0),
        _ => return Ok(None),
    };

    let mut node = raw.node();
    let mut cur = raw.cursor();

    let from_item_id = if version == 0 {
        cur.read_u16()? as u32
    } else {
        cur.read_u32()?
    };
    let reference_count = cur.read_u16()?;
    let mut to_item_ids = Vec::with_capacity(reference_count as usize);
    for _ in 0..reference_count {
        to_item_ids.push(if version == 0 {
            cur.read_u16()? as u32
        } else {
            cur.read_u32()?
        });
    }

    node.fields = BoxFields::ItemReference(ItemReference {
        from_item_id,
        reference_count,
        to_item_ids,
    });
    Ok(Some(node))
}

pub(crate) fn mere(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::MetaboxRelation(MetaboxRelation {
        first_metabox_handler_type: cur.read_u32()?,
        second_metabox_handler_type: cur.read_u32()?,
        metabox_relation: cur.read_u8()?,
    });
    Ok(Some(node))
}
