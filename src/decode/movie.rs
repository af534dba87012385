//! Movie and track structure: presentation headers, media headers, edit
//! lists, data references, and track grouping/selection.

use super::{children_from, lang_from_u16, BoxFields};
use crate::error::Result;
use crate::node::BoxNode;
use crate::registry::RawBox;
use crate::tree::Parent;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MovieHeader {
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    /// 16.16 fixed point, kept raw.
    pub rate: u32,
    /// 8.8 fixed point, kept raw.
    pub volume: u16,
    pub matrix: [i32; 9],
    pub next_track_id: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackHeader {
    pub creation_time: u64,
    pub modification_time: u64,
    pub track_id: u32,
    pub duration: u64,
    pub layer: i16,
    pub alternate_group: i16,
    pub volume: u16,
    pub matrix: [i32; 9],
    /// 16.16 fixed point, kept raw.
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackReference {
    pub track_ids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackGroup {
    pub track_group_id: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditList {
    pub entry_count: u32,
    pub entries: Vec<EditListEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditListEntry {
    pub segment_duration: u64,
    pub media_time: i64,
    pub media_rate_integer: i16,
    pub media_rate_fraction: i16,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaHeader {
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    pub language: String,
    pub pre_defined: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct Handler {
    pub handler_type: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtendedLanguage {
    pub extended_language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoMediaHeader {
    pub graphicsmode: u16,
    pub opcolor: [u16; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct SoundMediaHeader {
    /// 8.8 signed fixed point, kept raw.
    pub balance: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct HintMediaHeader {
    pub max_pdu_size: u16,
    pub avg_pdu_size: u16,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataReference {
    pub entry_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataEntryUrl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataEntryUrn {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackKind {
    pub scheme_uri: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackSelection {
    pub switch_group: u32,
    pub attribute_list: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubTrackInformation {
    pub switch_group: u16,
    pub alternate_group: u16,
    pub sub_track_id: u32,
    pub attribute_list: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubTrackSampleGroup {
    pub grouping_type: u32,
    pub item_count: u16,
    pub group_description_index: Vec<u32>,
}

pub(crate) fn mvhd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let (creation_time, modification_time, timescale, duration) = if fb.version == 1 {
        (cur.read_u64()?, cur.read_u64()?, cur.read_u32()?, cur.read_u64()?)
    } else {
        (
            cur.read_u32()? as u64,
            cur.read_u32()? as u64,
            cur.read_u32()?,
            cur.read_u32()? as u64,
        )
    };

    let rate = cur.read_u32()?;
    let volume = cur.read_u16()?;
    cur.skip(10)?; // reserved
    let mut matrix = [0i32; 9];
    for v in &mut matrix {
        *v = cur.read_i32()?;
    }
    cur.skip(24)?; // pre_defined
    let next_track_id = cur.read_u32()?;

    node.fields = BoxFields::MovieHeader(MovieHeader {
        creation_time,
        modification_time,
        timescale,
        duration,
        rate,
        volume,
        matrix,
        next_track_id,
    });
    Ok(Some(node))
}

pub(crate) fn tkhd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let (creation_time, modification_time, track_id, duration) = if fb.version == 1 {
        let c = cur.read_u64()?;
        let m = cur.read_u64()?;
        let id = cur.read_u32()?;
        cur.skip(4)?;
        (c, m, id, cur.read_u64()?)
    } else {
        let c = cur.read_u32()? as u64;
        let m = cur.read_u32()? as u64;
        let id = cur.read_u32()?;
        cur.skip(4)?;
        (c, m, id, cur.read_u32()? as u64)
    };

    cur.skip(8)?; // reserved
    let layer = cur.read_i16()?;
    let alternate_group = cur.read_i16()?;
    let volume = cur.read_u16()?;
    cur.skip(2)?; // reserved
    let mut matrix = [0i32; 9];
    for v in &mut matrix {
        *v = cur.read_i32()?;
    }
    let width = cur.read_u32()?;
    let height = cur.read_u32()?;

    node.fields = BoxFields::TrackHeader(TrackHeader {
        creation_time,
        modification_time,
        track_id,
        duration,
        layer,
        alternate_group,
        volume,
        matrix,
        width,
        height,
    });
    Ok(Some(node))
}

/// Flat list of referenced track ids; the nested reference-type framing is
/// not modeled.
pub(crate) fn tref(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let mut node = raw.node();
    let mut cur = raw.cursor();

    let mut track_ids = Vec::new();
    while cur.remaining() >= 4 {
        track_ids.push(cur.read_u32()?);
    }

    node.fields = BoxFields::TrackReference(TrackReference { track_ids });
    Ok(Some(node))
}

pub(crate) fn msrc(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::TrackGroup(TrackGroup { track_group_id: cur.read_u32()? });
    Ok(Some(node))
}

pub(crate) fn elst(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u32()?;
    let mut entries = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        let (segment_duration, media_time) = if fb.version == 1 {
            (cur.read_u64()?, cur.read_i64()?)
        } else {
            (cur.read_u32()? as u64, cur.read_i32()? as i64)
        };
        entries.push(EditListEntry {
            segment_duration,
            media_time,
            media_rate_integer: cur.read_i16()?,
            media_rate_fraction: cur.read_i16()?,
        });
    }

    node.fields = BoxFields::EditList(EditList { entry_count, entries });
    Ok(Some(node))
}

pub(crate) fn mdhd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let (creation_time, modification_time, timescale, duration) = if fb.version == 1 {
        (cur.read_u64()?, cur.read_u64()?, cur.read_u32()?, cur.read_u64()?)
    } else {
        (
            cur.read_u32()? as u64,
            cur.read_u32()? as u64,
            cur.read_u32()?,
            cur.read_u32()? as u64,
        )
    };

    let language = lang_from_u16(cur.read_u16()? & 0x7fff);
    let pre_defined = cur.read_u16()?;

    node.fields = BoxFields::MediaHeader(MediaHeader {
        creation_time,
        modification_time,
        timescale,
        duration,
        language,
        pre_defined,
    });
    Ok(Some(node))
}

pub(crate) fn hdlr(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    cur.skip(4)?; // pre_defined
    let handler_type = cur.read_fourcc()?.trimmed();
    cur.skip(12)?; // reserved
    let name = cur.read_cstring();

    node.fields = BoxFields::Handler(Handler { handler_type, name });
    Ok(Some(node))
}

pub(crate) fn elng(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::ExtendedLanguage(ExtendedLanguage {
        extended_language: cur.read_cstring(),
    });
    Ok(Some(node))
}

pub(crate) fn vmhd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let graphicsmode = cur.read_u16()?;
    let opcolor = [cur.read_u16()?, cur.read_u16()?, cur.read_u16()?];

    node.fields = BoxFields::VideoMediaHeader(VideoMediaHeader { graphicsmode, opcolor });
    Ok(Some(node))
}

pub(crate) fn smhd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::SoundMediaHeader(SoundMediaHeader { balance: cur.read_u16()? });
    Ok(Some(node))
}

pub(crate) fn hmhd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::HintMediaHeader(HintMediaHeader {
        max_pdu_size: cur.read_u16()?,
        avg_pdu_size: cur.read_u16()?,
        max_bitrate: cur.read_u32()?,
        avg_bitrate: cur.read_u32()?,
    });
    Ok(Some(node))
}

/// sthd carries no fields beyond the full-box header.
pub(crate) fn sthd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (node, _fb, _cur) = raw.full_box()?;
    Ok(Some(node))
}

/// nmhd carries no fields beyond the full-box header.
pub(crate) fn nmhd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (node, _fb, _cur) = raw.full_box()?;
    Ok(Some(node))
}

pub(crate) fn dref(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u32()?;
    node.fields = BoxFields::DataReference(DataReference { entry_count });
    let mut children = children_from(cur.remaining_slice(), cur.offset(), &node, depth)?;
    children.truncate(entry_count as usize);
    node.children = children;
    Ok(Some(node))
}

pub(crate) fn url(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    // Flag 0x1 means the media lives in the same file and no location
    // string is stored.
    let location = if fb.flags == 1 { None } else { Some(cur.read_cstring()) };

    node.fields = BoxFields::DataEntryUrl(DataEntryUrl { location });
    Ok(Some(node))
}

pub(crate) fn urn(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let name = cur.read_cstring();
    let location = cur.read_cstring();

    node.fields = BoxFields::DataEntryUrn(DataEntryUrn { name, location });
    Ok(Some(node))
}

pub(crate) fn kind(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let scheme_uri = cur.read_cstring();
    let value = cur.read_cstring();

    node.fields = BoxFields::TrackKind(TrackKind { scheme_uri, value });
    Ok(Some(node))
}

pub(crate) fn tsel(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let switch_group = cur.read_u32()?;
    let mut attribute_list = Vec::new();
    while cur.remaining() >= 4 {
        attribute_list.push(cur.read_u32()?);
    }

    node.fields = BoxFields::TrackSelection(TrackSelection { switch_group, attribute_list });
    Ok(Some(node))
}

pub(crate) fn stri(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let switch_group = cur.read_u16()?;
    let alternate_group = cur.read_u16()?;
    let sub_track_id = cur.read_u32()?;
    let mut attribute_list = Vec::new();
    while cur.remaining() >= 4 {
        attribute_list.push(cur.read_u32()?);
    }

    node.fields = BoxFields::SubTrackInformation(SubTrackInformation {
        switch_group,
        alternate_group,
        sub_track_id,
        attribute_list,
    });
    Ok(Some(node))
}

pub(crate) fn stsg(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let grouping_type = cur.read_u32()?;
    let item_count = cur.read_u16()?;
    let mut group_description_index = Vec::with_capacity(item_count as usize);
    for _ in 0..item_count {
        group_description_index.push(cur.read_u32()?);
    }

    node.fields = BoxFields::SubTrackSampleGroup(SubTrackSampleGroup {
        grouping_type,
        item_count,
        group_description_index,
    });
    Ok(Some(node))
}
