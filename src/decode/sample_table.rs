//! Sample table boxes: descriptions, timing, chunk maps, sizes, sync and
//! dependency information, sample grouping, and auxiliary sample info.

use super::BoxFields;
use crate::error::{Error, Result};
use crate::node::BoxNode;
use crate::registry::RawBox;
use crate::tree::Parent;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SampleDescription {
    pub entry_count: u32,
    pub entries: Vec<SampleEntry>,
}

/// One sample entry, kept structural: the codec-specific tail is opaque.
#[derive(Debug, Clone, Serialize)]
pub struct SampleEntry {
    pub size: u64,
    pub format: String,
    pub data_reference_index: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeToSample {
    pub entry_count: u32,
    pub entries: Vec<TimeToSampleEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeToSampleEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompositionOffset {
    pub entry_count: u32,
    pub entries: Vec<CompositionOffsetEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompositionOffsetEntry {
    pub sample_count: u32,
    /// Unsigned in version 0, signed in version 1; widened either way.
    pub sample_offset: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompositionToDecode {
    pub composition_to_dts_shift: i64,
    pub least_decode_to_display_delta: i64,
    pub greatest_decode_to_display_delta: i64,
    pub composition_start_time: i64,
    pub composition_end_time: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleToChunk {
    pub entry_count: u32,
    pub entries: Vec<SampleToChunkEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleToChunkEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_description_index: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleSize {
    pub sample_size: u32,
    pub sample_count: u32,
    /// Present only when `sample_size` is 0.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry_sizes: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompactSampleSize {
    pub field_size: u8,
    pub sample_count: u32,
    pub entry_sizes: Vec<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkOffset {
    pub entry_count: u32,
    pub chunk_offsets: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkOffset64 {
    pub entry_count: u32,
    pub chunk_offsets: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSample {
    pub entry_count: u32,
    pub sample_numbers: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShadowSync {
    pub entry_count: u32,
    pub entries: Vec<ShadowSyncEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShadowSyncEntry {
    pub shadowed_sample_number: u32,
    pub sync_sample_number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaddingBits {
    pub sample_count: u32,
    /// One 3-bit pad value per sample.
    pub pads: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DegradationPriority {
    pub priorities: Vec<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleDependency {
    pub entries: Vec<SampleDependencyEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleDependencyEntry {
    pub is_leading: u8,
    pub sample_depends_on: u8,
    pub sample_is_depended_on: u8,
    pub sample_has_redundancy: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleToGroup {
    pub grouping_type: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping_type_parameter: Option<u32>,
    pub entry_count: u32,
    pub entries: Vec<SampleToGroupEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleToGroupEntry {
    pub sample_count: u32,
    pub group_description_index: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleGroupDescription {
    pub grouping_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sample_description_index: Option<u32>,
    pub entry_count: u32,
    pub entries: Vec<SampleGroupEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleGroupEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_length: Option<u32>,
    pub description: GroupDescription,
}

/// Roll-recovery groups are the only ones modeled; everything else is
/// carried raw.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GroupDescription {
    Roll { roll_distance: i16 },
    Raw { data: Vec<u8> },
}

#[derive(Debug, Clone, Serialize)]
pub struct SubSampleInformation {
    pub entry_count: u32,
    pub entries: Vec<SubSampleEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubSampleEntry {
    pub sample_delta: u32,
    pub subsample_count: u16,
    pub subsamples: Vec<SubSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubSample {
    pub subsample_size: u32,
    pub subsample_priority: u8,
    pub discardable: u8,
    pub codec_specific_parameters: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleAuxInfoSizes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_info_type: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_info_type_parameter: Option<u32>,
    pub default_sample_info_size: u8,
    pub sample_count: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sample_info_sizes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleAuxInfoOffsets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_info_type: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_info_type_parameter: Option<u32>,
    pub entry_count: u32,
    pub offsets: Vec<u64>,
}

pub(crate) fn stsd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u32()?;
    let mut entries = Vec::with_capacity(entry_count.min(64) as usize);
    for _ in 0..entry_count {
        if cur.remaining() < 8 {
            break;
        }
        let entry_remaining = cur.remaining();
        let raw_size = cur.read_u32()?;
        let format = cur.read_fourcc()?.trimmed();
        let mut consumed = 8u64;
        let size = match raw_size {
            0 => entry_remaining as u64,
            1 => {
                consumed += 8;
                cur.read_u64()?
            }
            n => n as u64,
        };
        cur.skip(6)?; // reserved
        let data_reference_index = cur.read_u16()?;
        consumed += 8;

        // The codec-specific tail is skipped; the entry boundary comes from
        // the entry's own size field.
        cur.skip(size.saturating_sub(consumed).min(cur.remaining() as u64) as usize)?;
        entries.push(SampleEntry { size, format, data_reference_index });
    }

    node.fields = BoxFields::SampleDescription(SampleDescription { entry_count, entries });
    Ok(Some(node))
}

pub(crate) fn stts(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u32()?;
    let mut entries = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        entries.push(TimeToSampleEntry {
            sample_count: cur.read_u32()?,
            sample_delta: cur.read_u32()?,
        });
    }

    node.fields = BoxFields::TimeToSample(TimeToSample { entry_count, entries });
    Ok(Some(node))
}

pub(crate) fn ctts(
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
        let sample_count = cur.read_u32()?;
        let sample_offset = if fb.version == 1 {
            cur.read_i32()? as i64
        } else {
            cur.read_u32()? as i64
        };
        entries.push(CompositionOffsetEntry { sample_count, sample_offset });
    }

    node.fields = BoxFields::CompositionOffset(CompositionOffset { entry_count, entries });
    Ok(Some(node))
}

pub(crate) fn cslg(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let mut field = || -> Result<i64> {
        if fb.version == 1 {
            cur.read_i64()
        } else {
            Ok(cur.read_i32()? as i64)
        }
    };

    node.fields = BoxFields::CompositionToDecode(CompositionToDecode {
        composition_to_dts_shift: field()?,
        least_decode_to_display_delta: field()?,
        greatest_decode_to_display_delta: field()?,
        composition_start_time: field()?,
        composition_end_time: field()?,
    });
    Ok(Some(node))
}

pub(crate) fn stsc(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u32()?;
    let mut entries = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        entries.push(SampleToChunkEntry {
            first_chunk: cur.read_u32()?,
            samples_per_chunk: cur.read_u32()?,
            sample_description_index: cur.read_u32()?,
        });
    }

    node.fields = BoxFields::SampleToChunk(SampleToChunk { entry_count, entries });
    Ok(Some(node))
}

pub(crate) fn stsz(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let sample_size = cur.read_u32()?;
    let sample_count = cur.read_u32()?;
    let mut entry_sizes = Vec::new();
    if sample_size == 0 {
        entry_sizes.reserve(sample_count.min(1 << 16) as usize);
        for _ in 0..sample_count {
            entry_sizes.push(cur.read_u32()?);
        }
    }

    node.fields = BoxFields::SampleSize(SampleSize { sample_size, sample_count, entry_sizes });
    Ok(Some(node))
}

pub(crate) fn stz2(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    cur.skip(3)?; // reserved
    let field_size = cur.read_u8()?;
    let sample_count = cur.read_u32()?;
    let mut entry_sizes = Vec::with_capacity(sample_count.min(1 << 16) as usize);
    match field_size {
        4 => {
            let bytes = cur.take(sample_count.div_ceil(2) as usize)?;
            for i in 0..sample_count as usize {
                let b = bytes[i / 2];
                entry_sizes.push(if i % 2 == 0 { (b >> 4) as u16 } else { (b & 0xf) as u16 });
            }
        }
        8 => {
            for _ in 0..sample_count {
                entry_sizes.push(cur.read_u8()? as u16);
            }
        }
        16 => {
            for _ in 0..sample_count {
                entry_sizes.push(cur.read_u16()?);
            }
        }
        width => return Err(Error::InvalidFieldWidth { field: "stz2 field_size", width }),
    }

    node.fields = BoxFields::CompactSampleSize(CompactSampleSize {
        field_size,
        sample_count,
        entry_sizes,
    });
    Ok(Some(node))
}

pub(crate) fn stco(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u32()?;
    let mut chunk_offsets = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        chunk_offsets.push(cur.read_u32()?);
    }

    node.fields = BoxFields::ChunkOffset(ChunkOffset { entry_count, chunk_offsets });
    Ok(Some(node))
}

pub(crate) fn co64(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u32()?;
    let mut chunk_offsets = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        chunk_offsets.push(cur.read_u64()?);
    }

    node.fields = BoxFields::ChunkOffset64(ChunkOffset64 { entry_count, chunk_offsets });
    Ok(Some(node))
}

pub(crate) fn stss(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u32()?;
    let mut sample_numbers = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        sample_numbers.push(cur.read_u32()?);
    }

    node.fields = BoxFields::SyncSample(SyncSample { entry_count, sample_numbers });
    Ok(Some(node))
}

pub(crate) fn stsh(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let entry_count = cur.read_u32()?;
    let mut entries = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        entries.push(ShadowSyncEntry {
            shadowed_sample_number: cur.read_u32()?,
            sync_sample_number: cur.read_u32()?,
        });
    }

    node.fields = BoxFields::ShadowSync(ShadowSync { entry_count, entries });
    Ok(Some(node))
}

pub(crate) fn padb(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let sample_count = cur.read_u32()?;
    let packed = cur.take(sample_count.div_ceil(2) as usize)?;
    let mut pads = Vec::with_capacity(sample_count as usize);
    for i in 0..sample_count as usize {
        let b = packed[i / 2];
        pads.push(if i % 2 == 0 { (b >> 4) & 0x7 } else { b & 0x7 });
    }

    node.fields = BoxFields::PaddingBits(PaddingBits { sample_count, pads });
    Ok(Some(node))
}

/// The priority table has no stored count; it runs to the end of the body.
pub(crate) fn stdp(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let mut priorities = Vec::new();
    while cur.remaining() >= 2 {
        priorities.push(cur.read_u16()?);
    }

    node.fields = BoxFields::DegradationPriority(DegradationPriority { priorities });
    Ok(Some(node))
}

pub(crate) fn sdtp(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let mut entries = Vec::new();
    while !cur.is_empty() {
        let b = cur.read_u8()?;
        entries.push(SampleDependencyEntry {
            is_leading: b >> 6,
            sample_depends_on: (b >> 4) & 0x3,
            sample_is_depended_on: (b >> 2) & 0x3,
            sample_has_redundancy: b & 0x3,
        });
    }

    node.fields = BoxFields::SampleDependency(SampleDependency { entries });
    Ok(Some(node))
}

pub(crate) fn sbgp(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let grouping_type = cur.read_u32()?;
    let grouping_type_parameter = if fb.version == 1 { Some(cur.read_u32()?) } else { None };
    let entry_count = cur.read_u32()?;
    let mut entries = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        entries.push(SampleToGroupEntry {
            sample_count: cur.read_u32()?,
            group_description_index: cur.read_u32()?,
        });
    }

    node.fields = BoxFields::SampleToGroup(SampleToGroup {
        grouping_type,
        grouping_type_parameter,
        entry_count,
        entries,
    });
    Ok(Some(node))
}

pub(crate) fn sgpd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 3 {
        return Ok(Some(node));
    }

    let grouping_type = cur.read_fourcc()?.trimmed();
    let default_length = if fb.version == 1 { Some(cur.read_u32()?) } else { None };
    let default_sample_description_index =
        if fb.version >= 2 { Some(cur.read_u32()?) } else { None };
    let entry_count = cur.read_u32()?;

    let mut entries = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        let description_length = match default_length {
            Some(0) => Some(cur.read_u32()?),
            Some(n) => Some(n),
            None => None,
        };
        let description = match (grouping_type.as_str(), description_length) {
            ("roll" | "prol", len) => {
                let roll_distance = cur.read_i16()?;
                if let Some(len) = len {
                    cur.skip(len.saturating_sub(2) as usize)?;
                }
                GroupDescription::Roll { roll_distance }
            }
            (_, Some(len)) => GroupDescription::Raw { data: cur.take(len as usize)?.to_vec() },
            // Without a length field the record's own leading size delimits
            // the entry.
            (_, None) => {
                let offset = cur.offset();
                let record_size = cur.read_u32()?;
                if record_size < 4 {
                    return Err(Error::InvalidSize { offset, size: record_size as u64 });
                }
                let mut data = record_size.to_be_bytes().to_vec();
                data.extend_from_slice(cur.take(record_size as usize - 4)?);
                GroupDescription::Raw { data }
            }
        };
        entries.push(SampleGroupEntry { description_length, description });
    }

    node.fields = BoxFields::SampleGroupDescription(SampleGroupDescription {
        grouping_type,
        default_length,
        default_sample_description_index,
        entry_count,
        entries,
    });
    Ok(Some(node))
}

pub(crate) fn subs(
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
        let sample_delta = cur.read_u32()?;
        let subsample_count = cur.read_u16()?;
        let mut subsamples = Vec::with_capacity(subsample_count as usize);
        for _ in 0..subsample_count {
            let subsample_size = if fb.version == 1 {
                cur.read_u32()?
            } else {
                cur.read_u16()? as u32
            };
            subsamples.push(SubSample {
                subsample_size,
                subsample_priority: cur.read_u8()?,
                discardable: cur.read_u8()?,
                codec_specific_parameters: cur.read_u32()?,
            });
        }
        entries.push(SubSampleEntry { sample_delta, subsample_count, subsamples });
    }

    node.fields = BoxFields::SubSampleInformation(SubSampleInformation { entry_count, entries });
    Ok(Some(node))
}

pub(crate) fn saiz(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let (aux_info_type, aux_info_type_parameter) = if fb.flag(0x1) {
        (Some(cur.read_u32()?), Some(cur.read_u32()?))
    } else {
        (None, None)
    };
    let default_sample_info_size = cur.read_u8()?;
    let sample_count = cur.read_u32()?;
    let mut sample_info_sizes = Vec::new();
    if default_sample_info_size == 0 {
        sample_info_sizes = cur.take(sample_count as usize)?.to_vec();
    }

    node.fields = BoxFields::SampleAuxInfoSizes(SampleAuxInfoSizes {
        aux_info_type,
        aux_info_type_parameter,
        default_sample_info_size,
        sample_count,
        sample_info_sizes,
    });
    Ok(Some(node))
}

pub(crate) fn saio(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let (aux_info_type, aux_info_type_parameter) = if fb.flag(0x1) {
        (Some(cur.read_u32()?), Some(cur.read_u32()?))
    } else {
        (None, None)
    };
    let entry_count = cur.read_u32()?;
    let mut offsets = Vec::with_capacity(entry_count.min(1 << 16) as usize);
    for _ in 0..entry_count {
        offsets.push(if fb.version == 1 {
            cur.read_u64()?
        } else {
            cur.read_u32()? as u64
        });
    }

    node.fields = BoxFields::SampleAuxInfoOffsets(SampleAuxInfoOffsets {
        aux_info_type,
        aux_info_type_parameter,
        entry_count,
        offsets,
    });
    Ok(Some(node))
}
