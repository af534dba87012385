//! Movie fragment boxes: extends defaults, fragment headers, track runs,
//! and the random access index.

use super::{children_from, read_uint, BoxFields};
use crate::error::Result;
use crate::node::BoxNode;
use crate::registry::RawBox;
use crate::tree::Parent;
use serde::Serialize;

/// The packed per-sample flags word, unpacked once at decode time.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SampleFlags {
    pub is_leading: u8,
    pub sample_depends_on: u8,
    pub sample_is_depended_on: u8,
    pub sample_has_redundancy: u8,
    pub sample_padding_value: u8,
    pub sample_is_non_sync_sample: u8,
    pub sample_degradation_priority: u16,
}

impl SampleFlags {
    pub fn from_u32(w: u32) -> Self {
        SampleFlags {
            is_leading: ((w >> 26) & 0x3) as u8,
            sample_depends_on: ((w >> 24) & 0x3) as u8,
            sample_is_depended_on: ((w >> 22) & 0x3) as u8,
            sample_has_redundancy: ((w >> 20) & 0x3) as u8,
            sample_padding_value: ((w >> 17) & 0x7) as u8,
            sample_is_non_sync_sample: ((w >> 16) & 0x1) as u8,
            sample_degradation_priority: (w & 0xffff) as u16,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieExtendsHeader {
    pub fragment_duration: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackExtends {
    pub track_id: u32,
    pub default_sample_description_index: u32,
    pub default_sample_duration: u32,
    pub default_sample_size: u32,
    pub default_sample_flags: SampleFlags,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackExtensionProperties {
    pub track_id: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AltStartupSequenceProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_initial_alt_startup_offset: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<AltStartupEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AltStartupEntry {
    pub grouping_type_parameter: u32,
    pub min_initial_alt_startup_offset: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelAssignment {
    pub level_count: u8,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Level {
    pub track_id: u32,
    pub padding_flag: u8,
    pub assignment_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping_type: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping_type_parameter: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_track_id: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieFragmentHeader {
    pub sequence_number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackFragmentHeader {
    pub track_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_data_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_description_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sample_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sample_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sample_flags: Option<SampleFlags>,
    pub duration_is_empty: bool,
    pub default_base_is_moof: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackRun {
    pub sample_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_offset: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_sample_flags: Option<SampleFlags>,
    pub samples: Vec<TrackRunSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackRunSample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_flags: Option<SampleFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_composition_time_offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackFragmentDecodeTime {
    pub base_media_decode_time: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackFragmentRandomAccess {
    pub track_id: u32,
    pub length_size_of_traf_num: u8,
    pub length_size_of_trun_num: u8,
    pub length_size_of_sample_num: u8,
    pub number_of_entry: u32,
    pub entries: Vec<TfraEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TfraEntry {
    pub time: u64,
    pub moof_offset: u64,
    pub traf_number: u64,
    pub trun_number: u64,
    pub sample_number: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RandomAccessOffset {
    pub parent_size: u32,
}

pub(crate) fn mehd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let fragment_duration = if fb.version == 1 {
        cur.read_u64()?
    } else {
        cur.read_u32()? as u64
    };

    node.fields = BoxFields::MovieExtendsHeader(MovieExtendsHeader { fragment_duration });
    Ok(Some(node))
}

pub(crate) fn trex(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::TrackExtends(TrackExtends {
        track_id: cur.read_u32()?,
        default_sample_description_index: cur.read_u32()?,
        default_sample_duration: cur.read_u32()?,
        default_sample_size: cur.read_u32()?,
        default_sample_flags: SampleFlags::from_u32(cur.read_u32()?),
    });
    Ok(Some(node))
}

pub(crate) fn trep(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let track_id = cur.read_u32()?;
    node.fields = BoxFields::TrackExtensionProperties(TrackExtensionProperties { track_id });
    node.children = children_from(cur.remaining_slice(), cur.offset(), &node, depth)?;
    Ok(Some(node))
}

pub(crate) fn assp(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let fields = if fb.version == 0 {
        AltStartupSequenceProperties {
            min_initial_alt_startup_offset: Some(cur.read_i32()?),
            entries: Vec::new(),
        }
    } else {
        let num_entries = cur.read_u32()?;
        let mut entries = Vec::with_capacity(num_entries.min(1 << 16) as usize);
        for _ in 0..num_entries {
            entries.push(AltStartupEntry {
                grouping_type_parameter: cur.read_u32()?,
                min_initial_alt_startup_offset: cur.read_i32()?,
            });
        }
        AltStartupSequenceProperties { min_initial_alt_startup_offset: None, entries }
    };

    node.fields = BoxFields::AltStartupSequenceProperties(fields);
    Ok(Some(node))
}

pub(crate) fn leva(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let level_count = cur.read_u8()?;
    let mut levels = Vec::with_capacity(level_count as usize);
    for _ in 0..level_count {
        let track_id = cur.read_u32()?;
        let b = cur.read_u8()?;
        let assignment_type = b & 0x7f;
        let mut level = Level {
            track_id,
            padding_flag: b >> 7,
            assignment_type,
            grouping_type: None,
            grouping_type_parameter: None,
            sub_track_id: None,
        };
        match assignment_type {
            0 => level.grouping_type = Some(cur.read_u32()?),
            1 => {
                level.grouping_type = Some(cur.read_u32()?);
                level.grouping_type_parameter = Some(cur.read_u32()?);
            }
            4 => level.sub_track_id = Some(cur.read_u32()?),
            _ => {}
        }
        levels.push(level);
    }

    node.fields = BoxFields::LevelAssignment(LevelAssignment { level_count, levels });
    Ok(Some(node))
}

pub(crate) fn mfhd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::MovieFragmentHeader(MovieFragmentHeader {
        sequence_number: cur.read_u32()?,
    });
    Ok(Some(node))
}

pub(crate) fn tfhd(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let track_id = cur.read_u32()?;
    let base_data_offset = if fb.flag(0x1) { Some(cur.read_u64()?) } else { None };
    let sample_description_index = if fb.flag(0x2) { Some(cur.read_u32()?) } else { None };
    let default_sample_duration = if fb.flag(0x8) { Some(cur.read_u32()?) } else { None };
    let default_sample_size = if fb.flag(0x10) { Some(cur.read_u32()?) } else { None };
    let default_sample_flags = if fb.flag(0x20) {
        Some(SampleFlags::from_u32(cur.read_u32()?))
    } else {
        None
    };

    node.fields = BoxFields::TrackFragmentHeader(TrackFragmentHeader {
        track_id,
        base_data_offset,
        sample_description_index,
        default_sample_duration,
        default_sample_size,
        default_sample_flags,
        duration_is_empty: fb.flag(0x010000),
        default_base_is_moof: fb.flag(0x020000),
    });
    Ok(Some(node))
}

pub(crate) fn trun(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let sample_count = cur.read_u32()?;
    let data_offset = if fb.flag(0x1) { Some(cur.read_i32()?) } else { None };
    let first_sample_flags_word = if fb.flag(0x4) { Some(cur.read_u32()?) } else { None };
    let first_sample_flags = first_sample_flags_word.map(SampleFlags::from_u32);

    let mut samples = Vec::with_capacity(sample_count.min(1 << 16) as usize);
    for i in 0..sample_count {
        // Sample 0 gates its optional fields on a nonzero first-sample-flags
        // word when one is present; every later sample gates on the run's
        // own flags.
        let gate = match first_sample_flags_word {
            Some(w) if i == 0 && w != 0 => w,
            _ => fb.flags,
        };
        let sample_duration = if gate & 0x100 != 0 { Some(cur.read_u32()?) } else { None };
        let sample_size = if gate & 0x200 != 0 { Some(cur.read_u32()?) } else { None };
        let sample_flags = if gate & 0x400 != 0 {
            Some(SampleFlags::from_u32(cur.read_u32()?))
        } else {
            None
        };
        let sample_composition_time_offset = if gate & 0x800 != 0 {
            Some(if fb.version == 1 {
                cur.read_i32()? as i64
            } else {
                cur.read_u32()? as i64
            })
        } else {
            None
        };
        samples.push(TrackRunSample {
            sample_duration,
            sample_size,
            sample_flags,
            sample_composition_time_offset,
        });
    }

    node.fields = BoxFields::TrackRun(TrackRun {
        sample_count,
        data_offset,
        first_sample_flags,
        samples,
    });
    Ok(Some(node))
}

pub(crate) fn tfdt(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let base_media_decode_time = if fb.version == 1 {
        cur.read_u64()?
    } else {
        cur.read_u32()? as u64
    };

    node.fields =
        BoxFields::TrackFragmentDecodeTime(TrackFragmentDecodeTime { base_media_decode_time });
    Ok(Some(node))
}

pub(crate) fn tfra(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let track_id = cur.read_u32()?;
    let w = cur.read_u32()?;
    let length_size_of_traf_num = (((w >> 4) & 0x3) + 1) as u8;
    let length_size_of_trun_num = (((w >> 2) & 0x3) + 1) as u8;
    let length_size_of_sample_num = ((w & 0x3) + 1) as u8;
    let number_of_entry = cur.read_u32()?;

    let mut entries = Vec::with_capacity(number_of_entry.min(1 << 16) as usize);
    for _ in 0..number_of_entry {
        let (time, moof_offset) = if fb.version == 1 {
            (cur.read_u64()?, cur.read_u64()?)
        } else {
            (cur.read_u32()? as u64, cur.read_u32()? as u64)
        };
        entries.push(TfraEntry {
            time,
            moof_offset,
            traf_number: read_uint(&mut cur, length_size_of_traf_num, "tfra traf_number")?,
            trun_number: read_uint(&mut cur, length_size_of_trun_num, "tfra trun_number")?,
            sample_number: read_uint(&mut cur, length_size_of_sample_num, "tfra sample_number")?,
        });
    }

    node.fields = BoxFields::TrackFragmentRandomAccess(TrackFragmentRandomAccess {
        track_id,
        length_size_of_traf_num,
        length_size_of_trun_num,
        length_size_of_sample_num,
        number_of_entry,
        entries,
    });
    Ok(Some(node))
}

pub(crate) fn mfro(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::RandomAccessOffset(RandomAccessOffset {
        parent_size: cur.read_u32()?,
    });
    Ok(Some(node))
}
