//! Per-type box decoders, grouped by area of the format.

pub mod audio;
pub mod delivery;
pub mod file;
pub mod fragment;
pub mod meta;
pub mod movie;
pub mod sample_table;
pub mod streaming;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::node::BoxNode;
use crate::registry::RawBox;
use crate::tree::{walk, Parent};
use serde::Serialize;

/// Decoded fields of a box, one variant per semantic layout. `None` marks
/// boxes that carry no decoded fields: plain containers, structurally
/// recognized boxes, and full boxes whose version was not understood.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BoxFields {
    None,
    Opaque(file::Opaque),
    FileType(file::FileType),
    ProgressiveDownload(file::ProgressiveDownload),
    Copyright(file::Copyright),
    Xml(file::Xml),
    BinaryXml(file::BinaryXml),
    MovieHeader(movie::MovieHeader),
    TrackHeader(movie::TrackHeader),
    TrackReference(movie::TrackReference),
    TrackGroup(movie::TrackGroup),
    EditList(movie::EditList),
    MediaHeader(movie::MediaHeader),
    Handler(movie::Handler),
    ExtendedLanguage(movie::ExtendedLanguage),
    VideoMediaHeader(movie::VideoMediaHeader),
    SoundMediaHeader(movie::SoundMediaHeader),
    HintMediaHeader(movie::HintMediaHeader),
    DataReference(movie::DataReference),
    DataEntryUrl(movie::DataEntryUrl),
    DataEntryUrn(movie::DataEntryUrn),
    TrackKind(movie::TrackKind),
    TrackSelection(movie::TrackSelection),
    SubTrackInformation(movie::SubTrackInformation),
    SubTrackSampleGroup(movie::SubTrackSampleGroup),
    SampleDescription(sample_table::SampleDescription),
    TimeToSample(sample_table::TimeToSample),
    CompositionOffset(sample_table::CompositionOffset),
    CompositionToDecode(sample_table::CompositionToDecode),
    SampleToChunk(sample_table::SampleToChunk),
    SampleSize(sample_table::SampleSize),
    CompactSampleSize(sample_table::CompactSampleSize),
    ChunkOffset(sample_table::ChunkOffset),
    ChunkOffset64(sample_table::ChunkOffset64),
    SyncSample(sample_table::SyncSample),
    ShadowSync(sample_table::ShadowSync),
    PaddingBits(sample_table::PaddingBits),
    DegradationPriority(sample_table::DegradationPriority),
    SampleDependency(sample_table::SampleDependency),
    SampleToGroup(sample_table::SampleToGroup),
    SampleGroupDescription(sample_table::SampleGroupDescription),
    SubSampleInformation(sample_table::SubSampleInformation),
    SampleAuxInfoSizes(sample_table::SampleAuxInfoSizes),
    SampleAuxInfoOffsets(sample_table::SampleAuxInfoOffsets),
    MovieExtendsHeader(fragment::MovieExtendsHeader),
    TrackExtends(fragment::TrackExtends),
    TrackExtensionProperties(fragment::TrackExtensionProperties),
    AltStartupSequenceProperties(fragment::AltStartupSequenceProperties),
    LevelAssignment(fragment::LevelAssignment),
    MovieFragmentHeader(fragment::MovieFragmentHeader),
    TrackFragmentHeader(fragment::TrackFragmentHeader),
    TrackRun(fragment::TrackRun),
    TrackFragmentDecodeTime(fragment::TrackFragmentDecodeTime),
    TrackFragmentRandomAccess(fragment::TrackFragmentRandomAccess),
    RandomAccessOffset(fragment::RandomAccessOffset),
    ItemLocation(meta::ItemLocation),
    ItemProtection(meta::ItemProtection),
    SrtpProcess(meta::SrtpProcess),
    OriginalFormat(meta::OriginalFormat),
    SchemeType(meta::SchemeType),
    StereoVideo(meta::StereoVideo),
    ItemInformation(meta::ItemInformation),
    ItemInfoEntry(meta::ItemInfoEntry),
    PrimaryItem(meta::PrimaryItem),
    ItemReference(meta::ItemReference),
    MetaboxRelation(meta::MetaboxRelation),
    FdItemInformation(delivery::FdItemInformation),
    FileReservoir(delivery::FileReservoir),
    FilePartition(delivery::FilePartition),
    FecReservoir(delivery::FecReservoir),
    FdSessionGroup(delivery::FdSessionGroup),
    GroupIdToName(delivery::GroupIdToName),
    ExtraData(delivery::ExtraData),
    FecInformation(delivery::FecInformation),
    SegmentIndex(streaming::SegmentIndex),
    SubsegmentIndex(streaming::SubsegmentIndex),
    ProducerReferenceTime(streaming::ProducerReferenceTime),
    ChannelLayout(audio::ChannelLayout),
    DownMixInstructions(audio::DownMixInstructions),
    Loudness(audio::Loudness),
}

impl BoxFields {
    pub fn is_none(&self) -> bool {
        matches!(self, BoxFields::None)
    }
}

/// Decode the children of a container whose node is already built. Any
/// failure below is surfaced as this box's error; partially decoded
/// children are dropped.
pub(crate) fn children_from(
    body: &[u8],
    base: u64,
    node: &BoxNode,
    depth: usize,
) -> Result<Vec<BoxNode>> {
    let parent = Parent::of(node);
    walk(body, base, Some(&parent), depth + 1).map_err(|e| e.source)
}

/// Decoder for plain container boxes: no fields of their own, body is a
/// sequence of child boxes.
pub(crate) fn container(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    depth: usize,
) -> Result<Option<BoxNode>> {
    let mut node = raw.node();
    node.children = children_from(raw.body(), raw.body_offset(), &node, depth)?;
    Ok(Some(node))
}

/// Decoder for recognized codes whose payloads are not modeled: the box is
/// consumed (keeping the walk aligned) and no node is emitted.
pub(crate) fn skip_box(
    _raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    Ok(None)
}

/// ISO 639-2/T language code packed as three 5-bit letters.
pub(crate) fn lang_from_u16(code: u16) -> String {
    if code == 0 {
        return "und".to_string();
    }
    let c1 = ((code >> 10) & 0x1f) as u8 + 0x60;
    let c2 = ((code >> 5) & 0x1f) as u8 + 0x60;
    let c3 = (code & 0x1f) as u8 + 0x60;
    format!("{}{}{}", c1 as char, c2 as char, c3 as char)
}

/// Text payload that is UTF-16BE when it opens with a byte order mark and
/// UTF-8 otherwise. Trailing NULs are stripped.
pub(crate) fn read_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xfe && bytes[1] == 0xff {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
            .trim_matches('\0')
            .trim()
            .to_string()
    } else {
        String::from_utf8_lossy(bytes)
            .trim_matches('\0')
            .trim()
            .to_string()
    }
}

/// Big-endian unsigned integer of a byte width taken from a width field.
/// Width 0 reads nothing and yields 0.
pub(crate) fn read_uint(cur: &mut Cursor<'_>, width: u8, field: &'static str) -> Result<u64> {
    match width {
        0 => Ok(0),
        1 => Ok(cur.read_u8()? as u64),
        2 => Ok(cur.read_u16()? as u64),
        3 => Ok(cur.read_u24()? as u64),
        4 => Ok(cur.read_u32()? as u64),
        8 => Ok(cur.read_u64()?),
        width => Err(Error::InvalidFieldWidth { field, width }),
    }
}
