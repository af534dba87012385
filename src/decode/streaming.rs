//! Segment indexing and timing boxes used by streamed presentations.

use super::BoxFields;
use crate::error::Result;
use crate::node::BoxNode;
use crate::registry::RawBox;
use crate::tree::Parent;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SegmentIndex {
    pub reference_id: u32,
    pub timescale: u32,
    pub earliest_presentation_time: u64,
    pub first_offset: u64,
    pub reference_count: u16,
    pub references: Vec<SegmentReference>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentReference {
    pub reference_type: u8,
    pub referenced_size: u32,
    pub subsegment_duration: u32,
    pub starts_with_sap: u8,
    pub sap_type: u8,
    pub sap_delta_time: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubsegmentIndex {
    pub subsegment_count: u32,
    pub subsegments: Vec<SubsegmentRange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubsegmentRange {
    pub level: u8,
    pub range_size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProducerReferenceTime {
    pub reference_track_id: u32,
    pub ntp_timestamp: u64,
    pub media_time: u64,
}

pub(crate) fn sidx(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let reference_id = cur.read_u32()?;
    let timescale = cur.read_u32()?;
    let (earliest_presentation_time, first_offset) = if fb.version == 1 {
        (cur.read_u64()?, cur.read_u64()?)
    } else {
        (cur.read_u32()? as u64, cur.read_u32()? as u64)
    };
    cur.skip(2)?; // reserved
    let reference_count = cur.read_u16()?;

    let mut references = Vec::with_capacity(reference_count as usize);
    for _ in 0..reference_count {
        let w = cur.read_u32()?;
        let subsegment_duration = cur.read_u32()?;
        let s = cur.read_u32()?;
        references.push(SegmentReference {
            reference_type: (w >> 31) as u8,
            referenced_size: w & 0x7fff_ffff,
            subsegment_duration,
            starts_with_sap: (s >> 31) as u8,
            sap_type: ((s >> 28) & 0x7) as u8,
            sap_delta_time: s & 0x0fff_ffff,
        });
    }

    node.fields = BoxFields::SegmentIndex(SegmentIndex {
        reference_id,
        timescale,
        earliest_presentation_time,
        first_offset,
        reference_count,
        references,
    });
    Ok(Some(node))
}

pub(crate) fn ssix(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let subsegment_count = cur.read_u32()?;
    let mut subsegments = Vec::with_capacity(subsegment_count.min(1 << 16) as usize);
    for _ in 0..subsegment_count {
        // level shares a word with the 24-bit range size
        let w = cur.read_u32()?;
        subsegments.push(SubsegmentRange {
            level: (w >> 24) as u8,
            range_size: w & 0x00ff_ffff,
        });
    }

    node.fields = BoxFields::SubsegmentIndex(SubsegmentIndex { subsegment_count, subsegments });
    Ok(Some(node))
}

pub(crate) fn prft(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let reference_track_id = cur.read_u32()?;
    let ntp_timestamp = cur.read_u64()?;
    let media_time = if fb.version == 0 {
        cur.read_u32()? as u64
    } else {
        cur.read_u64()?
    };

    node.fields = BoxFields::ProducerReferenceTime(ProducerReferenceTime {
        reference_track_id,
        ntp_timestamp,
        media_time,
    });
    Ok(Some(node))
}
