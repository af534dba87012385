//! Audio presentation boxes: channel layout, downmix instructions, and
//! loudness measurements.

use super::BoxFields;
use crate::error::Result;
use crate::node::BoxNode;
use crate::registry::RawBox;
use crate::tree::Parent;
use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ChannelLayout {
    pub stream_structure: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defined_layout: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omitted_channels_map: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_count: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    pub speaker_position: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azimuth: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownMixInstructions {
    pub target_layout: u8,
    pub target_channel_count: u8,
    pub in_stream: u8,
    pub downmix_id: u8,
    /// 4-bit coefficients, present only when the matrix is not in-stream.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bs_downmix_coefficients: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Loudness {
    pub downmix_id: u8,
    pub drc_set_id: u8,
    pub bs_sample_peak_level: i16,
    pub bs_true_peak_level: i32,
    pub measurement_system_for_tp: u8,
    pub reliability_for_tp: u8,
    pub measurement_count: u8,
    pub measurements: Vec<LoudnessMeasurement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoudnessMeasurement {
    pub method_definition: u8,
    pub method_value: u8,
    pub measurement_system: u8,
    pub reliability: u8,
}

/// The channel list has no count of its own; it runs to the end of the
/// body.
pub(crate) fn chnl(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let stream_structure = cur.read_u8()?;
    let mut fields = ChannelLayout {
        stream_structure,
        defined_layout: None,
        channels: Vec::new(),
        omitted_channels_map: None,
        object_count: None,
    };

    if stream_structure == 1 {
        let defined_layout = cur.read_u8()?;
        fields.defined_layout = Some(defined_layout);
        if defined_layout == 0 {
            while !cur.is_empty() {
                let speaker_position = cur.read_u8()?;
                let (azimuth, elevation) = if speaker_position == 126 {
                    if cur.remaining() < 3 {
                        break;
                    }
                    (Some(cur.read_u16()?), Some(cur.read_u8()?))
                } else {
                    (None, None)
                };
                fields.channels.push(Channel { speaker_position, azimuth, elevation });
            }
        } else {
            fields.omitted_channels_map = Some(cur.read_u64()?);
        }
    } else if stream_structure == 2 {
        fields.object_count = Some(cur.read_u8()?);
    }

    node.fields = BoxFields::ChannelLayout(fields);
    Ok(Some(node))
}

pub(crate) fn dmix(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let target_layout = cur.read_u8()?;
    let b = cur.read_u8()?;
    let in_stream = b >> 7;
    let target_channel_count = b & 0x7f;
    let downmix_id = cur.read_u8()? & 0x7f;

    // Each coefficient is a nibble; the matrix runs to the end of the body.
    let mut bs_downmix_coefficients = Vec::new();
    if in_stream == 0 {
        for &byte in cur.remaining_slice() {
            bs_downmix_coefficients.push(byte >> 4);
            bs_downmix_coefficients.push(byte & 0xf);
        }
    }

    node.fields = BoxFields::DownMixInstructions(DownMixInstructions {
        target_layout,
        target_channel_count,
        in_stream,
        downmix_id,
        bs_downmix_coefficients,
    });
    Ok(Some(node))
}

/// tlou and alou share one layout. The peak level fields are bit-packed
/// across byte boundaries, so the fixed prefix is unpacked from a 7-byte
/// slice instead of sequential reads.
pub(crate) fn loudness(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version > 1 {
        return Ok(Some(node));
    }

    let head = cur.take(7)?;
    let w01 = BigEndian::read_u16(&head[0..2]);
    let packed = BigEndian::read_u32(&head[2..6]);
    let measurement_count = head[6];

    let mut measurements = Vec::with_capacity(measurement_count as usize);
    for _ in 0..measurement_count {
        let method_definition = cur.read_u8()?;
        let method_value = cur.read_u8()?;
        let b = cur.read_u8()?;
        measurements.push(LoudnessMeasurement {
            method_definition,
            method_value,
            measurement_system: b >> 4,
            reliability: b & 0xf,
        });
    }

    node.fields = BoxFields::Loudness(Loudness {
        downmix_id: ((w01 >> 6) & 0x7f) as u8,
        drc_set_id: (w01 & 0x3f) as u8,
        bs_sample_peak_level: BigEndian::read_i16(&head[2..4]) >> 4,
        bs_true_peak_level: ((packed as i32) >> 8) & 0xfff,
        measurement_system_for_tp: ((packed >> 4) & 0xf) as u8,
        reliability_for_tp: (packed & 0xf) as u8,
        measurement_count,
        measurements,
    });
    Ok(Some(node))
}
