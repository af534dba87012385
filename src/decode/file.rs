//! File-level boxes: brands, progressive download hints, opaque payload
//! carriers, and the small metadata leaves that sit next to them.

use super::{lang_from_u16, read_text, BoxFields};
use crate::error::Result;
use crate::node::BoxNode;
use crate::registry::RawBox;
use crate::tree::Parent;
use serde::Serialize;

/// Payload kept as a byte range into the source buffer, never copied.
#[derive(Debug, Clone, Serialize)]
pub struct Opaque {
    pub data_offset: u64,
    pub data_len: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileType {
    pub major_brand: String,
    pub minor_version: u32,
    pub compatible_brands: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressiveDownload {
    pub pairs: Vec<PdinPair>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdinPair {
    pub rate: u32,
    pub initial_delay: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Copyright {
    pub language: String,
    pub notice: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Xml {
    pub xml: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryXml {
    pub data: Vec<u8>,
}

/// mdat, free, skip, idat. The payload is recorded by position only.
pub(crate) fn opaque(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let mut node = raw.node();
    node.fields = BoxFields::Opaque(Opaque {
        data_offset: raw.body_offset(),
        data_len: raw.body().len() as u64,
    });
    Ok(Some(node))
}

/// ftyp and styp share one layout.
pub(crate) fn ftyp(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let mut node = raw.node();
    let mut cur = raw.cursor();

    let major_brand = cur.read_fourcc()?.trimmed();
    let minor_version = cur.read_u32()?;
    let mut compatible_brands = Vec::new();
    while cur.remaining() >= 4 {
        compatible_brands.push(cur.read_fourcc()?.trimmed());
    }

    node.fields = BoxFields::FileType(FileType {
        major_brand,
        minor_version,
        compatible_brands,
    });
    Ok(Some(node))
}

pub(crate) fn pdin(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let mut pairs = Vec::new();
    while cur.remaining() >= 8 {
        pairs.push(PdinPair {
            rate: cur.read_u32()?,
            initial_delay: cur.read_u32()?,
        });
    }

    node.fields = BoxFields::ProgressiveDownload(ProgressiveDownload { pairs });
    Ok(Some(node))
}

pub(crate) fn cprt(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, mut cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    let language = lang_from_u16(cur.read_u16()? & 0x7fff);
    let notice = read_text(cur.remaining_slice());

    node.fields = BoxFields::Copyright(Copyright { language, notice });
    Ok(Some(node))
}

pub(crate) fn xml(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::Xml(Xml { xml: read_text(cur.remaining_slice()) });
    Ok(Some(node))
}

pub(crate) fn bxml(
    raw: &RawBox<'_>,
    _parent: Option<&Parent>,
    _depth: usize,
) -> Result<Option<BoxNode>> {
    let (mut node, fb, cur) = raw.full_box()?;
    if fb.version != 0 {
        return Ok(Some(node));
    }

    node.fields = BoxFields::BinaryXml(BinaryXml { data: cur.remaining_slice().to_vec() });
    Ok(Some(node))
}
