use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::fourcc::{BoxType, FourCC};
use byteorder::{BigEndian, ByteOrder};

/// Resolved box header.
#[derive(Debug, Clone)]
pub struct BoxHeader {
    /// Absolute offset of the first header byte.
    pub offset: u64,
    /// Resolved total size including the header; never the raw 0/1 sentinel.
    pub size: u64,
    /// Effective type: the 4CC, or the extended identifier for `uuid` boxes.
    pub typ: BoxType,
    /// Raw 64-bit size, present only when the stored 32-bit size was 1.
    pub largesize: Option<u64>,
    /// 8, 16, 24, or 32 depending on largesize/uuid extensions.
    pub header_len: u64,
}

/// Version + 24-bit flags of a full box, packed in one 4-byte word after
/// the base header.
#[derive(Debug, Clone, Copy)]
pub struct FullBoxHeader {
    pub version: u8,
    pub flags: u32,
}

impl FullBoxHeader {
    pub fn flag(&self, mask: u32) -> bool {
        self.flags & mask != 0
    }
}

/// Resolve one box header from the start of `data`.
///
/// `data` must start at a box boundary; `base` is the absolute offset of
/// `data[0]`. A stored size of 0 means the box extends to the end of
/// `data`; a stored size of 1 pulls the 64-bit largesize that follows; the
/// `uuid` type code pulls a 16-byte extended identifier after the size
/// field(s).
pub fn read_box_header(data: &[u8], base: u64) -> Result<BoxHeader> {
    if data.len() < 8 {
        return Err(Error::TruncatedHeader { offset: base });
    }
    let raw_size = BigEndian::read_u32(&data[..4]);
    let code = FourCC([data[4], data[5], data[6], data[7]]);

    let mut header_len = 8usize;
    let mut largesize = None;
    if raw_size == 1 {
        if data.len() < 16 {
            return Err(Error::TruncatedHeader { offset: base });
        }
        largesize = Some(BigEndian::read_u64(&data[8..16]));
        header_len = 16;
    }

    let mut typ = BoxType::FourCC(code);
    if &code.0 == b"uuid" {
        if data.len() < header_len + 16 {
            return Err(Error::TruncatedHeader { offset: base });
        }
        let mut ext = [0u8; 16];
        ext.copy_from_slice(&data[header_len..header_len + 16]);
        typ = BoxType::Uuid(ext);
        header_len += 16;
    }

    let size = match (raw_size, largesize) {
        (0, _) => data.len() as u64,
        (1, Some(ls)) => ls,
        (n, _) => n as u64,
    };
    if size < header_len as u64 {
        return Err(Error::InvalidSize { offset: base, size });
    }

    Ok(BoxHeader {
        offset: base,
        size,
        typ,
        largesize,
        header_len: header_len as u64,
    })
}

/// Read the 1-byte version + 3-byte flags that open a full box body.
pub fn read_full_box(cur: &mut Cursor<'_>) -> Result<FullBoxHeader> {
    let word = cur.read_u32()?;
    Ok(FullBoxHeader {
        version: (word >> 24) as u8,
        flags: word & 0x00ff_ffff,
    })
}
