use crate::decode::BoxFields;
use crate::fourcc::BoxType;
use serde::Serialize;

/// One decoded box. Nodes are immutable once built and borrow nothing from
/// the input buffer, so the tree may outlive it.
#[derive(Debug, Clone, Serialize)]
pub struct BoxNode {
    /// Absolute offset of the box's first header byte.
    pub offset: u64,
    /// Total size in bytes, header included; already resolved (never the
    /// raw 0/1 sentinel).
    pub size: u64,
    #[serde(rename = "type")]
    pub typ: BoxType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largesize: Option<u64>,
    /// Full-box types only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    /// Full-box types only; low 24 bits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(skip_serializing_if = "BoxFields::is_none")]
    pub fields: BoxFields,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BoxNode>,
}

impl BoxNode {
    /// First direct child with the given (trimmed) type code.
    pub fn child(&self, code: &str) -> Option<&BoxNode> {
        self.children.iter().find(|c| c.typ.is(code))
    }

    /// First descendant with the given type code, depth-first.
    pub fn find(&self, code: &str) -> Option<&BoxNode> {
        if self.typ.is(code) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(code))
    }

    /// Byte range `[offset, offset + size)` this node covers in the source
    /// buffer; enough to copy the box back out verbatim.
    pub fn byte_range(&self) -> std::ops::Range<u64> {
        self.offset..self.offset + self.size
    }
}
