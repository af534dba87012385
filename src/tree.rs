use crate::error::{Error, TreeError};
use crate::fourcc::{BoxType, FourCC};
use crate::header::read_box_header;
use crate::node::BoxNode;
use crate::registry::{registry, RawBox};

/// Hard bound on container nesting. Real files stay under twenty levels;
/// anything deeper is treated as adversarial.
pub const MAX_DEPTH: usize = 32;

/// Read-only context handed to the few decoders whose layout depends on
/// the enclosing box (e.g. item-reference entries inside `iref`). Only the
/// parent's effective type and version are visible.
#[derive(Debug, Clone)]
pub struct Parent {
    pub typ: BoxType,
    pub version: Option<u8>,
}

impl Parent {
    pub(crate) fn of(node: &BoxNode) -> Self {
        Parent { typ: node.typ.clone(), version: node.version }
    }
}

/// Decode every box in `buffer` into an ordered sequence of nodes.
///
/// This is the sole entry point: deterministic, no I/O, and total over
/// arbitrary input. An empty or fully-unrecognized buffer yields an empty
/// sequence. Unrecognized type codes trigger a one-byte realignment scan
/// rather than an error. A malformed recognized box stops the walk; the
/// returned [`TreeError`] carries the siblings decoded before the failure.
pub fn decode_tree(buffer: &[u8], parent: Option<&Parent>) -> Result<Vec<BoxNode>, TreeError> {
    walk(buffer, 0, parent, 0)
}

pub(crate) fn walk(
    data: &[u8],
    base: u64,
    parent: Option<&Parent>,
    depth: usize,
) -> Result<Vec<BoxNode>, TreeError> {
    if depth > MAX_DEPTH {
        return Err(TreeError {
            partial: Vec::new(),
            source: Error::NestingTooDeep { limit: MAX_DEPTH },
        });
    }

    let reg = registry();
    let mut nodes = Vec::new();
    let mut pos = 0usize;

    while data.len() - pos >= 8 {
        let rest = &data[pos..];
        let code = FourCC([rest[4], rest[5], rest[6], rest[7]]);
        let is_uuid = &code.0 == b"uuid";

        let decode = if is_uuid { None } else { reg.get(&code.trimmed()) };
        if !is_uuid && decode.is_none() {
            // Realignment scan: re-attempt header resolution one byte
            // further on. This can latch onto an arbitrary 4-byte run
            // inside padding or payload bytes; lenient recovery is the
            // defined behavior, desynchronization is the known risk.
            pos += 1;
            continue;
        }

        let header = match read_box_header(rest, base + pos as u64) {
            Ok(h) => h,
            Err(e) => return Err(TreeError { partial: nodes, source: e }),
        };

        // The last box may claim more than remains; its body is clamped to
        // the supplied range.
        let span = (header.size as usize).min(rest.len());
        let raw = RawBox { header, data: &rest[..span] };

        match decode {
            // Extended-type boxes are recognized structurally; the body is
            // opaque to the registry.
            None => nodes.push(raw.node()),
            Some(decode) => match decode(&raw, parent, depth) {
                Ok(Some(node)) => nodes.push(node),
                Ok(None) => {}
                Err(e) => {
                    return Err(TreeError {
                        partial: nodes,
                        source: Error::MalformedBox {
                            typ: raw.header.typ.clone(),
                            source: Box::new(e),
                        },
                    });
                }
            },
        }

        pos += span;
    }

    Ok(nodes)
}
