use crate::fourcc::BoxType;
use crate::node::BoxNode;

/// Errors produced while decoding a box tree.
///
/// An unsupported full-box version is deliberately *not* an error: the
/// decoder yields a node with no semantic fields and parsing continues.
#[derive(Debug)]
pub enum Error {
    /// Fewer than the required header bytes were available.
    TruncatedHeader { offset: u64 },

    /// A resolved box size smaller than its own header.
    InvalidSize { offset: u64, size: u64 },

    /// A field read would run past the end of the box body.
    OutOfRange { offset: u64, needed: usize },

    /// An unexpected width code in a multi-width field table.
    InvalidFieldWidth { field: &'static str, width: u8 },

    /// Container nesting beyond the hard recursion limit.
    NestingTooDeep { limit: usize },

    /// Wraps any of the above at the per-box decode boundary.
    MalformedBox { typ: BoxType, source: Box<Error> },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::TruncatedHeader { offset } => {
                write!(f, "truncated box header at offset {offset}")
            }
            Error::InvalidSize { offset, size } => {
                write!(f, "invalid box size {size} at offset {offset}")
            }
            Error::OutOfRange { offset, needed } => {
                write!(f, "read of {needed} bytes past end of data at offset {offset}")
            }
            Error::InvalidFieldWidth { field, width } => {
                write!(f, "invalid field width {width} for {field}")
            }
            Error::NestingTooDeep { limit } => {
                write!(f, "box nesting deeper than {limit} levels")
            }
            Error::MalformedBox { typ, .. } => write!(f, "malformed '{typ}' box"),
        }
    }
}

// Hand-written (not derived via thiserror) so that `source()` exposes the
// deref'd inner `Error` rather than the `Box<Error>` field: the box-tree
// error chain must stay downcastable to `Error` at every level.
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MalformedBox { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A failed tree decode. The sibling boxes decoded before the failure are
/// preserved so the caller can choose between aborting and accepting a
/// partial tree.
#[derive(Debug, thiserror::Error)]
#[error("decode stopped after {} top-level boxes: {source}", partial.len())]
pub struct TreeError {
    pub partial: Vec<BoxNode>,
    #[source]
    pub source: Error,
}

impl TreeError {
    /// Discard the error and keep whatever decoded cleanly.
    pub fn into_partial(self) -> Vec<BoxNode> {
        self.partial
    }
}
