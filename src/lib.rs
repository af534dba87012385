//! Decoder for ISO base media file format box trees (MP4, QuickTime-style
//! derivatives, HEIF).
//!
//! The input is any in-memory byte range; the output is an ordered tree of
//! [`BoxNode`] values mirroring the physical box layout, with per-type
//! fields decoded for every recognized code. Decoding is a pure function
//! of the bytes: no I/O, no mutation of the input, and arbitrary garbage
//! yields either a (possibly empty) tree or a structured error carrying
//! whatever decoded cleanly.
//!
//! ```no_run
//! let data = std::fs::read("video.mp4")?;
//! let tree = boxtree::decode_tree(&data, None).map_err(|e| e.source)?;
//! println!("{}", boxtree::to_json_pretty(&tree)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cursor;
pub mod decode;
pub mod error;
pub mod fourcc;
pub mod header;
pub mod json;
pub mod node;
pub mod registry;
pub mod tree;

pub use decode::BoxFields;
pub use error::{Error, Result, TreeError};
pub use fourcc::{BoxType, FourCC};
pub use header::{read_box_header, BoxHeader, FullBoxHeader};
pub use json::{to_json, to_json_pretty};
pub use node::BoxNode;
pub use registry::{registry, Registry};
pub use tree::{decode_tree, Parent, MAX_DEPTH};
