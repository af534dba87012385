use serde::{Serialize, Serializer};
use std::fmt;

/// Four-character box type code.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else { None }
    }

    pub fn as_str_lossy(&self) -> String {
        self.0.iter().map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }

    /// The code with padding spaces and NULs removed, e.g. `b"url "` -> `"url"`.
    /// Registry keys use this form.
    pub fn trimmed(&self) -> String {
        let is_pad = |b: u8| b == b' ' || b == 0;
        let start = self.0.iter().take_while(|&&b| is_pad(b)).count();
        let end = 4 - self.0.iter().rev().take_while(|&&b| is_pad(b)).count();
        if start >= end {
            return String::new();
        }
        self.0[start..end]
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}

impl fmt::Debug for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }
impl fmt::Display for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }

/// The effective type of a box: the 4CC, or the 16-byte extended identifier
/// when the 4CC was the `uuid` sentinel.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum BoxType {
    FourCC(FourCC),
    Uuid([u8; 16]),
}

impl BoxType {
    pub fn fourcc(&self) -> Option<FourCC> {
        match self {
            BoxType::FourCC(cc) => Some(*cc),
            BoxType::Uuid(_) => None,
        }
    }

    /// True when this is the given 4CC (compared in trimmed form).
    pub fn is(&self, code: &str) -> bool {
        match self {
            BoxType::FourCC(cc) => cc.trimmed() == code,
            BoxType::Uuid(_) => false,
        }
    }
}

impl fmt::Debug for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxType::FourCC(cc) => write!(f, "{}", cc),
            BoxType::Uuid(u) => write!(f, "uuid:{}", hex::encode(u)),
        }
    }
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Serialize for BoxType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BoxType::FourCC(cc) => serializer.serialize_str(&cc.trimmed()),
            BoxType::Uuid(u) => serializer.serialize_str(&hex::encode(u)),
        }
    }
}
