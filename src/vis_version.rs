//! VIS release versions.

use crate::{Error, Result};

/// A released version of the Vessel Information Structure.
///
/// Ordered oldest to newest; versioning walks this order one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum VisVersion {
    V3_4a,
    V3_5a,
    V3_6a,
    V3_7a,
    V3_8a,
}

impl VisVersion {
    /// All released versions, oldest first.
    pub fn all() -> &'static [VisVersion] {
        &[
            VisVersion::V3_4a,
            VisVersion::V3_5a,
            VisVersion::V3_6a,
            VisVersion::V3_7a,
            VisVersion::V3_8a,
        ]
    }

    /// The newest released version.
    pub fn latest() -> VisVersion {
        *Self::all().last().unwrap()
    }

    /// The immediately following version, if any.
    pub fn next(self) -> Option<VisVersion> {
        let all = Self::all();
        let pos = all.iter().position(|&v| v == self)?;
        all.get(pos + 1).copied()
    }

    /// The release string as used in resource file names, e.g. `3-4a`.
    pub fn as_str(self) -> &'static str {
        match self {
            VisVersion::V3_4a => "3-4a",
            VisVersion::V3_5a => "3-5a",
            VisVersion::V3_6a => "3-6a",
            VisVersion::V3_7a => "3-7a",
            VisVersion::V3_8a => "3-8a",
        }
    }

    /// Parse a release string. Accepts both the file-name form (`3-4a`) and
    /// the `visRelease` form found inside resource JSON (`3.4a`).
    pub fn parse(s: &str) -> Result<VisVersion> {
        let normalized = s.trim().replace('.', "-");
        Self::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("unknown VIS version: '{s}'")))
    }
}

impl std::fmt::Display for VisVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VisVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
