use std::fmt;
use std::str::FromStr;

use crate::types::NeticError;

const SAMPLE_MASK: u64 = 0xFF_FFFF;
const PATH_MASK: u64 = 0xFFFF_FFFF;

/// Packed reference to a path: 8 bits path type, 24 bits sample, 32 bits path.
///
/// Subnetworks store these instead of full paths; the path repositories
/// dereference them back to interaction sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId(u64);

impl PathId {
    pub const MAX_PATH_TYPE: usize = u8::MAX as usize;
    pub const MAX_SAMPLE: usize = SAMPLE_MASK as usize;
    pub const MAX_PATH: usize = PATH_MASK as usize;

    pub fn new(path_type: usize, sample: usize, path: usize) -> Result<Self, NeticError> {
        if path_type > Self::MAX_PATH_TYPE || sample > Self::MAX_SAMPLE || path > Self::MAX_PATH {
            return Err(NeticError::InvalidIdentifier(format!(
                "path id ({path_type}, {sample}, {path}) exceeds the packed bit widths"
            )));
        }
        Ok(Self(
            (path_type as u64) << 56 | (sample as u64) << 32 | path as u64,
        ))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn path_type(self) -> usize {
        (self.0 >> 56) as usize
    }

    #[must_use]
    pub const fn sample(self) -> usize {
        ((self.0 >> 32) & SAMPLE_MASK) as usize
    }

    #[must_use]
    pub const fn path(self) -> usize {
        (self.0 & PATH_MASK) as usize
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PathId {
    type Err = NeticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| NeticError::ParseError(format!("invalid path id '{s}'")))
    }
}
