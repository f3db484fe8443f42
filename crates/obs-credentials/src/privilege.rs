//! Ordered privilege levels and the sets granted to a credential.
//!
//! Levels form a total order: `Read < Write < Update < Delete < Admin`.
//! Holding a level authorizes every operation whose required level is less
//! than or equal to it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CredentialError, CredentialResult};

/// One rank on the capability scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PrivilegeLevel {
    /// Read objects and bucket metadata.
    Read = 0,
    /// Upload new objects.
    Write = 1,
    /// Overwrite existing objects.
    Update = 2,
    /// Delete objects and buckets.
    Delete = 3,
    /// Full control.
    Admin = 4,
}

impl PrivilegeLevel {
    /// Every level in ascending rank order.
    pub const ALL: [Self; 5] = [
        Self::Read,
        Self::Write,
        Self::Update,
        Self::Delete,
        Self::Admin,
    ];

    /// Numeric rank (0 for `Read` up to 4 for `Admin`).
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// The level with the given rank, if any.
    #[must_use]
    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::Read),
            1 => Some(Self::Write),
            2 => Some(Self::Update),
            3 => Some(Self::Delete),
            4 => Some(Self::Admin),
            _ => None,
        }
    }

    /// Bit `rank` of the privilege bitmask.
    const fn bit(self) -> u8 {
        match self {
            Self::Read => 0b0000_0001,
            Self::Write => 0b0000_0010,
            Self::Update => 0b0000_0100,
            Self::Delete => 0b0000_1000,
            Self::Admin => 0b0001_0000,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivilegeLevel {
    type Err = CredentialError;

    fn from_str(s: &str) -> CredentialResult<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CredentialError::InvalidRequest(format!("unknown privilege '{s}'")))
    }
}

impl TryFrom<u8> for PrivilegeLevel {
    type Error = CredentialError;

    fn try_from(rank: u8) -> CredentialResult<Self> {
        Self::from_rank(rank)
            .ok_or_else(|| CredentialError::InvalidRequest(format!("privilege rank {rank} out of range")))
    }
}

/// The levels granted to one credential, stored as a bitmask.
///
/// Bit `i` set means `PrivilegeLevel` with rank `i` is granted. Insertion
/// order is irrelevant and repeated insertion is idempotent.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<PrivilegeLevel>", into = "Vec<PrivilegeLevel>")]
pub struct PrivilegeSet(u8);

impl PrivilegeSet {
    /// Mask of all bits that correspond to a defined level.
    const VALID_BITS: u8 = 0b0001_1111;

    /// The empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// A set holding exactly one level.
    #[must_use]
    pub const fn single(level: PrivilegeLevel) -> Self {
        Self(level.bit())
    }

    /// Rebuild a set from its bitmask.
    ///
    /// Returns `None` if any bit outside the defined levels is set.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::VALID_BITS == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// The raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Add a level. Returns `true` if it was not already present.
    pub fn insert(&mut self, level: PrivilegeLevel) -> bool {
        let added = !self.contains(level);
        self.0 |= level.bit();
        added
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, level: PrivilegeLevel) -> Self {
        self.insert(level);
        self
    }

    /// Whether exactly this level was granted.
    #[must_use]
    pub const fn contains(self, level: PrivilegeLevel) -> bool {
        self.0 & level.bit() != 0
    }

    /// Whether any granted level is at or above `required`.
    ///
    /// An empty set never satisfies this check.
    #[must_use]
    pub fn has_at_least(self, required: PrivilegeLevel) -> bool {
        self.iter().any(|level| level >= required)
    }

    /// Highest granted level.
    #[must_use]
    pub fn max(self) -> Option<PrivilegeLevel> {
        self.iter().next_back()
    }

    /// Whether no level is granted.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of granted levels.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Granted levels in ascending rank order.
    pub fn iter(self) -> impl DoubleEndedIterator<Item = PrivilegeLevel> {
        PrivilegeLevel::ALL
            .into_iter()
            .filter(move |level| self.contains(*level))
    }
}

impl fmt::Debug for PrivilegeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for PrivilegeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, level) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(level.as_str())?;
        }
        Ok(())
    }
}

impl FromIterator<PrivilegeLevel> for PrivilegeSet {
    fn from_iter<I: IntoIterator<Item = PrivilegeLevel>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<PrivilegeLevel> for PrivilegeSet {
    fn extend<I: IntoIterator<Item = PrivilegeLevel>>(&mut self, iter: I) {
        for level in iter {
            self.insert(level);
        }
    }
}

impl From<PrivilegeLevel> for PrivilegeSet {
    fn from(level: PrivilegeLevel) -> Self {
        Self::single(level)
    }
}

impl From<Vec<PrivilegeLevel>> for PrivilegeSet {
    fn from(levels: Vec<PrivilegeLevel>) -> Self {
        levels.into_iter().collect()
    }
}

impl From<PrivilegeSet> for Vec<PrivilegeLevel> {
    fn from(set: PrivilegeSet) -> Self {
        set.iter().collect()
    }
}
