//! Event kinds and kind filters.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// The name accepted in kind lists as shorthand for every kind.
pub const ALL_KINDS: &str = "All";

/// Semantic classification of a pushed event.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Create = 0b001,
    Update = 0b010,
    Delete = 0b100,
}

impl EventKind {
    /// Every kind, in wire order.
    pub const ALL: [EventKind; 3] = [EventKind::Create, EventKind::Update, EventKind::Delete];

    /// Canonical (capitalized) name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Create => "Create",
            EventKind::Update => "Update",
            EventKind::Delete => "Delete",
        }
    }

    fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Same leniency as `FromStr`, so `"update"` from the wire is accepted.
impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Returned when a string does not name one of the three event kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized event kind '{0}' (expected Create, Update or Delete)")]
pub struct ParseKindError(pub String);

impl FromStr for EventKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// A set of event kinds stored as a bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u8);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);
    pub const ALL: KindSet = KindSet(0b111);

    /// Parse a list of kind names.
    ///
    /// An empty list, or any entry equal to `All` (case-insensitive), yields
    /// [`KindSet::ALL`]. Other entries must name a kind.
    pub fn parse<I, S>(names: I) -> Result<Self, ParseKindError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = KindSet::EMPTY;
        let mut seen_any = false;
        for name in names {
            seen_any = true;
            let name = name.as_ref();
            if name.trim().eq_ignore_ascii_case(ALL_KINDS) {
                return Ok(KindSet::ALL);
            }
            set = set.with(name.parse()?);
        }
        Ok(if seen_any { set } else { KindSet::ALL })
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Set with `kind` added.
    pub fn with(self, kind: EventKind) -> Self {
        KindSet(self.0 | kind.bit())
    }

    pub fn union(self, other: KindSet) -> Self {
        KindSet(self.0 | other.0)
    }

    /// Set with every kind in `other` removed.
    pub fn difference(self, other: KindSet) -> Self {
        KindSet(self.0 & !other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = EventKind> + '_ {
        EventKind::ALL.into_iter().filter(|kind| self.contains(*kind))
    }
}

impl From<EventKind> for KindSet {
    fn from(kind: EventKind) -> Self {
        KindSet(kind.bit())
    }
}

impl BitOr for KindSet {
    type Output = KindSet;

    fn bitor(self, rhs: KindSet) -> KindSet {
        self.union(rhs)
    }
}

impl BitOr<EventKind> for KindSet {
    type Output = KindSet;

    fn bitor(self, rhs: EventKind) -> KindSet {
        self.with(rhs)
    }
}

impl BitOr for EventKind {
    type Output = KindSet;

    fn bitor(self, rhs: EventKind) -> KindSet {
        KindSet::from(self).with(rhs)
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
