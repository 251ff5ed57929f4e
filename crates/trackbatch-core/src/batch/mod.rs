//! Track numbers and batch planning.
//!
//! Reads the input list, deduplicates it, and splits it into batches no
//! larger than the upstream cap. Batches are immutable once built.

mod plan;

pub use plan::{parse_track_numbers, plan_batches, read_track_file};

use std::collections::BTreeSet;
use std::fmt;

/// Largest batch the upstream endpoint accepts in one request.
pub const MAX_BATCH_SIZE: usize = 40;

/// Opaque shipment identifier. Never empty, never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackNumber(String);

impl TrackNumber {
    /// Builds a track number from raw input, trimming surrounding whitespace.
    /// Returns `None` if nothing is left or the rest is not ASCII; the request
    /// body must match what the endpoint hashes byte for byte.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.is_ascii() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of track numbers submitted in one HTTP exchange.
///
/// Set semantics: duplicates collapse on construction. Size is not capped
/// here; the client refuses oversized batches before touching the network.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Batch {
    numbers: BTreeSet<TrackNumber>,
}

impl Batch {
    pub fn new<I>(numbers: I) -> Self
    where
        I: IntoIterator<Item = TrackNumber>,
    {
        Self {
            numbers: numbers.into_iter().collect(),
        }
    }

    /// Convenience constructor from raw strings; empty entries are dropped.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(raw.into_iter().filter_map(|s| TrackNumber::new(s.as_ref())))
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn contains(&self, number: &str) -> bool {
        self.numbers.iter().any(|n| n.as_str() == number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackNumber> {
        self.numbers.iter()
    }

    /// Working copy of the numbers as plain strings (used by the classifier).
    pub fn to_string_set(&self) -> BTreeSet<String> {
        self.numbers.iter().map(|n| n.as_str().to_string()).collect()
    }
}
