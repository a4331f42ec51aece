//! Wildcard-tolerant byte-signature matching.
//!
//! A flexible pattern is a sequence of literal byte runs and fixed-length
//! gaps, tolerant of compiler-introduced variation between game builds. The
//! first segment must be literal: it is the anchor the search scans for
//! before trying the rest of the pattern.

use memchr::memmem;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One piece of a flexible pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternSegment {
    /// Literal bytes that must match exactly.
    Bytes(Vec<u8>),
    /// A gap of this many bytes whose content does not matter.
    Skip(u32),
}

impl PatternSegment {
    pub fn len(&self) -> usize {
        match self {
            PatternSegment::Bytes(bytes) => bytes.len(),
            PatternSegment::Skip(count) => *count as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A compiled signature of literal segments and wildcard gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexiblePattern {
    segments: Vec<PatternSegment>,
}

impl FlexiblePattern {
    /// Build a pattern, enforcing the anchor rule: the first segment must be
    /// a non-empty literal run. A `Skip`-first pattern has nothing to anchor
    /// the search on and is rejected outright.
    pub fn new(segments: Vec<PatternSegment>) -> Result<Self> {
        match segments.first() {
            Some(PatternSegment::Bytes(bytes)) if !bytes.is_empty() => Ok(Self { segments }),
            _ => Err(Error::PatternNeedsAnchor),
        }
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    fn anchor(&self) -> &[u8] {
        match &self.segments[0] {
            PatternSegment::Bytes(bytes) => bytes,
            // Ruled out by the constructor.
            PatternSegment::Skip(_) => &[],
        }
    }

    /// Try to match the whole pattern at `start`.
    ///
    /// Literal segments need exact slice equality; a gap advances the cursor
    /// unconditionally and fails only by running past the buffer end.
    /// Returns `start` on success. Never panics on malformed input.
    pub fn match_at(&self, data: &[u8], start: usize) -> Option<usize> {
        let mut pos = start;

        for segment in &self.segments {
            match segment {
                PatternSegment::Bytes(bytes) => {
                    let end = pos.checked_add(bytes.len())?;
                    if end > data.len() || &data[pos..end] != bytes.as_slice() {
                        return None;
                    }
                    pos = end;
                }
                PatternSegment::Skip(count) => {
                    pos = pos.checked_add(*count as usize)?;
                    if pos > data.len() {
                        return None;
                    }
                }
            }
        }

        Some(start)
    }

    /// Find the earliest position where the whole pattern matches.
    ///
    /// Anchor occurrences are visited in strictly increasing offset order
    /// (including overlapping ones), so the earliest full match wins even
    /// when the anchor bytes recur earlier without the rest matching.
    pub fn search(&self, data: &[u8]) -> Option<usize> {
        let finder = memmem::Finder::new(self.anchor());
        let mut from = 0;

        while let Some(found) = finder.find(&data[from..]) {
            let at = from + found;
            if self.match_at(data, at).is_some() {
                return Some(at);
            }
            from = at + 1;
        }

        None
    }

    /// Total span of the pattern, literal and gap bytes included. A match
    /// starting at `p` covers `p .. p + total_len()`.
    pub fn total_len(&self) -> usize {
        self.segments.iter().map(PatternSegment::len).sum()
    }
}
