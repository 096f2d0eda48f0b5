//! Hierarchical store addressing.
//!
//! Records live at `collection/<uid>/<recordId>`; a user's whole timetable is
//! the parent node `collection/<uid>`.

use std::fmt;

use crate::identity::Uid;
use crate::task::RecordId;

/// Characters a path segment may not contain.
const FORBIDDEN: [char; 6] = ['/', '.', '#', '$', '[', ']'];

/// Errors produced while building or parsing a [`StorePath`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path had no segments at all.
    #[error("store path is empty")]
    Empty,
    /// One of the segments was empty (e.g. `a//b`).
    #[error("store path {0:?} contains an empty segment")]
    EmptySegment(String),
    /// A segment used a reserved character.
    #[error("store path segment {0:?} contains a reserved character")]
    InvalidSegment(String),
}

/// Address of a node in the store's tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Parse a slash-separated path. Leading and trailing slashes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the path is empty or a segment is empty or
    /// uses a reserved character.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for seg in trimmed.split('/') {
            if seg.is_empty() {
                return Err(PathError::EmptySegment(raw.to_string()));
            }
            validate_segment(seg)?;
            segments.push(seg.to_string());
        }
        Ok(Self { segments })
    }

    /// The per-user collection node, `collection/<uid>`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if either part is not a valid segment.
    pub fn collection(collection: &str, uid: &Uid) -> Result<Self, PathError> {
        Self::parse(collection)?.child(uid.as_str())
    }

    /// A single record node, `collection/<uid>/<recordId>`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if any part is not a valid segment.
    pub fn record(collection: &str, uid: &Uid, id: &RecordId) -> Result<Self, PathError> {
        Self::collection(collection, uid)?.child(id.as_str())
    }

    /// Append one segment.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if `segment` is empty or uses a reserved character.
    pub fn child(&self, segment: &str) -> Result<Self, PathError> {
        if segment.is_empty() {
            return Err(PathError::EmptySegment(format!("{self}/")));
        }
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// The path segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment (the record key for record paths).
    #[must_use]
    pub fn key(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Whether `self` is `other` or one of its ancestors.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.segments.len() >= self.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    /// Whether a write at one path can change what a reader of the other sees.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

fn validate_segment(seg: &str) -> Result<(), PathError> {
    if seg.chars().any(|c| FORBIDDEN.contains(&c) || c.is_control()) {
        return Err(PathError::InvalidSegment(seg.to_string()));
    }
    Ok(())
}
