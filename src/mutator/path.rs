//! Correction path syntax
//!
//! A correction path is a dot-separated list of field names, each optionally
//! followed by one or more array indices:
//!
//! ```text
//! address.city
//! lines[2].amount
//! matrix[0][1]
//! ```
//!
//! Parsing never creates segments that the structure lacks; that check is the
//! mutator's job at apply time.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::errors::{MutationError, MutationResult};

/// One step of a correction path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named field of an object.
    Field(String),
    /// Position in an array.
    Index(usize),
}

/// A parsed, validated correction path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrectionPath {
    raw: String,
    segments: Vec<PathSegment>,
}

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^.\[\]\s]+)((?:\[\d+\])*)$").expect("segment pattern is a valid regex")
    })
}

fn index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("index pattern is a valid regex"))
}

impl CorrectionPath {
    /// Parses a dotted path.
    ///
    /// # Errors
    ///
    /// `MutationError::InvalidPath` for an empty path, an empty segment, or a
    /// malformed index.
    pub fn parse(raw: &str) -> MutationResult<Self> {
        if raw.trim().is_empty() {
            return Err(MutationError::invalid_path(raw, "path is empty"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            let captures = segment_pattern().captures(part).ok_or_else(|| {
                MutationError::invalid_path(raw, format!("malformed segment '{}'", part))
            })?;

            segments.push(PathSegment::Field(captures[1].to_string()));

            if let Some(indices) = captures.get(2) {
                for index in index_pattern().captures_iter(indices.as_str()) {
                    let position = index[1].parse::<usize>().map_err(|_| {
                        MutationError::invalid_path(
                            raw,
                            format!("index '{}' out of range", &index[1]),
                        )
                    })?;
                    segments.push(PathSegment::Index(position));
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for CorrectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for CorrectionPath {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
