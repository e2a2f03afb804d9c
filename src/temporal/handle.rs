//! ContextHandle - Partially specified snapshot address
//!
//! A handle names an identifier and optionally a version and revision:
//! - identity only       -> current effective snapshot
//! - identity + version  -> latest revision of that version
//! - fully specified     -> one exact stored snapshot
//!
//! A revision without a version is not addressable and cannot be constructed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How much of a snapshot address a handle carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleSpecificity {
    /// Only the identifier.
    Identity,
    /// Identifier and version.
    Version,
    /// Identifier, version and revision.
    Exact,
}

/// An address for a snapshot with one to three specified components.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawHandle<Id>")]
pub struct ContextHandle<Id> {
    identifier: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<u32>,
}

impl<Id> ContextHandle<Id> {
    /// Addresses the current effective snapshot of `identifier`.
    pub fn identity(identifier: Id) -> Self {
        Self {
            identifier,
            version: None,
            revision: None,
        }
    }

    /// Addresses the latest revision of `version`.
    pub fn version(identifier: Id, version: u32) -> Self {
        Self {
            identifier,
            version: Some(version),
            revision: None,
        }
    }

    /// Addresses exactly one stored snapshot.
    pub fn exact(identifier: Id, version: u32, revision: u32) -> Self {
        Self {
            identifier,
            version: Some(version),
            revision: Some(revision),
        }
    }

    #[inline]
    pub fn identifier(&self) -> &Id {
        &self.identifier
    }

    #[inline]
    pub fn version_number(&self) -> Option<u32> {
        self.version
    }

    #[inline]
    pub fn revision_number(&self) -> Option<u32> {
        self.revision
    }

    /// Returns the specificity level of this handle.
    pub fn specificity(&self) -> HandleSpecificity {
        match (self.version, self.revision) {
            (None, _) => HandleSpecificity::Identity,
            (Some(_), None) => HandleSpecificity::Version,
            (Some(_), Some(_)) => HandleSpecificity::Exact,
        }
    }
}

impl<Id: fmt::Display> fmt::Display for ContextHandle<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)?;
        if let Some(version) = self.version {
            write!(f, "/v{}", version)?;
        }
        if let Some(revision) = self.revision {
            write!(f, ".r{}", revision)?;
        }
        Ok(())
    }
}

/// Wire shape accepted on deserialization before validation.
#[derive(Deserialize)]
struct RawHandle<Id> {
    identifier: Id,
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    revision: Option<u32>,
}

impl<Id> TryFrom<RawHandle<Id>> for ContextHandle<Id> {
    type Error = String;

    fn try_from(raw: RawHandle<Id>) -> Result<Self, Self::Error> {
        match (raw.version, raw.revision) {
            (None, None) => Ok(Self::identity(raw.identifier)),
            (Some(v), None) => Ok(Self::version(raw.identifier, v)),
            (Some(v), Some(r)) => Ok(Self::exact(raw.identifier, v, r)),
            (None, Some(r)) => Err(format!(
                "context handle names revision {} without a version",
                r
            )),
        }
    }
}
