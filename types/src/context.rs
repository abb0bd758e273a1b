//! Auxiliary context records and the references nodes hold to them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

const DEFINITION_PREFIX: &str = "def:";
const ASSUMPTION_PREFIX: &str = "assume:";
const EXTERNAL_PREFIX: &str = "ext:";

/// A parsed context tag.
///
/// Tags are parsed once at ingestion. Anything without a recognized prefix
/// (or with an empty name after it) is kept verbatim as [`ContextRef::Unknown`]
/// and is inert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContextRef {
    Definition(String),
    Assumption(String),
    External(String),
    Unknown(String),
}

impl ContextRef {
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let split = |prefix: &str| tag.strip_prefix(prefix).filter(|rest| !rest.is_empty());
        if let Some(name) = split(DEFINITION_PREFIX) {
            Self::Definition(name.to_owned())
        } else if let Some(id) = split(ASSUMPTION_PREFIX) {
            Self::Assumption(id.to_owned())
        } else if let Some(id) = split(EXTERNAL_PREFIX) {
            Self::External(id.to_owned())
        } else {
            Self::Unknown(tag.to_owned())
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for ContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Definition(name) => write!(f, "{DEFINITION_PREFIX}{name}"),
            Self::Assumption(id) => write!(f, "{ASSUMPTION_PREFIX}{id}"),
            Self::External(id) => write!(f, "{EXTERNAL_PREFIX}{id}"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for ContextRef {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for ContextRef {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<ContextRef> for String {
    fn from(value: ContextRef) -> Self {
        value.to_string()
    }
}

// ── Records ──────────────────────────────────────────────────

/// A named definition, referenced as `def:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub id: String,
    pub name: String,
    pub content: String,
    pub content_hash: ContentHash,
    pub created: DateTime<Utc>,
}

impl Definition {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let content = content.into();
        Self {
            id: id.into(),
            content_hash: ContentHash::of_fields(&[&name, &content]),
            name,
            content,
            created: Utc::now(),
        }
    }
}

/// A global hypothesis, referenced as `assume:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assumption {
    pub id: String,
    pub statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    pub content_hash: ContentHash,
    pub created: DateTime<Utc>,
}

impl Assumption {
    #[must_use]
    pub fn new(id: impl Into<String>, statement: impl Into<String>) -> Self {
        let statement = statement.into();
        Self {
            id: id.into(),
            content_hash: ContentHash::of_fields(&[&statement]),
            statement,
            justification: None,
            created: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }
}

/// A result imported from outside the proof, referenced as `ext:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct External {
    pub id: String,
    pub name: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub content_hash: ContentHash,
    pub created: DateTime<Utc>,
}

impl External {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, source: impl Into<String>) -> Self {
        let name = name.into();
        let source = source.into();
        Self {
            id: id.into(),
            content_hash: ContentHash::of_fields(&[&name, &source]),
            name,
            source,
            notes: None,
            created: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
