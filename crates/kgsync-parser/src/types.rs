//! Reference types shared by the parser and the record model

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// `[[page]]`
    Page,
    /// `((block-uuid))`
    Block,
    /// `#tag`
    Tag,
    /// `key:: value`
    Property,
}

impl ReferenceKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Block => "block",
            Self::Tag => "tag",
            Self::Property => "property",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed pointer found in block text
///
/// `name` holds a page name, block uuid, tag name or property key depending on
/// `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub name: String,
}

impl Reference {
    pub fn new(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn page(name: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Page, name)
    }

    pub fn block(id: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Block, id)
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Tag, name)
    }

    pub fn property(key: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Property, key)
    }
}
