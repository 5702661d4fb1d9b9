//! Index terms.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A term: a field name plus the raw bytes of one indexed value.
///
/// Equality and ordering are byte-exact; terms sort by field first, then by
/// value bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    /// The field this term belongs to.
    field: String,
    /// The term value.
    bytes: Vec<u8>,
}

impl Term {
    /// Create a term from raw bytes.
    pub fn new<F, B>(field: F, bytes: B) -> Self
    where
        F: Into<String>,
        B: Into<Vec<u8>>,
    {
        Term {
            field: field.into(),
            bytes: bytes.into(),
        }
    }

    /// Create a term from UTF-8 text.
    pub fn from_text<F, T>(field: F, text: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        Term::new(field, text.into().into_bytes())
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the value bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the value as text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Approximate heap footprint of this term.
    pub fn heap_size(&self) -> usize {
        self.field.capacity() + self.bytes.capacity()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, String::from_utf8_lossy(&self.bytes))
    }
}
