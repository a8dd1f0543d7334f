//! Document representation.
//!
//! A document is a flat-ish JSON object addressed by collection path and id.
//! Timestamps are stored as integer milliseconds since the Unix epoch so the
//! store can order them numerically without knowing about calendars.

use serde_json::Value;

/// Field map of a single document.
pub type Fields = serde_json::Map<String, Value>;

/// A document as returned by reads and snapshot subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Id of the document within its collection.
    pub id: String,
    /// The document's field map.
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a single field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}
