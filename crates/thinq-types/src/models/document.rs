//! Stored documents, filters and batch write operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// Address of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocRef {
    pub collection: String,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self { collection: collection.into(), id: id.into() }
    }
}

/// A document as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub collection: String,
    pub fields: Fields,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }
}

/// Equality filter over document fields.
///
/// Missing fields never match, so `Filter::eq("is_selected", true)` skips
/// documents that were created without the flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    All,
    Eq { field: String, value: Value },
    And { filters: Vec<Filter> },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq { field: field.into(), value: value.into() }
    }

    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Self::All, other) | (other, Self::All) => other,
            (Self::And { mut filters }, Self::And { filters: more }) => {
                filters.extend(more);
                Self::And { filters }
            },
            (Self::And { mut filters }, other) | (other, Self::And { mut filters }) => {
                filters.push(other);
                Self::And { filters }
            },
            (left, right) => Self::And { filters: vec![left, right] },
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => fields.get(field) == Some(value),
            Self::And { filters } => filters.iter().all(|f| f.matches(fields)),
        }
    }

    /// JSON object every matching document must contain.
    ///
    /// Returns `None` when two conditions require different values for the
    /// same field, i.e. nothing can match.
    pub fn containment(&self) -> Option<Value> {
        let mut object = Fields::new();
        if self.collect_containment(&mut object) {
            Some(Value::Object(object))
        } else {
            None
        }
    }

    fn collect_containment(&self, object: &mut Fields) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => match object.get(field) {
                Some(existing) => existing == value,
                None => {
                    object.insert(field.clone(), value.clone());
                    true
                },
            },
            Self::And { filters } => filters.iter().all(|f| f.collect_containment(object)),
        }
    }
}

/// One write inside an atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Merge `fields` into an existing document. The whole commit fails with
    /// `NotFound` when the target is missing.
    Update { target: DocRef, fields: Fields },
    /// Merge `fields` into every document of `collection` that matches
    /// `filter` at the moment the commit applies.
    UpdateWhere { collection: String, filter: Filter, fields: Fields },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            Self::Update { target, .. } => &target.collection,
            Self::UpdateWhere { collection, .. } => collection,
        }
    }
}
