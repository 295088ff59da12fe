//! Backend-opaque document records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name carrying a document's stable identity.
pub const ID_FIELD: &str = "_id";

/// A flattened search hit: an ordered field → value mapping.
///
/// Documents are backend-defined; this crate only relies on the identity
/// field for single-object lookup and treats everything else as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
	fields: Map<String, Value>,
}

impl Document {
	/// Creates an empty document.
	pub fn new() -> Self {
		Self { fields: Map::new() }
	}

	/// Builds a document from an ordered field map.
	pub fn from_map(fields: Map<String, Value>) -> Self {
		Self { fields }
	}

	/// Returns the document's identity, if the backend provided one.
	pub fn id(&self) -> Option<&str> {
		self.fields.get(ID_FIELD).and_then(Value::as_str)
	}

	/// Returns the value stored under `field`.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.fields.get(field)
	}

	/// Sets `field` to `value`, returning the document for chaining.
	pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.fields.insert(field.into(), value.into());
		self
	}

	/// Merges `other`'s fields over this document's fields.
	///
	/// Used by partial updates: later values win.
	pub fn merged_with(mut self, other: &Map<String, Value>) -> Self {
		for (k, v) in other {
			self.fields.insert(k.clone(), v.clone());
		}
		self
	}

	/// Borrows the underlying field map.
	pub fn fields(&self) -> &Map<String, Value> {
		&self.fields
	}

	/// Consumes the document into its field map.
	pub fn into_fields(self) -> Map<String, Value> {
		self.fields
	}
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl From<Map<String, Value>> for Document {
	fn from(fields: Map<String, Value>) -> Self {
		Self::from_map(fields)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_identity_field() {
		let doc = Document::new()
			.with_field(ID_FIELD, "a1")
			.with_field("title", "hello");
		assert_eq!(doc.id(), Some("a1"));
		assert_eq!(doc.get("title"), Some(&json!("hello")));
	}

	#[rstest]
	fn test_merged_with_overwrites() {
		let doc = Document::new()
			.with_field("title", "old")
			.with_field("views", 3);
		let patch = json!({"title": "new"});
		let merged = doc.merged_with(patch.as_object().unwrap());
		assert_eq!(merged.get("title"), Some(&json!("new")));
		assert_eq!(merged.get("views"), Some(&json!(3)));
	}

	#[rstest]
	fn test_serialize_transparent() {
		let doc = Document::new().with_field("a", 1).with_field("b", 2);
		assert_eq!(serde_json::to_value(&doc).unwrap(), json!({"a": 1, "b": 2}));
	}
}
