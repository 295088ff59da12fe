//! Search backend interface.
//!
//! The transport/client of the actual engine lives outside this crate; these
//! traits are the seam it plugs into. [`SearchBackend`] covers read paths
//! (cardinality, windowed fetch, scroll-style scan, schema introspection) and
//! [`DocumentStore`] covers the thin write paths used by the view glue.

use std::collections::BTreeSet;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::{Map, Value};

use crate::document::{Document, ID_FIELD};
use crate::error::Result;
use crate::query::Query;

/// Tuning for a scroll-style sequential scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
	/// Preserve the query's declared sort order across scroll pages.
	///
	/// Ordered scans cost strictly more than unordered ones, so this is an
	/// explicit flag rather than an assumption.
	pub preserve_order: bool,
	/// Hits fetched per scroll round trip.
	pub page_size: u64,
	/// Scroll context keep-alive, e.g. `"1m"`.
	pub scroll_ttl: String,
}

/// A raw, not-yet-flattened hit from the backend.
///
/// Keeping hits raw lets the retriever skip past scan elements without
/// paying for document materialization.
#[derive(Debug, Clone)]
pub struct SearchHit {
	raw: Value,
}

impl SearchHit {
	pub fn new(raw: Value) -> Self {
		Self { raw }
	}

	/// Flattens the hit into a [`Document`].
	///
	/// Understands the engine-native `{"_id": ..., "_source": {...}}` shape;
	/// anything else is treated as an already-flat field map.
	pub fn into_document(self) -> Document {
		match self.raw {
			Value::Object(mut hit) => {
				if let Some(Value::Object(source)) = hit.remove("_source") {
					let mut fields = Map::new();
					if let Some(id) = hit.remove(ID_FIELD) {
						fields.insert(ID_FIELD.to_string(), id);
					}
					fields.extend(source);
					Document::from_map(fields)
				} else {
					Document::from_map(hit)
				}
			}
			other => {
				let mut fields = Map::new();
				fields.insert("_raw".to_string(), other);
				Document::from_map(fields)
			}
		}
	}
}

impl From<Document> for SearchHit {
	fn from(document: Document) -> Self {
		Self {
			raw: Value::Object(document.into_fields()),
		}
	}
}

/// Lazily produced, finite, single-pass sequence of scan hits.
///
/// Consuming only a prefix must not force the producer to materialize the
/// remainder; dropping the stream between page fetches cancels the scan.
pub type HitStream = Pin<Box<dyn Stream<Item = Result<SearchHit>> + Send>>;

/// Read-side contract of a document search backend.
#[async_trait]
pub trait SearchBackend: Send + Sync {
	/// One cardinality round trip, independent of any window annotation.
	async fn count(&self, query: &Query) -> Result<u64>;

	/// Direct sliced retrieval honoring the query's window annotation.
	///
	/// Implementations may assume `offset + limit` never exceeds the
	/// engine's native result-window ceiling; the retriever guarantees it.
	async fn fetch(&self, query: &Query) -> Result<Vec<Document>>;

	/// Opens a scroll-style sequential scan over the full result set.
	///
	/// The query's window annotation is ignored; slicing is the caller's
	/// job. When `options.preserve_order` is set the stream follows the
	/// query's sort specification.
	async fn scan(&self, query: &Query, options: ScanOptions) -> Result<HitStream>;

	/// Introspects the set of indexed field names for `index`.
	async fn schema_fields(&self, index: &str) -> Result<BTreeSet<String>>;
}

/// Write-side contract used by the generic view glue.
#[async_trait]
pub trait DocumentStore: Send + Sync {
	/// Stores a new document, returning it with its assigned identity.
	async fn index(&self, index: &str, document: Document) -> Result<Document>;

	/// Applies `fields` over the document identified by `id`.
	async fn update(&self, index: &str, id: &str, fields: Map<String, Value>)
	-> Result<Document>;

	/// Removes the document identified by `id`.
	async fn delete(&self, index: &str, id: &str) -> Result<()>;
}
