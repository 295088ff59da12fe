//! In-memory search backend for tests and examples.
//!
//! Evaluates term/terms/multi-match clauses, sorting and windowing over a
//! seeded document vector, and counts fetch/scan round trips so tests can
//! assert which retrieval strategy actually ran. Not a real engine: the
//! multi-match clause is a case-insensitive substring match, not relevance
//! scoring.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::backend::{DocumentStore, HitStream, ScanOptions, SearchBackend, SearchHit};
use crate::document::{Document, ID_FIELD};
use crate::error::{Result, SearchFrameError};
use crate::query::{Query, QueryClause, SortField, SortOrder};

/// Seedable, call-counting [`SearchBackend`] + [`DocumentStore`].
pub struct InMemoryBackend {
	index: String,
	documents: Mutex<Vec<Document>>,
	next_id: AtomicUsize,
	fetch_calls: AtomicUsize,
	scan_calls: AtomicUsize,
	count_calls: AtomicUsize,
	fail_fetch: Mutex<Option<String>>,
	fail_count: Mutex<Option<String>>,
	fail_scan: Mutex<Option<String>>,
}

impl InMemoryBackend {
	pub fn new(index: impl Into<String>) -> Self {
		Self {
			index: index.into(),
			documents: Mutex::new(Vec::new()),
			next_id: AtomicUsize::new(0),
			fetch_calls: AtomicUsize::new(0),
			scan_calls: AtomicUsize::new(0),
			count_calls: AtomicUsize::new(0),
			fail_fetch: Mutex::new(None),
			fail_count: Mutex::new(None),
			fail_scan: Mutex::new(None),
		}
	}

	/// Inserts a document as-is, bypassing identity assignment.
	pub fn seed(&self, document: Document) {
		self.documents.lock().push(document);
	}

	pub fn fetch_calls(&self) -> usize {
		self.fetch_calls.load(AtomicOrdering::SeqCst)
	}

	pub fn scan_calls(&self) -> usize {
		self.scan_calls.load(AtomicOrdering::SeqCst)
	}

	pub fn count_calls(&self) -> usize {
		self.count_calls.load(AtomicOrdering::SeqCst)
	}

	/// Makes the next `fetch` fail with a transport-style error.
	pub fn fail_next_fetch(&self, message: impl Into<String>) {
		*self.fail_fetch.lock() = Some(message.into());
	}

	/// Makes the next `count` fail with a transport-style error.
	pub fn fail_next_count(&self, message: impl Into<String>) {
		*self.fail_count.lock() = Some(message.into());
	}

	/// Makes the next `scan` page fail with a transport-style error.
	pub fn fail_next_scan(&self, message: impl Into<String>) {
		*self.fail_scan.lock() = Some(message.into());
	}

	fn take_failure(slot: &Mutex<Option<String>>) -> Option<SearchFrameError> {
		slot.lock()
			.take()
			.map(|message| SearchFrameError::retrieval(std::io::Error::other(message)))
	}

	fn matching(&self, query: &Query) -> Vec<Document> {
		self.documents
			.lock()
			.iter()
			.filter(|doc| query.clauses().iter().all(|clause| matches(doc, clause)))
			.cloned()
			.collect()
	}

	fn ordered(&self, query: &Query, apply_sort: bool) -> Vec<Document> {
		let mut docs = self.matching(query);
		if apply_sort && query.is_sorted() {
			docs.sort_by(|a, b| compare_documents(a, b, query.sort_spec()));
		}
		docs
	}
}

fn matches(doc: &Document, clause: &QueryClause) -> bool {
	match clause {
		QueryClause::Term { field, value } => {
			doc.get(field).is_some_and(|v| values_equal(v, value))
		}
		QueryClause::Terms { field, values } => doc
			.get(field)
			.is_some_and(|v| values.iter().any(|wanted| values_equal(v, wanted))),
		QueryClause::MultiMatch { query, fields } => {
			let needle = query.to_lowercase();
			fields.iter().any(|field| {
				doc.get(field)
					.and_then(Value::as_str)
					.is_some_and(|text| text.to_lowercase().contains(&needle))
			})
		}
	}
}

/// Loose equality: request parameters arrive as strings, documents may hold
/// typed values.
fn values_equal(stored: &Value, wanted: &Value) -> bool {
	if stored == wanted {
		return true;
	}
	scalar_text(stored) == scalar_text(wanted)
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

fn compare_documents(a: &Document, b: &Document, sort: &[SortField]) -> Ordering {
	for spec in sort {
		let ordering = compare_values(
			a.get(&spec.field).unwrap_or(&Value::Null),
			b.get(&spec.field).unwrap_or(&Value::Null),
		);
		let ordering = match spec.order {
			SortOrder::Asc => ordering,
			SortOrder::Desc => ordering.reverse(),
		};
		if ordering != Ordering::Equal {
			return ordering;
		}
	}
	Ordering::Equal
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) => {
			let (x, y) = (x.as_f64(), y.as_f64());
			x.partial_cmp(&y).unwrap_or(Ordering::Equal)
		}
		(Value::String(x), Value::String(y)) => x.cmp(y),
		_ => scalar_text(a).cmp(&scalar_text(b)),
	}
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
	async fn count(&self, query: &Query) -> Result<u64> {
		self.count_calls.fetch_add(1, AtomicOrdering::SeqCst);
		if let Some(error) = Self::take_failure(&self.fail_count) {
			return Err(error);
		}
		Ok(self.matching(query).len() as u64)
	}

	async fn fetch(&self, query: &Query) -> Result<Vec<Document>> {
		self.fetch_calls.fetch_add(1, AtomicOrdering::SeqCst);
		if let Some(error) = Self::take_failure(&self.fail_fetch) {
			return Err(error);
		}
		let docs = self.ordered(query, true);
		let window = query.window();
		let offset = window.offset.unwrap_or(0) as usize;
		let limit = window.limit.map(|l| l as usize).unwrap_or(docs.len());
		Ok(docs.into_iter().skip(offset).take(limit).collect())
	}

	async fn scan(&self, query: &Query, options: ScanOptions) -> Result<HitStream> {
		self.scan_calls.fetch_add(1, AtomicOrdering::SeqCst);
		if let Some(error) = Self::take_failure(&self.fail_scan) {
			return Err(error);
		}
		let docs = self.ordered(query, options.preserve_order);
		let hits: Vec<Result<SearchHit>> =
			docs.into_iter().map(|doc| Ok(SearchHit::from(doc))).collect();
		Ok(Box::pin(stream::iter(hits)))
	}

	async fn schema_fields(&self, _index: &str) -> Result<BTreeSet<String>> {
		let mut fields = BTreeSet::new();
		for doc in self.documents.lock().iter() {
			fields.extend(doc.fields().keys().cloned());
		}
		Ok(fields)
	}
}

#[async_trait]
impl DocumentStore for InMemoryBackend {
	async fn index(&self, _index: &str, document: Document) -> Result<Document> {
		let document = if document.id().is_some() {
			document
		} else {
			let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
			document.with_field(ID_FIELD, format!("mem-{id}"))
		};
		self.documents.lock().push(document.clone());
		Ok(document)
	}

	async fn update(&self, _index: &str, id: &str, fields: Map<String, Value>) -> Result<Document> {
		let mut docs = self.documents.lock();
		let doc = docs
			.iter_mut()
			.find(|doc| doc.id() == Some(id))
			.ok_or(SearchFrameError::NotFound)?;
		*doc = doc.clone().merged_with(&fields);
		Ok(doc.clone())
	}

	async fn delete(&self, _index: &str, id: &str) -> Result<()> {
		let mut docs = self.documents.lock();
		let position = docs
			.iter()
			.position(|doc| doc.id() == Some(id))
			.ok_or(SearchFrameError::NotFound)?;
		docs.remove(position);
		Ok(())
	}
}

impl std::fmt::Debug for InMemoryBackend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InMemoryBackend")
			.field("index", &self.index)
			.field("documents", &self.documents.lock().len())
			.finish()
	}
}
