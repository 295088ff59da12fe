//! Window-aware result retrieval.
//!
//! Search engines reject random-access pagination past a configured
//! `max_result_window`-style ceiling. Given a query annotated with an
//! optional offset/limit window, the retriever picks, per call, between
//! direct sliced retrieval and a scroll-style sequential scan with
//! client-side slicing, and returns the same ordered subset of documents
//! either way. Direct retrieval is preferred; the scan is only paid for when
//! the window lies beyond the ceiling.

use futures::StreamExt;
use tracing::debug;

use crate::backend::{ScanOptions, SearchBackend};
use crate::document::Document;
use crate::error::Result;
use crate::query::{Query, Window};

/// Executes windowed queries against a backend without ever issuing a
/// request the backend would reject.
#[derive(Debug, Clone)]
pub struct Retriever {
	max_offset: u64,
	scan_page_size: u64,
	scroll_ttl: String,
}

impl Retriever {
	/// Creates a retriever for a backend whose native ceiling on
	/// `offset + limit` is `max_offset`.
	pub fn new(max_offset: u64) -> Self {
		Self {
			max_offset,
			scan_page_size: 500,
			scroll_ttl: "1m".to_string(),
		}
	}

	/// Hits fetched per scroll round trip during scans.
	pub fn scan_page_size(mut self, page_size: u64) -> Self {
		self.scan_page_size = page_size;
		self
	}

	/// Scroll context keep-alive during scans.
	pub fn scroll_ttl(mut self, ttl: impl Into<String>) -> Self {
		self.scroll_ttl = ttl.into();
		self
	}

	/// Returns the ordered, finite sequence of documents for the query's
	/// window.
	///
	/// A window reaching past the total yields an empty result. Backend
	/// failures surface as [`SearchFrameError::Retrieval`]; a partial result
	/// is never returned in their place.
	///
	/// [`SearchFrameError::Retrieval`]: crate::error::SearchFrameError::Retrieval
	pub async fn retrieve(
		&self,
		backend: &dyn SearchBackend,
		query: &Query,
	) -> Result<Vec<Document>> {
		let window = query.window();
		match (window.offset, window.limit) {
			(None, None) => {
				let total = backend.count(query).await?;
				if total <= self.max_offset {
					self.direct(backend, query, 0, total).await
				} else {
					self.scan_window(backend, query, 0, None).await
				}
			}
			(None, Some(limit)) => {
				if limit <= self.max_offset {
					self.direct(backend, query, 0, limit).await
				} else {
					self.scan_window(backend, query, 0, Some(limit)).await
				}
			}
			(Some(offset), None) => {
				// The open-ended window is bounded by the current total, so
				// the slice always runs to the end of the result set.
				let total = backend.count(query).await?;
				if total <= self.max_offset {
					self.direct(backend, query, offset, total.saturating_sub(offset))
						.await
				} else {
					self.scan_window(backend, query, offset, Some(total.saturating_sub(offset)))
						.await
				}
			}
			(Some(offset), Some(limit)) => {
				if offset.saturating_add(limit) <= self.max_offset {
					self.direct(backend, query, offset, limit).await
				} else {
					self.scan_window(backend, query, offset, Some(limit)).await
				}
			}
		}
	}

	async fn direct(
		&self,
		backend: &dyn SearchBackend,
		query: &Query,
		offset: u64,
		limit: u64,
	) -> Result<Vec<Document>> {
		if limit == 0 {
			return Ok(Vec::new());
		}
		debug!(offset, limit, "retrieving via direct slice");
		let windowed = query.clone().with_window(Window {
			offset: Some(offset),
			limit: Some(limit),
		});
		backend.fetch(&windowed).await
	}

	/// Sequentially scans the full result set, skipping `skip` hits and
	/// taking at most `take`.
	///
	/// The scan preserves the query's sort order when one is declared —
	/// required for the skip/take slice to match a direct slice — and is
	/// consumed lazily: skipped hits are never materialized into documents
	/// and nothing past the window is pulled from the backend.
	async fn scan_window(
		&self,
		backend: &dyn SearchBackend,
		query: &Query,
		skip: u64,
		take: Option<u64>,
	) -> Result<Vec<Document>> {
		if take == Some(0) {
			return Ok(Vec::new());
		}
		debug!(skip, ?take, "retrieving via sequential scan");

		let options = ScanOptions {
			preserve_order: query.is_sorted(),
			page_size: self.scan_page_size,
			scroll_ttl: self.scroll_ttl.clone(),
		};
		let unwindowed = query.clone().without_window();
		let mut hits = backend.scan(&unwindowed, options).await?;

		let mut skipped = 0u64;
		let mut documents = Vec::new();
		while let Some(hit) = hits.next().await {
			// Errors surface even while inside the skipped prefix.
			let hit = hit?;
			if skipped < skip {
				skipped += 1;
				continue;
			}
			documents.push(hit.into_document());
			if take.is_some_and(|n| documents.len() as u64 >= n) {
				break;
			}
		}
		Ok(documents)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::SortField;
	use crate::testing::InMemoryBackend;
	use rstest::rstest;
	use serde_json::json;

	fn backend_with(n: usize) -> InMemoryBackend {
		let backend = InMemoryBackend::new("articles");
		for i in 0..n {
			backend.seed(
				Document::new()
					.with_field("_id", format!("d{i:04}"))
					.with_field("n", i),
			);
		}
		backend
	}

	fn sorted_query() -> Query {
		Query::new("articles").sort([SortField::parse("n")])
	}

	#[rstest]
	#[tokio::test]
	async fn test_no_window_under_threshold_fetches_all_directly() {
		let backend = backend_with(30);
		let docs = Retriever::new(100)
			.retrieve(&backend, &Query::new("articles"))
			.await
			.unwrap();
		assert_eq!(docs.len(), 30);
		assert_eq!(backend.fetch_calls(), 1);
		assert_eq!(backend.scan_calls(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_no_window_over_threshold_scans_everything() {
		let backend = backend_with(30);
		let docs = Retriever::new(20)
			.retrieve(&backend, &sorted_query())
			.await
			.unwrap();
		assert_eq!(docs.len(), 30);
		assert_eq!(backend.fetch_calls(), 0);
		assert_eq!(backend.scan_calls(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_limit_only_over_threshold_takes_prefix_from_scan() {
		let backend = backend_with(50);
		let docs = Retriever::new(20)
			.retrieve(&backend, &sorted_query().limit(25))
			.await
			.unwrap();
		assert_eq!(docs.len(), 25);
		assert_eq!(docs[24].get("n"), Some(&json!(24)));
		assert_eq!(backend.scan_calls(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_offset_only_slices_to_end_of_current_result_set() {
		let backend = backend_with(40);
		let docs = Retriever::new(100)
			.retrieve(&backend, &sorted_query().offset(35))
			.await
			.unwrap();
		assert_eq!(docs.len(), 5);
		assert_eq!(docs[0].get("n"), Some(&json!(35)));
		assert_eq!(backend.fetch_calls(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_window_beyond_total_is_empty_not_error() {
		let backend = backend_with(10);
		let retriever = Retriever::new(100);
		let docs = retriever
			.retrieve(&backend, &sorted_query().offset(50))
			.await
			.unwrap();
		assert!(docs.is_empty());

		let docs = retriever
			.retrieve(&backend, &sorted_query().offset(50).limit(5))
			.await
			.unwrap();
		assert!(docs.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_scan_window_matches_direct_slice() {
		// Cross-check property: the same window retrieved both ways yields
		// the same documents in the same order.
		let direct_backend = backend_with(150);
		let scan_backend = backend_with(150);
		let window = sorted_query().offset(120).limit(10);

		let direct = Retriever::new(1_000)
			.retrieve(&direct_backend, &window)
			.await
			.unwrap();
		let scanned = Retriever::new(100)
			.retrieve(&scan_backend, &window)
			.await
			.unwrap();

		assert_eq!(direct_backend.scan_calls(), 0);
		assert_eq!(scan_backend.scan_calls(), 1);
		assert_eq!(direct, scanned);
		assert_eq!(scanned[0].get("n"), Some(&json!(120)));
		assert_eq!(scanned[9].get("n"), Some(&json!(129)));
	}

	#[rstest]
	#[case(None, None, 150)]
	#[case(None, Some(40), 40)]
	#[case(Some(100), None, 50)]
	#[case(Some(100), Some(30), 30)]
	#[case(Some(140), Some(30), 10)]
	#[tokio::test]
	async fn test_result_length_invariant(
		#[case] offset: Option<u64>,
		#[case] limit: Option<u64>,
		#[case] expected: usize,
	) {
		// len == min(limit, max(total - offset, 0)), limit given or not.
		let backend = backend_with(150);
		let mut query = sorted_query();
		if let Some(offset) = offset {
			query = query.offset(offset);
		}
		if let Some(limit) = limit {
			query = query.limit(limit);
		}
		let docs = Retriever::new(60).retrieve(&backend, &query).await.unwrap();
		assert_eq!(docs.len(), expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_backend_failure_is_surfaced_not_masked() {
		let backend = backend_with(10);
		backend.fail_next_fetch("connection reset");
		let result = Retriever::new(100)
			.retrieve(&backend, &sorted_query().limit(5))
			.await;
		assert!(matches!(
			result,
			Err(crate::error::SearchFrameError::Retrieval(_))
		));
	}
}
