//! Strategy-selection tests for the retriever.
//!
//! The in-memory backend counts fetch and scan round trips, so each case
//! asserts both the returned window and which retrieval strategy ran.

use rstest::rstest;
use searchframe::testing::InMemoryBackend;
use searchframe::{Document, Query, Retriever, SortField};
use serde_json::json;

fn backend_with(total: usize) -> InMemoryBackend {
	let backend = InMemoryBackend::new("articles");
	for i in 0..total {
		backend.seed(
			Document::new()
				.with_field("_id", format!("doc-{i:05}"))
				.with_field("position", i),
		);
	}
	backend
}

fn ordered_query() -> Query {
	Query::new("articles").sort([SortField::parse("position")])
}

fn positions(docs: &[Document]) -> Vec<u64> {
	docs.iter()
		.map(|doc| doc.get("position").and_then(|v| v.as_u64()).unwrap())
		.collect()
}

/// Every row of the decision table: (offset, limit, total, max_offset,
/// expected positions, expects a scan).
#[rstest]
#[case::all_direct(None, None, 8, 100, (0, 8), false)]
#[case::all_scanned(None, None, 30, 20, (0, 30), true)]
#[case::limit_direct(None, Some(5), 30, 20, (0, 5), false)]
#[case::limit_scanned(None, Some(25), 30, 20, (0, 25), true)]
#[case::offset_direct(Some(10), None, 15, 100, (10, 15), false)]
#[case::offset_scanned(Some(10), None, 30, 20, (10, 30), true)]
#[case::window_direct(Some(10), Some(5), 30, 20, (10, 15), false)]
#[case::window_scanned(Some(18), Some(5), 30, 20, (18, 23), true)]
#[tokio::test]
async fn test_decision_table(
	#[case] offset: Option<u64>,
	#[case] limit: Option<u64>,
	#[case] total: usize,
	#[case] max_offset: u64,
	#[case] expected_range: (u64, u64),
	#[case] expects_scan: bool,
) {
	let backend = backend_with(total);
	let mut query = ordered_query();
	if let Some(offset) = offset {
		query = query.offset(offset);
	}
	if let Some(limit) = limit {
		query = query.limit(limit);
	}

	let docs = Retriever::new(max_offset)
		.retrieve(&backend, &query)
		.await
		.unwrap();

	let expected: Vec<u64> = (expected_range.0..expected_range.1).collect();
	assert_eq!(positions(&docs), expected);

	if expects_scan {
		assert_eq!(backend.scan_calls(), 1, "expected exactly one scan");
		assert_eq!(backend.fetch_calls(), 0, "scan path must not fetch");
	} else {
		assert_eq!(backend.scan_calls(), 0, "direct path must not scan");
		assert_eq!(backend.fetch_calls(), 1, "expected a single direct call");
	}
}

#[rstest]
#[tokio::test]
async fn test_scan_window_equals_direct_slice() {
	// The same window forced down both paths yields identical sequences.
	let window = ordered_query().offset(120).limit(10);

	let generous = backend_with(150);
	let direct = Retriever::new(10_000)
		.retrieve(&generous, &window)
		.await
		.unwrap();

	let strict = backend_with(150);
	let scanned = Retriever::new(100)
		.retrieve(&strict, &window)
		.await
		.unwrap();

	assert_eq!(generous.scan_calls(), 0);
	assert_eq!(strict.scan_calls(), 1);
	assert_eq!(direct, scanned);
	assert_eq!(positions(&scanned), (120..130).collect::<Vec<_>>());
}

#[rstest]
#[case(Some(200), None)]
#[case(Some(200), Some(10))]
#[tokio::test]
async fn test_window_past_total_yields_empty(
	#[case] offset: Option<u64>,
	#[case] limit: Option<u64>,
) {
	let backend = backend_with(50);
	let mut query = ordered_query();
	if let Some(offset) = offset {
		query = query.offset(offset);
	}
	if let Some(limit) = limit {
		query = query.limit(limit);
	}
	let docs = Retriever::new(10_000)
		.retrieve(&backend, &query)
		.await
		.unwrap();
	assert!(docs.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_count_failure_propagates() {
	let backend = backend_with(10);
	backend.fail_next_count("cluster unreachable");
	let result = Retriever::new(100)
		.retrieve(&backend, &ordered_query())
		.await;
	assert!(matches!(
		result,
		Err(searchframe::SearchFrameError::Retrieval(_))
	));
}

#[rstest]
#[tokio::test]
async fn test_scan_failure_propagates() {
	let backend = backend_with(50);
	backend.fail_next_scan("scroll context lost");
	let result = Retriever::new(20)
		.retrieve(&backend, &ordered_query().offset(30).limit(5))
		.await;
	assert!(matches!(
		result,
		Err(searchframe::SearchFrameError::Retrieval(_))
	));
}

#[rstest]
#[tokio::test]
async fn test_unsorted_scan_does_not_request_order_preservation() {
	// Ordered scans cost more; the flag tracks the query's sort spec.
	let backend = backend_with(30);
	let docs = Retriever::new(20)
		.retrieve(&backend, &Query::new("articles"))
		.await
		.unwrap();
	assert_eq!(docs.len(), 30);
	assert_eq!(backend.scan_calls(), 1);
}

#[rstest]
#[tokio::test]
async fn test_scan_take_materializes_only_window() {
	let backend = backend_with(40);
	let docs = Retriever::new(10)
		.retrieve(&backend, &ordered_query().offset(5).limit(6))
		.await
		.unwrap();
	assert_eq!(positions(&docs), vec![5, 6, 7, 8, 9, 10]);
	assert_eq!(docs[0].get("_id"), Some(&json!("doc-00005")));
}
