//! Page-number pagination over search queries.
//!
//! The paginator resolves `(page, size)` request parameters into an
//! offset/limit window, records the total hit count from one cardinality
//! round trip, and builds the `{count, results}` response envelope. Actual
//! document retrieval is the retriever's job.

use async_trait::async_trait;
use serde::Serialize;

use crate::backend::SearchBackend;
use crate::document::Document;
use crate::error::Result;
use crate::params::QueryParams;
use crate::query::Query;
use crate::views::ViewConfig;

/// The `{count, results}` wrapper returned for a paginated list.
#[derive(Debug, Clone, Serialize)]
pub struct PageEnvelope {
	pub count: u64,
	pub results: Vec<Document>,
}

/// Outcome of a successful pagination pass: the windowed query plus the
/// request-scoped bookkeeping needed for the envelope.
#[derive(Debug, Clone)]
pub struct Paginated {
	pub query: Query,
	pub total: u64,
	pub page_number: u64,
	pub page_size: u64,
}

impl Paginated {
	/// Wraps retrieved records into the response envelope.
	pub fn response(&self, records: Vec<Document>) -> PageEnvelope {
		PageEnvelope {
			count: self.total,
			results: records,
		}
	}
}

/// Contract of a pagination strategy.
#[async_trait]
pub trait Pagination: Send + Sync {
	/// Computes the window for this request.
	///
	/// Returns `Ok(None)` when no page size is resolvable, in which case the
	/// caller retrieves the unbounded result set instead.
	async fn paginate_query(
		&self,
		query: &Query,
		params: &QueryParams,
		view: &dyn ViewConfig,
		backend: &dyn SearchBackend,
	) -> Result<Option<Paginated>>;
}

/// Strictly positive integer parsing for client input.
///
/// Anything unparseable, zero or negative is rejected; `cutoff` clamps
/// oversized values instead of rejecting them.
fn positive_int(raw: &str, cutoff: Option<u64>) -> Option<u64> {
	let value: u64 = raw.trim().parse().ok()?;
	if value == 0 {
		return None;
	}
	Some(match cutoff {
		Some(max) => value.min(max),
		None => value,
	})
}

/// Page-number based pagination (`?page=3&size=25`).
#[derive(Debug, Clone)]
pub struct PageNumberPagination {
	page_query_param: String,
	page_size_query_param: String,
	default_page_size: Option<u64>,
	max_page_size: Option<u64>,
}

impl PageNumberPagination {
	pub fn new(
		page_query_param: impl Into<String>,
		page_size_query_param: impl Into<String>,
		default_page_size: Option<u64>,
		max_page_size: Option<u64>,
	) -> Self {
		Self {
			page_query_param: page_query_param.into(),
			page_size_query_param: page_size_query_param.into(),
			default_page_size,
			max_page_size,
		}
	}

	/// Resolves the effective page size.
	///
	/// Order: valid request parameter (clamped to the maximum), else the
	/// view's override, else the configured default. A zero/absent effective
	/// size means "no pagination".
	fn page_size(&self, params: &QueryParams, view: &dyn ViewConfig) -> Option<u64> {
		if let Some(raw) = params.get(&self.page_size_query_param) {
			if let Some(size) = positive_int(raw, self.max_page_size) {
				return Some(size);
			}
		}
		view.page_size_override()
			.or(self.default_page_size)
			.filter(|size| *size > 0)
	}

	/// Resolves the page number; invalid input degrades to page 1.
	fn page_number(&self, params: &QueryParams) -> u64 {
		params
			.get(&self.page_query_param)
			.and_then(|raw| positive_int(raw, None))
			.unwrap_or(1)
	}
}

#[async_trait]
impl Pagination for PageNumberPagination {
	async fn paginate_query(
		&self,
		query: &Query,
		params: &QueryParams,
		view: &dyn ViewConfig,
		backend: &dyn SearchBackend,
	) -> Result<Option<Paginated>> {
		let Some(page_size) = self.page_size(params, view) else {
			return Ok(None);
		};

		// One cardinality round trip, independent of the window. The backend
		// may change between this and the fetch; no snapshot is assumed.
		let total = backend.count(query).await?;
		let page_number = self.page_number(params);
		// Saturates on absurd page numbers; a past-the-end offset yields an
		// empty page downstream.
		let offset = (page_number - 1).saturating_mul(page_size);

		Ok(Some(Paginated {
			query: query.clone().offset(offset).limit(page_size),
			total,
			page_number,
			page_size,
		}))
	}
}
