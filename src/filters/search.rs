//! Free-text search filtering.

use super::FilterBackend;
use crate::params::QueryParams;
use crate::query::Query;
use crate::views::ViewConfig;

/// Adds a multi-field relevance match for the search term parameter.
///
/// Both a non-empty term and a declared `search_fields` sequence are
/// required; otherwise the query passes through unchanged. The declared
/// fields must be text-typed in the backend schema.
#[derive(Debug, Clone)]
pub struct SearchFilter {
	search_param: String,
}

impl SearchFilter {
	/// Creates a filter reading the given query parameter (usually `search`).
	pub fn new(search_param: impl Into<String>) -> Self {
		Self {
			search_param: search_param.into(),
		}
	}

	fn search_term<'a>(&self, params: &'a QueryParams) -> Option<&'a str> {
		let term = params.get(&self.search_param)?.trim();
		(!term.is_empty()).then_some(term)
	}
}

impl FilterBackend for SearchFilter {
	fn filter_query(&self, params: &QueryParams, query: Query, view: &dyn ViewConfig) -> Query {
		let search_fields = view.search_fields();
		let Some(term) = self.search_term(params) else {
			return query;
		};
		if search_fields.is_empty() {
			return query;
		}

		query.multi_match(term, search_fields.to_vec())
	}
}
