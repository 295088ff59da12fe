//! Result ordering from a comma-delimited request parameter.

use tracing::warn;

use super::FilterBackend;
use crate::params::QueryParams;
use crate::query::{Query, SortField};
use crate::views::{OrderableFields, ViewConfig};

/// Applies a sort specification parsed from the ordering parameter.
///
/// Each comma-delimited token names a field, optionally `-`-prefixed for
/// descending. Tokens are validated against the view's orderable fields (or
/// the backend schema when the view allows all fields); invalid tokens are
/// dropped, not errored. When nothing valid remains, the view's default
/// ordering applies — which may itself be empty, leaving the backend's
/// (typically indeterminate) default order.
#[derive(Debug, Clone)]
pub struct OrderingFilter {
	ordering_param: String,
}

impl OrderingFilter {
	/// Creates a filter reading the given query parameter (usually `ordering`).
	pub fn new(ordering_param: impl Into<String>) -> Self {
		Self {
			ordering_param: ordering_param.into(),
		}
	}

	fn requested_ordering(&self, params: &QueryParams, view: &dyn ViewConfig) -> Vec<SortField> {
		let Some(raw) = params.get(&self.ordering_param) else {
			return Vec::new();
		};

		let valid_fields = match view.orderable_fields() {
			OrderableFields::All => view.schema_field_names(),
			OrderableFields::Fields(fields) => fields.clone(),
		};

		raw.split(',')
			.map(str::trim)
			.filter(|token| !token.is_empty())
			.filter_map(|token| {
				let sort = SortField::parse(token);
				if valid_fields.contains(&sort.field) {
					Some(sort)
				} else {
					warn!(token, "dropping ordering token for unknown field");
					None
				}
			})
			.collect()
	}

	fn default_ordering(&self, view: &dyn ViewConfig) -> Vec<SortField> {
		view.default_ordering()
			.iter()
			.map(|token| SortField::parse(token))
			.collect()
	}
}

impl FilterBackend for OrderingFilter {
	fn filter_query(&self, params: &QueryParams, query: Query, view: &dyn ViewConfig) -> Query {
		let mut ordering = self.requested_ordering(params, view);
		if ordering.is_empty() {
			ordering = self.default_ordering(view);
		}
		if ordering.is_empty() {
			return query;
		}
		query.sort(ordering)
	}
}
