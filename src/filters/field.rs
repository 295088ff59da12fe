//! Equality/terms filtering on declared fields.

use serde_json::Value;

use super::FilterBackend;
use crate::params::QueryParams;
use crate::query::Query;
use crate::views::ViewConfig;

/// Adds an equality constraint for each declared filterable field present in
/// the request parameters.
///
/// A repeated parameter becomes an any-of ("terms") constraint; constraints
/// across distinct fields combine with logical AND. There is no OR across
/// fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldFilter;

impl FieldFilter {
	pub fn new() -> Self {
		Self
	}
}

impl FilterBackend for FieldFilter {
	fn filter_query(&self, params: &QueryParams, mut query: Query, view: &dyn ViewConfig) -> Query {
		for field in view.filterable_fields() {
			let values = params.get_all(field);
			match values.as_slice() {
				[] => {}
				[value] => {
					query = query.term(field.clone(), Value::from(*value));
				}
				many => {
					let values = many.iter().map(|v| Value::from(*v)).collect();
					query = query.terms(field.clone(), values);
				}
			}
		}
		query
	}
}
