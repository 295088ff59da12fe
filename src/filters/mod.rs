//! Composable, order-significant query transformers.
//!
//! Each backend takes the current [`Query`] and returns a new one with an
//! added constraint or sort order; the chain is applied in configuration
//! order. Backends are pure functions of their inputs and tolerate absent or
//! empty configuration by returning the query unchanged.

mod field;
mod ordering;
mod search;

pub use field::FieldFilter;
pub use ordering::OrderingFilter;
pub use search::SearchFilter;

use crate::params::QueryParams;
use crate::query::Query;
use crate::views::ViewConfig;

/// Contract shared by all filter backends.
pub trait FilterBackend: Send + Sync {
	/// Returns a new query with this backend's constraint applied.
	fn filter_query(&self, params: &QueryParams, query: Query, view: &dyn ViewConfig) -> Query;
}

/// Applies `backends` to `query` in order.
pub fn apply_filters(
	backends: &[std::sync::Arc<dyn FilterBackend>],
	params: &QueryParams,
	mut query: Query,
	view: &dyn ViewConfig,
) -> Query {
	for backend in backends {
		query = backend.filter_query(params, query, view);
	}
	query
}
