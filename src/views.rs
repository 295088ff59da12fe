//! Generic view glue.
//!
//! Wires per-endpoint declarative configuration to the filter chain, the
//! paginator and the retriever, and exposes the list / retrieve / create /
//! update / destroy operations a host framework dispatches into. Routing,
//! authentication and response-envelope formatting stay outside this crate.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::{DocumentStore, SearchBackend};
use crate::document::{Document, ID_FIELD};
use crate::error::{Result, SearchFrameError};
use crate::filters::apply_filters;
use crate::pagination::PageEnvelope;
use crate::params::QueryParams;
use crate::query::Query;
use crate::retriever::Retriever;
use crate::settings::{ApiSettings, SettingsHandle};

/// Which fields an endpoint accepts in its ordering parameter.
#[derive(Debug, Clone)]
pub enum OrderableFields {
	/// Every indexed field, introspected from the backend schema.
	All,
	/// An explicit allow-set.
	Fields(BTreeSet<String>),
}

/// Per-endpoint declared capability, consumed by the filter backends and the
/// paginator.
pub trait ViewConfig: Send + Sync {
	/// Index or collection the endpoint is bound to.
	fn index(&self) -> &str;

	/// Fields accepted as equality/terms filters.
	fn filterable_fields(&self) -> &BTreeSet<String>;

	/// Fields covered by the free-text search clause, in declaration order.
	/// Must be text-typed in the backend schema.
	fn search_fields(&self) -> &[String];

	/// Fields accepted in the ordering parameter.
	fn orderable_fields(&self) -> &OrderableFields;

	/// Ordering applied when the request supplies none (each token
	/// optionally `-`-prefixed). May be empty.
	fn default_ordering(&self) -> &[String];

	/// Field used for single-object lookup.
	fn lookup_field(&self) -> &str;

	/// Per-endpoint page size; `Some(0)` forces the unpaginated path.
	fn page_size_override(&self) -> Option<u64>;

	/// Introspection hook backing [`OrderableFields::All`].
	fn schema_field_names(&self) -> BTreeSet<String>;
}

/// Plain-data [`ViewConfig`] built up with chained setters.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
	index: String,
	filterable_fields: BTreeSet<String>,
	search_fields: Vec<String>,
	orderable_fields: OrderableFields,
	default_ordering: Vec<String>,
	lookup_field: String,
	page_size_override: Option<u64>,
	schema_fields: BTreeSet<String>,
}

impl EndpointConfig {
	pub fn new(index: impl Into<String>) -> Self {
		Self {
			index: index.into(),
			filterable_fields: BTreeSet::new(),
			search_fields: Vec::new(),
			orderable_fields: OrderableFields::Fields(BTreeSet::new()),
			default_ordering: Vec::new(),
			lookup_field: ID_FIELD.to_string(),
			page_size_override: None,
			schema_fields: BTreeSet::new(),
		}
	}

	pub fn with_filterable_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.filterable_fields = fields.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_search_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.search_fields = fields.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_orderable_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.orderable_fields = OrderableFields::Fields(fields.into_iter().map(Into::into).collect());
		self
	}

	/// Allows ordering on every indexed field (backend schema introspection).
	pub fn orderable_all(mut self) -> Self {
		self.orderable_fields = OrderableFields::All;
		self
	}

	pub fn with_default_ordering<I, S>(mut self, ordering: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.default_ordering = ordering.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_lookup_field(mut self, field: impl Into<String>) -> Self {
		self.lookup_field = field.into();
		self
	}

	/// Overrides the configured default page size; `0` disables pagination
	/// for this endpoint.
	pub fn with_page_size(mut self, page_size: u64) -> Self {
		self.page_size_override = Some(page_size);
		self
	}

	/// Static schema field set, for configs used without a live backend.
	pub fn with_schema_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.schema_fields = fields.into_iter().map(Into::into).collect();
		self
	}
}

impl ViewConfig for EndpointConfig {
	fn index(&self) -> &str {
		&self.index
	}

	fn filterable_fields(&self) -> &BTreeSet<String> {
		&self.filterable_fields
	}

	fn search_fields(&self) -> &[String] {
		&self.search_fields
	}

	fn orderable_fields(&self) -> &OrderableFields {
		&self.orderable_fields
	}

	fn default_ordering(&self) -> &[String] {
		&self.default_ordering
	}

	fn lookup_field(&self) -> &str {
		&self.lookup_field
	}

	fn page_size_override(&self) -> Option<u64> {
		self.page_size_override
	}

	fn schema_field_names(&self) -> BTreeSet<String> {
		self.schema_fields.clone()
	}
}

/// A list response: the paginated envelope, or the full result set when no
/// page size was resolvable.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListResponse {
	Paginated(PageEnvelope),
	Unpaginated(Vec<Document>),
}

impl ListResponse {
	/// The records regardless of envelope shape.
	pub fn records(&self) -> &[Document] {
		match self {
			Self::Paginated(envelope) => &envelope.results,
			Self::Unpaginated(records) => records,
		}
	}
}

/// A configured endpoint bound to a backend: filter chain → paginator →
/// retriever, composed by reference instead of inheritance.
pub struct SearchView<B> {
	backend: Arc<B>,
	settings: Arc<ApiSettings>,
	config: EndpointConfig,
	schema_cache: RwLock<Option<Arc<BTreeSet<String>>>>,
}

impl<B: SearchBackend> SearchView<B> {
	pub fn new(backend: Arc<B>, settings: Arc<ApiSettings>, config: EndpointConfig) -> Self {
		Self {
			backend,
			settings,
			config,
			schema_cache: RwLock::new(None),
		}
	}

	pub fn config(&self) -> &EndpointConfig {
		&self.config
	}

	fn base_query(&self) -> Query {
		Query::new(self.config.index())
	}

	fn retriever(handle: &SettingsHandle) -> Retriever {
		Retriever::new(handle.max_offset())
			.scan_page_size(handle.scan_page_size())
			.scroll_ttl(handle.scroll_ttl())
	}

	/// Fetches and caches the backend schema when the endpoint orders on
	/// "all fields". Cached until [`SearchView::invalidate_schema_cache`].
	async fn ensure_schema(&self) -> Result<()> {
		if !matches!(self.config.orderable_fields(), OrderableFields::All) {
			return Ok(());
		}
		if self.schema_cache.read().is_some() {
			return Ok(());
		}
		let fields = self.backend.schema_fields(self.config.index()).await?;
		*self.schema_cache.write() = Some(Arc::new(fields));
		Ok(())
	}

	/// Drops the cached schema; the next request re-introspects.
	pub fn invalidate_schema_cache(&self) {
		*self.schema_cache.write() = None;
	}

	/// Applies the configured filter-backend chain to a fresh query.
	pub fn filter_query(&self, handle: &SettingsHandle, params: &QueryParams) -> Result<Query> {
		let backends = handle.filter_backends()?;
		Ok(apply_filters(&backends, params, self.base_query(), self))
	}

	/// The list operation: filter, paginate, retrieve, wrap.
	pub async fn list(&self, params: &QueryParams) -> Result<ListResponse> {
		// One settings generation per request; related options stay paired.
		let handle = self.settings.current();
		self.ensure_schema().await?;

		let query = self.filter_query(&handle, params)?;
		let pagination = handle.pagination()?;
		let retriever = Self::retriever(&handle);

		match pagination
			.paginate_query(&query, params, self, self.backend.as_ref())
			.await?
		{
			Some(paginated) => {
				let records = retriever.retrieve(self.backend.as_ref(), &paginated.query).await?;
				Ok(ListResponse::Paginated(paginated.response(records)))
			}
			None => {
				let records = retriever.retrieve(self.backend.as_ref(), &query).await?;
				Ok(ListResponse::Unpaginated(records))
			}
		}
	}

	/// Single-object lookup through the filter chain.
	pub async fn get_object(&self, params: &QueryParams, lookup: &str) -> Result<Document> {
		let handle = self.settings.current();
		self.ensure_schema().await?;

		let query = self
			.filter_query(&handle, params)?
			.term(self.config.lookup_field(), lookup)
			.limit(1);
		let mut records = self.backend.fetch(&query).await?;
		if records.is_empty() {
			return Err(SearchFrameError::NotFound);
		}
		Ok(records.remove(0))
	}
}

impl<B: SearchBackend + DocumentStore> SearchView<B> {
	/// Stores a new document.
	pub async fn create(&self, fields: Map<String, Value>) -> Result<Document> {
		self.backend
			.index(self.config.index(), Document::from_map(fields))
			.await
	}

	/// Applies the full field set over an existing document.
	pub async fn update(
		&self,
		params: &QueryParams,
		lookup: &str,
		fields: Map<String, Value>,
	) -> Result<Document> {
		let existing = self.get_object(params, lookup).await?;
		let id = existing.id().ok_or(SearchFrameError::NotFound)?.to_string();
		self.backend.update(self.config.index(), &id, fields).await
	}

	/// Applies a subset of fields over an existing document.
	pub async fn partial_update(
		&self,
		params: &QueryParams,
		lookup: &str,
		fields: Map<String, Value>,
	) -> Result<Document> {
		self.update(params, lookup, fields).await
	}

	/// Removes an existing document.
	pub async fn destroy(&self, params: &QueryParams, lookup: &str) -> Result<()> {
		let existing = self.get_object(params, lookup).await?;
		let id = existing.id().ok_or(SearchFrameError::NotFound)?.to_string();
		self.backend.delete(self.config.index(), &id).await
	}
}

impl<B: SearchBackend> ViewConfig for SearchView<B> {
	fn index(&self) -> &str {
		self.config.index()
	}

	fn filterable_fields(&self) -> &BTreeSet<String> {
		self.config.filterable_fields()
	}

	fn search_fields(&self) -> &[String] {
		self.config.search_fields()
	}

	fn orderable_fields(&self) -> &OrderableFields {
		self.config.orderable_fields()
	}

	fn default_ordering(&self) -> &[String] {
		self.config.default_ordering()
	}

	fn lookup_field(&self) -> &str {
		self.config.lookup_field()
	}

	fn page_size_override(&self) -> Option<u64> {
		self.config.page_size_override()
	}

	fn schema_field_names(&self) -> BTreeSet<String> {
		match self.schema_cache.read().as_ref() {
			Some(fields) => (**fields).clone(),
			None => self.config.schema_field_names(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::InMemoryBackend;
	use rstest::rstest;
	use serde_json::json;

	fn seeded_view(config: EndpointConfig) -> SearchView<InMemoryBackend> {
		let backend = InMemoryBackend::new("articles");
		for (id, title) in [("a1", "rust in practice"), ("a2", "search engines"), ("a3", "deep pagination")] {
			backend.seed(
				Document::new()
					.with_field("_id", id)
					.with_field("title", title),
			);
		}
		SearchView::new(Arc::new(backend), Arc::new(ApiSettings::new()), config)
	}

	#[rstest]
	#[tokio::test]
	async fn test_get_object_by_lookup_field() {
		let view = seeded_view(EndpointConfig::new("articles"));
		let doc = view.get_object(&QueryParams::new(), "a2").await.unwrap();
		assert_eq!(doc.get("title"), Some(&json!("search engines")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_get_object_zero_matches_is_not_found() {
		let view = seeded_view(EndpointConfig::new("articles"));
		assert!(matches!(
			view.get_object(&QueryParams::new(), "missing").await,
			Err(SearchFrameError::NotFound)
		));
	}

	#[rstest]
	fn test_view_exposes_config_through_the_capability_trait() {
		let view = seeded_view(
			EndpointConfig::new("articles")
				.with_filterable_fields(["status"])
				.with_search_fields(["title"])
				.with_default_ordering(["-created"])
				.with_lookup_field("slug"),
		);
		let config: &dyn ViewConfig = &view;
		assert_eq!(config.index(), "articles");
		assert!(config.filterable_fields().contains("status"));
		assert_eq!(config.search_fields(), ["title"]);
		assert_eq!(config.default_ordering(), ["-created"]);
		assert_eq!(config.lookup_field(), "slug");
	}

	#[rstest]
	#[tokio::test]
	async fn test_zero_page_size_override_disables_pagination() {
		let view = seeded_view(EndpointConfig::new("articles").with_page_size(0));
		let response = view.list(&QueryParams::new()).await.unwrap();
		assert!(matches!(response, ListResponse::Unpaginated(_)));
		assert_eq!(response.records().len(), 3);
	}

	#[rstest]
	#[tokio::test]
	async fn test_crud_round_trip() {
		let view = seeded_view(EndpointConfig::new("articles"));
		let created = view
			.create(json!({"title": "new"}).as_object().unwrap().clone())
			.await
			.unwrap();
		let id = created.id().unwrap().to_string();

		let updated = view
			.partial_update(
				&QueryParams::new(),
				&id,
				json!({"title": "renamed"}).as_object().unwrap().clone(),
			)
			.await
			.unwrap();
		assert_eq!(updated.get("title"), Some(&json!("renamed")));

		view.destroy(&QueryParams::new(), &id).await.unwrap();
		assert!(matches!(
			view.get_object(&QueryParams::new(), &id).await,
			Err(SearchFrameError::NotFound)
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_schema_cache_backs_orderable_all() {
		let view = seeded_view(EndpointConfig::new("articles").orderable_all());
		let params = QueryParams::parse("ordering=title");
		let response = view.list(&params).await.unwrap();
		let titles: Vec<_> = response
			.records()
			.iter()
			.map(|d| d.get("title").cloned().unwrap())
			.collect();
		assert_eq!(
			titles,
			vec![
				json!("deep pagination"),
				json!("rust in practice"),
				json!("search engines")
			]
		);
	}
}
