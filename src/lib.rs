//! # searchframe
//!
//! REST-style query composition and deep pagination for document search
//! backends.
//!
//! Declarative per-endpoint configuration (which fields are filterable,
//! searchable and orderable, plus the default page size) and a set of
//! request query parameters become a single executed search, returning a
//! correctly windowed page even when the requested offset lies past the
//! backend's native result-window ceiling. Per request the retriever picks
//! between direct sliced retrieval, full retrieval and a scroll-style
//! sequential scan with client-side slicing — with identical result
//! semantics whichever strategy runs.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use searchframe::{ApiSettings, EndpointConfig, QueryParams, SearchView};
//!
//! let view = SearchView::new(
//!     backend,
//!     Arc::new(ApiSettings::new()),
//!     EndpointConfig::new("articles")
//!         .with_filterable_fields(["status"])
//!         .with_search_fields(["title", "body"])
//!         .with_orderable_fields(["created", "title"])
//!         .with_default_ordering(["-created"]),
//! );
//!
//! let page = view.list(&QueryParams::parse("search=rust&page=2")).await?;
//! ```

pub mod backend;
pub mod document;
pub mod error;
pub mod filters;
pub mod pagination;
pub mod params;
pub mod query;
pub mod retriever;
pub mod settings;
pub mod testing;
pub mod views;

pub use backend::{DocumentStore, HitStream, ScanOptions, SearchBackend, SearchHit};
pub use document::{Document, ID_FIELD};
pub use error::{Result, SearchFrameError};
pub use filters::{FieldFilter, FilterBackend, OrderingFilter, SearchFilter, apply_filters};
pub use pagination::{PageEnvelope, PageNumberPagination, Paginated, Pagination};
pub use params::QueryParams;
pub use query::{Query, QueryClause, SortField, SortOrder, Window};
pub use retriever::Retriever;
pub use settings::{ApiSettings, Registry, SettingValue, SettingsHandle};
pub use views::{EndpointConfig, ListResponse, OrderableFields, SearchView, ViewConfig};
