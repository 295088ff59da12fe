//! API settings resolution.
//!
//! A small set of named options resolved from two tiers: explicit overrides
//! first, built-in defaults otherwise. Options naming implementations
//! (pagination class, filter-backend chain) are resolved through a registry
//! of named constructors into live instances, once per snapshot. `reload`
//! swaps in a fresh immutable snapshot under a single reference update, so
//! concurrent readers see either the old snapshot or the new one — never a
//! half-cleared cache mixing the two.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, SearchFrameError};
use crate::filters::{FieldFilter, FilterBackend, OrderingFilter, SearchFilter};
use crate::pagination::{PageNumberPagination, Pagination};

/// Registry name of the pagination implementation.
pub const DEFAULT_PAGINATION_CLASS: &str = "DEFAULT_PAGINATION_CLASS";
/// Registry names of the filter-backend chain, applied in list order.
pub const DEFAULT_FILTER_BACKENDS: &str = "DEFAULT_FILTER_BACKENDS";
/// Default page size; `None` or zero disables pagination.
pub const PAGE_SIZE: &str = "PAGE_SIZE";
/// Ceiling applied to the client-supplied size parameter.
pub const MAX_PAGE_SIZE: &str = "MAX_PAGE_SIZE";
/// Query parameter carrying the page number.
pub const PAGE_QUERY_PARAM: &str = "PAGE_QUERY_PARAM";
/// Query parameter carrying the page size.
pub const PAGE_SIZE_QUERY_PARAM: &str = "PAGE_SIZE_QUERY_PARAM";
/// Query parameter carrying the free-text search term.
pub const SEARCH_PARAM: &str = "SEARCH_PARAM";
/// Query parameter carrying the comma-delimited ordering.
pub const ORDERING_PARAM: &str = "ORDERING_PARAM";
/// Backend's native ceiling on `offset + limit` (`index.max_result_window`).
pub const MAX_OFFSET: &str = "MAX_OFFSET";
/// Hits fetched per scroll round trip during scans.
pub const SCAN_PAGE_SIZE: &str = "SCAN_PAGE_SIZE";
/// Scroll context keep-alive during scans.
pub const SCROLL_TTL: &str = "SCROLL_TTL";

/// A settings option value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
	UInt(u64),
	OptUInt(Option<u64>),
	Str(String),
	StrList(Vec<String>),
}

impl SettingValue {
	fn kind(&self) -> &'static str {
		match self {
			Self::UInt(_) => "unsigned integer",
			Self::OptUInt(_) => "optional unsigned integer",
			Self::Str(_) => "string",
			Self::StrList(_) => "string list",
		}
	}
}

fn defaults() -> HashMap<&'static str, SettingValue> {
	HashMap::from([
		(
			DEFAULT_PAGINATION_CLASS,
			SettingValue::Str("pagination.page-number".to_string()),
		),
		(
			DEFAULT_FILTER_BACKENDS,
			SettingValue::StrList(vec![
				"filters.field".to_string(),
				"filters.search".to_string(),
				"filters.ordering".to_string(),
			]),
		),
		(PAGE_SIZE, SettingValue::OptUInt(Some(10))),
		(MAX_PAGE_SIZE, SettingValue::OptUInt(None)),
		(PAGE_QUERY_PARAM, SettingValue::Str("page".to_string())),
		(PAGE_SIZE_QUERY_PARAM, SettingValue::Str("size".to_string())),
		(SEARCH_PARAM, SettingValue::Str("search".to_string())),
		(ORDERING_PARAM, SettingValue::Str("ordering".to_string())),
		(MAX_OFFSET, SettingValue::UInt(10_000)),
		(SCAN_PAGE_SIZE, SettingValue::UInt(500)),
		(SCROLL_TTL, SettingValue::Str("1m".to_string())),
	])
}

/// Constructor for a registered filter backend.
pub type FilterConstructor = Arc<dyn Fn(&SettingsHandle) -> Arc<dyn FilterBackend> + Send + Sync>;
/// Constructor for a registered pagination implementation.
pub type PaginationConstructor = Arc<dyn Fn(&SettingsHandle) -> Arc<dyn Pagination> + Send + Sync>;

/// Named-constructor registry standing in for import-string resolution.
///
/// Identifiers are stable names like `"filters.ordering"`; user code may
/// register additional constructors before building the settings object.
#[derive(Clone)]
pub struct Registry {
	filters: HashMap<String, FilterConstructor>,
	paginations: HashMap<String, PaginationConstructor>,
}

impl Registry {
	/// An empty registry with no registered constructors.
	pub fn empty() -> Self {
		Self {
			filters: HashMap::new(),
			paginations: HashMap::new(),
		}
	}

	/// The built-in filter backends and pagination under their default names.
	pub fn with_builtins() -> Self {
		let mut registry = Self::empty();
		registry.register_filter("filters.field", |_| Arc::new(FieldFilter::new()));
		registry.register_filter("filters.search", |settings| {
			Arc::new(SearchFilter::new(settings.search_param()))
		});
		registry.register_filter("filters.ordering", |settings| {
			Arc::new(OrderingFilter::new(settings.ordering_param()))
		});
		registry.register_pagination("pagination.page-number", |settings| {
			Arc::new(PageNumberPagination::new(
				settings.page_query_param(),
				settings.page_size_query_param(),
				settings.page_size(),
				settings.max_page_size(),
			))
		});
		registry
	}

	pub fn register_filter<F>(&mut self, name: impl Into<String>, constructor: F)
	where
		F: Fn(&SettingsHandle) -> Arc<dyn FilterBackend> + Send + Sync + 'static,
	{
		self.filters.insert(name.into(), Arc::new(constructor));
	}

	pub fn register_pagination<F>(&mut self, name: impl Into<String>, constructor: F)
	where
		F: Fn(&SettingsHandle) -> Arc<dyn Pagination> + Send + Sync + 'static,
	{
		self.paginations.insert(name.into(), Arc::new(constructor));
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::with_builtins()
	}
}

struct Shared {
	registry: Registry,
	defaults: HashMap<&'static str, SettingValue>,
}

/// One immutable resolution generation.
///
/// Scalar options are resolved lazily into `scalars`; importables are
/// resolved once into the cells. A reload replaces the whole snapshot.
struct Snapshot {
	overrides: HashMap<String, SettingValue>,
	scalars: RwLock<HashMap<String, SettingValue>>,
	filter_backends: OnceCell<Arc<Vec<Arc<dyn FilterBackend>>>>,
	pagination: OnceCell<Arc<dyn Pagination>>,
}

impl Snapshot {
	fn new(overrides: HashMap<String, SettingValue>) -> Self {
		Self {
			overrides,
			scalars: RwLock::new(HashMap::new()),
			filter_backends: OnceCell::new(),
			pagination: OnceCell::new(),
		}
	}
}

/// Process-wide, read-mostly settings object.
pub struct ApiSettings {
	shared: Arc<Shared>,
	snapshot: RwLock<Arc<Snapshot>>,
}

impl ApiSettings {
	/// Settings with built-in defaults and the built-in registry.
	pub fn new() -> Self {
		Self::with_registry(Registry::with_builtins())
	}

	/// Settings with built-in defaults and a caller-supplied registry.
	pub fn with_registry(registry: Registry) -> Self {
		Self {
			shared: Arc::new(Shared {
				registry,
				defaults: defaults(),
			}),
			snapshot: RwLock::new(Arc::new(Snapshot::new(HashMap::new()))),
		}
	}

	/// Settings with explicit overrides over the built-in defaults.
	///
	/// Overriding an unrecognized option, or one with a value of the wrong
	/// shape, fails with [`SearchFrameError::Configuration`] up front.
	pub fn with_overrides<I, K>(registry: Registry, overrides: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, SettingValue)>,
		K: Into<String>,
	{
		let settings = Self::with_registry(registry);
		settings.set_overrides(overrides)?;
		Ok(settings)
	}

	/// Replaces the override namespace and swaps in a fresh snapshot.
	pub fn set_overrides<I, K>(&self, overrides: I) -> Result<()>
	where
		I: IntoIterator<Item = (K, SettingValue)>,
		K: Into<String>,
	{
		let mut checked = HashMap::new();
		for (name, value) in overrides {
			let name = name.into();
			let default = self
				.shared
				.defaults
				.get(name.as_str())
				.ok_or_else(|| SearchFrameError::Configuration(name.clone()))?;
			if std::mem::discriminant(default) != std::mem::discriminant(&value) {
				return Err(SearchFrameError::Configuration(format!(
					"{name} expects {} value",
					default.kind()
				)));
			}
			checked.insert(name, value);
		}
		*self.snapshot.write() = Arc::new(Snapshot::new(checked));
		debug!("api settings overrides replaced");
		Ok(())
	}

	/// Clears every cached resolution, forcing lazy re-resolution.
	///
	/// Safe to call concurrently with reads: the snapshot is swapped under a
	/// single reference update and readers keep whichever generation they
	/// already hold.
	pub fn reload(&self) {
		let mut snapshot = self.snapshot.write();
		let overrides = snapshot.overrides.clone();
		*snapshot = Arc::new(Snapshot::new(overrides));
		debug!("api settings reloaded");
	}

	/// Returns a coherent handle on the current snapshot.
	///
	/// All options read through one handle come from the same generation;
	/// grab one handle per request when related options must pair up.
	pub fn current(&self) -> SettingsHandle {
		SettingsHandle {
			shared: Arc::clone(&self.shared),
			snapshot: Arc::clone(&self.snapshot.read()),
		}
	}

	/// Resolves one option by name.
	pub fn get(&self, name: &str) -> Result<SettingValue> {
		self.current().get(name)
	}
}

impl Default for ApiSettings {
	fn default() -> Self {
		Self::new()
	}
}

/// A read handle pinned to one settings generation.
#[derive(Clone)]
pub struct SettingsHandle {
	shared: Arc<Shared>,
	snapshot: Arc<Snapshot>,
}

impl SettingsHandle {
	/// Resolves one option by name.
	///
	/// Unrecognized names fail with [`SearchFrameError::Configuration`].
	pub fn get(&self, name: &str) -> Result<SettingValue> {
		if !self.shared.defaults.contains_key(name) {
			return Err(SearchFrameError::Configuration(name.to_string()));
		}
		Ok(self.resolve(name))
	}

	fn resolve(&self, name: &str) -> SettingValue {
		if let Some(cached) = self.snapshot.scalars.read().get(name) {
			return cached.clone();
		}
		let value = self
			.snapshot
			.overrides
			.get(name)
			.or_else(|| self.shared.defaults.get(name))
			.cloned()
			.unwrap_or(SettingValue::OptUInt(None));
		self.snapshot
			.scalars
			.write()
			.insert(name.to_string(), value.clone());
		value
	}

	pub fn page_size(&self) -> Option<u64> {
		match self.resolve(PAGE_SIZE) {
			SettingValue::OptUInt(value) => value,
			SettingValue::UInt(value) => Some(value),
			_ => None,
		}
	}

	pub fn max_page_size(&self) -> Option<u64> {
		match self.resolve(MAX_PAGE_SIZE) {
			SettingValue::OptUInt(value) => value,
			SettingValue::UInt(value) => Some(value),
			_ => None,
		}
	}

	pub fn page_query_param(&self) -> String {
		self.string(PAGE_QUERY_PARAM)
	}

	pub fn page_size_query_param(&self) -> String {
		self.string(PAGE_SIZE_QUERY_PARAM)
	}

	pub fn search_param(&self) -> String {
		self.string(SEARCH_PARAM)
	}

	pub fn ordering_param(&self) -> String {
		self.string(ORDERING_PARAM)
	}

	pub fn scroll_ttl(&self) -> String {
		self.string(SCROLL_TTL)
	}

	pub fn max_offset(&self) -> u64 {
		self.uint(MAX_OFFSET)
	}

	pub fn scan_page_size(&self) -> u64 {
		self.uint(SCAN_PAGE_SIZE)
	}

	fn string(&self, name: &str) -> String {
		match self.resolve(name) {
			SettingValue::Str(value) => value,
			other => other.kind().to_string(),
		}
	}

	fn uint(&self, name: &str) -> u64 {
		match self.resolve(name) {
			SettingValue::UInt(value) => value,
			SettingValue::OptUInt(value) => value.unwrap_or(0),
			_ => 0,
		}
	}

	/// The configured filter-backend chain, resolved and instantiated once
	/// per snapshot.
	pub fn filter_backends(&self) -> Result<Arc<Vec<Arc<dyn FilterBackend>>>> {
		self.snapshot
			.filter_backends
			.get_or_try_init(|| {
				let names = match self.resolve(DEFAULT_FILTER_BACKENDS) {
					SettingValue::StrList(names) => names,
					_ => Vec::new(),
				};
				let mut backends: Vec<Arc<dyn FilterBackend>> = Vec::with_capacity(names.len());
				for name in &names {
					let constructor = self.shared.registry.filters.get(name).ok_or_else(|| {
						SearchFrameError::ImportResolution {
							identifier: name.clone(),
							setting: DEFAULT_FILTER_BACKENDS.to_string(),
						}
					})?;
					backends.push(constructor(self));
				}
				Ok(Arc::new(backends))
			})
			.map(Arc::clone)
	}

	/// The configured pagination implementation, resolved and instantiated
	/// once per snapshot.
	pub fn pagination(&self) -> Result<Arc<dyn Pagination>> {
		self.snapshot
			.pagination
			.get_or_try_init(|| {
				let name = self.string(DEFAULT_PAGINATION_CLASS);
				let constructor = self.shared.registry.paginations.get(&name).ok_or_else(|| {
					SearchFrameError::ImportResolution {
						identifier: name.clone(),
						setting: DEFAULT_PAGINATION_CLASS.to_string(),
					}
				})?;
				Ok(constructor(self))
			})
			.map(Arc::clone)
	}
}
