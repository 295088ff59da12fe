//! Immutable, chainable search queries.
//!
//! A [`Query`] describes one search request against an index: a set of
//! AND-combined term constraints, an optional multi-field match clause, an
//! ordered sort specification and an optional offset/limit window. Every
//! transformation returns a new value; nothing is mutated in place, so a base
//! query can safely be shared across requests.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A single boolean-combinable constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
	/// Exact match on one field.
	Term { field: String, value: Value },
	/// Any-of match on one field.
	Terms { field: String, values: Vec<Value> },
	/// Free-text relevance match across several fields.
	MultiMatch { query: String, fields: Vec<String> },
}

/// Sort direction for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	Asc,
	Desc,
}

/// One entry of the sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
	pub field: String,
	pub order: SortOrder,
}

impl SortField {
	/// Parses a `-`-prefixed ordering token (`"-created"` sorts descending).
	pub fn parse(token: &str) -> Self {
		match token.strip_prefix('-') {
			Some(field) => Self {
				field: field.to_string(),
				order: SortOrder::Desc,
			},
			None => Self {
				field: token.to_string(),
				order: SortOrder::Asc,
			},
		}
	}
}

/// The requested `(offset, limit)` slice of the ordered result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
	pub offset: Option<u64>,
	pub limit: Option<u64>,
}

/// An immutable description of a search request.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
	index: String,
	clauses: Vec<QueryClause>,
	sort: Vec<SortField>,
	window: Window,
}

impl Query {
	/// Creates a fresh, unconstrained query against `index`.
	pub fn new(index: impl Into<String>) -> Self {
		Self {
			index: index.into(),
			clauses: Vec::new(),
			sort: Vec::new(),
			window: Window::default(),
		}
	}

	/// Index or collection this query targets.
	pub fn index(&self) -> &str {
		&self.index
	}

	/// Adds an exact-match constraint on `field`.
	pub fn term(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.clauses.push(QueryClause::Term {
			field: field.into(),
			value: value.into(),
		});
		self
	}

	/// Adds an any-of constraint on `field`.
	pub fn terms(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
		self.clauses.push(QueryClause::Terms {
			field: field.into(),
			values,
		});
		self
	}

	/// Adds a free-text relevance match across `fields`.
	pub fn multi_match(mut self, query: impl Into<String>, fields: Vec<String>) -> Self {
		self.clauses.push(QueryClause::MultiMatch {
			query: query.into(),
			fields,
		});
		self
	}

	/// Appends sort entries. Later calls extend the specification; earlier
	/// entries keep precedence and nothing is silently dropped.
	pub fn sort(mut self, fields: impl IntoIterator<Item = SortField>) -> Self {
		self.sort.extend(fields);
		self
	}

	/// Sets the window offset.
	pub fn offset(mut self, offset: u64) -> Self {
		self.window.offset = Some(offset);
		self
	}

	/// Sets the window limit.
	pub fn limit(mut self, limit: u64) -> Self {
		self.window.limit = Some(limit);
		self
	}

	/// Replaces the whole window annotation.
	pub fn with_window(mut self, window: Window) -> Self {
		self.window = window;
		self
	}

	/// Drops any window annotation. Scan-style retrieval requires an
	/// unwindowed request body.
	pub fn without_window(mut self) -> Self {
		self.window = Window::default();
		self
	}

	pub fn clauses(&self) -> &[QueryClause] {
		&self.clauses
	}

	pub fn sort_spec(&self) -> &[SortField] {
		&self.sort
	}

	pub fn window(&self) -> Window {
		self.window
	}

	/// Whether an explicit sort order was requested. When no sort is present
	/// the backend's default order applies, which is typically indeterminate.
	pub fn is_sorted(&self) -> bool {
		!self.sort.is_empty()
	}

	/// Renders the query as an Elasticsearch-style JSON request body.
	pub fn to_body(&self) -> Value {
		let mut body = serde_json::Map::new();

		if !self.clauses.is_empty() {
			let filters: Vec<Value> = self.clauses.iter().map(clause_to_json).collect();
			body.insert("query".to_string(), json!({"bool": {"filter": filters}}));
		}
		if !self.sort.is_empty() {
			let sort: Vec<Value> = self
				.sort
				.iter()
				.map(|s| single_key(&s.field, json!({"order": s.order})))
				.collect();
			body.insert("sort".to_string(), Value::Array(sort));
		}
		if let Some(offset) = self.window.offset {
			body.insert("from".to_string(), json!(offset));
		}
		if let Some(limit) = self.window.limit {
			body.insert("size".to_string(), json!(limit));
		}

		Value::Object(body)
	}
}

fn clause_to_json(clause: &QueryClause) -> Value {
	match clause {
		QueryClause::Term { field, value } => {
			json!({"term": single_key(field, value.clone())})
		}
		QueryClause::Terms { field, values } => {
			json!({"terms": single_key(field, Value::Array(values.clone()))})
		}
		QueryClause::MultiMatch { query, fields } => {
			json!({"multi_match": {"query": query, "fields": fields}})
		}
	}
}

fn single_key(key: &str, value: Value) -> Value {
	let mut map = serde_json::Map::new();
	map.insert(key.to_string(), value);
	Value::Object(map)
}
