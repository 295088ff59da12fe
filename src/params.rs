//! Request query parameters.
//!
//! A thin multi-value map over the decoded query string. Filter backends and
//! the paginator only ever read from this; nothing here touches the backend.

/// Decoded request query parameters, preserving repeated keys.
///
/// # Examples
///
/// ```
/// use searchframe::QueryParams;
///
/// let params = QueryParams::parse("tag=rust&tag=web&page=2");
/// assert_eq!(params.get("page"), Some("2"));
/// assert_eq!(params.get_all("tag"), ["rust", "web"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
	pairs: Vec<(String, String)>,
}

impl QueryParams {
	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a raw `application/x-www-form-urlencoded` query string.
	///
	/// A malformed query string is client input and never an error: bad
	/// percent-escapes pass through literally, and anything the decoder
	/// rejects outright degrades to an empty parameter set.
	pub fn parse(query: &str) -> Self {
		let pairs: Vec<(String, String)> =
			serde_urlencoded::from_str(query).unwrap_or_default();
		Self { pairs }
	}

	/// Inserts a key/value pair, keeping any existing values for the key.
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.pairs.push((key.into(), value.into()));
	}

	/// Returns the first value for `key`, if present.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	/// Returns every value for `key`, in request order.
	pub fn get_all(&self, key: &str) -> Vec<&str> {
		self.pairs
			.iter()
			.filter(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
			.collect()
	}

	/// Returns true if `key` appears at least once.
	pub fn contains(&self, key: &str) -> bool {
		self.pairs.iter().any(|(k, _)| k == key)
	}

	/// Iterates over the raw key/value pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			pairs: iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_multi_value() {
		let params = QueryParams::parse("status=open&status=closed&q=rust%20web");
		assert_eq!(params.get_all("status"), ["open", "closed"]);
		assert_eq!(params.get("q"), Some("rust web"));
	}

	#[rstest]
	fn test_parse_empty_and_garbage() {
		assert!(QueryParams::parse("").iter().next().is_none());
		// Bad percent-escapes are kept literally, never an error.
		let params = QueryParams::parse("a=%zz");
		assert_eq!(params.get("a"), Some("%zz"));
	}

	#[rstest]
	fn test_contains_and_first_value() {
		let params: QueryParams = [("page", "3"), ("page", "4")].into_iter().collect();
		assert!(params.contains("page"));
		assert_eq!(params.get("page"), Some("3"));
	}
}
