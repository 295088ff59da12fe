//! Error types for the searchframe crate.

use thiserror::Error;

/// Errors that can occur while composing or executing a search.
#[derive(Debug, Error)]
pub enum SearchFrameError {
	/// An unrecognized settings option was requested or overridden.
	#[error("Invalid API setting: '{0}'")]
	Configuration(String),

	/// A string-identified implementation could not be resolved from the registry.
	#[error("Could not resolve '{identifier}' for API setting '{setting}'")]
	ImportResolution {
		/// Registry identifier that failed to resolve.
		identifier: String,
		/// Settings option that referenced the identifier.
		setting: String,
	},

	/// Malformed client input that cannot be degraded to a default.
	#[error("Validation error: {0}")]
	Validation(String),

	/// The search backend failed while counting, fetching or scanning.
	///
	/// Backend failures are always surfaced; they are never masked by an
	/// empty or truncated success result.
	#[error("Retrieval error: {0}")]
	Retrieval(#[source] Box<dyn std::error::Error + Send + Sync>),

	/// Single-object lookup matched no document.
	#[error("No document matches the given lookup")]
	NotFound,
}

impl SearchFrameError {
	/// Wraps a backend transport error into a [`SearchFrameError::Retrieval`].
	pub fn retrieval<E>(source: E) -> Self
	where
		E: std::error::Error + Send + Sync + 'static,
	{
		Self::Retrieval(Box::new(source))
	}
}

/// Result type alias for searchframe operations.
pub type Result<T> = std::result::Result<T, SearchFrameError>;
