use std::fmt;

/// Which end of a link failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
	Source,
	Target,
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Endpoint::Source => f.write_str("source"),
			Endpoint::Target => f.write_str("target"),
		}
	}
}

/// A link names a node identifier that is not in the node collection.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("link #{link} references unknown {endpoint} node `{id}`")]
pub struct GraphIntegrityError {
	pub link: usize,
	pub endpoint: Endpoint,
	pub id: String,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GraphError {
	#[error(transparent)]
	Integrity(#[from] GraphIntegrityError),
	#[error("duplicate node identifier `{0}`")]
	DuplicateNode(String),
	#[error("drawing surface must have a positive size, got {width}x{height}")]
	InvalidSurface { width: f64, height: f64 },
	#[error("invalid graph configuration: {0}")]
	InvalidConfig(&'static str),
	#[error("malformed graph document: {0}")]
	Document(String),
}

impl From<serde_json::Error> for GraphError {
	fn from(err: serde_json::Error) -> Self {
		GraphError::Document(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, GraphError>;
