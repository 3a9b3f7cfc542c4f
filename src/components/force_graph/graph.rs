use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use super::error::{Endpoint, GraphError, GraphIntegrityError, Result};
use super::types::{GraphDocument, NodeMetrics};

/// A node with its live layout state.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub name: String,
	pub metrics: NodeMetrics,
	pub extra: IndexMap<String, Value>,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned position. While set, forces never move the node.
	pub pin: Option<(f64, f64)>,
}

impl GraphNode {
	pub fn is_pinned(&self) -> bool {
		self.pin.is_some()
	}
}

/// Link endpoints as indices into [`Graph::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphLink {
	pub source: usize,
	pub target: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
	pub(super) nodes: Vec<GraphNode>,
	pub(super) links: Vec<GraphLink>,
}

impl Graph {
	/// Resolves link identifiers against the node collection.
	pub fn from_document(document: &GraphDocument) -> Result<Self> {
		let mut id_to_idx = HashMap::with_capacity(document.nodes.len());
		let mut nodes = Vec::with_capacity(document.nodes.len());

		for (idx, record) in document.nodes.iter().enumerate() {
			if id_to_idx.insert(record.id.clone(), idx).is_some() {
				return Err(GraphError::DuplicateNode(record.id.clone()));
			}
			nodes.push(GraphNode {
				id: record.id.clone(),
				name: record
					.name
					.clone()
					.filter(|name| !name.is_empty())
					.unwrap_or_else(|| record.id.clone()),
				metrics: record.metrics(),
				extra: record.extra.clone(),
				x: 0.0,
				y: 0.0,
				vx: 0.0,
				vy: 0.0,
				pin: None,
			});
		}

		let resolve = |link: usize, endpoint: Endpoint, id: &str| {
			id_to_idx
				.get(id)
				.copied()
				.ok_or_else(|| GraphIntegrityError {
					link,
					endpoint,
					id: id.to_owned(),
				})
		};

		let links = document
			.links
			.iter()
			.enumerate()
			.map(|(i, link)| {
				Ok(GraphLink {
					source: resolve(i, Endpoint::Source, &link.source)?,
					target: resolve(i, Endpoint::Target, &link.target)?,
				})
			})
			.collect::<std::result::Result<Vec<_>, GraphIntegrityError>>()?;

		Ok(Self { nodes, links })
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[GraphLink] {
		&self.links
	}

	/// Number of link endpoints touching each node.
	pub fn degrees(&self) -> Vec<usize> {
		let mut degrees = vec![0; self.nodes.len()];
		for link in &self.links {
			degrees[link.source] += 1;
			degrees[link.target] += 1;
		}
		degrees
	}
}
