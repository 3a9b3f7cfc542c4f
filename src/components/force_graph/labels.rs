use log::debug;
use serde_json::Value;

use super::graph::GraphNode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelState {
	/// Name only.
	#[default]
	Collapsed,
	/// Every attribute, one `key: value` per line.
	Expanded,
}

impl LabelState {
	pub fn toggled(self) -> Self {
		match self {
			LabelState::Collapsed => LabelState::Expanded,
			LabelState::Expanded => LabelState::Collapsed,
		}
	}
}

#[derive(Clone, Debug)]
struct LabelText {
	collapsed: Vec<String>,
	expanded: Vec<String>,
}

/// Per-node label state. Independent of the physics; clicking one label
/// never touches another.
#[derive(Clone, Debug, Default)]
pub struct LabelToggler {
	states: Vec<LabelState>,
	texts: Vec<LabelText>,
}

impl LabelToggler {
	pub fn new(nodes: &[GraphNode]) -> Self {
		Self {
			states: vec![LabelState::Collapsed; nodes.len()],
			texts: nodes
				.iter()
				.map(|node| LabelText {
					collapsed: vec![node.name.clone()],
					expanded: describe(node),
				})
				.collect(),
		}
	}

	/// Flips one label and returns its new state.
	pub fn toggle(&mut self, index: usize) -> Option<LabelState> {
		let state = self.states.get_mut(index)?;
		*state = state.toggled();
		debug!("Label {index} is now {state:?}");
		Some(*state)
	}

	pub fn state(&self, index: usize) -> LabelState {
		self.states.get(index).copied().unwrap_or_default()
	}

	pub fn lines(&self, index: usize) -> &[String] {
		match (self.texts.get(index), self.state(index)) {
			(Some(text), LabelState::Collapsed) => text.collapsed.as_slice(),
			(Some(text), LabelState::Expanded) => text.expanded.as_slice(),
			(None, _) => &[],
		}
	}
}

fn describe(node: &GraphNode) -> Vec<String> {
	let mut lines = vec![format!("id: {}", node.id), format!("name: {}", node.name)];
	let metrics = [
		("avg_duration", node.metrics.avg_duration),
		("success_n", node.metrics.success_n),
		("failure_n", node.metrics.failure_n),
	];
	for (key, value) in metrics {
		if let Some(value) = value {
			lines.push(format!("{key}: {value}"));
		}
	}
	for (key, value) in &node.extra {
		match value {
			Value::String(text) => lines.push(format!("{key}: {text}")),
			other => lines.push(format!("{key}: {other}")),
		}
	}
	lines
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::force_graph::graph::Graph;
	use crate::components::force_graph::types::GraphDocument;

	fn toggler() -> LabelToggler {
		let doc: GraphDocument = serde_json::from_value(json!({
			"nodes": [
				{ "id": 1, "name": "Checkout", "avg_duration": 42.5, "success_n": 90, "desc": "Cart service", "owners": ["a", "b"] },
				{ "id": 2, "name": "Payments" }
			],
			"links": []
		}))
		.unwrap();
		let graph = Graph::from_document(&doc).unwrap();
		LabelToggler::new(graph.nodes())
	}

	#[test]
	fn starts_collapsed_with_name() {
		let labels = toggler();
		assert_eq!(labels.state(0), LabelState::Collapsed);
		assert_eq!(labels.lines(0), ["Checkout"]);
		assert_eq!(labels.lines(1), ["Payments"]);
	}

	#[test]
	fn expanded_lists_every_attribute() {
		let mut labels = toggler();
		assert_eq!(labels.toggle(0), Some(LabelState::Expanded));
		assert_eq!(
			labels.lines(0),
			[
				"id: 1",
				"name: Checkout",
				"avg_duration: 42.5",
				"success_n: 90",
				"desc: Cart service",
				"owners: [\"a\",\"b\"]",
			]
		);
	}

	#[test]
	fn double_toggle_restores_content() {
		let mut labels = toggler();
		let original = labels.lines(1).to_vec();
		labels.toggle(1);
		assert_ne!(labels.lines(1), original.as_slice());
		labels.toggle(1);
		assert_eq!(labels.lines(1), original.as_slice());
		assert_eq!(labels.state(1), LabelState::Collapsed);
	}

	#[test]
	fn labels_are_independent() {
		let mut labels = toggler();
		labels.toggle(0);
		assert_eq!(labels.state(0), LabelState::Expanded);
		assert_eq!(labels.state(1), LabelState::Collapsed);
	}

	#[test]
	fn unknown_index_is_ignored() {
		let mut labels = toggler();
		assert_eq!(labels.toggle(9), None);
		assert!(labels.lines(9).is_empty());
	}
}
