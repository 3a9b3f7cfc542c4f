use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::error::{GraphError, Result};

/// Node record as it appears in the graph document.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NodeRecord {
	#[serde(deserialize_with = "lenient_id")]
	pub id: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "lenient_metric")]
	pub avg_duration: Option<f64>,
	#[serde(default, deserialize_with = "lenient_metric")]
	pub success_n: Option<f64>,
	#[serde(default, deserialize_with = "lenient_metric")]
	pub failure_n: Option<f64>,
	/// Remaining attributes, in document order. Shown in the expanded label.
	#[serde(flatten)]
	pub extra: IndexMap<String, Value>,
}

impl NodeRecord {
	pub fn metrics(&self) -> NodeMetrics {
		NodeMetrics {
			avg_duration: self.avg_duration,
			success_n: self.success_n,
			failure_n: self.failure_n,
		}
	}
}

#[cfg(test)]
impl NodeRecord {
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: Some(name.into()),
			..Self::default()
		}
	}

	pub fn with_metrics(mut self, avg_duration: f64, success_n: f64, failure_n: f64) -> Self {
		self.avg_duration = Some(avg_duration);
		self.success_n = Some(success_n);
		self.failure_n = Some(failure_n);
		self
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LinkRecord {
	#[serde(deserialize_with = "lenient_id")]
	pub source: String,
	#[serde(deserialize_with = "lenient_id")]
	pub target: String,
}

#[cfg(test)]
impl LinkRecord {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// The `{ nodes, links }` document handed to the graph at startup.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphDocument {
	#[serde(default)]
	pub nodes: Vec<NodeRecord>,
	#[serde(default)]
	pub links: Vec<LinkRecord>,
}

impl GraphDocument {
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}
}

/// Domain metrics of one node. Missing values stay `None` until encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeMetrics {
	pub avg_duration: Option<f64>,
	pub success_n: Option<f64>,
	pub failure_n: Option<f64>,
}

/// Networkx emits integer ids, hand-written documents use strings.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	match Value::deserialize(deserializer)? {
		Value::String(s) => Ok(s),
		Value::Number(n) => Ok(n.to_string()),
		other => Err(serde::de::Error::custom(format!(
			"expected a string or number identifier, found {other}"
		))),
	}
}

fn lenient_metric<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Value::deserialize(deserializer)?.as_f64())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeRadius {
	Fixed(f64),
	/// Radius follows `avg_duration`, see [`super::encode::radius_for_duration`].
	Metric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorEncoding {
	Enabled,
	Disabled,
}

/// Integration constants. Defaults settle the layout in 300 ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationParameters {
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub velocity_decay: f64,
	/// Barnes-Hut opening angle.
	pub theta: f64,
	/// Energy the simulation is reheated towards while a node is dragged.
	pub drag_alpha_target: f64,
}

impl Default for SimulationParameters {
	fn default() -> Self {
		let alpha_min = 0.001;
		Self {
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			theta: 0.9,
			drag_alpha_target: 0.3,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceGraphConfig {
	pub link_distance: f64,
	/// Negative values repel.
	pub charge_strength: f64,
	pub node_radius: NodeRadius,
	pub color_encoding: ColorEncoding,
	pub simulation: SimulationParameters,
}

impl ForceGraphConfig {
	/// Service call graph: short links, metric-sized and coloured markers.
	pub fn call_graph() -> Self {
		Self {
			link_distance: 100.0,
			charge_strength: -300.0,
			node_radius: NodeRadius::Metric,
			color_encoding: ColorEncoding::Enabled,
			simulation: SimulationParameters::default(),
		}
	}

	/// Spread-out topology view with plain, uniform markers.
	pub fn overview() -> Self {
		Self {
			link_distance: 350.0,
			charge_strength: -1000.0,
			node_radius: NodeRadius::Fixed(8.0),
			color_encoding: ColorEncoding::Disabled,
			simulation: SimulationParameters::default(),
		}
	}

	pub fn validate(&self) -> Result<()> {
		if !(self.link_distance.is_finite() && self.link_distance > 0.0) {
			return Err(GraphError::InvalidConfig("link distance must be positive"));
		}
		if !self.charge_strength.is_finite() {
			return Err(GraphError::InvalidConfig("charge strength must be finite"));
		}
		if let NodeRadius::Fixed(radius) = self.node_radius {
			if !(radius.is_finite() && radius > 0.0) {
				return Err(GraphError::InvalidConfig("fixed node radius must be positive"));
			}
		}
		let sim = &self.simulation;
		if !(sim.alpha_decay > 0.0 && sim.alpha_decay < 1.0) {
			return Err(GraphError::InvalidConfig("alpha decay must be in (0, 1)"));
		}
		if !(sim.velocity_decay >= 0.0 && sim.velocity_decay <= 1.0) {
			return Err(GraphError::InvalidConfig("velocity decay must be in [0, 1]"));
		}
		if !(sim.alpha_min > 0.0 && sim.alpha_min < 1.0) {
			return Err(GraphError::InvalidConfig("alpha min must be in (0, 1)"));
		}
		if !(sim.theta.is_finite() && sim.theta >= 0.0) {
			return Err(GraphError::InvalidConfig("theta must be non-negative"));
		}
		if !(sim.drag_alpha_target > sim.alpha_min && sim.drag_alpha_target <= 1.0) {
			return Err(GraphError::InvalidConfig("drag alpha target must be in (alpha min, 1]"));
		}
		Ok(())
	}
}

impl Default for ForceGraphConfig {
	fn default() -> Self {
		Self::call_graph()
	}
}

/// Size of the drawing surface in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
	pub width: f64,
	pub height: f64,
}

impl Surface {
	pub fn new(width: f64, height: f64) -> Result<Self> {
		if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
			return Err(GraphError::InvalidSurface { width, height });
		}
		Ok(Self { width, height })
	}

	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}
}
