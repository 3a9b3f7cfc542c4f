//! Visual primitives projected from the simulation every tick.
//!
//! The scene only reads simulation state. Marker sizes and colours are fixed
//! at construction since node metrics never change during a session; edge,
//! marker and label positions are refreshed by [`Scene::sync`].

use super::encode::{Rgb, color_for_metrics, radius_for_duration};
use super::labels::{LabelState, LabelToggler};
use super::simulation::Simulation;
use super::types::{ColorEncoding, ForceGraphConfig, NodeRadius};

/// Label top-left corner relative to the node centre.
pub const LABEL_OFFSET: (f64, f64) = (20.0, 10.0);
const LABEL_FONT_PX: f64 = 12.0;
/// Canvas font for label text; measurement and painting must agree on it.
pub const LABEL_FONT: &str = "12px sans-serif";
pub const LABEL_LINE_HEIGHT: f64 = 16.0;
/// Rough advance of one glyph when no canvas is around to measure with.
const LABEL_CHAR_WIDTH: f64 = LABEL_FONT_PX * 0.6;
pub const ARROW_SIZE: f64 = 8.0;
/// Extra grab distance around small markers.
pub const HIT_SLOP: f64 = 4.0;

/// Width in pixels of one line of label text.
pub type TextWidth = dyn Fn(&str) -> f64;

pub fn estimate_text_width(text: &str) -> f64 {
	text.chars().count() as f64 * LABEL_CHAR_WIDTH
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgePrimitive {
	pub source: usize,
	pub target: usize,
	/// Line from the rim of the source marker to the base of the arrowhead.
	pub start: (f64, f64),
	pub end: (f64, f64),
	/// Arrowhead triangle, tip first, touching the target marker.
	pub arrow: [(f64, f64); 3],
	/// False while the two markers overlap.
	pub visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeMarker {
	pub center: (f64, f64),
	pub radius: f64,
	pub fill: Rgb,
	/// Raw node id, shown on hover.
	pub tooltip: String,
	pub pinned: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelOverlay {
	pub origin: (f64, f64),
	pub state: LabelState,
	pub lines: Vec<String>,
	pub width: f64,
	pub height: f64,
}

impl LabelOverlay {
	fn set_lines(&mut self, state: LabelState, lines: &[String], measure: &TextWidth) {
		self.state = state;
		self.lines = lines.to_vec();
		self.width = lines.iter().map(|line| measure(line)).fold(0.0, f64::max);
		self.height = lines.len() as f64 * LABEL_LINE_HEIGHT;
	}

	fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.origin.0
			&& x <= self.origin.0 + self.width
			&& y >= self.origin.1
			&& y <= self.origin.1 + self.height
	}
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
	pub edges: Vec<EdgePrimitive>,
	pub markers: Vec<NodeMarker>,
	pub labels: Vec<LabelOverlay>,
}

impl Scene {
	pub fn new(
		simulation: &Simulation,
		config: &ForceGraphConfig,
		labels: &LabelToggler,
		measure: &TextWidth,
	) -> Self {
		let markers = simulation
			.nodes()
			.iter()
			.map(|node| NodeMarker {
				center: (node.x, node.y),
				radius: match config.node_radius {
					NodeRadius::Fixed(radius) => radius,
					NodeRadius::Metric => radius_for_duration(node.metrics.avg_duration),
				},
				fill: match config.color_encoding {
					ColorEncoding::Enabled => color_for_metrics(&node.metrics),
					ColorEncoding::Disabled => Rgb::NEUTRAL,
				},
				tooltip: node.id.clone(),
				pinned: node.is_pinned(),
			})
			.collect();

		let edges = simulation
			.links()
			.iter()
			.map(|link| EdgePrimitive {
				source: link.source,
				target: link.target,
				start: (0.0, 0.0),
				end: (0.0, 0.0),
				arrow: [(0.0, 0.0); 3],
				visible: false,
			})
			.collect();

		let overlays = (0..simulation.nodes().len())
			.map(|index| {
				let mut overlay = LabelOverlay {
					origin: (0.0, 0.0),
					state: LabelState::Collapsed,
					lines: Vec::new(),
					width: 0.0,
					height: 0.0,
				};
				overlay.set_lines(labels.state(index), labels.lines(index), measure);
				overlay
			})
			.collect();

		let mut scene = Self {
			edges,
			markers,
			labels: overlays,
		};
		scene.sync(simulation, labels, measure);
		scene
	}

	/// Re-measures every label, e.g. once real font metrics are available.
	pub fn relayout_labels(&mut self, labels: &LabelToggler, measure: &TextWidth) {
		for (index, overlay) in self.labels.iter_mut().enumerate() {
			overlay.set_lines(labels.state(index), labels.lines(index), measure);
		}
	}

	/// Re-reads node positions and label states.
	pub fn sync(&mut self, simulation: &Simulation, labels: &LabelToggler, measure: &TextWidth) {
		let nodes = simulation.nodes();

		for (marker, node) in self.markers.iter_mut().zip(nodes) {
			marker.center = (node.x, node.y);
			marker.pinned = node.is_pinned();
		}

		for (index, (overlay, node)) in self.labels.iter_mut().zip(nodes).enumerate() {
			overlay.origin = (node.x + LABEL_OFFSET.0, node.y + LABEL_OFFSET.1);
			let state = labels.state(index);
			if overlay.state != state {
				overlay.set_lines(state, labels.lines(index), measure);
			}
		}

		for edge in &mut self.edges {
			let (source, target) = (&self.markers[edge.source], &self.markers[edge.target]);
			let (x1, y1) = source.center;
			let (x2, y2) = target.center;
			let (dx, dy) = (x2 - x1, y2 - y1);
			let dist = (dx * dx + dy * dy).sqrt();
			edge.visible = dist > source.radius + target.radius;
			if dist < 1e-3 {
				continue;
			}

			let (ux, uy) = (dx / dist, dy / dist);
			let tip = (x2 - ux * target.radius, y2 - uy * target.radius);
			let back = (tip.0 - ux * ARROW_SIZE, tip.1 - uy * ARROW_SIZE);
			let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);

			edge.start = (x1 + ux * source.radius, y1 + uy * source.radius);
			edge.end = back;
			edge.arrow = [tip, (back.0 + px, back.1 + py), (back.0 - px, back.1 - py)];
		}
	}

	/// Topmost marker under the point, if any.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		self.markers.iter().rposition(|marker| {
			let (dx, dy) = (marker.center.0 - x, marker.center.1 - y);
			(dx * dx + dy * dy).sqrt() <= marker.radius + HIT_SLOP
		})
	}

	pub fn label_at(&self, x: f64, y: f64) -> Option<usize> {
		self.labels.iter().rposition(|label| label.contains(x, y))
	}

	pub fn tooltip(&self, index: usize) -> Option<&str> {
		self.markers.get(index).map(|marker| marker.tooltip.as_str())
	}
}
