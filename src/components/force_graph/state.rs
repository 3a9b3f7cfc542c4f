use log::{debug, info};

use super::error::Result;
use super::interaction::DragController;
use super::labels::{LabelState, LabelToggler};
use super::scene::{Scene, TextWidth, estimate_text_width};
use super::simulation::Simulation;
use super::types::{ForceGraphConfig, GraphDocument, Surface};

/// What a tick listener gets to paint from.
pub struct Frame<'a> {
	pub scene: &'a Scene,
	pub surface: Surface,
	pub hover: Option<usize>,
	pub dragged: Option<usize>,
}

type TickListener = Box<dyn FnMut(&Frame<'_>)>;

/// Live handle for one graph session.
///
/// Owns the simulation and the two input state machines. Input handlers only
/// touch drag pins and label state; physics only advances inside
/// [`ForceGraphState::tick`], which steps first and repaints second.
pub struct ForceGraphState {
	pub simulation: Simulation,
	pub scene: Scene,
	pub drag: DragController,
	pub labels: LabelToggler,
	pub hover: Option<usize>,
	surface: Surface,
	listeners: Vec<TickListener>,
	measure_text: Box<TextWidth>,
	dirty: bool,
	suppress_click: bool,
}

impl ForceGraphState {
	pub fn initialize(
		document: &GraphDocument,
		width: f64,
		height: f64,
		config: ForceGraphConfig,
	) -> Result<Self> {
		let surface = Surface::new(width, height)?;
		let simulation = Simulation::initialize(document, surface, &config)?;
		let labels = LabelToggler::new(simulation.nodes());
		let scene = Scene::new(&simulation, &config, &labels, &estimate_text_width);
		info!("Force graph ready on a {width}x{height} surface");

		Ok(Self {
			simulation,
			scene,
			drag: DragController::default(),
			labels,
			hover: None,
			surface,
			listeners: Vec::new(),
			measure_text: Box::new(estimate_text_width),
			dirty: true,
			suppress_click: false,
		})
	}

	/// Registers a repaint callback, run after every tick that changed something.
	pub fn on_tick(&mut self, listener: impl FnMut(&Frame<'_>) + 'static) {
		self.listeners.push(Box::new(listener));
		self.dirty = true;
	}

	/// Replaces the glyph-count estimate used for label hit boxes with real
	/// text metrics.
	pub fn set_text_measure(&mut self, measure: impl Fn(&str) -> f64 + 'static) {
		self.measure_text = Box::new(measure);
		self.scene.relayout_labels(&self.labels, &*self.measure_text);
		self.dirty = true;
	}

	/// Steps the simulation (unless it is at rest) and notifies listeners.
	/// Returns whether listeners ran.
	pub fn tick(&mut self) -> bool {
		if !self.simulation.is_settled() || !self.drag.is_idle() {
			self.simulation.step();
			self.dirty = true;
		}
		if !self.dirty {
			return false;
		}

		self.scene.sync(&self.simulation, &self.labels, &*self.measure_text);
		let frame = Frame {
			scene: &self.scene,
			surface: self.surface,
			hover: self.hover,
			dragged: self.drag.dragged_node(),
		};
		for listener in &mut self.listeners {
			listener(&frame);
		}
		self.dirty = false;
		true
	}

	/// Moves the center force to the new midpoint.
	pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
		self.surface = Surface::new(width, height)?;
		self.simulation.set_center(self.surface);
		self.dirty = true;
		debug!(
			"Surface resized to {width}x{height}, centering on {:?}",
			self.simulation.center()
		);
		Ok(())
	}

	/// Starts a drag if the press landed on a marker.
	pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
		self.suppress_click = false;
		let Some(node) = self.scene.node_at(x, y) else {
			return false;
		};
		self.drag.begin(&mut self.simulation, node, (x, y))
	}

	/// Drags the held node, or updates the hovered marker.
	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if !self.drag.is_idle() {
			self.drag.drag_to(&mut self.simulation, (x, y));
			return;
		}
		let hovered = self.scene.node_at(x, y);
		if hovered != self.hover {
			self.hover = hovered;
			self.dirty = true;
		}
	}

	pub fn pointer_up(&mut self) {
		if let Some(outcome) = self.drag.end(&mut self.simulation) {
			debug!("Released node {}", outcome.node);
			self.suppress_click = outcome.moved;
		}
	}

	/// Pointer left the surface or the gesture was interrupted.
	pub fn pointer_cancel(&mut self) {
		if self.drag.end(&mut self.simulation).is_some() {
			debug!("Drag cancelled");
		}
		if self.hover.take().is_some() {
			self.dirty = true;
		}
	}

	/// Toggles the label under the point. Clicks that finish a drag are ignored.
	pub fn click(&mut self, x: f64, y: f64) -> Option<LabelState> {
		if std::mem::take(&mut self.suppress_click) {
			return None;
		}
		let index = self.scene.label_at(x, y)?;
		let state = self.labels.toggle(index)?;
		self.dirty = true;
		Some(state)
	}

	/// Id of the hovered node, for the surface tooltip.
	pub fn hover_tooltip(&self) -> Option<&str> {
		self.scene.tooltip(self.hover?)
	}
}
