use log::debug;

use super::simulation::Simulation;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
	#[default]
	Idle,
	Dragging {
		node: usize,
		pointer_start: (f64, f64),
		node_start: (f64, f64),
		moved: bool,
	},
}

/// How a finished gesture went, so a release over a label is not also a click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragOutcome {
	pub node: usize,
	pub moved: bool,
}

/// Drag state machine. The only simulation state it writes is the pin of
/// the dragged node, plus the alpha target on start and end.
#[derive(Clone, Debug, Default)]
pub struct DragController {
	state: DragState,
}

impl DragController {
	pub fn is_idle(&self) -> bool {
		self.state == DragState::Idle
	}

	pub fn dragged_node(&self) -> Option<usize> {
		match self.state {
			DragState::Dragging { node, .. } => Some(node),
			DragState::Idle => None,
		}
	}

	/// Pins `node` where it is and reheats the simulation. A gesture still in
	/// progress is ended first so no pin is left behind.
	pub fn begin(&mut self, simulation: &mut Simulation, node: usize, pointer: (f64, f64)) -> bool {
		if !self.is_idle() {
			self.end(simulation);
		}
		let Some(current) = simulation.node(node) else {
			return false;
		};
		let node_start = (current.x, current.y);

		simulation.pin(node, node_start.0, node_start.1);
		simulation.reheat(simulation.params().drag_alpha_target);
		self.state = DragState::Dragging {
			node,
			pointer_start: pointer,
			node_start,
			moved: false,
		};
		debug!("Drag started on node {node} at alpha {:.3}", simulation.alpha());
		true
	}

	/// Moves the pin by the pointer's travel since the gesture started.
	pub fn drag_to(&mut self, simulation: &mut Simulation, pointer: (f64, f64)) {
		let DragState::Dragging {
			node,
			pointer_start,
			node_start,
			ref mut moved,
		} = self.state
		else {
			return;
		};
		let (x, y) = (
			node_start.0 + (pointer.0 - pointer_start.0),
			node_start.1 + (pointer.1 - pointer_start.1),
		);
		*moved |= pointer != pointer_start;
		simulation.pin(node, x, y);
	}

	/// Releases the pin and lets the simulation cool. Also used for
	/// cancelled gestures.
	pub fn end(&mut self, simulation: &mut Simulation) -> Option<DragOutcome> {
		let DragState::Dragging { node, moved, .. } = std::mem::take(&mut self.state) else {
			return None;
		};
		simulation.unpin(node);
		simulation.cool();
		debug!("Drag ended on node {node} (moved: {moved})");
		Some(DragOutcome { node, moved })
	}
}
