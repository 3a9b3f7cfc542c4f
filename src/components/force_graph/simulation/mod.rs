//! Force-directed layout engine.
//!
//! Alpha starts at 1 and decays geometrically towards `alpha_target`
//! (normally 0). Each [`Simulation::step`] applies the link, many-body and
//! center forces in that order, then integrates velocity with damping.

mod forces;
mod quadtree;

use std::f64::consts::PI;

use log::{debug, info};

use super::error::Result;
use super::graph::{Graph, GraphLink, GraphNode};
use super::types::{ForceGraphConfig, GraphDocument, SimulationParameters, Surface};
use forces::{Jiggle, LinkParams, apply_center, apply_link, apply_many_body};
use quadtree::Point;

const INITIAL_RADIUS: f64 = 10.0;

pub struct Simulation {
	graph: Graph,
	link_params: Vec<LinkParams>,
	link_distance: f64,
	charge_strength: f64,
	center: (f64, f64),
	params: SimulationParameters,
	alpha: f64,
	alpha_target: f64,
	jiggle: Jiggle,
	positions: Vec<Point>,
	settled_reported: bool,
}

impl Simulation {
	/// Resolves the document into a graph and lays the nodes out on a
	/// phyllotaxis spiral around the surface midpoint.
	pub fn initialize(
		document: &GraphDocument,
		surface: Surface,
		config: &ForceGraphConfig,
	) -> Result<Self> {
		config.validate()?;
		let mut graph = Graph::from_document(document)?;
		let center = surface.center();

		let initial_angle = PI * (3.0 - 5.0_f64.sqrt());
		for (i, node) in graph.nodes.iter_mut().enumerate() {
			let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
			let angle = i as f64 * initial_angle;
			node.x = center.0 + radius * angle.cos();
			node.y = center.1 + radius * angle.sin();
		}

		let link_params = LinkParams::for_links(&graph.links, &graph.degrees());
		info!(
			"Simulation initialized with {} nodes and {} links",
			graph.nodes.len(),
			graph.links.len()
		);

		Ok(Self {
			graph,
			link_params,
			link_distance: config.link_distance,
			charge_strength: config.charge_strength,
			center,
			params: config.simulation,
			alpha: 1.0,
			alpha_target: 0.0,
			jiggle: Jiggle::new(),
			positions: Vec::new(),
			settled_reported: false,
		})
	}

	/// Advances the layout by one tick.
	pub fn step(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		let alpha = self.alpha;
		let nodes = &mut self.graph.nodes;

		apply_link(
			nodes,
			&self.graph.links,
			&self.link_params,
			self.link_distance,
			alpha,
			&mut self.jiggle,
		);
		apply_many_body(
			nodes,
			&mut self.positions,
			self.charge_strength,
			self.params.theta,
			alpha,
			&mut self.jiggle,
		);
		apply_center(nodes, self.center);

		let retain = 1.0 - self.params.velocity_decay;
		for node in nodes.iter_mut() {
			match node.pin {
				Some((fx, fy)) => {
					node.x = fx;
					node.y = fy;
					node.vx = 0.0;
					node.vy = 0.0;
				}
				None => {
					node.vx *= retain;
					node.vy *= retain;
					node.x += node.vx;
					node.y += node.vy;
				}
			}
		}

		if self.is_settled() {
			if !self.settled_reported {
				debug!("Simulation settled at alpha {:.5}", self.alpha);
				self.settled_reported = true;
			}
		} else {
			self.settled_reported = false;
		}
	}

	/// Lets alpha climb towards `target` on the following ticks.
	pub fn reheat(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	/// Returns alpha to decaying towards zero.
	pub fn cool(&mut self) {
		self.alpha_target = 0.0;
	}

	pub fn is_settled(&self) -> bool {
		self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	#[cfg(test)]
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn params(&self) -> &SimulationParameters {
		&self.params
	}

	pub fn nodes(&self) -> &[GraphNode] {
		self.graph.nodes()
	}

	pub fn links(&self) -> &[GraphLink] {
		self.graph.links()
	}

	pub fn node(&self, index: usize) -> Option<&GraphNode> {
		self.graph.nodes.get(index)
	}

	/// Fixes a node at `(x, y)` until [`Simulation::unpin`].
	pub fn pin(&mut self, index: usize, x: f64, y: f64) {
		if let Some(node) = self.graph.nodes.get_mut(index) {
			node.pin = Some((x, y));
		}
	}

	pub fn unpin(&mut self, index: usize) {
		if let Some(node) = self.graph.nodes.get_mut(index) {
			node.pin = None;
		}
	}

	pub fn center(&self) -> (f64, f64) {
		self.center
	}

	/// Moves the center target to the surface midpoint and carries the
	/// layout (pins included) along with it, so a settled graph follows too.
	pub fn set_center(&mut self, surface: Surface) {
		let center = surface.center();
		let (dx, dy) = (center.0 - self.center.0, center.1 - self.center.1);
		for node in &mut self.graph.nodes {
			node.x += dx;
			node.y += dy;
			if let Some((fx, fy)) = &mut node.pin {
				*fx += dx;
				*fy += dy;
			}
		}
		self.center = center;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::error::GraphError;
	use crate::components::force_graph::types::{LinkRecord, NodeRecord};

	fn surface() -> Surface {
		Surface::new(1000.0, 1000.0).unwrap()
	}

	fn pair() -> GraphDocument {
		GraphDocument {
			nodes: vec![NodeRecord::new("a", "A"), NodeRecord::new("b", "B")],
			links: vec![LinkRecord::new("a", "b")],
		}
	}

	fn chain(n: usize) -> GraphDocument {
		GraphDocument {
			nodes: (0..n)
				.map(|i| NodeRecord::new(i.to_string(), format!("Service {i}")))
				.collect(),
			links: (1..n)
				.map(|i| LinkRecord::new((i - 1).to_string(), i.to_string()))
				.collect(),
		}
	}

	fn link_length(sim: &Simulation) -> f64 {
		let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
		((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
	}

	#[test]
	fn two_nodes_converge_to_link_distance() {
		// Without repulsion the link force alone decides the rest length, so
		// the pair must end exactly at the configured distance.
		let config = ForceGraphConfig {
			charge_strength: 0.0,
			..ForceGraphConfig::call_graph()
		};
		let mut sim = Simulation::initialize(&pair(), surface(), &config).unwrap();
		assert_eq!(sim.alpha(), 1.0);

		let mut error = (link_length(&sim) - config.link_distance).abs();
		let mut steps = 0;
		while !sim.is_settled() {
			sim.step();
			steps += 1;
			let next = (link_length(&sim) - config.link_distance).abs();
			// Once within a micro-pixel the error just flips sign around zero.
			assert!(next <= error + 1e-5, "error grew at step {steps}: {error} -> {next}");
			error = next;
			assert!(steps < 400, "did not settle");
		}
		assert!(error < 1e-6);
		assert!((299..=301).contains(&steps));
	}

	#[test]
	fn charged_layout_settles() {
		let mut sim =
			Simulation::initialize(&chain(30), surface(), &ForceGraphConfig::call_graph()).unwrap();
		for _ in 0..400 {
			sim.step();
		}
		assert!(sim.is_settled());
		for node in sim.nodes() {
			assert!(node.x.is_finite() && node.y.is_finite());
		}
	}

	#[test]
	fn centroid_tracks_surface_midpoint() {
		let mut sim =
			Simulation::initialize(&chain(12), surface(), &ForceGraphConfig::call_graph()).unwrap();
		for _ in 0..50 {
			sim.step();
		}
		let n = sim.nodes().len() as f64;
		let cx = sim.nodes().iter().map(|node| node.x).sum::<f64>() / n;
		let cy = sim.nodes().iter().map(|node| node.y).sum::<f64>() / n;
		// Integration after centering moves the centroid by the mean velocity.
		assert!((cx - 500.0).abs() < 5.0);
		assert!((cy - 500.0).abs() < 5.0);

		sim.set_center(Surface::new(400.0, 200.0).unwrap());
		for _ in 0..5 {
			sim.step();
		}
		let cx = sim.nodes().iter().map(|node| node.x).sum::<f64>() / n;
		assert!((cx - 200.0).abs() < 5.0);
	}

	#[test]
	fn settled_layout_follows_new_midpoint() {
		let mut sim =
			Simulation::initialize(&chain(6), surface(), &ForceGraphConfig::call_graph()).unwrap();
		for _ in 0..400 {
			sim.step();
		}
		assert!(sim.is_settled());
		sim.pin(0, 480.0, 520.0);
		let before: Vec<_> = sim.nodes().iter().map(|node| (node.x, node.y)).collect();

		sim.set_center(Surface::new(300.0, 200.0).unwrap());
		assert!(sim.is_settled());
		let n = sim.nodes().len() as f64;
		let cx = sim.nodes().iter().map(|node| node.x).sum::<f64>() / n;
		let cy = sim.nodes().iter().map(|node| node.y).sum::<f64>() / n;
		assert!((cx - 150.0).abs() < 0.5, "centroid x {cx}");
		assert!((cy - 100.0).abs() < 0.5, "centroid y {cy}");
		for (node, (x, y)) in sim.nodes().iter().zip(before) {
			assert!((node.x - (x - 350.0)).abs() < 1e-9);
			assert!((node.y - (y - 400.0)).abs() < 1e-9);
		}
		assert_eq!(sim.nodes()[0].pin, Some((130.0, 120.0)));
	}

	#[test]
	fn pinned_node_holds_position_and_still_repels() {
		let mut sim =
			Simulation::initialize(&chain(5), surface(), &ForceGraphConfig::call_graph()).unwrap();
		sim.pin(2, 123.0, 456.0);
		for _ in 0..20 {
			sim.step();
			let node = &sim.nodes()[2];
			assert_eq!((node.x, node.y), (123.0, 456.0));
			assert_eq!((node.vx, node.vy), (0.0, 0.0));
		}
		let neighbour = &sim.nodes()[1];
		assert!(neighbour.x != 123.0 || neighbour.y != 456.0);

		sim.unpin(2);
		sim.step();
		assert!(!sim.nodes()[2].is_pinned());
		assert_ne!((sim.nodes()[2].x, sim.nodes()[2].y), (123.0, 456.0));
	}

	#[test]
	fn reheat_and_cool_steer_alpha() {
		let mut sim =
			Simulation::initialize(&pair(), surface(), &ForceGraphConfig::call_graph()).unwrap();
		for _ in 0..400 {
			sim.step();
		}
		assert!(sim.is_settled());

		sim.reheat(0.3);
		assert!(!sim.is_settled());
		let before = sim.alpha();
		sim.step();
		assert!(sim.alpha() > before);
		for _ in 0..500 {
			sim.step();
		}
		assert!((sim.alpha() - 0.3).abs() < 1e-3);

		sim.cool();
		assert_eq!(sim.alpha_target(), 0.0);
		let mut steps = 0;
		while !sim.is_settled() {
			sim.step();
			steps += 1;
			assert!(steps < 400);
		}
	}

	#[test]
	fn integrity_error_refuses_to_start() {
		let mut doc = pair();
		doc.links.push(LinkRecord::new("a", "missing"));
		let result = Simulation::initialize(&doc, surface(), &ForceGraphConfig::call_graph());
		assert!(matches!(result, Err(GraphError::Integrity(_))));
	}

	#[test]
	fn invalid_config_refuses_to_start() {
		let config = ForceGraphConfig {
			link_distance: -5.0,
			..ForceGraphConfig::call_graph()
		};
		assert!(matches!(
			Simulation::initialize(&pair(), surface(), &config),
			Err(GraphError::InvalidConfig(_))
		));
	}

	#[test]
	fn empty_graph_steps_quietly() {
		let mut sim = Simulation::initialize(
			&GraphDocument::default(),
			surface(),
			&ForceGraphConfig::overview(),
		)
		.unwrap();
		for _ in 0..10 {
			sim.step();
		}
		assert!(sim.nodes().is_empty());
	}

	#[test]
	fn layouts_are_reproducible() {
		let run = || {
			let mut sim = Simulation::initialize(&chain(20), surface(), &ForceGraphConfig::call_graph())
				.unwrap();
			for _ in 0..100 {
				sim.step();
			}
			sim.nodes().iter().map(|node| (node.x, node.y)).collect::<Vec<_>>()
		};
		assert_eq!(run(), run());
	}
}
