//! The three forces. Each one nudges velocities (or, for centering,
//! positions) in place and is scaled by the current alpha.

use super::super::graph::{GraphLink, GraphNode};
use super::quadtree::{Point, QuadNode};

/// Squared distances below this are softened to avoid blow-ups.
const DISTANCE_MIN_SQ: f64 = 1.0;

/// Deterministic sub-pixel noise used to separate coincident nodes.
#[derive(Clone, Debug)]
pub(super) struct Jiggle(u32);

impl Jiggle {
	pub(super) fn new() -> Self {
		Self(1)
	}

	pub(super) fn next(&mut self) -> f64 {
		self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		(f64::from(self.0) / 4_294_967_296.0 - 0.5) * 1e-6
	}
}

/// Precomputed per-link constants.
#[derive(Clone, Copy, Debug)]
pub(super) struct LinkParams {
	pub(super) strength: f64,
	/// Share of the correction applied to the target.
	pub(super) bias: f64,
}

impl LinkParams {
	pub(super) fn for_links(links: &[GraphLink], degrees: &[usize]) -> Vec<Self> {
		links
			.iter()
			.map(|link| {
				let (source, target) = (degrees[link.source] as f64, degrees[link.target] as f64);
				Self {
					strength: 1.0 / source.min(target).max(1.0),
					bias: source / (source + target),
				}
			})
			.collect()
	}
}

/// Spring towards `distance` along each link, evaluated at the positions the
/// endpoints are about to reach.
pub(super) fn apply_link(
	nodes: &mut [GraphNode],
	links: &[GraphLink],
	params: &[LinkParams],
	distance: f64,
	alpha: f64,
	jiggle: &mut Jiggle,
) {
	for (link, param) in links.iter().zip(params) {
		if link.source == link.target {
			continue;
		}
		let (source, target) = (&nodes[link.source], &nodes[link.target]);
		let mut dx = target.x + target.vx - source.x - source.vx;
		let mut dy = target.y + target.vy - source.y - source.vy;
		if dx == 0.0 {
			dx = jiggle.next();
		}
		if dy == 0.0 {
			dy = jiggle.next();
		}

		let length = (dx * dx + dy * dy).sqrt();
		let scale = (length - distance) / length * alpha * param.strength;
		let (cx, cy) = (dx * scale, dy * scale);

		let target = &mut nodes[link.target];
		target.vx -= cx * param.bias;
		target.vy -= cy * param.bias;
		let source = &mut nodes[link.source];
		source.vx += cx * (1.0 - param.bias);
		source.vy += cy * (1.0 - param.bias);
	}
}

/// Pairwise charge, approximated with a quadtree. Pinned nodes act as
/// sources like any other node.
pub(super) fn apply_many_body(
	nodes: &mut [GraphNode],
	positions: &mut Vec<Point>,
	strength: f64,
	theta: f64,
	alpha: f64,
	jiggle: &mut Jiggle,
) {
	if strength == 0.0 || nodes.len() < 2 {
		return;
	}

	positions.clear();
	positions.extend(nodes.iter().map(|node| Point { x: node.x, y: node.y }));
	let Some(quadtree) = QuadNode::build(positions) else {
		return;
	};

	let scale = strength * alpha;
	for (index, node) in nodes.iter_mut().enumerate() {
		let mut force = Point::default();
		accumulate_charge_for_node(&quadtree, index, positions, scale, theta, jiggle, &mut force);
		node.vx += force.x;
		node.vy += force.y;
	}
}

fn charge_between(point: Point, other: Point, scale: f64, jiggle: &mut Jiggle) -> Point {
	let mut dx = other.x - point.x;
	let mut dy = other.y - point.y;
	if dx == 0.0 {
		dx = jiggle.next();
	}
	if dy == 0.0 {
		dy = jiggle.next();
	}
	let mut distance_sq = dx * dx + dy * dy;
	if distance_sq < DISTANCE_MIN_SQ {
		distance_sq = (DISTANCE_MIN_SQ * distance_sq).sqrt();
	}
	Point {
		x: dx * scale / distance_sq,
		y: dy * scale / distance_sq,
	}
}

fn accumulate_charge_for_node(
	node: &QuadNode,
	index: usize,
	positions: &[Point],
	scale: f64,
	theta: f64,
	jiggle: &mut Jiggle,
	force: &mut Point,
) {
	if node.mass <= 0.0 {
		return;
	}

	let point = positions[index];

	if node.is_leaf() {
		for &other_index in &node.indices {
			if other_index == index {
				continue;
			}
			let push = charge_between(point, positions[other_index], scale, jiggle);
			force.x += push.x;
			force.y += push.y;
		}
		return;
	}

	let (dx, dy) = (node.center_of_mass.x - point.x, node.center_of_mass.y - point.y);
	let distance = (dx * dx + dy * dy).sqrt().max(1e-3);
	let can_approximate =
		!node.bounds.contains(point) && node.bounds.side_length() / distance < theta;

	if can_approximate {
		let push = charge_between(point, node.center_of_mass, scale * node.mass, jiggle);
		force.x += push.x;
		force.y += push.y;
		return;
	}

	for child in node.children.iter().flatten() {
		accumulate_charge_for_node(child, index, positions, scale, theta, jiggle, force);
	}
}

/// Translates every node so the centroid sits on `center`.
pub(super) fn apply_center(nodes: &mut [GraphNode], center: (f64, f64)) {
	if nodes.is_empty() {
		return;
	}
	let count = nodes.len() as f64;
	let (sum_x, sum_y) = nodes
		.iter()
		.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
	let (shift_x, shift_y) = (sum_x / count - center.0, sum_y / count - center.1);
	for node in nodes {
		node.x -= shift_x;
		node.y -= shift_y;
	}
}

#[cfg(test)]
mod tests {
	use indexmap::IndexMap;

	use super::*;
	use crate::components::force_graph::types::NodeMetrics;

	fn node_at(x: f64, y: f64) -> GraphNode {
		GraphNode {
			id: format!("{x},{y}"),
			name: String::new(),
			metrics: NodeMetrics::default(),
			extra: IndexMap::new(),
			x,
			y,
			vx: 0.0,
			vy: 0.0,
			pin: None,
		}
	}

	fn exact_charge(nodes: &[GraphNode], index: usize, scale: f64) -> (f64, f64) {
		let mut total = (0.0, 0.0);
		for (other, node) in nodes.iter().enumerate() {
			if other == index {
				continue;
			}
			let (dx, dy) = (node.x - nodes[index].x, node.y - nodes[index].y);
			let distance_sq = dx * dx + dy * dy;
			total.0 += dx * scale / distance_sq;
			total.1 += dy * scale / distance_sq;
		}
		total
	}

	#[test]
	fn jiggle_is_small_and_reproducible() {
		let (mut a, mut b) = (Jiggle::new(), Jiggle::new());
		for _ in 0..100 {
			let value = a.next();
			assert_eq!(value, b.next());
			assert!(value.abs() <= 0.5e-6);
		}
	}

	#[test]
	fn link_params_balance_by_degree() {
		let links = [
			GraphLink {
				source: 0,
				target: 1,
			},
			GraphLink {
				source: 0,
				target: 2,
			},
		];
		let params = LinkParams::for_links(&links, &[2, 1, 1]);
		assert_eq!(params[0].strength, 1.0);
		assert!((params[0].bias - 2.0 / 3.0).abs() < 1e-12);
	}

	#[test]
	fn stretched_link_pulls_endpoints_together() {
		let mut nodes = vec![node_at(0.0, 0.0), node_at(300.0, 0.0)];
		let links = [GraphLink {
			source: 0,
			target: 1,
		}];
		let params = LinkParams::for_links(&links, &[1, 1]);
		apply_link(&mut nodes, &links, &params, 100.0, 1.0, &mut Jiggle::new());
		assert!(nodes[0].vx > 0.0);
		assert!(nodes[1].vx < 0.0);
		assert!((nodes[0].vx + nodes[1].vx).abs() < 1e-9);
	}

	#[test]
	fn compressed_link_pushes_endpoints_apart() {
		let mut nodes = vec![node_at(0.0, 0.0), node_at(20.0, 0.0)];
		let links = [GraphLink {
			source: 0,
			target: 1,
		}];
		let params = LinkParams::for_links(&links, &[1, 1]);
		apply_link(&mut nodes, &links, &params, 100.0, 1.0, &mut Jiggle::new());
		assert!(nodes[0].vx < 0.0);
		assert!(nodes[1].vx > 0.0);
	}

	#[test]
	fn negative_charge_repels() {
		let mut nodes = vec![node_at(0.0, 0.0), node_at(10.0, 0.0)];
		apply_many_body(&mut nodes, &mut Vec::new(), -30.0, 0.9, 1.0, &mut Jiggle::new());
		assert!(nodes[0].vx < 0.0);
		assert!(nodes[1].vx > 0.0);
		assert!((nodes[0].vx - -3.0).abs() < 1e-9);
	}

	#[test]
	fn coincident_nodes_separate() {
		let mut nodes = vec![node_at(5.0, 5.0), node_at(5.0, 5.0)];
		apply_many_body(&mut nodes, &mut Vec::new(), -30.0, 0.9, 1.0, &mut Jiggle::new());
		assert!(nodes[0].vx.is_finite() && nodes[1].vx.is_finite());
		assert!(nodes[0].vx != nodes[1].vx || nodes[0].vy != nodes[1].vy);
	}

	#[test]
	fn zero_theta_matches_pairwise_sum() {
		let mut nodes: Vec<_> = (0..60)
			.map(|i| node_at((i % 8) as f64 * 17.0 + 3.0, (i / 8) as f64 * 23.0 + 1.0))
			.collect();
		let expected: Vec<_> = (0..nodes.len())
			.map(|i| exact_charge(&nodes, i, -30.0))
			.collect();
		apply_many_body(&mut nodes, &mut Vec::new(), -30.0, 0.0, 1.0, &mut Jiggle::new());
		for (node, (ex, ey)) in nodes.iter().zip(expected) {
			assert!((node.vx - ex).abs() < 1e-5);
			assert!((node.vy - ey).abs() < 1e-5);
		}
	}

	#[test]
	fn distant_cluster_is_approximated_closely() {
		let mut nodes: Vec<_> = (0..40)
			.map(|i| node_at((i % 7) as f64 * 1.5, (i / 7) as f64 * 1.5))
			.collect();
		nodes.push(node_at(2000.0, 1500.0));
		let far = nodes.len() - 1;
		let (ex, ey) = exact_charge(&nodes, far, -30.0);
		apply_many_body(&mut nodes, &mut Vec::new(), -30.0, 0.9, 1.0, &mut Jiggle::new());
		let magnitude = (ex * ex + ey * ey).sqrt();
		assert!(ex > 0.0 && ey > 0.0);
		assert!((nodes[far].vx - ex).abs() < magnitude * 0.01);
		assert!((nodes[far].vy - ey).abs() < magnitude * 0.01);
	}

	#[test]
	fn center_moves_centroid_onto_target() {
		let mut nodes = vec![node_at(0.0, 0.0), node_at(10.0, 20.0), node_at(50.0, -5.0)];
		apply_center(&mut nodes, (400.0, 300.0));
		let cx = nodes.iter().map(|n| n.x).sum::<f64>() / 3.0;
		let cy = nodes.iter().map(|n| n.y).sum::<f64>() / 3.0;
		assert!((cx - 400.0).abs() < 1e-9);
		assert!((cy - 300.0).abs() < 1e-9);
		assert!((nodes[1].x - nodes[0].x - 10.0).abs() < 1e-9);
	}
}
