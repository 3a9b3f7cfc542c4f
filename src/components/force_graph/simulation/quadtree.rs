//! Barnes-Hut spatial index over node positions.

/// Points per cell before it is split.
const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) struct Point {
	pub(super) x: f64,
	pub(super) y: f64,
}

/// Axis-aligned square cell, `x0`/`y0` being its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Square {
	x0: f64,
	y0: f64,
	side: f64,
}

impl Square {
	/// Smallest power-of-two square anchored at the floored minimum corner
	/// that covers every point.
	fn cover(points: &[Point]) -> Option<Self> {
		let first = points.first()?;
		let (mut min, mut max) = (*first, *first);
		for point in points {
			if !(point.x.is_finite() && point.y.is_finite()) {
				return None;
			}
			min.x = min.x.min(point.x);
			min.y = min.y.min(point.y);
			max.x = max.x.max(point.x);
			max.y = max.y.max(point.y);
		}

		let (x0, y0) = (min.x.floor(), min.y.floor());
		let mut side = 1.0;
		while x0 + side < max.x || y0 + side < max.y {
			side *= 2.0;
		}
		Some(Self { x0, y0, side })
	}

	pub(super) fn contains(self, point: Point) -> bool {
		(self.x0..=self.x0 + self.side).contains(&point.x)
			&& (self.y0..=self.y0 + self.side).contains(&point.y)
	}

	pub(super) fn side_length(self) -> f64 {
		self.side
	}

	/// Quadrant index: bit 0 is the right half, bit 1 the lower half.
	fn quadrant(self, point: Point) -> usize {
		let half = self.side / 2.0;
		usize::from(point.x >= self.x0 + half) | usize::from(point.y >= self.y0 + half) << 1
	}

	fn child(self, quadrant: usize) -> Self {
		let half = self.side / 2.0;
		Self {
			x0: if quadrant & 1 == 0 { self.x0 } else { self.x0 + half },
			y0: if quadrant & 2 == 0 { self.y0 } else { self.y0 + half },
			side: half,
		}
	}
}

/// One cell of the tree. Only leaves keep point indices; every cell carries
/// the mass (point count) and centre of mass of everything below it.
pub(super) struct QuadNode {
	pub(super) bounds: Square,
	pub(super) center_of_mass: Point,
	pub(super) mass: f64,
	pub(super) indices: Vec<usize>,
	pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
	/// `None` when there are no points or any of them is not finite.
	pub(super) fn build(positions: &[Point]) -> Option<Self> {
		let bounds = Square::cover(positions)?;
		Some(Self::subdivide(bounds, (0..positions.len()).collect(), positions, 0))
	}

	fn subdivide(bounds: Square, indices: Vec<usize>, positions: &[Point], depth: usize) -> Self {
		let mass = indices.len() as f64;
		let sum = indices.iter().fold(Point::default(), |acc, &i| Point {
			x: acc.x + positions[i].x,
			y: acc.y + positions[i].y,
		});
		let center_of_mass = Point {
			x: sum.x / mass,
			y: sum.y / mass,
		};

		let first = positions[indices[0]];
		let coincident = indices.iter().all(|&i| positions[i] == first);
		if indices.len() <= LEAF_CAPACITY || depth == MAX_DEPTH || coincident {
			return Self {
				bounds,
				center_of_mass,
				mass,
				indices,
				children: Default::default(),
			};
		}

		let mut quadrants: [Vec<usize>; 4] = Default::default();
		for index in indices {
			quadrants[bounds.quadrant(positions[index])].push(index);
		}
		let mut children: [Option<Box<QuadNode>>; 4] = Default::default();
		for (quadrant, members) in quadrants.into_iter().enumerate() {
			if !members.is_empty() {
				children[quadrant] = Some(Box::new(Self::subdivide(
					bounds.child(quadrant),
					members,
					positions,
					depth + 1,
				)));
			}
		}

		Self {
			bounds,
			center_of_mass,
			mass,
			indices: Vec::new(),
			children,
		}
	}

	pub(super) fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn grid(n: usize) -> Vec<Point> {
		(0..n * n)
			.map(|i| Point {
				x: (i % n) as f64 * 10.0,
				y: (i / n) as f64 * 10.0,
			})
			.collect()
	}

	fn count_points(node: &QuadNode) -> usize {
		node.indices.len() + node.children.iter().flatten().map(|child| count_points(child)).sum::<usize>()
	}

	fn assert_leaves_inside(node: &QuadNode, points: &[Point]) {
		for &index in &node.indices {
			assert!(node.bounds.contains(points[index]));
		}
		for child in node.children.iter().flatten() {
			assert_eq!(child.bounds.side_length(), node.bounds.side_length() / 2.0);
			assert_leaves_inside(child, points);
		}
	}

	#[test]
	fn small_sets_stay_in_one_leaf() {
		let tree = QuadNode::build(&grid(3)).unwrap();
		assert!(tree.is_leaf());
		assert_eq!(tree.indices.len(), 9);
		assert_eq!(tree.center_of_mass, Point { x: 10.0, y: 10.0 });
	}

	#[test]
	fn cover_is_a_power_of_two_square() {
		let tree = QuadNode::build(&[Point { x: 0.5, y: 0.5 }, Point { x: 90.0, y: 3.0 }]).unwrap();
		assert_eq!(tree.bounds.side_length(), 128.0);
	}

	#[test]
	fn large_sets_split_and_keep_every_point() {
		let points = grid(10);
		let tree = QuadNode::build(&points).unwrap();
		assert!(!tree.is_leaf());
		assert!(tree.indices.is_empty());
		assert_eq!(tree.mass, 100.0);
		assert_eq!(count_points(&tree), 100);
		assert_leaves_inside(&tree, &points);
	}

	#[test]
	fn stacked_points_terminate() {
		let points = vec![Point { x: 5.0, y: 5.0 }; 40];
		let tree = QuadNode::build(&points).unwrap();
		assert!(tree.is_leaf());
		assert_eq!(count_points(&tree), 40);
	}

	#[test]
	fn non_finite_positions_build_nothing() {
		assert!(QuadNode::build(&[Point { x: f64::NAN, y: 0.0 }]).is_none());
		assert!(QuadNode::build(&[]).is_none());
	}
}
