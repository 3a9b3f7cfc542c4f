use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::labels::LabelState;
use super::scene::{EdgePrimitive, LABEL_FONT, LABEL_LINE_HEIGHT};
use super::state::Frame;

const BACKGROUND: &str = "#1a1a2e";
const EDGE_COLOR: &str = "rgba(100, 180, 255, 0.6)";
const ARROW_COLOR: &str = "rgba(100, 180, 255, 0.8)";
const EDGE_WIDTH: f64 = 1.5;
const DASH: f64 = 6.0;

pub fn render(frame: &Frame<'_>, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, frame.surface.width, frame.surface.height);
	draw_edges(frame, ctx);
	draw_nodes(frame, ctx);
	draw_labels(frame, ctx);
}

fn set_dash(ctx: &CanvasRenderingContext2d, dashed: bool) {
	let pattern = if dashed {
		js_sys::Array::of2(&JsValue::from_f64(DASH), &JsValue::from_f64(DASH))
	} else {
		js_sys::Array::new()
	};
	let _ = ctx.set_line_dash(&pattern);
}

fn touches(edge: &EdgePrimitive, node: Option<usize>) -> bool {
	node.is_some_and(|node| edge.source == node || edge.target == node)
}

fn draw_edges(frame: &Frame<'_>, ctx: &CanvasRenderingContext2d) {
	ctx.set_line_width(EDGE_WIDTH);
	for edge in frame.scene.edges.iter().filter(|edge| edge.visible) {
		// Links of the node being dragged are dashed.
		set_dash(ctx, touches(edge, frame.dragged));
		ctx.set_stroke_style_str(EDGE_COLOR);
		ctx.begin_path();
		ctx.move_to(edge.start.0, edge.start.1);
		ctx.line_to(edge.end.0, edge.end.1);
		ctx.stroke();

		let [tip, left, right] = edge.arrow;
		ctx.set_fill_style_str(ARROW_COLOR);
		ctx.begin_path();
		ctx.move_to(tip.0, tip.1);
		ctx.line_to(left.0, left.1);
		ctx.line_to(right.0, right.1);
		ctx.close_path();
		ctx.fill();
	}
	set_dash(ctx, false);
}

fn draw_nodes(frame: &Frame<'_>, ctx: &CanvasRenderingContext2d) {
	for (idx, marker) in frame.scene.markers.iter().enumerate() {
		let (x, y) = marker.center;
		ctx.begin_path();
		let _ = ctx.arc(x, y, marker.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&marker.fill.to_string());
		ctx.fill();

		if marker.pinned || frame.hover == Some(idx) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, marker.radius + 2.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_line_width(1.5);
			ctx.stroke();
		}
	}
}

fn draw_labels(frame: &Frame<'_>, ctx: &CanvasRenderingContext2d) {
	ctx.set_font(LABEL_FONT);
	ctx.set_text_baseline("top");
	for label in &frame.scene.labels {
		let (x, y) = label.origin;
		if label.state == LabelState::Expanded {
			ctx.set_fill_style_str("rgba(0, 0, 0, 0.55)");
			ctx.fill_rect(x - 4.0, y - 2.0, label.width + 8.0, label.height + 4.0);
		}
		ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
		for (line_idx, line) in label.lines.iter().enumerate() {
			let _ = ctx.fill_text(line, x, y + line_idx as f64 * LABEL_LINE_HEIGHT);
		}
	}
}
