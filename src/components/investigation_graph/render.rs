use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::controller::{InteractionController, Selection};
use super::types::{Node, Point};

const GRID_MINOR: f64 = 20.0;
const GRID_MAJOR: f64 = 100.0;
const MINIMAP_W: f64 = 192.0;
const MINIMAP_H: f64 = 128.0;
/// The minimap shows model space at 1/5 scale inside an 800x600 box.
const MINIMAP_SCALE: f64 = 5.0;

pub fn render(ctl: &InteractionController, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(0.0, 0.0, width, height);
	draw_grid(ctx, width, height);

	let view = ctl.view();
	ctx.save();
	let _ = ctx.translate(view.pan.x, view.pan.y);
	let _ = ctx.scale(view.zoom, view.zoom);
	draw_connections(ctl, ctx);
	draw_nodes(ctl, ctx);
	ctx.restore();

	if !ctl.store().nodes().is_empty() {
		draw_minimap(ctl, ctx, width, height);
	}
}

fn draw_grid(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	for (step, color) in [(GRID_MINOR, "#f3f4f6"), (GRID_MAJOR, "#e5e7eb")] {
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(1.0);
		ctx.begin_path();
		let mut x = 0.0;
		while x <= width {
			ctx.move_to(x + 0.5, 0.0);
			ctx.line_to(x + 0.5, height);
			x += step;
		}
		let mut y = 0.0;
		while y <= height {
			ctx.move_to(0.0, y + 0.5);
			ctx.line_to(width, y + 0.5);
			y += step;
		}
		ctx.stroke();
	}
}

fn draw_connections(ctl: &InteractionController, ctx: &CanvasRenderingContext2d) {
	let store = ctl.store();
	let radius = ctl.config().node_radius;
	let arrow_size = 10.0;

	for conn in store.connections() {
		let (Some(a), Some(b)) = (store.node(&conn.source), store.node(&conn.target)) else {
			continue;
		};
		let (p1, p2) = (a.position, b.position);
		let dist = p1.distance(p2);
		if dist < 0.001 {
			continue;
		}

		let selected = *ctl.selection() == Selection::Connection(conn.id.clone());
		let color = if selected { "#3B82F6" } else { "#6B7280" };
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(if selected { 3.0 } else { 2.0 });

		let (ux, uy) = ((p2.x - p1.x) / dist, (p2.y - p1.y) / dist);
		ctx.begin_path();
		ctx.move_to(p1.x + ux * radius, p1.y + uy * radius);
		ctx.line_to(p2.x - ux * (radius + arrow_size), p2.y - uy * (radius + arrow_size));
		ctx.stroke();

		ctx.set_fill_style_str(color);
		let (tip_x, tip_y) = (p2.x - ux * radius, p2.y - uy * radius);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		if !conn.label.is_empty() {
			ctx.set_fill_style_str("#374151");
			ctx.set_font("12px sans-serif");
			ctx.set_text_align("center");
			let _ = ctx.fill_text(&conn.label, (p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0 - 4.0);
		}
	}
}

fn node_stroke(ctl: &InteractionController, node: &Node) -> (&'static str, f64) {
	if ctl.dragged_node() == Some(&node.id) {
		("#FF0000", 4.0)
	} else if ctl.pending_source() == Some(&node.id) {
		("#00FF00", 4.0)
	} else if *ctl.selection() == Selection::Node(node.id.clone()) {
		("#3B82F6", 4.0)
	} else if ctl.is_connecting() {
		("#FFA500", 2.0)
	} else {
		("#ffffff", 2.0)
	}
}

fn draw_nodes(ctl: &InteractionController, ctx: &CanvasRenderingContext2d) {
	let radius = ctl.config().node_radius;
	let connecting = ctl.is_connecting();

	for node in ctl.store().nodes() {
		let Point { x, y } = node.position;
		let dragged = ctl.dragged_node() == Some(&node.id);
		let (stroke, stroke_width) = node_stroke(ctl, node);

		ctx.set_global_alpha(if dragged { 0.8 } else { 1.0 });
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.kind.color());
		ctx.fill();
		ctx.set_stroke_style_str(stroke);
		ctx.set_line_width(stroke_width);
		ctx.stroke();
		ctx.set_global_alpha(1.0);

		if connecting {
			let is_source = ctl.pending_source() == Some(&node.id);
			ctx.set_global_alpha(0.7);
			ctx.set_stroke_style_str(if is_source { "#00FF00" } else { "#FFA500" });
			ctx.set_line_width(2.0);
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(5.0),
				&JsValue::from_f64(5.0),
			));
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 5.0, 0.0, 2.0 * PI);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			ctx.set_global_alpha(1.0);
		}

		// kind initial stands in for an icon
		ctx.set_fill_style_str("white");
		ctx.set_font("bold 16px sans-serif");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let initial = node.kind.label().chars().next().unwrap_or('?').to_string();
		let _ = ctx.fill_text(&initial, x, y);
		ctx.set_text_baseline("alphabetic");

		ctx.set_fill_style_str("#374151");
		ctx.set_font("500 12px sans-serif");
		let _ = ctx.fill_text(&node.data.label, x, y + radius + 20.0);
	}
}

fn draw_minimap(ctl: &InteractionController, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	let origin = Point::new(width - MINIMAP_W - 16.0, height - MINIMAP_H - 16.0);
	let k = (MINIMAP_W / 800.0).min(MINIMAP_H / 600.0) / MINIMAP_SCALE;
	let to_map = |p: Point| origin + p.scale(k);

	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(origin.x, origin.y, MINIMAP_W, MINIMAP_H);
	ctx.set_stroke_style_str("#e5e7eb");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(origin.x, origin.y, MINIMAP_W, MINIMAP_H);

	ctx.save();
	ctx.begin_path();
	ctx.rect(origin.x, origin.y, MINIMAP_W, MINIMAP_H);
	ctx.clip();

	let store = ctl.store();
	ctx.set_global_alpha(0.5);
	ctx.set_stroke_style_str("#6B7280");
	for conn in store.connections() {
		if let (Some(a), Some(b)) = (store.node(&conn.source), store.node(&conn.target)) {
			let (p1, p2) = (to_map(a.position), to_map(b.position));
			ctx.begin_path();
			ctx.move_to(p1.x, p1.y);
			ctx.line_to(p2.x, p2.y);
			ctx.stroke();
		}
	}
	ctx.set_global_alpha(0.7);
	for node in store.nodes() {
		let p = to_map(node.position);
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, 2.0, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.kind.color());
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
	ctx.restore();
}
