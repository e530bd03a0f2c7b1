use std::borrow::Cow;
use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::{EdgeInfo, ForceGraphState, NodeInfo};
use super::style::{FontStyle, NodeShape};

const BACKGROUND: &str = "#ffffff";
const ARROW_SIZE: f64 = 8.0;
const BORDER_WIDTH: f64 = 1.0;
/// Expandable nodes get a heavier outline.
const EXPANDABLE_BORDER_WIDTH: f64 = 3.0;
const LABEL_PADDING: f64 = 6.0;
/// Rough glyph advance as a fraction of the font size.
const CHAR_WIDTH: f64 = 0.6;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Truncate `label` with an ellipsis so it fits `max_width` at `font_px`.
pub fn fit_label(label: &str, font_px: f64, max_width: Option<f64>) -> Cow<'_, str> {
	let Some(max_width) = max_width else {
		return Cow::Borrowed(label);
	};
	let advance = font_px * CHAR_WIDTH;
	let fits = (max_width / advance).floor() as usize;
	if label.chars().count() <= fits {
		return Cow::Borrowed(label);
	}
	let kept: String = label.chars().take(fits.saturating_sub(1)).collect();
	Cow::Owned(format!("{}…", kept))
}

/// Half extents of a node outline. Box, ellipse and database shapes grow to
/// hold their label; dots and diamonds keep their size and label underneath.
pub fn node_extent(shape: NodeShape, radius: f64, text_width: f64, font_px: f64) -> (f64, f64) {
	match shape {
		NodeShape::Box => (
			(text_width / 2.0 + LABEL_PADDING).max(radius),
			font_px / 2.0 + LABEL_PADDING,
		),
		NodeShape::Ellipse => (
			(text_width / 2.0 + LABEL_PADDING * 2.0).max(radius),
			(font_px / 2.0 + LABEL_PADDING).max(radius * 0.6),
		),
		NodeShape::Database => (
			(text_width / 2.0 + LABEL_PADDING).max(radius),
			(font_px / 2.0 + LABEL_PADDING * 2.0).max(radius),
		),
		NodeShape::Diamond | NodeShape::Dot => (radius, radius),
	}
}

fn label_inside(shape: NodeShape) -> bool {
	matches!(shape, NodeShape::Box | NodeShape::Ellipse | NodeShape::Database)
}

/// Half extents of `info` as drawn at zoom `k`, with the label width
/// estimated from its glyph count instead of measured.
pub fn estimated_extent(info: &NodeInfo, k: f64) -> (f64, f64) {
	let style = &info.style;
	let font_px = style.font.size / k.max(0.5);
	let text_width = if label_inside(style.shape) {
		let glyphs = fit_label(&info.label, font_px, style.width_constraint)
			.chars()
			.count();
		glyphs as f64 * font_px * CHAR_WIDTH
	} else {
		0.0
	};
	node_extent(style.shape, info.radius(), text_width, font_px)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);

	state.graph.visit_edges(|n1, n2, _| {
		// the physics graph is undirected, so look the edge up both ways
		let (src, tgt, info) = match state.edge_info(n1.index(), n2.index()) {
			Some(info) => (n1, n2, info),
			None => match state.edge_info(n2.index(), n1.index()) {
				Some(info) => (n2, n1, info),
				None => return,
			},
		};
		let (x1, y1, x2, y2) = (src.x() as f64, src.y() as f64, tgt.x() as f64, tgt.y() as f64);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			return;
		}

		let is_highlighted = state.is_highlighted(src.index()) && state.is_highlighted(tgt.index());
		let (alpha, width) = match (has_highlight, is_highlighted) {
			(false, _) => (1.0, info.width),
			(true, true) => (1.0, info.width * (1.0 + 0.5 * t)),
			(true, false) => (1.0 - 0.75 * t, info.width),
		};

		let (ux, uy) = (dx / dist, dy / dist);
		let (r1, r2) = (
			src.data.user_data.radius(),
			tgt.data.user_data.radius(),
		);
		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(&info.color);
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * (r2 + ARROW_SIZE), y2 - uy * (r2 + ARROW_SIZE));
		ctx.stroke();

		ctx.set_fill_style_str(&info.color);
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
		let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		draw_edge_label(ctx, info, (x1 + x2) / 2.0, (y1 + y2) / 2.0, k);
		ctx.set_global_alpha(1.0);
	});
}

fn draw_edge_label(ctx: &CanvasRenderingContext2d, info: &EdgeInfo, x: f64, y: f64, k: f64) {
	let Some(label) = &info.label else {
		return;
	};
	let font = info.font.clone().unwrap_or_default();
	ctx.set_font(&font.css(k));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_stroke_style_str(BACKGROUND);
	ctx.set_line_width(3.0 / k);
	let _ = ctx.stroke_text(label, x, y);
	ctx.set_fill_style_str(&font.color);
	let _ = ctx.fill_text(label, x, y);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);

	state.graph.visit_nodes(|node| {
		if has_highlight && state.is_highlighted(node.index()) {
			return;
		}
		let alpha = if has_highlight { 1.0 - 0.7 * t } else { 1.0 };
		draw_node(
			ctx,
			&node.data.user_data,
			node.x() as f64,
			node.y() as f64,
			alpha,
			1.0,
			k,
		);
	});

	if !has_highlight {
		return;
	}

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		if !state.is_highlighted(idx) {
			return;
		}
		let (x, y) = (node.x() as f64, node.y() as f64);
		let info = &node.data.user_data;
		let is_hovered = state.is_hovered(idx);

		if is_hovered && t > 0.01 {
			let glow_radius = info.radius() * (1.8 + 1.2 * t);
			if let Ok(gradient) =
				ctx.create_radial_gradient(x, y, info.radius() * 0.3, x, y, glow_radius)
			{
				let _ = gradient.add_color_stop(0.0, &format!("rgba(31, 78, 121, {})", 0.25 * t));
				let _ = gradient.add_color_stop(1.0, "rgba(31, 78, 121, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		let grow = if is_hovered { 1.0 + 0.15 * t } else { 1.0 };
		draw_node(ctx, info, x, y, 1.0, grow, k);
	});
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	info: &NodeInfo,
	x: f64,
	y: f64,
	alpha: f64,
	grow: f64,
	k: f64,
) {
	let style = &info.style;
	let font_px = style.font.size / k.max(0.5);
	ctx.set_font(&style.font.css(k));
	let label = fit_label(&info.label, font_px, style.width_constraint);
	let text_width = if label_inside(style.shape) {
		ctx.measure_text(&label).map(|m| m.width()).unwrap_or(0.0)
	} else {
		0.0
	};
	let (w, h) = node_extent(style.shape, info.radius() * grow, text_width, font_px);

	ctx.set_global_alpha(alpha);
	ctx.set_fill_style_str(&style.color.background);
	ctx.set_stroke_style_str(&style.color.border);
	ctx.set_line_width(if info.expandable {
		EXPANDABLE_BORDER_WIDTH
	} else {
		BORDER_WIDTH
	});
	draw_shape(ctx, style.shape, x, y, w, h);

	let label_y = if label_inside(style.shape) {
		y
	} else {
		y + h + font_px
	};
	draw_node_label(ctx, &label, &style.font, x, label_y);
	ctx.set_global_alpha(1.0);
}

fn draw_shape(ctx: &CanvasRenderingContext2d, shape: NodeShape, x: f64, y: f64, w: f64, h: f64) {
	match shape {
		NodeShape::Box => {
			ctx.begin_path();
			ctx.rect(x - w, y - h, w * 2.0, h * 2.0);
		}
		NodeShape::Ellipse => {
			ctx.begin_path();
			let _ = ctx.ellipse(x, y, w, h, 0.0, 0.0, 2.0 * PI);
		}
		NodeShape::Diamond => {
			ctx.begin_path();
			ctx.move_to(x, y - h);
			ctx.line_to(x + w, y);
			ctx.line_to(x, y + h);
			ctx.line_to(x - w, y);
			ctx.close_path();
		}
		NodeShape::Dot => {
			ctx.begin_path();
			let _ = ctx.arc(x, y, w, 0.0, 2.0 * PI);
		}
		NodeShape::Database => {
			let lid = h * 0.25;
			ctx.begin_path();
			ctx.move_to(x - w, y - h + lid);
			ctx.line_to(x - w, y + h - lid);
			let _ = ctx.ellipse(x, y + h - lid, w, lid, 0.0, PI, 0.0);
			ctx.line_to(x + w, y - h + lid);
			let _ = ctx.ellipse(x, y - h + lid, w, lid, 0.0, 0.0, PI);
			ctx.close_path();
			ctx.fill();
			ctx.stroke();
			// top rim
			ctx.begin_path();
			let _ = ctx.ellipse(x, y - h + lid, w, lid, 0.0, 0.0, 2.0 * PI);
		}
	}
	ctx.fill();
	ctx.stroke();
}

fn draw_node_label(ctx: &CanvasRenderingContext2d, label: &str, font: &FontStyle, x: f64, y: f64) {
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(&font.color);
	let _ = ctx.fill_text(label, x, y);
}
