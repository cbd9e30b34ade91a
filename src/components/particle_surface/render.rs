//! Drawing for particle surfaces.
//!
//! A frame is drawn in two passes:
//! 1. Clear the surface, or lay a low-alpha background fill for trails
//! 2. Each live particle as a filled circle, optionally with a radial glow
//! 3. Connection lines, when configured

use std::f64::consts::PI;

use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::particles::ParticleSystem;
use super::theme::Color;

/// A 2D raster area that can be cleared and painted with simple shapes.
pub trait DrawingSurface {
	/// Whether the surface can still be drawn on. Checked at the top of
	/// every frame; once false the loop stops.
	fn is_available(&self) -> bool;

	/// Current size in device pixels.
	fn size(&self) -> (f64, f64);

	fn clear(&mut self, width: f64, height: f64);

	fn fill_rect(&mut self, width: f64, height: f64, color: Color);

	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Color);

	/// Fills a circle of `radius` with a radial gradient running from the
	/// center to `glow_radius`. `stops` are `(offset, color)` pairs.
	fn fill_glow(&mut self, x: f64, y: f64, radius: f64, glow_radius: f64, stops: &[(f64, Color)]);

	fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color);
}

/// Draws the current state of `system` onto `surface`.
pub fn draw_frame<S: DrawingSurface + ?Sized>(
	surface: &mut S,
	system: &ParticleSystem,
	progress: f64,
) {
	let config = system.config();
	let (width, height) = system.size();

	match config.trail {
		Some(alpha) => surface.fill_rect(width, height, config.background.with_alpha(alpha)),
		None => surface.clear(width, height),
	}

	for p in &system.particles {
		let (opacity, radius) = system.appearance(p, progress);
		if opacity <= 0.0 || radius <= 0.0 {
			continue;
		}

		match &config.glow {
			Some(glow) => {
				let stops = glow.stops(config.color, opacity);
				surface.fill_glow(p.x, p.y, radius, radius * glow.radius_scale, &stops);
			}
			None => surface.fill_circle(p.x, p.y, radius, config.color.with_alpha(opacity)),
		}
	}

	if let Some(style) = &config.connections {
		for c in system.connections.iter().filter(|c| c.opacity > 0.0) {
			surface.stroke_line(
				(c.x1, c.y1),
				(c.x2, c.y2),
				style.line_width,
				style.color.with_alpha(c.opacity),
			);
		}
	}
}

/// [`DrawingSurface`] over an HTML canvas and its 2D context.
pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	/// Binds to `canvas`, or `None` if it has no 2D context.
	pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
		let ctx: CanvasRenderingContext2d = canvas.get_context("2d").ok()??.dyn_into().ok()?;
		Some(Self { canvas, ctx })
	}

	pub fn canvas(&self) -> &HtmlCanvasElement {
		&self.canvas
	}
}

impl DrawingSurface for CanvasSurface {
	fn is_available(&self) -> bool {
		self.canvas.is_connected()
	}

	fn size(&self) -> (f64, f64) {
		(self.canvas.width() as f64, self.canvas.height() as f64)
	}

	fn clear(&mut self, width: f64, height: f64) {
		self.ctx.clear_rect(0.0, 0.0, width, height);
	}

	fn fill_rect(&mut self, width: f64, height: f64, color: Color) {
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.fill_rect(0.0, 0.0, width, height);
	}

	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Color) {
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, radius, 0.0, PI * 2.0);
		self.ctx.fill();
	}

	fn fill_glow(&mut self, x: f64, y: f64, radius: f64, glow_radius: f64, stops: &[(f64, Color)]) {
		let gradient = match self.ctx.create_radial_gradient(x, y, 0.0, x, y, glow_radius) {
			Ok(gradient) => gradient,
			Err(e) => {
				warn!("portal-particles: createRadialGradient failed: {:?}", e);
				return;
			}
		};
		for (offset, color) in stops {
			let _ = gradient.add_color_stop(*offset as f32, &color.to_css());
		}

		#[allow(deprecated)]
		self.ctx.set_fill_style(&gradient);
		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, radius, 0.0, PI * 2.0);
		self.ctx.fill();
	}

	fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color) {
		self.ctx.set_stroke_style_str(&color.to_css());
		self.ctx.set_line_width(width);
		self.ctx.begin_path();
		self.ctx.move_to(from.0, from.1);
		self.ctx.line_to(to.0, to.1);
		self.ctx.stroke();
	}
}
