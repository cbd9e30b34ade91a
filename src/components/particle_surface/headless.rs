//! Browser-free scheduler and surface.
//!
//! [`FrameQueue`] advances a fixed timestep on demand and [`HeadlessSurface`]
//! records what would have been painted. Together they drive a
//! [`ParticleSurface`](super::ParticleSurface) deterministically, outside a
//! browser.

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;

use super::render::DrawingSurface;
use super::schedule::{FrameCallback, FrameHandle, FrameScheduler};
use super::theme::Color;
use super::types::FRAME_MS;

struct QueueState {
	next_id: i32,
	now: f64,
	step_ms: f64,
	pending: Vec<(FrameHandle, FrameCallback)>,
}

/// Manually advanced [`FrameScheduler`].
pub struct FrameQueue {
	state: RefCell<QueueState>,
}

impl Default for FrameQueue {
	fn default() -> Self {
		Self::new(FRAME_MS)
	}
}

impl FrameQueue {
	/// A queue whose clock moves `step_ms` per [`advance`](Self::advance).
	pub fn new(step_ms: f64) -> Self {
		Self {
			state: RefCell::new(QueueState {
				next_id: 1,
				now: 0.0,
				step_ms,
				pending: Vec::new(),
			}),
		}
	}

	/// Timestamp passed to the most recent frame.
	pub fn now(&self) -> f64 {
		self.state.borrow().now
	}

	/// Number of requests waiting for the next frame.
	pub fn pending(&self) -> usize {
		self.state.borrow().pending.len()
	}

	/// Moves the clock one step and runs every callback requested before
	/// this call. Requests made by those callbacks wait for the next
	/// advance. Returns how many callbacks ran.
	pub fn advance(&self) -> usize {
		let (now, due) = {
			let mut state = self.state.borrow_mut();
			state.now += state.step_ms;
			(state.now, mem::take(&mut state.pending))
		};
		let ran = due.len();
		for (_, callback) in due {
			callback(now);
		}
		ran
	}

	/// Advances `frames` times, returning the total callbacks run.
	pub fn advance_by(&self, frames: usize) -> usize {
		(0..frames).map(|_| self.advance()).sum()
	}
}

impl FrameScheduler for FrameQueue {
	fn request_frame(&self, callback: FrameCallback) -> Option<FrameHandle> {
		let mut state = self.state.borrow_mut();
		let handle = FrameHandle(state.next_id);
		state.next_id += 1;
		state.pending.push((handle, callback));
		Some(handle)
	}

	fn cancel_frame(&self, handle: FrameHandle) {
		self.state
			.borrow_mut()
			.pending
			.retain(|(pending, _)| *pending != handle);
	}
}

/// One recorded paint operation.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
	Clear {
		width: f64,
		height: f64,
	},
	Rect {
		width: f64,
		height: f64,
		color: Color,
	},
	Circle {
		x: f64,
		y: f64,
		radius: f64,
		color: Color,
	},
	Glow {
		x: f64,
		y: f64,
		radius: f64,
		glow_radius: f64,
		stops: Vec<(f64, Color)>,
	},
	Line {
		from: (f64, f64),
		to: (f64, f64),
		width: f64,
		color: Color,
	},
}

impl DrawCommand {
	/// Whether this paints a particle (as opposed to clearing).
	pub fn is_particle(&self) -> bool {
		matches!(self, DrawCommand::Circle { .. } | DrawCommand::Glow { .. })
	}

	/// Peak alpha painted by a particle command.
	pub fn alpha(&self) -> Option<f64> {
		match self {
			DrawCommand::Circle { color, .. } => Some(color.a),
			DrawCommand::Glow { stops, .. } => stops.iter().map(|(_, c)| c.a).reduce(f64::max),
			_ => None,
		}
	}
}

/// Recording [`DrawingSurface`].
///
/// Clones share the same log and availability flag, so a test can keep one
/// clone while the surface owns the other.
#[derive(Clone)]
pub struct HeadlessSurface {
	width: f64,
	height: f64,
	log: Rc<RefCell<Vec<DrawCommand>>>,
	available: Rc<Cell<bool>>,
}

impl HeadlessSurface {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			log: Rc::new(RefCell::new(Vec::new())),
			available: Rc::new(Cell::new(true)),
		}
	}

	/// Simulates the backing element being removed.
	pub fn detach(&self) {
		self.available.set(false);
	}

	/// Drains and returns everything recorded so far.
	pub fn take_commands(&self) -> Vec<DrawCommand> {
		mem::take(&mut *self.log.borrow_mut())
	}

	pub fn command_count(&self) -> usize {
		self.log.borrow().len()
	}

	/// Number of clears (or trail fills) recorded, one per drawn frame.
	pub fn frames_drawn(&self) -> usize {
		self.log
			.borrow()
			.iter()
			.filter(|c| matches!(c, DrawCommand::Clear { .. } | DrawCommand::Rect { .. }))
			.count()
	}
}

impl DrawingSurface for HeadlessSurface {
	fn is_available(&self) -> bool {
		self.available.get()
	}

	fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	fn clear(&mut self, width: f64, height: f64) {
		self.log.borrow_mut().push(DrawCommand::Clear { width, height });
	}

	fn fill_rect(&mut self, width: f64, height: f64, color: Color) {
		self.log.borrow_mut().push(DrawCommand::Rect {
			width,
			height,
			color,
		});
	}

	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Color) {
		self.log.borrow_mut().push(DrawCommand::Circle {
			x,
			y,
			radius,
			color,
		});
	}

	fn fill_glow(&mut self, x: f64, y: f64, radius: f64, glow_radius: f64, stops: &[(f64, Color)]) {
		self.log.borrow_mut().push(DrawCommand::Glow {
			x,
			y,
			radius,
			glow_radius,
			stops: stops.to_vec(),
		});
	}

	fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color) {
		self.log.borrow_mut().push(DrawCommand::Line {
			from,
			to,
			width,
			color,
		});
	}
}
