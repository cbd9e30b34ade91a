//! Surface lifecycle and the frame loop.
//!
//! [`ParticleSurface`] owns a drawing surface and a particle batch and keeps
//! a single pending frame request alive while running. Each frame updates,
//! draws, reports to the frame hook, and either requests the next frame or,
//! for terminating modes, stops and fires completion (after the configured
//! delay, if any).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, warn};

use super::error::ConfigResult;
use super::particles::{Connection, FrameInput, Particle, ParticleSystem};
use super::render::{self, DrawingSurface};
use super::schedule::{FrameHandle, FrameScheduler};
use super::types::{MotionMode, SurfaceConfig};

/// What the frame hook sees after each drawn frame.
#[derive(Debug)]
pub struct FrameInfo<'a> {
	/// Milliseconds since the first frame after `start`.
	pub elapsed_ms: f64,
	/// Fraction of the configured duration elapsed (0 for drift-wrap).
	pub progress: f64,
	/// Particles as drawn this frame.
	pub particles: &'a [Particle],
}

type CompleteHook = Box<dyn FnMut()>;
type FrameHook = Box<dyn FnMut(&FrameInfo<'_>)>;

struct SurfaceState<S> {
	surface: S,
	system: ParticleSystem,
	running: bool,
	pending: Option<FrameHandle>,
	started_at: Option<f64>,
	pointer: Option<(f64, f64)>,
	/// Completion already fired (or is waiting out its delay) for the
	/// current burst.
	completed: bool,
	/// Timestamp at which a delayed completion fires.
	completion_due: Option<f64>,
	/// Bumped by every `start`, so a frame can tell it was restarted under it.
	generation: u64,
	frames: u64,
	on_complete: Option<CompleteHook>,
	on_frame: Option<FrameHook>,
}

/// Result of running one frame body.
enum Step {
	Idle,
	Continue { elapsed_ms: f64, progress: f64 },
	Finish { elapsed_ms: f64, progress: f64 },
}

/// A self-contained particle animation bound to one drawing surface.
///
/// All methods take `&self`; the surface is meant to be shared with event
/// handlers through an `Rc`. Dropping it stops the loop.
pub struct ParticleSurface<S: DrawingSurface + 'static> {
	state: Rc<RefCell<SurfaceState<S>>>,
	scheduler: Rc<dyn FrameScheduler>,
}

impl<S: DrawingSurface + 'static> ParticleSurface<S> {
	/// Validates `config` and binds it to `surface`, sized from the surface.
	pub fn new(
		surface: S,
		config: SurfaceConfig,
		scheduler: Rc<dyn FrameScheduler>,
	) -> ConfigResult<Self> {
		config.validate()?;
		let (width, height) = surface.size();
		let system = ParticleSystem::new(&config, width, height);

		Ok(Self {
			state: Rc::new(RefCell::new(SurfaceState {
				surface,
				system,
				running: false,
				pending: None,
				started_at: None,
				pointer: None,
				completed: false,
				completion_due: None,
				generation: 0,
				frames: 0,
				on_complete: None,
				on_frame: None,
			})),
			scheduler,
		})
	}

	/// Spawns the batch and starts the loop. No-op while running.
	pub fn start(&self) {
		{
			let mut state = self.state.borrow_mut();
			if state.running {
				return;
			}
			// Drops a completion still waiting out its delay.
			halt(&mut *state, &*self.scheduler);
			state.running = true;
			state.generation += 1;
			state.completed = false;
			state.started_at = None;
			state.system.spawn();
			debug!(
				"portal-particles: starting {} surface with {} particles",
				state.system.mode(),
				state.system.len()
			);
		}
		request_next(&self.state, &self.scheduler);
	}

	/// Cancels the pending frame (or delayed completion) and drops all
	/// particles. Safe to call at any time, any number of times.
	pub fn stop(&self) {
		let mut state = self.state.borrow_mut();
		halt(&mut *state, &*self.scheduler);
	}

	/// Updates the bounds used for wraparound and viewport-relative targets.
	/// Takes effect on the next frame; nothing is redrawn here.
	pub fn resize(&self, width: f64, height: f64) {
		self.state.borrow_mut().system.resize(width, height);
	}

	/// Sets the pointer position used for parallax, `None` when it left.
	pub fn set_pointer(&self, pointer: Option<(f64, f64)>) {
		self.state.borrow_mut().pointer = pointer;
	}

	/// Registers the completion callback for terminating modes.
	///
	/// Fires once per burst, after the last particle is gone or the
	/// duration elapsed, plus `complete_delay_ms`. Never fires for
	/// drift-wrap, nor when the loop is stopped, restarted or dropped first,
	/// nor when the surface goes away.
	pub fn on_complete(&self, callback: impl FnMut() + 'static) {
		let mut state = self.state.borrow_mut();
		if !state.system.mode().is_terminating() {
			debug!("portal-particles: completion callback on a drift-wrap surface never fires");
		}
		state.on_complete = Some(Box::new(callback));
	}

	/// Registers a hook run after every drawn frame.
	///
	/// The hook sees a snapshot of the frame's particles and may call back
	/// into the surface, including `stop`, `start` and `resize`.
	pub fn on_frame(&self, callback: impl FnMut(&FrameInfo<'_>) + 'static) {
		self.state.borrow_mut().on_frame = Some(Box::new(callback));
	}

	pub fn is_running(&self) -> bool {
		self.state.borrow().running
	}

	pub fn mode(&self) -> MotionMode {
		self.state.borrow().system.mode()
	}

	pub fn particle_count(&self) -> usize {
		self.state.borrow().system.len()
	}

	/// Bounds currently used for wraparound.
	pub fn size(&self) -> (f64, f64) {
		self.state.borrow().system.size()
	}

	/// Frames drawn since construction.
	pub fn frames_drawn(&self) -> u64 {
		self.state.borrow().frames
	}

	/// Snapshot of the live particles.
	pub fn particles(&self) -> Vec<Particle> {
		self.state.borrow().system.particles.clone()
	}

	/// Snapshot of the connection lines.
	pub fn connections(&self) -> Vec<Connection> {
		self.state.borrow().system.connections.clone()
	}
}

impl<S: DrawingSurface + 'static> Drop for ParticleSurface<S> {
	fn drop(&mut self) {
		if let Ok(mut state) = self.state.try_borrow_mut() {
			halt(&mut *state, &*self.scheduler);
		}
	}
}

fn halt<S>(state: &mut SurfaceState<S>, scheduler: &dyn FrameScheduler) {
	state.running = false;
	state.completion_due = None;
	if let Some(handle) = state.pending.take() {
		scheduler.cancel_frame(handle);
	}
	state.system.clear();
}

type FrameBody<S> = fn(&Rc<RefCell<SurfaceState<S>>>, &Rc<dyn FrameScheduler>, f64);

/// Requests `body` for the next frame and records the handle as pending.
/// Returns false when the scheduler refused.
fn schedule<S: DrawingSurface + 'static>(
	state: &Rc<RefCell<SurfaceState<S>>>,
	scheduler: &Rc<dyn FrameScheduler>,
	body: FrameBody<S>,
) -> bool {
	let weak_state: Weak<RefCell<SurfaceState<S>>> = Rc::downgrade(state);
	let weak_scheduler: Weak<dyn FrameScheduler> = Rc::downgrade(scheduler);
	let handle = scheduler.request_frame(Box::new(move |timestamp| {
		if let (Some(state), Some(scheduler)) = (weak_state.upgrade(), weak_scheduler.upgrade()) {
			body(&state, &scheduler, timestamp);
		}
	}));

	let scheduled = handle.is_some();
	state.borrow_mut().pending = handle;
	scheduled
}

fn request_next<S: DrawingSurface + 'static>(
	state: &Rc<RefCell<SurfaceState<S>>>,
	scheduler: &Rc<dyn FrameScheduler>,
) {
	if !schedule(state, scheduler, run_frame::<S>) {
		warn!("portal-particles: could not schedule a frame, stopping");
		let mut state = state.borrow_mut();
		state.running = false;
		state.system.clear();
	}
}

fn run_frame<S: DrawingSurface + 'static>(
	state_rc: &Rc<RefCell<SurfaceState<S>>>,
	scheduler: &Rc<dyn FrameScheduler>,
	timestamp: f64,
) {
	let (outcome, generation) = {
		let mut state = state_rc.borrow_mut();
		(step(&mut *state, timestamp), state.generation)
	};
	let (elapsed_ms, progress, finished) = match outcome {
		Step::Idle => return,
		Step::Continue {
			elapsed_ms,
			progress,
		} => (elapsed_ms, progress, false),
		Step::Finish {
			elapsed_ms,
			progress,
		} => (elapsed_ms, progress, true),
	};

	report_frame(state_rc, elapsed_ms, progress);

	let (running, pending) = {
		let state = state_rc.borrow();
		if state.generation != generation {
			// The hook restarted the surface; the new run owns the loop.
			return;
		}
		(state.running, state.pending.is_some())
	};
	if finished {
		complete(state_rc, scheduler, timestamp);
	} else if running && !pending {
		request_next(state_rc, scheduler);
	}
}

/// Update and draw one frame. Runs entirely under the state borrow.
fn step<S: DrawingSurface>(state: &mut SurfaceState<S>, timestamp: f64) -> Step {
	state.pending = None;
	if !state.running {
		return Step::Idle;
	}
	if !state.surface.is_available() {
		debug!("portal-particles: surface detached, stopping quietly");
		state.running = false;
		state.system.clear();
		return Step::Idle;
	}

	let started_at = *state.started_at.get_or_insert(timestamp);
	let elapsed_ms = (timestamp - started_at).max(0.0);
	let mode = state.system.mode();
	let duration = state.system.config().duration_ms;
	let progress = if mode.is_terminating() {
		(elapsed_ms / duration).min(1.0)
	} else {
		0.0
	};

	let pointer = state.pointer;
	state.system.update(FrameInput { progress, pointer });
	render::draw_frame(&mut state.surface, &state.system, progress);
	state.frames += 1;

	if mode.is_terminating() && (state.system.is_empty() || elapsed_ms >= duration) {
		Step::Finish {
			elapsed_ms,
			progress,
		}
	} else {
		Step::Continue {
			elapsed_ms,
			progress,
		}
	}
}

/// Runs the frame hook on a snapshot of the particles, without holding the
/// state borrow, so the hook may call back into the surface.
fn report_frame<S>(state_rc: &Rc<RefCell<SurfaceState<S>>>, elapsed_ms: f64, progress: f64) {
	let (mut hook, particles) = {
		let mut state = state_rc.borrow_mut();
		let Some(hook) = state.on_frame.take() else {
			return;
		};
		(hook, state.system.particles.clone())
	};

	hook(&FrameInfo {
		elapsed_ms,
		progress,
		particles: &particles,
	});

	let mut state = state_rc.borrow_mut();
	if state.on_frame.is_none() {
		state.on_frame = Some(hook);
	}
}

/// Ends a finished burst: stops the loop, then fires completion right away
/// or once `complete_delay_ms` has passed.
fn complete<S: DrawingSurface + 'static>(
	state_rc: &Rc<RefCell<SurfaceState<S>>>,
	scheduler: &Rc<dyn FrameScheduler>,
	timestamp: f64,
) {
	let delay = {
		let mut state = state_rc.borrow_mut();
		let was_running = state.running;
		halt(&mut *state, &**scheduler);
		if !was_running || state.completed {
			return;
		}
		state.completed = true;
		state.system.config().complete_delay_ms
	};

	if delay > 0.0 {
		state_rc.borrow_mut().completion_due = Some(timestamp + delay);
		if schedule(state_rc, scheduler, wait_for_completion::<S>) {
			return;
		}
		warn!("portal-particles: could not schedule delayed completion, completing now");
		state_rc.borrow_mut().completion_due = None;
	}
	fire_complete(state_rc);
}

fn wait_for_completion<S: DrawingSurface + 'static>(
	state_rc: &Rc<RefCell<SurfaceState<S>>>,
	scheduler: &Rc<dyn FrameScheduler>,
	timestamp: f64,
) {
	let due = {
		let mut state = state_rc.borrow_mut();
		state.pending = None;
		state.completion_due
	};
	// Cleared by stop, start or drop while waiting.
	let Some(due) = due else {
		return;
	};
	if timestamp < due {
		if schedule(state_rc, scheduler, wait_for_completion::<S>) {
			return;
		}
		warn!("portal-particles: could not schedule delayed completion, completing now");
	}
	state_rc.borrow_mut().completion_due = None;
	fire_complete(state_rc);
}

fn fire_complete<S>(state_rc: &Rc<RefCell<SurfaceState<S>>>) {
	let Some(mut callback) = state_rc.borrow_mut().on_complete.take() else {
		return;
	};
	debug!("portal-particles: burst complete");
	callback();
	let mut state = state_rc.borrow_mut();
	if state.on_complete.is_none() {
		state.on_complete = Some(callback);
	}
}
