//! Frame scheduling.
//!
//! A surface never loops on its own: it asks a [`FrameScheduler`] to run a
//! callback before the next repaint and gets back a handle it can cancel.
//! In the browser this is `requestAnimationFrame`; headless hosts use
//! [`FrameQueue`](super::headless::FrameQueue).

use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

/// Identifies one pending frame request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Callback run for one frame; receives the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Something that can run a callback once, right before the next repaint.
pub trait FrameScheduler {
	/// Requests `callback` for the next frame. `None` means the request
	/// could not be made and the callback will never run.
	fn request_frame(&self, callback: FrameCallback) -> Option<FrameHandle>;

	/// Cancels a pending request. Unknown or already-run handles are ignored.
	fn cancel_frame(&self, handle: FrameHandle);
}

/// Browser scheduler backed by `requestAnimationFrame`.
pub struct AnimationFrameScheduler {
	window: Window,
}

impl AnimationFrameScheduler {
	pub fn new() -> Option<Self> {
		Some(Self {
			window: web_sys::window()?,
		})
	}
}

impl FrameScheduler for AnimationFrameScheduler {
	fn request_frame(&self, callback: FrameCallback) -> Option<FrameHandle> {
		// Frees itself after running. A cancelled request leaks this one
		// closure, which only happens once per stop.
		let closure = Closure::once_into_js(callback);
		match self
			.window
			.request_animation_frame(closure.unchecked_ref())
		{
			Ok(id) => Some(FrameHandle(id)),
			Err(e) => {
				warn!("portal-particles: requestAnimationFrame failed: {:?}", e);
				None
			}
		}
	}

	fn cancel_frame(&self, handle: FrameHandle) {
		if let Err(e) = self.window.cancel_animation_frame(handle.0) {
			warn!("portal-particles: cancelAnimationFrame failed: {:?}", e);
		}
	}
}
