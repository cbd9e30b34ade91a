//! Leptos component wrapping a particle surface canvas.
//!
//! The component creates a fullscreen canvas, binds a [`ParticleSurface`] to
//! it once mounted, and wires window `resize` (and optionally `mousemove`
//! for parallax) listeners. The loop runs via `requestAnimationFrame` until
//! the component is cleaned up, which stops it and removes the listeners.

use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent, Window};

use super::render::CanvasSurface;
use super::schedule::AnimationFrameScheduler;
use super::state::ParticleSurface;
use super::types::SurfaceConfig;

/// Everything that has to be torn down when the component goes away.
struct Mounted {
	window: Window,
	particles: Rc<ParticleSurface<CanvasSurface>>,
	on_resize: Closure<dyn FnMut()>,
	on_pointer: Option<Closure<dyn FnMut(MouseEvent)>>,
}

impl Drop for Mounted {
	fn drop(&mut self) {
		self.particles.stop();
		let _ = self
			.window
			.remove_event_listener_with_callback("resize", self.on_resize.as_ref().unchecked_ref());
		if let Some(ref cb) = self.on_pointer {
			let _ = self
				.window
				.remove_event_listener_with_callback("mousemove", cb.as_ref().unchecked_ref());
		}
	}
}

fn viewport_size(window: &Window) -> (f64, f64) {
	let width = window
		.inner_width()
		.ok()
		.and_then(|v| v.as_f64())
		.unwrap_or(800.0);
	let height = window
		.inner_height()
		.ok()
		.and_then(|v| v.as_f64())
		.unwrap_or(600.0);
	(width, height)
}

/// Current viewport width, for picking responsive presets.
pub fn viewport_width() -> f64 {
	web_sys::window()
		.map(|w| viewport_size(&w).0)
		.unwrap_or(1024.0)
}

/// Renders a fullscreen particle animation behind its siblings.
///
/// The canvas always fills the viewport and follows window resizes. Set
/// `track_pointer` to feed the cursor position into parallax. For burst and
/// convergence configs, `on_complete` runs once the animation finishes.
#[component]
pub fn ParticleCanvas(
	config: SurfaceConfig,
	#[prop(optional, into)] on_complete: Option<Callback<()>>,
	#[prop(default = false)] track_pointer: bool,
	#[prop(default = "particle-canvas")] class: &'static str,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let mounted = StoredValue::new_local(None::<Mounted>);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if mounted.with_value(Option::is_some) {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = viewport_size(&window);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(surface) = CanvasSurface::new(canvas.clone()) else {
			warn!("portal-particles: canvas has no 2d context");
			return;
		};
		let Some(scheduler) = AnimationFrameScheduler::new() else {
			return;
		};

		let mut config = config.clone();
		config.seed.get_or_insert_with(|| js_sys::Date::now() as u64);

		let particles = match ParticleSurface::new(surface, config, Rc::new(scheduler)) {
			Ok(particles) => Rc::new(particles),
			Err(e) => {
				error!("portal-particles: {}", e);
				return;
			}
		};
		if let Some(cb) = on_complete {
			particles.on_complete(move || cb.run(()));
		}
		particles.start();

		let (particles_resize, canvas_resize) = (particles.clone(), canvas.clone());
		let on_resize = Closure::<dyn FnMut()>::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = viewport_size(&win);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			particles_resize.resize(nw, nh);
		});
		let _ =
			window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());

		let on_pointer = track_pointer.then(|| {
			let particles_pointer = particles.clone();
			let cb = Closure::<dyn FnMut(MouseEvent)>::new(move |ev: MouseEvent| {
				particles_pointer.set_pointer(Some((ev.client_x() as f64, ev.client_y() as f64)));
			});
			let _ = window.add_event_listener_with_callback("mousemove", cb.as_ref().unchecked_ref());
			cb
		});

		debug!("portal-particles: mounted {} canvas {}x{}", particles.mode(), w, h);
		mounted.set_value(Some(Mounted {
			window,
			particles,
			on_resize,
			on_pointer,
		}));
	});

	on_cleanup(move || {
		// Dropping `Mounted` stops the loop and unregisters listeners.
		let _ = mounted.try_update_value(|m| m.take());
	});

	view! {
		<canvas
			node_ref=canvas_ref
			class=class
			style="position: fixed; inset: 0; width: 100%; height: 100%; pointer-events: none;"
		/>
	}
}
