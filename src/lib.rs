//! portal-particles: ambient canvas particle effects for the portfolio site.
//!
//! This crate provides the particle engine behind the loading screen, the
//! page-transition dissolve and the starfield backgrounds, plus a small CSR
//! app that plays them in sequence.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

// Enables the `js` backend so `rand` can seed from entropy on wasm32.
use getrandom as _;

pub mod components;

pub use components::particle_surface::{
	AnimationFrameScheduler, CanvasSurface, Color, ConfigError, ConfigResult, DrawCommand,
	DrawingSurface, FrameInfo, FrameQueue, FrameScheduler, GlowStyle, HeadlessSurface, MotionMode,
	ParticleCanvas, ParticleSurface, SurfaceConfig, TargetPoint, ValueRange,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("portal-particles: logging initialized");
}

/// Load a surface config override from a JSON script element.
/// Expected format: a (partial) `SurfaceConfig` object in camelCase.
fn load_config(element_id: &str) -> Option<SurfaceConfig> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(element_id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match SurfaceConfig::from_json(&json_text) {
		Ok(config) => {
			info!(
				"portal-particles: loaded {} config from #{} ({} particles)",
				config.mode, element_id, config.count
			);
			Some(config)
		}
		Err(e) => {
			warn!("portal-particles: ignoring #{}: {}", element_id, e);
			None
		}
	}
}

/// Which animation the stage is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
	Loading,
	Dissolve,
	Hero,
}

/// Main application component.
/// Plays the loading convergence, dissolves into the hero, then keeps the
/// starfield running over a wandering galaxy backdrop.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let width = components::particle_surface::viewport_width();
	let loading = load_config("loading-particles").unwrap_or_else(|| SurfaceConfig::loading(width));
	let dissolve =
		load_config("dissolve-particles").unwrap_or_else(|| SurfaceConfig::dissolve(width));
	let starfield =
		load_config("starfield-particles").unwrap_or_else(|| SurfaceConfig::starfield(width));
	let galaxy = load_config("galaxy-particles").unwrap_or_else(|| SurfaceConfig::galaxy(width));

	let (stage, set_stage) = signal(Stage::Loading);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Portfolio" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="portal-stage">
			{move || match stage.get() {
				Stage::Loading => view! {
					<ParticleCanvas
						config=loading.clone()
						on_complete=move |_: ()| set_stage.set(Stage::Dissolve)
					/>
					<div class="portal-overlay">
						<p class="tagline">"Entering the portfolio..."</p>
					</div>
				}
				.into_any(),
				Stage::Dissolve => view! {
					<ParticleCanvas
						config=dissolve.clone()
						on_complete=move |_: ()| set_stage.set(Stage::Hero)
					/>
				}
				.into_any(),
				Stage::Hero => view! {
					<ParticleCanvas config=galaxy.clone() class="galaxy-canvas" />
					<ParticleCanvas config=starfield.clone() track_pointer=true />
					<div class="hero-overlay">
						<h1>"Welcome"</h1>
						<p class="subtitle">"Move the pointer to shift the stars."</p>
					</div>
				}
				.into_any(),
			}}
		</div>
	}
}
