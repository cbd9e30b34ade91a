//! Ambient canvas particle effects.
//!
//! One engine, [`ParticleSurface`], drives every particle animation on the
//! site. The motion mode picks the behavior:
//! - `drift-wrap`: perpetual twinkling starfield with edge wraparound and
//!   optional pointer parallax (hero background), or wandering stars crossed
//!   by connection lines (services background)
//! - `burst-decay`: a one-shot burst that damps, fades and disappears
//!   (page transition dissolve)
//! - `converge-to-point`: drift, then get pulled into a target point
//!   (loading screen)
//!
//! The engine only needs a [`DrawingSurface`] and a [`FrameScheduler`]. In the
//! browser those are [`CanvasSurface`] and [`AnimationFrameScheduler`], wired
//! up by the [`ParticleCanvas`] component. [`HeadlessSurface`] and
//! [`FrameQueue`] run the same loop without a browser.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use portal_particles::{FrameQueue, HeadlessSurface, ParticleSurface, SurfaceConfig};
//!
//! let queue = Rc::new(FrameQueue::default());
//! let surface = HeadlessSurface::new(800.0, 600.0);
//! let particles = ParticleSurface::new(surface, SurfaceConfig::starfield(800.0), queue.clone())
//!     .expect("preset is valid");
//!
//! particles.start();
//! queue.advance_by(10);
//! assert_eq!(particles.frames_drawn(), 10);
//! particles.stop();
//! ```

mod component;
mod error;
mod headless;
mod particles;
mod render;
mod schedule;
mod state;
mod theme;
mod types;

pub use component::{ParticleCanvas, viewport_width};
pub use error::{ConfigError, ConfigResult};
pub use headless::{DrawCommand, FrameQueue, HeadlessSurface};
pub use particles::{Connection, Particle, mean_distance};
pub use render::{CanvasSurface, DrawingSurface};
pub use schedule::{AnimationFrameScheduler, FrameCallback, FrameHandle, FrameScheduler};
pub use state::{FrameInfo, ParticleSurface};
pub use theme::{Color, GlowStyle};
pub use types::{
	ConnectionConfig, FRAME_MS, MotionMode, NARROW_VIEWPORT_WIDTH, ParallaxConfig, SurfaceConfig,
	TargetPoint, ValueRange, responsive_count,
};
