//! Particle data and the per-mode update rules.

use std::f64::consts::{PI, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{MotionMode, SurfaceConfig, TargetPoint};

/// Phase advance of the shared wander clock per frame.
const WANDER_STEP: f64 = 0.01;

/// A single animated point.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Base radius
	pub size: f64,
	/// Base opacity, always within [0, 1]
	pub opacity: f64,
	/// Twinkle accumulator
	pub phase: f64,
	pub target_x: f64,
	pub target_y: f64,
	/// Opacity lost per frame (bursts only)
	pub decay: f64,
	/// Parallax depth
	pub depth: f64,
}

impl Particle {
	pub fn distance_to_target(&self) -> f64 {
		(self.target_x - self.x).hypot(self.target_y - self.y)
	}

	/// Twinkling opacity for drifting particles.
	pub fn twinkle_opacity(&self) -> f64 {
		(self.opacity * (0.5 + 0.5 * self.phase.sin())).clamp(0.0, 1.0)
	}

	/// Pulsing radius for drifting particles.
	pub fn twinkle_size(&self) -> f64 {
		self.size * (0.8 + 0.2 * (self.phase * 1.5).sin())
	}
}

/// A wandering line segment drawn across a drifting field.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
	pub opacity: f64,
	/// Endpoint speed in pixels per frame
	pub speed: f64,
}

/// Inputs to a single update step that come from outside the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
	/// Fraction of the configured duration elapsed, in [0, 1].
	/// Always 0 for drift-wrap.
	pub progress: f64,
	/// Last known pointer position in surface coordinates.
	pub pointer: Option<(f64, f64)>,
}

/// Wraps `value` into `[0, max)`.
pub(crate) fn wrap(value: f64, max: f64) -> f64 {
	if max <= 0.0 {
		return 0.0;
	}
	let wrapped = value.rem_euclid(max);
	// rem_euclid can round up to `max` for tiny negative inputs
	if wrapped >= max { 0.0 } else { wrapped }
}

/// Owns the particle batch of one surface and applies the mode's update rule.
pub struct ParticleSystem {
	pub particles: Vec<Particle>,
	pub connections: Vec<Connection>,
	config: SurfaceConfig,
	width: f64,
	height: f64,
	rng: StdRng,
	wander_time: f64,
}

impl ParticleSystem {
	pub fn new(config: &SurfaceConfig, width: f64, height: f64) -> Self {
		let rng = match config.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_entropy(),
		};

		Self {
			particles: Vec::with_capacity(config.count),
			connections: Vec::new(),
			config: config.clone(),
			width,
			height,
			rng,
			wander_time: 0.0,
		}
	}

	pub fn mode(&self) -> MotionMode {
		self.config.mode
	}

	pub fn config(&self) -> &SurfaceConfig {
		&self.config
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn len(&self) -> usize {
		self.particles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.particles.is_empty()
	}

	/// Replaces the current batch with `count` fresh particles.
	pub fn spawn(&mut self) {
		self.particles.clear();
		self.wander_time = 0.0;
		let target = self.resolved_target();
		for _ in 0..self.config.count {
			let particle = match self.config.mode {
				MotionMode::DriftWrap => self.spawn_drift(),
				MotionMode::BurstDecay => self.spawn_burst(target),
				MotionMode::ConvergeToPoint => self.spawn_converge(target),
			};
			self.particles.push(particle);
		}

		self.connections.clear();
		if let Some(connections) = self.config.connections {
			for _ in 0..connections.count {
				let (x1, y1) = self.random_position();
				let (x2, y2) = self.random_position();
				let connection = Connection {
					x1,
					y1,
					x2,
					y2,
					opacity: connections.opacity.sample(&mut self.rng).clamp(0.0, 1.0),
					speed: connections.speed.sample(&mut self.rng),
				};
				self.connections.push(connection);
			}
		}
	}

	pub fn clear(&mut self) {
		self.particles.clear();
		self.connections.clear();
	}

	/// Target point for the current bounds; the viewport center when unset.
	fn resolved_target(&self) -> (f64, f64) {
		self.config
			.target
			.unwrap_or(TargetPoint::CENTER)
			.resolve(self.width, self.height)
	}

	fn velocity(&mut self) -> (f64, f64) {
		let angle = match self.config.heading {
			Some(heading) => heading,
			None => self.rng.gen_range(0.0..TAU),
		};
		let speed = self.config.speed.sample(&mut self.rng);
		(angle.cos() * speed, angle.sin() * speed)
	}

	fn base(&mut self, x: f64, y: f64, (target_x, target_y): (f64, f64)) -> Particle {
		let (vx, vy) = self.velocity();
		Particle {
			x,
			y,
			vx,
			vy,
			size: self.config.size.sample(&mut self.rng),
			opacity: self.config.opacity.sample(&mut self.rng).clamp(0.0, 1.0),
			phase: self.rng.gen_range(0.0..TAU),
			target_x,
			target_y,
			decay: 0.0,
			depth: 0.0,
		}
	}

	fn random_position(&mut self) -> (f64, f64) {
		let x = if self.width > 0.0 {
			self.rng.gen_range(0.0..self.width)
		} else {
			0.0
		};
		let y = if self.height > 0.0 {
			self.rng.gen_range(0.0..self.height)
		} else {
			0.0
		};
		(x, y)
	}

	fn spawn_drift(&mut self) -> Particle {
		let (x, y) = self.random_position();
		let mut particle = self.base(x, y, (x, y));
		if let Some(parallax) = self.config.parallax {
			particle.depth = parallax.depth.sample(&mut self.rng);
		}
		particle
	}

	fn spawn_burst(&mut self, origin: (f64, f64)) -> Particle {
		let mut particle = self.base(origin.0, origin.1, origin);
		particle.decay = self.config.decay.sample(&mut self.rng);
		particle
	}

	fn spawn_converge(&mut self, target: (f64, f64)) -> Particle {
		let (x, y) = self.random_position();
		self.base(x, y, target)
	}

	/// Advances every particle by one frame and drops expired ones.
	pub fn update(&mut self, input: FrameInput) {
		match self.config.mode {
			MotionMode::DriftWrap => self.update_drift(input.pointer),
			MotionMode::BurstDecay => self.update_burst(),
			MotionMode::ConvergeToPoint => self.update_converge(input.progress),
		}
	}

	fn update_drift(&mut self, pointer: Option<(f64, f64)>) {
		let (w, h) = (self.width, self.height);
		let push = match (pointer, self.config.parallax) {
			(Some((px, py)), Some(parallax)) => (
				(px - w / 2.0) * parallax.strength,
				(py - h / 2.0) * parallax.strength * parallax.vertical_factor,
			),
			_ => (0.0, 0.0),
		};
		let t = self.wander_time;
		let wander = self.config.wander.then_some(t);
		let step = self.config.twinkle_step;

		for (i, p) in self.particles.iter_mut().enumerate() {
			let (vx, vy) = match wander {
				Some(t) => {
					let speed = p.vx.hypot(p.vy);
					let angle = t + i as f64;
					(angle.sin() * speed, angle.cos() * speed)
				}
				None => (p.vx, p.vy),
			};
			p.x = wrap(p.x + vx + push.0 * p.depth, w);
			p.y = wrap(p.y + vy + push.1 * p.depth, h);
			p.phase += step;
		}

		for (i, c) in self.connections.iter_mut().enumerate() {
			let angle = t + i as f64;
			c.x1 = wrap(c.x1 + angle.sin() * c.speed, w);
			c.y1 = wrap(c.y1 + angle.cos() * c.speed, h);
			c.x2 = wrap(c.x2 + (angle + PI).sin() * c.speed, w);
			c.y2 = wrap(c.y2 + (angle + PI).cos() * c.speed, h);
		}

		if wander.is_some() || !self.connections.is_empty() {
			self.wander_time += WANDER_STEP;
		}
	}

	fn update_burst(&mut self) {
		let damping = self.config.damping;
		for p in &mut self.particles {
			p.vx *= damping;
			p.vy *= damping;
			p.x += p.vx;
			p.y += p.vy;
			p.opacity = (p.opacity - p.decay).clamp(0.0, 1.0);
		}
		self.particles.retain(|p| p.opacity > 0.0);
	}

	fn update_converge(&mut self, progress: f64) {
		let steering = progress >= self.config.converge_at;
		let rate = self.config.convergence_rate;
		for p in &mut self.particles {
			if steering {
				p.vx = (p.target_x - p.x) * rate;
				p.vy = (p.target_y - p.y) * rate;
			}
			p.x += p.vx;
			p.y += p.vy;
		}
	}

	/// Displayed `(opacity, radius)` of a particle at `progress`.
	pub fn appearance(&self, particle: &Particle, progress: f64) -> (f64, f64) {
		match self.config.mode {
			MotionMode::DriftWrap if self.config.twinkle => {
				(particle.twinkle_opacity(), particle.twinkle_size())
			}
			MotionMode::DriftWrap => (particle.opacity, particle.size),
			MotionMode::BurstDecay => (particle.opacity.clamp(0.0, 1.0), particle.size),
			MotionMode::ConvergeToPoint => {
				let fade = 1.0 - progress.clamp(0.0, 1.0) * self.config.converge_fade;
				((particle.opacity * fade).clamp(0.0, 1.0), particle.size)
			}
		}
	}

	/// Updates the wraparound bounds.
	///
	/// Positions are left alone; drifting particles outside the new bounds
	/// are wrapped back in on their next update. Viewport-relative targets
	/// move with the viewport.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;

		if let Some(target) = self.config.target.filter(TargetPoint::is_viewport_relative) {
			let (tx, ty) = target.resolve(width, height);
			for p in &mut self.particles {
				p.target_x = tx;
				p.target_y = ty;
			}
		}
	}
}

/// Mean of [`Particle::distance_to_target`] over `particles`.
pub fn mean_distance(particles: &[Particle]) -> Option<f64> {
	if particles.is_empty() {
		return None;
	}
	let total: f64 = particles.iter().map(Particle::distance_to_target).sum();
	Some(total / particles.len() as f64)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::particle_surface::types::ValueRange;

	fn seeded(mode: MotionMode) -> SurfaceConfig {
		SurfaceConfig {
			count: 25,
			mode,
			target: Some(TargetPoint::CENTER),
			seed: Some(7),
			..SurfaceConfig::default()
		}
	}

	#[test]
	fn wrap_stays_in_half_open_interval() {
		assert_eq!(wrap(810.0, 800.0), 10.0);
		assert_eq!(wrap(-5.0, 800.0), 795.0);
		assert_eq!(wrap(800.0, 800.0), 0.0);
		assert_eq!(wrap(-1e-18, 800.0), 0.0);
		assert_eq!(wrap(12.0, 0.0), 0.0);
	}

	#[test]
	fn same_seed_same_batch() {
		let mut a = ParticleSystem::new(&seeded(MotionMode::DriftWrap), 800.0, 600.0);
		let mut b = ParticleSystem::new(&seeded(MotionMode::DriftWrap), 800.0, 600.0);
		a.spawn();
		b.spawn();
		assert_eq!(a.particles, b.particles);
		assert_eq!(a.len(), 25);
	}

	#[test]
	fn twinkle_stays_within_bounds() {
		let mut system = ParticleSystem::new(&seeded(MotionMode::DriftWrap), 800.0, 600.0);
		system.spawn();
		for _ in 0..500 {
			system.update(FrameInput::default());
			for p in &system.particles {
				let (opacity, size) = system.appearance(p, 0.0);
				assert!((0.0..=1.0).contains(&opacity));
				assert!(size >= p.size * 0.6 - 1e-9 && size <= p.size + 1e-9);
			}
		}
	}

	#[test]
	fn burst_spawns_at_origin_and_expires() {
		let config = SurfaceConfig {
			decay: ValueRange::new(0.05, 0.1),
			..seeded(MotionMode::BurstDecay)
		};
		let mut system = ParticleSystem::new(&config, 800.0, 600.0);
		system.spawn();
		assert!(system.particles.iter().all(|p| p.x == 400.0 && p.y == 300.0));

		for _ in 0..25 {
			system.update(FrameInput::default());
			assert!(system.particles.iter().all(|p| p.opacity > 0.0 && p.opacity <= 1.0));
		}
		assert!(system.is_empty());
	}

	#[test]
	fn burst_velocity_damps() {
		let mut system = ParticleSystem::new(&seeded(MotionMode::BurstDecay), 800.0, 600.0);
		system.spawn();
		let before: Vec<f64> = system.particles.iter().map(|p| p.vx.hypot(p.vy)).collect();
		system.update(FrameInput::default());
		for (p, speed) in system.particles.iter().zip(before) {
			assert!((p.vx.hypot(p.vy) - speed * 0.98).abs() < 1e-9);
		}
	}

	#[test]
	fn converge_only_steers_after_switch_point() {
		let mut system = ParticleSystem::new(&seeded(MotionMode::ConvergeToPoint), 800.0, 600.0);
		system.spawn();
		let drifting = system.particles.clone();
		system.update(FrameInput {
			progress: 0.3,
			pointer: None,
		});
		for (p, before) in system.particles.iter().zip(&drifting) {
			assert_eq!(p.vx, before.vx);
			assert_eq!(p.x, before.x + before.vx);
		}

		let start = mean_distance(&system.particles).unwrap();
		system.update(FrameInput {
			progress: 0.6,
			pointer: None,
		});
		let after = mean_distance(&system.particles).unwrap();
		assert!((after - start * 0.95).abs() < 1e-6);
	}

	#[test]
	fn resize_moves_relative_targets_but_not_particles() {
		let mut system = ParticleSystem::new(&seeded(MotionMode::ConvergeToPoint), 800.0, 600.0);
		system.spawn();
		let positions: Vec<(f64, f64)> = system.particles.iter().map(|p| (p.x, p.y)).collect();
		system.resize(400.0, 300.0);
		for (p, (x, y)) in system.particles.iter().zip(positions) {
			assert_eq!((p.x, p.y), (x, y));
			assert_eq!((p.target_x, p.target_y), (200.0, 150.0));
		}
	}

	#[test]
	fn parallax_pushes_deeper_particles_further() {
		let config = SurfaceConfig {
			count: 2,
			speed: ValueRange::fixed(0.0),
			twinkle_step: 0.0,
			parallax: Some(Default::default()),
			seed: Some(3),
			..SurfaceConfig::default()
		};
		let mut system = ParticleSystem::new(&config, 800.0, 600.0);
		system.spawn();
		system.particles[0].depth = 0.0;
		system.particles[1].depth = 1.0;
		let start: Vec<f64> = system.particles.iter().map(|p| p.x).collect();

		system.update(FrameInput {
			progress: 0.0,
			pointer: Some((600.0, 300.0)),
		});

		assert_eq!(system.particles[0].x, start[0]);
		let moved = wrap(start[1] + 200.0 * 0.02, 800.0);
		assert!((system.particles[1].x - moved).abs() < 1e-9);
	}

	#[test]
	fn connections_wander_within_bounds() {
		let mut system = ParticleSystem::new(
			&SurfaceConfig {
				seed: Some(12),
				..SurfaceConfig::galaxy(1280.0)
			},
			640.0,
			480.0,
		);
		system.spawn();
		assert_eq!(system.connections.len(), 50);
		let start = system.connections.clone();

		system.update(FrameInput::default());
		let c = &system.connections[0];
		// segment 0 at t = 0: first endpoint moves along +y, second along -y
		assert_eq!(c.x1, wrap(start[0].x1 + 0.0_f64.sin() * c.speed, 640.0));
		assert!((c.y1 - wrap(start[0].y1 + c.speed, 480.0)).abs() < 1e-9);
		assert!((c.y2 - wrap(start[0].y2 - c.speed, 480.0)).abs() < 1e-9);

		for _ in 0..2000 {
			system.update(FrameInput::default());
			for c in &system.connections {
				for (x, y) in [(c.x1, c.y1), (c.x2, c.y2)] {
					assert!((0.0..640.0).contains(&x), "x {x} out of bounds");
					assert!((0.0..480.0).contains(&y), "y {y} out of bounds");
				}
				assert!((0.0..=0.3).contains(&c.opacity));
			}
		}

		system.clear();
		assert!(system.connections.is_empty());
	}

	#[test]
	fn galaxy_stars_keep_base_appearance() {
		let mut system = ParticleSystem::new(
			&SurfaceConfig {
				seed: Some(13),
				..SurfaceConfig::galaxy(1280.0)
			},
			800.0,
			600.0,
		);
		system.spawn();
		for _ in 0..50 {
			system.update(FrameInput::default());
		}
		for p in &system.particles {
			assert_eq!(system.appearance(p, 0.0), (p.opacity, p.size));
		}
	}

	#[test]
	fn wander_keeps_speed_and_bounds() {
		let mut system = ParticleSystem::new(
			&SurfaceConfig {
				seed: Some(11),
				..SurfaceConfig::galaxy(1280.0)
			},
			1280.0,
			720.0,
		);
		system.spawn();
		let speeds: Vec<f64> = system.particles.iter().map(|p| p.vx.hypot(p.vy)).collect();
		for _ in 0..200 {
			system.update(FrameInput::default());
		}
		for (p, speed) in system.particles.iter().zip(speeds) {
			assert!((p.vx.hypot(p.vy) - speed).abs() < 1e-9);
			assert!(p.x >= 0.0 && p.x < 1280.0);
			assert!(p.y >= 0.0 && p.y < 720.0);
		}
	}
}
