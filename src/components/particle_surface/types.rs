//! Configuration accepted by a particle surface.
//!
//! A [`SurfaceConfig`] can be built from one of the presets used on the site
//! ([`SurfaceConfig::starfield`], [`SurfaceConfig::galaxy`],
//! [`SurfaceConfig::dissolve`], [`SurfaceConfig::loading`]) or deserialized
//! from JSON. Every JSON field is optional and falls back to the drift-wrap
//! defaults.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::Deserialize;

use super::error::{ConfigError, ConfigResult};
use super::theme::{Color, GlowStyle};

/// Viewport width (CSS pixels) below which presets use their narrow count.
pub const NARROW_VIEWPORT_WIDTH: f64 = 768.0;

/// Nominal frame length at 60 fps, in milliseconds.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

/// Largest magnitude accepted for pixel-valued parameters (sizes, speeds).
const MAX_PIXELS: f64 = 1e6;

/// Picks the particle count for a viewport: `narrow` below
/// [`NARROW_VIEWPORT_WIDTH`], `wide` otherwise.
pub fn responsive_count(viewport_width: f64, narrow: usize, wide: usize) -> usize {
	if viewport_width < NARROW_VIEWPORT_WIDTH {
		narrow
	} else {
		wide
	}
}

/// How particles move each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum MotionMode {
	/// Perpetual drift with edge wraparound and twinkle.
	#[default]
	DriftWrap,
	/// Free drift, then steering toward a shared target point.
	ConvergeToPoint,
	/// A single burst whose particles damp, fade and disappear.
	BurstDecay,
}

impl MotionMode {
	pub fn as_str(self) -> &'static str {
		match self {
			MotionMode::DriftWrap => "drift-wrap",
			MotionMode::ConvergeToPoint => "converge-to-point",
			MotionMode::BurstDecay => "burst-decay",
		}
	}

	/// Whether the mode ends on its own and fires a completion callback.
	pub fn is_terminating(self) -> bool {
		!matches!(self, MotionMode::DriftWrap)
	}
}

impl fmt::Display for MotionMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for MotionMode {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"drift-wrap" => Ok(MotionMode::DriftWrap),
			"converge-to-point" => Ok(MotionMode::ConvergeToPoint),
			"burst-decay" => Ok(MotionMode::BurstDecay),
			other => Err(ConfigError::UnknownMode(other.to_string())),
		}
	}
}

impl TryFrom<String> for MotionMode {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// A point on the surface that particles converge on or burst from.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TargetPoint {
	/// Fixed surface coordinates.
	Absolute { x: f64, y: f64 },
	/// Fractions of the viewport; follows the viewport on resize.
	Relative { fx: f64, fy: f64 },
}

impl TargetPoint {
	/// Center of the viewport.
	pub const CENTER: Self = TargetPoint::Relative { fx: 0.5, fy: 0.5 };

	/// Surface coordinates of this point for a `width` x `height` surface.
	pub fn resolve(&self, width: f64, height: f64) -> (f64, f64) {
		match *self {
			TargetPoint::Absolute { x, y } => (x, y),
			TargetPoint::Relative { fx, fy } => (width * fx, height * fy),
		}
	}

	pub fn is_viewport_relative(&self) -> bool {
		matches!(self, TargetPoint::Relative { .. })
	}
}

/// Inclusive-exclusive interval a per-particle value is sampled from.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ValueRange {
	pub min: f64,
	pub max: f64,
}

impl ValueRange {
	pub const fn new(min: f64, max: f64) -> Self {
		Self { min, max }
	}

	/// A degenerate range that always yields `value`.
	pub const fn fixed(value: f64) -> Self {
		Self {
			min: value,
			max: value,
		}
	}

	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
		if self.max > self.min {
			rng.gen_range(self.min..self.max)
		} else {
			self.min
		}
	}

	fn validate(&self, field: &'static str) -> ConfigResult<()> {
		if !self.min.is_finite() || !self.max.is_finite() {
			return Err(ConfigError::invalid(field, "bounds must be finite"));
		}
		if self.min > self.max {
			return Err(ConfigError::invalid(
				field,
				format!("min {} exceeds max {}", self.min, self.max),
			));
		}
		Ok(())
	}

	fn validate_pixels(&self, field: &'static str) -> ConfigResult<()> {
		self.validate(field)?;
		if self.min.abs() > MAX_PIXELS || self.max.abs() > MAX_PIXELS {
			return Err(ConfigError::invalid(
				field,
				format!("bounds must stay within ±{MAX_PIXELS}"),
			));
		}
		Ok(())
	}
}

/// Pointer-driven parallax for drifting particles.
///
/// Each frame a particle is pushed by
/// `(pointer - surface_center) * strength * depth`, with the vertical push
/// further scaled by `vertical_factor`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParallaxConfig {
	pub strength: f64,
	pub vertical_factor: f64,
	/// Per-particle depth, sampled at spawn.
	pub depth: ValueRange,
}

impl Default for ParallaxConfig {
	fn default() -> Self {
		Self {
			strength: 0.02,
			vertical_factor: 0.5,
			depth: ValueRange::new(0.0, 1.0),
		}
	}
}

/// Wandering line segments drawn over a drifting field.
///
/// Both endpoints of segment `i` move by `speed` along
/// `(sin(t + i), cos(t + i))`, the second one in the opposite direction
/// (`t + i + π`), and wrap around the surface edges independently.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
	pub count: usize,
	pub color: Color,
	/// Stroke opacity, sampled per segment.
	pub opacity: ValueRange,
	/// Endpoint speed in surface pixels per frame.
	pub speed: ValueRange,
	pub line_width: f64,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self {
			count: 50,
			color: Color::ACCENT,
			opacity: ValueRange::new(0.0, 0.3),
			speed: ValueRange::new(0.1, 0.3),
			line_width: 0.5,
		}
	}
}

/// Full description of one particle surface.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceConfig {
	/// Number of particles spawned on start.
	pub count: usize,
	pub mode: MotionMode,
	/// Convergence target, or burst origin (viewport center when absent).
	pub target: Option<TargetPoint>,
	pub color: Color,
	/// Radial glow; plain filled circles when absent.
	pub glow: Option<GlowStyle>,
	/// Alpha of a background fill used instead of clearing, for trails.
	pub trail: Option<f64>,
	/// Fill color for trails.
	pub background: Color,
	/// Base radius in surface pixels.
	pub size: ValueRange,
	/// Base opacity, clamped to [0, 1].
	pub opacity: ValueRange,
	/// Speed in surface pixels per frame.
	pub speed: ValueRange,
	/// Fixed heading in radians; random per particle when absent.
	pub heading: Option<f64>,
	/// Sinusoidal wandering instead of straight drift (drift-wrap only).
	pub wander: bool,
	/// Pulse displayed opacity and size with the twinkle phase (drift-wrap
	/// only). When off, particles are drawn at their base values.
	pub twinkle: bool,
	/// Twinkle phase advance per frame.
	pub twinkle_step: f64,
	pub parallax: Option<ParallaxConfig>,
	/// Wandering line segments (drift-wrap only).
	pub connections: Option<ConnectionConfig>,
	/// Hard limit for terminating modes, in milliseconds.
	pub duration_ms: f64,
	/// Fraction of the duration after which particles steer to the target.
	pub converge_at: f64,
	/// Share of the remaining distance covered per frame while converging.
	pub convergence_rate: f64,
	/// How much converging particles fade by the end of the duration.
	pub converge_fade: f64,
	/// Per-frame velocity multiplier for bursts.
	pub damping: f64,
	/// Per-frame opacity loss for bursts.
	pub decay: ValueRange,
	/// Pause between the end of a terminating animation and its completion
	/// callback, in milliseconds.
	pub complete_delay_ms: f64,
	/// Fixed RNG seed; drawn from entropy when absent.
	pub seed: Option<u64>,
}

impl Default for SurfaceConfig {
	fn default() -> Self {
		Self {
			count: 100,
			mode: MotionMode::DriftWrap,
			target: None,
			color: Color::WHITE,
			glow: None,
			trail: None,
			background: Color::BACKGROUND,
			size: ValueRange::new(0.5, 2.5),
			opacity: ValueRange::new(0.2, 1.0),
			speed: ValueRange::new(0.1, 0.6),
			heading: None,
			wander: false,
			twinkle: true,
			twinkle_step: 0.02,
			parallax: None,
			connections: None,
			duration_ms: 1500.0,
			converge_at: 0.6,
			convergence_rate: 0.05,
			converge_fade: 0.0,
			damping: 0.98,
			decay: ValueRange::new(0.01, 0.03),
			complete_delay_ms: 0.0,
			seed: None,
		}
	}
}

impl SurfaceConfig {
	/// Hero background: rightward drifting stars with accent halos and
	/// pointer parallax.
	pub fn starfield(viewport_width: f64) -> Self {
		Self {
			count: responsive_count(viewport_width, 100, 200),
			glow: Some(GlowStyle::accent_halo()),
			heading: Some(0.0),
			parallax: Some(ParallaxConfig::default()),
			..Self::default()
		}
	}

	/// Services background: small stars wandering on slow sinusoidal paths,
	/// crossed by faint accent connection lines.
	pub fn galaxy(viewport_width: f64) -> Self {
		Self {
			count: responsive_count(viewport_width, 100, 200),
			size: ValueRange::new(0.2, 2.0),
			twinkle: false,
			wander: true,
			connections: Some(ConnectionConfig::default()),
			..Self::default()
		}
	}

	/// Loading-to-hero transition: accent particles exploding from the
	/// viewport center.
	pub fn dissolve(viewport_width: f64) -> Self {
		Self {
			count: responsive_count(viewport_width, 30, 60),
			mode: MotionMode::BurstDecay,
			target: Some(TargetPoint::CENTER),
			color: Color::ACCENT,
			glow: Some(GlowStyle::default()),
			size: ValueRange::new(2.0, 6.0),
			opacity: ValueRange::fixed(1.0),
			speed: ValueRange::new(0.5, 5.5),
			duration_ms: 1500.0,
			..Self::default()
		}
	}

	/// Loading screen: accent particles drifting, then pulled into the
	/// viewport center while fading slightly. Completion is held back
	/// half a second before handing off to the next stage.
	pub fn loading(viewport_width: f64) -> Self {
		Self {
			count: responsive_count(viewport_width, 50, 100),
			mode: MotionMode::ConvergeToPoint,
			target: Some(TargetPoint::CENTER),
			color: Color::ACCENT,
			glow: Some(GlowStyle::default()),
			size: ValueRange::new(1.0, 3.0),
			opacity: ValueRange::new(0.3, 0.8),
			speed: ValueRange::new(0.0, 0.35),
			duration_ms: 2000.0,
			converge_fade: 0.3,
			complete_delay_ms: 500.0,
			..Self::default()
		}
	}

	/// Parses and validates a JSON config.
	pub fn from_json(json: &str) -> ConfigResult<Self> {
		let config: SurfaceConfig = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the cross-field constraints serde cannot express.
	pub fn validate(&self) -> ConfigResult<()> {
		if self.mode == MotionMode::ConvergeToPoint && self.target.is_none() {
			return Err(ConfigError::MissingTarget);
		}
		if self.mode.is_terminating() && !(self.duration_ms.is_finite() && self.duration_ms > 0.0)
		{
			return Err(ConfigError::invalid(
				"durationMs",
				"terminating modes need a positive, finite duration",
			));
		}
		if !(0.0..=1.0).contains(&self.converge_at) {
			return Err(ConfigError::invalid("convergeAt", "must be within [0, 1]"));
		}
		if !(self.convergence_rate > 0.0 && self.convergence_rate <= 1.0) {
			return Err(ConfigError::invalid("convergenceRate", "must be within (0, 1]"));
		}
		if !(0.0..=1.0).contains(&self.converge_fade) {
			return Err(ConfigError::invalid("convergeFade", "must be within [0, 1]"));
		}
		if !(0.0..=1.0).contains(&self.damping) {
			return Err(ConfigError::invalid("damping", "must be within [0, 1]"));
		}
		if let Some(trail) = self.trail {
			if !(0.0..=1.0).contains(&trail) {
				return Err(ConfigError::invalid("trail", "must be within [0, 1]"));
			}
		}
		if !self.twinkle_step.is_finite() {
			return Err(ConfigError::invalid("twinkleStep", "must be finite"));
		}
		if !(self.complete_delay_ms.is_finite() && self.complete_delay_ms >= 0.0) {
			return Err(ConfigError::invalid(
				"completeDelayMs",
				"must be finite and not negative",
			));
		}
		self.size.validate_pixels("size")?;
		self.opacity.validate("opacity")?;
		self.speed.validate_pixels("speed")?;
		self.decay.validate("decay")?;
		if self.size.min < 0.0 {
			return Err(ConfigError::invalid("size", "must not be negative"));
		}
		if self.mode == MotionMode::BurstDecay && self.decay.min <= 0.0 {
			return Err(ConfigError::invalid(
				"decay",
				"bursts need a positive decay so particles expire",
			));
		}
		if let Some(parallax) = &self.parallax {
			if !(0.0..=1.0).contains(&parallax.strength) {
				return Err(ConfigError::invalid("parallax.strength", "must be within [0, 1]"));
			}
			if !(0.0..=1.0).contains(&parallax.vertical_factor) {
				return Err(ConfigError::invalid(
					"parallax.verticalFactor",
					"must be within [0, 1]",
				));
			}
			parallax.depth.validate("parallax.depth")?;
		}
		if let Some(connections) = &self.connections {
			if self.mode != MotionMode::DriftWrap {
				return Err(ConfigError::invalid(
					"connections",
					"only drift-wrap surfaces draw connection lines",
				));
			}
			connections.opacity.validate("connections.opacity")?;
			connections.speed.validate_pixels("connections.speed")?;
			if !(connections.line_width.is_finite() && connections.line_width > 0.0) {
				return Err(ConfigError::invalid(
					"connections.lineWidth",
					"must be positive and finite",
				));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn motion_mode_round_trips_through_str() {
		for mode in [
			MotionMode::DriftWrap,
			MotionMode::ConvergeToPoint,
			MotionMode::BurstDecay,
		] {
			assert_eq!(mode.as_str().parse::<MotionMode>().ok(), Some(mode));
		}
	}

	#[test]
	fn unknown_mode_is_a_config_error() {
		let err = "spiral".parse::<MotionMode>().unwrap_err();
		assert!(matches!(err, ConfigError::UnknownMode(ref m) if m == "spiral"));

		let err = SurfaceConfig::from_json(r#"{ "mode": "spiral" }"#).unwrap_err();
		assert!(matches!(err, ConfigError::Json(_)));
		assert!(err.to_string().contains("spiral"));
	}

	#[test]
	fn converge_without_target_is_rejected() {
		let config = SurfaceConfig {
			mode: MotionMode::ConvergeToPoint,
			target: None,
			..SurfaceConfig::default()
		};
		assert!(matches!(config.validate(), Err(ConfigError::MissingTarget)));
	}

	#[test]
	fn zero_count_is_valid() {
		let config = SurfaceConfig {
			count: 0,
			..SurfaceConfig::dissolve(1280.0)
		};
		assert!(config.validate().is_ok());
	}

	#[test]
	fn json_fields_are_optional_and_camel_case() {
		let config = SurfaceConfig::from_json(
			r##"{
				"count": 30,
				"mode": "converge-to-point",
				"target": { "kind": "absolute", "x": 400, "y": 300 },
				"color": "#ff0040",
				"durationMs": 2000,
				"glow": { "midColor": "rgba(255, 0, 64, 1)" }
			}"##,
		)
		.unwrap();

		assert_eq!(config.count, 30);
		assert_eq!(config.mode, MotionMode::ConvergeToPoint);
		assert_eq!(
			config.target,
			Some(TargetPoint::Absolute { x: 400.0, y: 300.0 })
		);
		assert_eq!(config.color, Color::ACCENT);
		assert_eq!(config.duration_ms, 2000.0);
		assert_eq!(config.converge_at, 0.6);
		assert_eq!(config.glow.unwrap().radius_scale, 2.0);
	}

	#[test]
	fn bad_color_in_json_is_reported() {
		let err = SurfaceConfig::from_json(r#"{ "color": "teal" }"#).unwrap_err();
		assert!(err.to_string().contains("teal"));
	}

	#[test]
	fn inverted_range_is_rejected() {
		let config = SurfaceConfig {
			decay: ValueRange::new(0.03, 0.01),
			..SurfaceConfig::dissolve(1280.0)
		};
		assert!(matches!(
			config.validate(),
			Err(ConfigError::InvalidParameter { field: "decay", .. })
		));
	}

	#[test]
	fn presets_scale_count_with_viewport() {
		assert_eq!(SurfaceConfig::loading(375.0).count, 50);
		assert_eq!(SurfaceConfig::loading(1440.0).count, 100);
		assert_eq!(SurfaceConfig::dissolve(600.0).count, 30);
		assert_eq!(SurfaceConfig::starfield(1920.0).count, 200);
		for config in [
			SurfaceConfig::starfield(1024.0),
			SurfaceConfig::galaxy(1024.0),
			SurfaceConfig::dissolve(1024.0),
			SurfaceConfig::loading(1024.0),
		] {
			assert!(config.validate().is_ok(), "{:?} preset invalid", config.mode);
		}
	}

	#[test]
	fn huge_parameters_are_rejected() {
		let err = SurfaceConfig::from_json(r#"{ "parallax": { "strength": 1e308 } }"#).unwrap_err();
		assert!(matches!(
			err,
			ConfigError::InvalidParameter {
				field: "parallax.strength",
				..
			}
		));

		let err = SurfaceConfig::from_json(r#"{ "parallax": { "verticalFactor": 1e308 } }"#)
			.unwrap_err();
		assert!(matches!(
			err,
			ConfigError::InvalidParameter {
				field: "parallax.verticalFactor",
				..
			}
		));

		let config = SurfaceConfig {
			speed: ValueRange::new(0.1, 1e308),
			..SurfaceConfig::loading(1280.0)
		};
		assert!(matches!(
			config.validate(),
			Err(ConfigError::InvalidParameter { field: "speed", .. })
		));
	}

	#[test]
	fn connections_need_a_drifting_surface() {
		let config = SurfaceConfig {
			connections: Some(ConnectionConfig::default()),
			..SurfaceConfig::dissolve(1280.0)
		};
		assert!(matches!(
			config.validate(),
			Err(ConfigError::InvalidParameter {
				field: "connections",
				..
			})
		));

		let config = SurfaceConfig::from_json(
			r#"{ "wander": true, "connections": { "count": 12, "lineWidth": 1.5 } }"#,
		)
		.unwrap();
		let connections = config.connections.unwrap();
		assert_eq!(connections.count, 12);
		assert_eq!(connections.line_width, 1.5);
		assert_eq!(connections.color, Color::ACCENT);
	}

	#[test]
	fn relative_target_follows_viewport() {
		assert_eq!(TargetPoint::CENTER.resolve(800.0, 600.0), (400.0, 300.0));
		assert_eq!(TargetPoint::CENTER.resolve(400.0, 300.0), (200.0, 150.0));
		let fixed = TargetPoint::Absolute { x: 10.0, y: 20.0 };
		assert_eq!(fixed.resolve(400.0, 300.0), (10.0, 20.0));
		assert!(!fixed.is_viewport_relative());
	}
}
