//! Colors and glow styling for particle surfaces.

use serde::Deserialize;

use super::error::ConfigError;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	/// Site accent (`#ff0040`).
	pub const ACCENT: Self = Self::rgb(255, 0, 64);
	/// Plain white used for star cores.
	pub const WHITE: Self = Self::rgb(255, 255, 255);
	/// Page background (`#0a0a0a`).
	pub const BACKGROUND: Self = Self::rgb(10, 10, 10);
	/// Fully transparent black.
	pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0.0);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self {
			a: a.clamp(0.0, 1.0),
			..self
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Parses a CSS color string.
	/// Supports hex (`#RRGGBB`) and `rgb()`/`rgba()` functional notation.
	pub fn parse(color_str: &str) -> Option<Self> {
		let s = color_str.trim();
		if let Some(hex) = s.strip_prefix('#') {
			if hex.len() != 6 || !hex.is_ascii() {
				return None;
			}
			let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
			let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
			let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
			return Some(Color::rgb(r, g, b));
		}

		let body = s
			.strip_prefix("rgba(")
			.or_else(|| s.strip_prefix("rgb("))?
			.strip_suffix(')')?;
		let nums: Vec<&str> = body.split(',').map(str::trim).collect();
		let (r, g, b, a) = match nums.as_slice() {
			[r, g, b] => (r, g, b, 1.0),
			[r, g, b, a] => (r, g, b, a.parse::<f64>().ok()?),
			_ => return None,
		};
		if !(0.0..=1.0).contains(&a) {
			return None;
		}
		Some(Color::rgba(r.parse().ok()?, g.parse().ok()?, b.parse().ok()?, a))
	}
}

impl TryFrom<String> for Color {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Color::parse(&value).ok_or(ConfigError::InvalidColor(value))
	}
}

/// Radial glow drawn around each particle.
///
/// The gradient runs from the particle color at full displayed opacity in the
/// center, through an optional tinted middle stop, to transparent at
/// `radius_scale` times the particle radius.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlowStyle {
	/// Tint applied at the middle stop (e.g. the accent for stars)
	pub mid_color: Option<Color>,
	/// Alpha of the middle stop relative to the displayed opacity
	pub mid_alpha: f64,
	/// Where the gradient reaches full transparency, in particle radii
	pub radius_scale: f64,
}

impl Default for GlowStyle {
	fn default() -> Self {
		Self {
			mid_color: None,
			mid_alpha: 0.3,
			radius_scale: 2.0,
		}
	}
}

impl GlowStyle {
	/// White core fading through the accent, as used by the hero starfield.
	pub fn accent_halo() -> Self {
		Self {
			mid_color: Some(Color::ACCENT),
			..Self::default()
		}
	}

	/// Gradient stops for a particle drawn with `color` at `opacity`.
	pub fn stops(&self, color: Color, opacity: f64) -> Vec<(f64, Color)> {
		let mut stops = Vec::with_capacity(3);
		stops.push((0.0, color.with_alpha(opacity)));
		if let Some(mid) = self.mid_color {
			stops.push((0.5, mid.with_alpha(opacity * self.mid_alpha)));
		}
		stops.push((1.0, color.with_alpha(0.0)));
		stops
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hex_and_functional_notation() {
		assert_eq!(Color::parse("#ff0040"), Some(Color::ACCENT));
		assert_eq!(
			Color::parse("rgba(255, 255, 255, 0.5)"),
			Some(Color::rgba(255, 255, 255, 0.5))
		);
		assert_eq!(Color::parse("rgb(10,10,10)"), Some(Color::BACKGROUND));
	}

	#[test]
	fn rejects_malformed_colors() {
		assert_eq!(Color::parse("#fff"), None);
		assert_eq!(Color::parse("rgb(300, 0, 0)"), None);
		assert_eq!(Color::parse("rgba(0, 0, 0, 2)"), None);
		assert_eq!(Color::parse("hotpink"), None);
	}

	#[test]
	fn css_output_drops_alpha_when_opaque() {
		assert_eq!(Color::ACCENT.to_css(), "#ff0040");
		assert_eq!(Color::WHITE.with_alpha(0.25).to_css(), "rgba(255, 255, 255, 0.25)");
	}

	#[test]
	fn glow_stops_end_transparent() {
		let stops = GlowStyle::accent_halo().stops(Color::WHITE, 0.8);
		assert_eq!(stops.len(), 3);
		assert_eq!(stops[0].1.a, 0.8);
		assert!((stops[1].1.a - 0.24).abs() < 1e-9);
		assert_eq!(stops[2].1.a, 0.0);
	}
}
