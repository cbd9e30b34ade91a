//! Configuration errors raised when a particle surface is constructed.

/// Result alias for configuration parsing and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything that can be wrong with a surface configuration.
///
/// These are raised synchronously at construction and are not recoverable:
/// the call site has to be fixed. Problems that show up while the loop is
/// running (a detached canvas, a failed frame request) are never errors;
/// the loop logs them and stops.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
	/// The motion mode string is not one of the known modes.
	#[error("unknown motion mode `{0}` (expected drift-wrap, converge-to-point or burst-decay)")]
	UnknownMode(String),

	/// `converge-to-point` was selected without a target point.
	#[error("converge-to-point requires a target point")]
	MissingTarget,

	/// A numeric parameter is out of its allowed range.
	#[error("invalid `{field}`: {reason}")]
	InvalidParameter {
		/// Config field name as it appears in JSON.
		field: &'static str,
		/// Human-readable constraint that was violated.
		reason: String,
	},

	/// A color string could not be parsed.
	#[error("invalid color `{0}`")]
	InvalidColor(String),

	/// The JSON config blob could not be deserialized.
	#[error("failed to parse surface config: {0}")]
	Json(#[from] serde_json::Error),
}

impl ConfigError {
	/// Build a [`ConfigError::InvalidParameter`] value.
	pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
		Self::InvalidParameter {
			field,
			reason: reason.into(),
		}
	}
}
