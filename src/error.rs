//! Error types for the lap counting pipeline.
//!
//! Only configuration and calibration can fail. Noisy or interrupted sample
//! streams are absorbed by the state machine and never surface as errors.
//! The `thiserror` crate is used for ergonomic error definitions.

use std::fmt;

use thiserror::Error;

/// Configuration parameter named in a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Offset,
    Scale,
    Threshold,
    FilterWindowSize,
    LapWindowSize,
    DisconnectRepeatCount,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parameter::Offset => "offset",
            Parameter::Scale => "scale",
            Parameter::Threshold => "threshold",
            Parameter::FilterWindowSize => "filter_window_size",
            Parameter::LapWindowSize => "lap_window_size",
            Parameter::DisconnectRepeatCount => "disconnect_repeat_count",
        };
        f.write_str(name)
    }
}

/// Invalid session configuration, rejected at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A window size or repeat count of zero.
    #[error("{parameter} must be at least 1")]
    ZeroSize { parameter: Parameter },

    /// The distance model scale was zero, which makes the model non-invertible.
    #[error("Distance model scale must be nonzero")]
    ZeroScale,

    /// A real-valued parameter was NaN or infinite.
    #[error("{parameter} must be finite, got {value}")]
    NonFinite { parameter: Parameter, value: f64 },
}

/// Errors raised while deriving a threshold or a distance model from measurements.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Too few measurements to compute the requested quantity.
    #[error("Not enough calibration samples: needed {needed}, got {got}")]
    NotEnoughSamples { needed: usize, got: usize },

    /// A calibration distance was zero, negative, or not finite.
    #[error("Calibration distance must be positive and finite, got {distance}")]
    InvalidDistance { distance: f64 },

    /// All calibration points were taken at the same distance.
    #[error("Calibration points must span at least two distinct distances")]
    DegenerateDistances,

    /// The fitted RSSI slope was zero, so distance cannot be recovered from RSSI.
    #[error("Calibration produced a flat RSSI response")]
    FlatResponse,
}

/// Umbrella error for the crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LapCountError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Calibration failure.
    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),
}

/// Returns `value` if finite, otherwise a [`ConfigError::NonFinite`] for `parameter`.
pub(crate) fn require_finite(parameter: Parameter, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { parameter, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_error_display() {
        let err = ConfigError::ZeroSize {
            parameter: Parameter::LapWindowSize,
        };
        assert_eq!(format!("{}", err), "lap_window_size must be at least 1");
    }

    #[test]
    fn non_finite_error_display() {
        let err = ConfigError::NonFinite {
            parameter: Parameter::Threshold,
            value: f64::INFINITY,
        };
        assert_eq!(format!("{}", err), "threshold must be finite, got inf");
    }

    #[test]
    fn not_enough_samples_error_display() {
        let err = CalibrationError::NotEnoughSamples { needed: 2, got: 1 };
        assert_eq!(
            format!("{}", err),
            "Not enough calibration samples: needed 2, got 1"
        );
    }

    #[test]
    fn lap_count_error_from_config_error() {
        let config_err = ConfigError::ZeroScale;
        let err = LapCountError::from(config_err.clone());
        match err {
            LapCountError::Config(inner) => assert_eq!(inner, config_err),
            _ => panic!("Incorrect LapCountError variant"),
        }
    }

    #[test]
    fn lap_count_error_from_calibration_error() {
        let err = LapCountError::from(CalibrationError::FlatResponse);
        assert_eq!(
            format!("{}", err),
            "Calibration error: Calibration produced a flat RSSI response"
        );
    }

    #[test]
    fn require_finite_rejects_nan() {
        assert!(require_finite(Parameter::Offset, -64.1).is_ok());
        assert!(matches!(
            require_finite(Parameter::Offset, f64::NAN),
            Err(ConfigError::NonFinite {
                parameter: Parameter::Offset,
                ..
            })
        ));
    }
}
