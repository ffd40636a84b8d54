//! Distance estimation from filtered RSSI.
//!
//! Calibration regressions of RSSI against known distances fit
//!
//! ```text
//! rssi = offset + scale * ln(distance)
//! ```
//!
//! so the estimate is the inverse, `exp((rssi - offset) / scale)`.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Parameter, require_finite};

/// Maps a filtered RSSI value to an estimated distance.
pub trait DistanceEstimator: Debug {
    /// Estimated distance for a filtered RSSI reading (dBm).
    fn distance(&self, rssi: f64) -> f64;
}

/// Logarithmic path-loss model with calibrated `offset` and `scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogarithmicModel {
    offset: f64,
    scale: f64,
}

impl LogarithmicModel {
    /// Creates a model from calibration constants.
    ///
    /// # Errors
    /// - [`ConfigError::NonFinite`] - `offset` or `scale` is NaN or infinite
    /// - [`ConfigError::ZeroScale`] - `scale` is zero
    pub fn new(offset: f64, scale: f64) -> Result<Self, ConfigError> {
        let offset = require_finite(Parameter::Offset, offset)?;
        let scale = require_finite(Parameter::Scale, scale)?;
        if scale == 0.0 {
            return Err(ConfigError::ZeroScale);
        }
        Ok(Self { offset, scale })
    }

    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Forward model: expected RSSI at `distance`.
    pub fn rssi_at(&self, distance: f64) -> f64 {
        self.offset + self.scale * distance.ln()
    }
}

impl DistanceEstimator for LogarithmicModel {
    fn distance(&self, rssi: f64) -> f64 {
        ((rssi - self.offset) / self.scale).exp()
    }
}

impl<'de> Deserialize<'de> for LogarithmicModel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawModel {
            offset: f64,
            scale: f64,
        }

        let raw = RawModel::deserialize(deserializer)?;
        LogarithmicModel::new(raw.offset, raw.scale).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFSET: f64 = -64.1;
    const SCALE: f64 = -7.47;

    #[test]
    fn rssi_at_offset_is_unit_distance() {
        let model = LogarithmicModel::new(OFFSET, SCALE).unwrap();
        assert_eq!(model.distance(-64.1), 1.0);
    }

    #[test]
    fn weaker_signal_is_farther() {
        let model = LogarithmicModel::new(OFFSET, SCALE).unwrap();
        let near = model.distance(-60.0);
        let far = model.distance(-80.0);
        assert!(near < 1.0);
        assert!(far > near);
        assert!((far - (15.9_f64 / 7.47).exp()).abs() < 1e-9);
    }

    #[test]
    fn forward_and_inverse_agree() {
        let model = LogarithmicModel::new(OFFSET, SCALE).unwrap();
        for distance in [0.5, 1.0, 3.0, 12.5] {
            let rssi = model.rssi_at(distance);
            assert!((model.distance(rssi) - distance).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_scale_rejected() {
        assert_eq!(
            LogarithmicModel::new(OFFSET, 0.0).unwrap_err(),
            ConfigError::ZeroScale
        );
    }

    #[test]
    fn non_finite_offset_rejected() {
        assert!(matches!(
            LogarithmicModel::new(f64::NAN, SCALE),
            Err(ConfigError::NonFinite {
                parameter: Parameter::Offset,
                ..
            })
        ));
    }

    #[test]
    fn deserialize_validates() {
        let model: LogarithmicModel =
            serde_json::from_str(r#"{"offset": -64.1, "scale": -7.47}"#).unwrap();
        assert_eq!(model.offset(), OFFSET);

        let bad: Result<LogarithmicModel, _> =
            serde_json::from_str(r#"{"offset": -64.1, "scale": 0.0}"#);
        assert!(bad.is_err());
    }
}
