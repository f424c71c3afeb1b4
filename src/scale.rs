//! Scale factors and how they are resolved from an estimator answer.

use crate::config::BaseMeasurements;
use crate::measurements::MeasurementSet;
use crate::response::ScaleEstimate;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Independent horizontal and vertical multipliers. Both are finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleFactor {
    pub x: f64,
    pub y: f64,
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ScaleFactor {
    pub const IDENTITY: ScaleFactor = ScaleFactor { x: 1.0, y: 1.0 };

    /// A factor from two multipliers, or `None` unless both are finite and positive.
    pub fn new(x: f64, y: f64) -> Option<Self> {
        (is_valid(x) && is_valid(y)).then_some(Self { x, y })
    }

    /// SVG transform attribute value, e.g. `scale(1.1,1)`.
    pub fn to_transform(&self) -> String {
        format!("scale({},{})", self.x, self.y)
    }

    /// The factor that undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            x: 1.0 / self.x,
            y: 1.0 / self.y,
        }
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} × {:.3}", self.x, self.y)
    }
}

fn is_valid(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Where an axis' multiplier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleSource {
    /// The estimator reported a usable value.
    Estimator,
    /// The estimator omitted the key (or gave a non-positive value); 1.0 was used.
    DefaultMissing,
    /// Derived locally from the supplied torso height.
    TorsoOverride,
}

/// A scale factor together with its per-axis provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedScale {
    pub factor: ScaleFactor,
    pub x_source: ScaleSource,
    pub y_source: ScaleSource,
}

/// Turn an estimator answer into the factor actually applied.
///
/// * Missing or unusable `scale_x`/`scale_y` default to 1.0 and are logged
///   separately from an explicit 1.0.
/// * When torso height was supplied and the estimator left `scale_y`
///   unresolved (missing, unusable or exactly 1.0), the vertical factor is
///   `torso_height / base.torso_height`.
pub fn resolve_scale(
    estimate: &ScaleEstimate,
    measurements: &MeasurementSet,
    base: &BaseMeasurements,
) -> ResolvedScale {
    let (x, x_source) = axis_from_estimate("scale_x", estimate.scale_x);
    let (mut y, mut y_source) = axis_from_estimate("scale_y", estimate.scale_y);

    if let Some(torso) = measurements.torso_height() {
        if y_source == ScaleSource::DefaultMissing || y == 1.0 {
            y = torso / base.torso_height;
            y_source = ScaleSource::TorsoOverride;
            info!(
                "scale_y unresolved by estimator; torso override {} / {} = {}",
                torso, base.torso_height, y
            );
        }
    }

    ResolvedScale {
        factor: ScaleFactor { x, y },
        x_source,
        y_source,
    }
}

fn axis_from_estimate(key: &str, value: Option<f64>) -> (f64, ScaleSource) {
    match value {
        Some(v) if is_valid(v) => {
            if v == 1.0 {
                info!("Estimator explicitly returned {} = 1.0", key);
            }
            (v, ScaleSource::Estimator)
        }
        Some(v) => {
            warn!("Estimator returned unusable {} = {}; defaulting to 1.0", key, v);
            (1.0, ScaleSource::DefaultMissing)
        }
        None => {
            warn!("Estimator omitted {}; defaulting to 1.0", key);
            (1.0, ScaleSource::DefaultMissing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(x: Option<f64>, y: Option<f64>) -> ScaleEstimate {
        ScaleEstimate {
            scale_x: x,
            scale_y: y,
            ..ScaleEstimate::default()
        }
    }

    #[test]
    fn estimator_values_are_used_verbatim() {
        let r = resolve_scale(
            &estimate(Some(1.1), Some(1.0)),
            &MeasurementSet::default(),
            &BaseMeasurements::default(),
        );
        assert_eq!(r.factor, ScaleFactor { x: 1.1, y: 1.0 });
        assert_eq!(r.x_source, ScaleSource::Estimator);
        assert_eq!(r.y_source, ScaleSource::Estimator);
    }

    #[test]
    fn missing_keys_default_to_identity() {
        let r = resolve_scale(
            &estimate(None, None),
            &MeasurementSet::default(),
            &BaseMeasurements::default(),
        );
        assert_eq!(r.factor, ScaleFactor::IDENTITY);
        assert_eq!(r.x_source, ScaleSource::DefaultMissing);
        assert_eq!(r.y_source, ScaleSource::DefaultMissing);
    }

    #[test]
    fn torso_overrides_unresolved_scale_y() {
        let m = MeasurementSet {
            torso_height: 33.0,
            ..MeasurementSet::default()
        };
        let r = resolve_scale(&estimate(Some(1.1), Some(1.0)), &m, &BaseMeasurements::default());
        assert_eq!(r.factor.y, 1.1);
        assert_eq!(r.y_source, ScaleSource::TorsoOverride);

        let r = resolve_scale(&estimate(Some(1.1), None), &m, &BaseMeasurements::default());
        assert_eq!(r.factor.y, 1.1);
    }

    #[test]
    fn torso_does_not_override_resolved_scale_y() {
        let m = MeasurementSet {
            torso_height: 33.0,
            ..MeasurementSet::default()
        };
        let r = resolve_scale(&estimate(None, Some(0.95)), &m, &BaseMeasurements::default());
        assert_eq!(r.factor.y, 0.95);
        assert_eq!(r.y_source, ScaleSource::Estimator);
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let r = resolve_scale(
            &estimate(Some(-2.0), Some(0.0)),
            &MeasurementSet::default(),
            &BaseMeasurements::default(),
        );
        assert_eq!(r.factor, ScaleFactor::IDENTITY);
        assert!(ScaleFactor::new(0.0, 1.0).is_none());
        assert!(ScaleFactor::new(1.0, f64::NAN).is_none());
    }

    #[test]
    fn transform_syntax() {
        assert_eq!(ScaleFactor { x: 1.1, y: 1.0 }.to_transform(), "scale(1.1,1)");
        assert_eq!(ScaleFactor { x: 0.5, y: 2.0 }.inverse(), ScaleFactor { x: 2.0, y: 0.5 });
    }
}
