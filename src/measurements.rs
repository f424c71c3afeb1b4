//! Body measurements parsed from form input.
//!
//! Form fields arrive as optional strings. The resize flow is deliberately
//! lenient: anything that is not a finite number becomes the caller's
//! default (0.0), which the rest of the pipeline reads as "not supplied".
//! The generation flow needs specific measurements and uses
//! [`require_measurement`] instead, which fails loudly.

use crate::error::PatternError;
use serde::Serialize;

/// Parse a raw form value into a number, falling back to `default`.
///
/// Never fails: absent, empty, non-numeric, NaN and infinite inputs all
/// yield `default`.
pub fn parse_measurement(raw: Option<&str>, default: f64) -> f64 {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Parse a measurement the caller cannot proceed without.
///
/// `field` is the human-readable field name and `garment` the template
/// it is needed for; both end up in the 400 message.
pub fn require_measurement(
    raw: Option<&str>,
    field: &str,
    garment: &str,
) -> Result<f64, PatternError> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(PatternError::MissingMeasurement {
            field: capitalise(field),
            garment: garment.to_string(),
        });
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(PatternError::InvalidMeasurement {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The four measurements a resize request may carry, in centimetres.
///
/// `0.0` means "not supplied". Use [`MeasurementSet::torso_height`] for the
/// one field where absence changes behaviour, and
/// [`MeasurementSet::describe`] for the prompt text, which drops absent
/// circumferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MeasurementSet {
    pub bust: f64,
    pub waist: f64,
    pub hips: f64,
    pub torso_height: f64,
}

impl MeasurementSet {
    /// Build a set from raw form values; each missing value becomes 0.0.
    pub fn from_fields(
        bust: Option<&str>,
        waist: Option<&str>,
        hips: Option<&str>,
        torso_height: Option<&str>,
    ) -> Self {
        Self {
            bust: parse_measurement(bust, 0.0),
            waist: parse_measurement(waist, 0.0),
            hips: parse_measurement(hips, 0.0),
            torso_height: parse_measurement(torso_height, 0.0),
        }
    }

    /// Torso height, or `None` when it was not supplied.
    pub fn torso_height(&self) -> Option<f64> {
        (self.torso_height > 0.0).then_some(self.torso_height)
    }

    /// Circumferences that were supplied, as `(name, value)` pairs.
    pub fn supplied(&self) -> Vec<(&'static str, f64)> {
        [("bust", self.bust), ("waist", self.waist), ("hips", self.hips)]
            .into_iter()
            .filter(|(_, v)| *v > 0.0)
            .collect()
    }

    /// Prompt text, e.g. `bust = 90, hips = 95`. Zero circumferences are
    /// skipped; torso height is handled locally and never sent.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .supplied()
            .into_iter()
            .map(|(name, v)| format!("{name} = {v}"))
            .collect();
        if parts.is_empty() {
            "no measurements supplied".to_string()
        } else {
            parts.join(", ")
        }
    }
}
