//! Prompts sent to the estimator and instructions collaborators.
//!
//! The estimator's answer is parsed by substring matching on key names, so
//! the keys spelled out here are a wire contract with
//! [`crate::response`]: renaming one breaks parsing silently. Tests in this
//! module pin the keys.

use crate::config::BaseMeasurements;
use crate::pipeline::generate::GarmentKind;

/// Keys the resize prompt asks for, in answer order.
pub const RESIZE_KEYS: [&str; 5] = [
    "estimated_bust",
    "estimated_waist",
    "estimated_hips",
    "scale_x",
    "scale_y",
];

/// Build the resize prompt for the `key = value` line format.
///
/// `summary` is the condensed pattern description and `measurements` the
/// output of [`crate::measurements::MeasurementSet::describe`].
pub fn resize_prompt(
    pattern_type: &str,
    summary: &str,
    measurements: &str,
    base: &BaseMeasurements,
) -> String {
    format!(
        r#"You are a pattern-resizing assistant.

Here is a simplified summary of the uploaded {pattern_type} pattern:
{summary}

The user's measurements (cm) are:
{measurements}

{reference}

First estimate the pattern's original size (bust, waist and hips).
Then compute how much to scale the X and Y axes so the pattern matches the user's measurements.
Respond *exactly* in this format (no extra text):

estimated_bust = <number>
estimated_waist = <number>
estimated_hips = <number>
scale_x = <number>
scale_y = <number>"#,
        reference = reference_line(base),
    )
}

/// Build the resize prompt for the JSON answer format.
pub fn structured_resize_prompt(
    pattern_type: &str,
    summary: &str,
    measurements: &str,
    base: &BaseMeasurements,
) -> String {
    format!(
        r#"You are a pattern-resizing assistant.

Here is a simplified summary of the uploaded {pattern_type} pattern:
{summary}

The user's measurements (cm) are:
{measurements}

{reference}

First estimate the pattern's original size (bust, waist and hips).
Then compute how much to scale the X and Y axes so the pattern matches the user's measurements.
Respond with a single JSON object and nothing else, using exactly these keys:

{{"estimated_bust": <number>, "estimated_waist": <number>, "estimated_hips": <number>, "scale_x": <number>, "scale_y": <number>}}"#,
        reference = reference_line(base),
    )
}

fn reference_line(base: &BaseMeasurements) -> String {
    format!(
        "If the pattern does not state its size, assume it was drafted for bust = {}, waist = {}, hips = {}.",
        base.bust, base.waist, base.hips
    )
}

/// Build the prompt that asks for base dimensions of a generated garment.
///
/// The answer must be a single comma-separated line whose keys are
/// [`GarmentKind::response_keys`], in that order.
pub fn generation_prompt(kind: GarmentKind, measurements: &str) -> String {
    let format_line = kind
        .response_keys()
        .iter()
        .map(|k| format!("{k} = <number>"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"You are a sewing pattern drafting assistant.

Draft a simple {label} pattern piece for these body measurements (cm):
{measurements}

{hint}
Answer with exactly one line in this format, values in centimetres, no extra text:

{format_line}"#,
        label = kind.label(),
        hint = kind.drafting_hint(),
    )
}

/// Build the prompt for free-text sewing instructions.
pub fn instructions_prompt(pattern_type: &str, measurements: &str) -> String {
    format!(
        r#"You are an experienced sewing teacher.

Write clear, numbered, step-by-step sewing instructions for a {pattern_type}
that has been resized for these measurements (cm): {measurements}.

Cover cutting, seam allowances, assembly order, fitting checks and finishing.
Keep it under 400 words and do not repeat the measurements back."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_prompt_carries_every_key_and_input() {
        let p = resize_prompt(
            "dress",
            "root: svg",
            "bust = 90",
            &BaseMeasurements::default(),
        );
        for key in RESIZE_KEYS {
            assert!(p.contains(&format!("{key} = <number>")), "missing {key}");
        }
        assert!(p.contains("uploaded dress pattern"));
        assert!(p.contains("root: svg"));
        assert!(p.contains("bust = 90"));
    }

    #[test]
    fn resize_prompt_is_deterministic() {
        let base = BaseMeasurements::default();
        assert_eq!(
            resize_prompt("top", "s", "m", &base),
            resize_prompt("top", "s", "m", &base)
        );
    }

    #[test]
    fn structured_prompt_names_json_keys() {
        let p = structured_resize_prompt("skirt", "s", "waist = 70", &BaseMeasurements::default());
        for key in RESIZE_KEYS {
            assert!(p.contains(&format!("\"{key}\"")), "missing {key}");
        }
    }

    #[test]
    fn generation_prompt_uses_garment_keys() {
        let p = generation_prompt(GarmentKind::Corset, "waist = 70, bust = 90");
        assert!(p.contains("top_width = <number>, bottom_width = <number>, height = <number>"));
        let p = generation_prompt(GarmentKind::BikiniTop, "bust = 90");
        assert!(p.contains("width = <number>, height = <number>"));
        assert!(p.contains("bikini top"));
    }
}
