//! Parsing of estimator answers.
//!
//! The estimator is a general-purpose language model, so its answers drift:
//! markdown bold around keys, an `Output:` preamble, a sentence before the
//! numbers. Both parsers here tolerate that by scanning for key names as
//! substrings and reading the first number after `=`.
//!
//! Two flows use different failure rules:
//!
//! * **Resize** ([`ResponseDecoder`]) never fails. A missing key is left as
//!   `None` and the caller decides the fallback (see [`crate::scale`]).
//! * **Generation** ([`parse_generation_line`]) needs every dimension from
//!   one line and returns [`ResponseParseError`] otherwise.

use crate::config::ResponseStrategy;
use crate::error::ResponseParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Numbers the estimator reported for a resize request.
///
/// Every field is optional; `None` means the key never appeared or its
/// value could not be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleEstimate {
    pub estimated_bust: Option<f64>,
    pub estimated_waist: Option<f64>,
    pub estimated_hips: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
}

impl ScaleEstimate {
    fn set(&mut self, key: &str, value: f64) {
        match key {
            "estimated_bust" => self.estimated_bust = Some(value),
            "estimated_waist" => self.estimated_waist = Some(value),
            "estimated_hips" => self.estimated_hips = Some(value),
            "scale_x" => self.scale_x = Some(value),
            "scale_y" => self.scale_y = Some(value),
            _ => {}
        }
    }
}

/// Strategy for turning an estimator answer into a [`ScaleEstimate`].
pub trait ResponseDecoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Decode `text`. Never fails; unreadable fields stay `None`.
    fn decode(&self, text: &str) -> ScaleEstimate;
}

/// Line scanner for the `key = value` format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TolerantScan;

impl ResponseDecoder for TolerantScan {
    fn name(&self) -> &'static str {
        "tolerant-scan"
    }

    fn decode(&self, text: &str) -> ScaleEstimate {
        scan_scale_estimate(text)
    }
}

/// JSON decoder that falls back to [`TolerantScan`] when the answer holds
/// no parseable object.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredDecode;

impl ResponseDecoder for StructuredDecode {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn decode(&self, text: &str) -> ScaleEstimate {
        match decode_json_object(text) {
            Some(estimate) => estimate,
            None => {
                warn!("Estimator answer is not a JSON object; falling back to line scan");
                scan_scale_estimate(text)
            }
        }
    }
}

/// The decoder matching a configured strategy.
pub fn decoder_for(strategy: ResponseStrategy) -> Box<dyn ResponseDecoder> {
    match strategy {
        ResponseStrategy::TolerantScan => Box::new(TolerantScan),
        ResponseStrategy::Structured => Box::new(StructuredDecode),
    }
}

static RE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap());

/// Remove the decorations models like to add around answers.
fn strip_decorations(line: &str) -> String {
    line.replace("**", "").replace("Output:", "")
}

/// First number in `s`, if any.
fn first_number(s: &str) -> Option<f64> {
    RE_NUMBER
        .find(s)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Scan `key = value` lines for the resize keys.
///
/// For each line containing a key, the text after the first `=` is read as
/// a number. Later occurrences overwrite earlier ones.
pub fn scan_scale_estimate(text: &str) -> ScaleEstimate {
    let mut estimate = ScaleEstimate::default();
    for raw in text.lines() {
        let line = strip_decorations(raw);
        let Some((_, rhs)) = line.split_once('=') else {
            continue;
        };
        for key in crate::prompts::RESIZE_KEYS {
            if !line.contains(key) {
                continue;
            }
            match first_number(rhs) {
                Some(v) => estimate.set(key, v),
                None => warn!("Ignoring unreadable value for {} in {:?}", key, raw.trim()),
            }
        }
    }
    debug!("Scanned estimate: {:?}", estimate);
    estimate
}

/// Deserialise the first `{…}` span of `text`.
fn decode_json_object(text: &str) -> Option<ScaleEstimate> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<ScaleEstimate>(&text[start..=end]).ok()
}

/// Read the dimensions of a generated garment from the estimator's answer.
///
/// Takes the first line that mentions every key. That line is split on `,`
/// and the number after `=` in each of the first `keys.len()` segments is
/// returned, positionally.
pub fn parse_generation_line(text: &str, keys: &[&str]) -> Result<Vec<f64>, ResponseParseError> {
    let line = text
        .lines()
        .find(|line| keys.iter().all(|k| line.contains(k)))
        .ok_or_else(|| ResponseParseError::NoDataLine {
            keys: keys.iter().map(|k| k.to_string()).collect(),
        })?;

    let cleaned = strip_decorations(line);
    let mut segments = cleaned.split(',');
    keys.iter()
        .map(|key| {
            segments
                .next()
                .and_then(|seg| seg.split_once('='))
                .and_then(|(_, rhs)| first_number(rhs))
                .ok_or_else(|| ResponseParseError::MalformedValue {
                    key: key.to_string(),
                    line: line.trim().to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_reads_scale_in_either_order_with_prose() {
        let text = "Sure! Here you go.\nscale_y = 0.5\nSome commentary.\nscale_x = 2.0\n";
        let e = scan_scale_estimate(text);
        assert_eq!(e.scale_x, Some(2.0));
        assert_eq!(e.scale_y, Some(0.5));
        assert_eq!(e.estimated_bust, None);
    }

    #[test]
    fn scan_tolerates_markdown_and_output_prefix() {
        let text = "Output: **scale_x** = 1.05\n- **scale_y = 0.98**";
        let e = scan_scale_estimate(text);
        assert_eq!(e.scale_x, Some(1.05));
        assert_eq!(e.scale_y, Some(0.98));
    }

    #[test]
    fn scan_keeps_last_occurrence() {
        let e = scan_scale_estimate("scale_x = 1.2\nscale_x = 1.3");
        assert_eq!(e.scale_x, Some(1.3));
    }

    #[test]
    fn scan_reads_all_five_keys() {
        let text = "estimated_bust = 90\nestimated_waist = 70\nestimated_hips = 95\nscale_x = 1.1\nscale_y = 1.0";
        let e = scan_scale_estimate(text);
        assert_eq!(
            e,
            ScaleEstimate {
                estimated_bust: Some(90.0),
                estimated_waist: Some(70.0),
                estimated_hips: Some(95.0),
                scale_x: Some(1.1),
                scale_y: Some(1.0),
            }
        );
    }

    #[test]
    fn scan_skips_unreadable_values() {
        let e = scan_scale_estimate("scale_x = 1.4\nscale_x = unknown");
        assert_eq!(e.scale_x, Some(1.4));
    }

    #[test]
    fn structured_decodes_json_inside_fences() {
        let text = "```json\n{\"scale_x\": 1.2, \"scale_y\": 0.9, \"estimated_bust\": 88}\n```";
        let e = StructuredDecode.decode(text);
        assert_eq!(e.scale_x, Some(1.2));
        assert_eq!(e.scale_y, Some(0.9));
        assert_eq!(e.estimated_bust, Some(88.0));
        assert_eq!(e.estimated_hips, None);
    }

    #[test]
    fn structured_falls_back_to_scan() {
        let e = StructuredDecode.decode("scale_x = 2.0\nscale_y = 0.5");
        assert_eq!(e.scale_x, Some(2.0));
        assert_eq!(e.scale_y, Some(0.5));
    }

    #[test]
    fn decoder_for_selects_strategy() {
        assert_eq!(decoder_for(ResponseStrategy::TolerantScan).name(), "tolerant-scan");
        assert_eq!(decoder_for(ResponseStrategy::Structured).name(), "structured");
    }

    #[test]
    fn generation_line_extracts_values_positionally() {
        let text = "Here are the dimensions:\n**Output:** width = 24.5, height = 18";
        let v = parse_generation_line(text, &["width", "height"]).unwrap();
        assert_eq!(v, vec![24.5, 18.0]);
    }

    #[test]
    fn generation_line_requires_all_keys_on_one_line() {
        let text = "width = 20\nheight = 15";
        let err = parse_generation_line(text, &["width", "height"]).unwrap_err();
        assert!(matches!(err, ResponseParseError::NoDataLine { .. }));
    }

    #[test]
    fn generation_line_corset_three_values() {
        let text = "top_width = 30, bottom_width = 26.5, height = 38";
        let v = parse_generation_line(text, &["top_width", "bottom_width", "height"]).unwrap();
        assert_eq!(v, vec![30.0, 26.5, 38.0]);
    }

    #[test]
    fn generation_line_reports_malformed_value() {
        let err = parse_generation_line("width = wide, height = 10", &["width", "height"])
            .unwrap_err();
        assert_eq!(
            err,
            ResponseParseError::MalformedValue {
                key: "width".into(),
                line: "width = wide, height = 10".into(),
            }
        );
    }
}
