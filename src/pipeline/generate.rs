//! Garment templates: draft simple pattern pieces from base dimensions.
//!
//! Output is a standalone SVG whose user unit is one centimetre
//! (`width="Wcm"` with `viewBox="0 0 W H"`), so it prints at true size.
//! Each piece has a solid cut line, a dashed stitch line inset by the seam
//! allowance and a centred label.

use crate::error::{PatternError, ResponseParseError};
use serde::Serialize;
use std::str::FromStr;

/// Seam allowance, in centimetres.
pub const SEAM_ALLOWANCE_CM: f64 = 1.0;

/// Margin around the piece on the sheet, in centimetres.
const MARGIN_CM: f64 = 2.0;

/// Garments the generation flow can draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentKind {
    BikiniTop,
    BikiniBottom,
    Corset,
}

impl FromStr for GarmentKind {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bikini_top" => Ok(GarmentKind::BikiniTop),
            "bikini_bottom" => Ok(GarmentKind::BikiniBottom),
            "corset" => Ok(GarmentKind::Corset),
            other => Err(PatternError::UnknownGarment {
                name: other.to_string(),
            }),
        }
    }
}

impl GarmentKind {
    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            GarmentKind::BikiniTop => "bikini top",
            GarmentKind::BikiniBottom => "bikini bottom",
            GarmentKind::Corset => "corset",
        }
    }

    /// Form fields this garment cannot be drafted without.
    pub fn required_measurements(&self) -> &'static [&'static str] {
        match self {
            GarmentKind::BikiniTop => &["bust"],
            GarmentKind::BikiniBottom => &["waist"],
            GarmentKind::Corset => &["waist", "bust"],
        }
    }

    /// Keys of the estimator's single data line, in answer order.
    pub fn response_keys(&self) -> &'static [&'static str] {
        match self {
            GarmentKind::BikiniTop | GarmentKind::BikiniBottom => &["width", "height"],
            GarmentKind::Corset => &["top_width", "bottom_width", "height"],
        }
    }

    pub(crate) fn drafting_hint(&self) -> &'static str {
        match self {
            GarmentKind::BikiniTop => {
                "Give the width at the base of one triangular cup and its height from base to apex."
            }
            GarmentKind::BikiniBottom => {
                "Give the width of the front panel at the waistband and its height from waistband to crotch."
            }
            GarmentKind::Corset => {
                "Give the top width, bottom width and height of one front corset panel."
            }
        }
    }
}

/// Dimensions of a drafted piece, in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GarmentDimensions {
    /// Width at the top edge (waistband, neckline, cup base).
    pub top_width: f64,
    /// Width at the bottom edge.
    pub bottom_width: f64,
    pub height: f64,
}

impl GarmentDimensions {
    /// Map the estimator's positional values onto dimensions for `kind`.
    ///
    /// `values` must have `kind.response_keys().len()` entries.
    pub fn from_values(kind: GarmentKind, values: &[f64]) -> Result<Self, PatternError> {
        if let Some((key, v)) = kind
            .response_keys()
            .iter()
            .zip(values)
            .find(|(_, v)| !(v.is_finite() && **v > 0.0))
        {
            return Err(ResponseParseError::NonPositive {
                key: key.to_string(),
                value: *v,
            }
            .into());
        }
        match (kind, values) {
            (GarmentKind::BikiniTop | GarmentKind::BikiniBottom, [width, height]) => Ok(Self {
                top_width: *width,
                bottom_width: *width,
                height: *height,
            }),
            (GarmentKind::Corset, [top, bottom, height]) => Ok(Self {
                top_width: *top,
                bottom_width: *bottom,
                height: *height,
            }),
            _ => Err(PatternError::Internal(format!(
                "{} needs {} values, got {}",
                kind.label(),
                kind.response_keys().len(),
                values.len()
            ))),
        }
    }
}

/// A drafted pattern piece.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPattern {
    pub kind: GarmentKind,
    pub dimensions: GarmentDimensions,
    pub svg: String,
}

/// Draft `kind` at `dims`.
pub fn generate_pattern(kind: GarmentKind, dims: GarmentDimensions) -> GeneratedPattern {
    let outline = match kind {
        GarmentKind::BikiniTop => bikini_top_outline(&dims),
        GarmentKind::BikiniBottom => bikini_bottom_outline(&dims),
        GarmentKind::Corset => corset_outline(&dims),
    };
    let svg = render_sheet(kind, &dims, &outline);
    GeneratedPattern {
        kind,
        dimensions: dims,
        svg,
    }
}

/// Cut line and stitch line path data.
struct Outline {
    cut: String,
    stitch: String,
}

fn bikini_top_outline(d: &GarmentDimensions) -> Outline {
    // Triangular cup: base on the bottom edge, apex centred on top.
    let (w, h, sa) = (d.bottom_width, d.height, SEAM_ALLOWANCE_CM);
    let cut = format!("M 0 {h} L {} 0 L {w} {h} Z", w / 2.0);
    let stitch = format!(
        "M {sa} {} L {} {} L {} {} Z",
        h - sa,
        w / 2.0,
        sa * 2.0,
        w - sa,
        h - sa
    );
    Outline { cut, stitch }
}

fn bikini_bottom_outline(d: &GarmentDimensions) -> Outline {
    // Front panel: full width at the waistband, curved leg openings down to
    // a gusset one fifth of the width.
    let (w, h, sa) = (d.top_width, d.height, SEAM_ALLOWANCE_CM);
    let g = w / 5.0;
    let (gl, gr) = ((w - g) / 2.0, (w + g) / 2.0);
    let cut = format!(
        "M 0 0 L {w} 0 Q {gr} {} {gr} {h} L {gl} {h} Q {gl} {} 0 0 Z",
        h * 0.45,
        h * 0.45
    );
    let stitch = format!(
        "M {sa} {sa} L {} {sa} Q {} {} {} {} L {} {} Q {} {} {sa} {sa} Z",
        w - sa,
        gr - sa,
        h * 0.45,
        gr - sa,
        h - sa,
        gl + sa,
        h - sa,
        gl + sa,
        h * 0.45
    );
    Outline { cut, stitch }
}

fn corset_outline(d: &GarmentDimensions) -> Outline {
    // Panel tapering from top to bottom width, edges centred.
    let (top, bottom, h, sa) = (d.top_width, d.bottom_width, d.height, SEAM_ALLOWANCE_CM);
    let wide = top.max(bottom);
    let (tl, tr) = ((wide - top) / 2.0, (wide + top) / 2.0);
    let (bl, br) = ((wide - bottom) / 2.0, (wide + bottom) / 2.0);
    let cut = format!("M {tl} 0 L {tr} 0 L {br} {h} L {bl} {h} Z");
    let stitch = format!(
        "M {} {sa} L {} {sa} L {} {} L {} {} Z",
        tl + sa,
        tr - sa,
        br - sa,
        h - sa,
        bl + sa,
        h - sa
    );
    Outline { cut, stitch }
}

fn render_sheet(kind: GarmentKind, d: &GarmentDimensions, outline: &Outline) -> String {
    let piece_w = d.top_width.max(d.bottom_width);
    let sheet_w = piece_w + 2.0 * MARGIN_CM;
    let sheet_h = d.height + 2.0 * MARGIN_CM;
    let font = (piece_w.min(d.height) / 10.0).clamp(0.6, 2.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{sheet_w:.2}cm" height="{sheet_h:.2}cm" viewBox="0 0 {sheet_w:.2} {sheet_h:.2}">"#
    ));
    svg.push_str(&format!(
        r#"<g transform="translate({MARGIN_CM},{MARGIN_CM})" fill="none" stroke="black">"#
    ));
    svg.push_str(&format!(
        r#"<path class="cut" d="{}" stroke-width="0.1"/>"#,
        outline.cut
    ));
    svg.push_str(&format!(
        r#"<path class="stitch" d="{}" stroke-width="0.05" stroke-dasharray="0.4 0.2"/>"#,
        outline.stitch
    ));
    svg.push_str(&format!(
        r#"<text x="{:.2}" y="{:.2}" font-size="{font:.2}" text-anchor="middle" fill="black" stroke="none">{} ({:.1} x {:.1} cm)</text>"#,
        piece_w / 2.0,
        d.height * 0.6,
        kind.label(),
        piece_w,
        d.height
    ));
    svg.push_str("</g></svg>");
    svg
}
