//! Pattern summaries: short text descriptions of an uploaded document.
//!
//! A pattern SVG can be megabytes of path data. The estimator only needs to
//! know roughly what it is looking at (sheet size, how many pieces, which
//! labels), so the summary lists those facts and is trimmed to a few lines.

use crate::error::PatternError;
use crate::pipeline::render::PdfInfo;
use crate::pipeline::vector::parse_svg;
use serde::Serialize;
use std::collections::BTreeMap;

/// Tags that draw something on the sheet.
const DRAWABLE: [&str; 8] = [
    "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "text",
];

/// One drawable element, as listed on the result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternElement {
    pub tag: String,
    pub id: Option<String>,
    pub label: Option<String>,
}

/// Describe an SVG in at most `max_lines` lines.
///
/// Line order: root sheet size, element counts by tag (alphabetical), then
/// one line per text label.
pub fn summarize_svg(svg: &str, max_lines: usize) -> Result<String, PatternError> {
    let doc = parse_svg(svg)?;
    let root = doc.root_element();

    let mut lines = Vec::new();
    let mut sheet = format!("root: {}", root.tag_name().name());
    for attr in ["width", "height", "viewBox"] {
        if let Some(v) = root.attribute(attr) {
            sheet.push_str(&format!(" {attr}={v}"));
        }
    }
    lines.push(sheet);

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        let tag = node.tag_name().name();
        if DRAWABLE.contains(&tag) || tag == "g" {
            *counts.entry(tag).or_default() += 1;
        }
    }
    if !counts.is_empty() {
        let parts: Vec<String> = counts.iter().map(|(t, n)| format!("{t}: {n}")).collect();
        lines.push(format!("elements: {}", parts.join(", ")));
    }

    for el in extract_elements(svg)? {
        if let Some(label) = el.label {
            lines.push(format!("label: {label}"));
        }
    }

    lines.truncate(max_lines);
    Ok(lines.join("\n"))
}

/// Describe a PDF in at most `max_lines` lines.
pub fn summarize_pdf(info: &PdfInfo, max_lines: usize) -> String {
    let mut lines = vec![format!("pdf document: {} page(s)", info.page_count)];
    for (i, (w, h)) in info.page_sizes.iter().enumerate() {
        lines.push(format!(
            "page {}: {:.1} x {:.1} cm",
            i + 1,
            points_to_cm(*w),
            points_to_cm(*h)
        ));
    }
    lines.truncate(max_lines);
    lines.join("\n")
}

fn points_to_cm(pt: f32) -> f32 {
    pt / 72.0 * 2.54
}

/// List drawable elements with their ids and text labels.
///
/// A label is the trimmed text content of a `<text>` element, or the
/// `inkscape:label`/`aria-label` attribute of any drawable element.
pub fn extract_elements(svg: &str) -> Result<Vec<PatternElement>, PatternError> {
    let doc = parse_svg(svg)?;
    let elements = doc
        .descendants()
        .filter(|n| n.is_element() && DRAWABLE.contains(&n.tag_name().name()))
        .map(|n| {
            let text_label = if n.has_tag_name("text") {
                let text: String = n
                    .descendants()
                    .filter(|d| d.is_text())
                    .filter_map(|d| d.text())
                    .collect::<Vec<_>>()
                    .join(" ");
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                (!text.is_empty()).then_some(text)
            } else {
                None
            };
            let attr_label = n
                .attributes()
                .find(|a| a.name() == "label" || a.name() == "aria-label")
                .map(|a| a.value().to_string());
            PatternElement {
                tag: n.tag_name().name().to_string(),
                id: n.attribute("id").map(str::to_string),
                label: text_label.or(attr_label),
            }
        })
        .collect();
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" width="60cm" height="90cm" viewBox="0 0 600 900">
  <g id="front">
    <path id="front-outline" inkscape:label="Front piece" d="M0 0"/>
    <text x="10" y="10">Front <tspan>bodice</tspan></text>
  </g>
  <g id="back">
    <path d="M1 1"/>
    <path d="M2 2"/>
    <text>Back</text>
  </g>
</svg>"#;

    #[test]
    fn summary_lists_sheet_counts_and_labels() {
        let s = summarize_svg(DOC, 10).unwrap();
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "root: svg width=60cm height=90cm viewBox=0 0 600 900");
        assert_eq!(lines[1], "elements: g: 2, path: 3, text: 2");
        assert!(lines.contains(&"label: Front piece"));
        assert!(lines.contains(&"label: Front bodice"));
        assert!(lines.contains(&"label: Back"));
    }

    #[test]
    fn summary_is_trimmed() {
        let s = summarize_svg(DOC, 2).unwrap();
        assert_eq!(s.lines().count(), 2);
    }

    #[test]
    fn extract_elements_keeps_document_order() {
        let els = extract_elements(DOC).unwrap();
        let tags: Vec<&str> = els.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["path", "text", "path", "path", "text"]);
        assert_eq!(els[0].id.as_deref(), Some("front-outline"));
        assert_eq!(els[0].label.as_deref(), Some("Front piece"));
        assert_eq!(els[2].label, None);
    }

    #[test]
    fn pdf_summary_reports_pages_in_cm() {
        let info = PdfInfo {
            page_count: 2,
            page_sizes: vec![(595.0, 842.0), (72.0, 72.0)],
        };
        let s = summarize_pdf(&info, 10);
        assert!(s.starts_with("pdf document: 2 page(s)"));
        assert!(s.contains("page 2: 2.5 x 2.5 cm"), "got: {s}");
    }

    #[test]
    fn malformed_svg_propagates() {
        assert!(summarize_svg("<svg>", 10).is_err());
    }
}
