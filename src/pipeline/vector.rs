//! Vector scaling: wrap an SVG's content in a `scale(sx,sy)` group.
//!
//! The document is parsed with `roxmltree` only to validate it and locate
//! the root element's children by byte range. The output is the original
//! text with a `<g>` spliced around those children, so every element,
//! attribute, namespace prefix, comment and whitespace run survives
//! byte-for-byte. Scaling an already-scaled document nests a second group.

use crate::error::PatternError;
use crate::scale::ScaleFactor;
use roxmltree::{Document, ParsingOptions};
use tracing::debug;

/// Parse an SVG, allowing the DOCTYPE declarations many editors emit.
pub(crate) fn parse_svg(svg: &str) -> Result<Document<'_>, PatternError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(svg, options).map_err(|e| PatternError::MalformedDocument {
        detail: e.to_string(),
    })
}

/// Wrap every child of the root element in `<g transform="scale(sx,sy)">`.
///
/// Returns [`PatternError::MalformedDocument`] when `svg` is not
/// well-formed XML.
pub fn scale_svg(svg: &str, factor: ScaleFactor) -> Result<String, PatternError> {
    let doc = parse_svg(svg)?;
    let root = doc.root_element();
    let open = format!(r#"<g transform="{}">"#, factor.to_transform());
    let close = "</g>";

    let mut out = String::with_capacity(svg.len() + open.len() + close.len() + 16);

    match (root.first_child(), root.last_child()) {
        (Some(first), Some(last)) => {
            let start = first.range().start;
            let end = last.range().end;
            out.push_str(&svg[..start]);
            out.push_str(&open);
            out.push_str(&svg[start..end]);
            out.push_str(close);
            out.push_str(&svg[end..]);
        }
        _ => {
            // Childless root: `<svg …/>` or `<svg …></svg>`.
            let range = root.range();
            let element = &svg[range.clone()];
            if let Some(head) = element.strip_suffix("/>") {
                let name = raw_tag_name(element);
                out.push_str(&svg[..range.start]);
                out.push_str(head.trim_end());
                out.push('>');
                out.push_str(&open);
                out.push_str(close);
                out.push_str(&format!("</{name}>"));
                out.push_str(&svg[range.end..]);
            } else {
                let split = range.start
                    + element.rfind("</").ok_or_else(|| PatternError::MalformedDocument {
                        detail: "root element has no closing tag".into(),
                    })?;
                out.push_str(&svg[..split]);
                out.push_str(&open);
                out.push_str(close);
                out.push_str(&svg[split..]);
            }
        }
    }

    debug!(
        "Scaled SVG by {} ({} → {} bytes)",
        factor.to_transform(),
        svg.len(),
        out.len()
    );
    Ok(out)
}

/// Tag name exactly as written in the source, prefix included.
fn raw_tag_name(element: &str) -> &str {
    let body = element.trim_start_matches('<');
    let end = body
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(body.len());
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50">
  <path id="front" d="M0 0 L10 10" stroke="black"/>
  <rect x="1" y="2" width="3" height="4" fill="none"/>
  <text x="5" y="5">Front bodice</text>
</svg>"#;

    fn element_names(node: roxmltree::Node<'_, '_>) -> Vec<String> {
        node.children()
            .filter(|n| n.is_element())
            .map(|n| n.tag_name().name().to_string())
            .collect()
    }

    #[test]
    fn wraps_children_in_single_group() {
        let out = scale_svg(DOC, ScaleFactor { x: 1.1, y: 1.0 }).unwrap();
        let doc = Document::parse(&out).unwrap();
        let root = doc.root_element();
        let top: Vec<_> = root.children().filter(|n| n.is_element()).collect();
        assert_eq!(top.len(), 1);
        let g = top[0];
        assert_eq!(g.tag_name().name(), "g");
        assert_eq!(g.attribute("transform"), Some("scale(1.1,1)"));
        assert_eq!(element_names(g), vec!["path", "rect", "text"]);
        // attributes survive untouched
        assert!(out.contains(r#"<path id="front" d="M0 0 L10 10" stroke="black"/>"#));
        assert_eq!(root.attribute("viewBox"), Some("0 0 100 50"));
    }

    #[test]
    fn scaling_twice_nests_groups() {
        let f = ScaleFactor { x: 2.0, y: 0.5 };
        let once = scale_svg(DOC, f).unwrap();
        let twice = scale_svg(&once, f.inverse()).unwrap();
        let doc = Document::parse(&twice).unwrap();
        let outer = doc.root_element().children().find(|n| n.is_element()).unwrap();
        let inner = outer.children().find(|n| n.is_element()).unwrap();
        assert_eq!(outer.attribute("transform"), Some("scale(0.5,2)"));
        assert_eq!(inner.attribute("transform"), Some("scale(2,0.5)"));
        assert_eq!(element_names(inner), vec!["path", "rect", "text"]);
    }

    #[test]
    fn self_closing_root_gets_empty_group() {
        let out = scale_svg(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#, ScaleFactor::IDENTITY)
            .unwrap();
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g transform="scale(1,1)"></g></svg>"#
        );
        Document::parse(&out).unwrap();
    }

    #[test]
    fn empty_root_with_closing_tag() {
        let out = scale_svg("<svg></svg>", ScaleFactor { x: 3.0, y: 3.0 }).unwrap();
        assert_eq!(out, r#"<svg><g transform="scale(3,3)"></g></svg>"#);
    }

    #[test]
    fn prefixed_root_keeps_prefix() {
        let src = r#"<s:svg xmlns:s="http://www.w3.org/2000/svg"><s:circle r="2"/></s:svg>"#;
        let out = scale_svg(src, ScaleFactor { x: 2.0, y: 2.0 }).unwrap();
        assert_eq!(
            out,
            r#"<s:svg xmlns:s="http://www.w3.org/2000/svg"><g transform="scale(2,2)"><s:circle r="2"/></g></s:svg>"#
        );
    }

    #[test]
    fn doctype_is_accepted() {
        let src = "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n<svg><line x1=\"0\"/></svg>";
        let out = scale_svg(src, ScaleFactor::IDENTITY).unwrap();
        assert!(out.starts_with("<!DOCTYPE svg"));
    }

    #[test]
    fn malformed_document_is_rejected() {
        let err = scale_svg("<svg><path></svg>", ScaleFactor::IDENTITY).unwrap_err();
        assert!(matches!(err, PatternError::MalformedDocument { .. }));
        assert_eq!(err.status(), 400);
    }
}
