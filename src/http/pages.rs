//! HTML pages. Plain `format!` templates; every interpolated user value goes
//! through [`escape`].
//!
//! Scaled uploads are not inlined as `<svg>` markup. They are embedded as a
//! base64 `data:image/svg+xml` `<img>`, which renders the same drawing but
//! never executes scripts or event handlers carried by the upload. Garment
//! templates are generated here and are inlined directly.

use crate::output::{RenderedPattern, ResizeOutput};
use crate::pipeline::generate::GeneratedPattern;
use crate::scale::ScaleSource;
use base64::{engine::general_purpose::STANDARD, Engine as _};

const STYLE: &str = "body{font-family:sans-serif;max-width:60rem;margin:2rem auto;padding:0 1rem}\
fieldset{margin-bottom:1.5rem}label{display:block;margin:.4rem 0}\
.pattern img,.pattern svg{max-width:100%;height:auto;border:1px solid #ccc}\
table{border-collapse:collapse}td,th{border:1px solid #ddd;padding:.2rem .5rem}\
pre{white-space:pre-wrap;background:#f6f6f6;padding:1rem}.error{color:#a00}";

/// Escape text for HTML element content and quoted attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title>\
<style>{STYLE}</style></head><body>{body}</body></html>",
        escape(title)
    )
}

/// Upload and generate forms.
pub fn index() -> String {
    let body = r#"<h1>Pattern resizer</h1>
<form action="/upload" method="post" enctype="multipart/form-data">
<fieldset><legend>Resize a pattern</legend>
<label>Pattern type <input name="pattern" placeholder="dress"></label>
<label>Bust (cm) <input name="bust" inputmode="decimal"></label>
<label>Waist (cm) <input name="waist" inputmode="decimal"></label>
<label>Hips (cm) <input name="hips" inputmode="decimal"></label>
<label>Torso height (cm) <input name="torso_height" inputmode="decimal"></label>
<label>Pattern file (SVG or PDF) <input type="file" name="svg_file" accept=".svg,.pdf" required></label>
<button type="submit">Resize</button>
</fieldset></form>
<form action="/generate" method="post">
<fieldset><legend>Generate a pattern</legend>
<label>Garment <select name="pattern">
<option value="bikini_top">Bikini top</option>
<option value="bikini_bottom">Bikini bottom</option>
<option value="corset">Corset</option>
</select></label>
<label>Bust (cm) <input name="bust" inputmode="decimal"></label>
<label>Waist (cm) <input name="waist" inputmode="decimal"></label>
<button type="submit">Generate</button>
</fieldset></form>"#;
    layout("Pattern resizer", body)
}

fn source_note(source: ScaleSource) -> &'static str {
    match source {
        ScaleSource::Estimator => "estimated",
        ScaleSource::DefaultMissing => "default, estimator gave no value",
        ScaleSource::TorsoOverride => "from torso height",
    }
}

/// Result of a resize.
///
/// Vector results embed the scaled markup as an `<img>` data URI rather than
/// inline; paged results show one preview per page.
pub fn resize_result(out: &ResizeOutput) -> String {
    let mut body = String::from("<h1>Resized pattern</h1>");
    let f = out.scale.factor;
    body.push_str(&format!(
        "<p>Horizontal scale <strong>{:.3}</strong> ({}), vertical scale <strong>{:.3}</strong> ({}).</p>",
        f.x,
        source_note(out.scale.x_source),
        f.y,
        source_note(out.scale.y_source)
    ));

    let estimated: Vec<String> = [
        ("bust", out.estimate.estimated_bust),
        ("waist", out.estimate.estimated_waist),
        ("hips", out.estimate.estimated_hips),
    ]
    .into_iter()
    .filter_map(|(name, v)| v.map(|v| format!("{name} {v}")))
    .collect();
    if !estimated.is_empty() {
        body.push_str(&format!(
            "<p>Estimated original size: {}.</p>",
            escape(&estimated.join(", "))
        ));
    }

    let download = format!(
        "/download/{}/{}",
        escape(&out.job_id),
        escape(out.download_name())
    );
    body.push_str("<div class=\"pattern\">");
    match &out.rendered {
        RenderedPattern::Vector { svg, .. } => {
            // Uploaded markup is shown as an image so embedded scripts never run.
            body.push_str(&format!(
                "<img alt=\"scaled pattern\" src=\"data:image/svg+xml;base64,{}\">",
                STANDARD.encode(svg)
            ));
        }
        RenderedPattern::Paged { pages, .. } => {
            for page in pages {
                body.push_str(&format!(
                    "<figure><img alt=\"page {n}\" src=\"{src}\"><figcaption>\
<a href=\"/download/{job}/{file}\">page {n}</a> ({w} x {h} px)</figcaption></figure>",
                    n = page.page,
                    src = page.preview,
                    job = escape(&out.job_id),
                    file = escape(&page.file),
                    w = page.width_px,
                    h = page.height_px
                ));
            }
        }
    }
    body.push_str("</div>");
    body.push_str(&format!(
        "<p><a href=\"{download}\" download>Download {}</a></p>",
        escape(out.download_name())
    ));

    if !out.elements.is_empty() {
        body.push_str("<h2>Elements</h2><table><tr><th>tag</th><th>id</th><th>label</th></tr>");
        for el in &out.elements {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&el.tag),
                escape(el.id.as_deref().unwrap_or("")),
                escape(el.label.as_deref().unwrap_or(""))
            ));
        }
        body.push_str("</table>");
    }

    match (&out.instructions, &out.instructions_error) {
        (Some(text), _) => {
            body.push_str(&format!("<h2>Sewing instructions</h2><pre>{}</pre>", escape(text)));
        }
        (None, Some(_)) => {
            body.push_str("<h2>Sewing instructions</h2><p>Instructions are unavailable right now.</p>");
        }
        (None, None) => {}
    }

    body.push_str("<p><a href=\"/\">Resize another pattern</a></p>");
    layout("Resized pattern", &body)
}

/// Result of a generation. The SVG is produced locally and shown inline.
pub fn generate_result(pattern: &GeneratedPattern) -> String {
    let d = pattern.dimensions;
    let body = format!(
        "<h1>Generated {label}</h1>\
<p>Top width {tw:.1} cm, bottom width {bw:.1} cm, height {h:.1} cm. \
Dashed line: stitch line; 1 cm seam allowance included.</p>\
<div class=\"pattern\">{svg}</div>\
<p><a href=\"/\">Back</a></p>",
        label = pattern.kind.label(),
        tw = d.top_width,
        bw = d.bottom_width,
        h = d.height,
        svg = pattern.svg
    );
    layout(&format!("Generated {}", pattern.kind.label()), &body)
}

/// Error page.
pub fn error(status: u16, message: &str) -> String {
    let body = format!(
        "<h1>Error {status}</h1><p class=\"error\">{}</p><p><a href=\"/\">Back</a></p>",
        escape(message)
    );
    layout("Error", &body)
}
