//! Cleanup of sewing-instruction text returned by the language model.
//!
//! The instructions are shown verbatim inside a `<pre>` block, so model
//! quirks show up directly on the page: an outer code fence, `\r\n` line
//! endings, runs of blank lines, zero-width characters. Each rule below is
//! a pure `&str → String` pass.
//!
//! ## Rule Order
//!
//! Fences are stripped before line endings are normalised so the fence
//! regex sees the raw answer; invisible characters go before blank-line
//! collapsing because a line holding only a zero-width space is blank.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to raw instructions text.
///
/// 1. Strip an outer code fence (```` ```text ````, ```` ```markdown ````, bare)
/// 2. Normalise line endings (CRLF/CR → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Trim trailing whitespace per line
/// 5. Collapse 3+ consecutive blank lines down to 1
/// 6. Ensure the text ends with exactly one newline
pub fn clean_instructions(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Strip outer fence ────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Invisible characters ─────────────────────────────────────────────

static RE_INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{200B}\u{200C}\u{200D}\u{2060}\u{FEFF}\u{00AD}]").unwrap());

fn remove_invisible_chars(input: &str) -> String {
    RE_INVISIBLE.replace_all(input, "").into_owned()
}

// ── Rule 4: Trailing whitespace ──────────────────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Blank lines ──────────────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

// ── Rule 6: Final newline ────────────────────────────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed.trim_start_matches('\n'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_language_tag() {
        let raw = "```text\n1. Cut the fabric.\n2. Sew.\n```";
        assert_eq!(clean_instructions(raw), "1. Cut the fabric.\n2. Sew.\n");
    }

    #[test]
    fn leaves_inner_fences_alone() {
        let raw = "Intro\n```\ncode\n```\nOutro";
        assert_eq!(clean_instructions(raw), "Intro\n```\ncode\n```\nOutro\n");
    }

    #[test]
    fn normalises_crlf_and_trailing_space() {
        let raw = "1. Pin   \r\n2. Stitch\t\r\n";
        assert_eq!(clean_instructions(raw), "1. Pin\n2. Stitch\n");
    }

    #[test]
    fn collapses_blank_runs() {
        let raw = "Step one\n\n\n\n\nStep two";
        assert_eq!(clean_instructions(raw), "Step one\n\nStep two\n");
    }

    #[test]
    fn removes_zero_width_characters() {
        let raw = "\u{FEFF}Hem\u{200B} the edge\n\u{200B}\n\n\nPress";
        assert_eq!(clean_instructions(raw), "Hem the edge\n\nPress\n");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_instructions("  \n\n"), "");
    }
}
