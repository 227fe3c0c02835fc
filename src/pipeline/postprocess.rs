//! Post-processing: deterministic cleanup of generated lesson-plan text.
//!
//! The prompt asks for plain text with ALL-CAPS headings and hyphen
//! bullets, but models still slip into Markdown:
//!
//! - wrapping the whole reply in ` ``` ` fences
//! - `## Heading` or `**bold**` despite "DO NOT use markdown symbols"
//! - `*` or `•` bullets instead of `-`
//! - Windows-style `\r\n` line endings
//!
//! Each rule is a pure `&str → String` pass and is tested on its own.
//!
//! ## Rule Order
//!
//! Line endings are normalised before any line-based rule, bullets are
//! normalised before emphasis markers are stripped (a leading `* ` is a
//! bullet, not emphasis), and the final-newline pass runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw model output.
///
/// Rules (applied in order):
/// 1. Strip outer code fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Strip leading `#` heading markers
/// 5. Normalise `*`, `•` and `+` bullets to `- `
/// 6. Remove `**` / `__` emphasis markers
/// 7. Collapse 3+ consecutive blank lines down to 2
/// 8. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 9. Ensure the text ends with exactly one newline
pub fn clean_content(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = strip_heading_markers(&s);
    let s = normalise_bullets(&s);
    let s = strip_emphasis(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Strip outer fences ──────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:[A-Za-z]+)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_outer_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ──────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ───────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Strip heading markers ───────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").unwrap());

fn strip_heading_markers(input: &str) -> String {
    RE_HEADING.replace_all(input, "").to_string()
}

// ── Rule 5: Normalise bullets ───────────────────────────────────────────────

static RE_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)(?:[*•+]|-)[ \t]+").unwrap());

fn normalise_bullets(input: &str) -> String {
    RE_BULLET.replace_all(input, "${1}- ").to_string()
}

// ── Rule 6: Remove emphasis markers ─────────────────────────────────────────

fn strip_emphasis(input: &str) -> String {
    input.replace("**", "").replace("__", "")
}

// ── Rule 7: Collapse excessive blank lines ──────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 8: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 9: Ensure text ends with single newline ────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_outer_fences("```text\nHello\nWorld\n```"), "Hello\nWorld");
        assert_eq!(strip_outer_fences("```\nHello\n```"), "Hello");
        assert_eq!(strip_outer_fences("Hello"), "Hello");
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(trim_trailing_whitespace("  hello   \nworld  "), "  hello\nworld");
    }

    #[test]
    fn test_strip_heading_markers() {
        assert_eq!(
            strip_heading_markers("## LEARNING OBJECTIVES\ntext\n# Title"),
            "LEARNING OBJECTIVES\ntext\nTitle"
        );
        assert_eq!(strip_heading_markers("Item #3 stays"), "Item #3 stays");
    }

    #[test]
    fn test_normalise_bullets() {
        assert_eq!(
            normalise_bullets("* one\n• two\n  + three\n- four"),
            "- one\n- two\n  - three\n- four"
        );
        assert_eq!(normalise_bullets("2 * 3 = 6"), "2 * 3 = 6");
    }

    #[test]
    fn test_strip_emphasis() {
        assert_eq!(strip_emphasis("**Bold** and __under__"), "Bold and under");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_remove_invisible() {
        assert_eq!(
            remove_invisible_chars("hello\u{200B}world\u{FEFF}foo\u{00AD}bar"),
            "helloworldfoobar"
        );
    }

    #[test]
    fn test_ensure_final_newline() {
        assert_eq!(ensure_final_newline("hello"), "hello\n");
        assert_eq!(ensure_final_newline("hello\n\n\n"), "hello\n");
        assert_eq!(ensure_final_newline(""), "\n");
    }

    #[test]
    fn test_clean_content_full_pipeline() {
        let input = "```\n## LEARNING OBJECTIVES\r\n* **Define** loops   \r\n\n\n\n\n\nLESSON STRUCTURE (1 hour)\n• Intro\n```";
        let result = clean_content(input);
        assert_eq!(
            result,
            "LEARNING OBJECTIVES\n- Define loops\n\n\nLESSON STRUCTURE (1 hour)\n- Intro\n"
        );
    }
}
