//! Lexical helpers for recovering JSON from oracle text
//!
//! Everything here tracks whether the cursor sits inside a quoted string,
//! so braces, brackets and commas inside string values are never mistaken
//! for structure.

use std::borrow::Cow;
use std::ops::Range;

const FENCE: &str = "```";

/// Lexical position of the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexical {
    Code,
    InString,
    /// Inside a string, directly after an unescaped backslash
    Escape,
}

impl Lexical {
    /// Advance over `ch`, returning the new state
    fn advance(self, ch: char) -> Lexical {
        match (self, ch) {
            (Lexical::Code, '"') => Lexical::InString,
            (Lexical::Code, _) => Lexical::Code,
            (Lexical::InString, '\\') => Lexical::Escape,
            (Lexical::InString, '"') => Lexical::Code,
            (Lexical::InString, _) => Lexical::InString,
            (Lexical::Escape, _) => Lexical::InString,
        }
    }
}

/// Interior of the first fenced code block, if the text has one.
///
/// Fences only count at the start of a line. A JSON string cannot hold a raw
/// newline, so backticks inside string values or inline in prose never open
/// or close a block. An optional language tag (```` ```json ````) is skipped. A fence with no
/// closing marker runs to the end of the text, which is what a truncated
/// response looks like.
pub fn extract_fenced(text: &str) -> Option<&str> {
    let open = line_fence(text)?;
    let after_open = &text[open + FENCE.len()..];

    let tag_len = after_open
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];

    let interior = match line_fence(body) {
        Some(close) => &body[..close],
        None => body.trim_end().strip_suffix(FENCE).unwrap_or(body),
    };

    Some(interior.trim())
}

/// Byte offset of the first fence that starts a line
fn line_fence(text: &str) -> Option<usize> {
    if text.starts_with(FENCE) {
        return Some(0);
    }
    text.find("\n```").map(|newline| newline + 1)
}

/// Substring from the first `[` to the last `]`, inclusive.
///
/// Prose around the array is discarded. With no `]` after the opening
/// bracket the slice runs to the end (truncated array); with no `[` at all
/// the text is returned unchanged.
pub fn slice_array(text: &str) -> &str {
    let Some(start) = text.find('[') else {
        return text;
    };

    match text.rfind(']') {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    }
}

/// Text from the first `[` or `{` to the end.
///
/// Only the leading prose is cut. A stray quote there would otherwise flip
/// the string state of everything after it.
pub fn structural_tail(text: &str) -> &str {
    match text.find(|c: char| c == '[' || c == '{') {
        Some(start) => &text[start..],
        None => text,
    }
}

/// Drop commas that directly precede a closing `}` or `]`, ignoring
/// whitespace between them. Commas inside strings are left alone.
pub fn strip_trailing_commas(text: &str) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut state = Lexical::Code;

    for (index, ch) in text.char_indices() {
        if state == Lexical::Code && ch == ',' && closes_after(&text[index + 1..]) {
            out.get_or_insert_with(|| text[..index].to_string());
            continue;
        }

        state = state.advance(ch);
        if let Some(buf) = out.as_mut() {
            buf.push(ch);
        }
    }

    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(text),
    }
}

fn closes_after(rest: &str) -> bool {
    matches!(
        rest.chars().find(|c| !c.is_whitespace()),
        Some('}') | Some(']')
    )
}

/// String-aware brace-depth scanner.
///
/// Records a span each time depth goes 0 -> 1 -> 0, so every span is one
/// syntactically complete top-level object. An object cut off mid-stream
/// never closes and is left out.
#[derive(Debug)]
pub struct DepthScanner {
    state: Lexical,
    depth: usize,
    start: Option<usize>,
    spans: Vec<Range<usize>>,
}

impl DepthScanner {
    fn new() -> Self {
        Self {
            state: Lexical::Code,
            depth: 0,
            start: None,
            spans: Vec::new(),
        }
    }

    /// Byte ranges of every complete top-level object in `text`
    pub fn scan(text: &str) -> Vec<Range<usize>> {
        let mut scanner = Self::new();
        for (index, ch) in text.char_indices() {
            scanner.step(index, ch);
        }
        scanner.spans
    }

    /// The complete top-level objects in `text`, as slices
    pub fn complete_objects(text: &str) -> Vec<&str> {
        Self::scan(text)
            .into_iter()
            .map(|span| &text[span])
            .collect()
    }

    fn step(&mut self, index: usize, ch: char) {
        if self.state != Lexical::Code {
            self.state = self.state.advance(ch);
            return;
        }

        match ch {
            '"' => self.state = Lexical::InString,
            '{' => {
                if self.depth == 0 {
                    self.start = Some(index);
                }
                self.depth += 1;
            }
            '}' => {
                // stray closer outside any object
                if self.depth == 0 {
                    return;
                }
                self.depth -= 1;
                if self.depth == 0 {
                    if let Some(start) = self.start.take() {
                        self.spans.push(start..index + 1);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_with_json_tag() {
        let text = "```json\n[{\"a\":1}]\n```";
        assert_eq!(extract_fenced(text), Some("[{\"a\":1}]"));
    }

    #[test]
    fn test_extract_fenced_without_tag() {
        let text = "Here you go:\n```\n[1, 2]\n```\nThanks";
        assert_eq!(extract_fenced(text), Some("[1, 2]"));
    }

    #[test]
    fn test_extract_fenced_unterminated() {
        let text = "```json\n[{\"a\":1}, {\"b\":";
        assert_eq!(extract_fenced(text), Some("[{\"a\":1}, {\"b\":"));
    }

    #[test]
    fn test_extract_fenced_none() {
        assert_eq!(extract_fenced("[1]"), None);
    }

    #[test]
    fn test_extract_fenced_ignores_inline_backticks() {
        assert_eq!(extract_fenced("Tip: run ```aws configure``` first. [1]"), None);
        let text = r#"[{"a":"Run:\n```bash\nls\n```"}]"#;
        assert_eq!(extract_fenced(text), None);
    }

    #[test]
    fn test_extract_fenced_closes_on_line_fence() {
        let text = "```json\n[{\"a\":\"x ```sh``` y\"}]\n```\ntrailing ```note```";
        assert_eq!(extract_fenced(text), Some("[{\"a\":\"x ```sh``` y\"}]"));
    }

    #[test]
    fn test_extract_fenced_close_on_same_line() {
        assert_eq!(extract_fenced("```json\n[1, 2]```"), Some("[1, 2]"));
    }

    #[test]
    fn test_structural_tail_cuts_leading_prose() {
        assert_eq!(structural_tail("the 19\" rack: [{\"a\":1}"), "[{\"a\":1}");
        assert_eq!(structural_tail("note {\"a\":1}"), "{\"a\":1}");
        assert_eq!(structural_tail("no structure"), "no structure");
    }

    #[test]
    fn test_slice_array_discards_prose() {
        assert_eq!(slice_array("Sure! [1, 2] Hope that helps."), "[1, 2]");
    }

    #[test]
    fn test_slice_array_truncated() {
        assert_eq!(slice_array("prefix [{\"a\":1}, {\"b\""), "[{\"a\":1}, {\"b\"");
    }

    #[test]
    fn test_slice_array_no_bracket() {
        assert_eq!(slice_array("Sorry, I cannot comply."), "Sorry, I cannot comply.");
    }

    #[test]
    fn test_strip_trailing_commas() {
        assert_eq!(strip_trailing_commas("[{\"a\":1,},]"), "[{\"a\":1}]");
        assert_eq!(strip_trailing_commas("[1,\n  ]"), "[1\n  ]");
    }

    #[test]
    fn test_strip_trailing_commas_ignores_strings() {
        let text = r#"[{"a":"x,}","b":"y,]"}]"#;
        assert!(matches!(strip_trailing_commas(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_trailing_commas_after_escaped_quote() {
        let text = r#"[{"a":"say \"hi\",}",}]"#;
        assert_eq!(strip_trailing_commas(text), r#"[{"a":"say \"hi\",}"}]"#);
    }

    #[test]
    fn test_depth_scanner_complete_objects() {
        let text = r#"[{"a":1}, {"b":{"c":2}}, {"d":"#;
        assert_eq!(
            DepthScanner::complete_objects(text),
            vec![r#"{"a":1}"#, r#"{"b":{"c":2}}"#]
        );
    }

    #[test]
    fn test_depth_scanner_ignores_braces_in_strings() {
        let text = r#"{"a":"}{"} {"b":"\"}"}"#;
        assert_eq!(
            DepthScanner::complete_objects(text),
            vec![r#"{"a":"}{"}"#, r#"{"b":"\"}"}"#]
        );
    }

    #[test]
    fn test_depth_scanner_even_backslashes_close_string() {
        // "\\" is an escaped backslash, so the following quote closes the string
        let text = r#"{"a":"\\"} {"b":1}"#;
        assert_eq!(DepthScanner::scan(text).len(), 2);
    }

    #[test]
    fn test_depth_scanner_stray_closer() {
        let text = r#"} {"a":1}"#;
        assert_eq!(DepthScanner::complete_objects(text), vec![r#"{"a":1}"#]);
    }

    #[test]
    fn test_depth_scanner_multibyte() {
        let text = r#"[{"nome":"configuração"}, {"x":"#;
        assert_eq!(
            DepthScanner::complete_objects(text),
            vec![r#"{"nome":"configuração"}"#]
        );
    }

    #[test]
    fn test_depth_scanner_nothing_complete() {
        assert!(DepthScanner::scan("Sorry, I cannot comply.").is_empty());
        assert!(DepthScanner::scan(r#"[{"a":"#).is_empty());
    }
}
