//! Indentation and comment helpers over a host document.
//!
//! Columns are byte offsets into the line text.

use once_cell::sync::Lazy;
use regex::Regex;

/// What the helpers need from the editor.
pub trait Document {
    fn line(&self, row: usize) -> &str;

    fn line_count(&self) -> usize;

    /// `(row, column)` of the bracket matching the one at `(row, column)`.
    fn find_matching_bracket(&self, row: usize, column: usize) -> Option<(usize, usize)>;

    /// Replace `start..end` of `row` with `text`.
    fn replace(&mut self, row: usize, start: usize, end: usize, text: &str);
}

static INDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*").unwrap());
static OPENS_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\b(?:then|else|return)|[{(]|<\w+>)\s*$").unwrap());
static CLOSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*[})])").unwrap());
static BLANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+$").unwrap());
static COMMENTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)\(:(.*):\)\s*$").unwrap());

/// Leading whitespace of `line`.
pub fn indent_of(line: &str) -> &str {
    INDENT.find(line).map_or("", |m| m.as_str())
}

/// Indentation for a line inserted after `line`.
pub fn next_line_indent(line: &str, tab: &str) -> String {
    let mut indent = indent_of(line).to_string();
    if OPENS_BLOCK.is_match(line) {
        indent.push_str(tab);
    }
    indent
}

/// Typing `input` on the blank `line` should pull it back a level.
pub fn check_outdent(line: &str, input: &str) -> bool {
    BLANK.is_match(line) && input.trim_start().starts_with(['}', ')'])
}

/// Align a line that starts with a closing bracket with the line of its
/// opening partner. Returns whether the line changed.
pub fn auto_outdent<D: Document + ?Sized>(doc: &mut D, row: usize) -> bool {
    let Some(closer) = CLOSER.captures(doc.line(row)).and_then(|c| c.get(1)) else {
        return false;
    };
    let column = closer.end() - 1;
    let Some((open_row, _)) = doc.find_matching_bracket(row, column) else {
        return false;
    };
    if open_row == row {
        return false;
    }
    let indent = indent_of(doc.line(open_row)).to_string();
    if indent_of(doc.line(row)) == indent {
        return false;
    }
    doc.replace(row, 0, column, &indent);
    true
}

/// Wrap rows `start..=end` in `(: ... :)`, or unwrap them when every
/// non-blank row already is.
pub fn toggle_comment_lines<D: Document + ?Sized>(doc: &mut D, start: usize, end: usize) {
    let end = end.min(doc.line_count().saturating_sub(1));
    if start > end {
        return;
    }
    let rows = start..=end;
    let uncomment = rows
        .clone()
        .filter(|&r| !doc.line(r).trim().is_empty())
        .all(|r| COMMENTED.is_match(doc.line(r)));

    for row in rows {
        let line = doc.line(row);
        if line.trim().is_empty() {
            continue;
        }
        let replacement = if uncomment {
            match COMMENTED.captures(line) {
                Some(c) => {
                    let body = &c[2];
                    let body = body.strip_prefix(' ').unwrap_or(body);
                    let body = body.strip_suffix(' ').unwrap_or(body);
                    format!("{}{}", &c[1], body)
                }
                None => continue,
            }
        } else {
            let indent = indent_of(line);
            format!("{}(: {} :)", indent, &line[indent.len()..])
        };
        let len = line.len();
        doc.replace(row, 0, len, &replacement);
    }
}
