//! Standalone-include reindentation.
//!
//! An include alone on an indented line expands with every line of its
//! content carrying that indentation. An include sharing its line with
//! other content is left as is.

use smallvec::SmallVec;

/// The last line of `preceding` when it is non-empty and all whitespace.
pub fn trailing_indent(preceding: &str) -> Option<&str> {
    let last_line = preceding.rsplit('\n').next()?;
    (!last_line.is_empty() && last_line.chars().all(char::is_whitespace)).then_some(last_line)
}

/// Prefix every line of `text` after the first with `indent`.
pub fn apply_indent(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    let lines: SmallVec<[&str; 8]> = text.split('\n').collect();
    let mut out = String::with_capacity(text.len() + indent.len() * lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(indent);
        }
        out.push_str(line);
    }
    out
}
