//! HTML escaping for generated pages.

use std::borrow::Cow;

/// Escape text content and attribute values.
///
/// Borrows when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Make a JSON literal safe to embed in an inline `<script>`.
pub fn script_safe(json: &str) -> Cow<'_, str> {
    if json.contains("</") {
        Cow::Owned(json.replace("</", "<\\/"))
    } else {
        Cow::Borrowed(json)
    }
}
