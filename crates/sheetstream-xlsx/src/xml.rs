//! Text escaping for SpreadsheetML parts

use std::borrow::Cow;
use std::fmt::Write;

use quick_xml::escape::escape;

/// Escape text content or an attribute value
///
/// Characters XML 1.0 cannot carry are written as `_xHHHH_`, and literal
/// text that already looks like such an escape has its underscore escaped
/// as `_x005F_` so readers do not decode it.
pub(crate) fn escape_text(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_restricted) && !s.contains("_x") {
        return escape(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for (i, c) in s.char_indices() {
        if is_restricted(c) {
            let _ = write!(out, "_x{:04X}_", c as u32);
        } else if c == '_' && looks_like_escape(&s[i..]) {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(escape(&out).into_owned())
}

/// Whether `<t>` needs `xml:space="preserve"` to keep `s` intact
pub(crate) fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}

fn is_restricted(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
    )
}

fn looks_like_escape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 7
        && b[1] == b'x'
        && b[2..6].iter().all(u8::is_ascii_hexdigit)
        && b[6] == b'_'
}
