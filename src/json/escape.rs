//! JSON string escaping for the serializer.
//!
//! Non-ASCII text is emitted literally, with three exceptions escaped as
//! uppercase `\uXXXX` to reproduce the byte-level form the upstream
//! toolchain writes: Private Use Area characters, noncharacters, and the
//! C1 control range (which the loader's cleanup pass would otherwise
//! replace with spaces, breaking the serialize/load round trip).

/// Append `s` to `out` as a quoted JSON string literal.
pub(super) fn push_json_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || needs_unicode_escape(c) => {
                push_unicode_escape(out, c);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Code points that must not be emitted literally.
const fn needs_unicode_escape(c: char) -> bool {
    matches!(c,
        // DEL and the C1 controls
        '\u{7F}'..='\u{9F}'
        // Private Use Area
        | '\u{E000}'..='\u{F8FF}'
        // Noncharacters
        | '\u{FDD0}'..='\u{FDEF}'
        | '\u{FFFE}'
        | '\u{FFFF}')
}

/// Uppercase `\uXXXX` escape. All escaped code points fit in the BMP.
fn push_unicode_escape(out: &mut String, c: char) {
    use std::fmt::Write as _;

    let _ = write!(out, "\\u{:04X}", c as u32);
}
