//! Pre-parse cleanup of decoded language file text.
//!
//! Files in the wild carry `//` and `/* … */` comments, literal tabs and
//! stray control characters, none of which strict JSON allows. The
//! scanner tracks in-string state (honoring backslash escapes) so that a
//! `//` inside a quoted value is never mistaken for a comment.

/// Scanner state.
enum State {
    /// Outside any string literal.
    Normal,
    /// Inside a `"…"` literal.
    InString,
    /// After `//`, consuming to end of line.
    LineComment,
    /// Inside `/* … */`.
    BlockComment,
}

/// Strip comments and normalize whitespace/control characters.
///
/// - `//` line comments are removed up to (not including) the newline.
/// - `/*…*/` block comments are replaced by a single space. An
///   unterminated block comment swallows the rest of the input.
/// - Tabs become single spaces.
/// - C0/C1 control characters other than newline and carriage return
///   become single spaces, inside and outside strings alike (a raw
///   control character inside a string is malformed JSON to begin with).
pub(super) fn clean_source(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut state = State::Normal;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                '"' => {
                    escaped = false;
                    state = State::InString;
                    out.push('"');
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                    out.push(' ');
                }
                _ => out.push(normalize_char(c)),
            },
            State::InString => {
                if escaped {
                    escaped = false;
                    out.push(normalize_char(c));
                } else {
                    match c {
                        '\\' => {
                            escaped = true;
                            out.push('\\');
                        }
                        '"' => {
                            state = State::Normal;
                            out.push('"');
                        }
                        _ => out.push(normalize_char(c)),
                    }
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                    out.push('\n');
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Normal;
                }
            }
        }
    }

    out
}

/// Map tabs and stray control characters to a space, pass newlines and
/// everything else through.
fn normalize_char(c: char) -> char {
    match c {
        '\n' | '\r' => c,
        // is_control() covers exactly the C0 and C1 ranges plus DEL
        c if c.is_control() => ' ',
        c => c,
    }
}
