//! Byte decoding with a fixed encoding fallback chain.
//!
//! Encodings are tried in priority order and the first one that decodes
//! without error wins. The order matches what the files in the wild were
//! written with; Latin-1 accepts any byte sequence, so it acts as the
//! effective catch-all and the chain is reproducible by construction.
//! No detection heuristics.

/// Supported source encodings, in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Encoding {
    Utf8,
    Utf8Bom,
    Latin1,
    Windows1252,
}

impl Encoding {
    const CHAIN: [Self; 4] = [Self::Utf8, Self::Utf8Bom, Self::Latin1, Self::Windows1252];

    const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Bom => "utf-8-bom",
            Self::Latin1 => "latin-1",
            Self::Windows1252 => "windows-1252",
        }
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode raw bytes with the fallback chain, stripping a leading BOM.
///
/// Returns the decoded text and the encoding that produced it, or `None`
/// if every attempt failed.
pub(super) fn decode(bytes: &[u8]) -> Option<(String, &'static str)> {
    for encoding in Encoding::CHAIN {
        let decoded = match encoding {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            Encoding::Utf8Bom => bytes
                .strip_prefix(UTF8_BOM)
                .and_then(|rest| std::str::from_utf8(rest).ok())
                .map(str::to_owned),
            Encoding::Latin1 => Some(decode_latin1(bytes)),
            Encoding::Windows1252 => decode_windows1252(bytes),
        };
        if let Some(text) = decoded {
            tracing::trace!(encoding = encoding.name(), "decoded language file bytes");
            return Some((strip_bom(text), encoding.name()));
        }
    }
    None
}

/// Remove a leading U+FEFF left behind by a plain UTF-8 decode of a
/// BOM-prefixed file.
fn strip_bom(text: String) -> String {
    match text.strip_prefix('\u{FEFF}') {
        Some(stripped) => stripped.to_owned(),
        None => text,
    }
}

/// Latin-1 maps every byte straight to U+0000..U+00FF, so this cannot fail.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Windows-1252 remaps 0x80..0x9F; five code points are undefined and
/// make the decode fail.
fn decode_windows1252(bytes: &[u8]) -> Option<String> {
    bytes.iter().map(|&b| windows1252_char(b)).collect()
}

fn windows1252_char(byte: u8) -> Option<char> {
    let c = match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        0x81 | 0x8D | 0x8F | 0x90 | 0x9D => return None,
        other => char::from(other),
    };
    Some(c)
}
