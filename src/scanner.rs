// ABOUTME: Inline text scanner resolving backslash escapes and character references
// ABOUTME: Splits text into literal runs and decoded references before LaTeX emission

use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;

use crate::escape::{escape_char, escape_latex};
use crate::render::Sink;

/// Longest decimal reference body accepted (`&#9999999;`).
const MAX_DECIMAL_DIGITS: usize = 7;
/// Longest hexadecimal reference body accepted (`&#x10FFFF;`).
const MAX_HEX_DIGITS: usize = 6;

/// HTML5 named character references, keyed without `&` and `;`.
///
/// Legacy forms lacking the trailing semicolon are left out.
static ENTITIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    entities::ENTITIES
        .iter()
        .filter_map(|e| {
            let name = e.entity.strip_prefix('&')?.strip_suffix(';')?;
            Some((name, e.characters))
        })
        .collect()
});

/// Look up a named character reference (without `&` and `;`).
pub fn lookup_entity(name: &str) -> Option<&'static str> {
    ENTITIES.get(name).copied()
}

/// A piece of scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Source text copied as-is, still subject to LaTeX escaping.
    Literal(&'a str),
    /// The display characters of a resolved reference.
    Decoded(Cow<'static, str>),
}

/// Splits a text span into literal runs and decoded references.
///
/// A backslash before ASCII punctuation is dropped and the punctuation is
/// kept literally. `&#x..;`, `&#..;` and `&name;` references are decoded;
/// anything that fails to parse stays in the literal run.
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    run_start: usize,
    queued: Option<Segment<'a>>,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            run_start: 0,
            queued: None,
        }
    }

    /// Emit the pending run `[run_start, end)` if it is non-empty.
    fn flush(&mut self, end: usize) -> Option<Segment<'a>> {
        let run = &self.src[self.run_start..end];
        if run.is_empty() {
            None
        } else {
            Some(Segment::Literal(run))
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if let Some(segment) = self.queued.take() {
            return Some(segment);
        }

        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() {
            let i = self.pos;
            match bytes[i] {
                b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => {
                    let run = self.flush(i);
                    // Resume the run at the punctuation, which is not re-examined.
                    self.run_start = i + 1;
                    self.pos = i + 2;
                    if run.is_some() {
                        return run;
                    }
                }
                b'&' => match parse_reference(bytes, i) {
                    Some((decoded, end)) => {
                        let run = self.flush(i);
                        self.run_start = end;
                        self.pos = end;
                        let decoded = Segment::Decoded(decoded);
                        if run.is_some() {
                            self.queued = Some(decoded);
                            return run;
                        }
                        return Some(decoded);
                    }
                    None => self.pos += 1,
                },
                _ => self.pos += 1,
            }
        }

        let run = self.flush(bytes.len());
        self.run_start = bytes.len();
        run
    }
}

/// Parse a character reference starting at the `&` at `start`.
///
/// Returns the decoded text and the index just past the terminating `;`.
fn parse_reference(bytes: &[u8], start: usize) -> Option<(Cow<'static, str>, usize)> {
    let next = start + 1;
    if bytes.get(next) == Some(&b'#') {
        match bytes.get(next + 1) {
            Some(b'x') | Some(b'X') => {
                let body = next + 2;
                let end = read_while(bytes, body, u8::is_ascii_hexdigit);
                if end > body && end - body <= MAX_HEX_DIGITS && bytes.get(end) == Some(&b';') {
                    let digits = std::str::from_utf8(&bytes[body..end]).ok()?;
                    let value = u32::from_str_radix(digits, 16).ok()?;
                    return Some((decode_code_point(value), end + 1));
                }
                None
            }
            Some(c) if c.is_ascii_digit() => {
                let body = next + 1;
                let end = read_while(bytes, body, u8::is_ascii_digit);
                if end - body <= MAX_DECIMAL_DIGITS && bytes.get(end) == Some(&b';') {
                    let digits = std::str::from_utf8(&bytes[body..end]).ok()?;
                    let value = digits.parse::<u32>().ok()?;
                    return Some((decode_code_point(value), end + 1));
                }
                None
            }
            _ => None,
        }
    } else {
        let end = read_while(bytes, next, u8::is_ascii_alphanumeric);
        if end > next && bytes.get(end) == Some(&b';') {
            let name = std::str::from_utf8(&bytes[next..end]).ok()?;
            let entity = lookup_entity(name)?;
            return Some((Cow::Borrowed(entity), end + 1));
        }
        None
    }
}

fn read_while(bytes: &[u8], from: usize, pred: impl Fn(&u8) -> bool) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|b| !pred(b))
        .map_or(bytes.len(), |offset| from + offset)
}

fn decode_code_point(value: u32) -> Cow<'static, str> {
    let c = match value {
        0 => char::REPLACEMENT_CHARACTER,
        v => char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER),
    };
    Cow::Owned(c.to_string())
}

/// Resolve escapes and references, returning plain display text.
///
/// ```
/// use present_tex::scanner::decode;
/// assert_eq!(decode("&amp;"), "&");
/// assert_eq!(decode("&#x41;&#66;"), "AB");
/// assert_eq!(decode(r"\*not emphasis\*"), "*not emphasis*");
/// ```
pub fn decode(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for segment in Scanner::new(src) {
        match segment {
            Segment::Literal(run) => out.push_str(run),
            Segment::Decoded(text) => out.push_str(&text),
        }
    }
    out
}

/// Write text verbatim, byte for byte.
pub fn write_raw(sink: &mut dyn Sink, src: &str) {
    sink.append(src);
}

/// Write text with references resolved and literal runs LaTeX-escaped.
///
/// Decoded characters below U+0100 that have a LaTeX substitution are
/// substituted; everything else decoded is written as-is.
pub fn write_rich(sink: &mut dyn Sink, src: &str) {
    for segment in Scanner::new(src) {
        match segment {
            Segment::Literal(run) => sink.append(&escape_latex(run)),
            Segment::Decoded(text) => write_decoded(sink, &text),
        }
    }
}

fn write_decoded(sink: &mut dyn Sink, text: &str) {
    for c in text.chars() {
        match escape_char(c) {
            Some(repl) if u32::from(c) < 256 => sink.append(repl),
            _ => sink.append_char(c),
        }
    }
}
