// ABOUTME: LaTeX escaping and unit conversion helpers for the renderer
// ABOUTME: Holds the process-wide replacement tables, built once and never mutated

use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Text replacements applied to rich text, as (pattern, replacement) pairs.
///
/// Multi-character sequences share prefixes with single-character entries
/// (`->` and `>`, `<--` and `<-`), so the automaton is built with
/// leftmost-longest semantics.
static LATEX_REPLACEMENTS: &[(&str, &str)] = &[
    ("-->", r"$\Rightarrow$ "),
    ("<--", r"$\Leftarrow$ "),
    ("->", r"$\rightarrow$ "),
    ("<-", r"$\leftarrow$ "),
    ("=>", r"$\Rightarrow$ "),
    (">=", r"$\geq$ "),
    ("<=", r"$\leq$ "),
    (">", r"$>$"),
    ("<", r"$<$"),
    ("⇒", r"$\Rightarrow$ "),
    ("—", "---"),
    ("±", r"$\pm$"),
    ("\\", r"\textbackslash{}"),
    ("_", r"\_"),
    ("&", r"\&"),
    ("$", r"\$"),
    ("^", r"\^{}"),
    ("%", r"\%"),
    ("~", r"$\sim$"),
    ("#", r"\#"),
    ("{", r"\{"),
    ("}", r"\}"),
    ("é", r"\'e"),
    ("è", r"\`e"),
    ("à", r"\`a"),
    ("ù", r"\`u"),
    ("â", r"\^a"),
    ("ê", r"\^e"),
    ("î", r"\^i"),
    ("ô", r"\^o"),
    ("û", r"\^u"),
    ("ŷ", r"\^y"),
    ("ä", r#"\"a"#),
    ("ë", r#"\"e"#),
    ("ï", r#"\"i"#),
    ("ö", r#"\"o"#),
    ("ü", r#"\"u"#),
    ("ÿ", r#"\"y"#),
    ("ç", r"\c{c}"),
    ("Ç", r"\c{C}"),
    ("æ", r"\ae "),
    ("œ", r"\oe "),
];

static LATEX_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(LATEX_REPLACEMENTS.iter().map(|(pattern, _)| *pattern))
        .expect("Failed to build LaTeX escaper")
});

static LATEX_TARGETS: Lazy<Vec<&'static str>> =
    Lazy::new(|| LATEX_REPLACEMENTS.iter().map(|(_, repl)| *repl).collect());

/// Characters percent-encoded in hyperlink targets (RFC 3986 unsafe set).
const URL_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// Escape text so it typesets literally in a LaTeX document.
///
/// Special characters become their command forms, accented letters become
/// diacritic commands and arrow sequences become math-mode symbols.
///
/// ```
/// use present_tex::escape::escape_latex;
/// assert_eq!(escape_latex("a_b & c"), r"a\_b \& c");
/// assert_eq!(escape_latex("x -> y"), r"x $\rightarrow$  y");
/// assert_eq!(escape_latex("plain text"), "plain text");
/// ```
pub fn escape_latex(text: &str) -> String {
    LATEX_ESCAPER.replace_all(text, LATEX_TARGETS.as_slice())
}

/// Substitution for a single character, if the escape table has one.
pub fn escape_char(c: char) -> Option<&'static str> {
    let mut buf = [0u8; 4];
    let needle = c.encode_utf8(&mut buf);
    LATEX_REPLACEMENTS
        .iter()
        .find(|(pattern, _)| *pattern == needle)
        .map(|(_, repl)| *repl)
}

/// Escape a URL for use as the target of `\href`-like commands.
pub fn escape_url(url: &str) -> String {
    escape_argument(&utf8_percent_encode(url, URL_UNSAFE).to_string())
}

/// Escape a file path or option value for `\includegraphics`.
///
/// Unlike [`escape_url`] nothing is percent-encoded; only the characters that
/// would end the argument or start a comment are escaped.
pub fn escape_path(path: &str) -> String {
    escape_argument(path)
}

fn escape_argument(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' => out.push_str(r"\%"),
            '#' => out.push_str(r"\#"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            _ => out.push(c),
        }
    }
    out
}

/// Convert a pixel count to inches at the given resolution.
///
/// The caller guarantees `dpi > 0`; a zero resolution yields infinity.
pub fn pixels_to_physical(pixels: u32, dpi: u32) -> f64 {
    f64::from(pixels) / f64::from(dpi)
}

/// Format `pixels` at `dpi` as a length in inches, without the unit.
///
/// The length is truncated (not rounded) to hundredths using integer
/// arithmetic. A positive length never truncates to zero; a zero `dpi`
/// formats as `0`.
pub fn format_length(pixels: u32, dpi: u32) -> String {
    if pixels == 0 || dpi == 0 {
        return "0".to_string();
    }
    let hundredths = (u64::from(pixels) * 100 / u64::from(dpi)).max(1);
    let whole = hundredths / 100;
    let frac = hundredths % 100;
    match frac {
        0 => whole.to_string(),
        f if f % 10 == 0 => format!("{}.{}", whole, f / 10),
        f => format!("{}.{:02}", whole, f),
    }
}
