//! Small text transforms shared by the host and path normalizers:
//! iterative percent-decoding, whitespace stripping, percent-encoding,
//! and dot folding. None of these can fail; malformed input is left
//! as-is rather than rejected.

use crate::char_class::{is_dot, is_hex};

/// Repeatedly percent-decodes `s` to a fixed point.
///
/// A single left-to-right pass replaces every well-formed `%XX` triple
/// with the decoded byte, treated as one code unit rather than re-run
/// through UTF-8 decoding. The pass is then repeated as long as it both
/// changed something and strictly shrank the string, which is exactly
/// when a newly-decoded `%` can chain into another decodable triple: for
/// example, `%2525252525252525` decodes one `%25` per pass until only a
/// literal `%` is left over.
pub fn decode(s: &str) -> String {
    let mut current = s.to_string();
    loop {
        let (next, changed) = decode_pass(&current);
        if !changed {
            return current;
        }
        let shrank = next.chars().count() < current.chars().count();
        current = next;
        if !shrank {
            return current;
        }
    }
}

fn decode_pass(s: &str) -> (String, bool) {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    let mut changed = false;

    while i < chars.len() {
        if chars[i] == '%'
            && i + 2 < chars.len()
            && is_hex(chars[i + 1])
            && is_hex(chars[i + 2])
        {
            let hi = chars[i + 1].to_digit(16).unwrap();
            let lo = chars[i + 2].to_digit(16).unwrap();
            let byte = hi * 16 + lo;
            if let Some(decoded) = char::from_u32(byte) {
                out.push(decoded);
                changed = true;
                i += 3;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    (out, changed)
}

/// Removes tab, CR, LF, and ASCII space from `s`.
pub fn strip_specials(s: &str) -> String {
    s.chars()
        .filter(|&c| !matches!(c, '\u{09}' | '\u{0A}' | '\u{0D}' | ' '))
        .collect()
}

/// Percent-encodes every code unit outside the printable-ASCII range
/// `(0x20, 0x7F)`, plus `#` and `%` themselves, as uppercase `%XX` bytes
/// (UTF-8 encoded first, so non-ASCII scalars become multiple `%XX`
/// triples).
pub fn encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut buf = [0u8; 4];
    for c in s.chars() {
        let code = c as u32;
        let needs_encoding = code <= 0x20 || code >= 0x7F || c == '#' || c == '%';
        if needs_encoding {
            for b in c.encode_utf8(&mut buf).as_bytes() {
                out.push_str(&format!("%{b:02X}"));
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Collapses runs of dot-variant characters into a single ASCII `.` and
/// strips a leading/trailing dot.
pub fn fold_extra_dots(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_was_dot = false;
    for c in s.chars() {
        if is_dot(c) {
            if !prev_was_dot {
                out.push('.');
            }
            prev_was_dot = true;
        } else {
            out.push(c);
            prev_was_dot = false;
        }
    }
    out.trim_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_collapses_double_encoded_percent() {
        assert_eq!(decode("%%32%35"), "%");
        assert_eq!(decode("/%25%32%35"), "/%");
        assert_eq!(decode("/%2525252525252525"), "/%");
    }

    #[test]
    fn decode_leaves_plain_text_alone() {
        assert_eq!(decode("hello world"), "hello world");
        assert_eq!(decode("/a/b/c"), "/a/b/c");
    }

    #[test]
    fn decode_handles_trailing_incomplete_percent() {
        assert_eq!(decode("abc%"), "abc%");
        assert_eq!(decode("abc%2"), "abc%2");
        assert_eq!(decode("abc%2g"), "abc%2g");
    }

    #[test]
    fn decode_basic_percent_encoded_path() {
        assert_eq!(
            decode("%2E%73%65%63%75%72%65"),
            ".secure"
        );
    }

    #[test]
    fn strip_specials_removes_tab_cr_lf_space() {
        assert_eq!(strip_specials("a\tb\rc\nd e"), "abcde");
    }

    #[test]
    fn encode_escapes_hash_percent_and_non_printable() {
        assert_eq!(encode("a#b%c"), "a%23b%25c");
        assert_eq!(encode(" "), "%20");
        assert_eq!(encode("abc"), "abc");
    }

    #[test]
    fn encode_round_trips_through_decode() {
        let original = "a b#c%d\u{e9}";
        let encoded = encode(original);
        assert_eq!(decode(&encoded), original);
    }

    #[test]
    fn fold_extra_dots_collapses_runs_and_trims() {
        assert_eq!(fold_extra_dots("..a...b.."), "a.b");
        assert_eq!(fold_extra_dots("a.b"), "a.b");
        assert_eq!(fold_extra_dots("..."), "");
    }

    #[test]
    fn fold_extra_dots_handles_unicode_dot_variants() {
        assert_eq!(fold_extra_dots("a\u{3002}\u{FF0E}b"), "a.b");
    }
}
