//! The top-level scanner: drives the shared [`Reader`] over the whole
//! input, recognizing scheme/userinfo/host/port/path/query/fragment
//! spans and handing authority recognition off to [`crate::domain`].

use crate::char_class::is_whitespace;
use crate::domain::{self, DomainState};
use crate::marker::{Url, UrlMarker, UrlPart};
use crate::reader::Reader;

/// The `DetectorOptions` bit mask. Named constants preserve the exact
/// numeric values callers rely on; several are aliases for a combination
/// of the single-bit options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetectorOptions(u32);

impl DetectorOptions {
    pub const DEFAULT: DetectorOptions = DetectorOptions(0);
    pub const QUOTE_MATCH: DetectorOptions = DetectorOptions(1);
    pub const SINGLE_QUOTE_MATCH: DetectorOptions = DetectorOptions(2);
    pub const BRACKET_MATCH: DetectorOptions = DetectorOptions(4);
    pub const JSON: DetectorOptions = DetectorOptions(5);
    pub const JAVASCRIPT: DetectorOptions = DetectorOptions(7);
    pub const XML: DetectorOptions = DetectorOptions(9);
    pub const HTML: DetectorOptions = DetectorOptions(27);
    pub const ALLOW_SINGLE_LEVEL_DOMAIN: DetectorOptions = DetectorOptions(32);

    pub fn from_bits(bits: u32) -> Self {
        DetectorOptions(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn union(self, other: DetectorOptions) -> DetectorOptions {
        DetectorOptions(self.0 | other.0)
    }

    pub fn contains(self, flag: DetectorOptions) -> bool {
        self.0 & flag.0 == flag.0
    }

    fn quote_match(self) -> bool {
        self.0 & 1 != 0
    }

    fn single_quote_match(self) -> bool {
        self.0 & 2 != 0
    }

    fn bracket_match(self) -> bool {
        self.0 & 4 != 0
    }

    /// The XML/HTML angle-bracket-matching bit, shared by the `Xml` and
    /// `Html` composites (8) but not individually named in the public
    /// surface.
    fn angle_match(self) -> bool {
        self.0 & 8 != 0
    }

    fn single_level_domain(self) -> bool {
        self.0 & 32 != 0
    }
}

fn is_extra_stop(c: char, options: DetectorOptions) -> bool {
    match c {
        '"' if options.quote_match() => true,
        '\'' if options.single_quote_match() => true,
        '(' | ')' | '{' | '}' | '[' | ']' if options.bracket_match() => true,
        '<' | '>' if options.angle_match() => true,
        _ => false,
    }
}

fn is_toplevel_separator(c: char, options: DetectorOptions) -> bool {
    is_whitespace(c) || is_extra_stop(c, options)
}

/// Scheme prefixes recognized at the start of a candidate, including the
/// percent-encoded-colon form.
const SCHEMES: [&str; 4] = ["https", "http", "ftps", "ftp"];

fn match_scheme_prefix(reader: &Reader) -> Option<usize> {
    for scheme in SCHEMES {
        for sep in ["://", "%3a//", "%3A//"] {
            let candidate: String = scheme.chars().chain(sep.chars()).collect();
            if matches_case_insensitive(reader, &candidate) {
                return Some(candidate.chars().count());
            }
        }
    }
    None
}

fn matches_case_insensitive(reader: &Reader, s: &str) -> bool {
    let n = s.chars().count();
    match reader.peek(n) {
        Some(slice) => slice.iter().zip(s.chars()).all(|(a, b)| a.eq_ignore_ascii_case(&b)),
        None => false,
    }
}

fn is_userinfo_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '%' | '+' | ':')
}

/// Scans forward from the reader's current position for a bare `@`,
/// treating it as the end of a userinfo span. Rolls back to the starting
/// position (leaving the reader untouched) if no `@` is found before a
/// disallowed character, a separator, or EOF.
fn scan_userinfo(
    reader: &mut Reader,
    options: DetectorOptions,
) -> Result<bool, crate::reader::BacktrackLimitExceeded> {
    let start = reader.position();
    loop {
        match reader.peek_at(0) {
            Some('@') => {
                reader.seek(reader.position() + 1)?;
                return Ok(true);
            }
            Some(c) if is_userinfo_char(c) && !is_extra_stop(c, options) => {
                reader.seek(reader.position() + 1)?;
            }
            _ => {
                reader.seek(start)?;
                return Ok(false);
            }
        }
    }
}

/// Reads path/query/fragment text starting right after the delimiter
/// that put us into `current`, transitioning on `?`/`#` and stopping at
/// whitespace, an option-specific stop character, or EOF.
fn read_rest(
    reader: &mut Reader,
    start_abs: usize,
    marker: &mut UrlMarker,
    mut current: UrlPart,
    options: DetectorOptions,
) -> Result<(), crate::reader::BacktrackLimitExceeded> {
    loop {
        match reader.peek_at(0) {
            None => return Ok(()),
            Some(c) if is_toplevel_separator(c, options) => return Ok(()),
            Some('?') if current == UrlPart::Path => {
                reader.seek(reader.position() + 1)?;
                marker.set(UrlPart::Query, reader.position() - 1 - start_abs);
                current = UrlPart::Query;
            }
            Some('#') if current == UrlPart::Path || current == UrlPart::Query => {
                reader.seek(reader.position() + 1)?;
                marker.set(UrlPart::Fragment, reader.position() - 1 - start_abs);
                current = UrlPart::Fragment;
            }
            Some(_) => {
                reader.seek(reader.position() + 1)?;
            }
        }
    }
}

/// Drives the domain reader, then any trailing port/path/query/fragment
/// components, from a host that starts at `host_offset` (relative to
/// `start_abs`). Returns `None` if the authority turns out invalid.
fn finish_after_host(
    reader: &mut Reader,
    start_abs: usize,
    mut marker: UrlMarker,
    options: DetectorOptions,
) -> Result<Option<Url>, crate::reader::BacktrackLimitExceeded> {
    let single_level = options.single_level_domain();
    let extra_stop = |c: char| is_extra_stop(c, options);
    let outcome = domain::read(reader, "", single_level, extra_stop, |_| {})?;

    match outcome.state {
        DomainState::InvalidDomainName => Ok(None),
        DomainState::ValidDomainName => Ok(Some(commit(reader, start_abs, marker))),
        DomainState::ReadPort => {
            let colon_pos = reader.position() - 1;
            let digits_start = reader.position();
            loop {
                match reader.peek_at(0) {
                    Some(c) if c.is_ascii_digit() => {
                        reader.seek(reader.position() + 1)?;
                    }
                    _ => break,
                }
            }
            if reader.position() == digits_start {
                // No digits followed the colon: it wasn't a port at all.
                reader.seek(colon_pos)?;
                marker.unset(UrlPart::Port);
                return Ok(Some(commit(reader, start_abs, marker)));
            }
            marker.set(UrlPart::Port, colon_pos - start_abs);
            match reader.peek_at(0) {
                Some('/') => {
                    reader.seek(reader.position() + 1)?;
                    marker.set(UrlPart::Path, reader.position() - 1 - start_abs);
                    read_rest(reader, start_abs, &mut marker, UrlPart::Path, options)?;
                }
                Some('?') => {
                    reader.seek(reader.position() + 1)?;
                    marker.set(UrlPart::Query, reader.position() - 1 - start_abs);
                    read_rest(reader, start_abs, &mut marker, UrlPart::Query, options)?;
                }
                Some('#') => {
                    reader.seek(reader.position() + 1)?;
                    marker.set(UrlPart::Fragment, reader.position() - 1 - start_abs);
                    read_rest(reader, start_abs, &mut marker, UrlPart::Fragment, options)?;
                }
                _ => {}
            }
            Ok(Some(commit(reader, start_abs, marker)))
        }
        DomainState::ReadPath => {
            marker.set(UrlPart::Path, reader.position() - 1 - start_abs);
            read_rest(reader, start_abs, &mut marker, UrlPart::Path, options)?;
            Ok(Some(commit(reader, start_abs, marker)))
        }
        DomainState::ReadQueryString => {
            marker.set(UrlPart::Query, reader.position() - 1 - start_abs);
            read_rest(reader, start_abs, &mut marker, UrlPart::Query, options)?;
            Ok(Some(commit(reader, start_abs, marker)))
        }
        DomainState::ReadFragment => {
            marker.set(UrlPart::Fragment, reader.position() - 1 - start_abs);
            read_rest(reader, start_abs, &mut marker, UrlPart::Fragment, options)?;
            Ok(Some(commit(reader, start_abs, marker)))
        }
    }
}

fn commit(reader: &Reader, start_abs: usize, marker: UrlMarker) -> Url {
    let end = reader.position();
    let original = reader.slice(start_abs, end);
    Url::from_marker(marker.with_original(original))
}

/// Attempts to recognize one URL candidate starting at the reader's
/// current position. Leaves the reader at the end of the candidate on
/// success; on failure, the reader is wherever the failed attempt's
/// internal consumption left it (never before the starting position),
/// so the caller always makes forward progress.
fn try_parse_url(
    reader: &mut Reader,
    options: DetectorOptions,
) -> Result<Option<Url>, crate::reader::BacktrackLimitExceeded> {
    let start = reader.position();
    let mut marker = UrlMarker::new(String::new());

    if let Some(len) = match_scheme_prefix(reader) {
        marker.set(UrlPart::Scheme, 0);
        reader.seek(start + len)?;
    } else if reader.peek(2) == Some(['/', '/'].as_slice()) {
        reader.seek(start + 2)?;
    }

    let authority_start = reader.position() - start;
    if scan_userinfo(reader, options)? {
        marker.set(UrlPart::Userinfo, authority_start);
        marker.set(UrlPart::Host, reader.position() - start);
    } else {
        marker.set(UrlPart::Host, authority_start);
    }

    finish_after_host(reader, start, marker, options)
}

/// Scans `text` for every URL recognizable under `options`.
///
/// Never propagates a backtrack-budget failure to the caller: if the
/// budget is exhausted partway through, whatever was found up to that
/// point is returned, so callers never have to handle a partial-scan
/// error case.
pub fn detect(text: &str, options: DetectorOptions) -> Vec<Url> {
    let mut reader = Reader::new(text);
    let mut results = Vec::new();

    loop {
        if reader.eof() {
            break;
        }
        if let Some(c) = reader.peek_at(0) {
            if is_toplevel_separator(c, options) {
                if reader.read().is_err() {
                    break;
                }
                continue;
            }
        }

        let before = reader.position();
        match try_parse_url(&mut reader, options) {
            Ok(Some(url)) => results.push(url),
            Ok(None) => {
                if reader.position() == before && reader.read().is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn originals(urls: &[Url]) -> Vec<String> {
        urls.iter().map(|u| u.original_url().to_string()).collect()
    }

    #[test]
    fn plain_text_with_bare_domain() {
        let urls = detect("this is a link: www.google.com", DetectorOptions::DEFAULT);
        assert_eq!(originals(&urls), vec!["www.google.com"]);
    }

    #[test]
    fn email_and_scheme_url_together() {
        let urls = detect(
            "my email is vshlosbe@linkedin.com and my site is http://www.linkedin.com/vshlos",
            DetectorOptions::DEFAULT,
        );
        assert_eq!(
            originals(&urls),
            vec!["vshlosbe@linkedin.com", "http://www.linkedin.com/vshlos"]
        );
    }

    #[test]
    fn ip_address_fakes_and_reals() {
        let urls = detect(
            "How about IP addresses? fake: 1.1.1 1.1.1.1.1 0.0.0.256 255.255.255.256 \
             real: 1.1.1.1 192.168.10.1 1.1.1.1.com 255.255.255.255",
            DetectorOptions::DEFAULT,
        );
        assert_eq!(
            originals(&urls),
            vec!["1.1.1.1", "192.168.10.1", "1.1.1.1.com", "255.255.255.255"]
        );
    }

    #[test]
    fn html_anchor_and_trailing_text() {
        let urls = detect(
            "<a href=\"http://www.google.com/\">google.com</a>",
            DetectorOptions::HTML,
        );
        assert_eq!(
            originals(&urls),
            vec!["http://www.google.com/", "google.com"]
        );
    }

    #[test]
    fn host_colon_non_port_digits_stops_before_colon() {
        let urls = detect("google.com:hello.world", DetectorOptions::DEFAULT);
        assert_eq!(originals(&urls), vec!["google.com", "hello.world"]);
    }

    #[test]
    fn bracketed_ipv6_host_is_detected() {
        let urls = detect("see http://[::1]:8080/path for details", DetectorOptions::DEFAULT);
        assert_eq!(originals(&urls), vec!["http://[::1]:8080/path"]);
    }

    #[test]
    fn single_level_domain_requires_the_option() {
        let urls = detect("localhost", DetectorOptions::DEFAULT);
        assert!(originals(&urls).is_empty());

        let urls = detect(
            "localhost",
            DetectorOptions::DEFAULT.union(DetectorOptions::ALLOW_SINGLE_LEVEL_DOMAIN),
        );
        assert_eq!(originals(&urls), vec!["localhost"]);
    }

    #[test]
    fn detected_url_reconstructs_full_url() {
        let urls = detect("http://host.com:8080/p?q=1#f", DetectorOptions::DEFAULT);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].full_url(), "http://host.com:8080/p?q=1#f");
    }
}
