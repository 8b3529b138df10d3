//! The URL marker (seven component offsets into a detected substring)
//! and the read-only accessor built on top of it.
//!
//! The detector never slices eagerly: it just remembers where each
//! component starts. Everything in here is lazy, deriving strings from
//! the marker's offsets on demand.

use std::fmt;

use crate::host;

/// Index into `UrlMarker::offsets`, in the fixed order present-component
/// offsets must be strictly increasing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UrlPart {
    Scheme,
    Userinfo,
    Host,
    Port,
    Path,
    Query,
    Fragment,
}

impl UrlPart {
    pub const ALL: [UrlPart; 7] = [
        UrlPart::Scheme,
        UrlPart::Userinfo,
        UrlPart::Host,
        UrlPart::Port,
        UrlPart::Path,
        UrlPart::Query,
        UrlPart::Fragment,
    ];

    fn index(self) -> usize {
        match self {
            UrlPart::Scheme => 0,
            UrlPart::Userinfo => 1,
            UrlPart::Host => 2,
            UrlPart::Port => 3,
            UrlPart::Path => 4,
            UrlPart::Query => 5,
            UrlPart::Fragment => 6,
        }
    }
}

/// Seven offsets (one per `UrlPart`) into `original`, plus the original
/// text itself. `None` means the component is absent. An offset points
/// at the first code unit of the component, including whatever leading
/// delimiter belongs to it (`:` for port, `?` for query, `#` for
/// fragment; userinfo has no delimiter of its own but owns the trailing
/// `@`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMarker {
    offsets: [Option<usize>; 7],
    original: String,
    chars: Vec<char>,
}

impl UrlMarker {
    pub fn new(original: String) -> Self {
        let chars: Vec<char> = original.chars().collect();
        UrlMarker {
            offsets: [None; 7],
            original,
            chars,
        }
    }

    pub fn set(&mut self, part: UrlPart, offset: usize) {
        self.offsets[part.index()] = Some(offset);
    }

    pub fn unset(&mut self, part: UrlPart) {
        self.offsets[part.index()] = None;
    }

    pub fn get(&self, part: UrlPart) -> Option<usize> {
        self.offsets[part.index()]
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Rebuilds the marker against its true original text once the
    /// detector knows the candidate's full span, keeping the offsets
    /// already recorded (which are relative to that span's start).
    pub(crate) fn with_original(mut self, original: String) -> Self {
        self.chars = original.chars().collect();
        self.original = original;
        self
    }

    /// The offset of the first present part that comes after `part` in
    /// the fixed component order, or the string length if none.
    fn end_of(&self, part: UrlPart) -> usize {
        let start_index = part.index() + 1;
        for candidate in &UrlPart::ALL[start_index..] {
            if let Some(off) = self.get(*candidate) {
                return off;
            }
        }
        self.chars.len()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        if start >= end || start > self.chars.len() {
            return String::new();
        }
        let end = end.min(self.chars.len());
        self.chars[start..end].iter().collect()
    }
}

/// Default port for the three schemes that have a registered one.
fn default_port_for_scheme(scheme: &str) -> Option<i64> {
    match scheme.to_ascii_lowercase().as_str() {
        "http" => Some(80),
        "https" => Some(443),
        "ftp" => Some(21),
        _ => None,
    }
}

/// A read-only, lazily-derived view over a `UrlMarker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    marker: UrlMarker,
}

impl Url {
    pub fn from_marker(marker: UrlMarker) -> Self {
        Url { marker }
    }

    pub fn original_url(&self) -> &str {
        self.marker.original()
    }

    /// Scheme text with the trailing `:` stripped. Defaults to `"http"`
    /// unless the original text began with `//` (scheme-relative,
    /// HTML5-root detection), in which case the default is `""`.
    pub fn scheme(&self) -> String {
        match self.marker.get(UrlPart::Scheme) {
            Some(start) => {
                // Scheme is always a contiguous run of ASCII letters; the
                // "//" (or "%3a//" colon form) that follows is not part
                // of any named component, so we scan forward past the
                // letters rather than slicing to the next component's
                // offset (which could include that separator text).
                let chars = &self.marker.chars;
                let mut end = start;
                while end < chars.len() && chars[end].is_ascii_alphabetic() {
                    end += 1;
                }
                chars[start..end].iter().collect()
            }
            None => {
                if self.marker.original().starts_with("//") {
                    String::new()
                } else {
                    "http".to_string()
                }
            }
        }
    }

    fn userinfo_raw(&self) -> Option<String> {
        let start = self.marker.get(UrlPart::Userinfo)?;
        let end = self.marker.end_of(UrlPart::Userinfo);
        let raw = self.marker.slice(start, end);
        Some(raw.strip_suffix('@').unwrap_or(&raw).to_string())
    }

    /// Username, the part of userinfo before the first `:`.
    pub fn username(&self) -> String {
        match self.userinfo_raw() {
            Some(raw) => match raw.split_once(':') {
                Some((user, _)) => user.to_string(),
                None => raw,
            },
            None => String::new(),
        }
    }

    /// Password, the part of userinfo after the first `:`. Empty if
    /// there was no `:`, even if userinfo was present.
    pub fn password(&self) -> String {
        match self.userinfo_raw() {
            Some(raw) => match raw.split_once(':') {
                Some((_, pass)) => pass.to_string(),
                None => String::new(),
            },
            None => String::new(),
        }
    }

    pub fn has_userinfo(&self) -> bool {
        self.marker.get(UrlPart::Userinfo).is_some()
    }

    /// Host text. Always present for a valid URL.
    pub fn host(&self) -> String {
        let start = self.marker.get(UrlPart::Host).unwrap_or(0);
        let end = self.marker.end_of(UrlPart::Host);
        self.marker.slice(start, end)
    }

    /// Port as an integer: explicit value if parseable, else the
    /// scheme's registered default, else `-1`.
    pub fn port(&self) -> i64 {
        if let Some(start) = self.marker.get(UrlPart::Port) {
            let end = self.marker.end_of(UrlPart::Port);
            // start points at the leading ':'; skip it.
            let digits = self.marker.slice(start + 1, end);
            if let Ok(value) = digits.parse::<i64>() {
                return value;
            }
        }
        default_port_for_scheme(&self.scheme()).unwrap_or(-1)
    }

    /// Path text, defaulting to `/` when absent.
    pub fn path(&self) -> String {
        match self.marker.get(UrlPart::Path) {
            Some(start) => {
                let end = self.marker.end_of(UrlPart::Path);
                self.marker.slice(start, end)
            }
            None => "/".to_string(),
        }
    }

    /// Query text including the leading `?`, empty if absent.
    pub fn query(&self) -> String {
        match self.marker.get(UrlPart::Query) {
            Some(start) => {
                let end = self.marker.end_of(UrlPart::Query);
                self.marker.slice(start, end)
            }
            None => String::new(),
        }
    }

    /// Fragment text including the leading `#`, empty if absent.
    pub fn fragment(&self) -> String {
        match self.marker.get(UrlPart::Fragment) {
            Some(start) => {
                let end = self.marker.end_of(UrlPart::Fragment);
                self.marker.slice(start, end)
            }
            None => String::new(),
        }
    }

    /// 16-byte big-endian representation for hosts recognized as IPv4
    /// (IPv4-mapped) or IPv6. `None` for DNS-name hosts.
    pub fn host_bytes(&self) -> Option<[u8; 16]> {
        host::to_host_bytes(&self.host())
    }

    fn userinfo_prefix(&self) -> String {
        if !self.has_userinfo() {
            return String::new();
        }
        let user = self.username();
        let pass = self.password();
        if pass.is_empty() {
            format!("{user}@")
        } else {
            format!("{user}:{pass}@")
        }
    }

    fn port_suffix(&self) -> String {
        let port = self.port();
        if port < 0 {
            return String::new();
        }
        if Some(port) == default_port_for_scheme(&self.scheme()) {
            return String::new();
        }
        format!(":{port}")
    }

    fn full_url_parts(&self) -> (String, String, String, String) {
        let scheme = self.scheme();
        let prefix = if scheme.is_empty() {
            "//".to_string()
        } else {
            format!("{scheme}://")
        };
        let authority = format!(
            "{}{}{}",
            self.userinfo_prefix(),
            self.host(),
            self.port_suffix()
        );
        (prefix, authority, self.path(), self.query())
    }

    /// Reconstructs `scheme://[user[:pass]@]host[:port]path[?query][#fragment]`,
    /// omitting a port equal to the scheme's default.
    pub fn full_url(&self) -> String {
        let (prefix, authority, path, query) = self.full_url_parts();
        format!("{prefix}{authority}{path}{query}{}", self.fragment())
    }

    /// Same as `full_url`, but stops before the fragment.
    pub fn full_url_without_fragment(&self) -> String {
        let (prefix, authority, path, query) = self.full_url_parts();
        format!("{prefix}{authority}{path}{query}")
    }

    pub(crate) fn marker(&self) -> &UrlMarker {
        &self.marker
    }

    pub(crate) fn marker_mut(&mut self) -> &mut UrlMarker {
        &mut self.marker
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_from(original: &str, parts: &[(UrlPart, usize)]) -> Url {
        let mut marker = UrlMarker::new(original.to_string());
        for (part, offset) in parts {
            marker.set(*part, *offset);
        }
        Url::from_marker(marker)
    }

    #[test]
    fn scheme_defaults_to_http() {
        let url = url_from("www.google.com", &[(UrlPart::Host, 0)]);
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn scheme_defaults_to_empty_for_html5_root() {
        let url = url_from("//www.google.com", &[(UrlPart::Host, 2)]);
        assert_eq!(url.scheme(), "");
        assert_eq!(url.host(), "www.google.com");
    }

    #[test]
    fn explicit_scheme_strips_colon_and_separator() {
        let url = url_from(
            "http://www.google.com",
            &[(UrlPart::Scheme, 0), (UrlPart::Host, 7)],
        );
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host(), "www.google.com");
    }

    #[test]
    fn userinfo_splits_on_first_colon() {
        let url = url_from(
            "http://user:pa:ss@host.com",
            &[
                (UrlPart::Scheme, 0),
                (UrlPart::Userinfo, 7),
                (UrlPart::Host, 18),
            ],
        );
        assert_eq!(url.username(), "user");
        assert_eq!(url.password(), "pa:ss");
    }

    #[test]
    fn userinfo_with_no_colon_has_empty_password() {
        let url = url_from(
            "vshlosbe@linkedin.com",
            &[(UrlPart::Userinfo, 0), (UrlPart::Host, 9)],
        );
        assert_eq!(url.username(), "vshlosbe");
        assert_eq!(url.password(), "");
    }

    #[test]
    fn port_defaults_for_known_scheme() {
        let url = url_from(
            "http://host.com/",
            &[
                (UrlPart::Scheme, 0),
                (UrlPart::Host, 7),
                (UrlPart::Path, 15),
            ],
        );
        assert_eq!(url.port(), 80);
    }

    #[test]
    fn port_unknown_scheme_is_minus_one() {
        let url = url_from("foo://host.com/", &[(UrlPart::Host, 6)]);
        assert_eq!(url.port(), -1);
    }

    #[test]
    fn explicit_port_parses() {
        let url = url_from(
            "http://host.com:8080/",
            &[
                (UrlPart::Scheme, 0),
                (UrlPart::Host, 7),
                (UrlPart::Port, 15),
                (UrlPart::Path, 20),
            ],
        );
        assert_eq!(url.port(), 8080);
        assert_eq!(url.host(), "host.com");
    }

    #[test]
    fn malformed_port_digits_degrade_to_default() {
        // "google.com:hello.world" -- port offset present but content
        // isn't digits; accessor should fall back to scheme default.
        let url = url_from(
            "http://google.com:hello",
            &[
                (UrlPart::Scheme, 0),
                (UrlPart::Host, 7),
                (UrlPart::Port, 17),
            ],
        );
        assert_eq!(url.port(), 80);
    }

    #[test]
    fn path_defaults_to_root() {
        let url = url_from("http://host.com", &[(UrlPart::Host, 7)]);
        assert_eq!(url.path(), "/");
    }

    #[test]
    fn query_and_fragment_keep_their_delimiter() {
        let url = url_from(
            "http://host.com/p?q=1#frag",
            &[
                (UrlPart::Scheme, 0),
                (UrlPart::Host, 7),
                (UrlPart::Path, 15),
                (UrlPart::Query, 17),
                (UrlPart::Fragment, 21),
            ],
        );
        assert_eq!(url.path(), "/p");
        assert_eq!(url.query(), "?q=1");
        assert_eq!(url.fragment(), "#frag");
    }

    #[test]
    fn full_url_omits_default_port() {
        let url = url_from(
            "http://host.com:80/p",
            &[
                (UrlPart::Scheme, 0),
                (UrlPart::Host, 7),
                (UrlPart::Port, 15),
                (UrlPart::Path, 18),
            ],
        );
        assert_eq!(url.full_url(), "http://host.com/p");
    }

    #[test]
    fn full_url_keeps_nondefault_port() {
        let url = url_from(
            "http://host.com:8080/p",
            &[
                (UrlPart::Scheme, 0),
                (UrlPart::Host, 7),
                (UrlPart::Port, 15),
                (UrlPart::Path, 20),
            ],
        );
        assert_eq!(url.full_url(), "http://host.com:8080/p");
    }

    #[test]
    fn full_url_without_fragment_drops_fragment() {
        let url = url_from(
            "http://host.com/p#frag",
            &[
                (UrlPart::Scheme, 0),
                (UrlPart::Host, 7),
                (UrlPart::Path, 15),
                (UrlPart::Fragment, 18),
            ],
        );
        assert_eq!(url.full_url_without_fragment(), "http://host.com/p");
        assert_eq!(url.full_url(), "http://host.com/p#frag");
    }

    #[test]
    fn host_bytes_none_for_dns_name() {
        let url = url_from("http://host.com", &[(UrlPart::Host, 7)]);
        assert_eq!(url.host_bytes(), None);
    }

    #[test]
    fn host_bytes_ipv4_mapped() {
        let url = url_from("http://1.2.3.4", &[(UrlPart::Host, 7)]);
        let bytes = url.host_bytes().expect("should parse as ipv4");
        assert_eq!(&bytes[0..10], &[0u8; 10]);
        assert_eq!(&bytes[10..12], &[0xFF, 0xFF]);
        assert_eq!(&bytes[12..16], &[1, 2, 3, 4]);
    }
}
