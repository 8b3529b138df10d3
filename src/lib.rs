//! Browser-compatible URL detection and normalization.
//!
//! [`detect`] scans arbitrary text for URL-shaped substrings; [`parse_single`]
//! is the strict single-URL entry point; [`normalize`] canonicalizes a
//! detected [`Url`]'s host and path.

mod char_class;
mod detector;
mod domain;
mod error;
mod host;
mod marker;
mod path;
mod reader;
mod util;

pub mod cli;
pub mod core;
mod files;

pub use detector::{detect, DetectorOptions};
pub use error::{MalformedReason, UrlError};
pub use marker::{Url, UrlPart};

use util::strip_specials;

/// A [`Url`] with its host and path run through normalization. Scheme,
/// userinfo, port, query, and fragment are carried through as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub scheme: String,
    pub username: String,
    pub password: String,
    pub has_userinfo: bool,
    pub host: String,
    pub host_bytes: Option<[u8; 16]>,
    pub port: i64,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl NormalizedUrl {
    fn userinfo_prefix(&self) -> String {
        if !self.has_userinfo {
            return String::new();
        }
        if self.password.is_empty() {
            format!("{}@", self.username)
        } else {
            format!("{}:{}@", self.username, self.password)
        }
    }

    fn port_suffix(&self) -> String {
        if self.port < 0 {
            return String::new();
        }
        let default = match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            "ftp" => Some(21),
            _ => None,
        };
        if Some(self.port) == default {
            return String::new();
        }
        format!(":{}", self.port)
    }

    fn authority(&self) -> String {
        format!("{}{}{}", self.userinfo_prefix(), self.host, self.port_suffix())
    }

    fn scheme_prefix(&self) -> String {
        if self.scheme.is_empty() {
            "//".to_string()
        } else {
            format!("{}://", self.scheme)
        }
    }

    pub fn full_url(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.scheme_prefix(),
            self.authority(),
            self.path,
            self.query,
            self.fragment
        )
    }

    pub fn full_url_without_fragment(&self) -> String {
        format!(
            "{}{}{}{}",
            self.scheme_prefix(),
            self.authority(),
            self.path,
            self.query
        )
    }
}

impl std::fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_url())
    }
}

/// Runs the host and path normalizers over a detected `url`.
pub fn normalize(url: &Url) -> NormalizedUrl {
    let host_result = host::normalize(&url.host());
    NormalizedUrl {
        scheme: url.scheme(),
        username: url.username(),
        password: url.password(),
        has_userinfo: url.has_userinfo(),
        host: host_result.text,
        host_bytes: host_result.bytes,
        port: url.port(),
        path: path::normalize(&url.path()),
        query: url.query(),
        fragment: url.fragment(),
    }
}

/// Strict single-URL entry point: replaces literal spaces with `%20`
/// first (so they survive as path/query content rather than becoming
/// candidate-ending whitespace), strips any other incidental whitespace
/// noise, then requires `detect` to find exactly one URL spanning the
/// whole normalized input.
pub fn parse_single(text: &str) -> Result<Url, UrlError> {
    let prepared = strip_specials(&text.replace(' ', "%20"));

    let options = DetectorOptions::DEFAULT.union(DetectorOptions::ALLOW_SINGLE_LEVEL_DOMAIN);
    let mut urls = detect(&prepared, options);

    match urls.len() {
        0 => Err(UrlError::Malformed(MalformedReason::NoUrlFound)),
        1 => Ok(urls.remove(0)),
        n => Err(UrlError::Malformed(MalformedReason::MultipleUrlsFound(n))),
    }
}
