//! The domain reader: a nested state machine invoked by the detector
//! once a candidate authority starts accumulating. It owns
//! reading from the shared [`Reader`] until it hits a terminator the
//! detector needs to act on (`/`, `:`, `?`, `#`), EOF, or whitespace, and
//! reports back whether what it read is a valid authority.

use crate::char_class::{is_dot, is_encoded_dot, is_hex, split_by_dot};
use crate::host;
use crate::reader::{BacktrackLimitExceeded, Reader};

/// What the detector should do after a domain-reader call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainState {
    InvalidDomainName,
    ValidDomainName,
    ReadPort,
    ReadPath,
    ReadQueryString,
    ReadFragment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainOutcome {
    pub state: DomainState,
    pub domain: String,
}

/// Reads a candidate authority starting from `prefix` (already consumed
/// text the detector is handing off, e.g. after an `@` or `[`), driving
/// the shared reader forward. `on_char` is invoked for every code unit
/// consumed so the detector can keep its bracket/quote/XML counters
/// honest without the domain reader knowing about them.
pub fn read(
    reader: &mut Reader,
    prefix: &str,
    single_level_domain: bool,
    extra_stop: impl Fn(char) -> bool,
    mut on_char: impl FnMut(char),
) -> Result<DomainOutcome, BacktrackLimitExceeded> {
    if prefix == "." || prefix.eq_ignore_ascii_case("%2e") {
        return Ok(DomainOutcome {
            state: DomainState::InvalidDomainName,
            domain: prefix.to_string(),
        });
    }

    let mut buffer = String::new();
    buffer.push_str(prefix);

    let mut in_brackets = prefix.contains('[') && !prefix.contains(']');
    let mut bracket_closed = prefix.contains(']');
    let mut in_zone = false;

    loop {
        if reader.eof() {
            let valid = is_valid_domain(&buffer, single_level_domain);
            return Ok(DomainOutcome {
                state: if valid {
                    DomainState::ValidDomainName
                } else {
                    DomainState::InvalidDomainName
                },
                domain: buffer,
            });
        }

        let c = reader.read()?;

        match c {
            '/' | ':' | '?' | '#' if !in_brackets || bracket_closed => {
                let valid = is_valid_domain(&buffer, single_level_domain);
                if !valid {
                    reader.go_back()?;
                    return Ok(DomainOutcome {
                        state: DomainState::InvalidDomainName,
                        domain: buffer,
                    });
                }
                let state = match c {
                    '/' => DomainState::ReadPath,
                    ':' => DomainState::ReadPort,
                    '?' => DomainState::ReadQueryString,
                    '#' => DomainState::ReadFragment,
                    _ => unreachable!(),
                };
                return Ok(DomainOutcome { state, domain: buffer });
            }
            ' ' => {
                let valid = is_valid_domain(&buffer, single_level_domain);
                reader.go_back()?;
                return Ok(DomainOutcome {
                    state: if valid {
                        DomainState::ValidDomainName
                    } else {
                        DomainState::InvalidDomainName
                    },
                    domain: buffer,
                });
            }
            c if !in_brackets && extra_stop(c) => {
                let valid = is_valid_domain(&buffer, single_level_domain);
                reader.go_back()?;
                return Ok(DomainOutcome {
                    state: if valid {
                        DomainState::ValidDomainName
                    } else {
                        DomainState::InvalidDomainName
                    },
                    domain: buffer,
                });
            }
            '[' => {
                if in_brackets {
                    reader.go_back()?;
                    return Ok(DomainOutcome {
                        state: DomainState::InvalidDomainName,
                        domain: buffer,
                    });
                }
                in_brackets = true;
                buffer.push(c);
                on_char(c);
            }
            ']' if in_brackets && !bracket_closed => {
                bracket_closed = true;
                in_zone = false;
                buffer.push(c);
                on_char(c);
            }
            '%' if in_brackets && !bracket_closed => {
                // Zone index starts here; everything up to `]` is taken
                // verbatim (no percent-decoding, no dot folding).
                in_zone = true;
                buffer.push(c);
                on_char(c);
            }
            '%' => {
                let hi = reader.peek_at(0);
                let lo = reader.peek_at(1);
                match (hi, lo) {
                    (Some(h), Some(l)) if is_encoded_dot(h, l) && !in_brackets => {
                        buffer.push('.');
                        on_char('.');
                        reader.seek(reader.position() + 2)?;
                    }
                    (Some(h), Some(l)) if is_hex(h) && is_hex(l) => {
                        buffer.push(c);
                        buffer.push(h);
                        buffer.push(l);
                        on_char(c);
                        reader.seek(reader.position() + 2)?;
                    }
                    _ => {
                        buffer.push(c);
                        on_char(c);
                    }
                }
            }
            c if is_dot(c) && !in_brackets && !in_zone => {
                buffer.push('.');
                on_char(c);
            }
            _ => {
                buffer.push(c);
                on_char(c);
            }
        }
    }
}

/// Final validity check: attempted in order as IPv4, then (if
/// bracketed) IPv6, then a DNS name.
fn is_valid_domain(candidate: &str, single_level_domain: bool) -> bool {
    if candidate.is_empty() {
        return false;
    }
    if candidate.chars().count() >= 255 {
        return false;
    }
    if host::parse_ipv4(candidate).is_some() {
        return true;
    }
    if candidate.starts_with('[') && candidate.ends_with(']') {
        return host::parse_ipv6_full(candidate).is_some();
    }
    // A candidate that is shaped like a numeric IPv4 address (only
    // digits/hex-prefixed parts, dot-separated) but failed the IPv4
    // range/dot-count check above is not allowed to fall back to DNS-name
    // rules. "0.0.0.256" is not a domain name, it's a bad IP literal.
    if looks_numeric_shaped(candidate) {
        return false;
    }
    is_valid_dns_name(candidate, single_level_domain)
}

fn looks_numeric_shaped(candidate: &str) -> bool {
    let mut any_digit = false;
    let shaped = candidate.split('.').all(|part| {
        let ok = looks_like_numeric_part(part);
        if ok {
            any_digit = any_digit || part.chars().any(|c| c.is_ascii_digit());
        }
        ok
    });
    shaped && any_digit
}

fn looks_like_numeric_part(part: &str) -> bool {
    if part.is_empty() {
        return false;
    }
    if let Some(hex) = part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    part.chars().all(|c| c.is_ascii_digit())
}

fn is_valid_dns_name(candidate: &str, single_level_domain: bool) -> bool {
    let labels = split_by_dot(candidate);
    if labels.len() > 127 {
        return false;
    }
    if labels.iter().any(|l| l.is_empty() || l.chars().count() > 64) {
        return false;
    }

    let has_dot = labels.len() > 1;
    if !has_dot && !single_level_domain {
        return false;
    }

    let top_label = labels.last().expect("split_by_dot always yields >=1 segment");
    if top_label.to_ascii_lowercase().starts_with("xn--") {
        return true;
    }
    matches!(top_label.chars().count(), 2..=22)
}
