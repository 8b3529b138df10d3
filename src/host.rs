//! Host normalization: IDN-to-ASCII, numeric/dotted IPv4 in four bases,
//! IPv6 with zone indices and embedded IPv4, and the 16-byte host
//! representation used by `Url::host_bytes`.

use crate::util::{decode, encode, fold_extra_dots};

/// Result of running a host string through the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedHost {
    pub text: String,
    pub bytes: Option<[u8; 16]>,
}

/// Runs a host string through IDN conversion, then IPv4/IPv6/DNS-name
/// recognition, returning the canonical text and (for an IP literal)
/// its byte representation.
pub fn normalize(host: &str) -> NormalizedHost {
    if host.is_empty() {
        return NormalizedHost {
            text: host.to_string(),
            bytes: None,
        };
    }

    let ascii = match idna::domain_to_ascii(host) {
        Ok(ascii) => ascii,
        Err(_) => {
            // IDN conversion failed: leave the host untouched rather than
            // propagate an error; host normalization never fails.
            return NormalizedHost {
                text: host.to_string(),
                bytes: None,
            };
        }
    };

    let decoded = decode(&ascii.to_lowercase());

    if let Some(bytes) = parse_ipv4(&decoded) {
        return NormalizedHost {
            text: ipv4_bytes_to_text(&bytes[12..16].try_into().unwrap()),
            bytes: Some(bytes),
        };
    }
    if decoded.starts_with('[') && decoded.ends_with(']') {
        if let Some((bytes, zone)) = parse_ipv6_full(&decoded) {
            return NormalizedHost {
                text: ipv6_bytes_to_text(&bytes, zone.as_deref()),
                bytes: Some(bytes),
            };
        }
    }

    let folded = fold_extra_dots(&decoded);
    let reencoded = escape_stray_backslash_x(&encode(&folded));
    NormalizedHost {
        text: reencoded,
        bytes: None,
    }
}

/// `\xNN` sequences that earlier steps might introduce (e.g. from a
/// lossy IDN conversion) are not valid percent-encoding; turn the
/// backslash into `%5C` rather than leave an ambiguous escape in the
/// output text.
fn escape_stray_backslash_x(s: &str) -> String {
    s.replace('\\', "%5C")
}

/// Parses `host` (no surrounding brackets expected for IPv4, brackets
/// required for IPv6) directly, without running the rest of the
/// normalization pipeline. Used by `Url::host_bytes` on a raw,
/// not-yet-normalized host.
pub fn to_host_bytes(host: &str) -> Option<[u8; 16]> {
    if let Some(bytes) = parse_ipv4(host) {
        return Some(bytes);
    }
    if host.starts_with('[') && host.ends_with(']') {
        return parse_ipv6_full(host).map(|(bytes, _zone)| bytes);
    }
    None
}

fn ipv4_bytes_to_text(octets: &[u8; 4]) -> String {
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}

fn ipv6_bytes_to_text(bytes: &[u8; 16], zone: Option<&str>) -> String {
    let mut groups = [0u16; 8];
    for i in 0..8 {
        groups[i] = u16::from_be_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
    }
    let body = groups
        .iter()
        .map(|g| format!("{g:x}"))
        .collect::<Vec<_>>()
        .join(":");
    match zone {
        Some(z) => format!("[{body}%{z}]"),
        None => format!("[{body}]"),
    }
}

/// Parses a host string as IPv4: zero dots (whole value parsed in base
/// 16/8/10, must fall in `[16843008, 4294967295]`) or three dots (each
/// part parsed independently in base 16/8/10, each in `[0,255]`).
/// Returns the IPv4-mapped 16-byte form.
pub fn parse_ipv4(s: &str) -> Option<[u8; 16]> {
    let dots = s.matches('.').count();
    let octets = match dots {
        0 => {
            let value = parse_numeric_part(s)?;
            if !(16_843_008..=4_294_967_295).contains(&value) {
                return None;
            }
            (value as u32).to_be_bytes()
        }
        3 => {
            let parts: Vec<&str> = s.split('.').collect();
            if parts.len() != 4 {
                return None;
            }
            let mut octets = [0u8; 4];
            for (i, part) in parts.iter().enumerate() {
                let value = parse_numeric_part(part)?;
                if value > 255 {
                    return None;
                }
                octets[i] = value as u8;
            }
            octets
        }
        _ => return None,
    };
    Some(to_ipv4_mapped(&octets))
}

/// Parses a single numeric component in base 16 (`0x`/`0X` prefix), base
/// 8 (leading `0`), or base 10. Empty strings are invalid.
fn parse_numeric_part(part: &str) -> Option<u64> {
    if part.is_empty() {
        return None;
    }
    if let Some(hex) = part
        .strip_prefix("0x")
        .or_else(|| part.strip_prefix("0X"))
    {
        if hex.is_empty() {
            return None;
        }
        return u64::from_str_radix(hex, 16).ok();
    }
    if part.len() > 1 && part.starts_with('0') {
        return u64::from_str_radix(&part[1..], 8).ok();
    }
    part.parse::<u64>().ok()
}

fn to_ipv4_mapped(octets: &[u8; 4]) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    bytes[10] = 0xFF;
    bytes[11] = 0xFF;
    bytes[12..16].copy_from_slice(octets);
    bytes
}

/// Parses a bracketed IPv6 literal, e.g. `[fefe::]` or
/// `[fe80::1%eth0]` or `[::ffff:1.2.3.4]`. Returns the 16 address bytes
/// and an optional zone index.
pub(crate) fn parse_ipv6_full(s: &str) -> Option<([u8; 16], Option<String>)> {
    if s.len() < 3 || !s.starts_with('[') || !s.ends_with(']') {
        return None;
    }
    let inner = &s[1..s.len() - 1];

    let (addr_part, zone) = match inner.find('%') {
        Some(idx) => {
            let zone = &inner[idx + 1..];
            if zone.is_empty() || !zone.chars().all(crate::char_class::is_unreserved) {
                return None;
            }
            (&inner[..idx], Some(zone.to_string()))
        }
        None => (inner, None),
    };

    let bytes = parse_ipv6_address(addr_part)?;
    Some((bytes, zone))
}

fn parse_ipv6_address(addr: &str) -> Option<[u8; 16]> {
    if addr.matches("::").count() > 1 {
        return None;
    }

    let groups: Vec<u16> = if let Some(idx) = addr.find("::") {
        let left = &addr[..idx];
        let right = &addr[idx + 2..];

        let left_groups = split_hex_groups(left)?;
        let right_groups = split_hex_groups(right)?;

        let total = left_groups.len() + right_groups.len();
        if total > 7 {
            return None;
        }
        let mut full = left_groups;
        full.extend(std::iter::repeat(0u16).take(8 - total));
        full.extend(right_groups);
        full
    } else {
        let groups = split_hex_groups(addr)?;
        if groups.len() != 8 {
            return None;
        }
        groups
    };

    let mut bytes = [0u8; 16];
    for (i, g) in groups.iter().enumerate() {
        bytes[i * 2] = (g >> 8) as u8;
        bytes[i * 2 + 1] = (g & 0xFF) as u8;
    }
    Some(bytes)
}

/// Splits one side of a (possibly `::`-elided) address on `:` into 16-bit
/// groups, treating a final dotted element as an embedded IPv4 (worth two
/// groups).
fn split_hex_groups(side: &str) -> Option<Vec<u16>> {
    if side.is_empty() {
        return Some(Vec::new());
    }
    let parts: Vec<&str> = side.split(':').collect();
    let mut out = Vec::with_capacity(parts.len() + 1);
    for (i, part) in parts.iter().enumerate() {
        if i == parts.len() - 1 && part.contains('.') {
            let v4_dots = part.matches('.').count();
            if v4_dots != 3 {
                return None;
            }
            let mapped = parse_ipv4(part)?;
            out.push(u16::from_be_bytes([mapped[12], mapped[13]]));
            out.push(u16::from_be_bytes([mapped[14], mapped[15]]));
        } else {
            if part.is_empty() || part.len() > 4 {
                return None;
            }
            out.push(u16::from_str_radix(part, 16).ok()?);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_zero_dot_decimal() {
        let bytes = parse_ipv4("3279880203").expect("should parse");
        assert_eq!(&bytes[12..16], &[195, 127, 0, 11]);
    }

    #[test]
    fn ipv4_zero_dot_out_of_range_rejected() {
        assert_eq!(parse_ipv4("1"), None);
        assert_eq!(parse_ipv4("16843007"), None);
        assert!(parse_ipv4("16843008").is_some());
    }

    #[test]
    fn ipv4_three_dot_mixed_bases() {
        let bytes = parse_ipv4("0x92.168.1.1").expect("should parse");
        assert_eq!(&bytes[12..16], &[146, 168, 1, 1]);
    }

    #[test]
    fn ipv4_three_dot_octal_and_hex() {
        let bytes = parse_ipv4("077.0x22.222.11").expect("should parse");
        assert_eq!(&bytes[12..16], &[0x3F, 0x22, 222, 11]);
    }

    #[test]
    fn ipv4_rejects_other_dot_counts() {
        assert_eq!(parse_ipv4("1.1"), None);
        assert_eq!(parse_ipv4("1.1.1"), None);
        assert_eq!(parse_ipv4("1.1.1.1.1"), None);
    }

    #[test]
    fn ipv4_rejects_out_of_range_octet() {
        assert_eq!(parse_ipv4("0.0.0.256"), None);
        assert_eq!(parse_ipv4("255.255.255.256"), None);
        assert!(parse_ipv4("255.255.255.255").is_some());
    }

    #[test]
    fn ipv4_rejects_empty_part() {
        assert_eq!(parse_ipv4("1..1.1"), None);
        assert_eq!(parse_ipv4(".1.1.1"), None);
    }

    #[test]
    fn ipv6_double_colon_expands_fully() {
        let (bytes, zone) = parse_ipv6_full("[fefe::]").expect("should parse");
        assert_eq!(zone, None);
        assert_eq!(ipv6_bytes_to_text(&bytes, None), "[fefe:0:0:0:0:0:0:0]");
    }

    #[test]
    fn ipv6_embedded_ipv4_mixed_bases() {
        let (bytes, _) = parse_ipv6_full("[0:ffff::077.0x22.222.11]")
            .expect("should parse");
        assert_eq!(
            ipv6_bytes_to_text(&bytes, None),
            "[0:ffff:0:0:0:0:3f22:de0b]"
        );
    }

    #[test]
    fn ipv6_with_zone_index() {
        let (_bytes, zone) =
            parse_ipv6_full("[fe80::1%eth0]").expect("should parse");
        assert_eq!(zone.as_deref(), Some("eth0"));
    }

    #[test]
    fn ipv6_rejects_double_double_colon() {
        assert_eq!(parse_ipv6_address("1::2::3"), None);
    }

    #[test]
    fn ipv6_rejects_too_many_groups() {
        assert_eq!(parse_ipv6_address("1:2:3:4:5:6:7:8:9"), None);
        assert!(parse_ipv6_address("1:2:3:4:5:6:7:8").is_some());
    }

    #[test]
    fn normalize_host_is_noop_on_already_normalized_dns_name() {
        let first = normalize("www.google.com");
        let second = normalize(&first.text);
        assert_eq!(first, second);
    }

    #[test]
    fn normalize_host_folds_extra_dots() {
        let result = normalize("www..google..com");
        assert_eq!(result.text, "www.google.com");
    }

    #[test]
    fn normalize_host_numeric_ipv4_to_dotted() {
        let result = normalize("3279880203");
        assert_eq!(result.text, "195.127.0.11");
        assert!(result.bytes.is_some());
    }

    #[test]
    fn normalize_host_empty_is_identity() {
        let result = normalize("");
        assert_eq!(result.text, "");
        assert_eq!(result.bytes, None);
    }

    #[test]
    fn to_host_bytes_plain_ipv4() {
        let bytes = to_host_bytes("1.2.3.4").expect("should parse");
        assert_eq!(&bytes[12..16], &[1, 2, 3, 4]);
    }

    #[test]
    fn to_host_bytes_none_for_name() {
        assert_eq!(to_host_bytes("example.com"), None);
    }
}
