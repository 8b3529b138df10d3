//! Path normalization: decode, collapse `.`/`..`/`//` segments with a
//! stack of slash positions, then re-encode.

use crate::util::{decode, encode};

/// Runs the full decode → collapse → encode pipeline on a path. Always
/// returns a path beginning with `/`; never fails.
pub fn normalize(path: &str) -> String {
    let decoded = decode(path);
    let collapsed = collapse_dot_segments(&decoded);
    let result = if collapsed.is_empty() {
        "/".to_string()
    } else {
        collapsed
    };
    encode(&result)
}

/// Walks `path` left to right, maintaining a stack of slash positions
/// already written to `out`, so `..` can pop back to the previous
/// segment boundary. `.`/`..` are only treated as dot-segments when they
/// are a whole segment (bounded by `/` or string ends); `/a./b.` is left
/// untouched because the trailing `.` is not its own segment.
fn collapse_dot_segments(path: &str) -> String {
    let chars: Vec<char> = path.chars().collect();
    let mut out: Vec<char> = Vec::with_capacity(chars.len());
    let mut slash_stack: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '/' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        // Collapse a run of slashes down to the last one in the run,
        // then decide what follows it.
        while matches!(chars.get(i + 1), Some('/')) {
            i += 1;
        }

        let is_dot_segment = matches!(chars.get(i + 1), Some('.'))
            && matches!(chars.get(i + 2), None | Some('/'));
        if is_dot_segment {
            // "/./" or trailing "/.": drop the segment, keep this slash
            // pending for the next iteration.
            i += 2;
            continue;
        }

        let is_dotdot_segment = matches!(chars.get(i + 1), Some('.'))
            && matches!(chars.get(i + 2), Some('.'))
            && matches!(chars.get(i + 3), None | Some('/'));
        if is_dotdot_segment {
            // "/../" or trailing "/..": pop back to the previous slash,
            // if any, discarding the segment between them.
            if let Some(prev_slash) = slash_stack.pop() {
                out.truncate(prev_slash);
            }
            i += 3;
            continue;
        }

        slash_stack.push(out.len());
        out.push('/');
        i += 1;
    }

    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_parent_segments_past_root() {
        assert_eq!(
            normalize("/a/b/../../../../../../c/d"),
            "/c/d"
        );
    }

    #[test]
    fn decodes_then_collapses_then_reencodes() {
        assert_eq!(
            normalize(
                "/%2E%73%65%63%75%72%65/%77%77%77%2E%65%62%61%79%2E%63%6F%6D/"
            ),
            "/.secure/www.ebay.com/"
        );
    }

    #[test]
    fn collapses_double_slashes() {
        assert_eq!(
            normalize("//asdfasdf/awef/sadf/sdf//"),
            "/asdfasdf/awef/sadf/sdf/"
        );
    }

    #[test]
    fn preserves_trailing_dot_on_non_dot_segment() {
        assert_eq!(normalize("/a./b."), "/a./b.");
    }

    #[test]
    fn empty_result_becomes_root() {
        assert_eq!(normalize("/.."), "/");
        assert_eq!(normalize("/."), "/");
    }

    #[test]
    fn is_idempotent() {
        let cases = [
            "/a/b/../../../../../../c/d",
            "/.secure/www.ebay.com/",
            "//asdfasdf/awef/sadf/sdf//",
            "/a./b.",
            "/",
        ];
        for case in cases {
            let once = normalize(case);
            let twice = normalize(&once);
            assert_eq!(once, twice, "not idempotent for {case:?}");
        }
    }

    #[test]
    fn single_dot_segment_in_middle_is_removed() {
        assert_eq!(normalize("/a/./b"), "/a/b");
    }

    #[test]
    fn dotdot_with_empty_stack_is_dropped() {
        assert_eq!(normalize("/../a"), "/a");
    }
}
