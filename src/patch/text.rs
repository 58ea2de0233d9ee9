//! Patch set text serialization (§4.3.5): the `@@ -s1,l1 +s2,l2 @@` unified
//! hunk header format, one per patch, followed by its diff body with
//! `- `/`+ `/`  ` line prefixes.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::diff::{Diff, Operation};
use crate::error::{DiffMatchPatchError, Result};
use crate::patch::{Patch, PatchList};
use crate::utf16;

/// Same reserved/unreserved split as delta insertion text (`encodeURI`-style),
/// so a diff's text encodes identically whether it ends up in a delta or a
/// patch body.
const PATCH_TEXT_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b' ')
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'#');

/// Serializes `patches` into the unified-hunk text format used by the
/// reference implementation's `patch_toText`.
pub fn patch_to_text(patches: &PatchList) -> String {
    let mut out = String::new();
    for patch in patches {
        out.push_str(&hunk_header(patch));
        out.push('\n');
        for diff in &patch.diffs {
            let prefix = match diff.op {
                Operation::Insert => '+',
                Operation::Delete => '-',
                Operation::Equal => ' ',
            };
            let encoded = utf8_percent_encode(&diff.text, PATCH_TEXT_SAFE).to_string();
            out.push(prefix);
            out.push_str(&encoded);
            out.push('\n');
        }
    }
    out
}

fn hunk_header(patch: &Patch) -> String {
    let coords1 = format_coords(patch.start1, patch.length1);
    let coords2 = format_coords(patch.start2, patch.length2);
    format!("@@ -{coords1} +{coords2} @@")
}

fn format_coords(start: usize, length: usize) -> String {
    match length {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        n => format!("{},{}", start + 1, n),
    }
}

/// Parses patch text previously produced by [`patch_to_text`].
pub fn patch_from_text(text: &str) -> Result<PatchList> {
    if text.is_empty() {
        return Ok(PatchList::new());
    }

    let mut patches = PatchList::new();
    let mut lines = text.split('\n').peekable();
    let mut line_index = 0usize;

    while let Some(&header_line) = lines.peek() {
        if header_line.is_empty() {
            lines.next();
            line_index += 1;
            continue;
        }

        let (start1, length1, start2, length2) = parse_header(header_line, line_index)?;
        lines.next();
        line_index += 1;

        let mut patch = Patch { start1, start2, length1, length2, diffs: Vec::new() };

        while let Some(&body_line) = lines.peek() {
            if body_line.is_empty() {
                lines.next();
                line_index += 1;
                continue;
            }
            if body_line.starts_with("@@ ") {
                break;
            }

            let (tag, rest) = body_line.split_at(1);
            let decoded = percent_decode_str(rest).decode_utf8().map_err(|e| DiffMatchPatchError::InvalidPatch {
                reason: format!("line {line_index}: invalid percent-encoding: {e}"),
            })?;

            let diff = match tag {
                "+" => Diff::new(Operation::Insert, decoded.into_owned()),
                "-" => Diff::new(Operation::Delete, decoded.into_owned()),
                " " => Diff::new(Operation::Equal, decoded.into_owned()),
                other => {
                    return Err(DiffMatchPatchError::InvalidPatch {
                        reason: format!("line {line_index}: unrecognized prefix {other:?}"),
                    })
                }
            };
            patch.diffs.push(diff);
            lines.next();
            line_index += 1;
        }

        validate_patch(&patch, line_index)?;
        patches.push(patch);
    }

    Ok(patches)
}

fn parse_header(line: &str, line_index: usize) -> Result<(usize, usize, usize, usize)> {
    let body = line
        .strip_prefix("@@ -")
        .and_then(|s| s.strip_suffix(" @@"))
        .ok_or_else(|| DiffMatchPatchError::InvalidPatch {
            reason: format!("line {line_index}: expected a '@@ -s,l +s,l @@' header, got {line:?}"),
        })?;

    let (left, right) = body.split_once(" +").ok_or_else(|| DiffMatchPatchError::InvalidPatch {
        reason: format!("line {line_index}: malformed hunk header {line:?}"),
    })?;

    let (start1, length1) = parse_coords(left, line_index)?;
    let (start2, length2) = parse_coords(right, line_index)?;
    Ok((start1, length1, start2, length2))
}

/// Parses one `start[,length]` coordinate pair from a hunk header, undoing
/// the 1-based/0-based and implicit-length-1 conventions of [`format_coords`].
fn parse_coords(s: &str, line_index: usize) -> Result<(usize, usize)> {
    let malformed =
        || DiffMatchPatchError::InvalidPatch { reason: format!("line {line_index}: malformed coordinate {s:?}") };

    match s.split_once(',') {
        Some((start, len)) => {
            let start: usize = start.parse().map_err(|_| malformed())?;
            let len: usize = len.parse().map_err(|_| malformed())?;
            let start = if len == 0 { start } else { start.saturating_sub(1) };
            Ok((start, len))
        }
        None => {
            let start: usize = s.parse().map_err(|_| malformed())?;
            Ok((start.saturating_sub(1), 1))
        }
    }
}

fn validate_patch(patch: &Patch, line_index: usize) -> Result<()> {
    let expected_len1: usize = patch.diffs.iter().filter(|d| d.op != Operation::Insert).map(|d| d.len_units()).sum();
    let expected_len2: usize = patch.diffs.iter().filter(|d| d.op != Operation::Delete).map(|d| d.len_units()).sum();
    if expected_len1 != patch.length1 || expected_len2 != patch.length2 {
        return Err(DiffMatchPatchError::InvalidPatch {
            reason: format!(
                "line {line_index}: hunk header declared lengths ({}, {}) but body sums to ({expected_len1}, {expected_len2})",
                patch.length1, patch.length2
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::patch_make;
    use crate::settings::Settings;

    #[test]
    fn round_trips_through_text() {
        let settings = Settings::default();
        let text1 = "The quick brown fox jumps over the lazy dog.";
        let text2 = "The quick brown cat jumps over the lazy dog and runs away.";
        let patches = patch_make(text1, text2, &settings);
        let text = patch_to_text(&patches);
        let restored = patch_from_text(&text).unwrap();
        assert_eq!(restored, patches);
    }

    #[test]
    fn rejects_malformed_header() {
        let err = patch_from_text("not a header\n").unwrap_err();
        assert!(matches!(err, DiffMatchPatchError::InvalidPatch { .. }));
    }

    #[test]
    fn empty_text_is_empty_patch_list() {
        assert_eq!(patch_from_text("").unwrap(), PatchList::new());
    }
}
