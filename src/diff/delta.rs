//! Compact text serialization of a diff (§4.1.8).
//!
//! A delta encodes only the lengths of equal/deleted runs and the literal
//! text of inserted runs, tab-separated and percent-encoded, so it can be
//! applied against any `text1` whose length matches what the delta expects
//! without needing the deleted text at all.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::diff::{Diff, DiffList, Operation};
use crate::error::{DiffMatchPatchError, Result};
use crate::utf16;

/// Characters the reference implementation leaves unescaped in a delta,
/// matching `encodeURI`'s reserved/unreserved split. Everything else —
/// including `%`, `"`, `<`, `>`, `\`, `^`, `` ` ``, `{`, `|`, `}`, `[`, `]` —
/// gets percent-encoded so decoding is unambiguous.
const DELTA_SAFE: &AsciiSet = &NON_ALPHANUMERIC
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

/// Serializes `diffs` into the tab-delimited delta text format. Only the
/// insert/equal/delete *lengths* and inserted text are recorded: `=N` for an
/// equality of `N` code units, `-N` for a deletion of `N` code units, `+text`
/// (percent-encoded) for an insertion.
pub fn diff_to_delta(diffs: &[Diff]) -> String {
    let mut tokens = Vec::with_capacity(diffs.len());
    for diff in diffs {
        match diff.op {
            Operation::Insert => {
                let encoded = utf8_percent_encode(&diff.text, DELTA_SAFE).to_string();
                tokens.push(format!("+{encoded}"));
            }
            Operation::Delete => tokens.push(format!("-{}", diff.len_units())),
            Operation::Equal => tokens.push(format!("={}", diff.len_units())),
        }
    }
    tokens.join("\t")
}

/// Reconstructs a diff list from `text1` and a delta previously produced by
/// [`diff_to_delta`]. Validates that the delta's equal/delete lengths sum to
/// exactly `text1`'s code-unit length.
pub fn diff_from_delta(text1: &str, delta: &str) -> Result<DiffList> {
    let text1_units = utf16::to_units(text1);
    let mut pos = 0usize;
    let mut diffs = DiffList::new();

    for (token_index, token) in delta.split('\t').enumerate() {
        if token.is_empty() {
            continue;
        }
        let (tag, rest) = token.split_at(1);
        match tag {
            "+" => {
                let decoded = percent_decode_str(rest).decode_utf8().map_err(|e| {
                    DiffMatchPatchError::InvalidDelta { token_index, reason: format!("invalid percent-encoding: {e}") }
                })?;
                diffs.push(Diff::insert(decoded.into_owned()));
            }
            "=" | "-" => {
                let len: usize = rest.parse().map_err(|_| DiffMatchPatchError::InvalidDelta {
                    token_index,
                    reason: format!("expected a non-negative integer length, got {rest:?}"),
                })?;
                if pos + len > text1_units.len() {
                    return Err(DiffMatchPatchError::InvalidDelta {
                        token_index,
                        reason: format!(
                            "delta length {len} at offset {pos} exceeds text1's {} code units",
                            text1_units.len()
                        ),
                    });
                }
                let text = utf16::from_units(&text1_units[pos..pos + len]);
                pos += len;
                if tag == "=" {
                    diffs.push(Diff::equal(text));
                } else {
                    diffs.push(Diff::delete(text));
                }
            }
            _ => {
                return Err(DiffMatchPatchError::InvalidDelta {
                    token_index,
                    reason: format!("unrecognized delta token tag {tag:?}"),
                })
            }
        }
    }

    if pos != text1_units.len() {
        return Err(DiffMatchPatchError::InvalidDelta {
            token_index: delta.split('\t').count(),
            reason: format!("delta covers {pos} code units but text1 has {}", text1_units.len()),
        });
    }

    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_delta() {
        let text1 = "The cat in the hat.";
        let text2 = "The dog in the hat!";
        let diffs = crate::diff::diff_main(text1, text2, true, &crate::settings::Settings::default());
        let delta = diff_to_delta(&diffs);
        let restored = diff_from_delta(text1, &delta).unwrap();
        assert_eq!(crate::diff::diff_text2(&restored), text2);
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = diff_from_delta("abc", "=5").unwrap_err();
        assert!(matches!(err, DiffMatchPatchError::InvalidDelta { .. }));
    }

    #[test]
    fn encodes_unicode_insert() {
        let diffs = vec![Diff::insert("caf\u{e9} \u{1f600}")];
        let delta = diff_to_delta(&diffs);
        assert!(delta.starts_with('+'));
        let restored = diff_from_delta("", &delta).unwrap();
        assert_eq!(restored, vec![Diff::insert("caf\u{e9} \u{1f600}")]);
    }
}
