//! Applies a patch list to a (possibly drifted) text (§4.3.4).

use crate::diff::{diff_cleanup_semantic_lossless, diff_main, diff_levenshtein, diff_x_index, Operation};
use crate::match_engine::match_main;
use crate::patch::split::{patch_add_padding, patch_split_max};
use crate::patch::{Patch, PatchList};
use crate::settings::Settings;
use crate::utf16;

/// Applies `patches` to `text`, anchoring each hunk with fuzzy matching so
/// small drift between the patch's expected context and the real text
/// doesn't cause the whole hunk to fail.
///
/// Returns the patched text alongside one `bool` per patch reporting whether
/// it was successfully applied. A patch that fails to anchor (or anchors
/// but its content is too different from what was expected, per
/// `settings.patch_delete_threshold`) is skipped and its `bool` is `false`;
/// the rest still get a chance to apply.
pub fn patch_apply(patches: &PatchList, text: &str, settings: &Settings) -> (String, Vec<bool>) {
    if patches.is_empty() {
        return (text.to_string(), Vec::new());
    }

    let mut patches = patches.clone();
    patch_add_padding(&mut patches, settings);
    patch_split_max(&mut patches, settings);
    // Patches now expect the padded text; anchor against a padded copy and
    // trim the padding back off on return.
    let padding_len = settings.patch_margin as usize;
    let padding: String = (1..=padding_len).map(|i| char::from_u32(i as u32).unwrap_or(' ')).collect();
    let mut text_units = utf16::to_units(&format!("{padding}{text}{padding}"));

    let mut applied = Vec::with_capacity(patches.len());
    let mut delta: i64 = 0;

    for patch in &patches {
        let expected_loc = (patch.start2 as i64 + delta) as usize;
        let text1: String = patch.diffs.iter().filter(|d| d.op != Operation::Insert).map(|d| d.text.as_str()).collect();

        let (start_loc, end_loc) = find_anchor(&text_units, &text1, expected_loc, settings);

        let Some(start_loc) = start_loc else {
            applied.push(false);
            continue;
        };

        let replacement = if let Some(end_loc) = end_loc {
            reconcile_patch(patch, &text_units, start_loc, end_loc, settings)
        } else {
            reconcile_patch(patch, &text_units, start_loc, start_loc + utf16::len(&text1), settings)
        };

        match replacement {
            Some((new_text, consumed_end)) => {
                let new_units = utf16::to_units(&new_text);
                let old_len = consumed_end - start_loc;
                text_units.splice(start_loc..start_loc + old_len.min(text_units.len() - start_loc), new_units.iter().copied());
                delta += new_units.len() as i64 - old_len as i64;
                applied.push(true);
            }
            None => applied.push(false),
        }
    }

    let mut result_units = text_units;
    let pad_len = padding_len.min(result_units.len());
    result_units.drain(0..pad_len);
    let trim_end = padding_len.min(result_units.len());
    result_units.truncate(result_units.len() - trim_end);

    (utf16::from_units(&result_units), applied)
}

/// Finds where `pattern` (the patch's expected pre-image) anchors in
/// `text_units` near `expected_loc`. For patterns short enough to search in
/// one shot this is a single `match_main` call; for longer ones the
/// reference splits the search into matching the start and end separately.
fn find_anchor(text_units: &[u16], pattern: &str, expected_loc: usize, settings: &Settings) -> (Option<usize>, Option<usize>) {
    let text = utf16::from_units(text_units);
    let pattern_len = utf16::len(pattern);

    if pattern_len > crate::settings::MATCH_MAX_BITS {
        let start_pattern = first_n_units(pattern, crate::settings::MATCH_MAX_BITS);
        let end_pattern = last_n_units(pattern, crate::settings::MATCH_MAX_BITS);

        let start_loc = match_main(&text, &start_pattern, expected_loc, settings).ok().flatten();
        let end_expected = expected_loc + pattern_len - utf16::len(&end_pattern);
        let end_loc = match_main(&text, &end_pattern, end_expected, settings).ok().flatten();

        match (start_loc, end_loc) {
            (Some(s), Some(e)) if e >= s => (Some(s), Some(e + utf16::len(&end_pattern))),
            (Some(s), _) => (Some(s), None),
            (None, Some(e)) => (Some(e.saturating_sub(pattern_len - utf16::len(&end_pattern))), None),
            (None, None) => (None, None),
        }
    } else {
        (match_main(&text, pattern, expected_loc, settings).ok().flatten(), None)
    }
}

fn first_n_units(s: &str, n: usize) -> String {
    let units = utf16::to_units(s);
    utf16::from_units(&units[..n.min(units.len())])
}

fn last_n_units(s: &str, n: usize) -> String {
    let units = utf16::to_units(s);
    utf16::from_units(&units[units.len() - n.min(units.len())..])
}

/// Once a hunk is anchored at `[start_loc, end_loc)`, checks the matched
/// region's Levenshtein distance from the patch's expected pre-image
/// against `settings.patch_delete_threshold`, and if acceptable, builds the
/// replacement text by diffing expected-vs-actual and walking the patch's
/// diffs through [`diff_x_index`].
fn reconcile_patch(patch: &Patch, text_units: &[u16], start_loc: usize, end_loc: usize, settings: &Settings) -> Option<(String, usize)> {
    let expected_text1: String = patch.diffs.iter().filter(|d| d.op != Operation::Insert).map(|d| d.text.as_str()).collect();
    let end_loc = end_loc.min(text_units.len());
    if start_loc > end_loc {
        return None;
    }
    let actual = utf16::from_units(&text_units[start_loc..end_loc]);

    if expected_text1 == actual {
        // Exact anchor: splice the patch's insertions/equalities in directly.
        let new_text: String = patch.diffs.iter().filter(|d| d.op != Operation::Delete).map(|d| d.text.as_str()).collect();
        return Some((new_text, end_loc));
    }

    let mut diffs = diff_main(&expected_text1, &actual, false, settings);
    let distance = diff_levenshtein(&diffs) as f64;
    if distance / utf16::len(&expected_text1).max(1) as f64 > settings.patch_delete_threshold as f64 {
        return None;
    }
    diff_cleanup_semantic_lossless(&mut diffs);

    let mut index1 = 0usize;
    let mut new_text = String::new();
    for diff in &patch.diffs {
        match diff.op {
            Operation::Insert => new_text.push_str(&diff.text),
            Operation::Equal => {
                let index2 = diff_x_index(&diffs, index1);
                let end2 = diff_x_index(&diffs, index1 + diff.len_units());
                let actual_units = utf16::to_units(&actual);
                if index2 < actual_units.len() {
                    new_text.push_str(&utf16::from_units(&actual_units[index2..end2.min(actual_units.len())]));
                }
                index1 += diff.len_units();
            }
            Operation::Delete => {
                index1 += diff.len_units();
            }
        }
    }

    Some((new_text, end_loc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::patch_make;

    #[test]
    fn applies_cleanly_when_unmodified() {
        let settings = Settings::default();
        let text1 = "The quick brown fox jumps over the lazy dog.";
        let text2 = "The quick brown fox leaps over the lazy dog.";
        let patches = patch_make(text1, text2, &settings);
        let (result, applied) = patch_apply(&patches, text1, &settings);
        assert!(applied.iter().all(|&ok| ok));
        assert_eq!(result, text2);
    }

    #[test]
    fn tolerates_minor_drift_in_target_text() {
        let settings = Settings::default();
        let text1 = "The quick brown fox jumps over the lazy dog. Extra trailing sentence here to pad things out.";
        let text2 = "The quick brown fox leaps over the lazy dog. Extra trailing sentence here to pad things out.";
        let patches = patch_make(text1, text2, &settings);

        let drifted = text1.replacen("Extra", "Some", 1);
        let (result, applied) = patch_apply(&patches, &drifted, &settings);
        assert!(applied.iter().any(|&ok| ok));
        assert!(result.contains("leaps"));
    }

    #[test]
    fn reports_failure_when_context_is_gone() {
        let settings = Settings::default();
        let text1 = "abcdefghij0123456789ABCDEFGHIJklmnopqrstuvwxyz";
        let text2 = "abcdefghijXXXX0123456789ABCDEFGHIJklmnopqrstuvwxyz";
        let patches = patch_make(text1, text2, &settings);
        let (_, applied) = patch_apply(&patches, "completely different unrelated text entirely", &settings);
        assert!(applied.iter().any(|&ok| !ok));
    }
}
