//! Context-anchored patches built from a diff, and their text serialization
//! (§4.3).
//!
//! A [`Patch`] is a hunk of context-anchored edits: a run of [`Diff`]s
//! together with the code-unit offsets and lengths it expects to find/leave
//! in `text1`/`text2`. Patches are the unit [`patch_apply`] anchors fuzzily
//! against a (possibly drifted) target text.

mod apply;
mod split;
mod text;

pub use apply::patch_apply;
pub use split::{patch_add_context, patch_add_padding, patch_split_max};
pub use text::{patch_from_text, patch_to_text};

use crate::diff::{diff_cleanup_semantic, diff_main, Diff, DiffList, Operation};
use crate::settings::Settings;

/// One context-anchored hunk of a patch set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Offset in the original text (`text1`) this hunk starts at.
    pub start1: usize,
    /// Offset in the new text (`text2`) this hunk starts at.
    pub start2: usize,
    /// Code units this hunk spans in `text1`.
    pub length1: usize,
    /// Code units this hunk spans in `text2`.
    pub length2: usize,
    /// The diff ops (context `Equal`s plus the actual edits) making up this
    /// hunk.
    pub diffs: DiffList,
}

impl Patch {
    fn new() -> Self {
        Patch { start1: 0, start2: 0, length1: 0, length2: 0, diffs: DiffList::new() }
    }
}

/// An ordered set of patches, applied together by [`patch_apply`].
pub type PatchList = Vec<Patch>;

/// Builds a patch list transforming `text1` into `text2`.
///
/// Internally diffs the two texts (with semantic cleanup, since a patch is
/// meant to be read and applied by a human-reviewable process, not just a
/// minimal edit script) and delegates to [`patch_make_from_diffs`].
pub fn patch_make(text1: &str, text2: &str, settings: &Settings) -> PatchList {
    let mut diffs = diff_main(text1, text2, true, settings);
    if diffs.len() > 2 {
        diff_cleanup_semantic(&mut diffs);
    }
    patch_make_from_diffs(text1, &diffs, settings)
}

/// Builds a patch list from a pre-computed diff of `text1`, without
/// re-diffing. Useful when the caller already has a diff (e.g. from
/// `diff_main`) and wants patches anchored to it verbatim.
pub fn patch_make_from_diffs(text1: &str, diffs: &[Diff], settings: &Settings) -> PatchList {
    let mut patches = PatchList::new();
    if diffs.is_empty() {
        return patches;
    }

    let mut patch = Patch::new();
    let mut char_count1 = 0usize;
    let mut char_count2 = 0usize;
    // Text already seen that should become leading/trailing context for the
    // patch currently being built.
    let mut prepatch_text = text1.to_string();
    let mut postpatch_text = text1.to_string();

    for (i, diff) in diffs.iter().enumerate() {
        if patch.diffs.is_empty() && diff.op != Operation::Equal {
            patch.start1 = char_count1;
            patch.start2 = char_count2;
        }

        match diff.op {
            Operation::Insert => {
                patch.length2 += diff.len_units();
                postpatch_text = splice_units(&postpatch_text, char_count2, 0, &diff.text);
                patch.diffs.push(diff.clone());
            }
            Operation::Delete => {
                patch.length1 += diff.len_units();
                postpatch_text = splice_units(&postpatch_text, char_count2, diff.len_units(), "");
                patch.diffs.push(diff.clone());
            }
            Operation::Equal => {
                if diff.len_units() <= 2 * settings.patch_margin as usize && !patch.diffs.is_empty() && i != diffs.len() - 1 {
                    // Small enough to absorb as context inside the current hunk.
                    patch.length1 += diff.len_units();
                    patch.length2 += diff.len_units();
                    patch.diffs.push(diff.clone());
                } else if diff.len_units() >= 2 * settings.patch_margin as usize && !patch.diffs.is_empty() {
                    // Large equality: close out the current hunk with trailing
                    // context, then start fresh.
                    finish_patch(&mut patch, &prepatch_text, settings);
                    patches.push(std::mem::replace(&mut patch, Patch::new()));
                    prepatch_text = postpatch_text.clone();
                }
            }
        }

        if diff.op != Operation::Insert {
            char_count1 += diff.len_units();
        }
        if diff.op != Operation::Delete {
            char_count2 += diff.len_units();
        }
    }

    if !patch.diffs.is_empty() {
        finish_patch(&mut patch, &prepatch_text, settings);
        patches.push(patch);
    }

    patches
}

fn finish_patch(patch: &mut Patch, prepatch_text: &str, settings: &Settings) {
    patch_add_context(patch, prepatch_text, settings);
}

fn splice_units(text: &str, at: usize, delete_count: usize, insert: &str) -> String {
    let mut units = crate::utf16::to_units(text);
    let end = (at + delete_count).min(units.len());
    units.splice(at.min(units.len())..end, crate::utf16::to_units(insert));
    crate::utf16::from_units(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_then_apply_round_trips() {
        let settings = Settings::default();
        let text1 = "The quick brown fox jumps over the lazy dog.";
        let text2 = "The quick brown cat jumps over the lazy dog and runs away.";
        let patches = patch_make(text1, text2, &settings);
        assert!(!patches.is_empty());
        let (result, applied) = patch_apply(&patches, text1, &settings);
        assert!(applied.iter().all(|&ok| ok));
        assert_eq!(result, text2);
    }

    #[test]
    fn no_diffs_yields_no_patches() {
        let settings = Settings::default();
        assert!(patch_make("same", "same", &settings).is_empty());
    }
}
