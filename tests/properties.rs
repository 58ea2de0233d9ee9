use diff_match_patch::diff::{diff_from_delta, diff_main, diff_text1, diff_text2, diff_to_delta};
use diff_match_patch::patch::{patch_apply, patch_from_text, patch_make, patch_to_text};
use diff_match_patch::settings::Settings;
use quickcheck_macros::quickcheck;

/// `diff_main` must always produce an edit script that reconstructs both
/// inputs exactly, no matter how the texts are chosen.
#[quickcheck]
fn diff_reconstructs_both_texts(a: String, b: String) -> bool {
    let settings = Settings::default();
    let diffs = diff_main(&a, &b, true, &settings);
    diff_text1(&diffs) == a && diff_text2(&diffs) == b
}

/// A delta produced by `diff_to_delta` must parse back into a diff list that
/// reconstructs `text2`.
#[quickcheck]
fn delta_round_trips(a: String, b: String) -> bool {
    let settings = Settings::default();
    let diffs = diff_main(&a, &b, true, &settings);
    let delta = diff_to_delta(&diffs);
    match diff_from_delta(&a, &delta) {
        Ok(restored) => diff_text2(&restored) == b,
        Err(_) => false,
    }
}

/// A freshly built patch set, applied to the exact `text1` it was built
/// from, must always apply cleanly and reproduce `text2`.
#[quickcheck]
fn patch_applies_cleanly_to_its_own_source(a: String, b: String) -> bool {
    let settings = Settings::default();
    let patches = patch_make(&a, &b, &settings);
    let (result, applied) = patch_apply(&patches, &a, &settings);
    applied.iter().all(|&ok| ok) && result == b
}

/// Patch text serialization must round-trip through `patch_to_text` /
/// `patch_from_text` without losing any hunk.
#[quickcheck]
fn patch_text_round_trips(a: String, b: String) -> bool {
    let settings = Settings::default();
    let patches = patch_make(&a, &b, &settings);
    let text = patch_to_text(&patches);
    match patch_from_text(&text) {
        Ok(restored) => restored == patches,
        Err(_) => false,
    }
}
