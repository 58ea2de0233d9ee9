//! Computes a minimal (or near-minimal) edit script transforming one string
//! into another.
//!
//! The main entry point is [`diff_main`]. The algorithm is a UTF-16
//! code-unit-indexed port of Myers' O(ND) diff (`bisect`), wrapped in several
//! layers of preprocessing (`half_match`, `line_mode`) and postprocessing
//! (`cleanup`) that the reference implementation layers on top to keep
//! output both fast and human-friendly. See `SPEC_FULL.md` §4.1 for the
//! full algorithm description.

mod bisect;
mod cleanup;
mod delta;
mod line_mode;

pub use cleanup::{diff_cleanup_efficiency, diff_cleanup_merge, diff_cleanup_semantic, diff_cleanup_semantic_lossless};
pub use delta::{diff_from_delta, diff_to_delta};

use std::time::{Duration, Instant};

use crate::settings::Settings;
use crate::utf16;

/// A single edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Text present in `text1` but not `text2`.
    Delete,
    /// Text present in `text2` but not `text1`.
    Insert,
    /// Text present, unchanged, in both `text1` and `text2`.
    Equal,
}

/// One element of an edit script: an [`Operation`] paired with the text it
/// applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    /// What kind of edit this is.
    pub op: Operation,
    /// The text affected by `op`.
    pub text: String,
}

impl Diff {
    /// Constructs a new diff element.
    pub fn new(op: Operation, text: impl Into<String>) -> Self {
        Diff { op, text: text.into() }
    }

    pub(crate) fn equal(text: impl Into<String>) -> Self {
        Diff::new(Operation::Equal, text)
    }

    pub(crate) fn delete(text: impl Into<String>) -> Self {
        Diff::new(Operation::Delete, text)
    }

    pub(crate) fn insert(text: impl Into<String>) -> Self {
        Diff::new(Operation::Insert, text)
    }

    pub(crate) fn units(&self) -> Vec<u16> {
        utf16::to_units(&self.text)
    }

    pub(crate) fn len_units(&self) -> usize {
        utf16::len(&self.text)
    }
}

/// An ordered edit script. Diffs are kept as plain `Vec`s: every pass either
/// walks one left to right or rebuilds it from scratch, so there is no
/// benefit to a dedicated newtype over a type alias.
pub type DiffList = Vec<Diff>;

/// Absolute wall-clock point after which [`bisect::diff_bisect`] gives up and
/// returns a trivial `[Delete, Insert]` diff for the remaining region.
///
/// Represented as an absolute `Instant` (not a remaining `Duration`) so that
/// nested recursive calls all share the same deadline, exactly as the
/// reference passes one deadline value through the whole recursion tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    fn from_timeout(timeout: Option<Duration>) -> Self {
        Deadline(timeout.map(|d| Instant::now() + d))
    }

    pub(crate) fn none() -> Self {
        Deadline(None)
    }

    pub(crate) fn exceeded(&self) -> bool {
        matches!(self.0, Some(deadline) if Instant::now() > deadline)
    }
}

/// Computes the edit script that transforms `text1` into `text2`.
///
/// `checklines` enables the line-mode preprocessing fast path for large
/// inputs (§4.1.4); callers that need character-level precision on already
/// line-sized input (for example when `diff_line_mode` recurses into a
/// changed region) pass `false`.
pub fn diff_main(text1: &str, text2: &str, checklines: bool, settings: &Settings) -> DiffList {
    if text1 == text2 {
        return if text1.is_empty() { Vec::new() } else { vec![Diff::equal(text1)] };
    }

    let deadline = Deadline::from_timeout(settings.diff_timeout());

    let text1_units = utf16::to_units(text1);
    let text2_units = utf16::to_units(text2);

    let prefix_len = utf16::common_prefix(&text1_units, &text2_units);
    let common_prefix = &text1_units[..prefix_len];
    let mid1 = &text1_units[prefix_len..];
    let mid2 = &text2_units[prefix_len..];

    let suffix_len = utf16::common_suffix(mid1, mid2);
    let common_suffix = &mid1[mid1.len() - suffix_len..];
    let mid1 = &mid1[..mid1.len() - suffix_len];
    let mid2 = &mid2[..mid2.len() - suffix_len];

    let mut diffs = diff_compute(mid1, mid2, checklines, deadline, settings);

    if !common_prefix.is_empty() {
        diffs.insert(0, Diff::equal(utf16::from_units(common_prefix)));
    }
    if !common_suffix.is_empty() {
        diffs.push(Diff::equal(utf16::from_units(common_suffix)));
    }

    diff_cleanup_merge(&mut diffs);
    diffs
}

/// Dispatches to the cheapest strategy that applies: exact containment,
/// single-character fallback, half-match splicing, line mode, or bisection.
/// See §4.1.2.
fn diff_compute(
    text1: &[u16],
    text2: &[u16],
    checklines: bool,
    deadline: Deadline,
    settings: &Settings,
) -> DiffList {
    if text1.is_empty() {
        return vec![Diff::insert(utf16::from_units(text2))];
    }
    if text2.is_empty() {
        return vec![Diff::delete(utf16::from_units(text1))];
    }

    let (shorter, longer, shorter_is_text1) =
        if text1.len() > text2.len() { (text2, text1, false) } else { (text1, text2, true) };

    if let Some(index) = find_subslice(longer, shorter) {
        // The shorter text is a substring of the longer one: it's an
        // insertion or deletion wrapped around a shared equality.
        let op = if shorter_is_text1 { Operation::Insert } else { Operation::Delete };
        let mut diffs = Vec::with_capacity(3);
        if index > 0 {
            diffs.push(Diff::new(op, utf16::from_units(&longer[..index])));
        }
        diffs.push(Diff::equal(utf16::from_units(shorter)));
        if index + shorter.len() < longer.len() {
            diffs.push(Diff::new(op, utf16::from_units(&longer[index + shorter.len()..])));
        }
        return diffs;
    }

    if shorter.len() == 1 {
        return vec![Diff::delete(utf16::from_units(text1)), Diff::insert(utf16::from_units(text2))];
    }

    if let Some(half_match) = diff_half_match(text1, text2, deadline, settings) {
        let diffs1 = diff_main_units(half_match.text1_prefix, half_match.text2_prefix, checklines, deadline, settings);
        let diffs2 = diff_main_units(half_match.text1_suffix, half_match.text2_suffix, checklines, deadline, settings);
        let mut diffs = diffs1;
        diffs.push(Diff::equal(utf16::from_units(half_match.common_middle)));
        diffs.extend(diffs2);
        return diffs;
    }

    if checklines && text1.len() >= 100 && text2.len() >= 100 {
        return line_mode::diff_line_mode(text1, text2, deadline, settings);
    }

    bisect::diff_bisect(text1, text2, deadline, settings)
}

/// Like [`diff_main`], but operates directly on already-split code units so
/// that internal recursion (half-match, line-mode) never has to round-trip
/// through `String` and re-strip a prefix/suffix it already trimmed.
pub(crate) fn diff_main_units(
    text1: &[u16],
    text2: &[u16],
    checklines: bool,
    deadline: Deadline,
    settings: &Settings,
) -> DiffList {
    if text1 == text2 {
        return if text1.is_empty() { Vec::new() } else { vec![Diff::equal(utf16::from_units(text1))] };
    }

    let prefix_len = utf16::common_prefix(text1, text2);
    let common_prefix = &text1[..prefix_len];
    let mid1 = &text1[prefix_len..];
    let mid2 = &text2[prefix_len..];

    let suffix_len = utf16::common_suffix(mid1, mid2);
    let common_suffix = &mid1[mid1.len() - suffix_len..];
    let mid1 = &mid1[..mid1.len() - suffix_len];
    let mid2 = &mid2[..mid2.len() - suffix_len];

    let mut diffs = diff_compute(mid1, mid2, checklines, deadline, settings);

    if !common_prefix.is_empty() {
        diffs.insert(0, Diff::equal(utf16::from_units(common_prefix)));
    }
    if !common_suffix.is_empty() {
        diffs.push(Diff::equal(utf16::from_units(common_suffix)));
    }

    diff_cleanup_merge(&mut diffs);
    diffs
}

fn find_subslice(haystack: &[u16], needle: &[u16]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

struct HalfMatch<'a> {
    text1_prefix: &'a [u16],
    text1_suffix: &'a [u16],
    text2_prefix: &'a [u16],
    text2_suffix: &'a [u16],
    common_middle: &'a [u16],
}

/// Finds a substring shared by `text1` and `text2` that is at least half the
/// length of the longer input, and splices the recursive diff of the
/// surrounding regions around it. Skipped when the timeout is disabled,
/// since the heuristic is not minimal and a disabled timeout signals the
/// caller wants the minimal diff (§4.1.6).
fn diff_half_match<'a>(
    text1: &'a [u16],
    text2: &'a [u16],
    deadline: Deadline,
    settings: &Settings,
) -> Option<HalfMatch<'a>> {
    if settings.diff_timeout <= 0.0 {
        return None;
    }
    let _ = deadline;

    let (shorter, longer, swapped) =
        if text1.len() > text2.len() { (text2, text1, true) } else { (text1, text2, false) };

    if longer.len() < 4 || shorter.len() * 2 < longer.len() {
        return None;
    }

    // Try a seed from each quarter of the longer text; the best of the two
    // attempts wins, matching the reference's two-probe strategy.
    let hm1 = half_match_candidate(longer, shorter, (longer.len() + 3) / 4);
    let hm2 = half_match_candidate(longer, shorter, (longer.len() + 1) / 2);

    let best = match (hm1, hm2) {
        (None, None) => return None,
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (Some(a), Some(b)) => {
            if b.common_middle.len() > a.common_middle.len() {
                b
            } else {
                a
            }
        }
    };

    let (longer_prefix, longer_suffix, shorter_prefix, shorter_suffix, common_middle) = best.into_tuple();

    if swapped {
        Some(HalfMatch {
            text1_prefix: shorter_prefix,
            text1_suffix: shorter_suffix,
            text2_prefix: longer_prefix,
            text2_suffix: longer_suffix,
            common_middle,
        })
    } else {
        Some(HalfMatch {
            text1_prefix: longer_prefix,
            text1_suffix: longer_suffix,
            text2_prefix: shorter_prefix,
            text2_suffix: shorter_suffix,
            common_middle,
        })
    }
}

struct Candidate<'a> {
    longer_prefix: &'a [u16],
    longer_suffix: &'a [u16],
    shorter_prefix: &'a [u16],
    shorter_suffix: &'a [u16],
    common_middle: &'a [u16],
}

impl<'a> Candidate<'a> {
    fn into_tuple(self) -> (&'a [u16], &'a [u16], &'a [u16], &'a [u16], &'a [u16]) {
        (self.longer_prefix, self.longer_suffix, self.shorter_prefix, self.shorter_suffix, self.common_middle)
    }
}

/// Looks for a run of `longer` starting at `seed_start..seed_start+seed_len`
/// that also occurs in `shorter`, then greedily extends it in both
/// directions. Mirrors the reference's `diff_halfMatchI`.
fn half_match_candidate<'a>(longer: &'a [u16], shorter: &'a [u16], seed_start: usize) -> Option<Candidate<'a>> {
    let seed_len = longer.len() / 4;
    let seed = &longer[seed_start..seed_start + seed_len];

    let mut best_common_len = 0;
    let mut best: Option<(usize, usize, usize)> = None; // (longer_start, shorter_start, common_len)

    let mut search_from = 0;
    while let Some(found) = find_subslice(&shorter[search_from..], seed) {
        let shorter_start = search_from + found;

        let prefix_len = utf16::common_prefix(&longer[seed_start..], &shorter[shorter_start..]);
        let suffix_len = utf16::common_suffix(&longer[..seed_start], &shorter[..shorter_start]);

        let common_len = prefix_len + suffix_len;
        if common_len > best_common_len {
            best_common_len = common_len;
            best = Some((seed_start - suffix_len, shorter_start - suffix_len, common_len));
        }

        search_from = shorter_start + 1;
        if search_from >= shorter.len() {
            break;
        }
    }

    let (longer_start, shorter_start, common_len) = best?;
    if common_len * 2 < longer.len() {
        return None;
    }

    Some(Candidate {
        longer_prefix: &longer[..longer_start],
        longer_suffix: &longer[longer_start + common_len..],
        shorter_prefix: &shorter[..shorter_start],
        shorter_suffix: &shorter[shorter_start + common_len..],
        common_middle: &longer[longer_start..longer_start + common_len],
    })
}

/// Concatenates the `Equal` and `Delete` text, reconstructing `text1`.
pub fn diff_text1(diffs: &[Diff]) -> String {
    let mut out = String::new();
    for diff in diffs {
        if diff.op != Operation::Insert {
            out.push_str(&diff.text);
        }
    }
    out
}

/// Concatenates the `Equal` and `Insert` text, reconstructing `text2`.
pub fn diff_text2(diffs: &[Diff]) -> String {
    let mut out = String::new();
    for diff in diffs {
        if diff.op != Operation::Delete {
            out.push_str(&diff.text);
        }
    }
    out
}

/// Number of inserted plus deleted code units, except that at each boundary
/// where a run of inserts meets a run of deletes the two lengths are
/// combined by `max` rather than summed (a replacement of N chars by M chars
/// costs `max(N, M)` edits, not `N + M`).
pub fn diff_levenshtein(diffs: &[Diff]) -> usize {
    let mut levenshtein = 0;
    let mut insertions = 0;
    let mut deletions = 0;
    for diff in diffs {
        match diff.op {
            Operation::Insert => insertions += diff.len_units(),
            Operation::Delete => deletions += diff.len_units(),
            Operation::Equal => {
                levenshtein += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }
    levenshtein + insertions.max(deletions)
}

/// Maps a code-unit position `loc` in `text1` to the corresponding position
/// in `text2`. If `loc` falls inside a deleted run, returns the position
/// right after that run ends in `text2`.
pub fn diff_x_index(diffs: &[Diff], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut found_diff = None;

    for diff in diffs {
        let len = diff.len_units();
        if diff.op != Operation::Insert {
            chars1 += len;
        }
        if diff.op != Operation::Delete {
            chars2 += len;
        }
        if chars1 > loc {
            found_diff = Some(diff.op);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }

    match found_diff {
        Some(Operation::Delete) => last_chars2,
        _ => last_chars2 + (loc - last_chars1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_map() {
        let settings = Settings::default();
        let diffs = diff_main("cat", "map", true, &settings);
        assert_eq!(
            diffs,
            vec![
                Diff::delete("c"),
                Diff::insert("m"),
                Diff::equal("a"),
                Diff::delete("t"),
                Diff::insert("p"),
            ]
        );
    }

    #[test]
    fn identical_strings_are_empty() {
        let settings = Settings::default();
        assert_eq!(diff_main("", "", true, &settings), Vec::new());
        assert_eq!(diff_main("same", "same", true, &settings), vec![Diff::equal("same")]);
    }

    #[test]
    fn reconstructs_both_inputs() {
        let settings = Settings::default();
        let cases = [
            ("", "abc"),
            ("abc", ""),
            ("The quick brown fox jumps over the lazy dog.", "That quick brown fox jumped over a lazy dog."),
            ("1234567890", "abcdefghij"),
            ("x12x", "x34x"),
        ];
        for (a, b) in cases {
            let diffs = diff_main(a, b, true, &settings);
            assert_eq!(diff_text1(&diffs), a, "text1 reconstruction failed for {a:?} -> {b:?}");
            assert_eq!(diff_text2(&diffs), b, "text2 reconstruction failed for {a:?} -> {b:?}");
        }
    }

    #[test]
    fn levenshtein_bounds_and_boundary_max() {
        let diffs = vec![Diff::delete("abc"), Diff::insert("xy")];
        // a replacement of 3 chars by 2 costs max(3, 2) = 3, not 5.
        assert_eq!(diff_levenshtein(&diffs), 3);

        let diffs = vec![Diff::equal("pre"), Diff::insert("abc"), Diff::equal("post")];
        assert_eq!(diff_levenshtein(&diffs), 3);
    }

    #[test]
    fn x_index_monotonic_and_handles_deletes() {
        let diffs = vec![Diff::delete("a"), Diff::insert("1234"), Diff::equal("xyz")];
        assert_eq!(diff_x_index(&diffs, 0), 4);
        assert_eq!(diff_x_index(&diffs, 1), 5);

        let mut prev = diff_x_index(&diffs, 0);
        for loc in 1..=4 {
            let cur = diff_x_index(&diffs, loc);
            assert!(cur >= prev);
            prev = cur;
        }
    }
}
