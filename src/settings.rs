//! The single configuration record threaded through every layer.
//!
//! Mirrors how `imara-diff` threads an [`Algorithm`](crate) choice through
//! `Diff::compute`: one plain `Clone + Debug` struct, read (never mutated) by
//! each operation it is passed to by reference.

use std::time::Duration;

/// The Bitap bit-vector word width, in bits.
///
/// Fixed at 32 to match the reference implementation's choice of machine
/// word. This is not user-configurable: [`crate::patch::patch_split_max`]
/// chooses its split points based on this constant, so changing it changes
/// patch interoperability with other ports (see `SPEC_FULL.md` §9).
pub const MATCH_MAX_BITS: usize = 32;

/// Configuration shared by the diff, match, and patch engines.
///
/// All fields are read per-operation; mutating a `Settings` while an
/// operation that borrowed it is in progress is not meaningful since Rust's
/// borrow checker already prevents that from compiling.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Number of seconds `diff_main` may spend bisecting before it falls back
    /// to a trivial `[Delete, Insert]` diff for the remaining region.
    /// `0` (or any non-positive value) disables the timeout entirely.
    pub diff_timeout: f64,

    /// Cost of an empty edit operation, used by `diff_cleanup_efficiency` to
    /// decide whether collapsing a short equality saves enough operations to
    /// be worth it. Must be a positive integer; the reference default is 4.
    pub diff_edit_cost: u32,

    /// Minimum similarity score (in `[0.0, 1.0]`) for `match_bitap` to accept
    /// a fuzzy match. Lower is more permissive.
    pub match_threshold: f32,

    /// How far (in code units) a match may drift from the expected location
    /// before `match_bitap_score` penalizes it to irrelevance.
    pub match_distance: u32,

    /// Maximum fraction (in `[0.0, 1.0]`) of `text1`'s length that may differ
    /// (by Levenshtein distance) from the text `patch_apply` anchored to,
    /// before the patch is rejected as not "close enough".
    pub patch_delete_threshold: f32,

    /// Number of code units of equality context kept on each side of a
    /// patch's edits, before `patch_add_context` grows it further for
    /// uniqueness.
    pub patch_margin: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            diff_timeout: 1.0,
            diff_edit_cost: 4,
            match_threshold: 0.5,
            match_distance: 1000,
            patch_delete_threshold: 0.5,
            patch_margin: 4,
        }
    }
}

impl Settings {
    /// The timeout as a [`Duration`], or `None` if diffing should run to
    /// completion regardless of how long it takes.
    pub(crate) fn diff_timeout(&self) -> Option<Duration> {
        if self.diff_timeout <= 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64(self.diff_timeout))
        }
    }
}
