//! Error types reported by the public API.
//!
//! Only three failure modes exist in this crate, and all three stem from
//! malformed caller input (a hand-edited delta/patch string, or a pattern
//! handed to the matcher that is wider than [`crate::MATCH_MAX_BITS`]). Every
//! other outcome — a timed-out diff, a patch that fails to anchor, an empty
//! input — is expressed in-band (a degraded `DiffList`, a `false` entry in
//! `applied`) rather than as an error; see `SPEC_FULL.md` §7.

/// Errors produced by [`diff_from_delta`](crate::diff::diff_from_delta),
/// [`patch_from_text`](crate::patch::patch_from_text), and the match engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffMatchPatchError {
    /// `diff_from_delta` was given a delta string that could not be parsed,
    /// or whose checksum against `text1` failed.
    #[error("invalid delta at token {token_index}: {reason}")]
    InvalidDelta {
        /// Index (0-based) of the tab-delimited token that failed to parse.
        token_index: usize,
        /// Human-readable explanation of what was wrong with the token.
        reason: String,
    },

    /// `patch_from_text` was given patch text that did not match the
    /// `@@ -s1,l1 +s2,l2 @@` grammar, or whose body disagreed with its header.
    #[error("invalid patch: {reason}")]
    InvalidPatch {
        /// Human-readable explanation of what was wrong with the patch text.
        reason: String,
    },

    /// A pattern longer than [`crate::MATCH_MAX_BITS`] was handed to the
    /// Bitap matcher.
    #[error("pattern of {len} code units exceeds the {max}-bit match window")]
    PatternTooLong {
        /// Length of the offending pattern, in UTF-16 code units.
        len: usize,
        /// The configured ceiling (always [`crate::MATCH_MAX_BITS`] today).
        max: usize,
    },
}

/// Convenience alias for results produced by this crate's fallible operations.
pub type Result<T> = std::result::Result<T, DiffMatchPatchError>;
