#![deny(missing_docs)]
//! `diff-match-patch` computes, applies, and serializes text differences.
//!
//! The crate is split into three engines that build on one another:
//!
//! * [`diff`] computes a minimal (or near-minimal) edit script between two
//!   strings, using a UTF-16 code-unit-indexed port of Myers' `O(ND)`
//!   algorithm with line-mode preprocessing for large inputs.
//! * [`match_engine`] finds the best fuzzy occurrence of a short pattern
//!   inside a larger text using Bitap, tolerating both character-level typos
//!   and drift in the expected location.
//! * [`patch`] builds context-anchored patches from a diff and applies them
//!   to a (possibly modified) copy of the original text, re-anchoring each
//!   hunk with the match engine when the text has drifted.
//!
//! All three engines index text in UTF-16 code units rather than bytes or
//! `char`s, to stay interoperable with the other language ports of this
//! algorithm that this crate's wire formats (deltas, patch text) are meant
//! to interchange with.
//!
//! # Example
//!
//! ```
//! use diff_match_patch::diff::{diff_main, diff_text1, diff_text2};
//! use diff_match_patch::settings::Settings;
//!
//! let settings = Settings::default();
//! let diffs = diff_main("The quick brown fox", "The slow brown fox", true, &settings);
//! assert_eq!(diff_text1(&diffs), "The quick brown fox");
//! assert_eq!(diff_text2(&diffs), "The slow brown fox");
//! ```

pub mod diff;
pub mod error;
pub mod match_engine;
pub mod patch;
pub mod settings;
mod utf16;

pub use error::{DiffMatchPatchError, Result};
pub use settings::{Settings, MATCH_MAX_BITS};
