//! Line-mode preprocessing (§4.1.4).
//!
//! Large inputs are first compressed to one pseudo-character per line (so a
//! multi-thousand-line file becomes a short string of code units), diffed at
//! that granularity, then expanded back to real text. Runs of adjacent
//! deletes/inserts produced by the line-level diff are finally re-diffed at
//! character granularity so word-level edits inside a changed line are still
//! precise.
//!
//! The line table is a hashtable-based interner in the same shape as the
//! teacher's `Interner<T>` (`ahash` + `hashbrown::raw::RawTable`), specialized
//! to map `&str` lines to `u16` pseudo-characters instead of generic tokens.

use ahash::RandomState;
use hashbrown::raw::RawTable;

use crate::diff::cleanup::diff_cleanup_semantic;
use crate::diff::{diff_main_units, Deadline, Diff, DiffList, Operation};
use crate::settings::Settings;
use crate::utf16;

/// Lines seen so far during `diff_lines_to_chars`, in first-seen order.
/// Index 0 is an unused blank sentinel so real lines start at pseudo-char 1.
struct LineInterner {
    lines: Vec<String>,
    table: RawTable<u16>,
    hasher: RandomState,
}

impl LineInterner {
    fn new() -> Self {
        LineInterner { lines: vec![String::new()], table: RawTable::new(), hasher: RandomState::new() }
    }

    fn get(&self, line: &str) -> Option<u16> {
        let hash = self.hasher.hash_one(line);
        self.table.get(hash, |&idx| self.lines[idx as usize] == line).copied()
    }

    fn insert_new(&mut self, line: String) -> u16 {
        let idx = self.lines.len() as u16;
        let hash = self.hasher.hash_one(line.as_str());
        self.lines.push(line);
        self.table.insert(hash, idx, |&idx| self.hasher.hash_one(self.lines[idx as usize].as_str()));
        idx
    }

    fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Splits `text` into lines (the trailing `\n`, if any, stays attached to the
/// line it ends) and replaces each with a pseudo-character, reusing the same
/// code for repeated lines. Once `max_lines` distinct lines have been
/// registered, any further distinct line collapses the remainder of `text`
/// into a single final pseudo-line, to stay within the 16-bit alphabet.
fn munge(text: &str, interner: &mut LineInterner, max_lines: usize) -> Vec<u16> {
    let mut chars = Vec::new();
    let bytes = text.as_bytes();
    let mut line_start = 0usize;

    while line_start < bytes.len() {
        let mut line_end = match memchr::memchr(b'\n', &bytes[line_start..]) {
            Some(pos) => line_start + pos + 1,
            None => bytes.len(),
        };
        let line = &text[line_start..line_end];

        let code = if let Some(existing) = interner.get(line) {
            existing
        } else if interner.len() == max_lines {
            let rest = &text[line_start..];
            line_end = bytes.len();
            interner.insert_new(rest.to_string())
        } else {
            interner.insert_new(line.to_string())
        };
        chars.push(code);
        line_start = line_end;
    }

    chars
}

/// Builds the pseudo-character encoding of `text1`/`text2` and the line
/// table needed to decode it back (§4.1.4). `text1` is capped at 40,000
/// distinct lines; the shared table (including whatever `text1` already
/// registered) is capped at 65,535 overall.
fn diff_lines_to_chars(text1: &str, text2: &str) -> (Vec<u16>, Vec<u16>, Vec<String>) {
    let mut interner = LineInterner::new();
    let chars1 = munge(text1, &mut interner, 40_000);
    let chars2 = munge(text2, &mut interner, 65_535);
    (chars1, chars2, interner.lines)
}

/// Expands each diff's pseudo-character text back into the real lines it
/// stands for.
fn diff_chars_to_lines(diffs: &mut DiffList, line_array: &[String]) {
    for diff in diffs.iter_mut() {
        let mut text = String::with_capacity(diff.text.len());
        for ch in diff.text.chars() {
            if let Some(line) = line_array.get(ch as usize) {
                text.push_str(line);
            }
        }
        diff.text = text;
    }
}

/// Runs the full line-mode pipeline: compress to pseudo-chars, diff, expand,
/// then re-diff each run of adjacent deletes/inserts at character
/// granularity so word-level precision isn't lost inside changed lines.
pub(crate) fn diff_line_mode(text1: &[u16], text2: &[u16], deadline: Deadline, settings: &Settings) -> DiffList {
    let text1_str = utf16::from_units(text1);
    let text2_str = utf16::from_units(text2);

    let (chars1, chars2, line_array) = diff_lines_to_chars(&text1_str, &text2_str);

    let mut diffs = diff_main_units(&chars1, &chars2, false, deadline, settings);

    diff_chars_to_lines(&mut diffs, &line_array);
    diff_cleanup_semantic(&mut diffs);

    refine_delete_insert_runs(&mut diffs, deadline, settings)
}

/// Walks the line-level diff, and at each point where a run of deletes is
/// immediately followed by a run of inserts (or vice versa), re-diffs the
/// concatenated text of the two runs at character granularity.
fn refine_delete_insert_runs(diffs: &mut DiffList, deadline: Deadline, settings: &Settings) -> DiffList {
    let mut out = DiffList::new();
    let mut text_delete = String::new();
    let mut text_insert = String::new();
    let mut has_delete = false;
    let mut has_insert = false;

    let mut flush = |out: &mut DiffList, text_delete: &mut String, text_insert: &mut String, has_delete: &mut bool, has_insert: &mut bool| {
        if *has_delete && *has_insert {
            let refined = diff_main_units(
                &utf16::to_units(text_delete),
                &utf16::to_units(text_insert),
                false,
                deadline,
                settings,
            );
            out.extend(refined);
        } else {
            if *has_delete {
                out.push(Diff::delete(std::mem::take(text_delete)));
            }
            if *has_insert {
                out.push(Diff::insert(std::mem::take(text_insert)));
            }
        }
        text_delete.clear();
        text_insert.clear();
        *has_delete = false;
        *has_insert = false;
    };

    for diff in diffs.drain(..) {
        match diff.op {
            Operation::Delete => {
                has_delete = true;
                text_delete.push_str(&diff.text);
            }
            Operation::Insert => {
                has_insert = true;
                text_insert.push_str(&diff.text);
            }
            Operation::Equal => {
                flush(&mut out, &mut text_delete, &mut text_insert, &mut has_delete, &mut has_insert);
                out.push(diff);
            }
        }
    }
    flush(&mut out, &mut text_delete, &mut text_insert, &mut has_delete, &mut has_insert);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_repeated_lines() {
        let text1 = "line one\nline two\nline three\n";
        let text2 = "line one\nline two changed\nline three\n";
        let (chars1, chars2, lines) = diff_lines_to_chars(text1, text2);
        assert_eq!(chars1.len(), 3);
        assert_eq!(chars2.len(), 3);
        // "line one\n" and "line three\n" are shared, so only 4 distinct
        // lines (plus the sentinel) should be registered.
        assert_eq!(lines.len(), 5);
        assert_eq!(chars1[0], chars2[0]);
        assert_eq!(chars1[2], chars2[2]);
        assert_ne!(chars1[1], chars2[1]);
    }

    #[test]
    fn line_mode_matches_text_for_large_inputs() {
        let settings = Settings::default();
        let mut text1 = String::new();
        let mut text2 = String::new();
        for i in 0..200 {
            text1.push_str(&format!("line {i}\n"));
            if i == 100 {
                text2.push_str("INSERTED LINE\n");
            }
            text2.push_str(&format!("line {i}\n"));
        }
        let diffs = crate::diff::diff_main(&text1, &text2, true, &settings);
        assert_eq!(crate::diff::diff_text1(&diffs), text1);
        assert_eq!(crate::diff::diff_text2(&diffs), text2);
    }
}
