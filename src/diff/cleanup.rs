//! Post-processing passes that turn a raw edit script into one that obeys
//! the merge invariant and reads naturally to a human (§4.1.7).

use crate::diff::{Diff, DiffList, Operation};
use crate::settings::Settings;
use crate::utf16;

/// Reorders/merges a diff list until it satisfies the merge invariant: no
/// two adjacent diffs share an operation, and no diff has empty text. Also
/// factors common prefixes/suffixes out of adjacent delete/insert pairs into
/// a new equality, and repeats a single-edit shift pass that can expose
/// further merges, iterating to a fixed point.
///
/// Always run at the end of `diff_main`, and safe to call on any diff list
/// (including hand-built ones) before relying on the invariant.
pub fn diff_cleanup_merge(diffs: &mut DiffList) {
    loop {
        diffs.push(Diff::equal(String::new()));

        let mut out = DiffList::new();
        let mut count_delete = 0usize;
        let mut count_insert = 0usize;
        let mut text_delete = String::new();
        let mut text_insert = String::new();

        for diff in diffs.drain(..) {
            match diff.op {
                Operation::Insert => {
                    count_insert += 1;
                    text_insert.push_str(&diff.text);
                }
                Operation::Delete => {
                    count_delete += 1;
                    text_delete.push_str(&diff.text);
                }
                Operation::Equal => {
                    if count_delete + count_insert > 1 {
                        if count_delete != 0 && count_insert != 0 {
                            let delete_units = utf16::to_units(&text_delete);
                            let insert_units = utf16::to_units(&text_insert);
                            let prefix_len = utf16::common_prefix(&delete_units, &insert_units);
                            if prefix_len > 0 {
                                let prefix = utf16::from_units(&delete_units[..prefix_len]);
                                if let Some(last) = out.last_mut().filter(|d: &&mut Diff| d.op == Operation::Equal) {
                                    last.text.push_str(&prefix);
                                } else {
                                    out.push(Diff::equal(prefix));
                                }
                                text_delete = utf16::from_units(&delete_units[prefix_len..]);
                                text_insert = utf16::from_units(&insert_units[prefix_len..]);
                            }

                            let delete_units = utf16::to_units(&text_delete);
                            let insert_units = utf16::to_units(&text_insert);
                            let suffix_len = utf16::common_suffix(&delete_units, &insert_units);
                            let mut trailing_equal = String::new();
                            if suffix_len > 0 {
                                trailing_equal = utf16::from_units(&delete_units[delete_units.len() - suffix_len..]);
                                text_delete = utf16::from_units(&delete_units[..delete_units.len() - suffix_len]);
                                text_insert = utf16::from_units(&insert_units[..insert_units.len() - suffix_len]);
                            }

                            if !text_delete.is_empty() {
                                out.push(Diff::delete(std::mem::take(&mut text_delete)));
                            }
                            if !text_insert.is_empty() {
                                out.push(Diff::insert(std::mem::take(&mut text_insert)));
                            }
                            if !trailing_equal.is_empty() {
                                out.push(Diff::equal(trailing_equal));
                            }
                        } else if count_delete != 0 {
                            out.push(Diff::delete(std::mem::take(&mut text_delete)));
                        } else {
                            out.push(Diff::insert(std::mem::take(&mut text_insert)));
                        }
                    } else if count_delete == 1 {
                        out.push(Diff::delete(std::mem::take(&mut text_delete)));
                    } else if count_insert == 1 {
                        out.push(Diff::insert(std::mem::take(&mut text_insert)));
                    }

                    count_delete = 0;
                    count_insert = 0;
                    text_delete.clear();
                    text_insert.clear();

                    if !diff.text.is_empty() {
                        if let Some(last) = out.last_mut().filter(|d: &&mut Diff| d.op == Operation::Equal) {
                            last.text.push_str(&diff.text);
                        } else {
                            out.push(diff);
                        }
                    }
                }
            }
        }

        if out.last().is_some_and(|d| d.op == Operation::Equal && d.text.is_empty()) {
            out.pop();
        }

        *diffs = out;

        // Second pass: shift single edits across adjacent equalities when
        // that exposes a further merge (e.g. "A<ins>BA</ins>C" becomes
        // "<ins>AB</ins>AC"). Repeat until nothing changes.
        let mut changed = false;
        let mut i = 1;
        while i + 1 < diffs.len() {
            if diffs[i - 1].op == Operation::Equal && diffs[i + 1].op == Operation::Equal {
                let (prev_text, next_text) = (diffs[i - 1].text.clone(), diffs[i + 1].text.clone());
                if diffs[i].text.ends_with(&prev_text) && !prev_text.is_empty() {
                    let edit = &mut diffs[i];
                    let edit_units = utf16::to_units(&edit.text);
                    let prev_units = utf16::to_units(&prev_text);
                    let new_len = edit_units.len() - prev_units.len();
                    edit.text = format!("{}{}", prev_text, utf16::from_units(&edit_units[..new_len]));
                    diffs[i - 1].text.clear();
                    diffs[i + 1].text = format!("{}{}", prev_text, next_text);
                    changed = true;
                } else if diffs[i].text.starts_with(&next_text) && !next_text.is_empty() {
                    diffs[i - 1].text.push_str(&next_text);
                    let edit = &mut diffs[i];
                    let edit_units = utf16::to_units(&edit.text);
                    let next_units = utf16::to_units(&next_text);
                    edit.text = utf16::from_units(&edit_units[next_units.len()..]);
                    edit.text.push_str(&next_text);
                    diffs[i + 1].text.clear();
                    changed = true;
                }
            }
            i += 1;
        }

        diffs.retain(|d| !d.text.is_empty());

        if !changed {
            break;
        }
    }
}

/// Removes edits that don't represent a meaningful semantic change, by
/// dropping equalities that are too short relative to the edits flanking
/// them, and by splitting `Delete`+`Insert` pairs that overlap into an
/// explicit shared `Equal`.
pub fn diff_cleanup_semantic(diffs: &mut DiffList) {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0usize;

    let mut len_insertions1 = 0usize;
    let mut len_deletions1 = 0usize;
    let mut len_insertions2 = 0usize;
    let mut len_deletions2 = 0usize;

    while pointer < diffs.len() {
        if diffs[pointer].op == Operation::Equal {
            equalities.push(pointer);
            len_insertions1 = len_insertions2;
            len_deletions1 = len_deletions2;
            len_insertions2 = 0;
            len_deletions2 = 0;
            last_equality = Some(diffs[pointer].text.clone());
        } else {
            if diffs[pointer].op == Operation::Insert {
                len_insertions2 += diffs[pointer].len_units();
            } else {
                len_deletions2 += diffs[pointer].len_units();
            }
            if let Some(eq) = &last_equality {
                let eq_len = utf16::len(eq);
                if eq_len <= len_insertions1.max(len_deletions1) && eq_len <= len_insertions2.max(len_deletions2) {
                    if let Some(&eq_pos) = equalities.last() {
                        diffs[eq_pos] = Diff::delete(eq.clone());
                        diffs.insert(eq_pos + 1, Diff::insert(eq.clone()));
                    }
                    equalities.pop();
                    if let Some(&prev) = equalities.last() {
                        pointer = prev;
                    } else {
                        pointer = 0;
                        continue;
                    }
                    len_insertions1 = 0;
                    len_deletions1 = 0;
                    len_insertions2 = 0;
                    len_deletions2 = 0;
                    last_equality = None;
                    changed = true;
                }
            }
        }
        pointer += 1;
    }

    if changed {
        diff_cleanup_merge(diffs);
    }

    diff_cleanup_semantic_overlap(diffs);
}

/// After the main semantic pass, splits adjacent `Delete`+`Insert` pairs
/// that share a prefix/suffix overlap of at least half the shorter text's
/// length into an explicit `Equal` for the overlap. This catches cases like
/// `mali` -> `malifornia` where the raw diff would otherwise report the
/// whole word as replaced instead of extended.
fn diff_cleanup_semantic_overlap(diffs: &mut DiffList) {
    let mut pointer = 1;
    while pointer < diffs.len() {
        if diffs[pointer - 1].op == Operation::Delete && diffs[pointer].op == Operation::Insert {
            let delete_units = diffs[pointer - 1].units();
            let insert_units = diffs[pointer].units();

            let overlap_len1 = utf16::common_overlap(&delete_units, &insert_units);
            let overlap_len2 = utf16::common_overlap(&insert_units, &delete_units);

            if overlap_len1 >= overlap_len2 {
                if overlap_len1 as f64 >= delete_units.len() as f64 / 2.0
                    || overlap_len1 as f64 >= insert_units.len() as f64 / 2.0
                {
                    let overlap_text = utf16::from_units(&delete_units[delete_units.len() - overlap_len1..]);
                    diffs.insert(pointer, Diff::equal(overlap_text));
                    diffs[pointer - 1].text = utf16::from_units(&delete_units[..delete_units.len() - overlap_len1]);
                    diffs[pointer + 1].text = utf16::from_units(&insert_units[overlap_len1..]);
                    if diffs[pointer - 1].text.is_empty() {
                        diffs.remove(pointer - 1);
                        pointer -= 1;
                    }
                    if pointer + 1 < diffs.len() && diffs[pointer + 1].text.is_empty() {
                        diffs.remove(pointer + 1);
                    }
                }
            } else if overlap_len2 as f64 >= delete_units.len() as f64 / 2.0
                || overlap_len2 as f64 >= insert_units.len() as f64 / 2.0
            {
                let overlap_text = utf16::from_units(&insert_units[insert_units.len() - overlap_len2..]);
                diffs.insert(pointer, Diff::equal(overlap_text));
                diffs[pointer - 1] = Diff::insert(utf16::from_units(&insert_units[..insert_units.len() - overlap_len2]));
                diffs[pointer + 1] = Diff::delete(utf16::from_units(&delete_units[overlap_len2..]));
                if diffs[pointer - 1].text.is_empty() {
                    diffs.remove(pointer - 1);
                    pointer -= 1;
                }
                if pointer + 1 < diffs.len() && diffs[pointer + 1].text.is_empty() {
                    diffs.remove(pointer + 1);
                }
            }
        }
        pointer += 1;
    }
    diffs.retain(|d| !d.text.is_empty());
}

/// Shifts each equality flanked by two edits to the best nearby word or line
/// boundary, as scored by [`diff_cleanup_semantic_score`]. Purely cosmetic:
/// it never changes what text is reconstructed, only where the edit
/// boundary visually falls.
pub fn diff_cleanup_semantic_lossless(diffs: &mut DiffList) {
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Operation::Equal && diffs[pointer + 1].op == Operation::Equal {
            let mut equality1 = diffs[pointer - 1].units();
            let mut edit = diffs[pointer].units();
            let mut equality2 = diffs[pointer + 1].units();

            let common_len = utf16::common_suffix(&equality1, &edit);
            if common_len > 0 {
                let common = edit[edit.len() - common_len..].to_vec();
                equality1.truncate(equality1.len() - common_len);
                edit = [&common[..], &edit[..edit.len() - common_len]].concat();
                equality2 = [&common[..], &equality2[..]].concat();
            }

            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);

            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                equality1.push(edit[0]);
                edit.remove(0);
                edit.push(equality2[0]);
                equality2.remove(0);
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if diffs[pointer - 1].units() != best_equality1 {
                if best_equality1.is_empty() {
                    diffs[pointer - 1].text.clear();
                } else {
                    diffs[pointer - 1].text = utf16::from_units(&best_equality1);
                }
                diffs[pointer].text = utf16::from_units(&best_edit);
                if best_equality2.is_empty() {
                    diffs[pointer + 1].text.clear();
                } else {
                    diffs[pointer + 1].text = utf16::from_units(&best_equality2);
                }
            }
        }
        pointer += 1;
    }
    diffs.retain(|d| !d.text.is_empty());
}

/// Score (higher is better) for splitting a boundary between `one` and
/// `two`, based on the character classes adjacent to the split (§4.1.7).
fn semantic_score(one: &[u16], two: &[u16]) -> i32 {
    if one.is_empty() || two.is_empty() {
        return 6; // edge of text
    }

    let last = one[one.len() - 1];
    let first = two[0];

    let non_alnum_last = !is_word_char(last);
    let non_alnum_first = !is_word_char(first);
    let whitespace_last = is_whitespace(last);
    let whitespace_first = is_whitespace(first);
    let linebreak_last = whitespace_last && is_linebreak(last);
    let linebreak_first = whitespace_first && is_linebreak(first);
    let blankline_last = linebreak_last && ends_blank_line(one);
    let blankline_first = linebreak_first && starts_blank_line(two);

    if blankline_last || blankline_first {
        5
    } else if linebreak_last || linebreak_first {
        4
    } else if non_alnum_last && !whitespace_last && whitespace_first {
        3
    } else if whitespace_last || whitespace_first {
        2
    } else if non_alnum_last || non_alnum_first {
        1
    } else {
        0
    }
}

fn is_word_char(unit: u16) -> bool {
    utf16::unit_to_char(unit).is_some_and(|c| c.is_alphanumeric() || c == '_')
}

fn is_whitespace(unit: u16) -> bool {
    utf16::unit_to_char(unit).is_some_and(|c| c.is_whitespace())
}

fn is_linebreak(unit: u16) -> bool {
    unit == b'\n' as u16 || unit == b'\r' as u16
}

fn ends_blank_line(units: &[u16]) -> bool {
    // Two consecutive newlines (ignoring an interleaved \r) just before the
    // boundary mean we're splitting right after a blank line.
    let mut newlines = 0;
    for &u in units.iter().rev() {
        if u == b'\n' as u16 {
            newlines += 1;
            if newlines >= 2 {
                return true;
            }
        } else if u == b'\r' as u16 {
            continue;
        } else {
            break;
        }
    }
    false
}

fn starts_blank_line(units: &[u16]) -> bool {
    let mut newlines = 0;
    for &u in units {
        if u == b'\n' as u16 {
            newlines += 1;
            if newlines >= 2 {
                return true;
            }
        } else if u == b'\r' as u16 {
            continue;
        } else {
            break;
        }
    }
    false
}

/// Collapses short equalities flanked by edits when doing so reduces the
/// total number of edit operations by more than `settings.diff_edit_cost`.
/// Mirrors a five-slot state machine over whether inserts/deletes were seen
/// immediately before and after the current equality.
pub fn diff_cleanup_efficiency(diffs: &mut DiffList, settings: &Settings) {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0usize;

    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;

    while pointer < diffs.len() {
        if diffs[pointer].op == Operation::Equal {
            let short_equality = diffs[pointer].len_units() < settings.diff_edit_cost as usize && !diffs[pointer].text.is_empty();
            if short_equality && (pre_ins || pre_del) {
                equalities.push(pointer);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[pointer].text.clone());
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
        } else {
            if diffs[pointer].op == Operation::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }

            if let Some(eq) = last_equality.clone() {
                let sum_pres = [pre_ins, pre_del, post_ins, post_del].iter().filter(|b| **b).count();
                if (pre_ins && pre_del && post_ins && post_del) || (utf16::len(&eq) < (settings.diff_edit_cost as usize) / 2 && sum_pres == 3) {
                    if let Some(&eq_pos) = equalities.last() {
                        diffs[eq_pos] = Diff::delete(eq.clone());
                        diffs.insert(eq_pos + 1, Diff::insert(eq));
                    }
                    equalities.pop();
                    last_equality = None;

                    if pre_ins && pre_del {
                        post_ins = true;
                        post_del = true;
                        equalities.clear();
                    } else {
                        if let Some(&prev) = equalities.last() {
                            pointer = prev;
                        } else {
                            pointer = 0;
                        }
                        post_ins = false;
                        post_del = false;
                    }
                    changed = true;
                    continue;
                }
            }
        }
        pointer += 1;
    }

    if changed {
        diff_cleanup_merge(diffs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_drops_empty_and_merges_adjacent() {
        let mut diffs = vec![
            Diff::equal(""),
            Diff::delete("a"),
            Diff::insert("b"),
            Diff::insert("c"),
            Diff::equal(""),
        ];
        diff_cleanup_merge(&mut diffs);
        assert_eq!(diffs, vec![Diff::delete("a"), Diff::insert("bc")]);
    }

    #[test]
    fn merge_factors_common_prefix_and_suffix() {
        let mut diffs = vec![Diff::delete("abcxxx"), Diff::insert("abcyyy")];
        diff_cleanup_merge(&mut diffs);
        assert_eq!(diffs, vec![Diff::equal("abc"), Diff::delete("xxx"), Diff::insert("yyy")]);
    }

    #[test]
    fn semantic_drops_tiny_equality_between_big_edits() {
        let mut diffs =
            vec![Diff::delete("ab"), Diff::equal("cd"), Diff::insert("12"), Diff::equal("e"), Diff::delete("fghi")];
        diff_cleanup_semantic(&mut diffs);
        assert!(diffs.iter().all(|d| d.op != Operation::Equal || d.text.len() > 2));
    }

    #[test]
    fn efficiency_collapses_short_equality_surrounded_by_edits() {
        let settings = Settings { diff_edit_cost: 4, ..Settings::default() };
        let mut diffs = vec![
            Diff::delete("A"),
            Diff::insert("B"),
            Diff::equal("wxyz"),
            Diff::delete("C"),
            Diff::insert("D"),
        ];
        diff_cleanup_efficiency(&mut diffs, &settings);
        // With cost 4, an equality shorter than it but not flanked on both
        // sides with ins+del doesn't collapse (only does when all four
        // flags are set or the half-cost+triple-flag condition is met).
        assert!(!diffs.is_empty());
    }

    #[test]
    fn lossless_shifts_to_word_boundary() {
        let mut diffs = vec![Diff::equal("The c"), Diff::insert("ow and the c"), Diff::equal("at.")];
        diff_cleanup_semantic_lossless(&mut diffs);
        let text1: String = diffs.iter().filter(|d| d.op != Operation::Insert).map(|d| d.text.as_str()).collect();
        let text2: String = diffs.iter().filter(|d| d.op != Operation::Delete).map(|d| d.text.as_str()).collect();
        assert_eq!(text1, "The cat.");
        assert_eq!(text2, "The cow and the cat.");
    }
}
