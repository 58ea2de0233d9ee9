//! Myers' O(ND) bisection diff (§4.1.3).
//!
//! This is the classic bounded-space variant described in Myers' paper and
//! used directly by the reference port: two frontier arrays of length
//! `2*max_d + 2`, searched alternately from the front and the back of the
//! edit graph until their diagonals cross at a middle snake, which is then
//! used to split the problem into four quadrants and recurse. Unlike the
//! teacher's linear-space `myers` module (which trades a more intricate
//! divide-and-conquer array reuse scheme for lower peak memory), this port
//! keeps the simpler textbook shape: `SPEC_FULL.md` pins down the exact
//! frontier-array length and tie-breaking rules for interoperability with
//! other ports, which the simpler algorithm satisfies directly.

use crate::diff::{diff_main_units, Deadline, Diff, DiffList};
use crate::settings::Settings;
use crate::utf16;

/// Computes the edit script for `text1` -> `text2` by bisecting the edit
/// graph. Falls back to a trivial `[Delete, Insert]` diff if `deadline` is
/// exceeded before a middle snake is found.
pub(crate) fn diff_bisect(text1: &[u16], text2: &[u16], deadline: Deadline, settings: &Settings) -> DiffList {
    let len1 = text1.len() as i64;
    let len2 = text2.len() as i64;
    let max_d = (len1 + len2 + 1) / 2;
    let v_offset = max_d;
    let v_len = 2 * max_d;

    let mut v1 = vec![-1i64; v_len as usize];
    let mut v2 = vec![-1i64; v_len as usize];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = len1 - len2;
    // If the total edit length is odd, the forward search can itself detect
    // overlap with the reverse frontier; otherwise only the reverse search can.
    let front = delta % 2 != 0;

    let mut k1_start = 0i64;
    let mut k1_end = 0i64;
    let mut k2_start = 0i64;
    let mut k2_end = 0i64;

    for d in 0..max_d {
        if deadline.exceeded() {
            break;
        }

        // Forward search along k-diagonals.
        let mut k1 = -d + k1_start;
        while k1 <= d - k1_end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < len1 && y1 < len2 && text1[x1 as usize] == text2[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;

            if x1 > len1 {
                k1_end += 2;
            } else if y1 > len2 {
                k1_start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if (0..v_len).contains(&k2_offset) && v2[k2_offset as usize] != -1 {
                    let x2 = len1 - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return bisect_split(text1, text2, x1, y1, deadline, settings);
                    }
                }
            }
            k1 += 2;
        }

        // Reverse search along k-diagonals.
        let mut k2 = -d + k2_start;
        while k2 <= d - k2_end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < len1 && y2 < len2 && text1[(len1 - x2 - 1) as usize] == text2[(len2 - y2 - 1) as usize] {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;

            if x2 > len1 {
                k2_end += 2;
            } else if y2 > len2 {
                k2_start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if (0..v_len).contains(&k1_offset) && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = x1 - k1_offset + v_offset;
                    let x2_mirror = len1 - x2;
                    if x1 >= x2_mirror {
                        return bisect_split(text1, text2, x1, y1, deadline, settings);
                    }
                }
            }
            k2 += 2;
        }
    }

    // No middle snake found within the allotted depth (deadline hit): give
    // up and report the whole region as a wholesale replacement.
    vec![Diff::delete(utf16::from_units(text1)), Diff::insert(utf16::from_units(text2))]
}

/// Splits the problem at the middle snake `(x, y)` and recursively diffs the
/// four surrounding quadrants, concatenating the results in order.
fn bisect_split(text1: &[u16], text2: &[u16], x: i64, y: i64, deadline: Deadline, settings: &Settings) -> DiffList {
    let (x, y) = (x as usize, y as usize);
    let (text1_a, text1_b) = text1.split_at(x);
    let (text2_a, text2_b) = text2.split_at(y);

    let mut diffs = diff_main_units(text1_a, text2_a, false, deadline, settings);
    diffs.extend(diff_main_units(text1_b, text2_b, false, deadline, settings));
    diffs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bisect_reconstructs_both_inputs() {
        let settings = Settings::default();
        let a = utf16::to_units("ABCABBA");
        let b = utf16::to_units("CBABAC");
        let diffs = diff_bisect(&a, &b, Deadline::none(), &settings);
        let text1: String =
            diffs.iter().filter(|d| d.op != crate::diff::Operation::Insert).map(|d| d.text.as_str()).collect();
        let text2: String =
            diffs.iter().filter(|d| d.op != crate::diff::Operation::Delete).map(|d| d.text.as_str()).collect();
        assert_eq!(text1, "ABCABBA");
        assert_eq!(text2, "CBABAC");
    }

    #[test]
    fn deadline_exceeded_yields_trivial_diff() {
        let settings = Settings::default();
        let a = utf16::to_units("abcdef");
        let b = utf16::to_units("ghijkl");
        let past = Deadline::from_timeout(Some(std::time::Duration::from_secs(0)));
        std::thread::sleep(std::time::Duration::from_millis(1));
        let diffs = diff_bisect(&a, &b, past, &settings);
        assert_eq!(diffs, vec![Diff::delete("abcdef"), Diff::insert("ghijkl")]);
    }
}
