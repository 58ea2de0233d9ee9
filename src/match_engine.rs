//! Fuzzy substring search (§4.2): finds the best approximate occurrence of a
//! short pattern inside a larger text, using the Bitap algorithm.
//!
//! Grounded in the same "one machine word per search step" idiom as the
//! teacher's bisect frontier arrays, but here the word is a bitmask of match
//! states rather than an edit-graph diagonal.

use ahash::AHashMap;

use crate::error::{DiffMatchPatchError, Result};
use crate::settings::{Settings, MATCH_MAX_BITS};
use crate::utf16;

/// Searches `text` for the best fuzzy match of `pattern`, expected near
/// `loc`. Returns the code-unit offset of the best match, or `None` if
/// nothing scores within `settings.match_threshold`.
///
/// Exact matches are tried first (and preferred when within
/// [`MATCH_MAX_BITS`] of `loc`); otherwise Bitap is used.
pub fn match_main(text: &str, pattern: &str, loc: usize, settings: &Settings) -> Result<Option<usize>> {
    let text_units = utf16::to_units(text);
    let pattern_units = utf16::to_units(pattern);
    let loc = loc.min(text_units.len());

    if text_units == pattern_units {
        return Ok(if text_units.is_empty() { None } else { Some(0) });
    }
    if pattern_units.is_empty() {
        return Ok(Some(loc));
    }

    if let Some(index) = find_subslice(&text_units, &pattern_units) {
        return Ok(Some(index));
    }

    // An exact match nearer to `loc` may still exist further in the text; the
    // reference checks this before falling back to Bitap.
    if let Some(index) = find_subslice_from(&text_units, &pattern_units, loc.saturating_sub(pattern_units.len())) {
        return Ok(Some(index));
    }

    match_bitap(&text_units, &pattern_units, loc, settings)
}

fn find_subslice(haystack: &[u16], needle: &[u16]) -> Option<usize> {
    find_subslice_from(haystack, needle, 0)
}

fn find_subslice_from(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let from = from.min(haystack.len() - needle.len());
    haystack[from..].windows(needle.len()).position(|w| w == needle).map(|p| p + from)
}

/// Builds the alphabet bitmask table used by Bitap: for each distinct code
/// unit in `pattern`, a mask with a `1` bit at every position that unit
/// occurs.
fn match_alphabet(pattern: &[u16]) -> AHashMap<u16, u32> {
    let mut map = AHashMap::with_capacity(pattern.len());
    for (i, &unit) in pattern.iter().enumerate() {
        let mask = map.entry(unit).or_insert(0u32);
        *mask |= 1 << (pattern.len() - i - 1);
    }
    map
}

/// Locates the best fuzzy match of `pattern` in `text` near `loc` using
/// Bitap, per §4.2.2. Returns an error if `pattern` is wider than
/// [`MATCH_MAX_BITS`].
pub fn match_bitap(text: &[u16], pattern: &[u16], loc: usize, settings: &Settings) -> Result<Option<usize>> {
    if pattern.len() > MATCH_MAX_BITS {
        return Err(DiffMatchPatchError::PatternTooLong { len: pattern.len(), max: MATCH_MAX_BITS });
    }

    let alphabet = match_alphabet(pattern);
    let mut score_threshold = settings.match_threshold as f64;

    // Tighten the initial threshold using any exact match found near `loc`,
    // so Bitap can bail out of hopeless rows early.
    if let Some(best_loc) = find_subslice(text, pattern) {
        score_threshold = score_threshold.min(match_bitap_score(0, best_loc, loc, pattern.len(), settings));
        if let Some(best_loc) = find_subslice_from(text, pattern, loc) {
            score_threshold = score_threshold.min(match_bitap_score(0, best_loc, loc, pattern.len(), settings));
        }
    }

    let match_mask_bit = 1u32 << (pattern.len() - 1);
    let mut best_loc: Option<usize> = None;
    let mut bin_max = pattern.len() + text.len();
    let mut last_rd: Vec<u32> = Vec::new();

    for d in 0..pattern.len() {
        let mut bin_min = 0usize;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            if match_bitap_score(d, loc + bin_mid, loc, pattern.len(), settings) <= score_threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        bin_max = bin_mid;

        let start = loc.saturating_sub(bin_mid).max(0);
        let finish = (loc + bin_mid).min(text.len()) + pattern.len();

        let mut rd = vec![0u32; finish + 2];
        rd[finish + 1] = (1 << d) - 1;

        let mut j = finish;
        while j >= start {
            let char_match = if j == 0 || j - 1 >= text.len() { 0 } else { *alphabet.get(&text[j - 1]).unwrap_or(&0) };
            if d == 0 {
                rd[j] = ((rd[j + 1] << 1) | 1) & char_match;
            } else {
                rd[j] = (((rd[j + 1] << 1) | 1) & char_match)
                    | (((last_rd[j + 1] | last_rd[j]) << 1) | 1)
                    | last_rd[j + 1];
            }
            if rd[j] & match_mask_bit != 0 {
                let score = match_bitap_score(d, j - 1, loc, pattern.len(), settings);
                if score <= score_threshold {
                    score_threshold = score;
                    best_loc = Some(j - 1);
                    if j - 1 <= loc {
                        break;
                    }
                }
            }
            if j == 0 {
                break;
            }
            j -= 1;
        }

        if match_bitap_score(d + 1, loc, loc, pattern.len(), settings) > score_threshold {
            break;
        }
        last_rd = rd;
    }

    Ok(best_loc)
}

/// Score (lower is better, `0.0` is a perfect match) combining edit distance
/// at depth `d` with a distance-from-`loc` penalty, per §4.2.2.
pub fn match_bitap_score(d: usize, x: usize, loc: usize, pattern_len: usize, settings: &Settings) -> f64 {
    let accuracy = d as f64 / pattern_len as f64;
    let proximity = x.abs_diff(loc);
    if settings.match_distance == 0 {
        return if proximity == 0 { accuracy } else { 1.0 };
    }
    accuracy + (proximity as f64 / settings.match_distance as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_found() {
        let settings = Settings::default();
        assert_eq!(match_main("abcdef", "cd", 0, &settings).unwrap(), Some(2));
    }

    #[test]
    fn fuzzy_match_tolerates_small_errors() {
        let settings = Settings::default();
        let result = match_main("I am the very model of a modern major general.", "the model", 1, &settings).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn pattern_too_long_errors() {
        let settings = Settings::default();
        let pattern: String = std::iter::repeat('a').take(MATCH_MAX_BITS + 1).collect();
        let err = match_bitap(&utf16::to_units("haystack"), &utf16::to_units(&pattern), 0, &settings).unwrap_err();
        assert!(matches!(err, DiffMatchPatchError::PatternTooLong { .. }));
    }

    #[test]
    fn no_match_beyond_threshold() {
        let settings = Settings { match_threshold: 0.1, match_distance: 10, ..Settings::default() };
        assert_eq!(match_main("abcdefghijklmnop", "xyz", 0, &settings).unwrap(), None);
    }
}
