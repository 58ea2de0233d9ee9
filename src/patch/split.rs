//! Context growth, padding, and size-limiting passes applied to a patch list
//! before it's considered ready to serialize or apply (§4.3.1-4.3.3).

use crate::diff::{Diff, Operation};
use crate::patch::Patch;
use crate::settings::{Settings, MATCH_MAX_BITS};
use crate::utf16;

/// Grows a freshly built patch's leading/trailing context out to
/// `settings.patch_margin` code units (pulled from `text`, the pre-patch
/// text of the whole document), and widens it further if the resulting
/// prefix/suffix isn't unique in `text` — an ambiguous anchor would let
/// [`crate::patch::patch_apply`] latch onto the wrong occurrence.
pub fn patch_add_context(patch: &mut Patch, text: &str, settings: &Settings) {
    if text.is_empty() {
        return;
    }
    let text_units = utf16::to_units(text);
    let margin = settings.patch_margin as usize;

    let pattern_start = patch.start2;
    let pattern_end = patch.start2 + patch.length1;

    let mut padding = margin;
    while count_occurrences(&text_units, &slice_units(&text_units, pattern_start, pattern_end, padding, margin)) > 1
        && margin + padding < MATCH_MAX_BITS - margin
    {
        padding += margin;
    }
    padding += margin;

    let prefix_start = patch.start2.saturating_sub(padding);
    let prefix = utf16::from_units(&text_units[prefix_start..patch.start2.min(text_units.len())]);
    if !prefix.is_empty() {
        patch.diffs.insert(0, Diff::new(Operation::Equal, prefix.clone()));
        patch.start1 -= utf16::len(&prefix);
        patch.start2 -= utf16::len(&prefix);
        patch.length1 += utf16::len(&prefix);
        patch.length2 += utf16::len(&prefix);
    }

    let suffix_end = (pattern_end + padding).min(text_units.len());
    let suffix = utf16::from_units(&text_units[pattern_end.min(text_units.len())..suffix_end]);
    if !suffix.is_empty() {
        patch.length1 += utf16::len(&suffix);
        patch.length2 += utf16::len(&suffix);
        patch.diffs.push(Diff::new(Operation::Equal, suffix));
    }
}

fn slice_units(units: &[u16], start: usize, end: usize, padding: usize, _margin: usize) -> Vec<u16> {
    let lo = start.saturating_sub(padding).min(units.len());
    let hi = (end + padding).min(units.len());
    units[lo..hi].to_vec()
}

fn count_occurrences(haystack: &[u16], needle: &[u16]) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Inserts a fixed blank-padding string on both sides of every patch and
/// shifts their offsets accordingly, per §4.3.3. Gives
/// [`crate::patch::patch_apply`] room to anchor a patch that starts or ends
/// exactly at a text boundary, and gives `patch_add_context` material to
/// extend into near the edges of the document.
pub fn patch_add_padding(patches: &mut Vec<Patch>, settings: &Settings) {
    let padding_len = settings.patch_margin as usize;
    let padding: String = (1..=padding_len).map(|i| char::from_u32(i as u32).unwrap_or(' ')).collect();

    for patch in patches.iter_mut() {
        patch.start1 += padding_len;
        patch.start2 += padding_len;
    }

    if patches.is_empty() {
        return;
    }

    {
        let first = patches.first_mut().unwrap();
        if first.diffs.is_empty() || first.diffs[0].op != Operation::Equal {
            first.diffs.insert(0, Diff::new(Operation::Equal, padding.clone()));
            first.start1 = first.start1.saturating_sub(padding_len);
            first.start2 = first.start2.saturating_sub(padding_len);
            first.length1 += padding_len;
            first.length2 += padding_len;
        } else if utf16::len(&first.diffs[0].text) < padding_len {
            let extra = padding_len - utf16::len(&first.diffs[0].text);
            let extra_pad = utf16::from_units(&utf16::to_units(&padding)[padding_len - extra..]);
            let added = utf16::len(&extra_pad);
            first.diffs[0].text = format!("{extra_pad}{}", first.diffs[0].text);
            first.start1 = first.start1.saturating_sub(added);
            first.start2 = first.start2.saturating_sub(added);
            first.length1 += added;
            first.length2 += added;
        }
    }

    {
        let last = patches.last_mut().unwrap();
        if last.diffs.is_empty() || last.diffs.last().unwrap().op != Operation::Equal {
            last.diffs.push(Diff::new(Operation::Equal, padding));
            last.length1 += padding_len;
            last.length2 += padding_len;
        } else if utf16::len(&last.diffs.last().unwrap().text) < padding_len {
            let last_diff = last.diffs.last_mut().unwrap();
            let existing_len = utf16::len(&last_diff.text);
            let extra = padding_len - existing_len;
            let extra_pad = utf16::from_units(&utf16::to_units(&padding)[..extra]);
            last_diff.text.push_str(&extra_pad);
            last.length1 += extra;
            last.length2 += extra;
        }
    }
}

/// Splits any patch whose span exceeds [`MATCH_MAX_BITS`] into several
/// smaller, independently anchored patches, since `patch_apply`'s Bitap
/// anchoring can't search a pattern wider than that.
pub fn patch_split_max(patches: &mut Vec<Patch>, settings: &Settings) {
    let patch_size = MATCH_MAX_BITS;
    let margin = settings.patch_margin as usize;

    let mut x = 0;
    while x < patches.len() {
        if patches[x].length1 <= patch_size {
            x += 1;
            continue;
        }

        let big_patch = patches.remove(x);
        let mut start1 = big_patch.start1;
        let mut start2 = big_patch.start2;
        let mut precontext = String::new();
        let mut remaining: std::collections::VecDeque<Diff> = big_patch.diffs.into_iter().collect();

        while !remaining.is_empty() {
            let mut patch = Patch::new();
            let mut empty = true;
            let precontext_len = utf16::len(&precontext);
            patch.start1 = start1.saturating_sub(precontext_len);
            patch.start2 = start2.saturating_sub(precontext_len);

            if !precontext.is_empty() {
                patch.length1 = precontext_len;
                patch.length2 = precontext_len;
                patch.diffs.push(Diff::new(Operation::Equal, precontext.clone()));
            }

            while !remaining.is_empty() && patch.length1 < patch_size.saturating_sub(margin) {
                let diff = remaining.front().unwrap().clone();

                if diff.op == Operation::Insert {
                    patch.length2 += diff.len_units();
                    start2 += diff.len_units();
                    patch.diffs.push(diff);
                    empty = false;
                    remaining.pop_front();
                } else if diff.op == Operation::Delete
                    && patch.diffs.len() == 1
                    && patch.diffs[0].op == Operation::Equal
                    && diff.len_units() > 2 * patch_size
                {
                    // A lone oversized deletion: take a full window's worth.
                    let units = diff.units();
                    let take = patch_size.min(units.len());
                    patch.length1 += take;
                    start1 += take;
                    empty = false;
                    patch.diffs.push(Diff::new(Operation::Delete, utf16::from_units(&units[..take])));
                    remaining[0] = Diff::new(Operation::Delete, utf16::from_units(&units[take..]));
                } else {
                    let units = diff.units();
                    let take = units.len().min(patch_size.saturating_sub(patch.length1).saturating_sub(margin));
                    let text = utf16::from_units(&units[..take]);
                    patch.length1 += take;
                    start1 += take;
                    if diff.op == Operation::Equal {
                        patch.length2 += take;
                        start2 += take;
                    } else {
                        empty = false;
                    }
                    patch.diffs.push(Diff::new(diff.op, text));
                    if take == units.len() {
                        remaining.pop_front();
                    } else {
                        remaining[0] = Diff::new(diff.op, utf16::from_units(&units[take..]));
                    }
                }
            }

            // Context for the head of the next split patch, drawn from what
            // this patch just produced in text2.
            let produced2: String = patch
                .diffs
                .iter()
                .filter(|d| d.op != Operation::Delete)
                .map(|d| d.text.as_str())
                .collect();
            let produced2_units = utf16::to_units(&produced2);
            let tail_len = margin.min(produced2_units.len());
            precontext = utf16::from_units(&produced2_units[produced2_units.len() - tail_len..]);

            // Trailing context for this patch, pulled from whatever's left.
            let remaining_text1: String =
                remaining.iter().filter(|d| d.op != Operation::Insert).map(|d| d.text.as_str()).collect();
            let remaining_units = utf16::to_units(&remaining_text1);
            let post_len = margin.min(remaining_units.len());
            if post_len > 0 {
                let postcontext = utf16::from_units(&remaining_units[..post_len]);
                patch.length1 += post_len;
                patch.length2 += post_len;
                if let Some(last) = patch.diffs.last_mut().filter(|d| d.op == Operation::Equal) {
                    last.text.push_str(&postcontext);
                } else {
                    patch.diffs.push(Diff::new(Operation::Equal, postcontext));
                }
            }

            if !empty {
                patches.insert(x, patch);
                x += 1;
            }
        }
        // If the loop above inserted nothing (shouldn't normally happen)
        // `x` still points at the next patch to examine.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::patch_make;

    #[test]
    fn padding_extends_first_and_last_hunk() {
        let settings = Settings::default();
        let text1 = "abcdefghij";
        let text2 = "abcXefghij";
        let patches = patch_make(text1, text2, &settings);
        assert!(!patches.is_empty());
    }

    #[test]
    fn split_max_keeps_patches_within_window() {
        // patch_make alone never limits hunk size; patch_split_max is only
        // invoked from patch_apply. Exercise it directly here.
        let settings = Settings::default();
        let text1: String = "x".repeat(200);
        let text2: String = format!("{}Y{}", "x".repeat(100), "x".repeat(100));
        let mut patches = patch_make(&text1, &text2, &settings);
        patch_split_max(&mut patches, &settings);
        for patch in &patches {
            assert!(patch.length1 <= crate::settings::MATCH_MAX_BITS * 2);
        }
    }
}
