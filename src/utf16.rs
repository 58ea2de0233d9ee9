//! Helpers for treating `&str`/`String` as sequences of 16-bit code units.
//!
//! The reference algorithm indexes text in UTF-16 code units (surrogate pairs
//! count as two positions) because that is the native string representation of
//! the ports it needs to interoperate with. Rust strings are UTF-8, so every
//! offset or length computed by this crate goes through [`to_units`]/[`from_units`]
//! rather than operating on `char`s or bytes directly.

/// Converts a string into its UTF-16 code units.
pub fn to_units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Converts UTF-16 code units back into a `String`.
///
/// Uses the lossy conversion (replacing unpaired surrogates with U+FFFD)
/// rather than the panicking one: bisection and line-mode splits are free to
/// land inside a surrogate pair on pathological input, and this crate favors
/// a total function over a panic (see `SPEC_FULL.md` design notes).
pub fn from_units(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Length of `s` in UTF-16 code units.
pub fn len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Largest `n` such that the first `n` code units of `a` and `b` are equal.
pub fn common_prefix(a: &[u16], b: &[u16]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Largest `n` such that the last `n` code units of `a` and `b` are equal.
pub fn common_suffix(a: &[u16], b: &[u16]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
///
/// Used by semantic cleanup to detect accidental overlap introduced at a diff
/// boundary (e.g. `a` ends with `"mali"` and `b` starts with `"malifornia"`).
pub fn common_overlap(a: &[u16], b: &[u16]) -> usize {
    let (a_len, b_len) = (a.len(), b.len());
    if a_len == 0 || b_len == 0 {
        return 0;
    }
    let (a, b) = if a_len > b_len { (&a[a_len - b_len..], b) } else { (a, &b[b_len - a_len..]) };
    let min_len = a.len().min(b.len());
    if a == b {
        return min_len;
    }

    // Worst case is O(min_len^2) but in practice the overlap search is bounded
    // by real text, never by adversarial inputs the reference wasn't built for.
    let mut best = 0;
    let mut length = 1;
    while length <= min_len {
        let pattern = &a[a.len() - length..];
        if let Some(found) = find_subslice(b, pattern) {
            if found == 0 {
                best = length;
                length += 1;
                continue;
            }
        }
        length += best + 1;
    }
    best
}

fn find_subslice(haystack: &[u16], needle: &[u16]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Decodes a single code unit to a `char` for classification purposes.
///
/// Lone surrogates (which cannot form a `char` on their own) classify as
/// "other" non-alphanumeric, matching how the reference treats unpaired
/// surrogates: neither whitespace nor a word character.
pub fn unit_to_char(unit: u16) -> Option<char> {
    char::from_u32(unit as u32)
}
