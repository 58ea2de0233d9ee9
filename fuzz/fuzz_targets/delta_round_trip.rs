#![no_main]

use diff_match_patch::diff::{diff_from_delta, diff_main, diff_text2, diff_to_delta};
use diff_match_patch::settings::Settings;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, String)| {
    let (text1, text2) = input;
    let settings = Settings::default();
    let diffs = diff_main(&text1, &text2, true, &settings);
    let delta = diff_to_delta(&diffs);
    let restored = diff_from_delta(&text1, &delta).expect("delta produced by diff_to_delta must parse");
    assert_eq!(diff_text2(&restored), text2);
});
