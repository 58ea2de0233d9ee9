#![no_main]

use diff_match_patch::diff::{diff_main, diff_text1, diff_text2};
use diff_match_patch::settings::Settings;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, String)| {
    let (text1, text2) = input;
    let settings = Settings::default();
    let diffs = diff_main(&text1, &text2, true, &settings);
    assert_eq!(diff_text1(&diffs), text1);
    assert_eq!(diff_text2(&diffs), text2);
});
