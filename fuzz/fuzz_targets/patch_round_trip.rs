#![no_main]

use diff_match_patch::patch::{patch_apply, patch_make};
use diff_match_patch::settings::Settings;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, String)| {
    let (text1, text2) = input;
    let settings = Settings::default();
    let patches = patch_make(&text1, &text2, &settings);
    // Applying a patch set to the exact text1 it was built from must always
    // succeed and reproduce text2, regardless of what text1/text2 are.
    let (result, applied) = patch_apply(&patches, &text1, &settings);
    assert!(applied.iter().all(|&ok| ok));
    assert_eq!(result, text2);
});
