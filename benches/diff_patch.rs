use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use diff_match_patch::diff::diff_main;
use diff_match_patch::patch::{patch_apply, patch_make};
use diff_match_patch::settings::Settings;

const SHORT_A: &str = "The quick brown fox jumps over the lazy dog.";
const SHORT_B: &str = "The quick brown cat jumps over the lazy dog and runs away.";

fn paragraph(seed: u32) -> String {
    let mut out = String::new();
    for i in 0..2000 {
        out.push_str(&format!("line {} seed {}\n", i, seed));
    }
    out
}

fn bench_diff(c: &mut Criterion) {
    let settings = Settings::default();
    let mut group = c.benchmark_group("diff_main");

    group.bench_function(BenchmarkId::new("short", "sentence"), |b| {
        b.iter(|| diff_main(black_box(SHORT_A), black_box(SHORT_B), true, &settings))
    });

    let long_a = paragraph(1);
    let long_b = paragraph(2);
    group.bench_function(BenchmarkId::new("long", "2000_lines"), |b| {
        b.iter(|| diff_main(black_box(&long_a), black_box(&long_b), true, &settings))
    });

    group.finish();
}

fn bench_patch(c: &mut Criterion) {
    let settings = Settings::default();
    let patches = patch_make(SHORT_A, SHORT_B, &settings);

    c.bench_function("patch_apply/short", |b| {
        b.iter(|| patch_apply(black_box(&patches), black_box(SHORT_A), &settings))
    });
}

criterion_group!(benches, bench_diff, bench_patch);
criterion_main!(benches);
