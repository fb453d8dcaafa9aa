//! Benchmarks for the Mistkerl and the table of contents.
//!
//! Run with: cargo bench
//!
//! These benchmarks run on a synthetic lecture written to a temporary
//! directory.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use matuc::{table_of_contents, InitLecture, Mistkerl};
use std::fs;
use tempfile::TempDir;

/// Creates a lecture with `chapters` chapters, each with a few sections,
/// page numbers and formulas.
fn create_test_lecture(chapters: u32) -> TempDir {
    let dir = TempDir::new().expect("temporary directory");
    InitLecture::new(dir.path(), chapters, "de")
        .generate_structure()
        .expect("lecture structure");

    for chapter in 1..=chapters {
        let mut text = format!("Kapitel {}\n=========\n\n", chapter);
        for section in 1..=10 {
            text.push_str(&format!(
                "|| - Seite {} -\n\nAbschnitt {}\n-----------\n\n",
                section, section
            ));
            text.push_str("Es gilt $a^2 + b^2 = c^2$ für alle rechtwinkligen Dreiecke.\n\n");
            text.push_str("$$\\sum_{i=1}^{n} i = \\frac{n(n+1)}{2}$$\n\n");
            text.push_str("-   erster Punkt\n-   zweiter Punkt\n\n");
            text.push_str(&format!("[Nächster Abschnitt](#abschnitt-{})\n\n", section + 1));
        }
        let name = format!("k{:02}", chapter);
        fs::write(dir.path().join(&name).join(format!("{}.md", name)), text)
            .expect("chapter file");
    }
    dir
}

fn bench_mistkerl(c: &mut Criterion) {
    let mut group = c.benchmark_group("mistkerl");

    for chapters in [1, 5, 20] {
        let lecture = create_test_lecture(chapters);
        group.bench_with_input(BenchmarkId::new("run", chapters), &lecture, |b, lecture| {
            b.iter(|| Mistkerl::new().run(black_box(lecture.path())))
        });
    }

    let lecture = create_test_lecture(5);
    group.bench_function("run_without_links", |b| {
        b.iter(|| {
            Mistkerl::new()
                .with_link_checking(false)
                .run(black_box(lecture.path()))
        })
    });

    group.finish();
}

fn bench_table_of_contents(c: &mut Criterion) {
    let lecture = create_test_lecture(20);
    c.bench_function("table_of_contents", |b| {
        b.iter(|| table_of_contents(black_box(lecture.path())))
    });
}

criterion_group!(benches, bench_mistkerl, bench_table_of_contents);
criterion_main!(benches);
