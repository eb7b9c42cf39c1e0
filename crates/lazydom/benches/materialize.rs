use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use lazydom::prelude::*;
use lazydom::NativeDocument;

fn table(rows: usize, label: &str) -> Child {
    let rows = (0..rows)
        .map(|row| {
            Child::from(element(
                "tr",
                props! { "id" => format!("row-{row}") },
                children![
                    element("td", Props::new(), children![row]),
                    element("td", Props::new(), children![label]),
                ],
            ))
        })
        .collect();
    Child::from(element("table", Props::new(), rows))
}

fn bench_create(c: &mut Criterion) {
    c.bench_function("create 1000 rows", |b| {
        b.iter(|| black_box(table(1000, "lazy")))
    });
}

fn bench_materialize(c: &mut Criterion) {
    let document = MemoryDocument::new();
    install(document.clone());

    c.bench_function("materialize 1000 rows", |b| {
        b.iter_batched(
            || table(1000, "lazy"),
            |tree| {
                let element = tree.as_element().cloned();
                black_box(element.map(|element| element.materialize()))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_patch(c: &mut Criterion) {
    let tree = install(MemoryDocument::new());
    let container = match tree.document().create_element("body") {
        Ok(container) => container,
        Err(err) => panic!("container creation failed: {err}"),
    };
    let mut root = Root::new(container);
    if let Err(err) = root.render(table(1000, "first")) {
        panic!("initial render failed: {err}");
    }

    let mut flip = false;
    c.bench_function("patch 1000 rows", |b| {
        b.iter_batched(
            || {
                flip = !flip;
                table(1000, if flip { "second" } else { "first" })
            },
            |tree| black_box(root.render(tree)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_create, bench_materialize, bench_patch);
criterion_main!(benches);
