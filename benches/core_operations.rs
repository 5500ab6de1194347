use criterion::{Criterion, black_box, criterion_group, criterion_main};

use kegwork::{DepGraph, InMemoryIndex, Package};

fn synthetic_index(size: usize, fan_out: usize) -> (InMemoryIndex, Vec<Package>) {
    let mut index = InMemoryIndex::new();
    let mut packages = Vec::with_capacity(size);

    for i in 0..size {
        let deps: Vec<String> = (1..=fan_out)
            .filter_map(|j| i.checked_sub(j).map(|d| format!("pkg-{:05}", d)))
            .collect();
        let pkg = Package {
            name: format!("pkg-{:05}", i),
            dependencies: deps,
            installed: true,
            bottled: true,
            ..Default::default()
        };
        packages.push(pkg.clone());
        index.insert(pkg).unwrap();
    }

    (index, packages)
}

fn bench_graph_build(c: &mut Criterion) {
    let (index, packages) = synthetic_index(1000, 4);
    c.bench_function("graph_build_1000", |b| {
        b.iter(|| DepGraph::build(black_box(&index), black_box(&packages)))
    });
}

fn bench_topological_sort(c: &mut Criterion) {
    let (index, packages) = synthetic_index(1000, 4);
    let graph = DepGraph::build(&index, &packages);
    c.bench_function("topological_sort_1000", |b| {
        b.iter(|| black_box(&graph).sorted().unwrap())
    });
}

fn bench_dependents_query(c: &mut Criterion) {
    let (index, packages) = synthetic_index(500, 3);
    let target = packages[0].clone();
    c.bench_function("transitive_dependents_500", |b| {
        b.iter(|| {
            use kegwork::PackageIndex;
            black_box(&index).dependents_of(black_box(&target))
        })
    });
}

criterion_group!(
    benches,
    bench_graph_build,
    bench_topological_sort,
    bench_dependents_query
);
criterion_main!(benches);
