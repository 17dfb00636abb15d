//! Throughput benchmarks for counting and one-sided mapping.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fmd_merge_mapper::alphabet::reverse_complement;
use fmd_merge_mapper::fmd::{ContigEntry, ContigTable, FMDIndex, InMemoryBwt};

fn synthetic_index(contig_len: usize) -> FMDIndex {
    let forward: Vec<u8> = (0..contig_len)
        .map(|i| match i % 4 {
            0 => b'A',
            1 => b'C',
            2 => b'G',
            _ => b'T',
        })
        .collect();
    let texts = vec![forward.clone(), reverse_complement(&forward)];
    let bwt = InMemoryBwt::build(&texts).expect("synthetic sequence builds");
    let contigs = ContigTable::new(
        vec![ContigEntry {
            name: "synthetic".into(),
            length: forward.len(),
        }],
        vec![1],
    );
    FMDIndex::new(Box::new(bwt), contigs, None, None)
}

fn benchmark_count(c: &mut Criterion) {
    let index = synthetic_index(2048);
    let query = b"ACGTACGTACGT".to_vec();

    c.bench_function("count_backward_full_query", |b| {
        b.iter(|| {
            black_box(index.count(black_box(&query)).unwrap());
        });
    });
}

fn benchmark_map(c: &mut Criterion) {
    let index = synthetic_index(2048);
    let query = b"ACGTACGTACGTACGTACGT".to_vec();

    c.bench_function("map_single_contig_query", |b| {
        b.iter(|| {
            black_box(index.map(black_box(&query), 4).unwrap());
        });
    });
}

criterion_group!(benches, benchmark_count, benchmark_map);
criterion_main!(benches);
