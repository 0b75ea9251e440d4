use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pipesort::channel::ChannelMode;
use pipesort::stage::Stage;
use pipesort::{PipelineConfig, SortOrder, sort};

fn random_input(len: usize) -> Vec<u32> {
    let mut rng = fastrand::Rng::with_seed(42);
    (0..len).map(|_| rng.u32(..)).collect()
}

fn bench_pipeline_by_stage_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_sort");
    for stages in [5usize, 9, 13] {
        let input = random_input(1 << (stages - 1));
        for mode in [ChannelMode::Rendezvous, ChannelMode::Buffered] {
            let config = PipelineConfig::new(stages).with_channel(mode);
            let id = BenchmarkId::new(format!("{:?}", mode), input.len());
            group.bench_with_input(id, &input, |b, input| {
                b.iter(|| sort(&config, black_box(input.clone())).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_single_stage(c: &mut Criterion) {
    let input = random_input(4096);
    c.bench_function("stage_1_in_memory", |b| {
        b.iter(|| {
            let mut stage = Stage::new(1, input.len(), SortOrder::Ascending).unwrap();
            let mut sink = Vec::with_capacity(input.len());
            stage.run(&mut black_box(input.clone()).into_iter(), &mut sink).unwrap();
            sink
        })
    });
}

fn bench_std_sort_baseline(c: &mut Criterion) {
    let input = random_input(4096);
    c.bench_function("std_stable_sort_4096", |b| {
        b.iter(|| {
            let mut values = black_box(input.clone());
            values.sort();
            values
        })
    });
}

criterion_group!(
    benches,
    bench_pipeline_by_stage_count,
    bench_single_stage,
    bench_std_sort_baseline,
);
criterion_main!(benches);
