use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use shaper_core::{
    BitLeakyBucketConfig, BitTokenBucketConfig, Event, EventQueue, LeakyBucketConfig,
    PacketSwitchConfig, SimTime, TokenBucketConfig, Variates,
};

const RUN_TIME: SimTime = SimTime::from_secs(10.0);
const SEED: u64 = 12345;

fn event_queue(c: &mut Criterion) {
    let mut variates = Variates::new(Some(SEED));
    let times: Vec<SimTime> = (0..1_024)
        .map(|_| SimTime::from_secs(variates.uniform()))
        .collect();

    c.bench_function("event_queue_schedule_pop_1024", |b| {
        b.iter_batched(
            || EventQueue::new(SimTime::from_secs(1.0)),
            |mut queue| {
                for time in &times {
                    queue.schedule(*time, Event::ClockTick);
                }
                while let Some(event) = queue.pop_earliest() {
                    black_box(event);
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn variates(c: &mut Criterion) {
    let mut variates = Variates::new(Some(SEED));

    c.bench_function("exponential", |b| {
        b.iter(|| variates.exponential(black_box(0.01)))
    });
}

fn models(c: &mut Criterion) {
    let leaky = LeakyBucketConfig::default()
        .with_run_time(RUN_TIME)
        .with_seed(SEED);
    c.bench_function("leaky_bucket_10s", |b| {
        b.iter(|| leaky.build().map(|sim| black_box(sim.run())))
    });

    let bit_leaky = BitLeakyBucketConfig::default()
        .with_run_time(RUN_TIME)
        .with_seed(SEED);
    c.bench_function("bit_leaky_bucket_10s", |b| {
        b.iter(|| bit_leaky.build().map(|sim| black_box(sim.run())))
    });

    let token = TokenBucketConfig::default()
        .with_run_time(RUN_TIME)
        .with_seed(SEED);
    c.bench_function("token_bucket_10s", |b| {
        b.iter(|| token.build().map(|sim| black_box(sim.run())))
    });

    let bit_token = BitTokenBucketConfig::default()
        .with_run_time(RUN_TIME)
        .with_seed(SEED);
    c.bench_function("bit_token_bucket_10s", |b| {
        b.iter(|| bit_token.build().map(|sim| black_box(sim.run())))
    });

    let switch = PacketSwitchConfig::default()
        .with_run_length(10_000)
        .with_seed(SEED);
    c.bench_function("packet_switch_10k_departures", |b| {
        b.iter(|| switch.build().map(|sim| black_box(sim.run())))
    });
}

criterion_group!(benches, event_queue, variates, models);
criterion_main!(benches);
