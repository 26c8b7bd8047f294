use shaper_core::{
    BitLeakyBucketConfig, BitRate, BitTokenBucketConfig, LeakyBucketConfig, PacketSwitchConfig,
    ShaperReport, SimTime, TokenBucketConfig,
};

const RUN_TIME: SimTime = SimTime::from_secs(1_000.0);

fn assert_close(value: f64, expected: f64, tolerance: f64) {
    let error = (value - expected).abs() / expected;
    assert!(
        error <= tolerance,
        "{value} is not within {}% of {expected}",
        tolerance * 100.0
    );
}

fn assert_consistent(report: &ShaperReport) {
    assert!((0.0..=1.0).contains(&report.loss_rate));
    assert_eq!(
        report.arrived,
        report.transmitted + report.dropped + report.queued
    );
    assert!(report.mean_queue_length >= 0.0);
}

#[test]
fn leaky_bucket_fast_output() {
    let report = LeakyBucketConfig::default()
        .with_bucket_size(1)
        .with_output_rate(1_000.0)
        .with_arrival_rate(100.0)
        .with_run_time(RUN_TIME)
        .with_seed(12345)
        .build()
        .unwrap()
        .run();

    assert_consistent(&report);
    assert!(report.loss_rate > 0.0);
    assert!(report.loss_rate < 0.1);
    assert_close(report.mean_output_rate, 100.0, 0.1);
}

#[test]
fn leaky_bucket_slow_output() {
    let report = LeakyBucketConfig::default()
        .with_bucket_size(3)
        .with_output_rate(50.0)
        .with_arrival_rate(100.0)
        .with_run_time(RUN_TIME)
        .with_seed(12345)
        .build()
        .unwrap()
        .run();

    assert_consistent(&report);
    assert!(report.loss_rate > 0.4);
    assert_close(report.mean_output_rate, 50.0, 0.05);
    assert!(report.mean_output_rate <= 50.0 + 1.0 / RUN_TIME.as_secs());
}

#[test]
fn token_bucket_matches_arrivals() {
    let run = |size: u64| {
        TokenBucketConfig::default()
            .with_token_bucket_size(size)
            .with_data_bucket_size(size)
            .with_token_rate(100.0)
            .with_arrival_rate(100.0)
            .with_run_time(RUN_TIME)
            .with_seed(400430923)
            .build()
            .unwrap()
            .run()
    };

    let small = run(20);
    let large = run(500);
    assert_consistent(&small);
    assert_consistent(&large);

    assert_close(small.mean_output_rate, 100.0, 0.1);
    assert_close(large.mean_output_rate, 100.0, 0.03);
    assert!(large.loss_rate <= small.loss_rate);
    assert!(large.loss_rate < 0.01);
}

#[test]
fn bit_leaky_bucket_bounded_by_output_rate() {
    let report = BitLeakyBucketConfig::default()
        .with_output_rate(BitRate::new(120_000.0).unwrap())
        .with_clock_period(SimTime::from_secs(0.025))
        .with_run_time(RUN_TIME)
        .build()
        .unwrap()
        .run();

    assert_consistent(&report);
    assert!(report.loss_rate > 0.0);
    let rate = report.mean_output_bit_rate.unwrap();
    assert!(rate <= 120_000.0 + 3_000.0 / RUN_TIME.as_secs());
}

#[test]
fn bit_token_bucket_bounded_by_token_rate() {
    let report = BitTokenBucketConfig::default()
        .with_token_rate(BitRate::new(100_000.0).unwrap())
        .with_run_time(RUN_TIME)
        .build()
        .unwrap()
        .run();

    assert_consistent(&report);
    let rate = report.mean_output_bit_rate.unwrap();
    assert!(rate <= 100_000.0 + 10_000.0 / RUN_TIME.as_secs());
    assert_close(rate, 100_000.0, 0.05);
}

#[test]
fn bit_token_bucket_with_spare_tokens() {
    // 200kbps of tokens for 150kbps offered on average
    let report = BitTokenBucketConfig::default()
        .with_run_time(RUN_TIME)
        .build()
        .unwrap()
        .run();

    assert_consistent(&report);
    assert!(report.loss_rate < 0.01);
    assert_close(report.mean_output_bit_rate.unwrap(), 150_000.0, 0.05);
}

#[test]
fn packet_switch_matches_mm1() {
    let config = PacketSwitchConfig::default()
        .with_load(0.5)
        .with_run_length(100_000)
        .with_seed(2025);
    let mu = config.service_rate();
    let lambda = config.arrival_rate;

    let report = config.build().unwrap().run();

    assert_eq!(report.departed, 100_000);
    assert_close(report.mean_delay, 1.0 / (mu - lambda), 0.05);
    assert_close(report.mean_number_in_system, 1.0, 0.05);
    assert_close(report.utilization, 0.5, 0.03);
}

#[test]
fn same_seed_same_report() {
    let leaky = LeakyBucketConfig::default()
        .with_run_time(SimTime::from_secs(100.0))
        .with_seed(7);
    assert_eq!(leaky.build().unwrap().run(), leaky.build().unwrap().run());

    let bit_leaky = BitLeakyBucketConfig::default()
        .with_run_time(SimTime::from_secs(100.0))
        .with_seed(7);
    assert_eq!(
        bit_leaky.build().unwrap().run(),
        bit_leaky.build().unwrap().run()
    );

    let token = TokenBucketConfig::default()
        .with_run_time(SimTime::from_secs(100.0))
        .with_seed(7);
    assert_eq!(token.build().unwrap().run(), token.build().unwrap().run());

    let bit_token = BitTokenBucketConfig::default()
        .with_run_time(SimTime::from_secs(100.0))
        .with_seed(7);
    assert_eq!(
        bit_token.build().unwrap().run(),
        bit_token.build().unwrap().run()
    );

    let switch = PacketSwitchConfig::default()
        .with_run_length(5_000)
        .with_seed(7);
    assert_eq!(switch.build().unwrap().run(), switch.build().unwrap().run());
}

#[test]
fn different_seed_different_report() {
    let config = LeakyBucketConfig::default().with_run_time(SimTime::from_secs(100.0));

    let a = config.clone().with_seed(1).build().unwrap().run();
    let b = config.with_seed(2).build().unwrap().run();
    assert_ne!(a, b);
}

#[test]
fn random_seed_is_reported() {
    let config = LeakyBucketConfig::default()
        .with_run_time(SimTime::from_secs(10.0))
        .with_random_seed();
    let report = config.build().unwrap().run();

    let replay = config
        .with_seed(report.seed)
        .build()
        .unwrap()
        .run();
    assert_eq!(report, replay);
}
