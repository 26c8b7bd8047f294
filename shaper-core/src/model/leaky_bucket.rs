use crate::{
    defaults::{
        DEFAULT_ARRIVAL_RATE, DEFAULT_BUCKET_SIZE, DEFAULT_LEAKY_BUCKET_SEED, DEFAULT_OUTPUT_RATE,
        DEFAULT_RUN_TIME,
    },
    model::arrivals::{PoissonArrivals, SizeDistribution},
    Bucket, Context, Event, Exponential, Model, Outcome, Packet, ShaperReport, SimError, SimTime,
    Simulation, TickAllowance,
};

/// Parameters of the packet-counting [`LeakyBucket`].
///
/// ```
/// use shaper_core::LeakyBucketConfig;
///
/// let sim = LeakyBucketConfig::default()
///     .with_output_rate(50.0)
///     .with_bucket_size(3)
///     .with_seed(12345)
///     .build()
///     .unwrap();
/// assert_eq!(sim.seed(), 12345);
///
/// assert!(LeakyBucketConfig::default().with_output_rate(0.0).build().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LeakyBucketConfig {
    /// `B`, the capacity of the bucket in packets
    pub bucket_size: u64,
    /// `R`, packets per second leaving the bucket (one per tick)
    pub output_rate: f64,
    /// `λ`, packets per second arriving
    pub arrival_rate: f64,
    pub run_time: SimTime,
    pub seed: Option<u64>,
}

/// A leaky bucket counting packets.
///
/// A clock ticks every `1 / R` seconds starting at time `0`. Every tick
/// lets at most one packet out of the bucket. Arriving packets are
/// appended to the bucket, or dropped when it is full.
#[derive(Debug, Clone)]
pub struct LeakyBucket {
    bucket: Bucket,
    tick_period: f64,
    arrivals: PoissonArrivals,
}

impl Default for LeakyBucketConfig {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            output_rate: DEFAULT_OUTPUT_RATE,
            arrival_rate: DEFAULT_ARRIVAL_RATE,
            run_time: DEFAULT_RUN_TIME,
            seed: Some(DEFAULT_LEAKY_BUCKET_SEED),
        }
    }
}

impl LeakyBucketConfig {
    pub fn with_bucket_size(mut self, bucket_size: u64) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    pub fn with_output_rate(mut self, output_rate: f64) -> Self {
        self.output_rate = output_rate;
        self
    }

    pub fn with_arrival_rate(mut self, arrival_rate: f64) -> Self {
        self.arrival_rate = arrival_rate;
        self
    }

    pub fn with_run_time(mut self, run_time: SimTime) -> Self {
        self.run_time = run_time;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// use a random seed, drawn from the system's entropy
    pub fn with_random_seed(mut self) -> Self {
        self.seed = None;
        self
    }

    /// validate the parameters and create the simulation.
    pub fn build(&self) -> Result<Simulation<LeakyBucket>, SimError> {
        let output_rate = SimError::ensure_positive("output_rate", self.output_rate)?;
        let arrival_rate = SimError::ensure_positive("arrival_rate", self.arrival_rate)?;
        SimError::ensure_positive("run_time", self.run_time.as_secs())?;

        let model = LeakyBucket {
            bucket: Bucket::new(self.bucket_size),
            tick_period: 1.0 / output_rate,
            arrivals: PoissonArrivals::new(
                Exponential::with_rate(arrival_rate)?,
                SizeDistribution::Unit,
            ),
        };

        Ok(Simulation::new(model, self.run_time, self.seed))
    }
}

impl LeakyBucket {
    #[inline]
    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    #[inline]
    pub fn tick_period(&self) -> f64 {
        self.tick_period
    }

    fn on_arrival(&mut self, packet: Packet, ctx: &mut Context<'_>) {
        ctx.stats().record_arrival();
        if self.bucket.offer(packet).is_err() {
            ctx.stats().record_drop();
        }
        self.arrivals.schedule_next(ctx);
    }

    fn on_tick(&mut self, ctx: &mut Context<'_>) {
        let mut allowance = TickAllowance::new(1.0);
        self.bucket
            .drain(&mut allowance, |_| ctx.stats().record_transmission());

        ctx.schedule_in(self.tick_period, Event::ClockTick);
    }
}

impl Model for LeakyBucket {
    type Report = ShaperReport;
    const NAME: &'static str = "leaky-bucket";

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.arrivals.schedule_next(ctx);
        ctx.schedule(SimTime::ZERO, Event::ClockTick);
    }

    fn handle(&mut self, event: Event, ctx: &mut Context<'_>) {
        match event {
            Event::Arrival(packet) => self.on_arrival(packet, ctx),
            Event::ClockTick => self.on_tick(ctx),
            Event::Departure(_) | Event::TokenTick => {}
        }
    }

    fn occupancy(&self) -> usize {
        self.bucket.len()
    }

    fn report(&self, outcome: &Outcome<'_>) -> Self::Report {
        ShaperReport::packets(outcome, self.bucket.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventKind, Step};

    fn config() -> LeakyBucketConfig {
        LeakyBucketConfig::default()
            .with_run_time(SimTime::from_secs(50.0))
            .with_seed(12345)
    }

    #[test]
    fn first_tick_at_zero() {
        let mut sim = config().build().unwrap();

        assert_eq!(
            sim.step(),
            Step::Dispatched {
                time: SimTime::ZERO,
                kind: EventKind::ClockTick
            }
        );
    }

    #[test]
    fn bucket_never_exceeds_capacity() {
        let mut sim = config()
            .with_bucket_size(2)
            .with_output_rate(50.0)
            .build()
            .unwrap();

        while let Step::Dispatched { .. } = sim.step() {
            assert!(sim.model().bucket().len() <= 2);
        }
    }

    #[test]
    fn packets_are_conserved() {
        let report = config().with_output_rate(80.0).build().unwrap().run();

        assert!(report.arrived > 0);
        assert!(report.dropped > 0);
        assert_eq!(
            report.arrived,
            report.transmitted + report.dropped + report.queued
        );
    }

    #[test]
    fn output_limited_by_ticks() {
        let report = config().with_output_rate(20.0).build().unwrap().run();

        // one packet per tick, ticks at 0, 0.05, ... strictly before 50s
        // (give or take one tick of rounding)
        assert!(report.transmitted <= 1_001);
        assert!(report.mean_output_rate <= 20.0 + 1.0 / 50.0);
        assert!(report.loss_rate > 0.7);
    }

    #[test]
    fn zero_capacity_drops_everything() {
        let report = config().with_bucket_size(0).build().unwrap().run();

        assert_eq!(report.transmitted, 0);
        assert_eq!(report.dropped, report.arrived);
        assert_eq!(report.loss_rate, 1.0);
        assert_eq!(report.mean_queue_length, 0.0);
    }

    #[test]
    fn invalid_parameters() {
        assert!(matches!(
            config().with_arrival_rate(-1.0).build(),
            Err(SimError::InvalidParameter {
                name: "arrival_rate",
                ..
            })
        ));
        assert!(config().with_run_time(SimTime::ZERO).build().is_err());
        assert!(config().with_output_rate(f64::NAN).build().is_err());
    }
}
