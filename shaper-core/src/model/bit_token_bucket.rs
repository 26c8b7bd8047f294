use crate::{
    defaults::{
        DEFAULT_ARRIVAL_RATE, DEFAULT_BIT_TOKEN_RATE, DEFAULT_DATA_BUCKET_SIZE, DEFAULT_RUN_TIME,
        DEFAULT_TOKEN_BUCKET_BITS, DEFAULT_TOKEN_BUCKET_SEED,
    },
    model::arrivals::{PoissonArrivals, SizeDistribution},
    BitRate, Bucket, Context, Event, Exponential, Model, Outcome, Packet, PacketSizes,
    ShaperReport, SimError, SimTime, Simulation, TokenLevel,
};

/// Parameters of the [`BitTokenBucket`].
#[derive(Debug, Clone, PartialEq)]
pub struct BitTokenBucketConfig {
    /// `Bt`, the capacity of the token bucket in bits
    pub token_bucket_size: u64,
    /// `Bd`, the capacity of the data bucket in packets
    pub data_bucket_size: u64,
    pub token_rate: BitRate,
    /// packets per second arriving
    pub arrival_rate: f64,
    pub packet_sizes: PacketSizes,
    pub run_time: SimTime,
    pub seed: Option<u64>,
}

/// A token bucket counting bits.
///
/// The token bucket starts full. Tokens accrue continuously at the token
/// rate but the level is only brought up to date when a packet arrives:
/// there are no token events. A packet leaves the data bucket when the
/// level covers its size, consuming as many bits of tokens.
///
/// Transmission is attempted on every arrival, before the packet is
/// admitted and again after it was, so a full data bucket is emptied
/// as soon as the accrued tokens allow it.
#[derive(Debug, Clone)]
pub struct BitTokenBucket {
    bucket: Bucket,
    tokens: TokenLevel,
    arrivals: PoissonArrivals,
}

impl Default for BitTokenBucketConfig {
    fn default() -> Self {
        Self {
            token_bucket_size: DEFAULT_TOKEN_BUCKET_BITS,
            data_bucket_size: DEFAULT_DATA_BUCKET_SIZE,
            token_rate: DEFAULT_BIT_TOKEN_RATE,
            arrival_rate: DEFAULT_ARRIVAL_RATE,
            packet_sizes: PacketSizes::default(),
            run_time: DEFAULT_RUN_TIME,
            seed: Some(DEFAULT_TOKEN_BUCKET_SEED),
        }
    }
}

impl BitTokenBucketConfig {
    pub fn with_token_bucket_size(mut self, token_bucket_size: u64) -> Self {
        self.token_bucket_size = token_bucket_size;
        self
    }

    pub fn with_data_bucket_size(mut self, data_bucket_size: u64) -> Self {
        self.data_bucket_size = data_bucket_size;
        self
    }

    pub fn with_token_rate(mut self, token_rate: BitRate) -> Self {
        self.token_rate = token_rate;
        self
    }

    pub fn with_arrival_rate(mut self, arrival_rate: f64) -> Self {
        self.arrival_rate = arrival_rate;
        self
    }

    pub fn with_packet_sizes(mut self, packet_sizes: PacketSizes) -> Self {
        self.packet_sizes = packet_sizes;
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

    pub fn with_random_seed(mut self) -> Self {
        self.seed = None;
        self
    }

    pub fn build(&self) -> Result<Simulation<BitTokenBucket>, SimError> {
        let arrival_rate = SimError::ensure_positive("arrival_rate", self.arrival_rate)?;
        SimError::ensure_positive("run_time", self.run_time.as_secs())?;

        let model = BitTokenBucket {
            bucket: Bucket::new(self.data_bucket_size),
            tokens: TokenLevel::full(
                self.token_bucket_size as f64,
                self.token_rate.bits_per_sec(),
            ),
            arrivals: PoissonArrivals::new(
                Exponential::with_rate(arrival_rate)?,
                SizeDistribution::Choice(self.packet_sizes.clone()),
            ),
        };

        Ok(Simulation::new(model, self.run_time, self.seed))
    }
}

impl BitTokenBucket {
    /// the data bucket
    #[inline]
    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    /// the token level, as of the last arrival
    #[inline]
    pub fn tokens(&self) -> &TokenLevel {
        &self.tokens
    }

    fn try_transmit(&mut self, ctx: &mut Context<'_>) {
        self.bucket.drain(&mut self.tokens, |packet| {
            let stats = ctx.stats();
            stats.record_transmission();
            stats.record_transmitted_bits(packet.size());
        });
    }

    fn on_arrival(&mut self, packet: Packet, ctx: &mut Context<'_>) {
        ctx.stats().record_arrival();

        // the tokens accrued since the last arrival may free some room
        self.tokens.advance_to(ctx.now());
        self.try_transmit(ctx);

        match self.bucket.offer(packet) {
            Ok(()) => self.try_transmit(ctx),
            Err(_) => ctx.stats().record_drop(),
        }
        self.arrivals.schedule_next(ctx);
    }
}

impl Model for BitTokenBucket {
    type Report = ShaperReport;
    const NAME: &'static str = "bit-token-bucket";

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.arrivals.schedule_next(ctx);
    }

    fn handle(&mut self, event: Event, ctx: &mut Context<'_>) {
        match event {
            Event::Arrival(packet) => self.on_arrival(packet, ctx),
            Event::Departure(_) | Event::ClockTick | Event::TokenTick => {}
        }
    }

    fn occupancy(&self) -> usize {
        self.bucket.len()
    }

    fn report(&self, outcome: &Outcome<'_>) -> Self::Report {
        ShaperReport::bits(outcome, self.bucket.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventKind, Step};

    fn config() -> BitTokenBucketConfig {
        BitTokenBucketConfig::default()
            .with_run_time(SimTime::from_secs(50.0))
            .with_seed(400430923)
    }

    #[test]
    fn starts_full() {
        let sim = config().build().unwrap();
        assert_eq!(sim.model().tokens().level(), 10_000.0);
    }

    #[test]
    fn only_arrival_events() {
        let mut sim = config().build().unwrap();
        while let Step::Dispatched { kind, .. } = sim.step() {
            assert_eq!(kind, EventKind::Arrival);
        }
    }

    #[test]
    fn token_level_within_bounds() {
        let mut sim = config()
            .with_token_rate(BitRate::new(100_000.0).unwrap())
            .build()
            .unwrap();

        while let Step::Dispatched { time, .. } = sim.step() {
            let tokens = sim.model().tokens();
            assert!(tokens.level() >= 0.0);
            assert!(tokens.level() <= tokens.capacity());
            assert_eq!(tokens.last_update(), time);
        }
    }

    #[test]
    fn output_bounded_by_token_rate() {
        let report = config()
            .with_token_rate(BitRate::new(100_000.0).unwrap())
            .build()
            .unwrap()
            .run();

        assert!(report.dropped > 0);
        assert_eq!(
            report.arrived,
            report.transmitted + report.dropped + report.queued
        );
        // the initial full bucket plus what was generated since
        let bits = report.bits_transmitted.unwrap();
        assert!(bits <= 10_000.0 + 100_000.0 * 50.0);
    }

    #[test]
    fn full_data_bucket_keeps_draining() {
        // heavily overloaded: the data bucket is full most of the time
        let report = config()
            .with_token_rate(BitRate::new(30_000.0).unwrap())
            .with_data_bucket_size(2)
            .build()
            .unwrap()
            .run();

        assert!(report.loss_rate > 0.5);
        // 1.5Mb of tokens over 50s, packets of at most 2500 bits
        assert!(report.transmitted > 500);
    }

    #[test]
    fn packet_larger_than_token_bucket_blocks() {
        let report = config()
            .with_token_bucket_size(400)
            .build()
            .unwrap()
            .run();

        assert_eq!(report.transmitted, 0);
        assert_eq!(report.bits_transmitted, Some(0.0));
    }
}
