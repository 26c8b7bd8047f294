use crate::{
    defaults::{
        DEFAULT_ARRIVAL_RATE, DEFAULT_BIT_BUCKET_SIZE, DEFAULT_BIT_OUTPUT_RATE,
        DEFAULT_CLOCK_PERIOD, DEFAULT_LEAKY_BUCKET_SEED, DEFAULT_RUN_TIME,
    },
    model::arrivals::{PoissonArrivals, SizeDistribution},
    BitRate, Bucket, Context, Event, Exponential, Model, Outcome, Packet, PacketSizes,
    ShaperReport, SimError, SimTime, Simulation, TickAllowance,
};

/// Parameters of the [`BitLeakyBucket`].
#[derive(Debug, Clone, PartialEq)]
pub struct BitLeakyBucketConfig {
    /// capacity of the bucket, in packets
    pub bucket_size: u64,
    /// `R`
    pub output_rate: BitRate,
    /// `T`, the period of the output clock
    pub clock_period: SimTime,
    /// packets per second arriving
    pub arrival_rate: f64,
    pub packet_sizes: PacketSizes,
    pub run_time: SimTime,
    pub seed: Option<u64>,
}

/// A leaky bucket counting bits.
///
/// Every `T` seconds, starting at time `0`, the output clock grants
/// `n = R × T` bits. Packets leave the bucket in FIFO order for as long
/// as the head packet fits in what is left of the `n` bits; several
/// small packets may leave on a single tick. The bits not used by the
/// end of the tick are lost, they are not carried over to the next tick.
#[derive(Debug, Clone)]
pub struct BitLeakyBucket {
    bucket: Bucket,
    clock_period: f64,
    bits_per_tick: f64,
    last_tick_bits: f64,
    arrivals: PoissonArrivals,
}

impl Default for BitLeakyBucketConfig {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BIT_BUCKET_SIZE,
            output_rate: DEFAULT_BIT_OUTPUT_RATE,
            clock_period: DEFAULT_CLOCK_PERIOD,
            arrival_rate: DEFAULT_ARRIVAL_RATE,
            packet_sizes: PacketSizes::default(),
            run_time: DEFAULT_RUN_TIME,
            seed: Some(DEFAULT_LEAKY_BUCKET_SEED),
        }
    }
}

impl BitLeakyBucketConfig {
    pub fn with_bucket_size(mut self, bucket_size: u64) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    pub fn with_output_rate(mut self, output_rate: BitRate) -> Self {
        self.output_rate = output_rate;
        self
    }

    pub fn with_clock_period(mut self, clock_period: SimTime) -> Self {
        self.clock_period = clock_period;
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

    /// `n`, the number of bits granted on every tick
    pub fn bits_per_tick(&self) -> f64 {
        self.output_rate.bits_during(self.clock_period)
    }

    pub fn build(&self) -> Result<Simulation<BitLeakyBucket>, SimError> {
        let clock_period = SimError::ensure_positive("clock_period", self.clock_period.as_secs())?;
        let arrival_rate = SimError::ensure_positive("arrival_rate", self.arrival_rate)?;
        SimError::ensure_positive("run_time", self.run_time.as_secs())?;

        let model = BitLeakyBucket {
            bucket: Bucket::new(self.bucket_size),
            clock_period,
            bits_per_tick: self.bits_per_tick(),
            last_tick_bits: 0.0,
            arrivals: PoissonArrivals::new(
                Exponential::with_rate(arrival_rate)?,
                SizeDistribution::Choice(self.packet_sizes.clone()),
            ),
        };

        Ok(Simulation::new(model, self.run_time, self.seed))
    }
}

impl BitLeakyBucket {
    #[inline]
    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    /// `n = R × T`
    #[inline]
    pub fn bits_per_tick(&self) -> f64 {
        self.bits_per_tick
    }

    /// bits that left the bucket on the most recent tick
    #[inline]
    pub fn last_tick_bits(&self) -> f64 {
        self.last_tick_bits
    }

    fn on_arrival(&mut self, packet: Packet, ctx: &mut Context<'_>) {
        ctx.stats().record_arrival();
        if self.bucket.offer(packet).is_err() {
            ctx.stats().record_drop();
        }
        self.arrivals.schedule_next(ctx);
    }

    fn on_tick(&mut self, ctx: &mut Context<'_>) {
        // a fresh allowance every tick, the residue of the previous one is lost
        let mut allowance = TickAllowance::new(self.bits_per_tick);
        let mut bits = 0.0;
        self.bucket.drain(&mut allowance, |packet| {
            let stats = ctx.stats();
            stats.record_transmission();
            stats.record_transmitted_bits(packet.size());
            bits += packet.size();
        });
        self.last_tick_bits = bits;

        ctx.schedule_in(self.clock_period, Event::ClockTick);
    }
}

impl Model for BitLeakyBucket {
    type Report = ShaperReport;
    const NAME: &'static str = "bit-leaky-bucket";

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
        ShaperReport::bits(outcome, self.bucket.len())
    }
}
