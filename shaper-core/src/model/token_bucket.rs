use crate::{
    defaults::{
        DEFAULT_ARRIVAL_RATE, DEFAULT_DATA_BUCKET_SIZE, DEFAULT_RUN_TIME,
        DEFAULT_TOKEN_BUCKET_SEED, DEFAULT_TOKEN_BUCKET_SIZE, DEFAULT_TOKEN_RATE,
    },
    model::arrivals::{PoissonArrivals, SizeDistribution},
    Bucket, Context, Event, Exponential, Model, Outcome, Packet, ShaperReport, SimError, SimTime,
    Simulation, TokenPool,
};

/// Parameters of the packet-counting [`TokenBucket`].
///
/// ```
/// use shaper_core::TokenBucketConfig;
///
/// let report = TokenBucketConfig::default()
///     .with_run_time("100s".parse().unwrap())
///     .build()
///     .unwrap()
///     .run();
/// assert!(report.loss_rate < 0.1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBucketConfig {
    /// `Bt`, the maximum number of tokens
    pub token_bucket_size: u64,
    /// `Bd`, the capacity of the data bucket in packets
    pub data_bucket_size: u64,
    /// tokens generated per second
    pub token_rate: f64,
    /// packets per second arriving
    pub arrival_rate: f64,
    pub run_time: SimTime,
    pub seed: Option<u64>,
}

/// A token bucket counting packets.
///
/// Two processes share the data bucket: the packet arrivals, and a
/// token clock adding one token every `1 / token_rate` seconds. The first
/// token is generated at `1 / token_rate`, the token bucket starts empty.
/// A token generated while the token bucket is full is lost.
///
/// A packet leaves the data bucket by consuming one token. Transmission
/// is attempted after every accepted packet and after every token, as
/// either of them can unblock the head of the data bucket.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    bucket: Bucket,
    tokens: TokenPool,
    token_period: f64,
    arrivals: PoissonArrivals,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self {
            token_bucket_size: DEFAULT_TOKEN_BUCKET_SIZE,
            data_bucket_size: DEFAULT_DATA_BUCKET_SIZE,
            token_rate: DEFAULT_TOKEN_RATE,
            arrival_rate: DEFAULT_ARRIVAL_RATE,
            run_time: DEFAULT_RUN_TIME,
            seed: Some(DEFAULT_TOKEN_BUCKET_SEED),
        }
    }
}

impl TokenBucketConfig {
    pub fn with_token_bucket_size(mut self, token_bucket_size: u64) -> Self {
        self.token_bucket_size = token_bucket_size;
        self
    }

    pub fn with_data_bucket_size(mut self, data_bucket_size: u64) -> Self {
        self.data_bucket_size = data_bucket_size;
        self
    }

    pub fn with_token_rate(mut self, token_rate: f64) -> Self {
        self.token_rate = token_rate;
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

    pub fn with_random_seed(mut self) -> Self {
        self.seed = None;
        self
    }

    pub fn build(&self) -> Result<Simulation<TokenBucket>, SimError> {
        let token_rate = SimError::ensure_positive("token_rate", self.token_rate)?;
        let arrival_rate = SimError::ensure_positive("arrival_rate", self.arrival_rate)?;
        SimError::ensure_positive("run_time", self.run_time.as_secs())?;

        let model = TokenBucket {
            bucket: Bucket::new(self.data_bucket_size),
            tokens: TokenPool::empty(self.token_bucket_size),
            token_period: 1.0 / token_rate,
            arrivals: PoissonArrivals::new(
                Exponential::with_rate(arrival_rate)?,
                SizeDistribution::Unit,
            ),
        };

        Ok(Simulation::new(model, self.run_time, self.seed))
    }
}

impl TokenBucket {
    /// the data bucket
    #[inline]
    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    #[inline]
    pub fn tokens(&self) -> &TokenPool {
        &self.tokens
    }

    fn try_transmit(&mut self, ctx: &mut Context<'_>) {
        self.bucket
            .drain(&mut self.tokens, |_| ctx.stats().record_transmission());
    }

    fn on_arrival(&mut self, packet: Packet, ctx: &mut Context<'_>) {
        ctx.stats().record_arrival();
        match self.bucket.offer(packet) {
            Ok(()) => self.try_transmit(ctx),
            Err(_) => ctx.stats().record_drop(),
        }
        self.arrivals.schedule_next(ctx);
    }

    fn on_token(&mut self, ctx: &mut Context<'_>) {
        self.tokens.add_token();
        self.try_transmit(ctx);

        ctx.schedule_in(self.token_period, Event::TokenTick);
    }
}

impl Model for TokenBucket {
    type Report = ShaperReport;
    const NAME: &'static str = "token-bucket";

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.arrivals.schedule_next(ctx);
        ctx.schedule(SimTime::from_secs(self.token_period), Event::TokenTick);
    }

    fn handle(&mut self, event: Event, ctx: &mut Context<'_>) {
        match event {
            Event::Arrival(packet) => self.on_arrival(packet, ctx),
            Event::TokenTick => self.on_token(ctx),
            Event::Departure(_) | Event::ClockTick => {}
        }
    }

    fn occupancy(&self) -> usize {
        self.bucket.len()
    }

    fn report(&self, outcome: &Outcome<'_>) -> Self::Report {
        ShaperReport::packets(outcome, self.bucket.len())
    }
}
