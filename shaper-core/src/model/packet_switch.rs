use crate::{
    defaults::{
        DEFAULT_LINK_RATE, DEFAULT_MEAN_PACKET_SIZE, DEFAULT_RUN_LENGTH,
        DEFAULT_SWITCH_ARRIVAL_RATE,
    },
    model::arrivals::{PoissonArrivals, SizeDistribution},
    BitRate, Context, Event, Exponential, Model, Outcome, Packet, SimError, SimTime, Simulation,
};
use std::collections::VecDeque;

/// Parameters of the [`PacketSwitch`].
///
/// ```
/// use shaper_core::PacketSwitchConfig;
///
/// let config = PacketSwitchConfig::default().with_load(0.8);
/// assert_eq!(config.arrival_rate, 800.0);
/// assert_eq!(config.offered_load(), 0.8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PacketSwitchConfig {
    /// `C`, the rate of the output link
    pub link_rate: BitRate,
    /// mean of the exponentially distributed packet sizes, in bits
    pub mean_packet_size: f64,
    /// packets per second arriving
    pub arrival_rate: f64,
    /// the run stops after this many departures
    pub run_length: u64,
    pub seed: Option<u64>,
}

/// A single server FIFO queue (M/M/1).
///
/// Packets of exponentially distributed size arrive as a Poisson process.
/// The server transmits one packet at a time, the service time being the
/// size of the packet over the link rate. The others wait in an unbounded
/// FIFO queue: nothing is ever dropped.
///
/// The run is bounded by the number of departures rather than by time.
/// An offered load of `1` or more is not rejected, the queue then grows
/// for as long as the run lasts.
#[derive(Debug, Clone)]
pub struct PacketSwitch {
    waiting: VecDeque<Packet>,
    busy: bool,
    link_rate: BitRate,
    run_length: u64,
    arrivals: PoissonArrivals,

    departed: u64,
    total_delay: f64,
    queue_delay: f64,
    service_time: f64,
}

/// The result record of the [`PacketSwitch`].
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchReport {
    pub seed: u64,
    pub arrived: u64,
    pub departed: u64,
    /// mean time between arrival and departure, in seconds
    pub mean_delay: f64,
    /// mean time spent waiting for the server, in seconds
    pub mean_queue_delay: f64,
    /// mean transmission time, in seconds
    pub mean_service_time: f64,
    /// fraction of the time the server was busy
    pub utilization: f64,
    /// time-averaged number of packets in the switch (waiting or in service)
    pub mean_number_in_system: f64,
    /// mean rate of the transmitted bits
    pub throughput: f64,
    /// time of the last departure
    pub sim_time: SimTime,
}

impl Default for PacketSwitchConfig {
    fn default() -> Self {
        Self {
            link_rate: DEFAULT_LINK_RATE,
            mean_packet_size: DEFAULT_MEAN_PACKET_SIZE,
            arrival_rate: DEFAULT_SWITCH_ARRIVAL_RATE,
            run_length: DEFAULT_RUN_LENGTH,
            seed: None,
        }
    }
}

impl PacketSwitchConfig {
    pub fn with_link_rate(mut self, link_rate: BitRate) -> Self {
        self.link_rate = link_rate;
        self
    }

    pub fn with_mean_packet_size(mut self, mean_packet_size: f64) -> Self {
        self.mean_packet_size = mean_packet_size;
        self
    }

    pub fn with_arrival_rate(mut self, arrival_rate: f64) -> Self {
        self.arrival_rate = arrival_rate;
        self
    }

    /// set the arrival rate that offers the given `load` to the link
    pub fn with_load(mut self, load: f64) -> Self {
        self.arrival_rate = load * self.service_rate();
        self
    }

    pub fn with_run_length(mut self, run_length: u64) -> Self {
        self.run_length = run_length;
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

    /// `μ`, packets per second the link can transmit on average
    pub fn service_rate(&self) -> f64 {
        self.link_rate.bits_per_sec() / self.mean_packet_size
    }

    /// `ρ = λ / μ`
    pub fn offered_load(&self) -> f64 {
        self.arrival_rate / self.service_rate()
    }

    pub fn build(&self) -> Result<Simulation<PacketSwitch>, SimError> {
        let mean_packet_size =
            SimError::ensure_positive("mean_packet_size", self.mean_packet_size)?;
        let arrival_rate = SimError::ensure_positive("arrival_rate", self.arrival_rate)?;
        let run_length = SimError::ensure_non_zero("run_length", self.run_length)?;

        let model = PacketSwitch {
            waiting: VecDeque::new(),
            busy: false,
            link_rate: self.link_rate,
            run_length,
            arrivals: PoissonArrivals::new(
                Exponential::with_rate(arrival_rate)?,
                SizeDistribution::Exponential(Exponential::with_mean(mean_packet_size)?),
            ),
            departed: 0,
            total_delay: 0.0,
            queue_delay: 0.0,
            service_time: 0.0,
        };

        Ok(Simulation::new(model, SimTime::INFINITY, self.seed))
    }
}

impl PacketSwitch {
    #[inline]
    pub fn departed(&self) -> u64 {
        self.departed
    }

    /// packets waiting for the server
    #[inline]
    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn start_service(&mut self, mut packet: Packet, ctx: &mut Context<'_>) {
        debug_assert!(!self.busy);

        packet.start_service(ctx.now());
        let service_time = self.link_rate.transmission_time(packet.size());
        self.busy = true;
        ctx.schedule_in(service_time, Event::Departure(packet));
    }

    fn on_arrival(&mut self, packet: Packet, ctx: &mut Context<'_>) {
        ctx.stats().record_arrival();
        if self.busy {
            self.waiting.push_back(packet);
        } else {
            self.start_service(packet, ctx);
        }

        if self.departed < self.run_length {
            self.arrivals.schedule_next(ctx);
        }
    }

    fn on_departure(&mut self, mut packet: Packet, ctx: &mut Context<'_>) {
        packet.depart(ctx.now());

        self.departed += 1;
        self.total_delay += packet.total_delay().unwrap_or_default();
        self.queue_delay += packet.queue_delay().unwrap_or_default();
        self.service_time += packet.service_time().unwrap_or_default();

        let stats = ctx.stats();
        stats.record_transmission();
        stats.record_transmitted_bits(packet.size());

        self.busy = false;
        if let Some(next) = self.waiting.pop_front() {
            self.start_service(next, ctx);
        }
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.departed == 0 {
            0.0
        } else {
            sum / self.departed as f64
        }
    }
}

impl Model for PacketSwitch {
    type Report = SwitchReport;
    const NAME: &'static str = "packet-switch";

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.arrivals.schedule_next(ctx);
    }

    fn handle(&mut self, event: Event, ctx: &mut Context<'_>) {
        match event {
            Event::Arrival(packet) => self.on_arrival(packet, ctx),
            Event::Departure(packet) => self.on_departure(packet, ctx),
            Event::ClockTick | Event::TokenTick => {}
        }
    }

    fn occupancy(&self) -> usize {
        self.waiting.len() + usize::from(self.busy)
    }

    fn is_finished(&self) -> bool {
        self.departed >= self.run_length
    }

    fn report(&self, outcome: &Outcome<'_>) -> Self::Report {
        let statistics = outcome.statistics;
        let clock = outcome.clock.as_secs();
        let utilization = if clock > 0.0 {
            self.service_time / clock
        } else {
            0.0
        };

        SwitchReport {
            seed: outcome.seed,
            arrived: statistics.arrived(),
            departed: self.departed,
            mean_delay: self.mean(self.total_delay),
            mean_queue_delay: self.mean(self.queue_delay),
            mean_service_time: self.mean(self.service_time),
            utilization,
            mean_number_in_system: statistics.mean_queue_length(outcome.window),
            throughput: statistics.mean_output_bit_rate(outcome.window),
            sim_time: outcome.clock,
        }
    }
}
