//! Run statistics and result records.
//!
//! [`RunStatistics`] is the accumulator every [`Simulation`] updates while
//! it runs. Once the run has terminated the models turn it into their
//! result record ([`ShaperReport`] for the buckets, [`SwitchReport`] for
//! the packet switch).
//!
//! [`Simulation`]: crate::Simulation
//! [`SwitchReport`]: crate::model::SwitchReport

use crate::{Outcome, SimTime};

/// Counters and time-weighted accumulator of one simulation run.
///
/// The counters only increase. The occupancy accumulator holds the
/// integral of the queue length over time: it is updated by
/// [`RunStatistics::on_event`] exactly once per dispatched event, with the
/// queue length that held since the previous update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    arrived: u64,
    dropped: u64,
    transmitted: u64,
    bits_transmitted: f64,

    occupancy_integral: f64,
    last_update_time: SimTime,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// integrate `queue_length × (new_time − last_update_time)` and move
    /// the last update time to `new_time`.
    ///
    /// `queue_length` is the occupancy that held since the last update,
    /// i.e. before the event at `new_time` is dispatched.
    pub fn on_event(&mut self, new_time: SimTime, queue_length: usize) {
        debug_assert!(
            self.last_update_time <= new_time,
            "statistics updated at {new_time} after {last}",
            last = self.last_update_time,
        );

        let elapsed = new_time.elapsed_since(self.last_update_time);
        self.occupancy_integral += queue_length as f64 * elapsed;
        self.last_update_time = new_time;
    }

    #[inline]
    pub fn record_arrival(&mut self) {
        self.arrived += 1;
    }

    #[inline]
    pub fn record_drop(&mut self) {
        self.dropped += 1;
    }

    #[inline]
    pub fn record_transmission(&mut self) {
        self.transmitted += 1;
    }

    #[inline]
    pub fn record_transmitted_bits(&mut self, bits: f64) {
        self.bits_transmitted += bits;
    }

    #[inline]
    pub fn arrived(&self) -> u64 {
        self.arrived
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub fn transmitted(&self) -> u64 {
        self.transmitted
    }

    #[inline]
    pub fn bits_transmitted(&self) -> f64 {
        self.bits_transmitted
    }

    #[inline]
    pub fn occupancy_integral(&self) -> f64 {
        self.occupancy_integral
    }

    #[inline]
    pub fn last_update_time(&self) -> SimTime {
        self.last_update_time
    }

    /// `dropped / arrived`, `0` if nothing arrived.
    pub fn loss_rate(&self) -> f64 {
        if self.arrived == 0 {
            0.0
        } else {
            self.dropped as f64 / self.arrived as f64
        }
    }

    /// transmitted packets per second over the `window`.
    pub fn mean_output_rate(&self, window: SimTime) -> f64 {
        per_second(self.transmitted as f64, window)
    }

    /// transmitted bits per second over the `window`.
    pub fn mean_output_bit_rate(&self, window: SimTime) -> f64 {
        per_second(self.bits_transmitted, window)
    }

    /// time-averaged queue length over the `window`.
    pub fn mean_queue_length(&self, window: SimTime) -> f64 {
        per_second(self.occupancy_integral, window)
    }
}

fn per_second(value: f64, window: SimTime) -> f64 {
    let secs = window.as_secs();
    if secs > 0.0 { value / secs } else { 0.0 }
}

/// The result record of the four traffic-shaping models.
///
/// `bits_transmitted` and `mean_output_bit_rate` are only set by the
/// bit-counting models.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaperReport {
    /// the seed of the run, to replay it
    pub seed: u64,
    /// the averaging window: the run horizon
    pub run_time: SimTime,
    pub arrived: u64,
    pub dropped: u64,
    pub transmitted: u64,
    /// packets still in the bucket when the run ended
    pub queued: u64,
    pub bits_transmitted: Option<f64>,
    /// `dropped / arrived`
    pub loss_rate: f64,
    /// transmitted packets per second
    pub mean_output_rate: f64,
    /// transmitted bits per second
    pub mean_output_bit_rate: Option<f64>,
    /// time-averaged number of packets held in the (data) bucket
    pub mean_queue_length: f64,
}

impl ShaperReport {
    /// the record of a packet-counting model, `queued` packets were
    /// left in its bucket.
    pub fn packets(outcome: &Outcome<'_>, queued: usize) -> Self {
        let statistics = outcome.statistics;
        let run_time = outcome.window;
        Self {
            seed: outcome.seed,
            run_time,
            arrived: statistics.arrived(),
            dropped: statistics.dropped(),
            transmitted: statistics.transmitted(),
            queued: queued as u64,
            bits_transmitted: None,
            loss_rate: statistics.loss_rate(),
            mean_output_rate: statistics.mean_output_rate(run_time),
            mean_output_bit_rate: None,
            mean_queue_length: statistics.mean_queue_length(run_time),
        }
    }

    /// the record of a bit-counting model
    pub fn bits(outcome: &Outcome<'_>, queued: usize) -> Self {
        let statistics = outcome.statistics;
        Self {
            bits_transmitted: Some(statistics.bits_transmitted()),
            mean_output_bit_rate: Some(statistics.mean_output_bit_rate(outcome.window)),
            ..Self::packets(outcome, queued)
        }
    }
}
