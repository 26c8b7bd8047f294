//! The discrete-event engine shared by every model.
//!
//! A [`Simulation`] owns everything a run needs: the [`Model`] state, the
//! [`EventQueue`], the [`Variates`], the [`RunStatistics`] and the virtual
//! clock. Nothing is shared between two simulations, so independent runs
//! can be moved to different threads and executed in parallel.
//!
//! The run loop is:
//!
//! 1. pop the earliest event, stop if there is none;
//! 2. stop if the event is at or after the horizon;
//! 3. update the statistics with the occupancy that held until the event;
//! 4. advance the clock to the time of the event;
//! 5. dispatch the event to the model.
//!
//! The models never block. Waiting for something (the next tick, the end
//! of a transmission) is always expressed by scheduling a future event.

use crate::{
    Event, EventKind, EventQueue, PacketId, PacketIdGenerator, RunStatistics, SimTime, Variates,
};
use tracing::{debug, trace};

/// The behaviour of a simulated system, driven by a [`Simulation`].
pub trait Model {
    /// the result record produced once the run is over
    type Report;

    /// name of the model, used in the logs
    const NAME: &'static str;

    /// schedule the initial events of the run
    fn start(&mut self, ctx: &mut Context<'_>);

    /// handle one event, at time [`Context::now`]
    fn handle(&mut self, event: Event, ctx: &mut Context<'_>);

    /// the number of packets currently held by the model, this is the
    /// value integrated over time by the statistics
    fn occupancy(&self) -> usize;

    /// `true` when the model has reached its own termination condition
    /// (other than time)
    fn is_finished(&self) -> bool {
        false
    }

    /// build the result record
    fn report(&self, outcome: &Outcome<'_>) -> Self::Report;
}

/// What a [`Model`] can access while it handles an event.
pub struct Context<'a> {
    now: SimTime,
    queue: &'a mut EventQueue,
    variates: &'a mut Variates,
    stats: &'a mut RunStatistics,
    packet_ids: &'a mut PacketIdGenerator,
}

/// The state of the run at the time it is turned into a report.
#[derive(Debug, Clone, Copy)]
pub struct Outcome<'a> {
    pub statistics: &'a RunStatistics,
    /// the averaging window of the time-weighted statistics
    pub window: SimTime,
    /// the time of the last dispatched event
    pub clock: SimTime,
    pub seed: u64,
}

/// The result of one [`Simulation::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// an event was dispatched to the model
    Dispatched { time: SimTime, kind: EventKind },
    /// the run is over, further calls to `step` do nothing
    Finished,
}

/// One simulation run of a [`Model`].
///
/// Created by the `build` function of the model's configuration.
///
/// ```
/// use shaper_core::LeakyBucketConfig;
///
/// let report = LeakyBucketConfig::default()
///     .with_bucket_size(5)
///     .with_run_time("10s".parse().unwrap())
///     .with_seed(12345)
///     .build()
///     .unwrap()
///     .run();
///
/// assert_eq!(report.arrived, report.transmitted + report.dropped + report.queued);
/// ```
pub struct Simulation<M> {
    model: M,
    clock: SimTime,
    queue: EventQueue,
    variates: Variates,
    stats: RunStatistics,
    packet_ids: PacketIdGenerator,

    started: bool,
    finished: bool,
}

impl Context<'_> {
    /// the current time of the simulation
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    #[inline]
    pub fn horizon(&self) -> SimTime {
        self.queue.horizon()
    }

    /// `true` if an event at `time` would be scheduled
    #[inline]
    pub fn accepts(&self, time: SimTime) -> bool {
        self.queue.accepts(time)
    }

    /// schedule `event` at `time`, returns `false` if it is at or after
    /// the horizon and was discarded.
    pub fn schedule(&mut self, time: SimTime, event: Event) -> bool {
        debug_assert!(
            self.now <= time,
            "cannot schedule {time} in the past ({now})",
            now = self.now
        );
        self.queue.schedule(time, event)
    }

    /// schedule `event` in `delay` seconds from now.
    pub fn schedule_in(&mut self, delay: f64, event: Event) -> bool {
        self.schedule(self.now + delay, event)
    }

    #[inline]
    pub fn variates(&mut self) -> &mut Variates {
        self.variates
    }

    #[inline]
    pub fn stats(&mut self) -> &mut RunStatistics {
        self.stats
    }

    #[inline]
    pub fn next_packet_id(&mut self) -> PacketId {
        self.packet_ids.generate()
    }
}

impl<M: Model> Simulation<M> {
    pub(crate) fn new(model: M, horizon: SimTime, seed: Option<u64>) -> Self {
        Self {
            model,
            clock: SimTime::ZERO,
            queue: EventQueue::new(horizon),
            variates: Variates::new(seed),
            stats: RunStatistics::new(),
            packet_ids: PacketIdGenerator::new(),
            started: false,
            finished: false,
        }
    }

    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// time of the last dispatched event
    #[inline]
    pub fn clock(&self) -> SimTime {
        self.clock
    }

    #[inline]
    pub fn horizon(&self) -> SimTime {
        self.queue.horizon()
    }

    #[inline]
    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    /// the seed of the run (given or drawn at construction)
    #[inline]
    pub fn seed(&self) -> u64 {
        self.variates.seed()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// the number of events waiting in the queue
    #[inline]
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    fn context(&mut self) -> (&mut M, Context<'_>) {
        let ctx = Context {
            now: self.clock,
            queue: &mut self.queue,
            variates: &mut self.variates,
            stats: &mut self.stats,
            packet_ids: &mut self.packet_ids,
        };
        (&mut self.model, ctx)
    }

    fn start(&mut self) {
        self.started = true;

        debug!(
            model = M::NAME,
            seed = self.seed(),
            horizon = %self.horizon(),
            "simulation started"
        );

        let (model, mut ctx) = self.context();
        model.start(&mut ctx);
    }

    fn finish(&mut self) -> Step {
        if !self.finished {
            self.finished = true;

            // close the averaging window
            let end = self.window();
            self.stats.on_event(end, self.model.occupancy());

            debug!(
                model = M::NAME,
                clock = %self.clock,
                arrived = self.stats.arrived(),
                dropped = self.stats.dropped(),
                transmitted = self.stats.transmitted(),
                "simulation finished"
            );
        }
        Step::Finished
    }

    /// dispatch the next event.
    ///
    /// The first call also schedules the initial events of the model.
    pub fn step(&mut self) -> Step {
        if !self.started {
            self.start();
        }
        if self.finished || self.model.is_finished() {
            return self.finish();
        }

        let Some(scheduled) = self.queue.pop_earliest() else {
            return self.finish();
        };
        let time = scheduled.time();
        if !self.queue.accepts(time) {
            return self.finish();
        }

        let kind = scheduled.event().kind();
        self.stats.on_event(time, self.model.occupancy());
        self.clock = time;

        trace!(
            model = M::NAME,
            time = %time,
            event = %kind,
            occupancy = self.model.occupancy(),
            "dispatch"
        );

        let (model, mut ctx) = self.context();
        model.handle(scheduled.into_event(), &mut ctx);

        Step::Dispatched { time, kind }
    }

    /// drive the simulation until it terminates and return the report.
    pub fn run(mut self) -> M::Report {
        while let Step::Dispatched { .. } = self.step() {}
        self.report()
    }

    /// the report of the run.
    ///
    /// While the run is still in progress the statistics are only accurate
    /// up to the last dispatched event.
    pub fn report(&self) -> M::Report {
        let outcome = Outcome {
            statistics: &self.stats,
            window: self.window(),
            clock: self.clock,
            seed: self.seed(),
        };
        self.model.report(&outcome)
    }

    /// the horizon once a time-bounded run is over, the clock otherwise
    fn window(&self) -> SimTime {
        let horizon = self.horizon();
        if self.finished && horizon.is_finite() {
            horizon
        } else {
            self.clock
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Packet;

    /// a single arrival every second, each held for half a second
    struct Ticker {
        held: usize,
        handled: Vec<(SimTime, EventKind)>,
    }

    impl Model for Ticker {
        type Report = (u64, f64, SimTime);
        const NAME: &'static str = "ticker";

        fn start(&mut self, ctx: &mut Context<'_>) {
            let id = ctx.next_packet_id();
            ctx.schedule(SimTime::ZERO, Event::Arrival(Packet::unit(id, SimTime::ZERO)));
        }

        fn handle(&mut self, event: Event, ctx: &mut Context<'_>) {
            self.handled.push((ctx.now(), event.kind()));
            match event {
                Event::Arrival(packet) => {
                    ctx.stats().record_arrival();
                    self.held += 1;
                    ctx.schedule_in(0.5, Event::Departure(packet));

                    let id = ctx.next_packet_id();
                    let next = ctx.now() + 1.0;
                    ctx.schedule(next, Event::Arrival(Packet::unit(id, next)));
                }
                Event::Departure(_) => {
                    ctx.stats().record_transmission();
                    self.held -= 1;
                }
                Event::ClockTick | Event::TokenTick => unreachable!(),
            }
        }

        fn occupancy(&self) -> usize {
            self.held
        }

        fn report(&self, outcome: &Outcome<'_>) -> Self::Report {
            (
                outcome.statistics.transmitted(),
                outcome.statistics.mean_queue_length(outcome.window),
                outcome.window,
            )
        }
    }

    fn ticker(horizon: f64) -> Simulation<Ticker> {
        let model = Ticker {
            held: 0,
            handled: Vec::new(),
        };
        Simulation::new(model, SimTime::from_secs(horizon), Some(1))
    }

    #[test]
    fn events_in_time_order() {
        let mut sim = ticker(2.0);

        while let Step::Dispatched { .. } = sim.step() {}

        let handled = &sim.model().handled;
        assert_eq!(
            handled,
            &vec![
                (SimTime::from_secs(0.0), EventKind::Arrival),
                (SimTime::from_secs(0.5), EventKind::Departure),
                (SimTime::from_secs(1.0), EventKind::Arrival),
                (SimTime::from_secs(1.5), EventKind::Departure),
            ]
        );
        assert_eq!(sim.clock(), SimTime::from_secs(1.5));
        assert!(sim.is_finished());
        assert_eq!(sim.step(), Step::Finished);
    }

    #[test]
    fn window_closed_at_horizon() {
        let (transmitted, mean, window) = ticker(2.0).run();

        assert_eq!(transmitted, 2);
        assert_eq!(window, SimTime::from_secs(2.0));
        // one packet held half of the time
        assert_eq!(mean, 0.5);
    }

    #[test]
    fn statistics_follow_the_clock() {
        let mut sim = ticker(10.0);
        for _ in 0..5 {
            sim.step();
            assert_eq!(sim.statistics().last_update_time(), sim.clock());
        }
    }
}
