use crate::{Event, SimTime};
use core::cmp::Reverse;
use std::collections::BinaryHeap;

/// The future event list of a simulation run.
///
/// A min-priority queue of events ordered by their due time. Events due
/// at the same time are returned in the order they were scheduled: every
/// scheduled event is stamped with a sequence number that breaks the tie.
/// This is what makes a seeded run fully deterministic.
///
/// The queue knows the horizon of the run: an event due at or after the
/// horizon is discarded at the time it is scheduled rather than
/// at the time it would have been dispatched.
///
/// There is no cancellation: once scheduled an event will be returned
/// by [`EventQueue::pop_earliest`].
pub struct EventQueue {
    map: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
    horizon: SimTime,
}

/// An [`Event`] with its due time, as stored in the [`EventQueue`].
#[derive(Debug)]
pub struct Scheduled {
    time: SimTime,
    seq: u64,
    event: Event,
}

impl Scheduled {
    #[inline]
    pub fn time(&self) -> SimTime {
        self.time
    }

    #[inline]
    pub fn event(&self) -> &Event {
        &self.event
    }

    #[inline]
    pub fn into_event(self) -> Event {
        self.event
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl EventQueue {
    /// create an empty queue, events due at or after `horizon` will not
    /// be scheduled.
    pub fn new(horizon: SimTime) -> Self {
        Self {
            map: BinaryHeap::new(),
            next_seq: 0,
            horizon,
        }
    }

    /// a queue without horizon, for runs that terminate on another
    /// condition than time.
    pub fn unbounded() -> Self {
        Self::new(SimTime::INFINITY)
    }

    #[inline]
    pub fn horizon(&self) -> SimTime {
        self.horizon
    }

    /// `true` if an event due at `time` would be accepted.
    #[inline]
    pub fn accepts(&self, time: SimTime) -> bool {
        time < self.horizon
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn time_to_next_event(&self) -> Option<SimTime> {
        self.map.peek().map(|v| v.0.time)
    }

    /// insert the `event` due at `time`.
    ///
    /// Returns `false` if the event was discarded because `time` is at or
    /// after the horizon.
    pub fn schedule(&mut self, time: SimTime, event: Event) -> bool {
        if !self.accepts(time) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        self.map.push(Reverse(Scheduled { time, seq, event }));
        true
    }

    /// remove and return the event with the earliest due time.
    pub fn pop_earliest(&mut self) -> Option<Scheduled> {
        self.map.pop().map(|v| v.0)
    }
}
