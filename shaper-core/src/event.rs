use crate::Packet;
use std::fmt;

/// An event of the simulation.
///
/// Each variant is one kind of event; the models dispatch on it with a
/// `match`. The events that concern a particular packet carry it: the
/// packet is owned by the event while it is in the queue.
#[derive(Debug)]
pub enum Event {
    /// a packet reaches the shaper (or the switch)
    Arrival(Packet),
    /// a packet has been fully transmitted by the switch's server
    Departure(Packet),
    /// the periodic output clock of the leaky buckets
    ClockTick,
    /// the periodic token generation of the packet-counting token bucket
    TokenTick,
}

/// The kind of an [`Event`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Arrival,
    Departure,
    ClockTick,
    TokenTick,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Arrival(_) => EventKind::Arrival,
            Self::Departure(_) => EventKind::Departure,
            Self::ClockTick => EventKind::ClockTick,
            Self::TokenTick => EventKind::TokenTick,
        }
    }

    /// the packet carried by the event, if any
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            Self::Arrival(packet) | Self::Departure(packet) => Some(packet),
            Self::ClockTick | Self::TokenTick => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Arrival => "ARRIVAL",
            Self::Departure => "DEPARTURE",
            Self::ClockTick => "CLOCK_TICK",
            Self::TokenTick => "TOKEN_TICK",
        };
        f.write_str(name)
    }
}
