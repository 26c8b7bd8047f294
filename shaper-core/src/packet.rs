use crate::SimTime;
use std::fmt;

/// a generator for monotonicaly increasing **unique** [`PacketId`]
///
/// Each [`Simulation`] owns its generator: identifiers are unique within
/// a run and restart at `1` for every new run.
///
/// [`Simulation`]: crate::Simulation
#[derive(Debug, Clone)]
pub struct PacketIdGenerator(u64);

/// # [`Packet`] Identifier
///
/// During the lifetime of the packet, this identifier can uniquely
/// identify the packet within its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketId(u64);

/// # A simulated packet
///
/// A packet is created when its arrival is sampled and is owned by
/// whatever holds it: the arrival event, then the bucket (or the switch
/// queue), then the departure event. It is moved along, never copied,
/// and dropped once its outcome (transmitted or dropped) has been
/// accounted for.
///
/// The `size` is in bits for the bit-counting models and the switch. The
/// packet-counting models use [`Packet::unit`] packets: a size of `1`
/// meaning "one packet".
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    id: PacketId,
    arrival_time: SimTime,
    size: f64,
    service_start_time: Option<SimTime>,
    departure_time: Option<SimTime>,
}

impl PacketIdGenerator {
    pub fn new() -> Self {
        Self(1)
    }

    /// generate a new unique identifier
    pub fn generate(&mut self) -> PacketId {
        let id = self.0;
        self.0 = self.0.wrapping_add(1);

        debug_assert!(
            id != 0,
            "The only case this can be equal to 0 is if the generator overflowed. \
            This would mean we have generated `u64::MAX` packets in a single run."
        );

        PacketId(id)
    }
}

impl Default for PacketIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketId {
    /// a _NULL_ packet identifier (i.e. doesn't have a packet to it)
    #[cfg(test)]
    pub(crate) const NULL: Self = Self(0);
}

impl Packet {
    /// a packet of the packet-counting models, its size is one unit.
    pub fn unit(id: PacketId, arrival_time: SimTime) -> Self {
        Self::with_bits(id, arrival_time, 1.0)
    }

    /// a packet of `bits` size.
    pub fn with_bits(id: PacketId, arrival_time: SimTime, bits: f64) -> Self {
        Self {
            id,
            arrival_time,
            size: bits,
            service_start_time: None,
            departure_time: None,
        }
    }

    #[inline]
    pub fn id(&self) -> PacketId {
        self.id
    }

    #[inline]
    pub fn arrival_time(&self) -> SimTime {
        self.arrival_time
    }

    /// the size of the packet: bits, or `1` for unit packets.
    #[inline]
    pub fn size(&self) -> f64 {
        self.size
    }

    #[inline]
    pub fn service_start_time(&self) -> Option<SimTime> {
        self.service_start_time
    }

    #[inline]
    pub fn departure_time(&self) -> Option<SimTime> {
        self.departure_time
    }

    pub(crate) fn start_service(&mut self, now: SimTime) {
        debug_assert!(self.service_start_time.is_none(), "service started twice");
        self.service_start_time = Some(now);
    }

    pub(crate) fn depart(&mut self, now: SimTime) {
        debug_assert!(self.departure_time.is_none(), "packet departed twice");
        self.departure_time = Some(now);
    }

    /// time spent waiting in the queue before the service started.
    pub fn queue_delay(&self) -> Option<f64> {
        self.service_start_time
            .map(|start| start.elapsed_since(self.arrival_time))
    }

    /// time spent being served (transmitted on the link).
    pub fn service_time(&self) -> Option<f64> {
        let start = self.service_start_time?;
        let departure = self.departure_time?;
        Some(departure.elapsed_since(start))
    }

    /// time between the arrival and the departure of the packet.
    pub fn total_delay(&self) -> Option<f64> {
        self.departure_time
            .map(|departure| departure.elapsed_since(self.arrival_time))
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_id_null() {
        let null = PacketId::NULL;

        assert_eq!(null, PacketId(0));
        assert_eq!(null.to_string(), "0x0000000000000000");
        assert_eq!(format!("{null:?}"), "PacketId(0)");
    }

    #[test]
    fn generator_is_monotonic() {
        let mut generator = PacketIdGenerator::new();
        let first = generator.generate();
        let second = generator.generate();

        assert_eq!(first, PacketId(1));
        assert!(first < second);
    }

    #[test]
    fn delays() {
        let mut packet = Packet::with_bits(
            PacketIdGenerator::new().generate(),
            SimTime::from_secs(1.0),
            1_000.0,
        );
        assert_eq!(packet.queue_delay(), None);
        assert_eq!(packet.total_delay(), None);

        packet.start_service(SimTime::from_secs(1.5));
        packet.depart(SimTime::from_secs(2.0));

        assert_eq!(packet.queue_delay(), Some(0.5));
        assert_eq!(packet.service_time(), Some(0.5));
        assert_eq!(packet.total_delay(), Some(1.0));
    }

    #[test]
    fn unit_packet() {
        let packet = Packet::unit(PacketId::NULL, SimTime::ZERO);
        assert_eq!(packet.size(), 1.0);
        assert_eq!(packet.arrival_time(), SimTime::ZERO);
    }
}
