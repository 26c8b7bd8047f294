use crate::{Context, Event, Exponential, Packet, PacketSizes};

/// How the size of an arriving packet is chosen.
#[derive(Debug, Clone)]
pub(crate) enum SizeDistribution {
    /// one unit, the packet-counting models
    Unit,
    /// one of the sizes with equal probability
    Choice(PacketSizes),
    /// exponentially distributed number of bits
    Exponential(Exponential),
}

/// A Poisson arrival process.
///
/// Each arrival schedules the next one: the inter-arrival times are
/// exponential with mean `1 / rate`. The packet is created, with its
/// size, at the time its arrival is sampled and travels in the
/// [`Event::Arrival`].
#[derive(Debug, Clone)]
pub(crate) struct PoissonArrivals {
    interarrival: Exponential,
    sizes: SizeDistribution,
}

impl PoissonArrivals {
    pub(crate) fn new(interarrival: Exponential, sizes: SizeDistribution) -> Self {
        Self {
            interarrival,
            sizes,
        }
    }

    /// schedule the next arrival after the current time.
    ///
    /// Returns `false` if the arrival would have been at or after the
    /// horizon: the process then stops.
    pub(crate) fn schedule_next(&self, ctx: &mut Context<'_>) -> bool {
        let at = ctx.now() + ctx.variates().sample(&self.interarrival);
        if !ctx.accepts(at) {
            return false;
        }

        let id = ctx.next_packet_id();
        let packet = match &self.sizes {
            SizeDistribution::Unit => Packet::unit(id, at),
            SizeDistribution::Choice(sizes) => {
                let bits = ctx.variates().packet_size(sizes);
                Packet::with_bits(id, at, bits as f64)
            }
            SizeDistribution::Exponential(distribution) => {
                let bits = ctx.variates().sample(distribution);
                Packet::with_bits(id, at, bits)
            }
        };

        ctx.schedule(at, Event::Arrival(packet))
    }
}
