use crate::{Packet, SimTime};

/// A resource a packet needs before it can leave a bucket.
///
/// The models differ only in what the resource is (one slot per clock
/// tick, a number of bits per tick, whole tokens, a continuous level of
/// bit tokens) and in how it is replenished. Draining the bucket is the
/// same for all of them: see [`Bucket::drain`].
///
/// [`Bucket::drain`]: crate::Bucket::drain
pub trait Budget {
    /// `true` if there is enough of the resource to transmit `packet`
    fn covers(&self, packet: &Packet) -> bool;

    /// take what `packet` needs from the resource.
    ///
    /// Only called after [`Budget::covers`] returned `true` for the
    /// same packet.
    fn consume(&mut self, packet: &Packet);
}

/// The allowance of one tick of a leaky bucket's output clock.
///
/// It is created fresh on every tick and dropped at the end of it: what
/// is not used during the tick is lost.
///
/// With [`Packet::unit`] packets and an allowance of `1` this transmits
/// exactly one packet per tick. With an allowance of `n` bits it
/// transmits as many packets as fit in `n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickAllowance {
    remaining: f64,
}

/// A pool of whole tokens, one token per packet.
///
/// Tokens are added one at a time by the token clock, and are lost when
/// the pool is already full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPool {
    tokens: u64,
    capacity: u64,
}

/// A real-valued level of bit tokens accruing continuously.
///
/// There is no token clock: the level is brought up to date on demand
/// with [`TokenLevel::advance_to`] by adding `elapsed × rate` bits,
/// clamped to the capacity. A packet consumes as many bits as its size.
///
/// The level is always within `[0, capacity]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenLevel {
    level: f64,
    capacity: f64,
    rate: f64,
    last_update: SimTime,
}

impl TickAllowance {
    pub fn new(amount: f64) -> Self {
        Self { remaining: amount }
    }

    #[inline]
    pub fn remaining(&self) -> f64 {
        self.remaining
    }
}

impl Budget for TickAllowance {
    fn covers(&self, packet: &Packet) -> bool {
        self.remaining >= packet.size()
    }

    fn consume(&mut self, packet: &Packet) {
        self.remaining -= packet.size();
    }
}

impl TokenPool {
    /// an empty pool that can hold up to `capacity` tokens.
    pub fn empty(capacity: u64) -> Self {
        Self {
            tokens: 0,
            capacity,
        }
    }

    #[inline]
    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// add one token, returns `false` if the pool was full and the token
    /// was lost.
    pub fn add_token(&mut self) -> bool {
        if self.tokens < self.capacity {
            self.tokens += 1;
            true
        } else {
            false
        }
    }
}

impl Budget for TokenPool {
    fn covers(&self, _packet: &Packet) -> bool {
        self.tokens > 0
    }

    fn consume(&mut self, _packet: &Packet) {
        debug_assert!(self.tokens > 0);
        self.tokens -= 1;
    }
}

impl TokenLevel {
    /// a full level of `capacity` bits at time `0`, accruing `rate` bits
    /// per second.
    pub fn full(capacity: f64, rate: f64) -> Self {
        Self {
            level: capacity,
            capacity,
            rate,
            last_update: SimTime::ZERO,
        }
    }

    #[inline]
    pub fn level(&self) -> f64 {
        self.level
    }

    #[inline]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    #[inline]
    pub fn last_update(&self) -> SimTime {
        self.last_update
    }

    /// accrue the tokens generated between the last update and `now`.
    pub fn advance_to(&mut self, now: SimTime) {
        let elapsed = now.elapsed_since(self.last_update);
        self.level = (self.level + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }
}

impl Budget for TokenLevel {
    fn covers(&self, packet: &Packet) -> bool {
        self.level >= packet.size()
    }

    fn consume(&mut self, packet: &Packet) {
        debug_assert!(self.level >= packet.size());
        // guard the invariant against rounding
        self.level = (self.level - packet.size()).max(0.0);
    }
}
