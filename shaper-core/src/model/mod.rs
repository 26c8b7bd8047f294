//! The traffic-shaping models and the packet switch.
//!
//! Every model comes with its configuration. The configuration's `build`
//! validates the parameters and returns a [`Simulation`] ready to run.
//!
//! | model                | counts  | output driven by               |
//! |----------------------|---------|--------------------------------|
//! | [`LeakyBucket`]      | packets | a clock tick, one packet       |
//! | [`BitLeakyBucket`]   | bits    | a clock tick, `R × T` bits     |
//! | [`TokenBucket`]      | packets | a token clock, one token each  |
//! | [`BitTokenBucket`]   | bits    | a continuous level of tokens   |
//! | [`PacketSwitch`]     | bits    | a single server (M/M/1)        |
//!
//! [`Simulation`]: crate::Simulation

mod arrivals;
mod bit_leaky_bucket;
mod bit_token_bucket;
mod leaky_bucket;
mod packet_switch;
mod token_bucket;

pub use self::{
    bit_leaky_bucket::{BitLeakyBucket, BitLeakyBucketConfig},
    bit_token_bucket::{BitTokenBucket, BitTokenBucketConfig},
    leaky_bucket::{LeakyBucket, LeakyBucketConfig},
    packet_switch::{PacketSwitch, PacketSwitchConfig, SwitchReport},
    token_bucket::{TokenBucket, TokenBucketConfig},
};
