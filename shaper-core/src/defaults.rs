//! The reference parameters of the models.
//!
//! These are the values every configuration starts from (see the
//! `Default` implementation of each `*Config`). They come from the
//! traffic-shaping lab this crate reproduces: a shaper fed with
//! `100` packets per second for `1000` seconds.

use crate::{BitRate, SimTime};

/// Default run horizon of the shaping models
///
/// ```
/// # use shaper_core::defaults::*;
/// assert_eq!(DEFAULT_RUN_TIME.to_string(), "1000s");
/// ```
pub const DEFAULT_RUN_TIME: SimTime = SimTime::from_secs(1_000.0);

/// Default Poisson arrival rate, in packets per second
pub const DEFAULT_ARRIVAL_RATE: f64 = 100.0;

/// Default seed of the leaky bucket runs
pub const DEFAULT_LEAKY_BUCKET_SEED: u64 = 12_345;

/// Default seed of the token bucket runs
pub const DEFAULT_TOKEN_BUCKET_SEED: u64 = 400_430_923;

/// Default output rate (`R`) of the packet-counting leaky bucket, in
/// packets per second
pub const DEFAULT_OUTPUT_RATE: f64 = 1_000.0;

/// Default bucket size (`B`) of the packet-counting leaky bucket, in
/// packets
pub const DEFAULT_BUCKET_SIZE: u64 = 3;

/// Default output rate of the bit-counting leaky bucket
///
/// ```
/// # use shaper_core::defaults::*;
/// assert_eq!(DEFAULT_BIT_OUTPUT_RATE.to_string(), "1mbps");
/// ```
pub const DEFAULT_BIT_OUTPUT_RATE: BitRate = BitRate::from_bits_per_sec(1_000_000.0);

/// Default bucket size of the bit-counting leaky bucket, in packets
pub const DEFAULT_BIT_BUCKET_SIZE: u64 = 50;

/// Default clock period (`T`) of the bit-counting leaky bucket
///
/// With the default output rate it allows `n = R × T = 10_000` bits per
/// tick.
pub const DEFAULT_CLOCK_PERIOD: SimTime = SimTime::from_secs(0.01);

/// Default packet sizes of the bit-counting models, in bits
///
/// ```
/// # use shaper_core::defaults::*;
/// # use shaper_core::PacketSizes;
/// let sizes = PacketSizes::new(DEFAULT_PACKET_SIZES.to_vec()).unwrap();
/// assert_eq!(sizes.mean(), 1_500.0);
/// ```
pub const DEFAULT_PACKET_SIZES: [u64; 5] = [500, 1_000, 1_500, 2_000, 2_500];

/// Default token bucket size (`Bt`) of the packet-counting token bucket,
/// in tokens
pub const DEFAULT_TOKEN_BUCKET_SIZE: u64 = 20;

/// Default data bucket size (`Bd`) of both token buckets, in packets
pub const DEFAULT_DATA_BUCKET_SIZE: u64 = 20;

/// Default token rate of the packet-counting token bucket, in tokens
/// per second
pub const DEFAULT_TOKEN_RATE: f64 = 100.0;

/// Default token bucket size of the bit-counting token bucket, in bits
pub const DEFAULT_TOKEN_BUCKET_BITS: u64 = 10_000;

/// Default token rate of the bit-counting token bucket
///
/// ```
/// # use shaper_core::defaults::*;
/// assert_eq!(DEFAULT_BIT_TOKEN_RATE.to_string(), "200kbps");
/// ```
pub const DEFAULT_BIT_TOKEN_RATE: BitRate = BitRate::from_bits_per_sec(200_000.0);

/// Default link rate (`C`) of the packet switch
pub const DEFAULT_LINK_RATE: BitRate = BitRate::from_bits_per_sec(1_000_000.0);

/// Default mean packet size of the packet switch, in bits
pub const DEFAULT_MEAN_PACKET_SIZE: f64 = 1_000.0;

/// Default number of departures after which the packet switch stops
pub const DEFAULT_RUN_LENGTH: u64 = 100_000;

/// Default arrival rate of the packet switch, in packets per second
///
/// A load of `0.5` with the default link rate and mean packet size.
pub const DEFAULT_SWITCH_ARRIVAL_RATE: f64 = 500.0;
