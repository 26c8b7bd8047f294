//! Discrete-event simulation of traffic shapers.
//!
//! This crate simulates the leaky bucket and the token bucket, each in a
//! packet-counting and a bit-counting variant, and a single server packet
//! switch (M/M/1) to check the engine against queueing theory.
//!
//! All the models run on the same engine: a [`Simulation`] pops the
//! earliest event from its [`EventQueue`], integrates the occupancy into
//! the [`RunStatistics`], advances the virtual clock and hands the event
//! to the [`Model`]. A run is single threaded and fully deterministic for
//! a given seed.
//!
//! ```
//! use shaper_core::{LeakyBucketConfig, SimTime};
//!
//! let report = LeakyBucketConfig::default()
//!     .with_bucket_size(1)
//!     .with_run_time(SimTime::from_secs(100.0))
//!     .with_seed(12345)
//!     .build()
//!     .unwrap()
//!     .run();
//!
//! assert!(report.loss_rate < 0.2);
//! assert!((report.mean_output_rate - 100.0).abs() < 20.0);
//! ```

mod bucket;
mod budget;
pub mod defaults;
mod engine;
mod error;
mod event;
pub mod measure;
pub mod model;
mod packet;
mod stats;
mod time;
mod time_queue;
mod variate;

pub use self::{
    bucket::Bucket,
    budget::{Budget, TickAllowance, TokenLevel, TokenPool},
    engine::{Context, Model, Outcome, Simulation, Step},
    error::SimError,
    event::{Event, EventKind},
    measure::{BitRate, PacketSizes},
    model::{
        BitLeakyBucket, BitLeakyBucketConfig, BitTokenBucket, BitTokenBucketConfig, LeakyBucket,
        LeakyBucketConfig, PacketSwitch, PacketSwitchConfig, SwitchReport, TokenBucket,
        TokenBucketConfig,
    },
    packet::{Packet, PacketId, PacketIdGenerator},
    stats::{RunStatistics, ShaperReport},
    time::SimTime,
    time_queue::{EventQueue, Scheduled},
    variate::{Exponential, Variates},
};
