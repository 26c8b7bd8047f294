use crate::{SimError, SimTime};
use anyhow::{bail, ensure};
use logos::{Lexer, Logos};
use std::{fmt, str::FromStr};

/// A transmission or replenishment rate, in bits per second.
///
/// Used for the output rate of the bit-counting leaky bucket, the token
/// rate of the bit-counting token bucket and the link rate of the packet
/// switch.
///
/// Units are decimal (SI): `1kbps` is `1_000` bits per second.
///
/// # Example
///
/// ```
/// # use shaper_core::{BitRate, SimTime};
/// let rate: BitRate = "1mbps".parse().unwrap();
/// assert_eq!(rate.bits_per_sec(), 1_000_000.0);
///
/// // bits that can go through during a 10ms clock period
/// assert_eq!(rate.bits_during(SimTime::from_secs(0.01)), 10_000.0);
/// assert_eq!(rate.to_string(), "1mbps");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BitRate(f64);

const K: f64 = 1_000.0;
const M: f64 = 1_000_000.0;
const G: f64 = 1_000_000_000.0;

impl BitRate {
    /// create a new [`BitRate`] from a number of bits per second.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] if the rate is not a finite
    /// value greater than `0`.
    pub fn new(bits_per_sec: f64) -> Result<Self, SimError> {
        SimError::ensure_positive("bit_rate", bits_per_sec).map(Self)
    }

    /// for constants known to be valid
    pub(crate) const fn from_bits_per_sec(bits_per_sec: f64) -> Self {
        Self(bits_per_sec)
    }

    #[inline]
    pub fn bits_per_sec(self) -> f64 {
        self.0
    }

    /// number of bits that can be processed during `elapsed`.
    #[inline]
    pub fn bits_during(self, elapsed: SimTime) -> f64 {
        self.0 * elapsed.as_secs()
    }

    /// time it takes to push `bits` through at this rate, in seconds.
    #[inline]
    pub fn transmission_time(self, bits: f64) -> f64 {
        bits / self.0
    }
}

impl fmt::Display for BitRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let v = self.0;
        // only switch unit when the value is a whole multiple of it
        if v >= G && (v % G) == 0.0 {
            write!(f, "{}gbps", v / G)
        } else if v >= M && (v % M) == 0.0 {
            write!(f, "{}mbps", v / M)
        } else if v >= K && (v % K) == 0.0 {
            write!(f, "{}kbps", v / K)
        } else {
            write!(f, "{v}bps")
        }
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")] // Ignore this regex pattern between tokens
enum BitRateToken {
    #[regex("bps")]
    Bps,
    #[regex("kbps")]
    Kbps,
    #[regex("mbps")]
    Mbps,
    #[regex("gbps")]
    Gbps,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Value,
}

impl FromStr for BitRate {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex = Lexer::<'_, BitRateToken>::new(s);

        let Some(Ok(BitRateToken::Value)) = lex.next() else {
            bail!("Expecting to parse a number")
        };
        let number: f64 = lex.slice().parse()?;
        let Some(Ok(token)) = lex.next() else {
            bail!("Expecting to parse a unit")
        };
        let bps = match token {
            BitRateToken::Bps => number,
            BitRateToken::Kbps => number * K,
            BitRateToken::Mbps => number * M,
            BitRateToken::Gbps => number * G,
            BitRateToken::Value => bail!("Expecting to parse a unit (bps, kbps, ...)"),
        };

        ensure!(
            lex.next().is_none(),
            "Not expecting any other tokens to parse a bit rate"
        );

        Ok(Self::new(bps)?)
    }
}
