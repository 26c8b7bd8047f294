use anyhow::{anyhow, bail, ensure, Result};
use core::fmt;
use logos::{Lexer, Logos};
use std::{cmp::Ordering, ops::Add, str::FromStr};

/// A point on the virtual clock of a simulation run, in seconds.
///
/// The clock of every run starts at [`SimTime::ZERO`] and only moves
/// forward. Unlike [`std::time::Duration`] the value is a real number:
/// inter-arrival samples and service times are continuous.
///
/// [`SimTime`] has a total order (see [`f64::total_cmp`]) so it can be
/// used as the key of the event queue.
///
/// ```
/// # use shaper_core::SimTime;
/// let t: SimTime = "1s 500ms".parse().unwrap();
/// assert_eq!(t, SimTime::from_secs(1.5));
/// assert_eq!(t.to_string(), "1.5s");
/// ```
#[derive(Clone, Copy, Default)]
pub struct SimTime(f64);

impl SimTime {
    /// The beginning of every run.
    pub const ZERO: Self = Self(0.0);

    /// A horizon that is never reached.
    pub const INFINITY: Self = Self(f64::INFINITY);

    #[inline]
    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    #[inline]
    pub const fn as_secs(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// seconds elapsed between `earlier` and `self`.
    ///
    /// The clock only moves forward so `earlier` is expected to be lesser
    /// or equal to `self`.
    #[inline]
    pub fn elapsed_since(self, earlier: Self) -> f64 {
        debug_assert!(earlier <= self, "{earlier} is after {self}");
        self.0 - earlier.0
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        if self <= other { self } else { other }
    }
}

impl Add<f64> for SimTime {
    type Output = SimTime;

    #[inline]
    fn add(self, secs: f64) -> Self::Output {
        Self(self.0 + secs)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Debug for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimTime({}s)", self.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl FromStr for SimTime {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex = Lexer::<'_, Token>::new(s);

        let mut total = 0.0;
        let mut parsed_any = false;

        while let Some(next) = lex.next() {
            let number: Token = next.map_err(|()| anyhow!("Failed to parse: {s}"))?;

            ensure!(
                number == Token::Value,
                "Expecting time to starts with number. Cannot parse {s}"
            );
            let number: f64 = lex.slice().parse()?;

            let Some(Ok(measure)) = lex.next() else {
                bail!("Expecting a measure, failed to parse: {s}")
            };
            let secs = match measure {
                Token::NanoSeconds => number * 1e-9,
                Token::MicroSeconds => number * 1e-6,
                Token::MilliSeconds => number * 1e-3,
                Token::Seconds => number,
                Token::Minutes => number * 60.0,
                Token::Value => bail!("Failed to parse `{s}', expecting a measure."),
            };
            total += secs;
            parsed_any = true;
        }

        ensure!(parsed_any, "Expecting a time, the input is empty");

        Ok(Self(total))
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")] // Ignore this regex pattern between tokens
enum Token {
    #[token("ns")]
    NanoSeconds,
    #[regex("us|μs")]
    MicroSeconds,
    #[token("ms")]
    MilliSeconds,
    #[token("s")]
    Seconds,
    #[token("m")]
    Minutes,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Value,
}
