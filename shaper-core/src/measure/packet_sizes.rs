use crate::{defaults::DEFAULT_PACKET_SIZES, SimError};
use anyhow::{bail, ensure};
use logos::{Lexer, Logos};
use std::{fmt, str::FromStr};

/// The finite set of packet sizes (in bits) the bit-counting models
/// draw from.
///
/// Each arriving packet picks one of the sizes with equal probability
/// (see [`Variates::choose`]). The order of the sizes is preserved as
/// given: it is part of what makes a seeded run reproducible.
///
/// ```
/// # use shaper_core::PacketSizes;
/// let sizes: PacketSizes = "500, 1000, 1500, 2000, 2500".parse().unwrap();
/// assert_eq!(sizes.len(), 5);
/// assert_eq!(sizes.mean(), 1500.0);
/// assert_eq!(sizes.to_string(), "500,1000,1500,2000,2500");
/// ```
///
/// [`Variates::choose`]: crate::Variates::choose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketSizes(Vec<u64>);

impl PacketSizes {
    /// create the set of sizes, in bits.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptyDomain`] if `sizes` is empty.
    pub fn new(sizes: Vec<u64>) -> Result<Self, SimError> {
        if sizes.is_empty() {
            return Err(SimError::EmptyDomain {
                name: "packet_sizes",
            });
        }
        Ok(Self(sizes))
    }

    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// the mean packet size, in bits
    pub fn mean(&self) -> f64 {
        self.0.iter().map(|size| *size as f64).sum::<f64>() / self.0.len() as f64
    }

    /// the largest packet size, in bits
    pub fn max(&self) -> u64 {
        self.0.iter().copied().max().unwrap_or_default()
    }
}

impl Default for PacketSizes {
    fn default() -> Self {
        Self(DEFAULT_PACKET_SIZES.to_vec())
    }
}

impl fmt::Display for PacketSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sizes = self.0.iter();
        if let Some(first) = sizes.next() {
            write!(f, "{first}")?;
        }
        for size in sizes {
            write!(f, ",{size}")?;
        }
        Ok(())
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")] // Ignore this regex pattern between tokens
enum SizeToken {
    #[token(",")]
    Separator,

    #[regex("[0-9]+")]
    Value,
}

impl FromStr for PacketSizes {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex = Lexer::<'_, SizeToken>::new(s);
        let mut sizes: Vec<u64> = Vec::new();

        loop {
            let Some(Ok(SizeToken::Value)) = lex.next() else {
                bail!("Expecting to parse a packet size (in bits): {s}")
            };
            sizes.push(lex.slice().parse()?);

            match lex.next() {
                None => break,
                Some(Ok(SizeToken::Separator)) => continue,
                Some(_) => bail!("Expecting `,' between packet sizes: {s}"),
            }
        }

        ensure!(!sizes.is_empty(), "Expecting at least one packet size");

        Ok(Self::new(sizes)?)
    }
}
