use crate::{PacketSizes, SimError};
use rand_chacha::ChaChaRng;
use rand_core::{Rng, SeedableRng as _};
use rand_distr::{Distribution as _, Exp};

/// The single source of randomness of a simulation run.
///
/// Every sample of a run (inter-arrival times, packet sizes) is drawn
/// from the same [`ChaChaRng`], never reseeded between calls. Two runs
/// built with the same seed and the same parameters therefore produce
/// exactly the same results.
///
/// When no seed is given a random one is drawn from the system's entropy;
/// it is still recorded and available through [`Variates::seed`] so
/// the run can be replayed.
///
/// # Example
///
/// ```
/// use shaper_core::Variates;
///
/// let mut a = Variates::new(Some(42));
/// let mut b = Variates::new(Some(42));
///
/// assert_eq!(a.exponential(0.01).unwrap(), b.exponential(0.01).unwrap());
/// assert!(a.exponential(0.0).is_err());
/// ```
pub struct Variates {
    seed: u64,
    rng: ChaChaRng,
}

/// A validated exponential distribution.
///
/// Constructing the distribution checks the mean once so sampling
/// from within the event loop cannot fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    mean: f64,
    exp: Exp<f64>,
}

impl Exponential {
    /// # Errors
    ///
    /// [`SimError::InvalidParameter`] if `mean` is not a finite value
    /// greater than `0`.
    pub fn with_mean(mean: f64) -> Result<Self, SimError> {
        let mean = SimError::ensure_positive("mean", mean)?;
        Self::new("mean", mean, 1.0 / mean)
    }

    /// the exponential distribution of the inter-arrival times of a
    /// Poisson process of the given `rate` (events per second).
    pub fn with_rate(rate: f64) -> Result<Self, SimError> {
        let rate = SimError::ensure_positive("rate", rate)?;
        Self::new("rate", rate, rate)
    }

    fn new(name: &'static str, value: f64, rate: f64) -> Result<Self, SimError> {
        let exp = Exp::new(rate).map_err(|_| SimError::InvalidParameter {
            name,
            value,
            reason: "not a valid exponential distribution",
        })?;
        Ok(Self {
            mean: 1.0 / rate,
            exp,
        })
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }
}

impl Variates {
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random::<u64>);
        Self {
            seed,
            rng: ChaChaRng::seed_from_u64(seed),
        }
    }

    /// the seed this generator was created with.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// uniform sample in `[0, 1)`
    ///
    /// Uses the 53 most significant bits of the generator's output so
    /// every value is exactly representable and `1.0` is never returned.
    pub fn uniform(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
        (self.rng.next_u64() >> 11) as f64 * SCALE
    }

    /// sample the given exponential distribution.
    pub fn sample(&mut self, distribution: &Exponential) -> f64 {
        distribution.exp.sample(&mut self.rng)
    }

    /// sample an exponential distribution of the given `mean`.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidParameter`] if `mean` is lesser or equal to `0`.
    pub fn exponential(&mut self, mean: f64) -> Result<f64, SimError> {
        let distribution = Exponential::with_mean(mean)?;
        Ok(self.sample(&distribution))
    }

    /// pick one of the `values` with equal probability.
    ///
    /// # Errors
    ///
    /// [`SimError::EmptyDomain`] if `values` is empty.
    pub fn choose<'a, T>(&mut self, values: &'a [T]) -> Result<&'a T, SimError> {
        if values.is_empty() {
            return Err(SimError::EmptyDomain { name: "values" });
        }
        Ok(&values[self.index(values.len())])
    }

    /// pick one of the packet sizes, in bits, with equal probability.
    ///
    /// [`PacketSizes`] is never empty, see [`PacketSizes::new`].
    pub fn packet_size(&mut self, sizes: &PacketSizes) -> u64 {
        self.choose(sizes.as_slice()).map_or(0, |size| *size)
    }

    /// uniform index in `0..len` (multiply-shift, `len > 0`).
    fn index(&mut self, len: usize) -> usize {
        ((self.rng.next_u64() as u128 * len as u128) >> 64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproducible_with_same_seed() {
        let sample = |seed| {
            let mut variates = Variates::new(Some(seed));
            (0..100)
                .map(|_| variates.exponential(0.5).unwrap())
                .collect::<Vec<_>>()
        };

        assert_eq!(sample(99), sample(99));
        assert_ne!(sample(99), sample(100));
    }

    #[test]
    fn unseeded_records_its_seed() {
        let mut variates = Variates::new(None);
        let mut replay = Variates::new(Some(variates.seed()));

        assert_eq!(variates.uniform(), replay.uniform());
    }

    #[test]
    fn uniform_range() {
        let mut variates = Variates::new(Some(42));
        for _ in 0..10_000 {
            let u = variates.uniform();
            assert!((0.0..1.0).contains(&u), "{u} out of range");
        }
    }

    #[test]
    fn exponential_mean_approximately() {
        let mut variates = Variates::new(Some(42));
        let distribution = Exponential::with_mean(0.01).unwrap();
        let n = 100_000;
        let mean = (0..n).map(|_| variates.sample(&distribution)).sum::<f64>() / n as f64;

        assert!((mean - 0.01).abs() < 0.0002, "sample mean was {mean}");
    }

    #[test]
    fn exponential_is_positive() {
        let mut variates = Variates::new(Some(7));
        for _ in 0..10_000 {
            assert!(variates.exponential(1.0).unwrap() >= 0.0);
        }
    }

    #[test]
    fn exponential_rejects_invalid_mean() {
        let mut variates = Variates::new(Some(42));
        assert!(variates.exponential(0.0).is_err());
        assert!(variates.exponential(-1.0).is_err());
        assert!(Exponential::with_rate(0.0).is_err());
        assert_eq!(Exponential::with_rate(100.0).unwrap().mean(), 0.01);
    }

    #[test]
    fn choose_empty() {
        let mut variates = Variates::new(Some(42));
        let values: [u64; 0] = [];
        assert_eq!(
            variates.choose(&values),
            Err(SimError::EmptyDomain { name: "values" })
        );
    }

    #[test]
    fn choose_equal_probability() {
        let mut variates = Variates::new(Some(42));
        let values = [500u64, 1000, 1500, 2000, 2500];
        let mut counts = [0usize; 5];
        for _ in 0..50_000 {
            let value = variates.choose(&values).unwrap();
            let index = values.iter().position(|v| v == value).unwrap();
            counts[index] += 1;
        }
        for count in counts {
            assert!(count > 9_500 && count < 10_500, "count was {count}/10000");
        }
    }

    #[test]
    fn packet_size_is_a_choice() {
        let sizes = PacketSizes::new(vec![500, 1_000, 1_500]).unwrap();
        let mut a = Variates::new(Some(3));
        let mut b = Variates::new(Some(3));

        for _ in 0..1_000 {
            assert_eq!(a.packet_size(&sizes), *b.choose(sizes.as_slice()).unwrap());
        }
    }

    #[test]
    fn exponential_of_rate() {
        let mut variates = Variates::new(Some(11));
        let distribution = Exponential::with_rate(250.0).unwrap();
        let n = 100_000;
        let mean = (0..n).map(|_| variates.sample(&distribution)).sum::<f64>() / n as f64;

        assert!((mean - 0.004).abs() < 0.0001, "sample mean was {mean}");
    }

    #[test]
    fn packet_size_from_set() {
        let mut variates = Variates::new(Some(42));
        let sizes = PacketSizes::new(vec![500, 2500]).unwrap();
        for _ in 0..1_000 {
            let size = variates.packet_size(&sizes);
            assert!(size == 500 || size == 2500);
        }
    }
}
