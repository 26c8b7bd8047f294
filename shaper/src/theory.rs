//! Closed-form queueing results, to compare the simulations against.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TheoryError {
    #[error("the offered load must be a finite value greater or equal to 0, got {load}")]
    InvalidLoad { load: f64 },
    #[error("the system is unstable: load {load} for {servers} server(s)")]
    Unstable { load: f64, servers: u32 },
    #[error("the rates must be finite values greater than 0")]
    InvalidRate,
    #[error("the target blocking probability must be in (0, 1), got {target}")]
    InvalidTarget { target: f64 },
    #[error("the tolerance must be a finite value greater than 0, got {tolerance}")]
    InvalidTolerance { tolerance: f64 },
}

fn ensure_load(load: f64) -> Result<f64, TheoryError> {
    if load.is_finite() && load >= 0.0 {
        Ok(load)
    } else {
        Err(TheoryError::InvalidLoad { load })
    }
}

/// Erlang B: probability that an arrival finds all the `servers` busy and
/// is blocked, for an offered `load` in Erlangs.
///
/// Uses the recursion `B(n) = A·B(n−1) / (n + A·B(n−1))` from `B(0) = 1`,
/// which stays numerically stable for large numbers of servers.
///
/// ```
/// # use shaper::theory::erlang_b;
/// assert_eq!(erlang_b(0, 3.0).unwrap(), 1.0);
/// assert_eq!(erlang_b(1, 1.0).unwrap(), 0.5);
/// ```
pub fn erlang_b(servers: u32, load: f64) -> Result<f64, TheoryError> {
    let load = ensure_load(load)?;

    let mut blocking = 1.0;
    for n in 1..=servers {
        let a_b = load * blocking;
        blocking = a_b / (f64::from(n) + a_b);
    }
    Ok(blocking)
}

/// Erlang C: probability that an arrival has to wait, in a system of
/// `servers` with an infinite queue and an offered `load` in Erlangs.
///
/// # Errors
///
/// [`TheoryError::Unstable`] if `load >= servers`.
pub fn erlang_c(servers: u32, load: f64) -> Result<f64, TheoryError> {
    let load = ensure_load(load)?;
    let n = f64::from(servers);
    if load >= n {
        return Err(TheoryError::Unstable { load, servers });
    }

    let b = erlang_b(servers, load)?;
    Ok(n * b / (n - load * (1.0 - b)))
}

/// the largest offered load (in Erlangs) the `servers` can take while
/// keeping the blocking probability at or under `target`.
///
/// Binary search on [`erlang_b`], within `tolerance` Erlangs.
///
/// # Errors
///
/// [`TheoryError::InvalidTarget`] if `target` is not in `(0, 1)`: the
/// blocking probability never reaches `1` and the search would not end.
/// [`TheoryError::InvalidTolerance`] if `tolerance` is not a finite value
/// greater than `0`.
///
/// ```
/// # use shaper::theory::{max_load_for_blocking, TheoryError};
/// assert!(max_load_for_blocking(10, 0.015, 1e-6).unwrap() > 4.0);
/// assert_eq!(
///     max_load_for_blocking(10, 1.0, 1e-6),
///     Err(TheoryError::InvalidTarget { target: 1.0 })
/// );
/// ```
pub fn max_load_for_blocking(
    servers: u32,
    target: f64,
    tolerance: f64,
) -> Result<f64, TheoryError> {
    if !(target > 0.0 && target < 1.0) {
        return Err(TheoryError::InvalidTarget { target });
    }
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(TheoryError::InvalidTolerance { tolerance });
    }

    let mut low = 0.0;
    let mut high = f64::from(servers.max(1)) * 2.0;

    // the blocking probability grows with the load, widen the range
    // until it contains the target
    while erlang_b(servers, high).is_ok_and(|b| b <= target) {
        high *= 2.0;
    }

    while high - low > tolerance {
        let mid = (low + high) / 2.0;
        if erlang_b(servers, mid).is_ok_and(|b| b <= target) {
            low = mid;
        } else {
            high = mid;
        }
    }
    Ok(low)
}

/// The M/M/1 queue: Poisson arrivals, exponential service times, one
/// server.
///
/// ```
/// # use shaper::theory::MM1;
/// let queue = MM1::new(500.0, 1_000.0).unwrap();
/// assert_eq!(queue.utilization(), 0.5);
/// assert_eq!(queue.mean_delay(), 0.002);
/// assert_eq!(queue.mean_number_in_system(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MM1 {
    arrival_rate: f64,
    service_rate: f64,
}

impl MM1 {
    /// # Errors
    ///
    /// [`TheoryError::Unstable`] if `arrival_rate >= service_rate`: the
    /// queue has no steady state.
    pub fn new(arrival_rate: f64, service_rate: f64) -> Result<Self, TheoryError> {
        let valid = |rate: f64| rate.is_finite() && rate > 0.0;
        if !valid(arrival_rate) || !valid(service_rate) {
            return Err(TheoryError::InvalidRate);
        }
        if arrival_rate >= service_rate {
            return Err(TheoryError::Unstable {
                load: arrival_rate / service_rate,
                servers: 1,
            });
        }

        Ok(Self {
            arrival_rate,
            service_rate,
        })
    }

    /// `ρ = λ / μ`
    pub fn utilization(&self) -> f64 {
        self.arrival_rate / self.service_rate
    }

    /// `1 / (μ − λ)`
    pub fn mean_delay(&self) -> f64 {
        1.0 / (self.service_rate - self.arrival_rate)
    }

    /// `ρ / (μ − λ)`
    pub fn mean_waiting_time(&self) -> f64 {
        self.utilization() / (self.service_rate - self.arrival_rate)
    }

    /// `ρ / (1 − ρ)`
    pub fn mean_number_in_system(&self) -> f64 {
        let rho = self.utilization();
        rho / (1.0 - rho)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn erlang_b_known_values() {
        // B(2, 1) = (1/2) / (1 + 1 + 1/2)
        assert!(close(erlang_b(2, 1.0).unwrap(), 0.2));
        assert!(close(erlang_b(5, 0.0).unwrap(), 0.0));
        // tabulated: 10 servers for 1% blocking take ~4.46 Erlangs
        assert!((erlang_b(10, 4.46).unwrap() - 0.01).abs() < 0.0005);
    }

    #[test]
    fn erlang_b_large_systems() {
        let b = erlang_b(1_000, 900.0).unwrap();
        assert!(b.is_finite());
        assert!(b > 0.0 && b < 0.01);
    }

    #[test]
    fn erlang_b_invalid_load() {
        assert_eq!(
            erlang_b(3, -1.0),
            Err(TheoryError::InvalidLoad { load: -1.0 })
        );
        assert!(erlang_b(3, f64::NAN).is_err());
    }

    #[test]
    fn erlang_c_single_server_is_utilization() {
        // with one server the waiting probability is ρ
        assert!(close(erlang_c(1, 0.5).unwrap(), 0.5));
        assert!(close(erlang_c(1, 0.9).unwrap(), 0.9));
    }

    #[test]
    fn erlang_c_above_erlang_b() {
        let b = erlang_b(5, 3.0).unwrap();
        let c = erlang_c(5, 3.0).unwrap();
        assert!(c > b);
        assert!(c < 1.0);
    }

    #[test]
    fn erlang_c_unstable() {
        assert_eq!(
            erlang_c(2, 2.0),
            Err(TheoryError::Unstable {
                load: 2.0,
                servers: 2
            })
        );
    }

    #[test]
    fn max_load() {
        let load = max_load_for_blocking(10, 0.015, 1e-6).unwrap();
        assert!(erlang_b(10, load).unwrap() <= 0.015);
        assert!(erlang_b(10, load + 1e-3).unwrap() > 0.015);
    }

    #[test]
    fn max_load_without_servers() {
        assert_eq!(max_load_for_blocking(0, 0.5, 1e-6), Ok(0.0));
    }

    #[test]
    fn max_load_unreachable_target() {
        for target in [1.0, 1.5, 0.0, -0.1, f64::NAN] {
            assert!(matches!(
                max_load_for_blocking(5, target, 1e-6),
                Err(TheoryError::InvalidTarget { .. })
            ));
        }
    }

    #[test]
    fn max_load_invalid_tolerance() {
        for tolerance in [0.0, -1e-6, f64::INFINITY] {
            assert!(matches!(
                max_load_for_blocking(5, 0.01, tolerance),
                Err(TheoryError::InvalidTolerance { .. })
            ));
        }
    }

    #[test]
    fn mm1() {
        let queue = MM1::new(800.0, 1_000.0).unwrap();
        assert!(close(queue.mean_delay(), 0.005));
        assert!(close(queue.mean_waiting_time(), 0.004));
        assert!(close(queue.mean_number_in_system(), 4.0));

        // Little's law
        assert!(close(
            queue.mean_number_in_system(),
            800.0 * queue.mean_delay()
        ));
    }

    #[test]
    fn mm1_unstable() {
        assert!(matches!(
            MM1::new(1_000.0, 1_000.0),
            Err(TheoryError::Unstable { .. })
        ));
        assert_eq!(MM1::new(0.0, 1.0), Err(TheoryError::InvalidRate));
    }
}
