use thiserror::Error;

/// Error returned when a simulation cannot be constructed.
///
/// All parameters are validated when a configuration is turned into a
/// [`Simulation`]. Once a run has started nothing in the event loop can
/// fail: a full bucket, a busy server or an empty queue are ordinary
/// states accounted for in the [`RunStatistics`].
///
/// [`Simulation`]: crate::Simulation
/// [`RunStatistics`]: crate::RunStatistics
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A rate, capacity, or horizon is outside of its valid domain.
    #[error("invalid parameter `{name}' ({value}): {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// Sampling was requested over an empty set of values.
    #[error("cannot sample from an empty `{name}'")]
    EmptyDomain { name: &'static str },
}

impl SimError {
    /// check that `value` is a finite number strictly greater than `0`.
    pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64, Self> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Self::InvalidParameter {
                name,
                value,
                reason: "must be a finite value greater than 0",
            })
        }
    }

    /// check that `value` is a finite number greater or equal to `0`.
    pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<f64, Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(Self::InvalidParameter {
                name,
                value,
                reason: "must be a finite value greater or equal to 0",
            })
        }
    }

    pub(crate) fn ensure_non_zero(name: &'static str, value: u64) -> Result<u64, Self> {
        if value > 0 {
            Ok(value)
        } else {
            Err(Self::InvalidParameter {
                name,
                value: 0.0,
                reason: "must be greater than 0",
            })
        }
    }
}
