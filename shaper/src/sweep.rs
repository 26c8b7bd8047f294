//! Run independent simulations in parallel.
//!
//! Every simulation owns its whole state, so a sweep is just as many
//! isolated runs: they are spread on scoped threads and the results are
//! collected back in the order of the inputs.

use std::{num::NonZeroUsize, thread};

/// apply `run` to every value, on up to `available_parallelism` threads
/// at a time.
///
/// The results are in the same order as `values`. A panic in one of
/// the runs is propagated to the caller.
pub fn run_all<V, R, F>(values: &[V], run: F) -> Vec<R>
where
    V: Sync,
    R: Send,
    F: Fn(&V) -> R + Sync,
{
    let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let run = &run;

    let mut results = Vec::with_capacity(values.len());
    for chunk in values.chunks(workers) {
        thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|value| scope.spawn(move || run(value)))
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(result) => results.push(result),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use shaper_core::{LeakyBucketConfig, SimTime};
    use std::time::Duration;

    #[test]
    fn results_in_input_order() {
        let values: Vec<u64> = (0..32).collect();

        // the first values take the longest
        let results = run_all(&values, |value| {
            thread::sleep(Duration::from_millis(32 - value));
            value * 2
        });

        assert_eq!(results, values.iter().map(|v| v * 2).collect::<Vec<_>>());
    }

    #[test]
    fn empty() {
        let values: [u64; 0] = [];
        assert!(run_all(&values, |v| *v).is_empty());
    }

    #[test]
    fn parallel_runs_are_isolated() {
        let sizes = [1, 2, 5, 10, 20];
        let config = |size: u64| {
            LeakyBucketConfig::default()
                .with_bucket_size(size)
                .with_output_rate(80.0)
                .with_run_time(SimTime::from_secs(20.0))
                .with_seed(12345)
        };

        let parallel = run_all(&sizes, |size| config(*size).build().map(|sim| sim.run()));
        for (size, report) in sizes.iter().zip(parallel) {
            let sequential = config(*size).build().unwrap().run();
            assert_eq!(report.unwrap(), sequential);
        }
    }
}
