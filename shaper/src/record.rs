//! The CSV rows written by the command line.

use crate::theory::{MM1, erlang_b};
use serde::Serialize;
use shaper_core::{PacketSwitchConfig, ShaperReport, SwitchReport};

/// The parameter a row was produced for, in a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub parameter: &'static str,
    pub value: f64,
}

/// Records that can be averaged over replicated runs.
pub trait Mean: Sized {
    /// the mean of `records`, all of the same configuration but with
    /// different seeds. `None` if there is no record.
    ///
    /// The seed of the mean is left empty and `runs` is the number of
    /// records averaged. Counters are rounded to the nearest unit.
    fn mean(records: &[Self]) -> Option<Self>;
}

/// One run of a traffic shaper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShaperRecord {
    pub model: &'static str,
    pub parameter: Option<&'static str>,
    pub value: Option<f64>,
    pub seed: Option<u64>,
    /// number of runs the row stands for, more than one for a mean
    pub runs: u64,
    pub run_time: f64,
    pub arrived: u64,
    pub dropped: u64,
    pub transmitted: u64,
    pub queued: u64,
    pub bits_transmitted: Option<f64>,
    pub loss_rate: f64,
    pub mean_output_rate: f64,
    pub mean_output_bit_rate: Option<f64>,
    pub mean_queue_length: f64,
}

/// One run of the packet switch, next to the M/M/1 expectations.
///
/// The `expected_*` columns are left empty when the offered load is `1`
/// or more.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchRecord {
    pub parameter: Option<&'static str>,
    pub value: Option<f64>,
    pub seed: Option<u64>,
    pub runs: u64,
    pub arrival_rate: f64,
    pub offered_load: f64,
    pub arrived: u64,
    pub departed: u64,
    pub mean_delay: f64,
    pub expected_mean_delay: Option<f64>,
    pub mean_queue_delay: f64,
    pub mean_service_time: f64,
    pub utilization: f64,
    pub mean_number_in_system: f64,
    pub expected_number_in_system: Option<f64>,
    pub throughput: f64,
    pub sim_time: f64,
}

/// A line of the Erlang B table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErlangRecord {
    pub servers: u32,
    pub max_load: f64,
    pub blocking: f64,
}

impl ShaperRecord {
    pub fn new(model: &'static str, point: Option<Point>, report: &ShaperReport) -> Self {
        Self {
            model,
            parameter: point.map(|p| p.parameter),
            value: point.map(|p| p.value),
            seed: Some(report.seed),
            runs: 1,
            run_time: report.run_time.as_secs(),
            arrived: report.arrived,
            dropped: report.dropped,
            transmitted: report.transmitted,
            queued: report.queued,
            bits_transmitted: report.bits_transmitted,
            loss_rate: report.loss_rate,
            mean_output_rate: report.mean_output_rate,
            mean_output_bit_rate: report.mean_output_bit_rate,
            mean_queue_length: report.mean_queue_length,
        }
    }
}

impl SwitchRecord {
    pub fn new(config: &PacketSwitchConfig, point: Option<Point>, report: &SwitchReport) -> Self {
        let theory = MM1::new(config.arrival_rate, config.service_rate()).ok();

        Self {
            parameter: point.map(|p| p.parameter),
            value: point.map(|p| p.value),
            seed: Some(report.seed),
            runs: 1,
            arrival_rate: config.arrival_rate,
            offered_load: config.offered_load(),
            arrived: report.arrived,
            departed: report.departed,
            mean_delay: report.mean_delay,
            expected_mean_delay: theory.map(|q| q.mean_delay()),
            mean_queue_delay: report.mean_queue_delay,
            mean_service_time: report.mean_service_time,
            utilization: report.utilization,
            mean_number_in_system: report.mean_number_in_system,
            expected_number_in_system: theory.map(|q| q.mean_number_in_system()),
            throughput: report.throughput,
            sim_time: report.sim_time.as_secs(),
        }
    }
}

impl ErlangRecord {
    pub fn new(servers: u32, max_load: f64) -> Self {
        Self {
            servers,
            max_load,
            blocking: erlang_b(servers, max_load).unwrap_or(1.0),
        }
    }
}

fn mean_of<S>(records: &[S], field: impl Fn(&S) -> f64) -> f64 {
    records.iter().map(field).sum::<f64>() / records.len() as f64
}

fn mean_count<S>(records: &[S], field: impl Fn(&S) -> u64) -> u64 {
    mean_of(records, |record| field(record) as f64).round() as u64
}

fn mean_option<S>(records: &[S], field: impl Fn(&S) -> Option<f64>) -> Option<f64> {
    let values = records.iter().map(field).collect::<Option<Vec<f64>>>()?;
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

impl Mean for ShaperRecord {
    fn mean(records: &[Self]) -> Option<Self> {
        let first = records.first()?;

        Some(Self {
            seed: None,
            runs: records.iter().map(|r| r.runs).sum(),
            arrived: mean_count(records, |r| r.arrived),
            dropped: mean_count(records, |r| r.dropped),
            transmitted: mean_count(records, |r| r.transmitted),
            queued: mean_count(records, |r| r.queued),
            bits_transmitted: mean_option(records, |r| r.bits_transmitted),
            loss_rate: mean_of(records, |r| r.loss_rate),
            mean_output_rate: mean_of(records, |r| r.mean_output_rate),
            mean_output_bit_rate: mean_option(records, |r| r.mean_output_bit_rate),
            mean_queue_length: mean_of(records, |r| r.mean_queue_length),
            ..first.clone()
        })
    }
}

impl Mean for SwitchRecord {
    fn mean(records: &[Self]) -> Option<Self> {
        let first = records.first()?;

        Some(Self {
            seed: None,
            runs: records.iter().map(|r| r.runs).sum(),
            arrived: mean_count(records, |r| r.arrived),
            departed: mean_count(records, |r| r.departed),
            mean_delay: mean_of(records, |r| r.mean_delay),
            mean_queue_delay: mean_of(records, |r| r.mean_queue_delay),
            mean_service_time: mean_of(records, |r| r.mean_service_time),
            utilization: mean_of(records, |r| r.utilization),
            mean_number_in_system: mean_of(records, |r| r.mean_number_in_system),
            throughput: mean_of(records, |r| r.throughput),
            sim_time: mean_of(records, |r| r.sim_time),
            ..first.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shaper_core::LeakyBucketConfig;

    fn to_csv<S: Serialize>(rows: &[S]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn shaper_csv() {
        let report = LeakyBucketConfig::default()
            .with_run_time("10s".parse().unwrap())
            .build()
            .unwrap()
            .run();
        let point = Point {
            parameter: "bucket-size",
            value: 3.0,
        };
        let csv = to_csv(&[ShaperRecord::new("leaky-bucket", Some(point), &report)]);
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some(
                "model,parameter,value,seed,runs,run_time,arrived,dropped,transmitted,queued,\
                bits_transmitted,loss_rate,mean_output_rate,mean_output_bit_rate,mean_queue_length"
            )
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("leaky-bucket,bucket-size,3.0,12345,1,10.0,"));
        // no bit counters for a packet-counting model
        assert!(row.contains(",,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn switch_theory_columns() {
        let config = PacketSwitchConfig::default()
            .with_run_length(1_000)
            .with_seed(1);
        let report = config.build().unwrap().run();
        let record = SwitchRecord::new(&config, None, &report);

        assert_eq!(record.offered_load, 0.5);
        assert_eq!(record.expected_mean_delay, Some(0.002));
        assert_eq!(record.expected_number_in_system, Some(1.0));

        let unstable = config.with_load(1.5);
        let record = SwitchRecord::new(&unstable, None, &report);
        assert_eq!(record.expected_mean_delay, None);
    }

    #[test]
    fn mean_over_seeds() {
        let records: Vec<_> = [1, 2, 3]
            .into_iter()
            .map(|seed| {
                let report = LeakyBucketConfig::default()
                    .with_output_rate(50.0)
                    .with_run_time("20s".parse().unwrap())
                    .with_seed(seed)
                    .build()
                    .unwrap()
                    .run();
                ShaperRecord::new("leaky-bucket", None, &report)
            })
            .collect();
        let mean = ShaperRecord::mean(&records).unwrap();

        assert_eq!(mean.seed, None);
        assert_eq!(mean.runs, 3);
        assert_eq!(mean.model, "leaky-bucket");
        assert_eq!(mean.run_time, 20.0);
        let loss_rate = records.iter().map(|r| r.loss_rate).sum::<f64>() / 3.0;
        assert!((mean.loss_rate - loss_rate).abs() < 1e-12);
        let arrived = records.iter().map(|r| r.arrived).sum::<u64>() as f64 / 3.0;
        assert!((mean.arrived as f64 - arrived).abs() <= 0.5);
        assert_eq!(mean.bits_transmitted, None);

        assert_eq!(ShaperRecord::mean(&[]), None);
    }

    #[test]
    fn switch_mean_keeps_theory() {
        let config = PacketSwitchConfig::default().with_run_length(1_000);
        let records: Vec<_> = [7, 8]
            .into_iter()
            .map(|seed| {
                let config = config.clone().with_seed(seed);
                let report = config.build().unwrap().run();
                SwitchRecord::new(&config, None, &report)
            })
            .collect();
        let mean = SwitchRecord::mean(&records).unwrap();

        assert_eq!(mean.runs, 2);
        assert_eq!(mean.departed, 1_000);
        assert_eq!(mean.expected_mean_delay, Some(0.002));
        let delay = (records[0].mean_delay + records[1].mean_delay) / 2.0;
        assert!((mean.mean_delay - delay).abs() < 1e-12);
    }

    #[test]
    fn erlang_record() {
        let record = ErlangRecord::new(1, 1.0);
        assert_eq!(record.blocking, 0.5);
    }
}
