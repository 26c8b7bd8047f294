//! Command line of the `shaper` binary.
//!
//! Every model has its own sub-command. The parameters default to the
//! reference values of [`shaper_core::defaults`]; one of them can be
//! swept with `--vary <parameter> --values <v1>,<v2>,...`, every value
//! being simulated in parallel with the same seed.
//!
//! With `--seeds <s1>,<s2>,...` every configuration is replicated once per
//! seed, and the rows of the replicas are followed by their mean.

use crate::{
    record::{ErlangRecord, Mean, Point, ShaperRecord, SwitchRecord},
    sweep,
    theory::{TheoryError, max_load_for_blocking},
};
use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shaper_core::{
    BitLeakyBucket, BitLeakyBucketConfig, BitRate, BitTokenBucket, BitTokenBucketConfig,
    LeakyBucket, LeakyBucketConfig, Model, PacketSizes, PacketSwitch, PacketSwitchConfig,
    SimError, SimTime, TokenBucket, TokenBucketConfig, defaults::*,
};
use std::io;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("`--vary {parameter}' does not apply to the {model} model")]
    NotApplicable {
        parameter: Parameter,
        model: &'static str,
    },
    #[error("`{parameter}' counts packets or bits, {value} is not a whole number")]
    NotACount { parameter: Parameter, value: f64 },
    #[error("`--vary {parameter}' needs at least one value in `--values'")]
    MissingValues { parameter: Parameter },
    #[error("`--values' is only used with `--vary'")]
    MissingParameter,
    #[error("cannot build the Erlang table")]
    Theory(#[from] TheoryError),
    #[error(transparent)]
    Invalid(#[from] SimError),
}

#[derive(Parser, Debug)]
#[command(
    name = "shaper",
    version,
    about = "Simulate leaky bucket and token bucket traffic shapers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Leaky bucket counting packets
    Leaky(LeakyArgs),
    /// Leaky bucket counting bits
    LeakyBits(BitLeakyArgs),
    /// Token bucket counting packets
    Token(TokenArgs),
    /// Token bucket counting bits
    TokenBits(BitTokenArgs),
    /// Single server packet switch, compared with the M/M/1 queue
    Switch(SwitchArgs),
    /// Largest load per number of servers for a given Erlang B blocking
    Erlang(ErlangArgs),
}

/// The parameters that can be swept.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    ArrivalRate,
    BucketSize,
    OutputRate,
    ClockPeriod,
    TokenBucketSize,
    DataBucketSize,
    TokenRate,
    Load,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// seed of the random number generator, a fixed default is used if omitted
    #[arg(long, conflicts_with = "random_seed")]
    pub seed: Option<u64>,

    /// draw the seed from the system entropy, it is reported in the output
    #[arg(long)]
    pub random_seed: bool,

    /// replicate every run with each of these seeds, followed by the mean
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["seed", "random_seed"])]
    pub seeds: Vec<u64>,

    /// parameter to sweep
    #[arg(long, value_enum)]
    pub vary: Option<Parameter>,

    /// values of the swept parameter
    #[arg(long, value_delimiter = ',')]
    pub values: Vec<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct LeakyArgs {
    /// capacity of the bucket, in packets
    #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE)]
    pub bucket_size: u64,
    /// packets per second leaving the bucket
    #[arg(long, default_value_t = DEFAULT_OUTPUT_RATE)]
    pub output_rate: f64,
    /// packets per second arriving
    #[arg(long, default_value_t = DEFAULT_ARRIVAL_RATE)]
    pub arrival_rate: f64,
    #[arg(long, default_value_t = DEFAULT_RUN_TIME)]
    pub run_time: SimTime,
    #[command(flatten)]
    pub sweep: SweepArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BitLeakyArgs {
    /// capacity of the bucket, in packets
    #[arg(long, default_value_t = DEFAULT_BIT_BUCKET_SIZE)]
    pub bucket_size: u64,
    /// bits per second leaving the bucket (e.g. `1mbps`)
    #[arg(long, default_value_t = DEFAULT_BIT_OUTPUT_RATE)]
    pub output_rate: BitRate,
    #[arg(long, default_value_t = DEFAULT_CLOCK_PERIOD)]
    pub clock_period: SimTime,
    #[arg(long, default_value_t = DEFAULT_ARRIVAL_RATE)]
    pub arrival_rate: f64,
    /// sizes in bits, drawn uniformly (e.g. `500,1000,1500`)
    #[arg(long, default_value_t = PacketSizes::default())]
    pub packet_sizes: PacketSizes,
    #[arg(long, default_value_t = DEFAULT_RUN_TIME)]
    pub run_time: SimTime,
    #[command(flatten)]
    pub sweep: SweepArgs,
}

#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
    /// capacity of the token bucket, in tokens
    #[arg(long, default_value_t = DEFAULT_TOKEN_BUCKET_SIZE)]
    pub token_bucket_size: u64,
    /// capacity of the data bucket, in packets
    #[arg(long, default_value_t = DEFAULT_DATA_BUCKET_SIZE)]
    pub data_bucket_size: u64,
    /// tokens per second
    #[arg(long, default_value_t = DEFAULT_TOKEN_RATE)]
    pub token_rate: f64,
    #[arg(long, default_value_t = DEFAULT_ARRIVAL_RATE)]
    pub arrival_rate: f64,
    #[arg(long, default_value_t = DEFAULT_RUN_TIME)]
    pub run_time: SimTime,
    #[command(flatten)]
    pub sweep: SweepArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BitTokenArgs {
    /// capacity of the token bucket, in bits
    #[arg(long, default_value_t = DEFAULT_TOKEN_BUCKET_BITS)]
    pub token_bucket_size: u64,
    /// capacity of the data bucket, in packets
    #[arg(long, default_value_t = DEFAULT_DATA_BUCKET_SIZE)]
    pub data_bucket_size: u64,
    /// token bits per second (e.g. `200kbps`)
    #[arg(long, default_value_t = DEFAULT_BIT_TOKEN_RATE)]
    pub token_rate: BitRate,
    #[arg(long, default_value_t = DEFAULT_ARRIVAL_RATE)]
    pub arrival_rate: f64,
    #[arg(long, default_value_t = PacketSizes::default())]
    pub packet_sizes: PacketSizes,
    #[arg(long, default_value_t = DEFAULT_RUN_TIME)]
    pub run_time: SimTime,
    #[command(flatten)]
    pub sweep: SweepArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SwitchArgs {
    #[arg(long, default_value_t = DEFAULT_LINK_RATE)]
    pub link_rate: BitRate,
    /// mean of the exponentially distributed packet sizes, in bits
    #[arg(long, default_value_t = DEFAULT_MEAN_PACKET_SIZE)]
    pub mean_packet_size: f64,
    #[arg(long, default_value_t = DEFAULT_SWITCH_ARRIVAL_RATE)]
    pub arrival_rate: f64,
    /// number of departures before the run stops
    #[arg(long, default_value_t = DEFAULT_RUN_LENGTH)]
    pub run_length: u64,
    #[command(flatten)]
    pub sweep: SweepArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ErlangArgs {
    /// largest number of servers in the table
    #[arg(long, default_value_t = 40)]
    pub max_servers: u32,
    /// target blocking probability, in (0, 1)
    #[arg(long, default_value_t = 0.015, value_parser = probability)]
    pub blocking: f64,
}

fn probability(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|error| format!("{error}"))?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("expecting a probability between 0 and 1 (excluded), got {value}"))
    }
}

impl Parameter {
    pub fn name(self) -> &'static str {
        match self {
            Self::ArrivalRate => "arrival-rate",
            Self::BucketSize => "bucket-size",
            Self::OutputRate => "output-rate",
            Self::ClockPeriod => "clock-period",
            Self::TokenBucketSize => "token-bucket-size",
            Self::DataBucketSize => "data-bucket-size",
            Self::TokenRate => "token-rate",
            Self::Load => "load",
        }
    }

    fn count(self, value: f64) -> Result<u64, CliError> {
        if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
            Ok(value as u64)
        } else {
            Err(CliError::NotACount {
                parameter: self,
                value,
            })
        }
    }

    fn not_for(self, model: &'static str) -> CliError {
        CliError::NotApplicable {
            parameter: self,
            model,
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl SweepArgs {
    fn seed(&self, default: Option<u64>) -> Option<u64> {
        if self.random_seed {
            None
        } else {
            self.seed.or(default)
        }
    }
}

impl LeakyArgs {
    fn config(&self) -> LeakyBucketConfig {
        let config = LeakyBucketConfig {
            bucket_size: self.bucket_size,
            output_rate: self.output_rate,
            arrival_rate: self.arrival_rate,
            run_time: self.run_time,
            ..LeakyBucketConfig::default()
        };
        LeakyBucketConfig {
            seed: self.sweep.seed(config.seed),
            ..config
        }
    }

    fn vary(
        config: LeakyBucketConfig,
        parameter: Parameter,
        value: f64,
    ) -> Result<LeakyBucketConfig, CliError> {
        Ok(match parameter {
            Parameter::ArrivalRate => config.with_arrival_rate(value),
            Parameter::BucketSize => config.with_bucket_size(parameter.count(value)?),
            Parameter::OutputRate => config.with_output_rate(value),
            _ => return Err(parameter.not_for(LeakyBucket::NAME)),
        })
    }
}

impl BitLeakyArgs {
    fn config(&self) -> BitLeakyBucketConfig {
        let config = BitLeakyBucketConfig {
            bucket_size: self.bucket_size,
            output_rate: self.output_rate,
            clock_period: self.clock_period,
            arrival_rate: self.arrival_rate,
            packet_sizes: self.packet_sizes.clone(),
            run_time: self.run_time,
            ..BitLeakyBucketConfig::default()
        };
        BitLeakyBucketConfig {
            seed: self.sweep.seed(config.seed),
            ..config
        }
    }

    fn vary(
        config: BitLeakyBucketConfig,
        parameter: Parameter,
        value: f64,
    ) -> Result<BitLeakyBucketConfig, CliError> {
        Ok(match parameter {
            Parameter::ArrivalRate => config.with_arrival_rate(value),
            Parameter::BucketSize => config.with_bucket_size(parameter.count(value)?),
            Parameter::OutputRate => config.with_output_rate(BitRate::new(value)?),
            Parameter::ClockPeriod => config.with_clock_period(SimTime::from_secs(value)),
            _ => return Err(parameter.not_for(BitLeakyBucket::NAME)),
        })
    }
}

impl TokenArgs {
    fn config(&self) -> TokenBucketConfig {
        let config = TokenBucketConfig {
            token_bucket_size: self.token_bucket_size,
            data_bucket_size: self.data_bucket_size,
            token_rate: self.token_rate,
            arrival_rate: self.arrival_rate,
            run_time: self.run_time,
            ..TokenBucketConfig::default()
        };
        TokenBucketConfig {
            seed: self.sweep.seed(config.seed),
            ..config
        }
    }

    fn vary(
        config: TokenBucketConfig,
        parameter: Parameter,
        value: f64,
    ) -> Result<TokenBucketConfig, CliError> {
        Ok(match parameter {
            Parameter::ArrivalRate => config.with_arrival_rate(value),
            Parameter::TokenBucketSize => config.with_token_bucket_size(parameter.count(value)?),
            Parameter::DataBucketSize => config.with_data_bucket_size(parameter.count(value)?),
            Parameter::TokenRate => config.with_token_rate(value),
            _ => return Err(parameter.not_for(TokenBucket::NAME)),
        })
    }
}

impl BitTokenArgs {
    fn config(&self) -> BitTokenBucketConfig {
        let config = BitTokenBucketConfig {
            token_bucket_size: self.token_bucket_size,
            data_bucket_size: self.data_bucket_size,
            token_rate: self.token_rate,
            arrival_rate: self.arrival_rate,
            packet_sizes: self.packet_sizes.clone(),
            run_time: self.run_time,
            ..BitTokenBucketConfig::default()
        };
        BitTokenBucketConfig {
            seed: self.sweep.seed(config.seed),
            ..config
        }
    }

    fn vary(
        config: BitTokenBucketConfig,
        parameter: Parameter,
        value: f64,
    ) -> Result<BitTokenBucketConfig, CliError> {
        Ok(match parameter {
            Parameter::ArrivalRate => config.with_arrival_rate(value),
            Parameter::TokenBucketSize => config.with_token_bucket_size(parameter.count(value)?),
            Parameter::DataBucketSize => config.with_data_bucket_size(parameter.count(value)?),
            Parameter::TokenRate => config.with_token_rate(BitRate::new(value)?),
            _ => return Err(parameter.not_for(BitTokenBucket::NAME)),
        })
    }
}

impl SwitchArgs {
    fn config(&self) -> PacketSwitchConfig {
        let config = PacketSwitchConfig {
            link_rate: self.link_rate,
            mean_packet_size: self.mean_packet_size,
            arrival_rate: self.arrival_rate,
            run_length: self.run_length,
            ..PacketSwitchConfig::default()
        };
        PacketSwitchConfig {
            seed: self.sweep.seed(config.seed),
            ..config
        }
    }

    fn vary(
        config: PacketSwitchConfig,
        parameter: Parameter,
        value: f64,
    ) -> Result<PacketSwitchConfig, CliError> {
        Ok(match parameter {
            Parameter::ArrivalRate => config.with_arrival_rate(value),
            Parameter::Load => config.with_load(value),
            _ => return Err(parameter.not_for(PacketSwitch::NAME)),
        })
    }
}

/// the configurations to simulate: the base one, or one per swept value.
fn configurations<C: Clone>(
    sweep: &SweepArgs,
    base: C,
    vary: fn(C, Parameter, f64) -> Result<C, CliError>,
) -> Result<Vec<(Option<Point>, C)>, CliError> {
    match (sweep.vary, sweep.values.is_empty()) {
        (None, true) => Ok(vec![(None, base)]),
        (None, false) => Err(CliError::MissingParameter),
        (Some(parameter), true) => Err(CliError::MissingValues { parameter }),
        (Some(parameter), false) => sweep
            .values
            .iter()
            .map(|&value| {
                let point = Point {
                    parameter: parameter.name(),
                    value,
                };
                Ok((Some(point), vary(base.clone(), parameter, value)?))
            })
            .collect(),
    }
}

/// simulate every configuration in parallel and write one record per run,
/// in the order of the swept values.
///
/// When seeds are given, each configuration is run once per seed and the
/// records of these runs are followed by their mean.
fn simulate<W, C, R, S>(
    writer: &mut csv::Writer<W>,
    model: &'static str,
    seeds: &[u64],
    configurations: &[(Option<Point>, C)],
    with_seed: fn(C, u64) -> C,
    run: fn(&C) -> Result<R, SimError>,
    record: fn(&C, Option<Point>, &R) -> S,
) -> anyhow::Result<()>
where
    W: io::Write,
    C: Clone + Sync,
    R: Send,
    S: Serialize + Mean,
{
    let runs: Vec<(Option<Point>, C)> = if seeds.is_empty() {
        configurations.to_vec()
    } else {
        configurations
            .iter()
            .flat_map(|(point, config)| {
                seeds
                    .iter()
                    .map(move |&seed| (*point, with_seed(config.clone(), seed)))
            })
            .collect()
    };

    let reports = sweep::run_all(&runs, |(_, config)| run(config));

    let mut records = Vec::with_capacity(runs.len());
    for ((point, config), report) in runs.iter().zip(reports) {
        let report = report.with_context(|| format!("cannot simulate the {model} model"))?;
        records.push(record(config, *point, &report));
        info!(model, point = ?point, "run complete");
    }

    for replicas in records.chunks(seeds.len().max(1)) {
        for row in replicas {
            writer
                .serialize(row)
                .context("cannot write the record")?;
        }
        if replicas.len() > 1
            && let Some(mean) = S::mean(replicas)
        {
            writer
                .serialize(&mean)
                .context("cannot write the mean record")?;
        }
    }
    Ok(())
}

impl Cli {
    /// run the command, writing the records as CSV into `output`.
    pub fn run<W: io::Write>(&self, output: W) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_writer(output);

        match &self.command {
            Command::Leaky(args) => simulate(
                &mut writer,
                LeakyBucket::NAME,
                &args.sweep.seeds,
                &configurations(&args.sweep, args.config(), LeakyArgs::vary)?,
                LeakyBucketConfig::with_seed,
                |config| Ok(config.build()?.run()),
                |_, point, report| ShaperRecord::new(LeakyBucket::NAME, point, report),
            )?,
            Command::LeakyBits(args) => simulate(
                &mut writer,
                BitLeakyBucket::NAME,
                &args.sweep.seeds,
                &configurations(&args.sweep, args.config(), BitLeakyArgs::vary)?,
                BitLeakyBucketConfig::with_seed,
                |config| Ok(config.build()?.run()),
                |_, point, report| ShaperRecord::new(BitLeakyBucket::NAME, point, report),
            )?,
            Command::Token(args) => simulate(
                &mut writer,
                TokenBucket::NAME,
                &args.sweep.seeds,
                &configurations(&args.sweep, args.config(), TokenArgs::vary)?,
                TokenBucketConfig::with_seed,
                |config| Ok(config.build()?.run()),
                |_, point, report| ShaperRecord::new(TokenBucket::NAME, point, report),
            )?,
            Command::TokenBits(args) => simulate(
                &mut writer,
                BitTokenBucket::NAME,
                &args.sweep.seeds,
                &configurations(&args.sweep, args.config(), BitTokenArgs::vary)?,
                BitTokenBucketConfig::with_seed,
                |config| Ok(config.build()?.run()),
                |_, point, report| ShaperRecord::new(BitTokenBucket::NAME, point, report),
            )?,
            Command::Switch(args) => simulate(
                &mut writer,
                PacketSwitch::NAME,
                &args.sweep.seeds,
                &configurations(&args.sweep, args.config(), SwitchArgs::vary)?,
                PacketSwitchConfig::with_seed,
                |config| Ok(config.build()?.run()),
                SwitchRecord::new,
            )?,
            Command::Erlang(args) => {
                for servers in 1..=args.max_servers {
                    let load = max_load_for_blocking(servers, args.blocking, 1e-6)
                        .map_err(CliError::from)?;
                    writer
                        .serialize(ErlangRecord::new(servers, load))
                        .context("cannot write the record")?;
                }
                info!(max_servers = args.max_servers, "erlang table complete");
            }
        }

        writer.flush().context("cannot flush the records")?;
        Ok(())
    }
}
