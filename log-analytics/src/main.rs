use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use log_analytics::{
    AnalysisOptions, Error, LogAnalyticsPipeline, MalformedPolicy, OutputFormat, PartitionPolicy,
    Section,
    analytics::{DEFAULT_FAILURE_STATUSES, DEFAULT_FAILURE_THRESHOLD, DEFAULT_PAGE_LIMIT},
    ingest, logging,
    partition::DEFAULT_MAX_PARTITIONS,
    prometheus::PromMetrics,
    report::{write_partition_list, write_records},
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Aggregate analyses over web access log CSV", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the analyses and print labeled result rows.
    Analyze(AnalyzeArgs),
    /// List status partitions, or print one partition's records.
    Partitions(PartitionArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// CSV with header `ip,timestamp,url,status,user_agent`; `-` reads stdin.
    input: PathBuf,

    /// Fail on the first malformed row instead of skipping it.
    #[arg(long)]
    reject_malformed: bool,
}

impl InputArgs {
    fn policy(&self) -> MalformedPolicy {
        if self.reject_malformed {
            MalformedPolicy::Reject
        } else {
            MalformedPolicy::Skip
        }
    }
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Sections to run; all of them when omitted.
    #[arg(long = "section", value_enum)]
    sections: Vec<Section>,

    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT as i64, allow_negative_numbers = true)]
    limit: i64,

    #[arg(long, default_value_t = DEFAULT_FAILURE_THRESHOLD as i64, allow_negative_numbers = true)]
    threshold: i64,

    /// Status codes counted as failed requests.
    #[arg(
        long = "failure-status",
        value_delimiter = ',',
        allow_negative_numbers = true,
        default_values_t = DEFAULT_FAILURE_STATUSES
    )]
    failure_statuses: Vec<i32>,

    #[arg(long, default_value_t = 1)]
    bucket_minutes: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct PartitionArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Print the records of this partition instead of the listing.
    #[arg(long, allow_negative_numbers = true)]
    status: Option<i32>,

    /// Strict mode: only these statuses may form partitions.
    #[arg(long, value_delimiter = ',', num_args = 0.., allow_negative_numbers = true)]
    strict: Option<Vec<i32>>,

    #[arg(long, default_value_t = DEFAULT_MAX_PARTITIONS)]
    max_partitions: usize,
}

impl PartitionArgs {
    fn policy(&self) -> PartitionPolicy {
        let mut policy = match &self.strict {
            Some(declared) => PartitionPolicy::strict(declared.iter().copied()),
            None => PartitionPolicy::default(),
        };
        policy.max_partitions = self.max_partitions;
        policy
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let mut out = BufWriter::new(io::stdout().lock());
    let result = match cli.command {
        Command::Analyze(args) => analyze(args, &mut out),
        Command::Partitions(args) => partitions(args, &mut out),
    }
    .and_then(|()| out.flush().map_err(Error::from));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn analyze<W: Write>(args: AnalyzeArgs, out: &mut W) -> Result<(), Error> {
    // options are checked before the input is opened
    let options = AnalysisOptions::new(
        args.limit,
        args.failure_statuses,
        args.threshold,
        args.bucket_minutes,
    )?;
    let ingested = ingest::read_path(&args.input.input, args.input.policy())?;
    let report = LogAnalyticsPipeline::new(&ingested.records)
        .with_stats(ingested.stats)
        .report(&options, &args.sections);

    match args.format {
        OutputFormat::Text => report.write_text(out)?,
        OutputFormat::Json => report.write_json(out)?,
        OutputFormat::Prometheus => {
            let metrics = PromMetrics::new()?;
            metrics.export(&report);
            out.write_all(metrics.encode()?.as_bytes())?;
        }
    }
    Ok(())
}

fn partitions<W: Write>(args: PartitionArgs, out: &mut W) -> Result<(), Error> {
    let policy = args.policy();
    let ingested = ingest::read_path(&args.input.input, args.input.policy())?;
    let index = LogAnalyticsPipeline::new(&ingested.records).build_partition_index(&policy)?;
    info!(partitions = index.partition_count(), "partition index ready");

    match args.status {
        Some(status) => write_records(index.get(status), out)?,
        None => write_partition_list(&index, out)?,
    }
    Ok(())
}
