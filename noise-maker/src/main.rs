mod args;
mod generator;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    process::ExitCode,
};

use args::CliArgs;
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use generator::{HEADER, RowGenerator, TIMESTAMP_FORMAT};
use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;

#[derive(Debug, Error)]
enum NoiseError {
    #[error("invalid --start `{value}`: {source}")]
    Start {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("--malformed-ratio must be within 0..=1, got {0}")]
    Ratio(f64),

    #[error("failed to write rows: {0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), NoiseError> {
    if !(0.0..=1.0).contains(args.malformed_ratio()) {
        return Err(NoiseError::Ratio(*args.malformed_ratio()));
    }
    let start = match args.start() {
        Some(value) => NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| {
            NoiseError::Start {
                value: value.clone(),
                source,
            }
        })?,
        None => Local::now().naive_local(),
    };
    let mut rng = match args.seed() {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_os_rng(),
    };

    let mut out: Box<dyn Write> = if args.output() == "-" {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        Box::new(BufWriter::new(File::create(args.output())?))
    };

    if !*args.no_header() {
        writeln!(out, "{HEADER}")?;
    }
    let mut generator = RowGenerator::new(start, *args.max_gap_secs(), *args.malformed_ratio());
    for _ in 0..*args.count() {
        writeln!(out, "{}", generator.next_row(&mut rng))?;
    }
    out.flush()?;
    Ok(())
}
