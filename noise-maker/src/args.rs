use clap::Parser;
use derive_getters::Getters;

#[derive(Parser, Debug, Getters)]
#[command(name = "noise-maker")]
#[command(about = "Generate fake access log CSV for testing", long_about = None)]
pub struct CliArgs {
    /// Rows to write, not counting the header.
    #[arg(long, default_value_t = 1000)]
    count: usize,

    /// Fixed seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// First timestamp, `YYYY-MM-DD HH:MM:SS`. Defaults to now.
    #[arg(long)]
    start: Option<String>,

    /// Largest gap in seconds between consecutive rows.
    #[arg(long, default_value_t = 5)]
    max_gap_secs: u32,

    /// Share of rows, between 0 and 1, that are deliberately malformed.
    #[arg(long, default_value_t = 0.0)]
    malformed_ratio: f64,

    /// Omit the CSV header line.
    #[arg(long)]
    no_header: bool,

    /// Output file, `-` for stdout.
    #[arg(long, default_value = "-")]
    output: String,
}
