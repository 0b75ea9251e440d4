use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use pipesort::channel::ChannelMode;
use pipesort::source::{self, ElementWidth, FixedWidth};
use pipesort::{PipelineConfig, SortError, SortOrder};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "pipesort")]
#[command(about = "Pipelined merge sort over a chain of concurrent stages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort a raw file of fixed-width unsigned values
    Sort(SortArgs),
    /// Write a file of random fixed-width unsigned values
    Generate(GenerateArgs),
}

#[derive(Args)]
struct SortArgs {
    /// Input file
    #[arg(short, long, default_value = "numbers")]
    input: PathBuf,
    /// Bytes per value (little-endian)
    #[arg(short, long, value_enum, default_value_t = ElementWidth::U8)]
    width: ElementWidth,
    /// Chain length including the source; derived from the input size when omitted
    #[arg(short, long)]
    stages: Option<usize>,
    #[arg(long, value_enum, default_value_t = SortOrder::Ascending)]
    order: SortOrder,
    #[arg(long, value_enum, default_value_t = ChannelMode::Rendezvous)]
    channel: ChannelMode,
    /// Do not echo the input values
    #[arg(long)]
    no_print_input: bool,
    /// Do not print the sorted values
    #[arg(long)]
    no_print_output: bool,
    /// Print wall time, summed stage time and peak element count
    #[arg(long)]
    timing: bool,
    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct GenerateArgs {
    /// Number of values
    #[arg(short, long)]
    count: usize,
    #[arg(short, long, value_enum, default_value_t = ElementWidth::U8)]
    width: ElementWidth,
    #[arg(short, long, default_value = "numbers")]
    output: PathBuf,
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), SortError> {
    pipesort::init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sort(args) => match args.width {
            ElementWidth::U8 => sort_file::<u8>(&args),
            ElementWidth::U16 => sort_file::<u16>(&args),
            ElementWidth::U32 => sort_file::<u32>(&args),
            ElementWidth::U64 => sort_file::<u64>(&args),
        },
        Commands::Generate(args) => match args.width {
            ElementWidth::U8 => generate::<u8>(&args),
            ElementWidth::U16 => generate::<u16>(&args),
            ElementWidth::U32 => generate::<u32>(&args),
            ElementWidth::U64 => generate::<u64>(&args),
        },
    }
}

fn sort_file<T: FixedWidth>(args: &SortArgs) -> Result<(), SortError> {
    let values: Vec<T> = source::read_elements(&args.input)?;
    let config = match args.stages {
        Some(stages) => PipelineConfig::new(stages),
        None => PipelineConfig::for_input_len(values.len())?,
    }
    .with_order(args.order)
    .with_channel(args.channel);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if !args.no_print_input {
        writeln!(out, "{}", values.iter().join(" "))?;
        out.flush()?;
    }

    let outcome = pipesort::sort(&config, values)?;

    if !args.no_print_output {
        for value in &outcome.sorted {
            writeln!(out, "{}", value)?;
        }
    }
    if args.timing {
        let report = &outcome.report;
        writeln!(out, "walltime: {:.6}", report.wall_secs)?;
        writeln!(out, "reduced: {:.6}", report.reduced_secs())?;
        writeln!(out, "mem: {}", report.peak_elements())?;
    }
    out.flush()?;

    if let Some(path) = &args.report {
        outcome.report.write_json(path)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn generate<T: FixedWidth>(args: &GenerateArgs) -> Result<(), SortError> {
    let values = source::random_elements::<T>(args.count, args.seed);
    source::write_elements(&args.output, &values)?;
    info!(count = args.count, path = %args.output.display(), "generated input");
    Ok(())
}
