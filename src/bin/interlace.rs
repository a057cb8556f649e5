use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use interlace::dispatch::{self, format_dataset};
use interlace::logger::{log_error, set_log_file};
use interlace::{
    CsvSink, DecodedColumn, LoadConfig, LoadOptions, Loaded, read_csv, write_loaded,
};

#[derive(Parser)]
#[command(
    name = "interlace",
    version,
    about = "Decode delimited text into value and missing-reason channels"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the decoded table and a per-column channel summary.
    Decode(DecodeArgs),
    /// List the cells that matched neither a missing token nor the column type.
    Report(ReportArgs),
    /// Re-encode an input with its token configuration.
    Convert(ConvertArgs),
}

#[derive(Args, Clone)]
struct LoadArgs {
    /// Input delimited text file.
    input: PathBuf,

    /// JSON load configuration (tokens, column types, delimiter, encoding).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input delimiter; overrides the configuration.
    #[arg(long)]
    delimiter: Option<char>,

    /// Treat the first record as data.
    #[arg(long = "no-headers", action = ArgAction::SetTrue)]
    no_headers: bool,

    /// Input text encoding label; overrides the configuration.
    #[arg(long)]
    encoding: Option<String>,

    /// Rows per parallel decode chunk.
    #[arg(long)]
    chunk_rows: Option<usize>,

    /// Number of worker threads.
    #[arg(long)]
    jobs: Option<usize>,

    /// Also write warnings and errors to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct DecodeArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Print at most N rows.
    #[arg(long, default_value_t = 20)]
    rows: usize,
}

#[derive(Args, Clone)]
struct ReportArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Emit JSON instead of human readable output.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct ConvertArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Output file.
    #[arg(long)]
    out: PathBuf,

    /// Output delimiter. Defaults to the input delimiter.
    #[arg(long)]
    out_delimiter: Option<char>,
}

type AnyError = Box<dyn std::error::Error + Send + Sync>;

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Decode(args) => run_decode(&args),
        Command::Report(args) => run_report(&args),
        Command::Convert(args) => run_convert(&args),
    };
    if let Err(err) = result {
        log_error(&err.to_string());
        std::process::exit(1);
    }
}

fn ascii_delimiter(delimiter: char) -> Result<u8, AnyError> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| format!("delimiter {delimiter:?} is not ASCII").into())
}

fn load_options(args: &LoadArgs) -> Result<LoadOptions, AnyError> {
    if let Some(jobs) = args.jobs {
        // Keep an already configured global pool.
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global();
    }
    if let Some(path) = &args.log_file {
        set_log_file(path)?;
    }

    let config = match &args.config {
        Some(path) => LoadConfig::from_path(path)?,
        None => LoadConfig::default(),
    };
    let mut options = config.into_options()?;
    if let Some(delimiter) = args.delimiter {
        options = options.with_delimiter(ascii_delimiter(delimiter)?);
    }
    if args.no_headers {
        options = options.with_headers(false);
    }
    if let Some(label) = &args.encoding {
        options = options.with_encoding(label.clone());
    }
    if let Some(rows) = args.chunk_rows {
        options = options.with_chunk_rows(rows);
    }
    Ok(options)
}

fn load(args: &LoadArgs) -> Result<(Loaded, LoadOptions), AnyError> {
    let options = load_options(args)?;
    let loaded = read_csv(&args.input, &options)?;
    Ok((loaded, options))
}

fn run_decode(args: &DecodeArgs) -> Result<(), AnyError> {
    let (loaded, _) = load(&args.load)?;
    let dataset = &loaded.dataset;
    print!("{}", format_dataset(dataset, Some(args.rows)));
    println!();
    println!(
        "Rows: {}  Columns: {}  Problems: {}",
        dataset.num_rows(),
        dataset.num_columns(),
        loaded.report.len()
    );
    for named in dataset.columns() {
        match &named.column {
            DecodedColumn::Channeled(column) => {
                let reasons = dispatch::reason_counts(column)
                    .into_iter()
                    .map(|(reason, count)| format!("{reason}={count}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!(
                    "{name:<24}  {types:<16}  present={present:<6}  absent={absent:<6}  {reasons}",
                    name = named.name,
                    types = column.types().to_string(),
                    present = dispatch::count_present(column),
                    absent = dispatch::count_absent(column),
                );
            }
            DecodedColumn::Plain(column) => {
                let absent = column.values().iter().filter(|value| value.is_none()).count();
                println!(
                    "{name:<24}  {types:<16}  present={present:<6}  absent={absent:<6}",
                    name = named.name,
                    types = column.value_type().to_string(),
                    present = column.len() - absent,
                );
            }
        }
    }
    Ok(())
}

fn run_report(args: &ReportArgs) -> Result<(), AnyError> {
    let (loaded, _) = load(&args.load)?;
    if args.json {
        serde_json::to_writer_pretty(std::io::stdout(), &loaded.report)?;
        println!();
    } else {
        for problem in &loaded.report {
            println!(
                "[row {row:>6}] {column:<24}  {raw:?}",
                row = problem.row,
                column = problem.column,
                raw = problem.raw
            );
        }
        println!("{} problems", loaded.report.len());
    }
    Ok(())
}

fn run_convert(args: &ConvertArgs) -> Result<(), AnyError> {
    let (loaded, options) = load(&args.load)?;
    let delimiter = match args.out_delimiter {
        Some(delimiter) => ascii_delimiter(delimiter)?,
        None => options.delimiter(),
    };
    let file = BufWriter::new(File::create(&args.out)?);
    let mut sink = CsvSink::new(file)
        .with_delimiter(delimiter)
        .with_headers(options.has_headers());
    write_loaded(&mut sink, &loaded, options.tokens())?;
    Ok(())
}
