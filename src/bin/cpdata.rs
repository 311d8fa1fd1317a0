use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use chargepoint_datasets::app::{self, App};
use chargepoint_datasets::config::ConfigLoader;
use chargepoint_datasets::domain::Source;
use chargepoint_datasets::error::ChargeError;
use chargepoint_datasets::fetch::HttpFetcher;
use chargepoint_datasets::output::{JsonOutput, LogOutput, OutputMode};

#[derive(Parser)]
#[command(name = "cpdata")]
#[command(about = "Download EV charging point datasets and normalize them into CSV")]
#[command(version, author)]
struct Cli {
    /// JSON config file (defaults to ./cpdata.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Always download, ignoring and not filling the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Print the result summary as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download a source dataset and write <source>.csv into the target directory")]
    Process(ProcessArgs),
    #[command(about = "Merge several produced CSV files into one")]
    Combine(CombineArgs),
}

#[derive(Args)]
struct ProcessArgs {
    /// ireland | openchargemap
    source: Source,
    /// Directory receiving the archive, the unpacked dump and the CSV
    target_dir: PathBuf,
}

#[derive(Args)]
struct CombineArgs {
    /// Path of the combined CSV
    output: PathBuf,
    /// CSV files to merge, in order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ChargeError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ChargeError) -> u8 {
    match error {
        ChargeError::UnknownSource(_)
        | ChargeError::ConfigRead(_)
        | ChargeError::ConfigParse(_) => 2,
        ChargeError::Http(_) | ChargeError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Log
    };

    match cli.command {
        Commands::Process(args) => {
            let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
            if cli.no_cache {
                config.cache.enabled = false;
            }
            let fetcher = HttpFetcher::new(config.response_cache()?)?;
            let app = App::new(config, fetcher);
            match output_mode {
                OutputMode::Json => {
                    let result = app.process(args.source, &args.target_dir, &JsonOutput)?;
                    JsonOutput::print_process(&result).into_diagnostic()?;
                }
                OutputMode::Log => {
                    let result = app.process(args.source, &args.target_dir, &LogOutput)?;
                    tracing::info!(
                        rows = result.rows_written,
                        skipped = result.skipped_lines,
                        "wrote {}",
                        result.output_path.display()
                    );
                }
            }
            Ok(())
        }
        Commands::Combine(args) => {
            match output_mode {
                OutputMode::Json => {
                    let result = app::combine(&args.output, &args.inputs, &JsonOutput)?;
                    JsonOutput::print_combine(&result).into_diagnostic()?;
                }
                OutputMode::Log => {
                    let result = app::combine(&args.output, &args.inputs, &LogOutput)?;
                    tracing::info!(
                        rows = result.rows_written,
                        columns = result.columns,
                        "wrote {}",
                        result.output_path.display()
                    );
                }
            }
            Ok(())
        }
    }
}
