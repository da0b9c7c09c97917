use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use sky_catalog_fetch::app::App;
use sky_catalog_fetch::client::LegacySurveyClient;
use sky_catalog_fetch::config::{ConfigLoader, ConfigOverrides};
use sky_catalog_fetch::error::CatalogError;
use sky_catalog_fetch::output::{self, JsonOutput, OutputMode, StatusLines};
use sky_catalog_fetch::progress::{ProgressSink, select_reporter};
use sky_catalog_fetch::query::{DEFAULT_COLUMNS, DEFAULT_QUERY_ENDPOINT, DataLabClient, sql_catalog};

#[derive(Parser)]
#[command(name = "skycat")]
#[command(about = "Download Legacy Survey catalog cutouts for a list of sky coordinates")]
#[command(version, author)]
struct Cli {
    /// Print results as JSON instead of a human summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download one catalog file per input row (default)")]
    Fetch(FetchArgs),
    #[command(about = "Query the tractor table around one position and print the rows")]
    Query(QueryArgs),
}

#[derive(Args, Clone, Default)]
struct FetchArgs {
    /// Number of parallel downloads.
    #[arg(short = 'n', long = "workers")]
    workers: Option<usize>,

    /// Coordinate list, .txt (whitespace) or .csv (comma).
    #[arg(short = 't', long = "textfile")]
    textfile: Option<String>,

    /// Skip the first row of the coordinate list.
    #[arg(long)]
    header: bool,

    /// Only fetch the first N rows; zero or negative means all.
    #[arg(short = 'l', long = "length", allow_hyphen_values = true)]
    length: Option<i64>,

    /// Print one status line per catalog.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Existing folder the catalogs are written into.
    #[arg(short = 'f', long = "folder")]
    folder: Option<String>,

    /// Download again even if the file already exists.
    #[arg(short = 'o', long)]
    overwrite: bool,

    /// JSON options file (defaults to ./skycat.json when present).
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    endpoint: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long, allow_hyphen_values = true)]
    ra: f64,

    #[arg(long, allow_hyphen_values = true)]
    dec: f64,

    #[arg(long)]
    size: Option<f64>,

    #[arg(long, default_value = DEFAULT_COLUMNS)]
    columns: String,

    #[arg(long, default_value = DEFAULT_QUERY_ENDPOINT)]
    endpoint: String,

    #[arg(long)]
    timeout: Option<u64>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        err if err.is_configuration() => 2,
        CatalogError::Http(_)
        | CatalogError::Status { .. }
        | CatalogError::QueryHttp(_)
        | CatalogError::QueryStatus { .. }
        | CatalogError::QueryParse(_) => 3,
        _ => 1,
    }
}

/// `RUST_LOG` wins over the level picked from the resolved configuration.
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match cli.command {
        Some(Commands::Fetch(args)) => run_fetch(args, output_mode),
        Some(Commands::Query(args)) => run_query(args),
        None => run_fetch(FetchArgs::default(), output_mode),
    }
}

fn run_fetch(args: FetchArgs, output_mode: OutputMode) -> miette::Result<()> {
    let FetchArgs {
        workers,
        textfile,
        header,
        length,
        verbose,
        folder,
        overwrite,
        config,
        endpoint,
        timeout,
    } = args;

    let file_config = ConfigLoader::resolve(config.as_deref())?;
    let overrides = ConfigOverrides {
        workers,
        input: textfile,
        header: header.then_some(true),
        folder,
        overwrite: overwrite.then_some(true),
        verbose: verbose.then_some(true),
        limit: length,
        endpoint,
        request_timeout_secs: timeout,
    };
    let config = ConfigLoader::resolve_config(file_config, overrides)?;
    init_tracing(config.log_level());

    let client = LegacySurveyClient::new(&config.endpoint, config.request_timeout)?;
    let verbose = config.verbose;
    let app = App::new(config, client);

    let sink: Box<dyn ProgressSink> = match output_mode {
        OutputMode::Json => select_reporter(false),
        OutputMode::Human if verbose => Box::new(StatusLines),
        OutputMode::Human => select_reporter(true),
    };
    let result = app.run(sink.as_ref())?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_batch(&result).into_diagnostic()?,
        OutputMode::Human => output::print_summary(&result),
    }
    Ok(())
}

fn run_query(args: QueryArgs) -> miette::Result<()> {
    init_tracing("warn");
    let client = DataLabClient::new(
        &args.endpoint,
        args.timeout.map(std::time::Duration::from_secs),
    )?;
    let table = sql_catalog(&client, args.ra, args.dec, args.size, &args.columns)?;
    JsonOutput::print_table(&table).into_diagnostic()?;
    Ok(())
}
