//! @ai:module:intent CLI entry point for the Go struct tag injector
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on config, inject, output

use clap::{Parser, ValueEnum};
use gotag_inject::{inject, output, InjectConfig, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gotag-inject")]
#[command(author, version, about = "Inject custom struct tags into Go files from field comments")]
struct Cli {
    /// Go files, directories or glob patterns to rewrite
    input: Vec<String>,

    /// Never rewrite fields whose name matches this pattern (e.g. XXX_*)
    #[arg(long = "skip-field", value_name = "PATTERN", value_delimiter = ',')]
    skip_fields: Vec<String>,

    /// Remove the directive comments after injecting their tags
    #[arg(long)]
    strip_directives: bool,

    /// Report what would change without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Log every injected tag
    #[arg(long, short)]
    verbose: bool,

    /// TOML file with input, skip_fields, strip_directives and verbose
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "gotag_inject=debug" } else { "gotag_inject=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => match InjectConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }
        },
        None => InjectConfig::default(),
    };

    let config = file_config.merge(InjectConfig {
        input: cli.input,
        skip_fields: cli.skip_fields,
        strip_directives: cli.strip_directives,
        verbose: cli.verbose,
    });

    init_logging(config.verbose);

    if config.input.is_empty() {
        eprintln!("Error: no input files given (pass paths or set `input` in the config file)");
        return ExitCode::from(2);
    }

    let options = match config.options(cli.dry_run) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let paths = match inject::expand_inputs(&config.input) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let report = inject::inject_paths(&paths, &options);
    println!("{}", output::format_run_report(&report, cli.format.into()));

    if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
