//! tfmodscan CLI entry point.
//!
//! This binary provides the command-line interface for tfmodscan.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use tfmodscan::cli::{Cli, Commands};
use tfmodscan::reporter::Reporter;
use tfmodscan::{Config, Scanner, TfModScanError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration files looked up in the working directory, in order.
const DEFAULT_CONFIG_PATHS: [&str; 3] = ["tfmodscan.yaml", "tfmodscan.yml", ".tfmodscan.yaml"];

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");

            eprintln!("Error: {e}");

            // Print error chain (cause chain)
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            let code = e
                .downcast_ref::<TfModScanError>()
                .map_or(1, TfModScanError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over the verbose flag
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let base_level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,tfmodscan={base_level}"))
        })
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::debug!("Loading configuration");
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Scan(args) => {
            config.merge_cli_args(&args);
            tracing::debug!(paths = args.paths.len(), format = %args.format, "Executing scan command");

            let scanner = Scanner::new(config.clone());
            let result = scanner.scan_paths(args.paths.as_slice()).await?;

            let report = Reporter::new(&config).generate(&result, args.format)?;

            if let Some(output_path) = args.output {
                std::fs::write(&output_path, &report)
                    .map_err(|e| TfModScanError::io(&output_path, e, file!(), line!()))?;
                tracing::info!(path = %output_path.display(), "Report written");
            } else {
                println!("{report}");
            }

            // Some roots were skipped
            if result.has_failures() {
                return Ok(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Init => {
            let config_path = Path::new(DEFAULT_CONFIG_PATHS[0]);

            if config_path.exists() {
                anyhow::bail!("Configuration file already exists: {}", config_path.display());
            }

            std::fs::write(config_path, Config::example_yaml())?;
            println!("Created example configuration: {}", config_path.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate(args) => {
            let content = std::fs::read_to_string(&args.config)
                .map_err(|e| TfModScanError::io(&args.config, e, file!(), line!()))?;
            match Config::from_yaml(&content) {
                Ok(_) => {
                    println!("Configuration is valid: {}", args.config.display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(ref config_path) = cli.config {
        tracing::debug!(path = %config_path.display(), "Loading configuration from explicit path");
        return read_config(config_path);
    }

    for path in DEFAULT_CONFIG_PATHS.iter().map(Path::new) {
        if path.exists() {
            tracing::debug!(path = %path.display(), "Found configuration file");
            return read_config(path);
        }
    }

    tracing::debug!("No configuration file found, using default configuration");
    Ok(Config::default())
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let content =
        std::fs::read_to_string(path).map_err(|e| TfModScanError::io(path, e, file!(), line!()))?;
    Ok(Config::from_yaml(&content)?)
}
