//! zk-abstractor - Zero-knowledge code review CLI
//!
//! Abstracts changed code locally, sends only placeholders to the review
//! service and restores the answer on this machine.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zk_abstractor::{
    config::{Config, OutputFormat},
    models::Language,
    reporter::create_reporter,
    scanner::{parse_unified_diff, ChangedFile},
    Session, SessionStatus,
};

/// Reversible zero-knowledge code abstraction for remote review
#[derive(Parser)]
#[command(name = "zk-abstractor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra identifiers to keep public (comma-separated)
    #[arg(long, value_delimiter = ',')]
    allow_list: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormatArg {
    Text,
    Json,
    Markdown,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the abstracted form of a file or diff without contacting the service
    Redact {
        /// Source file or unified diff (`-` for stdin)
        input: PathBuf,

        /// Treat the input as a unified diff
        #[arg(long)]
        diff: bool,

        /// Language hint when reading a single file from stdin
        #[arg(long)]
        language: Option<String>,
    },

    /// Abstract, review remotely, restore and report
    Analyze {
        /// Source file or unified diff (`-` for stdin)
        input: PathBuf,

        /// Treat the input as a unified diff
        #[arg(long)]
        diff: bool,

        /// Language hint when reading a single file from stdin
        #[arg(long)]
        language: Option<String>,

        /// Review service base URL
        #[arg(long)]
        api_url: Option<String>,

        /// AI provider name
        #[arg(long)]
        provider: Option<String>,

        /// Model name
        #[arg(long)]
        model: Option<String>,

        /// Abort if the abstracted input exceeds this many estimated tokens
        #[arg(long)]
        token_budget: Option<usize>,

        /// Output format
        #[arg(short = 'f', long)]
        format: Option<OutputFormatArg>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn read_input(input: &Path) -> std::io::Result<String> {
    if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input)
    }
}

fn load_files(input: &Path, diff: bool, language: Option<&str>) -> anyhow::Result<Vec<ChangedFile>> {
    let text = read_input(input)?;
    if diff {
        let files = parse_unified_diff(&text);
        if files.is_empty() {
            warn!("No added lines found in diff");
        }
        return Ok(files);
    }

    let mut file = ChangedFile::new(input.display().to_string(), text);
    if let Some(hint) = language {
        file.language = Language::from_hint(hint);
    }
    Ok(vec![file])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.to_string())),
        )
        .init();

    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    config
        .classifier
        .allow_list
        .extend(cli.allow_list.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()));

    match cli.command {
        Commands::Redact {
            input,
            diff,
            language,
        } => {
            let files = load_files(&input, diff, language.as_deref())?;
            let session = Session::offline(config)?;
            let abstraction = session.abstract_files(&files)?;

            for doc in &abstraction.documents {
                println!("--- {}", doc.path);
                println!("{}", doc.render());
            }
            info!(
                "{} placeholders allocated; mapping discarded",
                abstraction.store.len()
            );
        }

        Commands::Analyze {
            input,
            diff,
            language,
            api_url,
            provider,
            model,
            token_budget,
            format,
            output,
        } => {
            if let Some(url) = api_url {
                config.provider.api_url = url;
            }
            if let Some(provider) = provider {
                config.provider.provider = provider;
            }
            if let Some(model) = model {
                config.provider.model = model;
            }
            if token_budget.is_some() {
                config.session.token_budget = token_budget;
            }
            if let Some(format) = format {
                config.output.format = format.into();
            }
            if output.is_some() {
                config.output.output_path = output;
            }

            let files = load_files(&input, diff, language.as_deref())?;
            let session = Session::with_http(config.clone())?;

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for shutdown signal: {}", e);
                    return;
                }
                warn!("Received interrupt signal, cancelling session...");
                on_signal.cancel();
            });

            let outcome = session.run(&files, cancel).await;

            let reporter = create_reporter(config.output.format);
            let report = reporter.generate(&outcome);
            if let Some(ref output_path) = config.output.output_path {
                std::fs::write(output_path, &report)?;
                info!("Report written to: {}", output_path.display());
            } else {
                println!("{}", report);
            }

            if let SessionStatus::Failed(_) = outcome.status {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
