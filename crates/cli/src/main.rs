mod commands;
mod config;
mod error;
mod record;

use std::path::{Path, PathBuf};
use std::process;

use canon_eval::{Clock, FixedClock, SystemClock};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::CliError;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Canon compliance rule toolchain.
#[derive(Parser)]
#[command(name = "canon", version, about = "Canon compliance rule toolchain")]
struct Cli {
    /// Output format (text or json) [default: text]
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Evaluate as of this RFC 3339 instant instead of the system clock
    #[arg(long, global = true, value_name = "RFC3339")]
    now: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a rule file and print its syntax tree
    Parse {
        /// Path to the rule file
        file: PathBuf,
    },

    /// Check that a rule file parses
    Check {
        /// Path to the rule file
        file: PathBuf,
    },

    /// Evaluate a rule against a context document
    Eval {
        /// Path to the rule file
        file: PathBuf,
        /// Path to the context JSON file
        #[arg(long)]
        context: PathBuf,
    },

    /// Evaluate every rule in a TOML rule set against one context document
    Batch {
        /// Path to the TOML rule set
        rules: PathBuf,
        /// Path to the context JSON file
        #[arg(long)]
        context: PathBuf,
    },
}

/// Settings resolved from flags and the optional config file.
pub(crate) struct Settings {
    pub output: OutputFormat,
    pub quiet: bool,
    pub now: Option<String>,
}

impl Settings {
    fn resolve(cli: &Cli, cfg: Config) -> Settings {
        let output = cli
            .output
            .or_else(|| cfg.output.format.map(OutputFormat::from))
            .unwrap_or(OutputFormat::Text);
        Settings {
            output,
            quiet: cli.quiet,
            now: cli.now.clone().or(cfg.evaluation.now),
        }
    }

    /// The clock every evaluation in this run uses.
    pub(crate) fn clock(&self) -> Result<Box<dyn Clock>, CliError> {
        match &self.now {
            Some(text) => {
                let at = canon_core::parse_instant(text)
                    .ok_or_else(|| CliError::InvalidNow(text.clone()))?;
                Ok(Box::new(FixedClock(at)))
            }
            None => Ok(Box::new(SystemClock)),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CANON_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    match path {
        Some(p) => Config::load(p),
        None => Ok(Config::default()),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let cfg = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            report_error(&e, cli.output.unwrap_or(OutputFormat::Text), cli.quiet);
            process::exit(1);
        }
    };
    let settings = Settings::resolve(&cli, cfg);

    let outcome = match &cli.command {
        Commands::Parse { file } => commands::parse::cmd_parse(file, &settings),
        Commands::Check { file } => commands::check::cmd_check(file, &settings),
        Commands::Eval { file, context } => commands::eval::cmd_eval(file, context, &settings),
        Commands::Batch { rules, context } => {
            commands::batch::cmd_batch(rules, context, &settings)
        }
    };

    if let Err(e) = outcome {
        report_error(&e, settings.output, settings.quiet);
        process::exit(1);
    }
}

/// Report an error to stderr in the requested format.
pub(crate) fn report_error(err: &CliError, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", err),
        OutputFormat::Json => eprintln!("{}", err.to_json_value()),
    }
}
