use clap::{ArgAction, Args, Parser, Subcommand};
use commands::{config, run};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "reviewkeeper")]
#[command(about = "ReviewKeeper - Collect organization reviews into CSV, Excel and a database")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to this file, rotated daily
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect reviews once (default when no command is given)
    #[command(long_about = "Render the configured review page, extract up to max_reviews reviews, write them to CSV and Excel files, and store new ones in the database. Reviews already stored are skipped.")]
    Run(RunArgs),
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Page to collect reviews from (overrides website.url)
    #[arg(long)]
    pub url: Option<String>,

    /// Maximum number of reviews to process (overrides parser.max_reviews)
    #[arg(long)]
    pub max_reviews: Option<usize>,

    /// Skip writing CSV and Excel files
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_export: bool,

    /// Skip saving to the database
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_db: bool,

    /// Extract from a saved HTML page instead of launching the browser
    #[arg(long, value_name = "PATH")]
    pub html_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let config_file = config::resolve_config_file(cli.config.clone());
    let log_file = cli.log_file.clone().or_else(|| config::configured_log_file(&config_file));

    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run::run_once(args, &config_file, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &config_file, &output),
    }
}
