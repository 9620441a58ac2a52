use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use hyperchat::runtime::logging;
use hyperchat::{ChatConfig, LogFormat};

use crate::error::{DemoError, Result};
use crate::script::{ScriptOptions, run_script};

#[derive(Debug, Parser)]
#[command(
    name = "hyperchat-demo",
    about = "Drive a virtualized chat session against generated history",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the scripted session and print a summary.
    Run(RunArgs),

    /// Load, validate and print the effective configuration.
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Config file (TOML, or JSON by extension). Falls back to HYPERCHAT_CONFIG.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Pages of older history before the source runs dry.
    #[arg(long, default_value_t = 3)]
    pub pages: usize,

    #[arg(long = "viewport", default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
    pub viewport_height: u32,

    /// Remote messages delivered while reading history.
    #[arg(long, default_value_t = 2)]
    pub incoming: usize,

    /// Overrides `log.format` from the config.
    #[arg(long = "log-format")]
    pub log_format: Option<LogFormat>,

    /// Skip installing the log subscriber.
    #[arg(long)]
    pub no_logging: bool,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CheckConfigArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_demo(args),
        Commands::CheckConfig(args) => check_config(args),
    }
}

fn resolve_config(path: Option<&Path>) -> Result<ChatConfig> {
    let config = match path {
        Some(path) => ChatConfig::load(path)?,
        None => ChatConfig::from_env()?,
    };
    Ok(config)
}

fn run_demo(args: RunArgs) -> Result<()> {
    if args.pages > 10_000 {
        return Err(DemoError::invalid(format!(
            "--pages must be <= 10000, got {}",
            args.pages
        )));
    }
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(format) = args.log_format {
        config.log.format = format;
    }
    if !args.no_logging {
        logging::init(&config.log)?;
    }

    let opts = ScriptOptions {
        seed: args.seed,
        pages: args.pages,
        viewport_height: args.viewport_height,
        incoming: args.incoming,
    };
    let summary = run_script(&config, &opts)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
    } else {
        println!("messages        {}", summary.items);
        println!("loaded older    {} in {} fetches", summary.loaded, summary.fetches);
        println!("fetch errors    {}", summary.fetch_errors);
        println!("scroll steps    {}", summary.steps);
        println!("content height  {}", summary.inner_height);
        println!("final scrollTop {}", summary.final_scroll_top);
        println!("pinned          {}", summary.pinned_at_end);
        println!(
            "frames          {} ({} degraded, max {} mounted)",
            summary.host.frames, summary.host.degraded_frames, summary.host.max_mounted
        );
    }
    Ok(())
}

fn check_config(args: CheckConfigArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
