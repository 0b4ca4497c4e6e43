use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use lingo::flags::RunArgs;

mod cmd;

#[derive(Parser)]
#[command(name = "lingo")]
#[command(version, about = "Localization pipeline: plan, translate and write every target locale")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory containing i18n.toml (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Localize the project: setup, plan, execute and optionally watch
    Run(RunArgs),
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    lingo::logging::init(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Failed to get current directory: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    dotenvy::from_path(project_dir.join(".env")).ok();

    match &cli.command {
        Commands::Run(args) => cmd::cmd_run(project_dir, args).await,
        Commands::Config { command } => match cmd::cmd_config(&project_dir, command.clone()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{} {:#}", console::style("error:").red().bold(), e);
                ExitCode::FAILURE
            }
        },
    }
}
