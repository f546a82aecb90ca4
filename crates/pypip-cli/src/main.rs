//! pypip - install Python packages with pip and keep pyproject.toml in sync.

use anyhow::Result;
use clap::Parser;
use colored::*;
use pypip_cli::commands::{self, AppContext};
use pypip_cli::logging;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "pypip", version)]
#[command(about = "Install Python packages with pip and record them in pyproject.toml", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Record into (and run pip inside) this hatch environment
    #[arg(long, value_name = "ENV")]
    hatch_env: Option<String>,

    /// Project directory (defaults to searching upward from the current directory)
    #[arg(long, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Python interpreter used to run pip
    #[arg(long, value_name = "PYTHON")]
    python: Option<String>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Install packages and add them to pyproject.toml
    Install(commands::InstallArgs),

    /// Uninstall packages and remove them from pyproject.toml
    Uninstall(commands::UninstallArgs),

    /// List the project's dependencies
    Show(commands::ShowArgs),

    /// Search the package index
    Find(commands::FindArgs),

    /// Show package details from the package index
    Info(commands::InfoArgs),

    /// Manage pypip configuration
    Config {
        #[command(subcommand)]
        command: commands::ConfigCommand,
    },
}

fn run(cli: Cli) -> Result<()> {
    if let Some(Command::Config { command }) = cli.command {
        return commands::handle_config_command(command);
    }

    let ctx = AppContext::load(cli.project, cli.hatch_env, cli.python)?;

    match cli.command {
        Some(Command::Install(args)) => commands::handle_install_command(&ctx, args),
        Some(Command::Uninstall(args)) => commands::handle_uninstall_command(&ctx, args),
        Some(Command::Show(args)) => commands::handle_show_command(&ctx, args),
        Some(Command::Find(args)) => commands::handle_find_command(&ctx, args),
        Some(Command::Info(args)) => commands::handle_info_command(&ctx, args),
        Some(Command::Config { .. }) => Ok(()),
        None => commands::handle_show_command(&ctx, commands::ShowArgs::default()),
    }
}

/// pip's exit code when pip failed, 1 for everything else
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| match cause.downcast_ref::<pypip_deps::Error>() {
            Some(pypip_deps::Error::InstallerFailed { code, .. }) => Some(*code),
            _ => None,
        })
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            ExitCode::from(exit_code(&err))
        }
    }
}
