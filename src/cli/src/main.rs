use clap::{CommandFactory, Parser};
use log::LevelFilter;
use std::path::Path;

mod commands;
mod core;

use commands::Commands;
use core::error::HarnessError;
use core::exit_code::ExitCode;

const SUBCOMMANDS: &[&str] = &["run", "init", "config", "help"];

#[derive(Parser)]
#[command(name = "apiharness")]
#[command(
    about = "Configuration-driven API test runner. Defaults to 'run' if no subcommand is provided."
)]
#[command(version = crate::core::version::app_version())]
struct Args {
    #[arg(short, long, help = "Enable debug logging", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser)]
#[command(name = "apiharness")]
struct DefaultArgs {
    #[arg(short, long, help = "Enable debug logging", global = true)]
    debug: bool,
    #[command(flatten)]
    run_args: commands::run::RunArgs,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        match &e {
            HarnessError::Usage(err) => {
                let _ = err.print();
            }
            other => eprintln!("Error: {other}"),
        }
        std::process::exit(ExitCode::from(&e).code());
    }
}

async fn run() -> Result<(), HarnessError> {
    let args: Vec<String> = std::env::args().collect();
    let is_subcommand = args
        .get(1)
        .is_some_and(|first| SUBCOMMANDS.contains(&first.as_str()));

    if is_subcommand {
        let args = Args::try_parse()?;
        match args.command {
            Some(Commands::Run(run_args)) => {
                commands::run::execute_run(&run_args, args.debug).await
            }
            Some(Commands::Init(init_args)) => {
                crate::core::logger::init(LevelFilter::Info, args.debug);
                commands::init::execute_init(&init_args)
            }
            Some(Commands::Config(config_command)) => {
                crate::core::logger::init(LevelFilter::Warn, args.debug);
                match config_command.command {
                    commands::config::ConfigSubcommand::Show(show_args) => {
                        commands::config::execute_show(&show_args)
                    }
                    commands::config::ConfigSubcommand::List(list_args) => {
                        commands::config::execute_list(&list_args)
                    }
                }
            }
            None => Ok(()),
        }
    } else {
        match Args::try_parse() {
            Ok(_) if args.len() == 1 && !has_config_dir_in_current_dir() => {
                Args::command().print_help()?;
                println!();
                Ok(())
            }
            Ok(_) => run_default().await,
            Err(e)
                if e.kind() == clap::error::ErrorKind::DisplayHelp
                    || e.kind() == clap::error::ErrorKind::DisplayVersion =>
            {
                e.print()?;
                Ok(())
            }
            Err(_) => run_default().await,
        }
    }
}

/// `apiharness <ENV> [run options]`.
async fn run_default() -> Result<(), HarnessError> {
    let default_args = DefaultArgs::try_parse()?;
    commands::run::execute_run(&default_args.run_args, default_args.debug).await
}

/// A bare `apiharness` runs only inside a project, recognized by its `config/` directory.
fn has_config_dir_in_current_dir() -> bool {
    Path::new("config").is_dir()
}
