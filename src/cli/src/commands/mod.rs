pub mod config;
pub mod init;
pub mod run;
pub mod shared;
pub mod validators;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run case suites against an environment")]
    Run(run::RunArgs),
    #[command(about = "Scaffold a new test project")]
    Init(init::InitArgs),
    Config(config::ConfigCommand),
}
