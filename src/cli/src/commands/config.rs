use crate::commands::shared::{ConfigDirArgs, EnvArgs, OutputArgs};
use crate::core::error::HarnessError;
use apiharness_lib::config::ConfigLoader;
use apiharness_lib::report::mask_secrets;
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Args)]
#[command(name = "config")]
#[command(about = "Inspect resolved configuration")]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    #[command(about = "Print the configuration resolved for an environment")]
    Show(ShowArgs),
    #[command(about = "List environments that have an env_<name>.yml file")]
    List(ListArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub env_args: EnvArgs,

    #[command(flatten)]
    pub config: ConfigDirArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub config: ConfigDirArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Serialize)]
struct EnvironmentList {
    environments: Vec<String>,
}

pub fn execute_show(args: &ShowArgs) -> Result<(), HarnessError> {
    let config = ConfigLoader::new(&args.config.config_dir).resolve(args.env_args.name())?;

    let formatter = crate::core::formatter::get_formatter(&args.output.output);
    print!("{}", formatter.format(&mask_secrets(config.tree())));
    Ok(())
}

pub fn execute_list(args: &ListArgs) -> Result<(), HarnessError> {
    let environments = ConfigLoader::new(&args.config.config_dir).list_environments()?;
    if environments.is_empty() {
        log::warn!(
            "No env_<name>.yml files in {}",
            args.config.config_dir.display()
        );
    }

    let formatter = crate::core::formatter::get_formatter(&args.output.output);
    print!("{}", formatter.format(&EnvironmentList { environments }));
    Ok(())
}
