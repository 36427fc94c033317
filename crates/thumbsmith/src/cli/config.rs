//! The `thumbsmith config` command: inspect and bootstrap the config file.

use clap::{Args, Subcommand};
use thumbsmith_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file location
    Path,

    /// Write a config file with the default settings
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show(),
        ConfigCommand::Path => path(),
        ConfigCommand::Init { force } => init(force),
    }
}

/// Print the effective config: file values merged over defaults, with the
/// resolved directories appended so `~` expansion is visible.
fn show() -> anyhow::Result<()> {
    let path = Config::default_path();
    let config = Config::load()?;

    if path.exists() {
        println!("# {}", path.display());
    } else {
        println!("# built-in defaults ({} not found)", path.display());
    }
    print!("{}", config.to_toml()?);
    println!();
    println!("# staging dir resolves to {}", config.input_dir().display());
    println!("# output dir resolves to  {}", config.output_dir().display());
    Ok(())
}

/// Print the config file path; stdout carries only the path so the command
/// stays scriptable.
fn path() -> anyhow::Result<()> {
    let path = Config::default_path();
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(no file there yet; defaults are in use)");
    }
    Ok(())
}

fn init(force: bool) -> anyhow::Result<()> {
    let path = Config::default_path();
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to replace it",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, Config::default().to_toml()?)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
