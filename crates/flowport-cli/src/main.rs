//! Command-line front end for flowport.
use std::path::PathBuf;

use aws_config::BehaviorVersion;
use clap::{Parser, Subcommand};
use colored::Colorize;
use flowport::{aws::ConnectSource, Config, Manifest};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the verbosity level
    #[clap(short, action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Path of the configuration file, JSON or TOML.
    #[clap(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export resources of the source instance into a template.
    Export,
    /// Collect the manifest of the destination instance.
    Manifest,
}

async fn export(config: &Config, sdk_cfg: &aws_config::SdkConfig) -> anyhow::Result<()> {
    let output_path = config.output_path()?;
    let instance_id = config.input.connect_instance_id.as_str();
    let identity = flowport::aws::discover_identity(sdk_cfg, instance_id).await?;
    let manifest = Manifest::load(config.manifest_path())?;
    let source = ConnectSource::new(sdk_cfg, instance_id);

    let template = flowport::export(&source, config, &manifest, &identity).await?;
    template.save(&output_path)?;

    println!(
        "{} {} resources to {}",
        "exported".green().bold(),
        template.resources.len(),
        output_path.display()
    );
    Ok(())
}

async fn manifest(config: &Config, sdk_cfg: &aws_config::SdkConfig) -> anyhow::Result<()> {
    let source = ConnectSource::new(sdk_cfg, config.destination_instance_id()?);
    let manifest = flowport::manifest::collect(&source).await?;
    let manifest_path = config.manifest_path();
    manifest.save(&manifest_path)?;

    println!(
        "{} manifest of {} to {}",
        "collected".green().bold(),
        source.instance_id(),
        manifest_path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        verbosity,
        config,
        command,
    } = Cli::parse();

    // RUST_LOG applies unless -v is given
    let mut logger = env_logger::Builder::from_default_env();
    if verbosity > 0 {
        let level = match verbosity {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        logger.filter_module("flowport", level);
    }
    logger.init();

    let config = Config::load(&config)?;
    let sdk_cfg = aws_config::load_defaults(BehaviorVersion::latest()).await;

    match command {
        Command::Export => export(&config, &sdk_cfg).await,
        Command::Manifest => manifest(&config, &sdk_cfg).await,
    }
}
