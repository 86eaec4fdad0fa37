use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use benchcfg_core::{Credential, OperationContext, UpdateRequest, DEFAULT_SOURCE, LATEST_REF};
use benchcfg_installer::{update_config_bundle_with_fetcher, UpdateOutcome};
use benchcfg_remote::RemoteClient;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod fetcher;
mod render;

use fetcher::ProgressFetcher;
use render::{current_output_style, format_update_lines, OutputStyle};

#[derive(Parser, Debug)]
#[command(name = "benchcfg")]
#[command(about = "Fetch and install benchmark configuration bundles", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replace the local cfg directory with the bundle from the upstream source.
    Update(UpdateArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct UpdateArgs {
    /// Tarball endpoint; the ref is appended as the final path segment.
    #[arg(long, env = "BENCHCFG_UPDATE_SOURCE", default_value = DEFAULT_SOURCE)]
    source: String,
    /// Tag, branch or commit to install; `latest` resolves the newest release.
    #[arg(long = "ref", env = "BENCHCFG_UPDATE_REF", default_value = LATEST_REF)]
    reference: String,
    #[arg(long, env = "BENCHCFG_CFG_DIR", default_value = "./cfg/")]
    cfg_dir: PathBuf,
    /// Expected SHA-256 of the tarball (hex, optional 0x prefix).
    #[arg(long, env = "BENCHCFG_UPDATE_CHECKSUM")]
    checksum: Option<String>,
    /// Do not keep the current cfg directory as `<cfg-dir>.bak-<timestamp>`.
    #[arg(long)]
    no_backup: bool,
    /// Give up on network calls after this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,
}

impl UpdateArgs {
    fn to_request(&self) -> UpdateRequest {
        UpdateRequest::new(&self.source, &self.reference, &self.cfg_dir)
            .with_backup(!self.no_backup)
            .with_expected_sha256(self.checksum.clone())
    }

    fn context(&self) -> OperationContext {
        match self.timeout_secs {
            Some(secs) => OperationContext::with_timeout(Duration::from_secs(secs)),
            None => OperationContext::new(),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_update(args: &UpdateArgs, style: OutputStyle) -> Result<UpdateOutcome> {
    let request = args.to_request();
    tracing::debug!(
        source = request.source(),
        reference = request.reference_str(),
        "updating configuration bundle"
    );
    let client = RemoteClient::new(Credential::from_env())?;
    let fetcher = ProgressFetcher::new(client, style);
    update_config_bundle_with_fetcher(&args.context(), &request, &fetcher)
        .context("config update failed")
}

fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Update(args) => {
            let style = current_output_style();
            let outcome = run_update(&args, style)?;
            for line in format_update_lines(&outcome, &args.cfg_dir, style) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli)
}
