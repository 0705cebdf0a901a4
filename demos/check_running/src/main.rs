use anyhow::Context;
use clap::Parser;
use proc_closer::{CloserConfig, ShutdownPolicy};
use std::path::PathBuf;
use tracing::info;

/// Report whether the given programs are running, and optionally close them
#[derive(Debug, Parser)]
#[command(name = "check_running", version)]
struct Args {
    /// Executable names to look for, e.g. `notepad.exe`
    names: Vec<String>,

    /// Close the running instances
    #[arg(long)]
    shutdown: bool,

    /// Kill instances that ignore the close request
    #[arg(long, requires = "shutdown")]
    force: bool,

    /// Skip the close request and go straight to killing
    #[arg(long, requires = "force")]
    immediate: bool,

    /// JSON closer configuration; names on the command line are added to it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn load_config(args: &Args) -> anyhow::Result<CloserConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            CloserConfig::from_json_str(&json)?
        }
        None => CloserConfig::for_names(&args.names),
    };
    if args.config.is_some() {
        config.names.extend(args.names.iter().cloned());
    }
    if args.immediate {
        config.policy = ShutdownPolicy::immediate();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    proc_closer::init_tracing(args.json_logs);

    let config = load_config(&args)?;
    let mut closer = proc_closer::process_closer_with_config(config)?;
    info!(platform = proc_closer::platform_name(), "Scanned process list");

    if !closer.is_running() {
        println!("not running");
        return Ok(());
    }
    for pid in closer.pids() {
        println!("running: pid {pid}");
    }

    if args.shutdown {
        let report = closer.shutdown(args.force)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
