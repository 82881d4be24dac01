//! ob-setup - Orange Box network provisioner entry point

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use orangebox_common::{RealSystem, SetupError};
use orangebox_setup::pipeline::{self, SetupOptions};

#[derive(Parser, Debug)]
#[command(
    name = "ob-setup",
    about = "Provision the networking of an Orange Box lab rack",
    version
)]
struct Args {
    /// Rack number (otherwise /etc/orange-box.conf, then the hostname)
    #[arg(long)]
    rack_number: Option<u16>,

    /// Directory holding staged bootstrap .deb packages
    #[arg(long, default_value = ".")]
    deb_dir: PathBuf,

    /// Print the derived plan and rendered configuration without touching
    /// the host
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

/// Initializes tracing/logging subsystem
fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn fail(err: SetupError) -> ExitCode {
    error!("{err}");
    if let Some(hint) = err.remediation() {
        eprintln!("{hint}");
    }
    ExitCode::from(err.exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    let env = RealSystem::new();

    if args.dry_run {
        return match pipeline::preview(&env, args.rack_number).await {
            Ok(preview) => {
                let summary = serde_json::to_string_pretty(&preview)
                    .expect("preview serialization cannot fail");
                println!("{summary}");
                println!();
                print!("{}", preview.rendered);
                ExitCode::SUCCESS
            }
            Err(err) => fail(err),
        };
    }

    info!("--- Setting up Orange Box networking ---");

    let opts = SetupOptions {
        rack_number: args.rack_number,
        deb_dir: args.deb_dir,
    };

    match pipeline::provision(&env, &opts).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}
