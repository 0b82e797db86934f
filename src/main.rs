use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ct_slicer::{Cli, resample_to_file, resolve};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut slicer = match resolve(cli.source.as_str()) {
        Ok(slicer) => slicer,
        Err(e) => {
            error!("Could not open {}: {}", cli.source, e);
            return ExitCode::FAILURE;
        }
    };

    if cli.info {
        println!("{}", slicer.describe());
        return ExitCode::SUCCESS;
    }

    let config = cli.resample_config();
    match resample_to_file(&mut slicer, &cli.destination, &config) {
        Ok(summary) => {
            let (depth, height, width) = summary.output_shape;
            info!(
                "Wrote {} frames of {}x{} {} to {}",
                depth,
                height,
                width,
                summary.element_type,
                cli.destination.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Resampling failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "ct_slicer=debug"
    } else {
        "ct_slicer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
