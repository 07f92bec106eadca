use std::process::ExitCode;

use bitscore_sweep::{
    cli::Cli,
    plot::{plot_sweep, FigureInfo},
    prelude::*,
};
use clap::Parser;
use log::{debug, error, info, LevelFilter};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn init_logger(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(args: &Cli, config: &SweepConfig) -> Result<()> {
    if let Ok(json) = serde_json::to_string(args) {
        debug!("Arguments: {json}");
    }

    let seed = config.seed.unwrap_or_else(|| {
        let seed = ChaCha8Rng::from_entropy().gen_range(0..1_000_000);
        info!("Seed: {seed}");
        seed
    });
    let ref mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut diamond = Diamond::new(&config.diamond, config.blastx_args.clone())?;
    // Checked before the sweep.
    let aligner_version = diamond.version()?;
    info!("DIAMOND version {aligner_version}");

    let results = run_sweep(config, &mut diamond, rng)?;

    let info = FigureInfo {
        aligner_version,
        timestamp: chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string(),
        system: std::env::consts::OS.to_string(),
    };
    plot_sweep(
        &results,
        &info,
        &config.output,
        config.format,
        config.dot_size,
    )
}

fn main() -> ExitCode {
    let args = Cli::parse();

    // Reject bad arguments before DIAMOND is ever started.
    let result = match args.to_config() {
        Ok(config) => {
            init_logger(config.log_level());
            run(&args, &config)
        }
        Err(e) => {
            init_logger(LevelFilter::Info);
            Err(e)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
