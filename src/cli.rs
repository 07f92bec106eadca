use clap::{value_parser, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{
    config::{OutputFormat, Sensitivity, SweepConfig},
    error::Result,
    retry::RetryPolicy,
};

/// Compute typical DIAMOND bitscores for a range of identities.
///
/// For each DIAMOND sensitivity setting, random protein pairs with an increasing number of
/// amino acid mismatches are aligned with `diamond blastx`, and the resulting bitscores are
/// drawn in one scatter plot per setting.
#[derive(Parser, Serialize, Deserialize, Debug, Clone)]
#[clap(author, about, disable_version_flag(true))]
pub struct Cli {
    /// The number of AAs in the test sequences.
    #[clap(long, default_value_t = 100, value_name = "N", display_order = 1)]
    pub length: usize,

    /// Additional (non-sensitivity) arguments to pass to 'diamond blastx'.
    ///
    /// Split on whitespace.
    #[clap(
        long = "blastxArgs",
        default_value = "",
        value_name = "ARGS",
        allow_hyphen_values = true
    )]
    pub blastx_args: String,

    /// The number of random sequences to test for each AA identity count.
    #[clap(long, default_value_t = 10, value_name = "N", display_order = 1)]
    pub iterations: usize,

    /// The size of the dots for the scatter plots.
    #[clap(long, default_value_t = 3, value_name = "N")]
    pub dotsize: u32,

    /// Write intermediate processing output to standard error.
    #[clap(short, long)]
    pub verbose: bool,

    /// The file to write a plot image to. File format is determined by suffix.
    ///
    /// One of .svg, .png, .jpg, .jpeg, or .bmp.
    #[clap(short, long, default_value = "plot.png", value_name = "FILENAME", value_parser = value_parser!(PathBuf))]
    pub output: PathBuf,

    /// The number of additional errors (non-identical AAs) to add at each step.
    #[clap(long = "errorIncrement", default_value_t = 1, value_name = "N")]
    pub error_increment: usize,

    /// Seed for the random generator. Random by default.
    #[clap(long, hide_short_help = true)]
    pub seed: Option<u64>,

    /// Give up after this many consecutive anomalous DIAMOND results for one trial.
    ///
    /// By default anomalous results are retried until a usable one is obtained.
    #[clap(long = "maxRetries", value_name = "N", hide_short_help = true)]
    pub max_retries: Option<usize>,

    /// The DIAMOND executable.
    #[clap(long, default_value = "diamond", value_name = "PATH", value_parser = value_parser!(PathBuf), hide_short_help = true)]
    pub diamond: PathBuf,
}

impl Cli {
    /// Build and validate the sweep configuration.
    pub fn to_config(&self) -> Result<SweepConfig> {
        let config = SweepConfig {
            length: self.length,
            sensitivities: Sensitivity::ALL.to_vec(),
            iterations: self.iterations,
            error_increment: self.error_increment,
            blastx_args: self
                .blastx_args
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            format: OutputFormat::from_path(&self.output)?,
            output: self.output.clone(),
            dot_size: self.dotsize,
            verbose: self.verbose,
            retry: RetryPolicy::from_max_retries(self.max_retries),
            seed: self.seed,
            diamond: self.diamond.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bitscore-sweep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_test() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).to_config().unwrap();
        assert_eq!(config.length, 100);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.error_increment, 1);
        assert_eq!(config.dot_size, 3);
        assert_eq!(config.output, PathBuf::from("plot.png"));
        assert_eq!(config.format, OutputFormat::Bitmap);
        assert_eq!(config.retry, RetryPolicy::Unbounded);
        assert_eq!(config.sensitivities, Sensitivity::ALL.to_vec());
        assert!(config.blastx_args.is_empty());
        assert!(!config.verbose);
    }

    #[test]
    fn camel_case_flags() {
        let config = parse(&[
            "--length",
            "50",
            "--blastxArgs",
            "--threads 1  --masking 0",
            "--errorIncrement",
            "5",
            "--maxRetries",
            "3",
            "--output",
            "out.svg",
            "--verbose",
        ])
        .to_config()
        .unwrap();
        assert_eq!(config.length, 50);
        assert_eq!(config.error_increment, 5);
        assert_eq!(
            config.blastx_args,
            ["--threads", "1", "--masking", "0"]
        );
        assert_eq!(config.retry, RetryPolicy::Capped(3));
        assert_eq!(config.format, OutputFormat::Svg);
        assert!(config.verbose);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for args in [
            &["--length", "0"][..],
            &["--iterations", "0"],
            &["--errorIncrement", "0"],
            &["--length", "10", "--errorIncrement", "11"],
            &["--dotsize", "0"],
            &["--output", "plot.pdf"],
        ] {
            assert!(
                matches!(parse(args).to_config(), Err(Error::Config(_))),
                "{args:?}"
            );
        }
        assert!(Cli::try_parse_from(["bitscore-sweep", "--length", "-3"]).is_err());
    }
}
