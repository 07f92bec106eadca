use std::{fmt, path::Path, path::PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    retry::RetryPolicy,
};

/// DIAMOND sensitivity modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensitivity {
    /// No sensitivity flag.
    Default,
    Faster,
    Fast,
    VerySensitive,
    MidSensitive,
    MoreSensitive,
    Sensitive,
    UltraSensitive,
}

impl Sensitivity {
    /// All modes, ordered by increasing run time as measured on earlier runs.
    pub const ALL: [Sensitivity; 8] = [
        Sensitivity::Default,
        Sensitivity::Faster,
        Sensitivity::Fast,
        Sensitivity::VerySensitive,
        Sensitivity::MidSensitive,
        Sensitivity::MoreSensitive,
        Sensitivity::Sensitive,
        Sensitivity::UltraSensitive,
    ];

    /// The command line flag without leading dashes, if any.
    pub fn flag(&self) -> Option<&'static str> {
        match self {
            Sensitivity::Default => None,
            Sensitivity::Faster => Some("faster"),
            Sensitivity::Fast => Some("fast"),
            Sensitivity::VerySensitive => Some("very-sensitive"),
            Sensitivity::MidSensitive => Some("mid-sensitive"),
            Sensitivity::MoreSensitive => Some("more-sensitive"),
            Sensitivity::Sensitive => Some("sensitive"),
            Sensitivity::UltraSensitive => Some("ultra-sensitive"),
        }
    }

    pub fn name(&self) -> &'static str {
        self.flag().unwrap_or("default")
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Image format of the output plot, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Svg,
    Bitmap,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("svg") => Ok(OutputFormat::Svg),
            Some("png" | "jpg" | "jpeg" | "bmp") => Ok(OutputFormat::Bitmap),
            ext => Err(Error::Config(format!(
                "Unknown output file extension {ext:?} for {}. Must be in {{svg,png,jpg,jpeg,bmp}}.",
                path.display()
            ))),
        }
    }
}

/// Settings for a full sweep. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Number of amino acids in the subject and query.
    pub length: usize,
    pub sensitivities: Vec<Sensitivity>,
    /// Trials per identity level.
    pub iterations: usize,
    /// Step between consecutive substitution counts.
    pub error_increment: usize,
    /// Extra (non-sensitivity) arguments for `diamond blastx`.
    pub blastx_args: Vec<String>,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub dot_size: u32,
    /// Log every trial.
    pub verbose: bool,
    pub retry: RetryPolicy,
    pub seed: Option<u64>,
    pub diamond: PathBuf,
}

impl SweepConfig {
    /// Check all values before any work starts.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("length", self.length),
            ("iterations", self.iterations),
            ("errorIncrement", self.error_increment),
            ("dotsize", self.dot_size as usize),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::Config(format!("--{name} must be positive")));
            }
        }
        if self.error_increment > self.length {
            return Err(Error::Config(format!(
                "--errorIncrement {} exceeds --length {}",
                self.error_increment, self.length
            )));
        }
        if self.sensitivities.is_empty() {
            return Err(Error::Config("no sensitivity settings to test".into()));
        }
        if OutputFormat::from_path(&self.output)? != self.format {
            return Err(Error::Config(format!(
                "output format {:?} does not match {}",
                self.format,
                self.output.display()
            )));
        }
        Ok(())
    }

    /// Substitution counts from full identity up to full mismatch.
    pub fn identity_levels(&self) -> impl Iterator<Item = usize> {
        (0..=self.length).step_by(self.error_increment.max(1))
    }

    pub fn num_levels(&self) -> usize {
        self.identity_levels().count()
    }

    /// Per-trial progress is logged at debug level.
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
