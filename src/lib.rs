//! Measure how the bitscore reported by DIAMOND `blastx` depends on the amino acid identity of
//! the aligned sequences, for each of DIAMOND's sensitivity modes.
//!
//! A sweep generates random protein pairs with an exact number of substitutions
//! ([`random_sequence`]), aligns them with an external [`aligner::Aligner`], parses the score
//! ([`parse`]), and collects the trials per setting ([`sweep`]) for plotting ([`plot`]).

pub mod aligner;
pub mod cli;
pub mod config;
pub mod error;
pub mod parse;
pub mod plot;
pub mod random_sequence;
pub mod retry;
pub mod sweep;

pub mod prelude {
    pub use crate::aligner::{Aligner, Diamond, Invocation};
    pub use crate::config::{OutputFormat, Sensitivity, SweepConfig};
    pub use crate::error::{Error, Result};
    pub use crate::parse::{parse_bitscore, Bitscore};
    pub use crate::random_sequence::{generate_pair, random_mutate, random_sequence, TrialPair};
    pub use crate::retry::RetryPolicy;
    pub use crate::sweep::{run_sweep, SettingResult, SweepResults, Trial};
}
