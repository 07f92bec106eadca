//! Running the external aligner on a subject/query pair.
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Command, Output},
    time::{Duration, Instant},
};

use bio::io::fasta;
use itertools::Itertools;
use log::debug;
use tempfile::TempDir;

use crate::{
    config::Sensitivity,
    error::{Error, Result},
};

/// Raw output of a single alignment call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock time of the alignment command itself.
    pub elapsed: Duration,
}

/// Summary line `diamond blastx` writes to stderr after a completed search,
/// e.g. `Reported 0 pairwise alignments, 0 HSPs.`
const REPORT_SUMMARY: &str = "pairwise alignments";

impl Invocation {
    pub fn is_empty(&self) -> bool {
        self.stdout.trim().is_empty()
    }

    /// Whether the aligner reported finishing its search.
    pub fn completed(&self) -> bool {
        self.stderr.contains(REPORT_SUMMARY)
    }

    /// Empty output for a pair that must align, from a search that never completed.
    ///
    /// An identical subject and query align under default settings, so empty output for a pair
    /// without substitutions and without the search summary is a misbehaving aligner. When the
    /// summary is present, score thresholds in the extra arguments rejected the hit and the
    /// result is a real no-match. Empty output for any other pair is always a no-match.
    pub fn is_anomalous(&self, substitutions: usize) -> bool {
        substitutions == 0 && self.is_empty() && !self.completed()
    }
}

/// An external tool that aligns a DNA query against a protein subject and reports bitscores.
pub trait Aligner {
    fn run_alignment(
        &mut self,
        subject: &[u8],
        query_dna: &[u8],
        sensitivity: Sensitivity,
    ) -> Result<Invocation>;

    /// Version string of the tool, for labelling the output.
    fn version(&self) -> Result<String>;
}

/// `diamond blastx` with a fresh single-sequence database per call.
pub struct Diamond {
    executable: PathBuf,
    blastx_args: Vec<String>,
    dir: TempDir,
}

impl Diamond {
    /// Temporary files live in a private directory that is removed on drop.
    pub fn new(executable: impl Into<PathBuf>, blastx_args: Vec<String>) -> Result<Self> {
        Ok(Diamond {
            executable: executable.into(),
            blastx_args,
            dir: tempfile::Builder::new().prefix("bitscore-sweep").tempdir()?,
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// The arguments passed to `diamond` for one `blastx` call.
    pub fn blastx_command_args(
        &self,
        sensitivity: Sensitivity,
        query: &Path,
        db: &Path,
    ) -> Vec<String> {
        let mut args = vec!["blastx".to_string()];
        args.extend(self.blastx_args.iter().cloned());
        if let Some(flag) = sensitivity.flag() {
            args.push(format!("--{flag}"));
        }
        args.extend([
            "--query".to_string(),
            query.display().to_string(),
            "--db".to_string(),
            db.display().to_string(),
            "--outfmt".to_string(),
            "6".to_string(),
            "bitscore".to_string(),
        ]);
        args
    }

    /// Run `diamond` with the given arguments and fail on a non-zero exit status.
    fn run<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<Output> {
        let command = format!(
            "{} {}",
            self.executable.display(),
            args.iter().map(|a| a.as_ref().to_string_lossy()).join(" ")
        );
        debug!("Running {command}");
        let output = Command::new(&self.executable)
            .args(args)
            .output()
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(Error::ToolFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

fn write_fasta(path: &Path, id: &str, seq: &[u8]) -> Result<()> {
    let mut writer = fasta::Writer::to_file(path)?;
    writer.write(id, None, seq)?;
    writer.flush()?;
    Ok(())
}

impl Aligner for Diamond {
    fn run_alignment(
        &mut self,
        subject: &[u8],
        query_dna: &[u8],
        sensitivity: Sensitivity,
    ) -> Result<Invocation> {
        let subject_file = self.path("subject.fasta");
        let query_file = self.path("query.fasta");
        let db = self.path("db");

        // Build a database holding only the subject.
        write_fasta(&subject_file, "subject", subject)?;
        self.run(&[
            OsStr::new("makedb"),
            OsStr::new("--in"),
            subject_file.as_os_str(),
            OsStr::new("--db"),
            db.as_os_str(),
            OsStr::new("--quiet"),
        ])?;

        write_fasta(&query_file, "query", query_dna)?;
        let args = self.blastx_command_args(sensitivity, &query_file, &db);
        let start = Instant::now();
        let output = self.run(args.as_slice())?;
        let elapsed = start.elapsed();

        Ok(Invocation {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed,
        })
    }

    fn version(&self) -> Result<String> {
        let output = self.run(&["--version"])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .split_whitespace()
            .last()
            .map(str::to_string)
            .ok_or_else(|| Error::MalformedOutput {
                output: stdout.to_string(),
                reason: "no version in `diamond --version` output".into(),
            })
    }
}
