//! Extracting the bitscore from `diamond blastx --outfmt 6 bitscore` output.
use crate::error::{Error, Result};

/// The outcome of one alignment call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bitscore {
    /// The best bitscore of the reported alignments. Finite and non-negative.
    Matched(f64),
    /// The aligner reported no alignment.
    Unmatched,
}

impl Bitscore {
    pub fn score(&self) -> Option<f64> {
        match *self {
            Bitscore::Matched(s) => Some(s),
            Bitscore::Unmatched => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Bitscore::Matched(_))
    }
}

/// Parse the bitscore column written by the aligner.
///
/// Empty output means no alignment was found. Otherwise every line must hold one finite,
/// non-negative score and the first one must be the best.
pub fn parse_bitscore(output: &str) -> Result<Bitscore> {
    let malformed = |reason: String| Error::MalformedOutput {
        output: output.to_string(),
        reason,
    };

    let mut scores = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| -> Result<f64> {
            let score: f64 = l
                .parse()
                .map_err(|_| malformed(format!("{l:?} is not a bitscore")))?;
            if !score.is_finite() || score < 0.0 {
                return Err(malformed(format!("invalid bitscore {score}")));
            }
            Ok(score)
        });

    let Some(best) = scores.next().transpose()? else {
        return Ok(Bitscore::Unmatched);
    };
    for score in scores {
        let score = score?;
        if score > best {
            return Err(malformed(format!(
                "first bitscore {best} is lower than later bitscore {score}"
            )));
        }
    }
    Ok(Bitscore::Matched(best))
}
