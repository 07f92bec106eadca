//! The sweep over sensitivity settings, identity levels, and iterations.
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::Rng;

use crate::{
    aligner::Aligner,
    config::{Sensitivity, SweepConfig},
    error::Result,
    parse::{parse_bitscore, Bitscore},
    random_sequence::generate_pair,
    retry::retry,
};

/// One (setting, identity level, iteration) measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    pub sensitivity: Sensitivity,
    /// Number of amino acid substitutions between subject and query.
    pub substitutions: usize,
    pub iteration: usize,
    pub bitscore: Bitscore,
}

impl Trial {
    /// Percentage of identical amino acids for sequences of the given length.
    pub fn identity(&self, length: usize) -> f64 {
        100.0 * (length - self.substitutions) as f64 / length as f64
    }
}

/// All trials for one sensitivity setting.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingResult {
    pub sensitivity: Sensitivity,
    /// Ordered by identity level, then iteration.
    pub trials: Vec<Trial>,
    /// Wall-clock time for all trials of this setting.
    pub elapsed: Duration,
    /// Time spent inside the aligner, including discarded calls.
    pub aligner_time: Duration,
    /// Number of discarded anomalous calls.
    pub retries: usize,
}

impl SettingResult {
    fn new(sensitivity: Sensitivity) -> Self {
        SettingResult {
            sensitivity,
            trials: vec![],
            elapsed: Duration::ZERO,
            aligner_time: Duration::ZERO,
            retries: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.sensitivity.name()
    }

    pub fn max_score(&self) -> Option<f64> {
        self.trials
            .iter()
            .filter_map(|t| t.bitscore.score())
            .reduce(f64::max)
    }

    /// Fraction of matched trials per identity level, in increasing level order.
    pub fn detection_rates(&self) -> Vec<(usize, f64)> {
        let mut rates: Vec<(usize, usize, usize)> = vec![];
        for t in &self.trials {
            match rates.last_mut() {
                Some((level, matched, total)) if *level == t.substitutions => {
                    *matched += t.bitscore.is_match() as usize;
                    *total += 1;
                }
                _ => rates.push((t.substitutions, t.bitscore.is_match() as usize, 1)),
            }
        }
        rates
            .into_iter()
            .map(|(level, matched, total)| (level, matched as f64 / total as f64))
            .collect()
    }
}

/// The results of a full sweep, one entry per setting in configured order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResults {
    pub length: usize,
    pub iterations: usize,
    pub settings: Vec<SettingResult>,
}

/// Run all trials for all configured settings.
///
/// Each trial generates a fresh pair, runs the aligner and parses the bitscore. Anomalous empty
/// results are discarded and redone with a new pair according to the configured retry policy,
/// so every identity level ends up with exactly `config.iterations` trials.
pub fn run_sweep<A: Aligner, R: Rng>(
    config: &SweepConfig,
    aligner: &mut A,
    rng: &mut R,
) -> Result<SweepResults> {
    let mut settings = Vec::with_capacity(config.sensitivities.len());
    for &sensitivity in &config.sensitivities {
        info!("Processing sensitivity: {sensitivity}.");
        let result = run_setting(config, sensitivity, aligner, rng)?;
        info!(
            "{sensitivity}: {} trials in {:.1}s ({:.1}s in the aligner, {} retries).",
            result.trials.len(),
            result.elapsed.as_secs_f64(),
            result.aligner_time.as_secs_f64(),
            result.retries
        );
        settings.push(result);
    }
    Ok(SweepResults {
        length: config.length,
        iterations: config.iterations,
        settings,
    })
}

fn run_setting<A: Aligner, R: Rng>(
    config: &SweepConfig,
    sensitivity: Sensitivity,
    aligner: &mut A,
    rng: &mut R,
) -> Result<SettingResult> {
    let mut result = SettingResult::new(sensitivity);
    result
        .trials
        .reserve(config.num_levels() * config.iterations);
    let start = Instant::now();

    for substitutions in config.identity_levels() {
        debug!("Making {substitutions} errors:");
        for iteration in 0..config.iterations {
            debug!("  Iteration {}/{}", iteration + 1, config.iterations);

            let retried = retry(config.retry, |_| {
                let pair = generate_pair(config.length, substitutions, rng);
                let invocation =
                    aligner.run_alignment(&pair.subject, &pair.query_dna, sensitivity)?;
                result.aligner_time += invocation.elapsed;
                if invocation.is_anomalous(pair.substitutions) {
                    debug!("stderr: {}", invocation.stderr.trim());
                    return Ok(None);
                }
                let bitscore = parse_bitscore(&invocation.stdout)?;
                debug!("SBJCT: {}", String::from_utf8_lossy(&pair.subject));
                debug!("QUERY: {}", String::from_utf8_lossy(&pair.query));
                debug!("SCORE: {bitscore:?}");
                Ok(Some(bitscore))
            })?;

            let trial = Trial {
                sensitivity,
                substitutions,
                iteration,
                bitscore: retried.value,
            };
            debug!(
                "ERROR: {substitutions} ({:.1}% identity)",
                trial.identity(config.length)
            );
            result.retries += retried.retries;
            result.trials.push(trial);
        }
    }

    result.elapsed = start.elapsed();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aligner::Invocation, config::tests::test_config, error::Error, retry::RetryPolicy,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Replies to the `i`th call with `reply(i)` on stdout and a fixed stderr.
    struct MockAligner<F: FnMut(usize) -> &'static str> {
        calls: usize,
        reply: F,
        stderr: &'static str,
    }

    impl<F: FnMut(usize) -> &'static str> Aligner for MockAligner<F> {
        fn run_alignment(
            &mut self,
            subject: &[u8],
            query_dna: &[u8],
            _: Sensitivity,
        ) -> Result<Invocation> {
            assert_eq!(query_dna.len(), 3 * subject.len());
            let stdout = (self.reply)(self.calls).to_string();
            self.calls += 1;
            Ok(Invocation {
                stdout,
                stderr: self.stderr.to_string(),
                elapsed: Duration::from_millis(1),
            })
        }

        fn version(&self) -> Result<String> {
            Ok("mock".into())
        }
    }

    fn mock<F: FnMut(usize) -> &'static str>(reply: F) -> MockAligner<F> {
        MockAligner {
            calls: 0,
            reply,
            stderr: "",
        }
    }

    #[test]
    fn two_levels_of_ten() {
        let config = test_config();
        let ref mut rng = ChaCha8Rng::seed_from_u64(31415);
        // The first 10 calls are for 0 substitutions, the next 10 for 100.
        let mut aligner = mock(|i| if i < 10 { "191.4\n" } else { "" });
        let results = run_sweep(&config, &mut aligner, rng).unwrap();

        assert_eq!(results.settings.len(), 1);
        let r = &results.settings[0];
        assert_eq!(r.name(), "default");
        assert_eq!(r.trials.len(), 20);
        assert_eq!(r.retries, 0);
        assert_eq!(aligner.calls, 20);
        for (i, t) in r.trials.iter().enumerate() {
            assert_eq!(t.iteration, i % 10);
            if i < 10 {
                assert_eq!(t.substitutions, 0);
                assert_eq!(t.bitscore, Bitscore::Matched(191.4));
                assert_eq!(t.identity(100), 100.0);
            } else {
                assert_eq!(t.substitutions, 100);
                assert_eq!(t.bitscore, Bitscore::Unmatched);
                assert_eq!(t.identity(100), 0.0);
            }
        }
        assert_eq!(r.detection_rates(), vec![(0, 1.0), (100, 0.0)]);
        assert_eq!(r.max_score(), Some(191.4));
    }

    #[test]
    fn anomalies_are_retried_and_not_counted() {
        let config = test_config();
        let ref mut rng = ChaCha8Rng::seed_from_u64(1);
        // Calls 3 and 4 are anomalous: empty output at full identity.
        let mut aligner = mock(|i| match i {
            3 | 4 => "",
            i if i < 12 => "200\n",
            _ => "",
        });
        let results = run_sweep(&config, &mut aligner, rng).unwrap();
        let r = &results.settings[0];

        assert_eq!(aligner.calls, 22);
        assert_eq!(r.retries, 2);
        assert_eq!(r.trials.len(), 20);
        assert_eq!(r.trials.iter().filter(|t| t.substitutions == 0).count(), 10);
        assert!(r
            .trials
            .iter()
            .filter(|t| t.substitutions == 0)
            .all(|t| t.bitscore == Bitscore::Matched(200.0)));
        assert_eq!(r.aligner_time, Duration::from_millis(22));
    }

    #[test]
    fn completed_search_without_hits_is_unmatched() {
        // E.g. `--min-score 1000`: the search finishes but reports nothing, even at full identity.
        let config = SweepConfig {
            blastx_args: vec!["--min-score".into(), "1000".into()],
            retry: RetryPolicy::Capped(3),
            ..test_config()
        };
        let ref mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut aligner = MockAligner {
            stderr: "Reported 0 pairwise alignments, 0 HSPs.\n",
            ..mock(|_| "")
        };
        let results = run_sweep(&config, &mut aligner, rng).unwrap();
        let r = &results.settings[0];

        assert_eq!(aligner.calls, 20);
        assert_eq!(r.retries, 0);
        assert_eq!(r.trials.len(), 20);
        assert!(r.trials.iter().all(|t| t.bitscore == Bitscore::Unmatched));
        assert_eq!(r.detection_rates(), vec![(0, 0.0), (100, 0.0)]);
    }

    #[test]
    fn capped_retries_fail() {
        let config = SweepConfig {
            retry: RetryPolicy::Capped(5),
            ..test_config()
        };
        let ref mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut aligner = mock(|_| "");
        let r = run_sweep(&config, &mut aligner, rng);
        assert!(matches!(r, Err(Error::RetriesExhausted { attempts: 6 })));
        assert_eq!(aligner.calls, 6);
    }

    #[test]
    fn malformed_output_aborts() {
        let config = test_config();
        let ref mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut aligner = mock(|i| if i < 5 { "99.0" } else { "Segmentation fault" });
        let r = run_sweep(&config, &mut aligner, rng);
        assert!(matches!(r, Err(Error::MalformedOutput { .. })));
        assert_eq!(aligner.calls, 6);
    }

    #[test]
    fn settings_in_declared_order() {
        let config = SweepConfig {
            length: 10,
            iterations: 3,
            error_increment: 5,
            sensitivities: Sensitivity::ALL.to_vec(),
            ..test_config()
        };
        let ref mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut aligner = mock(|_| "30.0");
        let results = run_sweep(&config, &mut aligner, rng).unwrap();

        assert_eq!(
            results
                .settings
                .iter()
                .map(|s| s.sensitivity)
                .collect::<Vec<_>>(),
            Sensitivity::ALL.to_vec()
        );
        for s in &results.settings {
            // Levels 0, 5, 10.
            assert_eq!(s.trials.len(), 9);
            let levels: Vec<usize> = s.trials.iter().map(|t| t.substitutions).collect();
            assert_eq!(levels, [0, 0, 0, 5, 5, 5, 10, 10, 10]);
            assert!(s.trials.iter().all(|t| t.sensitivity == s.sensitivity));
        }
        assert_eq!(aligner.calls, 8 * 9);
    }
}
