//! Retrying alignment calls that returned an anomalous result.
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How often an anomalous result may be discarded before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// Retry until a usable result is obtained.
    /// Loops forever if the external tool keeps failing.
    #[default]
    Unbounded,
    /// Allow at most this many retries for a single trial.
    Capped(usize),
}

impl RetryPolicy {
    pub fn from_max_retries(max: Option<usize>) -> Self {
        max.map_or(RetryPolicy::Unbounded, RetryPolicy::Capped)
    }

    /// Whether another attempt may follow `retries` discarded ones.
    pub fn allows(&self, retries: usize) -> bool {
        match *self {
            RetryPolicy::Unbounded => true,
            RetryPolicy::Capped(max) => retries <= max,
        }
    }
}

/// The result of a retried operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    /// Number of discarded anomalous attempts.
    pub retries: usize,
}

/// Call `attempt` until it returns `Some`.
///
/// `attempt` receives the number of attempts made so far and returns `Ok(None)` for an anomalous
/// result that should be discarded. Errors are returned immediately and never retried.
pub fn retry<T>(
    policy: RetryPolicy,
    mut attempt: impl FnMut(usize) -> Result<Option<T>>,
) -> Result<Retried<T>> {
    let mut retries = 0;
    loop {
        if let Some(value) = attempt(retries)? {
            return Ok(Retried { value, retries });
        }
        retries += 1;
        if !policy.allows(retries) {
            return Err(Error::RetriesExhausted { attempts: retries });
        }
        warn!("Anomalous empty result from the aligner. Repeating (retry {retries}).");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success() {
        let r = retry(RetryPolicy::Capped(1), |_| Ok(Some(5))).unwrap();
        assert_eq!(r, Retried { value: 5, retries: 0 });
    }

    #[test]
    fn unbounded_keeps_going() {
        let r = retry(RetryPolicy::Unbounded, |i| Ok((i == 1000).then_some(i))).unwrap();
        assert_eq!(r.value, 1000);
        assert_eq!(r.retries, 1000);
    }

    #[test]
    fn capped_gives_up() {
        let mut calls = 0;
        let r: Result<Retried<()>> = retry(RetryPolicy::Capped(3), |_| {
            calls += 1;
            Ok(None)
        });
        assert!(matches!(r, Err(Error::RetriesExhausted { attempts: 4 })));
        // The initial attempt plus three retries.
        assert_eq!(calls, 4);
    }

    #[test]
    fn capped_succeeds_on_last_retry() {
        let r = retry(RetryPolicy::Capped(2), |i| Ok((i == 2).then_some("ok"))).unwrap();
        assert_eq!(r.retries, 2);
    }

    #[test]
    fn errors_are_not_retried() {
        let mut calls = 0;
        let r: Result<Retried<()>> = retry(RetryPolicy::Unbounded, |_| {
            calls += 1;
            Err(Error::Config("bad".into()))
        });
        assert!(matches!(r, Err(Error::Config(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn policy_from_flag() {
        assert_eq!(RetryPolicy::from_max_retries(None), RetryPolicy::Unbounded);
        assert_eq!(RetryPolicy::from_max_retries(Some(4)), RetryPolicy::Capped(4));
        assert!(RetryPolicy::Capped(4).allows(4));
        assert!(!RetryPolicy::Capped(4).allows(5));
    }
}
