//! Convergence checking
//!
//! Remote mutations acknowledge before they are effective. A `Checker`
//! polls a caller-supplied state read until it reports the expected token,
//! blocking the calling thread between attempts. Comparison ignores ASCII
//! case so provider casing conventions never matter.

use std::time::{Duration, Instant};

use tracing::info;

use crate::error::CheckError;

/// Token reported when the watched resource does not exist. Useful as the
/// expected state after a delete.
pub const NOT_FOUND_STATE: &str = "not-found";

/// Polls a state read until it matches, with a hard deadline.
pub struct Checker<F> {
    /// What is being waited on, used in progress logs
    pub description: String,
    pub timeout: Duration,
    pub frequency: Duration,
    pub expect: String,
    /// Reads the current state token; a failure aborts the check
    pub fetch: F,
}

impl<F> Checker<F>
where
    F: FnMut() -> anyhow::Result<String>,
{
    /// Block until the fetched token equals `expect` (ASCII case ignored).
    ///
    /// The deadline is inspected before each fetch, so a zero timeout never
    /// issues a remote read. Between unsuccessful fetches the thread sleeps
    /// for `frequency`.
    pub fn check(&mut self) -> Result<(), CheckError> {
        let start = Instant::now();
        let mut last = String::new();

        loop {
            if start.elapsed() >= self.timeout {
                return Err(CheckError::Timeout {
                    timeout: self.timeout,
                    expect: self.expect.clone(),
                    last,
                });
            }

            let got = (self.fetch)().map_err(CheckError::Fetch)?;
            if got.eq_ignore_ascii_case(&self.expect) {
                return Ok(());
            }

            info!(
                "waiting for {} to be '{}', currently '{}'",
                self.description, self.expect, got
            );
            last = got;
            std::thread::sleep(self.frequency);
        }
    }
}
