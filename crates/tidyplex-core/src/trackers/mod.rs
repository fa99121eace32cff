pub mod http_probe;
pub mod output;
pub mod sources;
pub mod udp;

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, RecvTimeoutError};
use reqwest::blocking::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::progress::ProgressReporter;

pub use sources::TrackerEntry;

/// Failure of a single probe attempt. Only timeouts earn a retry.
#[derive(Debug)]
pub enum ProbeError {
    TimedOut,
    Unreachable(String),
    BadResponse(String),
}

/// Final verdict on one tracker, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Alive { latency: Duration },
    TimedOut,
    Unreachable { reason: String },
    BadResponse { reason: String },
    UnsupportedScheme { scheme: String },
    InvalidUrl { reason: String },
}

impl ProbeStatus {
    pub fn is_alive(&self) -> bool {
        matches!(self, ProbeStatus::Alive { .. })
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Alive { latency } => write!(f, "alive ({} ms)", latency.as_millis()),
            ProbeStatus::TimedOut => write!(f, "timed out"),
            ProbeStatus::Unreachable { reason } => write!(f, "unreachable: {reason}"),
            ProbeStatus::BadResponse { reason } => write!(f, "bad response: {reason}"),
            ProbeStatus::UnsupportedScheme { scheme } => {
                write!(f, "unsupported scheme {scheme:?}")
            }
            ProbeStatus::InvalidUrl { reason } => write!(f, "invalid URL: {reason}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub url: String,
    /// Position in the fetched lists, for stable output order.
    pub index: usize,
    pub status: ProbeStatus,
}

impl ProbeOutcome {
    pub fn latency(&self) -> Option<Duration> {
        match self.status {
            ProbeStatus::Alive { latency } => Some(latency),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ProbeSummary {
    pub sources: usize,
    pub source_failures: usize,
    /// Deduped candidates that went into the probe queue.
    pub candidates: usize,
    pub skipped: usize,
    /// Outcomes collected before the run deadline.
    pub probed: usize,
    pub alive: usize,
    /// Survivors under the latency ceiling, written to the output file.
    pub written: usize,
    /// Probes still outstanding when the run deadline passed.
    pub abandoned: usize,
    pub run_timed_out: bool,
    pub duration: Duration,
}

impl ProbeSummary {
    pub fn has_warnings(&self) -> bool {
        self.source_failures > 0 || self.run_timed_out
    }
}

pub struct TrackerProber {
    config: TrackerConfig,
}

impl TrackerProber {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    /// Full probe pipeline:
    /// 1. Fetch and splice the configured tracker lists
    /// 2. Probe every candidate from a bounded worker pool
    /// 3. Keep live trackers under the latency ceiling, in source order
    /// 4. Atomically rewrite the output file
    ///
    /// The run deadline caps the whole pipeline. When it passes,
    /// outstanding probes are abandoned and the results so far are
    /// written out.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<ProbeSummary> {
        let start = Instant::now();
        let probe_timeout = Duration::from_secs(self.config.probe_timeout_secs);
        let client = Client::builder()
            .timeout(probe_timeout)
            .user_agent(concat!("tidyplex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        reporter.on_fetch_start(self.config.source_urls.len());
        let fetched = sources::fetch_candidates(&client, &self.config)?;
        let total = fetched.entries.len();
        info!(
            "{} candidate tracker(s) after dedupe, {} skip-listed, {} source failure(s)",
            total, fetched.skipped, fetched.source_failures
        );
        reporter.on_fetch_complete(total, fetched.skipped);
        reporter.on_probe_start(total);

        let (job_tx, job_rx) = unbounded::<TrackerEntry>();
        let (outcome_tx, outcome_rx) = unbounded::<ProbeOutcome>();
        for entry in fetched.entries {
            // both ends held locally; an unbounded send cannot fail here
            let _ = job_tx.send(entry);
        }
        drop(job_tx);

        let workers = self.config.max_concurrency.clamp(1, total.max(1));
        debug!("Probing with {} worker(s)", workers);
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let client = client.clone();
            let config = self.config.clone();
            thread::spawn(move || {
                while let Ok(entry) = job_rx.recv() {
                    let outcome = probe_entry(&client, &config, entry);
                    if outcome_tx.send(outcome).is_err() {
                        // collector hit the run deadline and hung up
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(outcome_tx);

        let deadline = start + Duration::from_secs(self.config.run_timeout_secs);
        let mut outcomes: Vec<ProbeOutcome> = Vec::with_capacity(total);
        let mut run_timed_out = false;
        while outcomes.len() < total {
            match outcome_rx.recv_deadline(deadline) {
                Ok(outcome) => {
                    reporter.on_tracker_probed(&outcome);
                    outcomes.push(outcome);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "Run deadline of {}s passed with {} probe(s) outstanding, writing what finished",
                        self.config.run_timeout_secs,
                        total - outcomes.len()
                    );
                    run_timed_out = true;
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        // Workers blocked on a probe see their next send fail once
        // outcome_rx drops and shut down on their own.

        let ceiling = Duration::from_millis(self.config.latency_ceiling_ms);
        let mut alive = 0usize;
        let mut keepers: Vec<&ProbeOutcome> = Vec::new();
        for outcome in &outcomes {
            if let ProbeStatus::Alive { latency } = outcome.status {
                alive += 1;
                if latency <= ceiling {
                    keepers.push(outcome);
                } else {
                    debug!(
                        "Dropping {}: {:?} above the {:?} ceiling",
                        outcome.url, latency, ceiling
                    );
                }
            }
        }
        keepers.sort_by_key(|outcome| outcome.index);
        let lines: Vec<&str> = keepers.iter().map(|outcome| outcome.url.as_str()).collect();
        output::write_tracker_file(&self.config.output_file, &lines)?;

        let summary = ProbeSummary {
            sources: self.config.source_urls.len(),
            source_failures: fetched.source_failures,
            candidates: total,
            skipped: fetched.skipped,
            probed: outcomes.len(),
            alive,
            written: lines.len(),
            abandoned: total - outcomes.len(),
            run_timed_out,
            duration: start.elapsed(),
        };
        info!(
            "Probe completed in {:.2}s: {}/{} alive, {} under the {}ms ceiling, saved to {}",
            summary.duration.as_secs_f64(),
            summary.alive,
            summary.probed,
            summary.written,
            self.config.latency_ceiling_ms,
            self.config.output_file.display(),
        );
        reporter.on_probe_complete(&summary);
        Ok(summary)
    }
}

/// Probe one candidate, retrying timeouts only. Anything else a
/// tracker does wrong is final on the first attempt.
fn probe_entry(client: &Client, config: &TrackerConfig, entry: TrackerEntry) -> ProbeOutcome {
    let url = match Url::parse(&entry.url) {
        Ok(url) => url,
        Err(err) => {
            return ProbeOutcome {
                url: entry.url,
                index: entry.index,
                status: ProbeStatus::InvalidUrl {
                    reason: err.to_string(),
                },
            };
        }
    };

    let timeout = Duration::from_secs(config.probe_timeout_secs);
    let scheme = url.scheme().to_ascii_lowercase();
    let mut attempts = 0u32;
    let status = loop {
        attempts += 1;
        let result = match scheme.as_str() {
            "udp" => udp::probe(&url, timeout),
            "http" | "https" => http_probe::probe(client, &url),
            other => {
                break ProbeStatus::UnsupportedScheme {
                    scheme: other.to_string(),
                }
            }
        };
        match result {
            Ok(latency) => break ProbeStatus::Alive { latency },
            Err(ProbeError::TimedOut) if attempts <= config.probe_retries => {
                debug!(
                    "{} timed out, retry {}/{}",
                    url, attempts, config.probe_retries
                );
            }
            Err(ProbeError::TimedOut) => break ProbeStatus::TimedOut,
            Err(ProbeError::Unreachable(reason)) => break ProbeStatus::Unreachable { reason },
            Err(ProbeError::BadResponse(reason)) => break ProbeStatus::BadResponse { reason },
        }
    };

    if !status.is_alive() {
        debug!("{} failed probe: {}", entry.url, status);
    }
    ProbeOutcome {
        url: entry.url,
        index: entry.index,
        status,
    }
}
