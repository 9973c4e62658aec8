//! Job Watcher
//!
//! Polls several jobs concurrently until they all reach a final state.
//! Each job is polled from its own worker thread; workers report state
//! changes over a channel and the watcher records them in an
//! [`ExecutionTimeline`].

use std::collections::{BTreeMap, VecDeque};
use std::sync::mpsc::{channel, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use super::timeline::{EventType, ExecutionTimeline};
use crate::client::{Job, JobState};

/// Default time between two polls of the same job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Messages sent from worker threads to the watcher.
enum WatchMessage {
    /// The job was seen in a new state
    State { job: String, state: JobState },
    /// The worker stopped, with the final state or the reason it gave up
    Done {
        job: String,
        result: Result<JobState, String>,
    },
}

/// Outcome of watching a set of jobs.
#[derive(Debug, Clone)]
pub struct WatchReport {
    /// Final state per job name, or the error that stopped polling it
    pub outcomes: BTreeMap<String, Result<JobState, String>>,
    pub timeline: ExecutionTimeline,
    pub elapsed: Duration,
}

impl WatchReport {
    /// Returns true if every job finished successfully.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes
            .values()
            .all(|r| matches!(r, Ok(state) if state.is_success()))
    }

    /// Names of jobs that did not finish successfully.
    pub fn unsuccessful(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, r)| !matches!(r, Ok(state) if state.is_success()))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Human-readable summary, one line per job.
    pub fn summary(&self) -> String {
        let mut output = String::new();
        for (name, outcome) in &self.outcomes {
            match outcome {
                Ok(state) => output.push_str(&format!("{}: {}\n", name, state)),
                Err(e) => output.push_str(&format!("{}: error: {}\n", name, e)),
            }
        }
        output.push_str(&format!("Watched for {:.2?}\n", self.elapsed));
        output
    }
}

/// Watches submitted jobs until they finish.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use cerise_client::{JobWatcher, Service};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = Service::new("http://localhost", 29593)?;
///     let jobs = service.list_jobs()?;
///
///     let mut watcher = JobWatcher::new();
///     watcher.set_poll_interval(Duration::from_secs(2));
///     let report = watcher.watch(jobs);
///     print!("{}", report.summary());
///     Ok(())
/// }
/// ```
pub struct JobWatcher {
    poll_interval: Duration,
    max_parallel: usize,
}

impl JobWatcher {
    /// Creates a watcher polling every [`DEFAULT_POLL_INTERVAL`], with one
    /// worker per CPU.
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_parallel: num_cpus::get().max(1),
        }
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Sets the maximum number of jobs polled at the same time.
    pub fn set_max_parallel(&mut self, max: usize) {
        self.max_parallel = max.max(1);
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Polls all `jobs` until each reaches a final state or fails to be
    /// queried.
    pub fn watch(&self, jobs: Vec<Job>) -> WatchReport {
        let start_time = Instant::now();
        let mut timeline = ExecutionTimeline::new();
        let mut outcomes = BTreeMap::new();

        let mut pending: VecDeque<Job> = VecDeque::new();
        for job in jobs {
            if job.id().is_none() {
                warn!("Job '{}' was never submitted; skipping", job.name());
                outcomes.insert(job.name().to_string(), Err("not submitted".to_string()));
            } else {
                pending.push_back(job);
            }
        }

        info!(
            "Watching {} jobs (max parallel: {}, poll interval: {:?})",
            pending.len(),
            self.max_parallel,
            self.poll_interval
        );

        let (tx, rx) = channel::<WatchMessage>();
        let mut running_count = 0;

        loop {
            while running_count < self.max_parallel {
                let Some(job) = pending.pop_front() else {
                    break;
                };
                let tx = tx.clone();
                let interval = self.poll_interval;
                thread::spawn(move || poll_job(job, interval, tx));
                running_count += 1;
            }

            if running_count == 0 {
                break;
            }

            let message = match rx.recv() {
                Ok(message) => message,
                Err(e) => {
                    error!("Lost contact with job workers: {}", e);
                    break;
                }
            };

            match message {
                WatchMessage::State { job, state } => {
                    info!("Job '{}' is {}", job, state);
                    timeline.add_event(job, EventType::from_state(state));
                }
                WatchMessage::Done { job, result } => {
                    running_count -= 1;
                    match &result {
                        Ok(state) => {
                            info!("Job '{}' finished: {}", job, state);
                            if timeline.last_event(&job).map(|e| e.event_type)
                                != Some(EventType::from_state(*state))
                            {
                                timeline.add_event(job.clone(), EventType::from_state(*state));
                            }
                        }
                        Err(e) => {
                            error!("Stopped watching job '{}': {}", job, e);
                            timeline.add_event(job.clone(), EventType::Failed);
                        }
                    }
                    outcomes.insert(job, result);
                }
            }
        }

        WatchReport {
            outcomes,
            timeline,
            elapsed: start_time.elapsed(),
        }
    }
}

impl Default for JobWatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker loop: polls one job, reporting each state change.
fn poll_job(job: Job, interval: Duration, tx: Sender<WatchMessage>) {
    let name = job.name().to_string();
    let mut last_state: Option<JobState> = None;

    let result = loop {
        match job.state() {
            Ok(Some(state)) => {
                if last_state != Some(state) {
                    last_state = Some(state);
                    if tx
                        .send(WatchMessage::State {
                            job: name.clone(),
                            state,
                        })
                        .is_err()
                    {
                        return;
                    }
                }
                if state.is_final() {
                    break Ok(state);
                }
            }
            Ok(None) => break Err("not submitted".to_string()),
            Err(e) => break Err(e.to_string()),
        }
        thread::sleep(interval);
    };

    if let Err(e) = tx.send(WatchMessage::Done { job: name, result }) {
        error!("Failed to send completion signal: {}", e);
    }
}
